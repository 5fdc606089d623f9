use std::fmt;
use std::time::Duration;

/// Elapsed-time value recorded for a call that did not complete.
pub(crate) const FAILED_ELAPSED_MS: f64 = -1.0;

/// Outcome of one timed call against one source.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Measurement {
    Completed { elapsed: Duration, rows: usize, first_row: Option<String> },
    Failed { error: String },
    /// The source was not available for this run.
    Skipped,
}

impl Measurement {
    pub(crate) fn elapsed_ms(&self) -> f64 {
        match self {
            Self::Completed { elapsed, .. } => elapsed.as_secs_f64() * 1000.0,
            Self::Failed { .. } | Self::Skipped => FAILED_ELAPSED_MS,
        }
    }

    pub(crate) fn row_count(&self) -> usize {
        match self {
            Self::Completed { rows, .. } => *rows,
            Self::Failed { .. } | Self::Skipped => 0,
        }
    }

    pub(crate) fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    Faster,
    Slower,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Faster => "faster",
            Self::Slower => "slower",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpeedComparison {
    /// Document time divided by relational time.
    pub(crate) ratio: f64,
    pub(crate) verdict: Verdict,
}

/// `None` unless both calls completed with a positive elapsed time.
pub(crate) fn compare_speed(relational_ms: f64, document_ms: f64) -> Option<SpeedComparison> {
    if relational_ms <= 0.0 || document_ms <= 0.0 {
        return None;
    }

    let ratio = document_ms / relational_ms;
    let verdict = if ratio < 1.0 { Verdict::Faster } else { Verdict::Slower };
    Some(SpeedComparison { ratio, verdict })
}

/// Both measurements of one report.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryComparison {
    pub(crate) relational: Measurement,
    pub(crate) document: Measurement,
}

impl QueryComparison {
    pub(crate) fn speed(&self) -> Option<SpeedComparison> {
        compare_speed(self.relational.elapsed_ms(), self.document.elapsed_ms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(ms: u64, rows: usize) -> Measurement {
        Measurement::Completed { elapsed: Duration::from_millis(ms), rows, first_row: None }
    }

    #[test]
    fn document_twice_as_fast_is_faster() {
        let speed = compare_speed(10.0, 5.0).expect("both completed");
        assert_eq!(speed.ratio, 0.5);
        assert_eq!(speed.verdict, Verdict::Faster);
    }

    #[test]
    fn document_four_times_slower_is_slower() {
        let speed = compare_speed(5.0, 20.0).expect("both completed");
        assert_eq!(speed.ratio, 4.0);
        assert_eq!(speed.verdict, Verdict::Slower);
        assert_eq!(format!("{:.1}x {}", speed.ratio, speed.verdict), "4.0x slower");
    }

    #[test]
    fn equal_times_count_as_slower() {
        assert_eq!(compare_speed(7.0, 7.0).map(|speed| speed.verdict), Some(Verdict::Slower));
    }

    #[test]
    fn no_ratio_when_either_side_failed() {
        assert_eq!(compare_speed(FAILED_ELAPSED_MS, 5.0), None);
        assert_eq!(compare_speed(5.0, FAILED_ELAPSED_MS), None);

        let comparison = QueryComparison {
            relational: completed(12, 3),
            document: Measurement::Failed { error: "boom".to_string() },
        };
        assert_eq!(comparison.speed(), None);
        assert_eq!(comparison.document.elapsed_ms(), FAILED_ELAPSED_MS);
        assert_eq!(comparison.document.row_count(), 0);
        assert_eq!(comparison.relational.row_count(), 3);
    }

    #[test]
    fn skipped_measurement_uses_sentinel() {
        assert_eq!(Measurement::Skipped.elapsed_ms(), FAILED_ELAPSED_MS);
        assert!(!Measurement::Skipped.is_completed());
        assert!(completed(1, 0).is_completed());
    }
}
