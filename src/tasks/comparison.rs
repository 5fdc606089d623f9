use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::core::metrics;
use crate::sources::{DataSourceError, Report, ReportParams, ReportSource};
use crate::tasks::measurement::{Measurement, QueryComparison};

const RULE_WIDTH: usize = 80;

/// Runs every report against both sources, one call at a time, and prints the
/// per-query lines followed by a summary.
pub(crate) struct ComparisonHarness<'a> {
    relational: &'a dyn ReportSource,
    document: Option<&'a dyn ReportSource>,
    document_label: &'static str,
    params: ReportParams,
    query_timeout: Duration,
    results: BTreeMap<&'static str, QueryComparison>,
}

impl<'a> ComparisonHarness<'a> {
    pub(crate) fn new(
        relational: &'a dyn ReportSource,
        document: Option<&'a dyn ReportSource>,
        params: ReportParams,
        query_timeout: Duration,
    ) -> Self {
        Self {
            relational,
            document,
            document_label: document.map_or("Back4app", |source| source.label()),
            params,
            query_timeout,
            results: BTreeMap::new(),
        }
    }

    pub(crate) fn results(&self) -> &BTreeMap<&'static str, QueryComparison> {
        &self.results
    }

    pub(crate) async fn run_all<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(
            out,
            "COMPARISON TEST SUITE: {} vs {}",
            self.relational.label(),
            self.document_label
        )?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        for report in Report::ALL {
            self.run_report(report, out).await?;
        }

        self.write_summary(out)
    }

    pub(crate) async fn run_report<W: Write>(
        &mut self,
        report: Report,
        out: &mut W,
    ) -> io::Result<()> {
        writeln!(out, "\n[QUERY {}] {}", report.number(), report.title())?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

        let relational = measure(self.relational, report, &self.params, self.query_timeout).await;
        write_measurement(out, self.relational.label(), &relational)?;

        let document = match self.document {
            Some(source) => measure(source, report, &self.params, self.query_timeout).await,
            None => Measurement::Skipped,
        };
        write_measurement(out, self.document_label, &document)?;

        let comparison = QueryComparison { relational, document };
        if let Some(speed) = comparison.speed() {
            writeln!(
                out,
                "  Speed ratio: {} is {:.1}x {}",
                self.document_label, speed.ratio, speed.verdict
            )?;
        }

        self.results.insert(report.key(), comparison);
        Ok(())
    }

    pub(crate) fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\n{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out, "SUMMARY")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;

        let relational_label = self.relational.label();
        let mut relational_total = 0.0;
        let mut document_total = 0.0;
        let mut compared = 0usize;

        for (name, comparison) in &self.results {
            writeln!(
                out,
                "{}: {} {} vs {} {}",
                name.to_uppercase(),
                relational_label,
                summary_time(&comparison.relational),
                self.document_label,
                summary_time(&comparison.document)
            )?;

            if comparison.relational.is_completed() && comparison.document.is_completed() {
                relational_total += comparison.relational.elapsed_ms();
                document_total += comparison.document.elapsed_ms();
                compared += 1;
            }
        }

        if compared == 0 {
            writeln!(out, "TOTAL: no query completed on both sources")?;
        } else {
            writeln!(
                out,
                "TOTAL ({compared} of {} compared): {relational_label} {relational_total:.2}ms \
                 vs {} {document_total:.2}ms",
                self.results.len(),
                self.document_label
            )?;
        }
        Ok(())
    }
}

async fn measure(
    source: &dyn ReportSource,
    report: Report,
    params: &ReportParams,
    query_timeout: Duration,
) -> Measurement {
    let started = Instant::now();
    let outcome = match tokio::time::timeout(query_timeout, source.run(report, params)).await {
        Ok(result) => result,
        Err(_) => Err(DataSourceError::Timeout(query_timeout)),
    };
    let elapsed = started.elapsed();

    match outcome {
        Ok(output) => {
            metrics::record_query(source.metric_source(), report.key(), elapsed);
            tracing::debug!(
                report = report.key(),
                source = source.metric_source(),
                rows = output.rows,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Report finished"
            );
            Measurement::Completed { elapsed, rows: output.rows, first_row: output.first_row }
        }
        Err(err) => {
            metrics::record_failure(source.metric_source(), report.key());
            tracing::warn!(
                report = report.key(),
                source = source.metric_source(),
                error = %err,
                "Report failed"
            );
            Measurement::Failed { error: err.to_string() }
        }
    }
}

fn write_measurement<W: Write>(
    out: &mut W,
    label: &str,
    measurement: &Measurement,
) -> io::Result<()> {
    match measurement {
        Measurement::Completed { elapsed, rows, first_row } => {
            writeln!(
                out,
                "✓ {label:<8} : {rows} rows in {:.2}ms",
                elapsed.as_secs_f64() * 1000.0
            )?;
            if let Some(first_row) = first_row {
                writeln!(out, "  First result: {first_row}")?;
            }
        }
        Measurement::Failed { error } => writeln!(out, "✗ {label:<8} : Error - {error}")?,
        Measurement::Skipped => writeln!(out, "- {label:<8} : skipped (not connected)")?,
    }
    Ok(())
}

fn summary_time(measurement: &Measurement) -> String {
    match measurement {
        Measurement::Completed { .. } => format!("{:.2}ms", measurement.elapsed_ms()),
        Measurement::Failed { .. } => "failed".to_string(),
        Measurement::Skipped => "skipped".to_string(),
    }
}
