pub(crate) mod document;
pub(crate) mod relational;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::services::parse_client::ParseApiError;

type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub(crate) enum DataSourceError {
    #[error("connection failed: {0}")]
    Connection(#[source] Cause),
    #[error("query failed: {0}")]
    Query(#[source] Cause),
    #[error("unexpected response shape: {0}")]
    Deserialization(#[source] Cause),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl From<sqlx::Error> for DataSourceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Configuration(_) => Self::Connection(Box::new(err)),
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => Self::Deserialization(Box::new(err)),
            other => Self::Query(Box::new(other)),
        }
    }
}

impl From<ParseApiError> for DataSourceError {
    fn from(err: ParseApiError) -> Self {
        match err {
            ParseApiError::Transport { .. } => Self::Connection(Box::new(err)),
            ParseApiError::Status { .. } => Self::Query(Box::new(err)),
            ParseApiError::Decode { .. } => Self::Deserialization(Box::new(err)),
        }
    }
}

/// The five analytical reports both sources produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Report {
    MissingHomeworks,
    CourseCompletion,
    HomeworkReviewCycle,
    TeacherWorkload,
    CourseAnalytics,
}

impl Report {
    pub(crate) const ALL: [Report; 5] = [
        Report::MissingHomeworks,
        Report::CourseCompletion,
        Report::HomeworkReviewCycle,
        Report::TeacherWorkload,
        Report::CourseAnalytics,
    ];

    pub(crate) fn number(self) -> u8 {
        match self {
            Self::MissingHomeworks => 1,
            Self::CourseCompletion => 2,
            Self::HomeworkReviewCycle => 3,
            Self::TeacherWorkload => 4,
            Self::CourseAnalytics => 5,
        }
    }

    /// Key used in the result map and as a metrics label.
    pub(crate) fn key(self) -> &'static str {
        match self {
            Self::MissingHomeworks => "query1",
            Self::CourseCompletion => "query2",
            Self::HomeworkReviewCycle => "query3",
            Self::TeacherWorkload => "query4",
            Self::CourseAnalytics => "query5",
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            Self::MissingHomeworks => "Students Not Submitting Homeworks",
            Self::CourseCompletion => "Course Completion Rate and Student Progress",
            Self::HomeworkReviewCycle => "Homework Review Cycle Analysis",
            Self::TeacherWorkload => "Teacher Workload Analysis",
            Self::CourseAnalytics => "Course Analytics and Performance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReportParams {
    pub(crate) min_missing: i64,
}

impl Default for ReportParams {
    fn default() -> Self {
        Self { min_missing: 2 }
    }
}

/// Short one-line rendering of a row for the console report.
pub(crate) trait RowPreview {
    fn preview(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReportOutput {
    pub(crate) rows: usize,
    pub(crate) first_row: Option<String>,
}

impl ReportOutput {
    pub(crate) fn from_rows<T: RowPreview>(rows: &[T]) -> Self {
        Self { rows: rows.len(), first_row: rows.first().map(RowPreview::preview) }
    }
}

/// Either side of a comparison.
#[async_trait]
pub(crate) trait ReportSource: Send + Sync {
    /// Name shown in the console report.
    fn label(&self) -> &'static str;

    /// Value of the `source` metrics label.
    fn metric_source(&self) -> &'static str;

    async fn run(
        &self,
        report: Report,
        params: &ReportParams,
    ) -> Result<ReportOutput, DataSourceError>;
}

pub(crate) fn quote(value: Option<&str>) -> String {
    match value {
        Some(text) => format!("'{text}'"),
        None => "None".to_string(),
    }
}
