use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::config::DatabaseSettings;
use crate::db::{
    self,
    models::{
        CourseAnalyticsRow, CourseCompletionRow, HomeworkReviewRow, MissingHomeworkRow,
        TeacherWorkloadRow,
    },
};
use crate::repositories::reports;

use super::{quote, DataSourceError, Report, ReportOutput, ReportParams, ReportSource, RowPreview};

/// PostgreSQL side of the comparison.
#[derive(Debug, Clone)]
pub(crate) struct RelationalReportSource {
    pool: PgPool,
}

impl RelationalReportSource {
    pub(crate) async fn connect(settings: &DatabaseSettings) -> Result<Self, DataSourceError> {
        let pool = db::init_pool(settings).await.map_err(|err| {
            tracing::error!(error = %err, "Failed to connect to PostgreSQL");
            DataSourceError::Connection(Box::new(err))
        })?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub(crate) fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn close(&self) {
        self.pool.close().await;
    }

    pub(crate) async fn students_with_missing_homeworks(
        &self,
        min_missing: i64,
    ) -> Result<Vec<MissingHomeworkRow>, DataSourceError> {
        reports::students_with_missing_homeworks(&self.pool, min_missing)
            .await
            .map_err(|err| log_failure(Report::MissingHomeworks, err))
    }

    pub(crate) async fn course_completion_rate(
        &self,
    ) -> Result<Vec<CourseCompletionRow>, DataSourceError> {
        reports::course_completion_rate(&self.pool)
            .await
            .map_err(|err| log_failure(Report::CourseCompletion, err))
    }

    pub(crate) async fn homework_review_cycle(
        &self,
    ) -> Result<Vec<HomeworkReviewRow>, DataSourceError> {
        reports::homework_review_cycle(&self.pool)
            .await
            .map_err(|err| log_failure(Report::HomeworkReviewCycle, err))
    }

    pub(crate) async fn teacher_workload(
        &self,
    ) -> Result<Vec<TeacherWorkloadRow>, DataSourceError> {
        reports::teacher_workload(&self.pool)
            .await
            .map_err(|err| log_failure(Report::TeacherWorkload, err))
    }

    pub(crate) async fn course_analytics(
        &self,
    ) -> Result<Vec<CourseAnalyticsRow>, DataSourceError> {
        reports::course_analytics(&self.pool)
            .await
            .map_err(|err| log_failure(Report::CourseAnalytics, err))
    }
}

fn log_failure(report: Report, err: sqlx::Error) -> DataSourceError {
    tracing::error!(report = report.key(), source = "postgres", error = %err, "SQL report failed");
    err.into()
}

#[async_trait]
impl ReportSource for RelationalReportSource {
    fn label(&self) -> &'static str {
        "SQL"
    }

    fn metric_source(&self) -> &'static str {
        "postgres"
    }

    async fn run(
        &self,
        report: Report,
        params: &ReportParams,
    ) -> Result<ReportOutput, DataSourceError> {
        let output = match report {
            Report::MissingHomeworks => ReportOutput::from_rows(
                &self.students_with_missing_homeworks(params.min_missing).await?,
            ),
            Report::CourseCompletion => {
                ReportOutput::from_rows(&self.course_completion_rate().await?)
            }
            Report::HomeworkReviewCycle => {
                ReportOutput::from_rows(&self.homework_review_cycle().await?)
            }
            Report::TeacherWorkload => ReportOutput::from_rows(&self.teacher_workload().await?),
            Report::CourseAnalytics => ReportOutput::from_rows(&self.course_analytics().await?),
        };
        Ok(output)
    }
}

// Previews show the first three columns of a row.

impl RowPreview for MissingHomeworkRow {
    fn preview(&self) -> String {
        format!("({}, '{}', {})", self.student_id, self.student_name, self.course_id)
    }
}

impl RowPreview for CourseCompletionRow {
    fn preview(&self) -> String {
        format!("({}, {}, '{}')", self.enrollment_id, self.student_id, self.student_name)
    }
}

impl RowPreview for HomeworkReviewRow {
    fn preview(&self) -> String {
        format!("({}, '{}', '{}')", self.homework_id, self.homework_title, self.course_title)
    }
}

impl RowPreview for TeacherWorkloadRow {
    fn preview(&self) -> String {
        format!(
            "({}, '{}', {})",
            self.teacher_id,
            self.teacher_name,
            quote(self.specialization.as_deref())
        )
    }
}

impl RowPreview for CourseAnalyticsRow {
    fn preview(&self) -> String {
        format!("({}, '{}', '{}')", self.course_id, self.course_title, self.instructor_name)
    }
}
