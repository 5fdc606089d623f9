use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::core::config::BaasSettings;
use crate::schemas::documents::{
    CourseAnalyticsRecord, CourseCompletionRecord, CourseObject, EnrollmentObject,
    HomeworkObject, HomeworkReviewRecord, LessonRef, MissingHomeworkRecord, ReviewRef,
    SubmissionObject, TeacherObject, TeacherWorkloadRecord,
};
use crate::services::aggregation;
use crate::services::parse_client::{Credentials, ParseApiError, ParseClient};

use super::{quote, DataSourceError, Report, ReportOutput, ReportParams, ReportSource, RowPreview};

const COMPLETION_FUNCTION: &str = "getCourseCompletion";
const HOMEWORK_INCLUDE: &[&str] = &["lesson", "lesson.module", "lesson.module.course"];
const TEACHER_INCLUDE: &[&str] = &["user", "courses", "reviews"];
const COURSE_INCLUDE: &[&str] = &["instructor", "instructor.user", "enrollments", "modules"];

/// Back4app side of the comparison, talking to the Parse REST API.
#[derive(Debug, Clone)]
pub(crate) struct DocumentReportSource {
    client: ParseClient,
    credentials: Credentials,
    fetch_limit: u32,
}

impl DocumentReportSource {
    pub(crate) fn new(client: ParseClient, credentials: Credentials, fetch_limit: u32) -> Self {
        Self { client, credentials, fetch_limit }
    }

    pub(crate) fn from_settings(settings: &BaasSettings) -> anyhow::Result<Self> {
        let client = ParseClient::from_settings(settings)?;
        Ok(Self::new(client, Credentials::from_settings(settings), settings.fetch_limit))
    }

    /// `GET /health`; anything but `{"status": "ok"}` counts as unreachable.
    pub(crate) async fn check_connection(&self) -> Result<(), DataSourceError> {
        let health = self.client.health(&self.credentials).await.map_err(|err| {
            tracing::warn!(source = "back4app", error = %err, "Back4app health check failed");
            DataSourceError::from(err)
        })?;

        if health.status != "ok" {
            return Err(DataSourceError::Connection(
                format!("health endpoint reported status {:?}", health.status).into(),
            ));
        }
        Ok(())
    }

    /// Joins enrollments, homeworks and submissions in the client.
    pub(crate) async fn students_with_missing_homeworks(
        &self,
        min_missing: i64,
    ) -> Result<Vec<MissingHomeworkRecord>, DataSourceError> {
        let report = Report::MissingHomeworks;
        let enrollments: Vec<EnrollmentObject> =
            self.fetch(report, "CourseEnrollment", &["student", "course"]).await?;
        let homeworks: Vec<HomeworkObject> =
            self.fetch(report, "Homework", HOMEWORK_INCLUDE).await?;
        let submissions: Vec<SubmissionObject> =
            self.fetch(report, "HomeworkSubmission", &[]).await?;

        Ok(aggregation::missing_homeworks(&enrollments, &homeworks, &submissions, min_missing))
    }

    pub(crate) async fn course_completion_rate(
        &self,
    ) -> Result<Vec<CourseCompletionRecord>, DataSourceError> {
        self.client
            .call_function(COMPLETION_FUNCTION, &self.credentials, &json!({}))
            .await
            .map_err(|err| log_failure(Report::CourseCompletion, err))
    }

    pub(crate) async fn homework_review_cycle(
        &self,
    ) -> Result<Vec<HomeworkReviewRecord>, DataSourceError> {
        let report = Report::HomeworkReviewCycle;
        let homeworks: Vec<HomeworkObject> =
            self.fetch(report, "Homework", HOMEWORK_INCLUDE).await?;
        let submissions: Vec<SubmissionObject> =
            self.fetch(report, "HomeworkSubmission", &[]).await?;
        let reviews: Vec<ReviewRef> = self.fetch(report, "HomeworkReview", &[]).await?;

        Ok(aggregation::homework_review_cycle(&homeworks, &submissions, &reviews))
    }

    pub(crate) async fn teacher_workload(
        &self,
    ) -> Result<Vec<TeacherWorkloadRecord>, DataSourceError> {
        let report = Report::TeacherWorkload;
        let teachers: Vec<TeacherObject> = self.fetch(report, "Teacher", TEACHER_INCLUDE).await?;
        let enrollments: Vec<EnrollmentObject> =
            self.fetch(report, "CourseEnrollment", &[]).await?;

        Ok(aggregation::teacher_workload(&teachers, &enrollments))
    }

    pub(crate) async fn course_analytics(
        &self,
    ) -> Result<Vec<CourseAnalyticsRecord>, DataSourceError> {
        let report = Report::CourseAnalytics;
        let courses: Vec<CourseObject> = self.fetch(report, "Course", COURSE_INCLUDE).await?;
        let lessons: Vec<LessonRef> = self.fetch(report, "Lesson", &[]).await?;

        Ok(aggregation::course_analytics(&courses, &lessons))
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        report: Report,
        class_name: &str,
        include: &[&str],
    ) -> Result<Vec<T>, DataSourceError> {
        self.client
            .fetch_class(class_name, &self.credentials, include, self.fetch_limit)
            .await
            .map_err(|err| log_failure(report, err))
    }
}

fn log_failure(report: Report, err: ParseApiError) -> DataSourceError {
    tracing::error!(
        report = report.key(),
        source = "back4app",
        timed_out = err.is_timeout(),
        error = %err,
        "Back4app report failed"
    );
    err.into()
}

#[async_trait]
impl ReportSource for DocumentReportSource {
    fn label(&self) -> &'static str {
        "Back4app"
    }

    fn metric_source(&self) -> &'static str {
        "back4app"
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

impl RowPreview for MissingHomeworkRecord {
    fn preview(&self) -> String {
        format!(
            "({}, {}, {})",
            self.student_id,
            quote(self.student_name.as_deref()),
            self.course_id
        )
    }
}

impl RowPreview for CourseCompletionRecord {
    fn preview(&self) -> String {
        format!(
            "({}, {}, {})",
            self.enrollment_id,
            self.student_id,
            quote(self.student_name.as_deref())
        )
    }
}

impl RowPreview for HomeworkReviewRecord {
    fn preview(&self) -> String {
        format!(
            "({}, {}, {})",
            self.homework_id,
            quote(self.homework_title.as_deref()),
            quote(self.course_title.as_deref())
        )
    }
}

impl RowPreview for TeacherWorkloadRecord {
    fn preview(&self) -> String {
        format!(
            "({}, {}, {})",
            self.teacher_id,
            quote(self.teacher_name.as_deref()),
            quote(self.specialization.as_deref())
        )
    }
}

impl RowPreview for CourseAnalyticsRecord {
    fn preview(&self) -> String {
        format!(
            "({}, {}, {})",
            self.course_id,
            quote(self.course_title.as_deref()),
            quote(self.instructor_name.as_deref())
        )
    }
}

#[cfg(test)]
mod tests;
