use std::time::Duration;

use serde_json::json;

use super::DocumentReportSource;
use crate::services::parse_client::{Credentials, ParseClient};
use crate::sources::{DataSourceError, Report, ReportParams, ReportSource};
use crate::test_support::{self, FakeParse};

fn source_for(fake: &FakeParse) -> DocumentReportSource {
    let settings = test_support::baas_settings(&fake.server_url());
    DocumentReportSource::from_settings(&settings).expect("document source")
}

fn seed_missing_homework_collections(fake: &FakeParse) {
    fake.respond_results(
        "CourseEnrollment",
        json!([
            {"objectId": "e1", "student": {"objectId": "s1", "name": "Ann Lee"},
             "course": {"objectId": "c1", "title": "Relational Databases"}},
            {"objectId": "e2", "student": {"objectId": "s2", "name": "Bob Stone"},
             "course": {"objectId": "c1", "title": "Relational Databases"}}
        ]),
    );
    let homeworks: Vec<_> = (1..=4)
        .map(|n| {
            json!({
                "objectId": format!("h{n}"),
                "title": format!("Homework {n}"),
                "lesson": {"objectId": "l1", "module": {
                    "objectId": "m1",
                    "course": {"objectId": "c1", "title": "Relational Databases"}
                }}
            })
        })
        .collect();
    fake.respond_results("Homework", json!(homeworks));
    fake.respond_results(
        "HomeworkSubmission",
        json!([
            {"objectId": "x1", "homework": {"objectId": "h1"}, "student": {"objectId": "s2"}},
            {"objectId": "x2", "homework": {"objectId": "h2"}, "student": {"objectId": "s2"}},
            {"objectId": "x3", "homework": {"objectId": "h1"}, "student": {"objectId": "s1"}}
        ]),
    );
}

#[tokio::test]
async fn missing_homeworks_are_joined_client_side() {
    let fake = FakeParse::start().await;
    seed_missing_homework_collections(&fake);
    let source = source_for(&fake);

    let rows = source.students_with_missing_homeworks(2).await.expect("report");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].student_name.as_deref(), Some("Ann Lee"));
    assert_eq!(rows[0].total_homeworks, 4);
    assert_eq!(rows[0].missing_submissions, 3);
    assert_eq!(rows[0].submission_rate, Some(25.0));

    let enrollments = &fake.requests_to("/classes/CourseEnrollment")[0];
    assert_eq!(enrollments.query.get("include").map(String::as_str), Some("student,course"));
    assert_eq!(enrollments.query.get("limit").map(String::as_str), Some("1000"));
    let homeworks = &fake.requests_to("/classes/Homework")[0];
    assert_eq!(
        homeworks.query.get("include").map(String::as_str),
        Some("lesson,lesson.module,lesson.module.course")
    );
}

#[tokio::test]
async fn completion_rate_calls_cloud_function() {
    let fake = FakeParse::start().await;
    fake.respond_function(
        "getCourseCompletion",
        json!([{
            "enrollmentId": "e1", "studentId": "s1", "studentName": "Ann Lee",
            "courseId": "c1", "courseTitle": "Relational Databases",
            "difficultyLevel": "Intermediate", "totalLessons": 3, "completedLessons": 1,
            "completionPercentage": "33.33", "avgTimePerLesson": "20.00",
            "enrollmentStatus": "Active"
        }]),
    );
    let source = source_for(&fake);

    let output = source.run(Report::CourseCompletion, &ReportParams::default()).await.expect("run");

    assert_eq!(output.rows, 1);
    assert_eq!(output.first_row.as_deref(), Some("(e1, s1, 'Ann Lee')"));
    let request = &fake.requests_to("/functions/getCourseCompletion")[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("X-Parse-REST-API-Key"), Some(test_support::test_rest_key()));
}

#[tokio::test]
async fn empty_collection_is_zero_rows_not_an_error() {
    let fake = FakeParse::start().await;
    fake.respond_results("Homework", json!([]));
    fake.respond_results("HomeworkSubmission", json!([]));
    fake.respond_results("HomeworkReview", json!([]));
    let source = source_for(&fake);

    let output =
        source.run(Report::HomeworkReviewCycle, &ReportParams::default()).await.expect("run");

    assert_eq!(output.rows, 0);
    assert_eq!(output.first_row, None);
}

#[tokio::test]
async fn review_cycle_is_aggregated_from_three_collections() {
    let fake = FakeParse::start().await;
    seed_missing_homework_collections(&fake);
    fake.respond_results(
        "HomeworkSubmission",
        json!([
            {"objectId": "x1", "homework": {"objectId": "h1"}, "student": {"objectId": "s1"},
             "status": "Graded", "isLate": false},
            {"objectId": "x2", "homework": {"objectId": "h1"}, "student": {"objectId": "s2"},
             "status": "Graded", "isLate": true},
            {"objectId": "x3", "homework": {"objectId": "h2"}, "student": {"objectId": "s2"},
             "status": "Submitted", "isLate": true}
        ]),
    );
    fake.respond_results(
        "HomeworkReview",
        json!([
            {"objectId": "r1", "submission": {"objectId": "x1"}, "status": "Approved",
             "score": 70},
            {"objectId": "r2", "submission": {"objectId": "x2"}, "status": "Approved",
             "score": "80.00"}
        ]),
    );
    let source = source_for(&fake);

    let rows = source.homework_review_cycle().await.expect("report");

    let summary: Vec<_> = rows
        .iter()
        .map(|row| {
            (
                row.homework_id.as_str(),
                row.total_submissions,
                row.graded,
                row.late_submissions,
                row.avg_score,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("h1", 2, 2, 1, Some(75.0)),
            ("h2", 1, 0, 1, None),
            ("h3", 0, 0, 0, None),
            ("h4", 0, 0, 0, None),
        ]
    );
    assert_eq!(rows[0].course_title.as_deref(), Some("Relational Databases"));
    assert_eq!(fake.requests_to("/classes/HomeworkReview").len(), 1);
}

#[tokio::test]
async fn teacher_and_course_reports_are_aggregated_in_the_client() {
    let fake = FakeParse::start().await;
    fake.respond_results(
        "Teacher",
        json!([{"objectId": "t1", "specialization": "Databases",
                "user": {"objectId": "u1", "firstName": "Tom", "lastName": "Reed"},
                "courses": [{"objectId": "c1"}],
                "reviews": [{"objectId": "r1", "status": "Pending", "score": 88}]}]),
    );
    fake.respond_results(
        "CourseEnrollment",
        json!([
            {"objectId": "e1", "student": {"objectId": "s1"}, "course": {"objectId": "c1"}},
            {"objectId": "e2", "student": {"objectId": "s2"}, "course": {"objectId": "c1"}}
        ]),
    );
    fake.respond_results(
        "Course",
        json!([{"objectId": "c1", "title": "Relational Databases",
                "instructor": {"objectId": "t1", "name": "Tom Reed"},
                "enrollments": [{"objectId": "e1", "status": "Completed", "grade": 91},
                                {"objectId": "e2", "status": "Active", "grade": 77}],
                "modules": [{"objectId": "m1"}]}]),
    );
    fake.respond_results(
        "Lesson",
        json!([{"objectId": "l1", "module": {"objectId": "m1"}},
               {"objectId": "l2", "module": {"objectId": "m1"}}]),
    );
    let source = source_for(&fake);
    let params = ReportParams::default();

    let teachers = source.teacher_workload().await.expect("teachers");
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].total_students, 2);
    assert_eq!(teachers[0].pending_reviews, 1);
    assert_eq!(teachers[0].avg_grade_given, Some(88.0));

    let courses = source.course_analytics().await.expect("courses");
    assert_eq!(courses[0].enrolled_students, 2);
    assert_eq!(courses[0].num_lessons, 2);
    assert_eq!(courses[0].avg_student_grade, Some(84.0));
    assert_eq!(courses[0].completion_rate, Some(50.0));

    let teachers = source.run(Report::TeacherWorkload, &params).await.expect("teachers");
    let courses = source.run(Report::CourseAnalytics, &params).await.expect("courses");
    assert_eq!(teachers.first_row.as_deref(), Some("(t1, 'Tom Reed', 'Databases')"));
    assert_eq!(courses.first_row.as_deref(), Some("(c1, 'Relational Databases', 'Tom Reed')"));

    let request = &fake.requests_to("/classes/Teacher")[0];
    assert_eq!(request.query.get("include").map(String::as_str), Some("user,courses,reviews"));
    let request = &fake.requests_to("/classes/Course")[0];
    assert_eq!(
        request.query.get("include").map(String::as_str),
        Some("instructor,instructor.user,enrollments,modules")
    );
}

#[tokio::test]
async fn failing_supporting_collection_fails_the_report() {
    let fake = FakeParse::start().await;
    fake.respond_results("Course", json!([{"objectId": "c1"}]));
    let source = source_for(&fake);

    let err = source.course_analytics().await.unwrap_err();

    assert!(matches!(err, DataSourceError::Query(_)), "{err}");
    assert!(err.to_string().contains("/classes/Lesson"), "{err}");
}

#[tokio::test]
async fn parse_error_body_becomes_query_error() {
    let fake = FakeParse::start().await;
    fake.respond("GET", "/classes/Teacher", 403, json!({"code": 119, "error": "unauthorized"}));
    let source = source_for(&fake);

    let err = source.teacher_workload().await.unwrap_err();

    assert!(matches!(err, DataSourceError::Query(_)), "{err}");
    assert!(err.to_string().contains("unauthorized"));
}

#[tokio::test]
async fn malformed_objects_are_deserialization_errors() {
    let fake = FakeParse::start().await;
    fake.respond_results("Course", json!([{"title": "no object id"}]));
    let source = source_for(&fake);

    let err = source.course_analytics().await.unwrap_err();

    assert!(matches!(err, DataSourceError::Deserialization(_)), "{err}");
}

#[tokio::test]
async fn unreachable_server_is_a_connection_error() {
    let client = ParseClient::new(
        "http://127.0.0.1:9/parse".to_string(),
        "app".to_string(),
        Duration::from_secs(2),
    )
    .expect("client");
    let source = DocumentReportSource::new(client, Credentials::RestKey("key".to_string()), 1000);

    let err = source.check_connection().await.unwrap_err();
    assert!(matches!(err, DataSourceError::Connection(_)), "{err}");

    let err = source.homework_review_cycle().await.unwrap_err();
    assert!(matches!(err, DataSourceError::Connection(_)), "{err}");
}

#[tokio::test]
async fn health_check_requires_ok_status() {
    let fake = FakeParse::start().await;
    fake.respond("GET", "/health", 200, json!({"status": "initialized"}));
    let source = source_for(&fake);
    assert!(matches!(source.check_connection().await, Err(DataSourceError::Connection(_))));

    fake.respond("GET", "/health", 200, json!({"status": "ok"}));
    source.check_connection().await.expect("healthy");
}
