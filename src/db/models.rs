use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct MissingHomeworkRow {
    pub(crate) student_id: i32,
    pub(crate) student_name: String,
    pub(crate) course_id: i32,
    pub(crate) course_title: String,
    pub(crate) total_homeworks: i64,
    pub(crate) submitted_homeworks: i64,
    pub(crate) missing_submissions: i64,
    pub(crate) submission_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct CourseCompletionRow {
    pub(crate) enrollment_id: i32,
    pub(crate) student_id: i32,
    pub(crate) student_name: String,
    pub(crate) course_id: i32,
    pub(crate) course_title: String,
    pub(crate) difficulty_level: Option<String>,
    pub(crate) total_lessons: i64,
    pub(crate) completed_lessons: i64,
    pub(crate) completion_percentage: Option<f64>,
    pub(crate) avg_time_per_lesson: Option<f64>,
    pub(crate) enrollment_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct HomeworkReviewRow {
    pub(crate) homework_id: i32,
    pub(crate) homework_title: String,
    pub(crate) course_title: String,
    pub(crate) total_submissions: i64,
    pub(crate) graded: i64,
    pub(crate) late_submissions: i64,
    pub(crate) avg_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct TeacherWorkloadRow {
    pub(crate) teacher_id: i32,
    pub(crate) teacher_name: String,
    pub(crate) specialization: Option<String>,
    pub(crate) courses_teaching: i64,
    pub(crate) total_students: i64,
    pub(crate) pending_reviews: i64,
    pub(crate) avg_grade_given: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub(crate) struct CourseAnalyticsRow {
    pub(crate) course_id: i32,
    pub(crate) course_title: String,
    pub(crate) instructor_name: String,
    pub(crate) category: Option<String>,
    pub(crate) difficulty_level: Option<String>,
    pub(crate) enrolled_students: i64,
    pub(crate) completed: i64,
    pub(crate) num_modules: i64,
    pub(crate) num_lessons: i64,
    pub(crate) avg_student_grade: Option<f64>,
    pub(crate) completion_rate: Option<f64>,
}
