use sqlx::PgPool;

use crate::db::models::{
    CourseAnalyticsRow, CourseCompletionRow, HomeworkReviewRow, MissingHomeworkRow,
    TeacherWorkloadRow,
};

/// Rows returned by the completion report.
pub(crate) const COMPLETION_ROW_CAP: i64 = 20;

pub(crate) async fn students_with_missing_homeworks(
    pool: &PgPool,
    min_missing: i64,
) -> Result<Vec<MissingHomeworkRow>, sqlx::Error> {
    sqlx::query_as::<_, MissingHomeworkRow>(
        "SELECT s.student_id,
                u.first_name || ' ' || u.last_name AS student_name,
                c.course_id,
                c.title AS course_title,
                COUNT(DISTINCT h.homework_id) AS total_homeworks,
                COUNT(DISTINCT hs.submission_id) AS submitted_homeworks,
                COUNT(DISTINCT h.homework_id) - COUNT(DISTINCT hs.submission_id)
                    AS missing_submissions,
                ROUND(
                    COUNT(DISTINCT hs.submission_id) * 100.0
                        / NULLIF(COUNT(DISTINCT h.homework_id), 0),
                    2
                )::float8 AS submission_rate
         FROM students s
         JOIN users u ON u.user_id = s.user_id
         JOIN course_enrollments ce ON ce.student_id = s.student_id
         JOIN courses c ON c.course_id = ce.course_id
         JOIN modules m ON m.course_id = c.course_id
         JOIN lessons l ON l.module_id = m.module_id
         JOIN homeworks h ON h.lesson_id = l.lesson_id
         LEFT JOIN homework_submissions hs
                ON hs.homework_id = h.homework_id AND hs.student_id = s.student_id
         GROUP BY s.student_id, u.first_name, u.last_name, c.course_id, c.title
         HAVING COUNT(DISTINCT h.homework_id) > 0
            AND COUNT(DISTINCT h.homework_id) - COUNT(DISTINCT hs.submission_id) > $1
         ORDER BY missing_submissions DESC, c.title, s.student_id",
    )
    .bind(min_missing)
    .fetch_all(pool)
    .await
}

pub(crate) async fn course_completion_rate(
    pool: &PgPool,
) -> Result<Vec<CourseCompletionRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseCompletionRow>(
        "SELECT ce.enrollment_id,
                s.student_id,
                u.first_name || ' ' || u.last_name AS student_name,
                c.course_id,
                c.title AS course_title,
                c.difficulty_level::text AS difficulty_level,
                COUNT(DISTINCT l.lesson_id) AS total_lessons,
                COUNT(DISTINCT CASE WHEN lp.status = 'Completed' THEN l.lesson_id END)
                    AS completed_lessons,
                ROUND(
                    COUNT(DISTINCT CASE WHEN lp.status = 'Completed' THEN l.lesson_id END) * 100.0
                        / NULLIF(COUNT(DISTINCT l.lesson_id), 0),
                    2
                )::float8 AS completion_percentage,
                ROUND(AVG(lp.time_spent_minutes), 2)::float8 AS avg_time_per_lesson,
                ce.status::text AS enrollment_status
         FROM course_enrollments ce
         JOIN students s ON s.student_id = ce.student_id
         JOIN users u ON u.user_id = s.user_id
         JOIN courses c ON c.course_id = ce.course_id
         LEFT JOIN modules m ON m.course_id = c.course_id
         LEFT JOIN lessons l ON l.module_id = m.module_id
         LEFT JOIN lesson_progress lp
                ON lp.lesson_id = l.lesson_id AND lp.student_id = s.student_id
         GROUP BY ce.enrollment_id, s.student_id, u.first_name, u.last_name,
                  c.course_id, c.title, c.difficulty_level, ce.status
         ORDER BY c.course_id, completion_percentage DESC NULLS LAST, ce.enrollment_id
         LIMIT $1",
    )
    .bind(COMPLETION_ROW_CAP)
    .fetch_all(pool)
    .await
}

pub(crate) async fn homework_review_cycle(
    pool: &PgPool,
) -> Result<Vec<HomeworkReviewRow>, sqlx::Error> {
    sqlx::query_as::<_, HomeworkReviewRow>(
        "SELECT h.homework_id,
                h.title AS homework_title,
                c.title AS course_title,
                COUNT(DISTINCT hs.submission_id) AS total_submissions,
                COUNT(DISTINCT CASE WHEN hs.status = 'Graded' THEN hs.submission_id END)
                    AS graded,
                COUNT(DISTINCT CASE WHEN hs.is_late THEN hs.submission_id END)
                    AS late_submissions,
                ROUND(AVG(hr.score), 2)::float8 AS avg_score
         FROM homeworks h
         JOIN lessons l ON l.lesson_id = h.lesson_id
         JOIN modules m ON m.module_id = l.module_id
         JOIN courses c ON c.course_id = m.course_id
         LEFT JOIN homework_submissions hs ON hs.homework_id = h.homework_id
         LEFT JOIN homework_reviews hr ON hr.submission_id = hs.submission_id
         GROUP BY h.homework_id, h.title, c.course_id, c.title
         ORDER BY c.course_id, h.homework_id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn teacher_workload(
    pool: &PgPool,
) -> Result<Vec<TeacherWorkloadRow>, sqlx::Error> {
    sqlx::query_as::<_, TeacherWorkloadRow>(
        "SELECT t.teacher_id,
                u.first_name || ' ' || u.last_name AS teacher_name,
                t.specialization,
                COUNT(DISTINCT c.course_id) AS courses_teaching,
                COUNT(DISTINCT ce.student_id) AS total_students,
                COUNT(DISTINCT CASE WHEN hr.status <> 'Approved' THEN hr.review_id END)
                    AS pending_reviews,
                ROUND(AVG(hr.score), 2)::float8 AS avg_grade_given
         FROM teachers t
         JOIN users u ON u.user_id = t.user_id
         JOIN courses c ON c.instructor_id = t.teacher_id
         JOIN course_enrollments ce ON ce.course_id = c.course_id
         LEFT JOIN modules m ON m.course_id = c.course_id
         LEFT JOIN lessons l ON l.module_id = m.module_id
         LEFT JOIN homeworks h ON h.lesson_id = l.lesson_id
         LEFT JOIN homework_submissions hs ON hs.homework_id = h.homework_id
         LEFT JOIN homework_reviews hr
                ON hr.submission_id = hs.submission_id AND hr.teacher_id = t.teacher_id
         GROUP BY t.teacher_id, u.first_name, u.last_name, t.specialization
         ORDER BY courses_teaching DESC, t.teacher_id",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn course_analytics(
    pool: &PgPool,
) -> Result<Vec<CourseAnalyticsRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseAnalyticsRow>(
        "SELECT c.course_id,
                c.title AS course_title,
                ut.first_name || ' ' || ut.last_name AS instructor_name,
                c.category::text AS category,
                c.difficulty_level::text AS difficulty_level,
                COUNT(DISTINCT ce.student_id) AS enrolled_students,
                COUNT(DISTINCT CASE WHEN ce.status = 'Completed' THEN ce.student_id END)
                    AS completed,
                COUNT(DISTINCT m.module_id) AS num_modules,
                COUNT(DISTINCT l.lesson_id) AS num_lessons,
                ROUND(AVG(ce.grade), 2)::float8 AS avg_student_grade,
                ROUND(
                    COUNT(DISTINCT CASE WHEN ce.status = 'Completed' THEN ce.student_id END) * 100.0
                        / NULLIF(COUNT(DISTINCT ce.student_id), 0),
                    2
                )::float8 AS completion_rate
         FROM courses c
         JOIN teachers t ON t.teacher_id = c.instructor_id
         JOIN users ut ON ut.user_id = t.user_id
         LEFT JOIN course_enrollments ce ON ce.course_id = c.course_id
         LEFT JOIN modules m ON m.course_id = c.course_id
         LEFT JOIN lessons l ON l.module_id = m.module_id
         GROUP BY c.course_id, c.title, ut.first_name, ut.last_name, c.category,
                  c.difficulty_level
         ORDER BY enrolled_students DESC, c.course_id",
    )
    .fetch_all(pool)
    .await
}
