use serde::Deserialize;

use super::parse::{lenient_f64, Pointer};

/// A user-like record; Cloud Code stores `name`, the relational export stores
/// first and last names.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersonRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) first_name: Option<String>,
    #[serde(default)]
    pub(crate) last_name: Option<String>,
}

impl PersonRef {
    pub(crate) fn display_name(&self) -> Option<String> {
        if let Some(name) = self.name.as_ref().filter(|name| !name.is_empty()) {
            return Some(name.clone());
        }
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) difficulty_level: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModuleRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) course: Option<CourseRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LessonRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) module: Option<ModuleRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) submission: Option<Pointer>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TeacherRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) user: Option<PersonRef>,
}

impl TeacherRef {
    pub(crate) fn display_name(&self) -> Option<String> {
        self.name.clone().or_else(|| self.user.as_ref().and_then(PersonRef::display_name))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrollmentRef {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) grade: Option<f64>,
}

/// `CourseEnrollment` with `student` and `course` included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnrollmentObject {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) student: Option<PersonRef>,
    #[serde(default)]
    pub(crate) course: Option<CourseRef>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) grade: Option<f64>,
}

/// `Homework` with `lesson.module.course` included. Some datasets also keep a
/// direct `course` pointer on the homework.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct HomeworkObject {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) lesson: Option<LessonRef>,
    #[serde(default)]
    pub(crate) course: Option<CourseRef>,
}

impl HomeworkObject {
    pub(crate) fn course(&self) -> Option<&CourseRef> {
        self.course.as_ref().or_else(|| {
            self.lesson.as_ref().and_then(|lesson| lesson.module.as_ref())?.course.as_ref()
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmissionObject {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) homework: Option<Pointer>,
    #[serde(default)]
    pub(crate) student: Option<Pointer>,
    #[serde(default)]
    pub(crate) status: Option<String>,
    #[serde(default)]
    pub(crate) is_late: Option<bool>,
}

/// `Teacher` with `courses` and `reviews` included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TeacherObject {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) specialization: Option<String>,
    #[serde(default)]
    pub(crate) user: Option<PersonRef>,
    #[serde(default)]
    pub(crate) courses: Option<Vec<CourseRef>>,
    #[serde(default)]
    pub(crate) reviews: Option<Vec<ReviewRef>>,
}

impl TeacherObject {
    /// Reviews with a status other than `Approved`; reviews without a status
    /// are not counted.
    pub(crate) fn pending_reviews(&self) -> i64 {
        self.reviews
            .iter()
            .flatten()
            .filter(|review| review.status.as_deref().is_some_and(|status| status != "Approved"))
            .count() as i64
    }
}

/// `Course` with `instructor`, `enrollments` and `modules` included.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseObject {
    pub(crate) object_id: String,
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) difficulty_level: Option<String>,
    #[serde(default)]
    pub(crate) instructor: Option<TeacherRef>,
    #[serde(default)]
    pub(crate) enrollments: Option<Vec<EnrollmentRef>>,
    #[serde(default)]
    pub(crate) modules: Option<Vec<ModuleRef>>,
}

/// Row produced by the `getCourseCompletion` Cloud Code function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CourseCompletionRecord {
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    #[serde(default)]
    pub(crate) student_name: Option<String>,
    pub(crate) course_id: String,
    #[serde(default)]
    pub(crate) course_title: Option<String>,
    #[serde(default)]
    pub(crate) difficulty_level: Option<String>,
    pub(crate) total_lessons: i64,
    pub(crate) completed_lessons: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) completion_percentage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub(crate) avg_time_per_lesson: Option<f64>,
    #[serde(default)]
    pub(crate) enrollment_status: Option<String>,
}

/// Missing-homework row computed in the client from fetched collections.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MissingHomeworkRecord {
    pub(crate) student_id: String,
    pub(crate) student_name: Option<String>,
    pub(crate) course_id: String,
    pub(crate) course_title: Option<String>,
    pub(crate) total_homeworks: i64,
    pub(crate) submitted_homeworks: i64,
    pub(crate) missing_submissions: i64,
    pub(crate) submission_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HomeworkReviewRecord {
    pub(crate) homework_id: String,
    pub(crate) homework_title: Option<String>,
    pub(crate) course_id: String,
    pub(crate) course_title: Option<String>,
    pub(crate) total_submissions: i64,
    pub(crate) graded: i64,
    pub(crate) late_submissions: i64,
    pub(crate) avg_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TeacherWorkloadRecord {
    pub(crate) teacher_id: String,
    pub(crate) teacher_name: Option<String>,
    pub(crate) specialization: Option<String>,
    pub(crate) courses_teaching: i64,
    pub(crate) total_students: i64,
    pub(crate) pending_reviews: i64,
    pub(crate) avg_grade_given: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CourseAnalyticsRecord {
    pub(crate) course_id: String,
    pub(crate) course_title: Option<String>,
    pub(crate) instructor_name: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) difficulty_level: Option<String>,
    pub(crate) enrolled_students: i64,
    pub(crate) completed: i64,
    pub(crate) num_modules: i64,
    pub(crate) num_lessons: i64,
    pub(crate) avg_student_grade: Option<f64>,
    pub(crate) completion_rate: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::parse::QueryEnvelope;

    #[test]
    fn homework_resolves_course_through_included_lesson_chain() {
        let envelope: QueryEnvelope<HomeworkObject> = serde_json::from_str(
            r#"{"results": [{
                "objectId": "hw1",
                "title": "Joins",
                "lesson": {
                    "__type": "Object", "className": "Lesson", "objectId": "l1",
                    "module": {
                        "__type": "Object", "className": "Module", "objectId": "m1",
                        "course": {"__type": "Object", "className": "Course",
                                   "objectId": "c1", "title": "Databases"}
                    }
                }
            }]}"#,
        )
        .unwrap();

        let homework = &envelope.results[0];
        let course = homework.course().expect("course");
        assert_eq!(course.object_id, "c1");
        assert_eq!(course.title.as_deref(), Some("Databases"));
    }

    #[test]
    fn homework_prefers_direct_course_pointer() {
        let homework: HomeworkObject = serde_json::from_str(
            r#"{"objectId": "hw2",
                "course": {"__type": "Pointer", "className": "Course", "objectId": "c9"},
                "lesson": {"__type": "Pointer", "className": "Lesson", "objectId": "l1"}}"#,
        )
        .unwrap();
        assert_eq!(homework.course().map(|course| course.object_id.as_str()), Some("c9"));
    }

    #[test]
    fn teacher_counts_reviews_with_a_status_other_than_approved() {
        let teacher: TeacherObject = serde_json::from_str(
            r#"{"objectId": "t1", "specialization": "SQL",
                "reviews": [
                    {"objectId": "r1", "status": "Approved", "score": 90},
                    {"objectId": "r2", "status": "NeedsRevision", "score": "55.5"},
                    {"objectId": "r3"}
                ]}"#,
        )
        .unwrap();
        assert_eq!(teacher.pending_reviews(), 1);
    }

    #[test]
    fn completion_record_accepts_fixed_point_strings() {
        let record: CourseCompletionRecord = serde_json::from_str(
            r#"{"enrollmentId": "e1", "studentId": "s1", "studentName": "Ann Lee",
                "courseId": "c1", "courseTitle": "Databases", "difficultyLevel": "Beginner",
                "totalLessons": 3, "completedLessons": 2,
                "completionPercentage": "66.67", "avgTimePerLesson": "12.00",
                "enrollmentStatus": "Active"}"#,
        )
        .unwrap();
        assert_eq!(record.completion_percentage, Some(66.67));
        assert_eq!(record.avg_time_per_lesson, Some(12.0));
    }

    #[test]
    fn person_display_name_falls_back_to_first_and_last() {
        let person = PersonRef {
            object_id: "u1".to_string(),
            first_name: Some("Ann".to_string()),
            last_name: Some("Lee".to_string()),
            ..PersonRef::default()
        };
        assert_eq!(person.display_name().as_deref(), Some("Ann Lee"));
    }
}
