use std::collections::{BTreeMap, HashMap, HashSet};

use crate::schemas::documents::{
    CourseAnalyticsRecord, CourseObject, EnrollmentObject, HomeworkObject, HomeworkReviewRecord,
    LessonRef, MissingHomeworkRecord, PersonRef, ReviewRef, SubmissionObject, TeacherObject,
    TeacherRef, TeacherWorkloadRecord,
};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total * 100` rounded to two decimals; `None` when `total` is zero.
pub(crate) fn percentage(part: i64, total: i64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    Some(round2(part as f64 * 100.0 / total as f64))
}

fn average(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round2(values.iter().sum::<f64>() / values.len() as f64))
}

/// Client-side equivalent of the missing-homeworks SQL report: groups
/// enrollments by student and course, counts the course's homeworks and the
/// student's submissions for them, and keeps groups missing more than
/// `min_missing`.
pub(crate) fn missing_homeworks(
    enrollments: &[EnrollmentObject],
    homeworks: &[HomeworkObject],
    submissions: &[SubmissionObject],
    min_missing: i64,
) -> Vec<MissingHomeworkRecord> {
    let mut homeworks_by_course: HashMap<&str, HashSet<&str>> = HashMap::new();
    for homework in homeworks {
        if let Some(course) = homework.course() {
            homeworks_by_course
                .entry(course.object_id.as_str())
                .or_default()
                .insert(homework.object_id.as_str());
        }
    }

    let mut submitted: HashMap<&str, HashSet<(&str, &str)>> = HashMap::new();
    for submission in submissions {
        let (Some(student), Some(homework)) = (&submission.student, &submission.homework) else {
            continue;
        };
        submitted
            .entry(student.object_id.as_str())
            .or_default()
            .insert((homework.object_id.as_str(), submission.object_id.as_str()));
    }

    let mut groups: BTreeMap<(&str, &str), &EnrollmentObject> = BTreeMap::new();
    for enrollment in enrollments {
        let (Some(student), Some(course)) = (&enrollment.student, &enrollment.course) else {
            continue;
        };
        groups.entry((student.object_id.as_str(), course.object_id.as_str())).or_insert(enrollment);
    }

    let mut records: Vec<MissingHomeworkRecord> = groups
        .into_iter()
        .filter_map(|((student_id, course_id), enrollment)| {
            let course_homeworks = homeworks_by_course.get(course_id)?;
            let total = course_homeworks.len() as i64;
            let submitted_count = submitted
                .get(student_id)
                .map(|items| {
                    items
                        .iter()
                        .filter(|(homework_id, _)| course_homeworks.contains(homework_id))
                        .count() as i64
                })
                .unwrap_or(0);
            let missing = total - submitted_count;

            if total == 0 || missing <= min_missing {
                return None;
            }

            Some(MissingHomeworkRecord {
                student_id: student_id.to_string(),
                student_name: enrollment.student.as_ref().and_then(PersonRef::display_name),
                course_id: course_id.to_string(),
                course_title: enrollment.course.as_ref().and_then(|course| course.title.clone()),
                total_homeworks: total,
                submitted_homeworks: submitted_count,
                missing_submissions: missing,
                submission_rate: percentage(submitted_count, total),
            })
        })
        .collect();

    records.sort_by(|left, right| {
        right
            .missing_submissions
            .cmp(&left.missing_submissions)
            .then_with(|| left.course_title.cmp(&right.course_title))
            .then_with(|| left.student_id.cmp(&right.student_id))
    });
    records
}

/// Per-homework submission counts and average review score. Homeworks whose
/// course cannot be resolved are left out.
pub(crate) fn homework_review_cycle(
    homeworks: &[HomeworkObject],
    submissions: &[SubmissionObject],
    reviews: &[ReviewRef],
) -> Vec<HomeworkReviewRecord> {
    let mut submissions_by_homework: HashMap<&str, Vec<&SubmissionObject>> = HashMap::new();
    for submission in submissions {
        if let Some(homework) = &submission.homework {
            submissions_by_homework
                .entry(homework.object_id.as_str())
                .or_default()
                .push(submission);
        }
    }

    let mut scores_by_submission: HashMap<&str, Vec<f64>> = HashMap::new();
    for review in reviews {
        if let (Some(submission), Some(score)) = (&review.submission, review.score) {
            scores_by_submission.entry(submission.object_id.as_str()).or_default().push(score);
        }
    }

    let mut records: Vec<HomeworkReviewRecord> = homeworks
        .iter()
        .filter_map(|homework| {
            let course = homework.course()?;
            let submitted = submissions_by_homework
                .get(homework.object_id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();
            let scores: Vec<f64> = submitted
                .iter()
                .filter_map(|submission| scores_by_submission.get(submission.object_id.as_str()))
                .flatten()
                .copied()
                .collect();

            Some(HomeworkReviewRecord {
                homework_id: homework.object_id.clone(),
                homework_title: homework.title.clone(),
                course_id: course.object_id.clone(),
                course_title: course.title.clone(),
                total_submissions: submitted.len() as i64,
                graded: submitted
                    .iter()
                    .filter(|submission| submission.status.as_deref() == Some("Graded"))
                    .count() as i64,
                late_submissions: submitted
                    .iter()
                    .filter(|submission| submission.is_late == Some(true))
                    .count() as i64,
                avg_score: average(&scores),
            })
        })
        .collect();

    records.sort_by(|left, right| {
        left.course_id.cmp(&right.course_id).then_with(|| left.homework_id.cmp(&right.homework_id))
    });
    records
}

/// Courses, distinct enrolled students and review load per teacher. Teachers
/// without any enrolled student are left out.
pub(crate) fn teacher_workload(
    teachers: &[TeacherObject],
    enrollments: &[EnrollmentObject],
) -> Vec<TeacherWorkloadRecord> {
    let mut students_by_course: HashMap<&str, HashSet<&str>> = HashMap::new();
    for enrollment in enrollments {
        if let (Some(student), Some(course)) = (&enrollment.student, &enrollment.course) {
            students_by_course
                .entry(course.object_id.as_str())
                .or_default()
                .insert(student.object_id.as_str());
        }
    }

    let mut records: Vec<TeacherWorkloadRecord> = teachers
        .iter()
        .filter_map(|teacher| {
            let courses: HashSet<&str> = teacher
                .courses
                .iter()
                .flatten()
                .map(|course| course.object_id.as_str())
                .collect();
            let students: HashSet<&str> = courses
                .iter()
                .filter_map(|course_id| students_by_course.get(course_id))
                .flatten()
                .copied()
                .collect();
            if courses.is_empty() || students.is_empty() {
                return None;
            }

            let scores: Vec<f64> =
                teacher.reviews.iter().flatten().filter_map(|review| review.score).collect();
            Some(TeacherWorkloadRecord {
                teacher_id: teacher.object_id.clone(),
                teacher_name: teacher.user.as_ref().and_then(PersonRef::display_name),
                specialization: teacher.specialization.clone(),
                courses_teaching: courses.len() as i64,
                total_students: students.len() as i64,
                pending_reviews: teacher.pending_reviews(),
                avg_grade_given: average(&scores),
            })
        })
        .collect();

    records.sort_by(|left, right| {
        right
            .courses_teaching
            .cmp(&left.courses_teaching)
            .then_with(|| left.teacher_id.cmp(&right.teacher_id))
    });
    records
}

/// Enrollment, completion and content counts per course. Lessons are counted
/// through their `module` pointer against the course's included modules.
pub(crate) fn course_analytics(
    courses: &[CourseObject],
    lessons: &[LessonRef],
) -> Vec<CourseAnalyticsRecord> {
    let mut lessons_by_module: HashMap<&str, HashSet<&str>> = HashMap::new();
    for lesson in lessons {
        if let Some(module) = &lesson.module {
            lessons_by_module
                .entry(module.object_id.as_str())
                .or_default()
                .insert(lesson.object_id.as_str());
        }
    }

    let mut records: Vec<CourseAnalyticsRecord> = courses
        .iter()
        .map(|course| {
            let mut enrollments = BTreeMap::new();
            for enrollment in course.enrollments.iter().flatten() {
                enrollments.entry(enrollment.object_id.as_str()).or_insert(enrollment);
            }
            let enrolled = enrollments.len() as i64;
            let completed = enrollments
                .values()
                .filter(|enrollment| enrollment.status.as_deref() == Some("Completed"))
                .count() as i64;
            let grades: Vec<f64> =
                enrollments.values().filter_map(|enrollment| enrollment.grade).collect();

            let modules: HashSet<&str> = course
                .modules
                .iter()
                .flatten()
                .map(|module| module.object_id.as_str())
                .collect();
            let num_lessons = modules
                .iter()
                .filter_map(|module_id| lessons_by_module.get(module_id))
                .map(HashSet::len)
                .sum::<usize>();

            CourseAnalyticsRecord {
                course_id: course.object_id.clone(),
                course_title: course.title.clone(),
                instructor_name: course.instructor.as_ref().and_then(TeacherRef::display_name),
                category: course.category.clone(),
                difficulty_level: course.difficulty_level.clone(),
                enrolled_students: enrolled,
                completed,
                num_modules: modules.len() as i64,
                num_lessons: num_lessons as i64,
                avg_student_grade: average(&grades),
                completion_rate: percentage(completed, enrolled),
            }
        })
        .collect();

    records.sort_by(|left, right| {
        right
            .enrolled_students
            .cmp(&left.enrolled_students)
            .then_with(|| left.course_id.cmp(&right.course_id))
    });
    records
}
