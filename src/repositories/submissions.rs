use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Answers, Submission};
use crate::db::types::SubmissionGrade;

const COLUMNS: &str = "\
    exam_id, student_id, session_id, answers, total_grade, feedback, auto_submitted, \
    submitted_at, graded_by, graded_at, updated_at";

pub(crate) struct UpsertSubmission<'a> {
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) answers: &'a Answers,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: PrimitiveDateTime,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct StudentGradeRow {
    pub(crate) exam_id: String,
    pub(crate) exam_name: String,
    pub(crate) exam_total_grade: f64,
    pub(crate) total_grade: Option<f64>,
    pub(crate) feedback: Option<String>,
}

impl StudentGradeRow {
    pub(crate) fn grade(&self) -> SubmissionGrade {
        SubmissionGrade::from_column(self.total_grade)
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamSubmissionRow {
    pub(crate) student_id: String,
    pub(crate) student_email: String,
    pub(crate) student_name: Option<String>,
    pub(crate) student_number: Option<String>,
    pub(crate) session_id: String,
    pub(crate) answers: Json<Answers>,
    pub(crate) total_grade: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
}

pub(crate) async fn upsert(
    executor: impl sqlx::PgExecutor<'_>,
    submission: UpsertSubmission<'_>,
) -> Result<Submission, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "INSERT INTO submissions (
            exam_id, student_id, session_id, answers, total_grade, feedback,
            auto_submitted, submitted_at, updated_at
        ) VALUES ($1, $2, $3, $4, NULL, NULL, $5, $6, $6)
        ON CONFLICT (exam_id, student_id) DO UPDATE SET
            session_id = EXCLUDED.session_id,
            answers = EXCLUDED.answers,
            total_grade = NULL,
            feedback = NULL,
            auto_submitted = EXCLUDED.auto_submitted,
            submitted_at = EXCLUDED.submitted_at,
            graded_by = NULL,
            graded_at = NULL,
            updated_at = EXCLUDED.updated_at
        RETURNING {COLUMNS}"
    ))
    .bind(submission.exam_id)
    .bind(submission.student_id)
    .bind(submission.session_id)
    .bind(Json(submission.answers))
    .bind(submission.auto_submitted)
    .bind(submission.submitted_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "SELECT {COLUMNS} FROM submissions WHERE exam_id = $1 AND student_id = $2"
    ))
    .bind(exam_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamSubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamSubmissionRow>(
        "SELECT s.student_id,
                u.email AS student_email,
                u.full_name AS student_name,
                u.student_number,
                s.session_id,
                s.answers,
                s.total_grade,
                s.feedback,
                s.auto_submitted,
                s.submitted_at,
                s.graded_at
         FROM submissions s
         JOIN users u ON u.id = s.student_id
         WHERE s.exam_id = $1
         ORDER BY s.submitted_at",
    )
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_grade(
    pool: &PgPool,
    exam_id: &str,
    student_id: &str,
    total_grade: f64,
    feedback: Option<&str>,
    graded_by: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Submission>, sqlx::Error> {
    sqlx::query_as::<_, Submission>(&format!(
        "UPDATE submissions
         SET total_grade = $1, feedback = $2, graded_by = $3, graded_at = $4, updated_at = $4
         WHERE exam_id = $5 AND student_id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(total_grade)
    .bind(feedback)
    .bind(graded_by)
    .bind(now)
    .bind(exam_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<StudentGradeRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentGradeRow>(
        "SELECT s.exam_id,
                e.name AS exam_name,
                e.total_grade AS exam_total_grade,
                s.total_grade,
                s.feedback
         FROM submissions s
         JOIN exams e ON e.id = s.exam_id
         WHERE s.student_id = $1
         ORDER BY s.submitted_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
