use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Answers, ExamSession};
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, student_id, attempt_number, started_at, expires_at, submitted_at, \
    status, answers, last_auto_save, created_at, updated_at";

pub(crate) struct CreateSession<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!("SELECT {COLUMNS} FROM exam_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_active(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions \
         WHERE exam_id = $1 AND student_id = $2 AND status = $3"
    ))
    .bind(exam_id)
    .bind(student_id)
    .bind(SessionStatus::Active)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn count_by_exam_and_student(
    executor: impl sqlx::PgExecutor<'_>,
    exam_id: &str,
    student_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions WHERE exam_id = $1 AND student_id = $2")
        .bind(exam_id)
        .bind(student_id)
        .fetch_one(executor)
        .await
}

/// Returns `None` when another active session for the same exam and student won the race.
pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    session: CreateSession<'_>,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "INSERT INTO exam_sessions (
            id, exam_id, student_id, attempt_number, started_at, expires_at,
            status, answers, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, '{{}}'::jsonb, $5, $5)
        ON CONFLICT (exam_id, student_id) WHERE status = 'active' DO NOTHING
        RETURNING {COLUMNS}"
    ))
    .bind(session.id)
    .bind(session.exam_id)
    .bind(session.student_id)
    .bind(session.attempt_number)
    .bind(session.started_at)
    .bind(session.expires_at)
    .bind(SessionStatus::Active)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn update_answers(
    pool: &PgPool,
    id: &str,
    answers: &Answers,
    now: PrimitiveDateTime,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "UPDATE exam_sessions
         SET answers = $1, last_auto_save = $2, updated_at = $2
         WHERE id = $3 AND status = $4
         RETURNING {COLUMNS}"
    ))
    .bind(Json(answers))
    .bind(now)
    .bind(id)
    .bind(SessionStatus::Active)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn close(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    status: SessionStatus,
    answers: &Answers,
    now: PrimitiveDateTime,
) -> Result<Option<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "UPDATE exam_sessions
         SET status = $1, answers = $2, submitted_at = $3, updated_at = $3
         WHERE id = $4 AND status = $5
         RETURNING {COLUMNS}"
    ))
    .bind(status)
    .bind(Json(answers))
    .bind(now)
    .bind(id)
    .bind(SessionStatus::Active)
    .fetch_optional(executor)
    .await
}

pub(crate) async fn list_active_expired(
    pool: &PgPool,
    cutoff: PrimitiveDateTime,
    limit: i64,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions
         WHERE status = $1 AND expires_at <= $2
         ORDER BY expires_at
         LIMIT $3"
    ))
    .bind(SessionStatus::Active)
    .bind(cutoff)
    .bind(limit)
    .fetch_all(pool)
    .await
}
