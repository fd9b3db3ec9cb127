use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Exam;

pub(crate) const COLUMNS: &str = "\
    id, name, start_time, end_time, duration_minutes, total_grade, attempts_allowed, \
    created_by, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ExamSummaryRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) total_grade: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) question_count: i64,
    pub(crate) submission_count: i64,
    pub(crate) total_count: i64,
}

pub(crate) struct CreateExam<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) total_grade: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct UpdateExam {
    pub(crate) name: Option<String>,
    pub(crate) start_time: Option<PrimitiveDateTime>,
    pub(crate) end_time: Option<PrimitiveDateTime>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) total_grade: Option<f64>,
    pub(crate) attempts_allowed: Option<i32>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!("SELECT {COLUMNS} FROM exams WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_ending_after(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "SELECT {COLUMNS} FROM exams WHERE end_time > $1 ORDER BY start_time, id"
    ))
    .bind(now)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_summaries(
    pool: &PgPool,
    skip: i64,
    limit: i64,
) -> Result<Vec<ExamSummaryRow>, sqlx::Error> {
    sqlx::query_as::<_, ExamSummaryRow>(
        "SELECT e.id,
                e.name,
                e.start_time,
                e.end_time,
                e.duration_minutes,
                e.total_grade,
                e.attempts_allowed,
                (SELECT COUNT(*) FROM questions q WHERE q.exam_id = e.id) AS question_count,
                (SELECT COUNT(*) FROM submissions s WHERE s.exam_id = e.id) AS submission_count,
                COUNT(*) OVER() AS total_count
         FROM exams e
         ORDER BY e.start_time DESC, e.id
         OFFSET $1 LIMIT $2",
    )
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    exam: CreateExam<'_>,
) -> Result<Exam, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "INSERT INTO exams (
            id, name, start_time, end_time, duration_minutes, total_grade,
            attempts_allowed, created_by, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$9)
        RETURNING {COLUMNS}"
    ))
    .bind(exam.id)
    .bind(exam.name)
    .bind(exam.start_time)
    .bind(exam.end_time)
    .bind(exam.duration_minutes)
    .bind(exam.total_grade)
    .bind(exam.attempts_allowed)
    .bind(exam.created_by)
    .bind(exam.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateExam,
) -> Result<Option<Exam>, sqlx::Error> {
    sqlx::query_as::<_, Exam>(&format!(
        "UPDATE exams SET
            name = COALESCE($1, name),
            start_time = COALESCE($2, start_time),
            end_time = COALESCE($3, end_time),
            duration_minutes = COALESCE($4, duration_minutes),
            total_grade = COALESCE($5, total_grade),
            attempts_allowed = COALESCE($6, attempts_allowed),
            updated_at = $7
         WHERE id = $8
         RETURNING {COLUMNS}"
    ))
    .bind(params.name)
    .bind(params.start_time)
    .bind(params.end_time)
    .bind(params.duration_minutes)
    .bind(params.total_grade)
    .bind(params.attempts_allowed)
    .bind(params.updated_at)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM exams WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
