use sqlx::types::Json;
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Question;
use crate::db::types::QuestionKind;

const COLUMNS: &str = "\
    id, exam_id, kind, text, options, correct_answer, grade, image_url, order_index, created_at";

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) exam_id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) text: &'a str,
    pub(crate) options: &'a [String],
    pub(crate) correct_answer: Option<&'a str>,
    pub(crate) grade: f64,
    pub(crate) image_url: Option<&'a str>,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY order_index, created_at"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn create(
    pool: &PgPool,
    question: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, exam_id, kind, text, options, correct_answer, grade, image_url,
            order_index, created_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8,
            (SELECT COALESCE(MAX(order_index) + 1, 0) FROM questions WHERE exam_id = $2),
            $9
        )
        RETURNING {COLUMNS}"
    ))
    .bind(question.id)
    .bind(question.exam_id)
    .bind(question.kind)
    .bind(question.text)
    .bind(Json(question.options))
    .bind(question.correct_answer)
    .bind(question.grade)
    .bind(question.image_url)
    .bind(question.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, exam_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE exam_id = $1 AND id = $2")
        .bind(exam_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
