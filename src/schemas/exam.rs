use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, macros::format_description};
use time::{OffsetDateTime, PrimitiveDateTime};
use validator::{Validate, ValidationError};

use crate::core::time::format_primitive;
use crate::db::models::Exam;
use crate::repositories::exams::ExamSummaryRow;

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_create_window"))]
pub(crate) struct ExamCreate {
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(alias = "startTime", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) start_time: OffsetDateTime,
    #[serde(alias = "endTime", deserialize_with = "deserialize_datetime_flexible")]
    pub(crate) end_time: OffsetDateTime,
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: i32,
    #[serde(alias = "totalGrade")]
    #[validate(range(exclusive_min = 0.0, message = "total_grade must be positive"))]
    pub(crate) total_grade: f64,
    #[serde(default = "default_attempts_allowed")]
    #[serde(alias = "attemptsAllowed")]
    #[validate(range(min = 1, message = "attempts_allowed must be positive"))]
    pub(crate) attempts_allowed: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ExamUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "name must not be empty"))]
    pub(crate) name: Option<String>,
    #[serde(
        default,
        alias = "startTime",
        deserialize_with = "deserialize_option_datetime_flexible"
    )]
    pub(crate) start_time: Option<OffsetDateTime>,
    #[serde(
        default,
        alias = "endTime",
        deserialize_with = "deserialize_option_datetime_flexible"
    )]
    pub(crate) end_time: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
    #[serde(default)]
    #[serde(alias = "totalGrade")]
    #[validate(range(exclusive_min = 0.0, message = "total_grade must be positive"))]
    pub(crate) total_grade: Option<f64>,
    #[serde(default)]
    #[serde(alias = "attemptsAllowed")]
    #[validate(range(min = 1, message = "attempts_allowed must be positive"))]
    pub(crate) attempts_allowed: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SessionStartRequest {
    #[serde(default)]
    pub(crate) confirm: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) total_grade: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ExamResponse {
    pub(crate) fn from_db(exam: Exam) -> Self {
        Self {
            id: exam.id,
            name: exam.name,
            start_time: format_primitive(exam.start_time),
            end_time: format_primitive(exam.end_time),
            duration_minutes: exam.duration_minutes,
            total_grade: exam.total_grade,
            attempts_allowed: exam.attempts_allowed,
            created_by: exam.created_by,
            created_at: format_primitive(exam.created_at),
            updated_at: format_primitive(exam.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSummaryResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    pub(crate) duration_minutes: i32,
    pub(crate) total_grade: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) question_count: i64,
    pub(crate) submission_count: i64,
}

impl ExamSummaryResponse {
    pub(crate) fn from_row(row: ExamSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            start_time: format_primitive(row.start_time),
            end_time: format_primitive(row.end_time),
            duration_minutes: row.duration_minutes,
            total_grade: row.total_grade,
            attempts_allowed: row.attempts_allowed,
            question_count: row.question_count,
            submission_count: row.submission_count,
        }
    }
}

fn default_attempts_allowed() -> i32 {
    1
}

fn validate_create_window(payload: &ExamCreate) -> Result<(), ValidationError> {
    if payload.end_time <= payload.start_time {
        let mut error = ValidationError::new("window");
        error.message = Some("end_time must be after start_time".into());
        return Err(error);
    }
    Ok(())
}

fn parse_datetime_flexible(raw: &str) -> Option<OffsetDateTime> {
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(value);
    }

    // Mobile date pickers send local wall time without an offset; treat it as UTC.
    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value.assume_utc());
    }
    PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

fn deserialize_datetime_flexible<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime_flexible(&raw)
        .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
}

fn deserialize_option_datetime_flexible<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(value) => parse_datetime_flexible(&value)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {value}")))
            .map(Some),
        None => Ok(None),
    }
}
