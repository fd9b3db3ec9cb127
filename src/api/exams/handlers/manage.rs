use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::api::pagination::PaginatedResponse;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::repositories;
use crate::schemas::exam::{ExamCreate, ExamResponse, ExamSummaryResponse, ExamUpdate};

use super::super::helpers;
use super::super::queries::ManageExamsQuery;

pub(in crate::api::exams) async fn create_exam(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamCreate>,
) -> Result<(StatusCode, Json<ExamResponse>), ApiError> {
    payload.validate()?;
    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }

    let exam = repositories::exams::create(
        state.db(),
        repositories::exams::CreateExam {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            start_time: to_primitive_utc(payload.start_time),
            end_time: to_primitive_utc(payload.end_time),
            duration_minutes: payload.duration_minutes,
            total_grade: payload.total_grade,
            attempts_allowed: payload.attempts_allowed,
            created_by: &admin.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create exam"))?;

    tracing::info!(exam_id = %exam.id, admin_id = %admin.id, "Exam created");
    state.refresh_exam_feed().await;

    Ok((StatusCode::CREATED, Json(ExamResponse::from_db(exam))))
}

pub(in crate::api::exams) async fn list_managed_exams(
    Query(params): Query<ManageExamsQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<ExamSummaryResponse>>, ApiError> {
    let rows = repositories::exams::list_summaries(state.db(), params.skip, params.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exams"))?;

    let total_count = rows.first().map(|row| row.total_count).unwrap_or(0);
    Ok(Json(PaginatedResponse {
        items: rows.into_iter().map(ExamSummaryResponse::from_row).collect(),
        total_count,
        skip: params.skip,
        limit: params.limit,
    }))
}

pub(in crate::api::exams) async fn get_exam(
    Path(exam_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamResponse>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    Ok(Json(ExamResponse::from_db(exam)))
}

pub(in crate::api::exams) async fn update_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ExamUpdate>,
) -> Result<Json<ExamResponse>, ApiError> {
    payload.validate()?;
    if payload.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(ApiError::BadRequest("name must not be empty".to_string()));
    }
    let existing = helpers::fetch_exam(&state, &exam_id).await?;

    let start_time = payload.start_time.map(to_primitive_utc);
    let end_time = payload.end_time.map(to_primitive_utc);
    if end_time.unwrap_or(existing.end_time) <= start_time.unwrap_or(existing.start_time) {
        return Err(ApiError::BadRequest("end_time must be after start_time".to_string()));
    }

    let updated = repositories::exams::update(
        state.db(),
        &exam_id,
        repositories::exams::UpdateExam {
            name: payload.name.map(|name| name.trim().to_string()),
            start_time,
            end_time,
            duration_minutes: payload.duration_minutes,
            total_grade: payload.total_grade,
            attempts_allowed: payload.attempts_allowed,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update exam"))?
    .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;

    state.refresh_exam_feed().await;
    Ok(Json(ExamResponse::from_db(updated)))
}

pub(in crate::api::exams) async fn delete_exam(
    Path(exam_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::exams::delete_by_id(state.db(), &exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete exam"))?;
    if !deleted {
        return Err(ApiError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(exam_id = %exam_id, admin_id = %admin.id, "Exam deleted");
    state.refresh_exam_feed().await;
    Ok(StatusCode::NO_CONTENT)
}
