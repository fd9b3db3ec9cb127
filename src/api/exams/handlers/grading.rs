use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::grade::{ExamSubmissionResponse, GradeUpdate, GradedSubmissionResponse};

use super::super::helpers;

pub(in crate::api::exams) async fn list_exam_submissions(
    Path(exam_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamSubmissionResponse>>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    let rows = repositories::submissions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    Ok(Json(rows.into_iter().map(ExamSubmissionResponse::from_row).collect()))
}

pub(in crate::api::exams) async fn grade_submission(
    Path((exam_id, student_id)): Path<(String, String)>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GradeUpdate>,
) -> Result<Json<GradedSubmissionResponse>, ApiError> {
    payload.validate()?;
    let exam = helpers::fetch_exam(&state, &exam_id).await?;

    if !payload.total_grade.is_finite() || payload.total_grade > exam.total_grade {
        return Err(ApiError::BadRequest(format!(
            "Grade must be between 0 and {}",
            exam.total_grade
        )));
    }

    let feedback = payload.feedback.as_deref().map(str::trim).filter(|value| !value.is_empty());
    let submission = repositories::submissions::set_grade(
        state.db(),
        &exam.id,
        &student_id,
        payload.total_grade,
        feedback,
        &admin.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save grade"))?
    .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    tracing::info!(
        exam_id = %exam.id,
        student_id = %student_id,
        admin_id = %admin.id,
        total_grade = payload.total_grade,
        "Submission graded"
    );
    metrics::counter!("submissions_graded_total").increment(1);

    Ok(Json(GradedSubmissionResponse::from_db(submission)))
}
