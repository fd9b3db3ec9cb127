use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::ExamSession;
use crate::repositories;
use crate::schemas::exam::SessionStartRequest;
use crate::schemas::session::SessionResponse;
use crate::services::session_finalize::{finalize_session, FinalizeMode};
use crate::services::session_gate;
use crate::services::session_timing::{
    accepts_submission, compute_session_expiration, remaining_seconds,
};

use super::super::helpers;

pub(in crate::api::exams) async fn start_session(
    Path(exam_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    payload: Option<Json<SessionStartRequest>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let confirmed = payload.map(|Json(request)| request.confirm).unwrap_or(false);

    if !student.profile_completed() {
        return Err(ApiError::Forbidden("Complete your profile before starting an exam"));
    }

    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    let now = primitive_now_utc();

    if let Some(active) = repositories::sessions::find_active(state.db(), &exam.id, &student.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch active session"))?
    {
        let grace = state.settings().exam().submit_grace_seconds;
        if accepts_submission(active.expires_at, now, grace) {
            return Ok((StatusCode::OK, Json(session_response(active, now))));
        }
        finalize_session(
            state.db(),
            &active,
            &active.answers.0,
            FinalizeMode::AutoDeadline,
            active.expires_at,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close expired session"))?;
    }

    let decision = session_gate::evaluate(&exam, now);
    session_gate::admit(&decision, confirmed)?;

    let attempts =
        repositories::sessions::count_by_exam_and_student(state.db(), &exam.id, &student.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count attempts"))?;
    if attempts >= i64::from(exam.attempts_allowed) {
        return Err(ApiError::Conflict("No attempts left for this exam".to_string()));
    }

    let expires_at = compute_session_expiration(now, exam.end_time, exam.duration_minutes)
        .map_err(|e| ApiError::internal(e, "Invalid exam duration"))?;

    let created = repositories::sessions::create(
        state.db(),
        repositories::sessions::CreateSession {
            id: &Uuid::new_v4().to_string(),
            exam_id: &exam.id,
            student_id: &student.id,
            attempt_number: attempts as i32 + 1,
            started_at: now,
            expires_at,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create session"))?;

    match created {
        Some(session) => {
            tracing::info!(
                session_id = %session.id,
                exam_id = %exam.id,
                student_id = %student.id,
                attempt = session.attempt_number,
                "Exam session started"
            );
            metrics::counter!("sessions_started_total").increment(1);
            Ok((StatusCode::CREATED, Json(session_response(session, now))))
        }
        None => {
            // A concurrent request started the attempt first.
            let session = repositories::sessions::find_active(state.db(), &exam.id, &student.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch active session"))?
                .ok_or_else(|| ApiError::Conflict("Session could not be started".to_string()))?;
            Ok((StatusCode::OK, Json(session_response(session, now))))
        }
    }
}

fn session_response(session: ExamSession, now: time::PrimitiveDateTime) -> SessionResponse {
    let remaining = remaining_seconds(session.expires_at, now);
    SessionResponse::from_db(session, remaining)
}
