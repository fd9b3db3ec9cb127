use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use time::PrimitiveDateTime;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentStudent;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{ExamSession, User};
use crate::db::types::SessionStatus;
use crate::repositories;
use crate::schemas::question::SessionQuestionResponse;
use crate::schemas::session::{
    AnswersUpdate, SessionDetailResponse, SessionResponse, SessionSubmit, SubmissionResponse,
};
use crate::services::session_finalize::{finalize_session, merge_answers, FinalizeMode};
use crate::services::session_timing::{accepts_autosave, accepts_submission, remaining_seconds};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:session_id", get(get_session))
        .route("/:session_id/answers", put(save_answers))
        .route("/:session_id/submit", post(submit_session))
}

async fn get_session(
    Path(session_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
) -> Result<Json<SessionDetailResponse>, ApiError> {
    let mut session = fetch_owned_session(&state, &session_id, &student).await?;
    let now = primitive_now_utc();
    let grace = state.settings().exam().submit_grace_seconds;

    if session.status == SessionStatus::Active
        && !accepts_submission(session.expires_at, now, grace)
    {
        if let Some(finalized) = expire_session(&state, &session).await? {
            session = finalized;
        }
    }

    let exam = repositories::exams::find_by_id(state.db(), &session.exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))?;
    let questions = repositories::questions::list_by_exam(state.db(), &exam.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;

    Ok(Json(SessionDetailResponse {
        session: session_response(session, now),
        exam_name: exam.name,
        questions: questions.into_iter().map(SessionQuestionResponse::from_db).collect(),
    }))
}

async fn save_answers(
    Path(session_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    Json(payload): Json<AnswersUpdate>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = fetch_owned_session(&state, &session_id, &student).await?;
    if session.status != SessionStatus::Active {
        return Err(ApiError::Conflict("Session is already closed".to_string()));
    }

    let now = primitive_now_utc();
    if !accepts_autosave(session.expires_at, now) {
        let grace = state.settings().exam().submit_grace_seconds;
        if !accepts_submission(session.expires_at, now, grace) {
            expire_session(&state, &session).await?;
        }
        return Err(ApiError::Conflict("Exam time has expired".to_string()));
    }

    let updated =
        repositories::sessions::update_answers(state.db(), &session.id, &payload.answers, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to save answers"))?
            .ok_or_else(|| ApiError::Conflict("Session is already closed".to_string()))?;

    tracing::debug!(session_id = %updated.id, answers = updated.answers.0.len(), "Answers saved");
    Ok(Json(session_response(updated, now)))
}

async fn submit_session(
    Path(session_id): Path<String>,
    CurrentStudent(student): CurrentStudent,
    State(state): State<AppState>,
    payload: Option<Json<SessionSubmit>>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let session = fetch_owned_session(&state, &session_id, &student).await?;
    if session.status != SessionStatus::Active {
        return Err(ApiError::Conflict("Session is already closed".to_string()));
    }

    let now = primitive_now_utc();
    let grace = state.settings().exam().submit_grace_seconds;
    if !accepts_submission(session.expires_at, now, grace) {
        expire_session(&state, &session).await?;
        return Err(ApiError::Conflict(
            "Submission window has closed; saved answers were submitted".to_string(),
        ));
    }

    let submitted = payload.and_then(|Json(request)| request.answers);
    let answers = merge_answers(&session.answers.0, submitted.as_ref());

    let finalized =
        finalize_session(state.db(), &session, &answers, FinalizeMode::ManualSubmit, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to submit session"))?
            .ok_or_else(|| ApiError::Conflict("Session is already closed".to_string()))?;

    metrics::counter!("sessions_submitted_total").increment(1);
    Ok(Json(SubmissionResponse::from_db(finalized.submission)))
}

async fn fetch_owned_session(
    state: &AppState,
    session_id: &str,
    student: &User,
) -> Result<ExamSession, ApiError> {
    repositories::sessions::find_by_id(state.db(), session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch session"))?
        .filter(|session| session.student_id == student.id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
}

async fn expire_session(
    state: &AppState,
    session: &ExamSession,
) -> Result<Option<ExamSession>, ApiError> {
    let finalized = finalize_session(
        state.db(),
        session,
        &session.answers.0,
        FinalizeMode::AutoDeadline,
        session.expires_at,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to close expired session"))?;

    Ok(finalized.map(|finalized| finalized.session))
}

fn session_response(session: ExamSession, now: PrimitiveDateTime) -> SessionResponse {
    let remaining = match session.status {
        SessionStatus::Active => remaining_seconds(session.expires_at, now),
        SessionStatus::Submitted | SessionStatus::Expired => 0,
    };
    SessionResponse::from_db(session, remaining)
}
