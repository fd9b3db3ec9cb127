use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::services::exam_listing::{render_listing, ExamListView, ExamListing, SystemClock};
use crate::services::session_gate::{self, GateDecision};

use super::super::helpers;

pub(in crate::api::exams) async fn list_exams(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ExamListing>, ApiError> {
    state
        .exam_feed()
        .refresh(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load exams"))?;

    let snapshot = state.exam_feed().current();
    let listing =
        render_listing(&snapshot.exams, primitive_now_utc(), helpers::listing_lookback(&state));
    Ok(Json(listing))
}

/// Closing the connection drops the view, which cancels its wake-ups.
pub(in crate::api::exams) async fn live_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user_id = %user.id, "Live exam listing opened");

    let view = ExamListView::new(
        state.exam_feed().subscribe(),
        SystemClock,
        helpers::listing_lookback(&state),
    );

    let events = stream::unfold((view, true), |(mut view, first)| async move {
        let listing = if first { view.render() } else { view.next().await? };
        let event = Event::default().event("exams").json_data(&listing).unwrap_or_else(|err| {
            tracing::error!(error = %err, "Failed to encode exam listing");
            Event::default().event("error").data("listing unavailable")
        });
        Some((Ok::<_, Infallible>(event), (view, false)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub(in crate::api::exams) async fn exam_gate(
    Path(exam_id): Path<String>,
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GateDecision>, ApiError> {
    let exam = helpers::fetch_exam(&state, &exam_id).await?;
    Ok(Json(session_gate::evaluate(&exam, primitive_now_utc())))
}
