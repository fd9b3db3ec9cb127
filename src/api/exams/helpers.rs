use time::Duration;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::db::models::Exam;
use crate::repositories;

pub(super) async fn fetch_exam(state: &AppState, exam_id: &str) -> Result<Exam, ApiError> {
    repositories::exams::find_by_id(state.db(), exam_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch exam"))?
        .ok_or_else(|| ApiError::NotFound("Exam not found".to_string()))
}

pub(super) fn listing_lookback(state: &AppState) -> Duration {
    let hours = state.settings().exam().listing_lookback_hours;
    Duration::hours(i64::try_from(hours).unwrap_or(i64::MAX / 3_600))
}
