use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::services::session_finalize::{finalize_session, FinalizeMode};
use crate::services::session_timing::sweep_cutoff;

const SWEEP_BATCH_SIZE: i64 = 200;

pub(crate) async fn auto_submit_expired_sessions(state: &AppState) -> Result<usize> {
    let cutoff = sweep_cutoff(primitive_now_utc(), state.settings().exam().submit_grace_seconds);
    let expired = repositories::sessions::list_active_expired(state.db(), cutoff, SWEEP_BATCH_SIZE)
        .await
        .context("Failed to list expired sessions")?;

    let mut finalized = 0;
    for session in expired {
        match finalize_session(
            state.db(),
            &session,
            &session.answers.0,
            FinalizeMode::AutoDeadline,
            session.expires_at,
        )
        .await
        {
            Ok(Some(_)) => finalized += 1,
            Ok(None) => {}
            Err(err) => {
                tracing::error!(session_id = %session.id, error = %err, "Auto-submit failed");
            }
        }
    }

    if finalized > 0 {
        metrics::counter!("sessions_auto_submitted_total").increment(finalized as u64);
        tracing::info!(count = finalized, "Auto-submitted expired sessions");
    }

    Ok(finalized)
}
