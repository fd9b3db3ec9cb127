use anyhow::{Context, Result};
use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{Answers, ExamSession, Submission};
use crate::db::types::SessionStatus;
use crate::repositories;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinalizeMode {
    ManualSubmit,
    AutoDeadline,
}

impl FinalizeMode {
    fn session_status(self) -> SessionStatus {
        match self {
            Self::ManualSubmit => SessionStatus::Submitted,
            Self::AutoDeadline => SessionStatus::Expired,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FinalizedSession {
    pub(crate) session: ExamSession,
    pub(crate) submission: Submission,
}

/// Returns `None` when the session was already closed by a concurrent submit
/// or by the expiry sweep.
pub(crate) async fn finalize_session(
    pool: &PgPool,
    session: &ExamSession,
    answers: &Answers,
    mode: FinalizeMode,
    submitted_at: PrimitiveDateTime,
) -> Result<Option<FinalizedSession>> {
    let mut tx = pool.begin().await.context("Failed to begin finalize transaction")?;

    let Some(closed) = repositories::sessions::close(
        &mut *tx,
        &session.id,
        mode.session_status(),
        answers,
        submitted_at,
    )
    .await
    .context("Failed to close session")?
    else {
        return Ok(None);
    };

    let submission = repositories::submissions::upsert(
        &mut *tx,
        repositories::submissions::UpsertSubmission {
            exam_id: &closed.exam_id,
            student_id: &closed.student_id,
            session_id: &closed.id,
            answers,
            auto_submitted: mode == FinalizeMode::AutoDeadline,
            submitted_at,
        },
    )
    .await
    .context("Failed to store submission")?;

    tx.commit().await.context("Failed to commit finalize transaction")?;

    tracing::info!(
        session_id = %closed.id,
        exam_id = %closed.exam_id,
        student_id = %closed.student_id,
        mode = ?mode,
        "Session finalized"
    );

    Ok(Some(FinalizedSession { session: closed, submission }))
}

pub(crate) fn merge_answers(saved: &Answers, submitted: Option<&Answers>) -> Answers {
    let mut merged = saved.clone();
    if let Some(submitted) = submitted {
        merged.extend(submitted.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}
