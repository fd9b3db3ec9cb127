use anyhow::{anyhow, Result};
use time::{Duration, PrimitiveDateTime};

pub(crate) fn validate_duration(duration_minutes: i32) -> Result<i32> {
    if duration_minutes <= 0 {
        return Err(anyhow!("duration_minutes must be positive"));
    }
    Ok(duration_minutes)
}

pub(crate) fn compute_session_expiration(
    session_started_at: PrimitiveDateTime,
    exam_end: PrimitiveDateTime,
    duration_minutes: i32,
) -> Result<PrimitiveDateTime> {
    let duration = validate_duration(duration_minutes)?;
    let duration_deadline = session_started_at + Duration::minutes(i64::from(duration));
    Ok(if duration_deadline < exam_end { duration_deadline } else { exam_end })
}

pub(crate) fn remaining_seconds(expires_at: PrimitiveDateTime, now: PrimitiveDateTime) -> i64 {
    (expires_at - now).whole_seconds().max(0)
}

pub(crate) fn accepts_autosave(expires_at: PrimitiveDateTime, now: PrimitiveDateTime) -> bool {
    now < expires_at
}

fn grace_period(grace_seconds: u64) -> Duration {
    Duration::seconds(i64::try_from(grace_seconds).unwrap_or(i64::MAX))
}

pub(crate) fn submission_deadline(
    expires_at: PrimitiveDateTime,
    grace_seconds: u64,
) -> PrimitiveDateTime {
    expires_at.checked_add(grace_period(grace_seconds)).unwrap_or(PrimitiveDateTime::MAX)
}

pub(crate) fn accepts_submission(
    expires_at: PrimitiveDateTime,
    now: PrimitiveDateTime,
    grace_seconds: u64,
) -> bool {
    now <= submission_deadline(expires_at, grace_seconds)
}

/// Sessions whose deadline is at or before this instant are past their submit grace.
pub(crate) fn sweep_cutoff(now: PrimitiveDateTime, grace_seconds: u64) -> PrimitiveDateTime {
    now.checked_sub(grace_period(grace_seconds)).unwrap_or(PrimitiveDateTime::MIN)
}
