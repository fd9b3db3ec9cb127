use serde::Serialize;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::core::time::{format_primitive, seconds_until};
use crate::db::models::Exam;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GateState {
    NotYetOpen,
    Open,
    Expired,
}

pub(crate) fn classify(
    now: PrimitiveDateTime,
    start: PrimitiveDateTime,
    end: PrimitiveDateTime,
) -> GateState {
    if now < start {
        GateState::NotYetOpen
    } else if now >= end {
        GateState::Expired
    } else {
        GateState::Open
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GateDecision {
    pub(crate) state: GateState,
    pub(crate) message: String,
    pub(crate) requires_confirmation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) duration_notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seconds_until_open: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) seconds_until_close: Option<i64>,
}

pub(crate) fn evaluate(exam: &Exam, now: PrimitiveDateTime) -> GateDecision {
    let state = classify(now, exam.start_time, exam.end_time);
    match state {
        GateState::NotYetOpen => GateDecision {
            state,
            message: format!(
                "Exam \"{}\" has not started yet. It opens at {}.",
                exam.name,
                format_primitive(exam.start_time)
            ),
            requires_confirmation: false,
            duration_notice: None,
            seconds_until_open: Some(seconds_until(now, exam.start_time)),
            seconds_until_close: None,
        },
        GateState::Open => GateDecision {
            state,
            message: format!("Exam \"{}\" is open.", exam.name),
            requires_confirmation: true,
            duration_notice: Some(duration_notice(exam.duration_minutes)),
            seconds_until_open: None,
            seconds_until_close: Some(seconds_until(now, exam.end_time)),
        },
        GateState::Expired => GateDecision {
            state,
            message: format!("Exam \"{}\" has already ended.", exam.name),
            requires_confirmation: false,
            duration_notice: None,
            seconds_until_open: None,
            seconds_until_close: None,
        },
    }
}

fn duration_notice(duration_minutes: i32) -> String {
    let unit = if duration_minutes == 1 { "minute" } else { "minutes" };
    format!(
        "You will have {duration_minutes} {unit} to complete the exam once you start. \
         Are you ready to begin?"
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum GateRejection {
    #[error("{0}")]
    NotYetOpen(String),
    #[error("{0}")]
    Expired(String),
    #[error("{0}")]
    ConfirmationRequired(String),
}

pub(crate) fn admit(decision: &GateDecision, confirmed: bool) -> Result<(), GateRejection> {
    match decision.state {
        GateState::Open if confirmed => Ok(()),
        GateState::Open => Err(GateRejection::ConfirmationRequired(
            decision.duration_notice.clone().unwrap_or_else(|| decision.message.clone()),
        )),
        GateState::NotYetOpen => Err(GateRejection::NotYetOpen(decision.message.clone())),
        GateState::Expired => Err(GateRejection::Expired(decision.message.clone())),
    }
}
