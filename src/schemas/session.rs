use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::{Answers, ExamSession, Submission};
use crate::db::types::SessionStatus;
use crate::schemas::question::SessionQuestionResponse;

#[derive(Debug, Deserialize)]
pub(crate) struct AnswersUpdate {
    pub(crate) answers: Answers,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SessionSubmit {
    #[serde(default)]
    pub(crate) answers: Option<Answers>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) status: SessionStatus,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) last_auto_save: Option<String>,
    pub(crate) remaining_seconds: i64,
    pub(crate) answers: Answers,
}

impl SessionResponse {
    pub(crate) fn from_db(session: ExamSession, remaining_seconds: i64) -> Self {
        Self {
            id: session.id,
            exam_id: session.exam_id,
            student_id: session.student_id,
            attempt_number: session.attempt_number,
            status: session.status,
            started_at: format_primitive(session.started_at),
            expires_at: format_primitive(session.expires_at),
            submitted_at: session.submitted_at.map(format_primitive),
            last_auto_save: session.last_auto_save.map(format_primitive),
            remaining_seconds,
            answers: session.answers.0,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionDetailResponse {
    pub(crate) session: SessionResponse,
    pub(crate) exam_name: String,
    pub(crate) questions: Vec<SessionQuestionResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) session_id: String,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: String,
    pub(crate) graded: bool,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            graded: submission.grade().score().is_some(),
            exam_id: submission.exam_id,
            student_id: submission.student_id,
            session_id: submission.session_id,
            auto_submitted: submission.auto_submitted,
            submitted_at: format_primitive(submission.submitted_at),
        }
    }
}
