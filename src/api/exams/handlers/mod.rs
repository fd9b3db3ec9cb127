mod grading;
mod listing;
mod manage;
mod questions;
mod sessions;

pub(super) use grading::{grade_submission, list_exam_submissions};
pub(super) use listing::{exam_gate, list_exams, live_exams};
pub(super) use manage::{create_exam, delete_exam, get_exam, list_managed_exams, update_exam};
pub(super) use questions::{create_question, delete_question, list_questions};
pub(super) use sessions::start_session;
