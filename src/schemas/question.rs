use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Question;
use crate::db::types::QuestionKind;

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) grade: f64,
    pub(crate) image_url: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            exam_id: question.exam_id,
            kind: question.kind,
            text: question.text,
            options: question.options.0,
            correct_answer: question.correct_answer,
            grade: question.grade,
            image_url: question.image_url,
            order_index: question.order_index,
            created_at: format_primitive(question.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionQuestionResponse {
    pub(crate) id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) options: Vec<String>,
    pub(crate) grade: f64,
    pub(crate) image_url: Option<String>,
    pub(crate) order_index: i32,
}

impl SessionQuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            kind: question.kind,
            text: question.text,
            options: question.options.0,
            grade: question.grade,
            image_url: question.image_url,
            order_index: question.order_index,
        }
    }
}
