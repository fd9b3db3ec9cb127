use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{QuestionKind, SessionStatus, SubmissionGrade, UserRole};

pub(crate) type Answers = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: Option<String>,
    pub(crate) student_number: Option<String>,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn profile_completed(&self) -> bool {
        let filled =
            |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        filled(&self.full_name) && filled(&self.student_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub(crate) struct Exam {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) start_time: PrimitiveDateTime,
    pub(crate) end_time: PrimitiveDateTime,
    pub(crate) duration_minutes: i32,
    pub(crate) total_grade: f64,
    pub(crate) attempts_allowed: i32,
    pub(crate) created_by: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_answer: Option<String>,
    pub(crate) grade: f64,
    pub(crate) image_url: Option<String>,
    pub(crate) order_index: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ExamSession {
    pub(crate) id: String,
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) attempt_number: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) status: SessionStatus,
    pub(crate) answers: Json<Answers>,
    pub(crate) last_auto_save: Option<PrimitiveDateTime>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Submission {
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) session_id: String,
    pub(crate) answers: Json<Answers>,
    pub(crate) total_grade: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: PrimitiveDateTime,
    pub(crate) graded_by: Option<String>,
    pub(crate) graded_at: Option<PrimitiveDateTime>,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl Submission {
    pub(crate) fn grade(&self) -> SubmissionGrade {
        SubmissionGrade::from_column(self.total_grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn user(full_name: Option<&str>, student_number: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            email: "student@example.com".to_string(),
            hashed_password: String::new(),
            full_name: full_name.map(str::to_string),
            student_number: student_number.map(str::to_string),
            role: UserRole::Student,
            is_active: true,
            created_at: datetime!(2025-01-01 00:00:00),
            updated_at: datetime!(2025-01-01 00:00:00),
        }
    }

    #[test]
    fn profile_requires_name_and_student_number() {
        assert!(user(Some("Ada Lovelace"), Some("S-100")).profile_completed());
        assert!(!user(Some("Ada Lovelace"), None).profile_completed());
        assert!(!user(Some("  "), Some("S-100")).profile_completed());
        assert!(!user(None, None).profile_completed());
    }
}
