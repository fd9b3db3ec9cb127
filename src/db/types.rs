use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questionkind", rename_all = "snake_case")]
pub(crate) enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl QuestionKind {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::TrueFalse => "true_false",
            Self::ShortAnswer => "short_answer",
            Self::Essay => "essay",
        }
    }

    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "multiple_choice" | "mcq" => Some(Self::MultipleChoice),
            "true_false" | "truefalse" => Some(Self::TrueFalse),
            "short_answer" => Some(Self::ShortAnswer),
            "essay" => Some(Self::Essay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "sessionstatus", rename_all = "lowercase")]
pub(crate) enum SessionStatus {
    Active,
    Submitted,
    Expired,
}

/// Stored as a nullable column; legacy rows used a negative number to mean the
/// same thing as `NULL`, so both map to `Ungraded`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SubmissionGrade {
    Ungraded,
    Graded(f64),
}

impl SubmissionGrade {
    pub(crate) fn from_column(value: Option<f64>) -> Self {
        match value {
            Some(score) if score >= 0.0 && score.is_finite() => Self::Graded(score),
            _ => Self::Ungraded,
        }
    }

    pub(crate) fn score(self) -> Option<f64> {
        match self {
            Self::Graded(score) => Some(score),
            Self::Ungraded => None,
        }
    }
}
