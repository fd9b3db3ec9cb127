use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answers, Submission};
use crate::db::types::SubmissionGrade;
use crate::repositories::submissions::ExamSubmissionRow;
use crate::services::grade_band::{GradeBand, GradeEntry};

#[derive(Debug, Serialize)]
pub(crate) struct GradeEntryResponse {
    pub(crate) exam_id: String,
    pub(crate) exam_name: String,
    pub(crate) grade: f64,
    pub(crate) total_grade: f64,
    pub(crate) percentage: Option<f64>,
    pub(crate) band: GradeBand,
    pub(crate) color: &'static str,
    pub(crate) feedback: Option<String>,
}

impl GradeEntryResponse {
    pub(crate) fn from_entry(entry: GradeEntry) -> Self {
        Self {
            exam_id: entry.exam_id,
            exam_name: entry.exam_name,
            grade: entry.earned,
            total_grade: entry.total,
            percentage: entry.banded.percentage,
            band: entry.banded.band,
            color: entry.banded.band.color(),
            feedback: entry.feedback,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeUpdate {
    #[serde(alias = "totalGrade", alias = "grade")]
    #[validate(range(min = 0.0, message = "grade must not be negative"))]
    pub(crate) total_grade: f64,
    #[serde(default)]
    #[validate(length(max = 10000, message = "feedback is too long"))]
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradedSubmissionResponse {
    pub(crate) exam_id: String,
    pub(crate) student_id: String,
    pub(crate) total_grade: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_at: Option<String>,
}

impl GradedSubmissionResponse {
    pub(crate) fn from_db(submission: Submission) -> Self {
        Self {
            total_grade: submission.grade().score(),
            exam_id: submission.exam_id,
            student_id: submission.student_id,
            feedback: submission.feedback,
            graded_at: submission.graded_at.map(format_primitive),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExamSubmissionResponse {
    pub(crate) student_id: String,
    pub(crate) student_email: String,
    pub(crate) student_name: Option<String>,
    pub(crate) student_number: Option<String>,
    pub(crate) session_id: String,
    pub(crate) answers: Answers,
    pub(crate) total_grade: Option<f64>,
    pub(crate) feedback: Option<String>,
    pub(crate) auto_submitted: bool,
    pub(crate) submitted_at: String,
    pub(crate) graded_at: Option<String>,
}

impl ExamSubmissionResponse {
    pub(crate) fn from_row(row: ExamSubmissionRow) -> Self {
        Self {
            student_id: row.student_id,
            student_email: row.student_email,
            student_name: row.student_name,
            student_number: row.student_number,
            session_id: row.session_id,
            answers: row.answers.0,
            total_grade: SubmissionGrade::from_column(row.total_grade).score(),
            feedback: row.feedback,
            auto_submitted: row.auto_submitted,
            submitted_at: format_primitive(row.submitted_at),
            graded_at: row.graded_at.map(format_primitive),
        }
    }
}
