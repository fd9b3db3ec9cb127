use std::collections::HashSet;

use thiserror::Error;
use time::OffsetDateTime;

use crate::core::time::unix_millis;
use crate::db::types::QuestionKind;

pub(crate) const MAX_OPTION_SLOTS: usize = 4;
pub(crate) const TRUE_FALSE_ANSWERS: [&str; 2] = ["True", "False"];

const IMAGE_KEY_PREFIX: &str = "question_images";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum QuestionValidationError {
    #[error("Question text is required")]
    EmptyText,
    #[error("Grade is required")]
    MissingGrade,
    #[error("Grade must be a number, got '{0}'")]
    InvalidGrade(String),
    #[error("Grade must be greater than zero")]
    NonPositiveGrade,
    #[error("A multiple-choice question has at most {MAX_OPTION_SLOTS} options")]
    TooManyOptions,
    #[error("A multiple-choice question needs at least one option")]
    MissingOptions,
    #[error("Option '{0}' is listed more than once")]
    DuplicateOption(String),
    #[error("Select the correct answer")]
    MissingCorrectAnswer,
    #[error("The correct answer must be one of the options")]
    CorrectAnswerNotAnOption,
    #[error("The correct answer must be 'True' or 'False'")]
    InvalidTrueFalseAnswer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImageAttachment {
    pub(crate) extension: String,
    pub(crate) content_type: String,
    pub(crate) bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub(crate) struct QuestionDraft {
    kind: QuestionKind,
    text: String,
    grade: String,
    options: Vec<String>,
    selected_answer: Option<String>,
    image: Option<ImageAttachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedQuestion {
    pub(crate) kind: QuestionKind,
    pub(crate) text: String,
    pub(crate) grade: f64,
    pub(crate) options: Vec<String>,
    pub(crate) correct_answer: Option<String>,
}

impl QuestionDraft {
    pub(crate) fn new(kind: QuestionKind) -> Self {
        Self {
            kind,
            text: String::new(),
            grade: String::new(),
            options: Vec::new(),
            selected_answer: None,
            image: None,
        }
    }

    pub(crate) fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub(crate) fn select_kind(&mut self, kind: QuestionKind) {
        self.kind = kind;
        self.options.clear();
        self.selected_answer = None;
    }

    pub(crate) fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub(crate) fn set_grade(&mut self, raw: impl Into<String>) {
        self.grade = raw.into();
    }

    pub(crate) fn set_option(
        &mut self,
        slot: usize,
        value: impl Into<String>,
    ) -> Result<(), QuestionValidationError> {
        if slot >= MAX_OPTION_SLOTS {
            return Err(QuestionValidationError::TooManyOptions);
        }
        if self.options.len() <= slot {
            self.options.resize(slot + 1, String::new());
        }
        self.options[slot] = value.into();
        Ok(())
    }

    pub(crate) fn select_answer(&mut self, answer: impl Into<String>) {
        self.selected_answer = Some(answer.into());
    }

    pub(crate) fn attach_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    pub(crate) fn take_image(&mut self) -> Option<ImageAttachment> {
        self.image.take()
    }

    pub(crate) fn validate(&self) -> Result<ValidatedQuestion, QuestionValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionValidationError::EmptyText);
        }

        let grade = parse_grade(&self.grade)?;
        let selected = self.selected_answer.as_deref().map(str::trim).filter(|v| !v.is_empty());

        let (options, correct_answer) = match self.kind {
            QuestionKind::MultipleChoice => {
                let options = self.multiple_choice_options()?;
                let answer = selected.ok_or(QuestionValidationError::MissingCorrectAnswer)?;
                if !options.iter().any(|option| option == answer) {
                    return Err(QuestionValidationError::CorrectAnswerNotAnOption);
                }
                (options, Some(answer.to_string()))
            }
            QuestionKind::TrueFalse => {
                let answer = selected.ok_or(QuestionValidationError::MissingCorrectAnswer)?;
                let canonical = TRUE_FALSE_ANSWERS
                    .iter()
                    .find(|candidate| candidate.eq_ignore_ascii_case(answer))
                    .ok_or(QuestionValidationError::InvalidTrueFalseAnswer)?;
                (
                    TRUE_FALSE_ANSWERS.iter().map(|v| v.to_string()).collect(),
                    Some(canonical.to_string()),
                )
            }
            QuestionKind::ShortAnswer | QuestionKind::Essay => (Vec::new(), None),
        };

        Ok(ValidatedQuestion {
            kind: self.kind,
            text: text.to_string(),
            grade,
            options,
            correct_answer,
        })
    }

    fn multiple_choice_options(&self) -> Result<Vec<String>, QuestionValidationError> {
        if self.options.len() > MAX_OPTION_SLOTS {
            return Err(QuestionValidationError::TooManyOptions);
        }

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(self.options.len());
        for option in self.options.iter().map(|o| o.trim()).filter(|o| !o.is_empty()) {
            if !seen.insert(option) {
                return Err(QuestionValidationError::DuplicateOption(option.to_string()));
            }
            options.push(option.to_string());
        }

        if options.is_empty() {
            return Err(QuestionValidationError::MissingOptions);
        }
        Ok(options)
    }
}

fn parse_grade(raw: &str) -> Result<f64, QuestionValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(QuestionValidationError::MissingGrade);
    }
    let grade: f64 =
        raw.parse().map_err(|_| QuestionValidationError::InvalidGrade(raw.to_string()))?;
    if !grade.is_finite() {
        return Err(QuestionValidationError::InvalidGrade(raw.to_string()));
    }
    if grade <= 0.0 {
        return Err(QuestionValidationError::NonPositiveGrade);
    }
    Ok(grade)
}

pub(crate) fn image_object_key(extension: &str, at: OffsetDateTime) -> String {
    format!("{IMAGE_KEY_PREFIX}/image_{}.{}", unix_millis(at), extension.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multiple_choice(options: &[&str], answer: &str) -> QuestionDraft {
        let mut draft = QuestionDraft::new(QuestionKind::MultipleChoice);
        draft.set_text("Pick the prime");
        draft.set_grade("5");
        for (slot, option) in options.iter().enumerate() {
            draft.set_option(slot, *option).unwrap();
        }
        draft.select_answer(answer);
        draft
    }

    #[test]
    fn duplicate_options_are_rejected() {
        let draft = multiple_choice(&["A", "B", "A", ""], "A");
        assert_eq!(
            draft.validate(),
            Err(QuestionValidationError::DuplicateOption("A".to_string()))
        );

        let trimmed = multiple_choice(&["A", " A "], "A");
        assert!(matches!(trimmed.validate(), Err(QuestionValidationError::DuplicateOption(_))));
    }

    #[test]
    fn empty_slot_is_skipped() {
        let validated = multiple_choice(&["A", "B", "", "C"], "B").validate().unwrap();
        assert_eq!(validated.options, vec!["A", "B", "C"]);
        assert_eq!(validated.correct_answer.as_deref(), Some("B"));
        assert_eq!(validated.grade, 5.0);
    }

    #[test]
    fn fifth_slot_is_refused() {
        let mut draft = QuestionDraft::new(QuestionKind::MultipleChoice);
        assert_eq!(draft.set_option(4, "E"), Err(QuestionValidationError::TooManyOptions));
    }

    #[test]
    fn correct_answer_must_be_an_option() {
        let draft = multiple_choice(&["A", "B"], "C");
        assert_eq!(draft.validate(), Err(QuestionValidationError::CorrectAnswerNotAnOption));

        let mut unanswered = multiple_choice(&["A", "B"], "");
        unanswered.selected_answer = None;
        assert_eq!(unanswered.validate(), Err(QuestionValidationError::MissingCorrectAnswer));
    }

    #[test]
    fn grade_must_be_positive_number() {
        let mut draft = QuestionDraft::new(QuestionKind::Essay);
        draft.set_text("Discuss");
        assert_eq!(draft.validate(), Err(QuestionValidationError::MissingGrade));

        draft.set_grade("ten");
        assert!(matches!(draft.validate(), Err(QuestionValidationError::InvalidGrade(_))));

        draft.set_grade("NaN");
        assert!(matches!(draft.validate(), Err(QuestionValidationError::InvalidGrade(_))));

        draft.set_grade("0");
        assert_eq!(draft.validate(), Err(QuestionValidationError::NonPositiveGrade));

        draft.set_grade(" 2.5 ");
        let validated = draft.validate().unwrap();
        assert_eq!(validated.grade, 2.5);
        assert!(validated.options.is_empty());
        assert_eq!(validated.correct_answer, None);
    }

    #[test]
    fn true_false_requires_selection() {
        let mut draft = QuestionDraft::new(QuestionKind::TrueFalse);
        draft.set_text("The sky is blue");
        draft.set_grade("1");
        assert_eq!(draft.validate(), Err(QuestionValidationError::MissingCorrectAnswer));

        draft.select_answer("maybe");
        assert_eq!(draft.validate(), Err(QuestionValidationError::InvalidTrueFalseAnswer));

        draft.select_answer("false");
        let validated = draft.validate().unwrap();
        assert_eq!(validated.correct_answer.as_deref(), Some("False"));
        assert_eq!(validated.options, vec!["True", "False"]);
    }

    #[test]
    fn switching_kind_resets_options_and_answer() {
        let mut draft = multiple_choice(&["A", "B"], "A");
        draft.select_kind(QuestionKind::TrueFalse);

        assert_eq!(draft.kind(), QuestionKind::TrueFalse);
        assert_eq!(draft.validate(), Err(QuestionValidationError::MissingCorrectAnswer));
    }

    #[test]
    fn blank_text_is_rejected() {
        let mut draft = QuestionDraft::new(QuestionKind::ShortAnswer);
        draft.set_text("   ");
        draft.set_grade("3");
        assert_eq!(draft.validate(), Err(QuestionValidationError::EmptyText));
    }

    #[test]
    fn image_key_uses_epoch_millis() {
        let at = OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_000_000).unwrap();
        assert_eq!(image_object_key("PNG", at), "question_images/image_1700000000123.png");
    }
}
