use serde::Serialize;

use crate::db::types::SubmissionGrade;

const PASS_HIGH_THRESHOLD: f64 = 90.0;
const PASS_MID_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum GradeBand {
    PassHigh,
    PassMid,
    Fail,
    Undefined,
}

impl GradeBand {
    pub(crate) fn color(self) -> &'static str {
        match self {
            Self::PassHigh => "green",
            Self::PassMid => "orange",
            Self::Fail => "red",
            Self::Undefined => "grey",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BandedGrade {
    pub(crate) percentage: Option<f64>,
    pub(crate) band: GradeBand,
}

pub(crate) fn band(earned: f64, total: f64) -> BandedGrade {
    if total <= 0.0 {
        return BandedGrade { percentage: None, band: GradeBand::Undefined };
    }

    let percentage = earned / total * 100.0;
    if !percentage.is_finite() {
        return BandedGrade { percentage: None, band: GradeBand::Undefined };
    }

    let band = if percentage >= PASS_HIGH_THRESHOLD {
        GradeBand::PassHigh
    } else if percentage >= PASS_MID_THRESHOLD {
        GradeBand::PassMid
    } else {
        GradeBand::Fail
    };

    BandedGrade { percentage: Some(percentage), band }
}

#[derive(Debug, Clone)]
pub(crate) struct GradeSource {
    pub(crate) exam_id: String,
    pub(crate) exam_name: String,
    pub(crate) exam_total: f64,
    pub(crate) grade: SubmissionGrade,
    pub(crate) feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GradeEntry {
    pub(crate) exam_id: String,
    pub(crate) exam_name: String,
    pub(crate) earned: f64,
    pub(crate) total: f64,
    pub(crate) banded: BandedGrade,
    pub(crate) feedback: Option<String>,
}

pub(crate) fn render_grade_view(sources: impl IntoIterator<Item = GradeSource>) -> Vec<GradeEntry> {
    sources
        .into_iter()
        .filter_map(|source| {
            let earned = source.grade.score()?;
            Some(GradeEntry {
                banded: band(earned, source.exam_total),
                exam_id: source.exam_id,
                exam_name: source.exam_name,
                earned,
                total: source.exam_total,
                feedback: source.feedback,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(exam_id: &str, grade: Option<f64>) -> GradeSource {
        GradeSource {
            exam_id: exam_id.to_string(),
            exam_name: format!("Exam {exam_id}"),
            exam_total: 100.0,
            grade: SubmissionGrade::from_column(grade),
            feedback: None,
        }
    }

    #[test]
    fn band_thresholds() {
        assert_eq!(band(90.0, 100.0).band, GradeBand::PassHigh);
        assert_eq!(band(70.0, 100.0).band, GradeBand::PassMid);
        assert_eq!(band(69.999, 100.0).band, GradeBand::Fail);
        assert_eq!(band(0.0, 100.0).band, GradeBand::Fail);
        assert_eq!(band(18.0, 20.0).percentage, Some(90.0));
    }

    #[test]
    fn zero_total_is_undefined() {
        let banded = band(5.0, 0.0);
        assert_eq!(banded.band, GradeBand::Undefined);
        assert_eq!(banded.percentage, None);
        assert_eq!(band(f64::INFINITY, 10.0).band, GradeBand::Undefined);
        assert_eq!(GradeBand::Undefined.color(), "grey");
    }

    #[test]
    fn colors_follow_bands() {
        assert_eq!(GradeBand::PassHigh.color(), "green");
        assert_eq!(GradeBand::PassMid.color(), "orange");
        assert_eq!(GradeBand::Fail.color(), "red");
    }

    #[test]
    fn grade_view_excludes_sentinel_and_missing_grades() {
        let view = render_grade_view(vec![
            source("a", Some(-1.0)),
            source("b", Some(95.0)),
            source("c", None),
        ]);

        assert_eq!(view.len(), 1);
        assert_eq!(view[0].exam_id, "b");
        assert_eq!(view[0].banded.band, GradeBand::PassHigh);
    }
}
