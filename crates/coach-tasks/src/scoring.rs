//! Score arithmetic for interview results.

use serde::{Deserialize, Serialize};

/// Maximum points per question.
pub const POINTS_PER_QUESTION: u32 = 100;

/// `earned / possible`, clamped to `[0, 1]`. Zero when nothing was possible.
pub fn score_ratio(earned: f64, possible: f64) -> f64 {
    if possible.is_nan() || possible <= 0.0 || !earned.is_finite() {
        return 0.0;
    }
    (earned / possible).clamp(0.0, 1.0)
}

/// Round to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub answered: usize,
    pub earned: u32,
    pub possible: u32,
    /// `earned / possible * 100`, one decimal.
    pub percentage: f64,
}

impl ScoreSummary {
    /// Summary of per-question scores out of [`POINTS_PER_QUESTION`] each.
    pub fn from_scores(scores: &[u32]) -> Self {
        let earned: u32 = scores.iter().map(|s| (*s).min(POINTS_PER_QUESTION)).sum();
        let possible = POINTS_PER_QUESTION * scores.len() as u32;
        Self {
            answered: scores.len(),
            earned,
            possible,
            percentage: round1(score_ratio(earned as f64, possible as f64) * 100.0),
        }
    }

    /// Short verdict for display.
    pub fn label(&self) -> &'static str {
        match self.percentage {
            p if p >= 85.0 => "Excellent",
            p if p >= 70.0 => "Good",
            p if p >= 50.0 => "Fair",
            _ => "Needs work",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_ratio() {
        assert_eq!(score_ratio(3.0, 4.0), 0.75);
        assert_eq!(score_ratio(5.0, 0.0), 0.0);
        assert_eq!(score_ratio(5.0, 2.0), 1.0);
        assert_eq!(score_ratio(-1.0, 2.0), 0.0);
        assert_eq!(score_ratio(1.0, f64::NAN), 0.0);
    }

    #[test]
    fn test_summary_rounds_to_one_decimal() {
        let summary = ScoreSummary::from_scores(&[100, 66, 0]);
        assert_eq!(summary.earned, 166);
        assert_eq!(summary.possible, 300);
        assert_eq!(summary.percentage, 55.3);
        assert_eq!(summary.label(), "Fair");
    }

    #[test]
    fn test_summary_empty() {
        let summary = ScoreSummary::from_scores(&[]);
        assert_eq!(summary.answered, 0);
        assert_eq!(summary.percentage, 0.0);
        assert_eq!(summary.label(), "Needs work");
    }

    #[test]
    fn test_summary_caps_scores() {
        let summary = ScoreSummary::from_scores(&[150, 90]);
        assert_eq!(summary.earned, 190);
        assert_eq!(summary.percentage, 95.0);
        assert_eq!(summary.label(), "Excellent");
    }
}
