use crate::analysis::classify::SEVERITY_GOOD;
use crate::models::AnalysisResult;

const ENCOURAGEMENT_MIN_SCORE: f64 = 7.0;
const ENCOURAGEMENT_MIN_AVERAGE: f64 = 7.5;

/// Positive reinforcement for an all-clear pass: every category at 7+, mean
/// at 7.5+. The stronger message is reserved for passes with no category
/// below the good line at all. Returns `None` when anything meaningful dips.
pub fn build_encouragement(analysis: &AnalysisResult) -> Option<&'static str> {
    let scores = analysis.scores();
    if scores.iter().any(|score| !score.is_finite()) {
        return None;
    }

    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    if min < ENCOURAGEMENT_MIN_SCORE {
        return None;
    }

    let average = scores.iter().sum::<f64>() / scores.len() as f64;
    if average < ENCOURAGEMENT_MIN_AVERAGE {
        return None;
    }

    let minor_issues = scores.iter().filter(|score| **score < SEVERITY_GOOD).count();
    if minor_issues == 0 {
        Some("Everything's okay. Keep it up.")
    } else {
        Some("Everything looks good overall. Keep it up.")
    }
}
