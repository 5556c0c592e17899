use crate::models::{AnalysisResult, Category, Issue, Sensitivity};

/// Score floor below which a category is critical, at every sensitivity.
pub const SEVERITY_CRITICAL: f64 = 5.0;
/// Score floor of the warning band at medium/high sensitivity.
pub const SEVERITY_WARNING: f64 = 7.0;
/// Scores at or above this are considered fine.
pub const SEVERITY_GOOD: f64 = 8.0;

/// Consecutive warning-band passes required before a warning fires.
pub const CONSECUTIVE_WARNINGS: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub critical: f64,
    pub warning: f64,
}

/// Low sensitivity collapses the warning band into critical-only; medium and
/// high keep a distinct warning band above the critical floor.
pub fn thresholds_for(sensitivity: Sensitivity) -> Thresholds {
    match sensitivity {
        Sensitivity::Low => Thresholds {
            critical: SEVERITY_CRITICAL,
            warning: SEVERITY_CRITICAL,
        },
        Sensitivity::Medium | Sensitivity::High => Thresholds {
            critical: SEVERITY_CRITICAL,
            warning: SEVERITY_WARNING,
        },
    }
}

/// Per-category consecutive-warning counters. One tracker lives for the
/// duration of a session and is recreated at session boundaries.
#[derive(Debug, Clone, Default)]
pub struct WarningTracker {
    counts: [u32; 4],
}

impl WarningTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(category: Category) -> usize {
        match category {
            Category::Posture => 0,
            Category::Facial => 1,
            Category::Hands => 2,
            Category::Appearance => 3,
        }
    }

    pub fn count(&self, category: Category) -> u32 {
        self.counts[Self::slot(category)]
    }

    fn increment(&mut self, category: Category) -> u32 {
        let slot = Self::slot(category);
        self.counts[slot] += 1;
        self.counts[slot]
    }

    fn reset(&mut self, category: Category) {
        self.counts[Self::slot(category)] = 0;
    }
}

#[derive(Debug, Default)]
pub struct Classification {
    pub critical: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl Classification {
    pub fn is_clear(&self) -> bool {
        self.critical.is_empty() && self.warnings.is_empty()
    }
}

/// Converts one validated analysis into disjoint critical/warning issue
/// lists, mutating the tracker in place.
///
/// A critical score always fires and clears the category's streak. A
/// warning-band score only fires after `streak_length` consecutive passes,
/// then the counter restarts at zero so sustained dips re-fire on the same
/// cadence while single-frame dips stay quiet. Recovery clears the streak.
pub fn classify(
    analysis: &AnalysisResult,
    sensitivity: Sensitivity,
    streak_length: u32,
    tracker: &mut WarningTracker,
) -> Classification {
    let thresholds = thresholds_for(sensitivity);
    let mut result = Classification::default();

    for category in Category::ALL {
        let assessment = analysis.assessment(category);

        if assessment.score < thresholds.critical {
            result
                .critical
                .push(Issue::from_assessment(category, assessment));
            tracker.reset(category);
            continue;
        }

        if thresholds.warning > thresholds.critical && assessment.score < thresholds.warning {
            if tracker.increment(category) >= streak_length {
                result
                    .warnings
                    .push(Issue::from_assessment(category, assessment));
                tracker.reset(category);
            }
            continue;
        }

        tracker.reset(category);
    }

    result
}
