use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four body-language categories every analysis must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Posture,
    Facial,
    Hands,
    Appearance,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Posture,
        Category::Facial,
        Category::Hands,
        Category::Appearance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Posture => "posture",
            Category::Facial => "facial",
            Category::Hands => "hands",
            Category::Appearance => "appearance",
        }
    }
}

/// One category's assessment inside an analysis. `issue`/`suggestion` are
/// null when the model considers the category fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryAssessment {
    pub score: f64,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// Optional finer-grained sub-condition attached under `focus_conditions`.
/// Sub-condition scores arrive in whatever shape the model produced and are
/// normalized only where they are consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FocusCondition {
    #[serde(default)]
    pub score: serde_json::Value,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

/// A validated single-frame analysis. Field names match the provider's JSON
/// shape exactly; `timestamp` is stamped by the coordinator after validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub posture: CategoryAssessment,
    pub facial: CategoryAssessment,
    pub hands: CategoryAssessment,
    pub appearance: CategoryAssessment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_conditions: Option<BTreeMap<String, FocusCondition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority_actions: Option<Vec<String>>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    /// Typed view over an already-validated payload. Callers must run
    /// `analysis::validate` first so every score is a plain number.
    pub fn from_value(value: serde_json::Value) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn assessment(&self, category: Category) -> &CategoryAssessment {
        match category {
            Category::Posture => &self.posture,
            Category::Facial => &self.facial,
            Category::Hands => &self.hands,
            Category::Appearance => &self.appearance,
        }
    }

    pub fn scores(&self) -> [f64; 4] {
        [
            self.posture.score,
            self.facial.score,
            self.hands.score,
            self.appearance.score,
        ]
    }
}

/// One escalated finding: the category plus the assessment that tripped it.
#[derive(Debug, Clone, Serialize)]
pub struct Issue {
    pub category: Category,
    pub score: f64,
    pub issue: Option<String>,
    pub suggestion: Option<String>,
}

impl Issue {
    pub fn from_assessment(category: Category, assessment: &CategoryAssessment) -> Self {
        Self {
            category,
            score: assessment.score,
            issue: assessment.issue.clone(),
            suggestion: assessment.suggestion.clone(),
        }
    }
}

/// Process-wide analysis accounting, reset at each session start. Read-only
/// to status queries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRuntime {
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl AnalysisRuntime {
    pub fn mark_attempt(&mut self, now: DateTime<Utc>) {
        self.attempted += 1;
        self.last_attempt_at = Some(now);
    }

    pub fn mark_success(&mut self, now: DateTime<Utc>) {
        self.succeeded += 1;
        self.last_success_at = Some(now);
        self.last_error = None;
    }

    pub fn mark_failure(&mut self, now: DateTime<Utc>, message: impl Into<String>) {
        let message = message.into();
        self.failed += 1;
        self.last_failure_at = Some(now);
        self.last_error = Some(if message.is_empty() {
            "Unknown analysis error".to_string()
        } else {
            message
        });
    }
}
