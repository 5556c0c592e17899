use std::collections::HashSet;

use crate::analysis::classify::SEVERITY_GOOD;
use crate::analysis::validate::normalize_score;
use crate::models::{AnalysisResult, Category, Issue};

/// Default cap on surfaced suggestions per pass.
pub const DEFAULT_SUGGESTION_LIMIT: usize = 2;

fn fallback_for(category: Category) -> &'static str {
    match category {
        Category::Posture => {
            "Set your webcam eye-level, keep an upright spine, and lean slightly forward with open shoulders."
        }
        Category::Facial => {
            "Maintain lens-focused eye contact with calm facial expressions and small active nodding cues."
        }
        Category::Hands => {
            "Keep visible hand gestures in-frame and reduce minimal fidgeting when listening."
        }
        Category::Appearance => {
            "Use front-facing lighting, solid-colored attire, a neutral background, and a matte skin finish."
        }
    }
}

fn clean_text(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_unique(target: &mut Vec<String>, seen: &mut HashSet<String>, candidate: &str, limit: usize) {
    if target.len() >= limit {
        return;
    }
    let cleaned = clean_text(candidate);
    if cleaned.is_empty() {
        return;
    }
    let key = cleaned.to_lowercase();
    if !seen.insert(key) {
        return;
    }
    target.push(cleaned);
}

/// Builds the ranked, deduplicated coaching text for one pass, drawing from
/// three sources in priority order until `max_count` entries exist: the
/// analysis's own priority actions, suggestions on weak sub-conditions, then
/// per-issue suggestions with a fixed per-category fallback.
pub fn extract_top(analysis: &AnalysisResult, issues: &[Issue], max_count: usize) -> Vec<String> {
    let limit = max_count.max(1);
    let mut suggestions = Vec::new();
    let mut seen = HashSet::new();

    if let Some(actions) = &analysis.priority_actions {
        for action in actions {
            push_unique(&mut suggestions, &mut seen, action, limit);
        }
    }

    if let Some(conditions) = &analysis.focus_conditions {
        for condition in conditions.values() {
            let score = normalize_score(&condition.score);
            if !score.is_finite() || score >= SEVERITY_GOOD {
                continue;
            }
            if let Some(suggestion) = &condition.suggestion {
                push_unique(&mut suggestions, &mut seen, suggestion, limit);
            }
        }
    }

    for issue in issues {
        let direct = issue.suggestion.as_deref().map(clean_text).unwrap_or_default();
        if !direct.is_empty() {
            push_unique(&mut suggestions, &mut seen, &direct, limit);
        } else {
            push_unique(&mut suggestions, &mut seen, fallback_for(issue.category), limit);
        }
    }

    suggestions
}
