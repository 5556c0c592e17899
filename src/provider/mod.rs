//! External AI-provider interface. The engine never speaks HTTP itself; it
//! hands frames to an implementation of this trait and gets back the raw
//! analysis JSON described in the data model.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::i18n::Language;
use crate::models::ApiProvider;

/// Marker scanned for (case-insensitively) in provider error text to
/// classify a failure as rate limiting.
pub const RATE_LIMIT_MARKER: &str = "rate limit";

#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Scores one opaque frame payload. The returned JSON must carry the four
    /// category assessments; it is validated and coerced by the caller.
    /// Prompting happens in the given language, so issue/suggestion text
    /// arrives already in that language.
    async fn analyze(
        &self,
        frame: &str,
        api_key: &str,
        provider: ApiProvider,
        language: Language,
    ) -> Result<Value>;

    /// Best-effort translation of coaching text. Callers tolerate any failure
    /// by falling back to the source text.
    async fn translate(
        &self,
        text: &str,
        api_key: &str,
        provider: ApiProvider,
        target: Language,
    ) -> Result<String>;
}

/// Rate-limit failures are assumed self-resolving and excluded from error
/// notifications so a throttled provider does not alert on every frame.
pub fn is_rate_limit_message(message: &str) -> bool {
    message.to_lowercase().contains(RATE_LIMIT_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_detection_is_case_insensitive() {
        assert!(is_rate_limit_message("Claude API error: Rate limit exceeded"));
        assert!(is_rate_limit_message("rate limit"));
        assert!(!is_rate_limit_message("invalid api key"));
        assert!(!is_rate_limit_message(""));
    }
}
