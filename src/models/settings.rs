use serde::{Deserialize, Serialize};

use crate::i18n::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiProvider {
    Claude,
    OpenAi,
}

impl ApiProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiProvider::Claude => "claude",
            ApiProvider::OpenAi => "openai",
        }
    }
}

/// User-chosen aggressiveness of issue escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

/// User configuration, read-only to the engine apart from the monitoring
/// flag. Missing keys in the stored value fall back to these defaults, so a
/// partial save from an older build still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_key: String,
    pub api_provider: ApiProvider,
    pub sensitivity: Sensitivity,
    pub notifications_enabled: bool,
    pub monitoring_enabled: bool,
    pub data_retention_days: u32,
    pub ephemeral_mode: bool,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_provider: ApiProvider::Claude,
            sensitivity: Sensitivity::Medium,
            notifications_enabled: true,
            monitoring_enabled: true,
            data_retention_days: 7,
            ephemeral_mode: false,
            language: Language::EnCa,
        }
    }
}

impl Settings {
    pub fn api_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}
