//! Two-language text handling for coaching notices.
//!
//! Every user-facing artifact carries its text in both supported languages.
//! Translation is best-effort through the analysis provider; a failed or
//! unavailable translation degrades to the source text and never blocks
//! delivery.

mod localize;

pub use localize::{localize_item, relocalize_feed, Localizer};

use serde::{Deserialize, Serialize};

/// Supported display languages. The engine is strictly bilingual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en-CA")]
    EnCa,
    #[serde(rename = "fr-FR")]
    FrFr,
}

impl Default for Language {
    fn default() -> Self {
        Language::EnCa
    }
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::EnCa => "en-CA",
            Language::FrFr => "fr-FR",
        }
    }

    /// Maps arbitrary stored tags onto a supported language. Anything that is
    /// not the French tag resolves to English.
    pub fn resolve(tag: &str) -> Language {
        if tag == "fr-FR" {
            Language::FrFr
        } else {
            Language::EnCa
        }
    }

    pub fn other(&self) -> Language {
        match self {
            Language::EnCa => Language::FrFr,
            Language::FrFr => Language::EnCa,
        }
    }
}
