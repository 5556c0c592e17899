use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::i18n::Language;

/// How a coaching event actually reached the user. Every event lands in the
/// feed; only some are attempted as system notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Delivery {
    /// Recorded in the feed only, never attempted as a system notification.
    InApp,
    /// System notification displayed.
    Shown,
    /// Platform denied notification permission.
    Blocked,
    /// The platform notification call errored.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedCategory {
    System,
    Critical,
    Warning,
    Error,
    Info,
}

/// One entry in the persisted live-coaching feed. Immutable once delivered,
/// except for lazy fill-in of the missing language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub title_by_language: BTreeMap<Language, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub message_by_language: BTreeMap<Language, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_language: Option<Language>,
    pub category: FeedCategory,
    pub timestamp: DateTime<Utc>,
    pub delivery: Delivery,
}

impl FeedItem {
    pub fn new(
        id_prefix: &str,
        title: impl Into<String>,
        message: impl Into<String>,
        category: FeedCategory,
        timestamp: DateTime<Utc>,
        delivery: Delivery,
    ) -> Self {
        Self {
            id: format!("{}-{}", id_prefix, Uuid::new_v4()),
            title: title.into(),
            message: message.into(),
            title_by_language: BTreeMap::new(),
            message_by_language: BTreeMap::new(),
            source_language: None,
            category,
            timestamp,
            delivery,
        }
    }

    /// True once both language slots hold title and message text.
    pub fn fully_localized(&self) -> bool {
        [Language::EnCa, Language::FrFr].iter().all(|lang| {
            self.title_by_language.contains_key(lang)
                && self.message_by_language.contains_key(lang)
        })
    }
}
