use log::warn;

use crate::i18n::Language;
use crate::models::{FeedItem, Settings};
use crate::provider::AnalysisProvider;

/// Fills in an item's per-language text pairs and resolves its display text
/// for the active language. Borrowed per call; the translation credential and
/// active language come from the settings snapshot of the current event.
pub struct Localizer<'a> {
    provider: &'a dyn AnalysisProvider,
    settings: &'a Settings,
}

impl<'a> Localizer<'a> {
    pub fn new(provider: &'a dyn AnalysisProvider, settings: &'a Settings) -> Self {
        Self { provider, settings }
    }

    /// Ensures the item carries text for both languages and resolves the
    /// plain `title`/`message` fields for the active display language
    /// (active, then source, then whatever the item already held).
    ///
    /// Translation is attempted only when a credential is configured; any
    /// translation failure copies the source text verbatim so delivery never
    /// blocks on the translator.
    pub async fn localize(&self, item: &mut FeedItem, source: Language) {
        localize_item(self.provider, self.settings, item, source).await;
    }

    /// Re-localizes a stored feed after a language change. Items already
    /// complete in both languages only have their display text re-resolved.
    /// Returns how many items changed at all.
    pub async fn relocalize_feed(&self, items: &mut [FeedItem]) -> usize {
        relocalize_feed(self.provider, self.settings, items).await
    }
}

pub async fn localize_item(
    provider: &dyn AnalysisProvider,
    settings: &Settings,
    item: &mut FeedItem,
    source: Language,
) {
    if item.source_language.is_none() {
        item.source_language = Some(source);
    }

    // Seed the source-language slots from the plain text.
    if !item.title_by_language.contains_key(&source) {
        item.title_by_language.insert(source, item.title.clone());
    }
    if !item.message_by_language.contains_key(&source) {
        item.message_by_language
            .insert(source, item.message.clone());
    }

    let other = source.other();
    if settings.api_configured() {
        if !item.title_by_language.contains_key(&other) {
            let translated = translate_or_fallback(provider, settings, &item.title, other).await;
            item.title_by_language.insert(other, translated);
        }
        if !item.message_by_language.contains_key(&other) {
            let translated = translate_or_fallback(provider, settings, &item.message, other).await;
            item.message_by_language.insert(other, translated);
        }
    }

    resolve_display(item, source, settings.language);
}

async fn translate_or_fallback(
    provider: &dyn AnalysisProvider,
    settings: &Settings,
    text: &str,
    target: Language,
) -> String {
    match provider
        .translate(text, &settings.api_key, settings.api_provider, target)
        .await
    {
        Ok(translated) if !translated.trim().is_empty() => translated,
        Ok(_) => text.to_string(),
        Err(err) => {
            warn!("Translation to {} failed: {err:#}", target.code());
            text.to_string()
        }
    }
}

/// Resolves the plain display fields: active language first, then the source
/// language, keeping the existing text when neither slot exists.
fn resolve_display(item: &mut FeedItem, source: Language, active: Language) {
    if let Some(title) = item
        .title_by_language
        .get(&active)
        .or_else(|| item.title_by_language.get(&source))
    {
        item.title = title.clone();
    }
    if let Some(message) = item
        .message_by_language
        .get(&active)
        .or_else(|| item.message_by_language.get(&source))
    {
        item.message = message.clone();
    }
}

pub async fn relocalize_feed(
    provider: &dyn AnalysisProvider,
    settings: &Settings,
    items: &mut [FeedItem],
) -> usize {
    let mut changed = 0;
    for item in items.iter_mut() {
        let source = item.source_language.unwrap_or_default();
        let before = item.clone();

        if item.fully_localized() {
            // Both languages present, only the display fields can move.
            resolve_display(item, source, settings.language);
        } else {
            localize_item(provider, settings, item, source).await;
        }

        if *item != before {
            changed += 1;
        }
    }
    changed
}
