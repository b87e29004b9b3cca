//! Translation of accepted tokens
//!
//! The remote service is opaque: one request per token, any failure or
//! timeout falls back to the untranslated text. Without an API key an
//! offline phrasebook covers the common phrases.

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::config::TranslationConfig;

/// Anything that can translate a short piece of text
pub trait Translator: Send + Sync {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>>;
}

/// Translate with a bounded wait; never fails.
///
/// Identical source and target short-circuit. Errors, timeouts and empty
/// replies all yield `text` unchanged.
pub async fn translate_or_passthrough(
    translator: &dyn Translator,
    text: &str,
    source: &str,
    target: &str,
    limit: Duration,
) -> String {
    if source == target {
        return text.to_string();
    }

    match tokio::time::timeout(limit, translator.translate(text, source, target)).await {
        Ok(Ok(translated)) if !translated.trim().is_empty() => {
            debug!("Translated {:?} -> {:?} ({})", text, translated, target);
            translated
        }
        Ok(Ok(_)) => text.to_string(),
        Ok(Err(e)) => {
            warn!("Translation of {:?} to {} failed: {}", text, target, e);
            text.to_string()
        }
        Err(_) => {
            warn!("Translation of {:?} to {} timed out after {:?}", text, target, limit);
            text.to_string()
        }
    }
}

/// Pick the remote translator when a key is configured, else the phrasebook
pub fn build_translator(config: &TranslationConfig) -> Arc<dyn Translator> {
    #[cfg(feature = "openai-compat")]
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        return Arc::new(ChatTranslator::new(&config.base_url, &config.model, key));
    }

    if config.api_key.as_deref().is_some_and(|k| !k.is_empty()) {
        warn!("API key configured but openai-compat support is not built in; using phrasebook");
    } else {
        debug!("No translation API key, using phrasebook");
    }
    Arc::new(Phrasebook)
}

// ============================================================================
// Offline phrasebook
// ============================================================================

const PHRASES: &[(&str, &str, &str)] = &[
    // (english, tamil, hindi)
    ("Hello", "வணக்கம்", "नमस्ते"),
    ("Yes", "ஆம்", "हाँ"),
    ("No", "இல்லை", "नहीं"),
    ("Thank You", "நன்றி", "धन्यवाद"),
    ("I Love You", "நான் உன்னை காதலிக்கிறேன்", "मैं तुमसे प्यार करता हूँ"),
    ("I", "நான்", "मैं"),
    ("You", "நீ", "तुम"),
];

/// Fixed English phrase table for Tamil and Hindi
pub struct Phrasebook;

impl Phrasebook {
    pub fn lookup(text: &str, target: &str) -> Option<&'static str> {
        let (_, ta, hi) = PHRASES.iter().find(|(en, _, _)| *en == text)?;
        match target {
            "ta" => Some(*ta),
            "hi" => Some(*hi),
            _ => None,
        }
    }
}

impl Translator for Phrasebook {
    fn translate<'a>(
        &'a self,
        text: &'a str,
        _source: &'a str,
        target: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<String>> {
        let translated = Self::lookup(text, target).unwrap_or(text).to_string();
        async move { Ok(translated) }.boxed()
    }
}

// ============================================================================
// OpenAI-compatible chat endpoint
// ============================================================================

#[cfg(feature = "openai-compat")]
pub use remote::ChatTranslator;

#[cfg(feature = "openai-compat")]
mod remote {
    use super::*;
    use crate::language::language_name;
    use anyhow::bail;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct ChatCompletion {
        #[serde(default)]
        choices: Vec<Choice>,
    }

    #[derive(Deserialize)]
    struct Choice {
        message: ChoiceMessage,
    }

    #[derive(Deserialize)]
    struct ChoiceMessage {
        #[serde(default)]
        content: Option<String>,
    }

    /// Translator backed by a `/chat/completions` endpoint
    pub struct ChatTranslator {
        client: reqwest::Client,
        base_url: String,
        model: String,
        api_key: String,
    }

    impl ChatTranslator {
        pub fn new(base_url: &str, model: &str, api_key: &str) -> Self {
            Self {
                client: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
                model: model.to_string(),
                api_key: api_key.to_string(),
            }
        }

        pub(crate) fn request_body(&self, text: &str, source: &str, target: &str) -> serde_json::Value {
            let system = format!(
                "You are a translator. Translate the given text from {} to {}. \
                 Only respond with the translated text, nothing else. \
                 Do not add any explanations or notes.",
                language_name(source),
                language_name(target)
            );
            json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": text },
                ],
            })
        }

        async fn request(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&self.request_body(text, source, target))
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                bail!("rate limit exceeded");
            }
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                bail!("gateway returned {}: {}", status, detail);
            }

            let completion: ChatCompletion = response.json().await?;
            let translated = completion
                .choices
                .first()
                .and_then(|c| c.message.content.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(text);
            Ok(translated.to_string())
        }
    }

    impl Translator for ChatTranslator {
        fn translate<'a>(
            &'a self,
            text: &'a str,
            source: &'a str,
            target: &'a str,
        ) -> BoxFuture<'a, anyhow::Result<String>> {
            self.request(text, source, target).boxed()
        }
    }
}
