use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::stabilizer::REQUIRED_REPEATS;

pub const DEFAULT_CONFIG_PATH: &str = "signscribe.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Output language code ("en", "ta", "hi")
    #[serde(default = "default_language")]
    pub language: String,
    /// Language the classifier's labels are written in
    #[serde(default = "default_language")]
    pub source_language: String,
    #[serde(default)]
    pub stabilization: StabilizationConfig,
    #[serde(default)]
    pub translation: TranslationConfig,
    #[serde(default)]
    pub images: ImagesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: default_language(),
            source_language: default_language(),
            stabilization: StabilizationConfig::default(),
            translation: TranslationConfig::default(),
            images: ImagesConfig::default(),
        }
    }
}

fn default_language() -> String {
    "en".into()
}

// ============================================================================
// Stabilization Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StabilizationConfig {
    /// Consecutive sightings before a label is accepted
    #[serde(default = "default_required_repeats")]
    pub required_repeats: u32,
    /// Minimum spacing between classification attempts
    #[serde(default = "default_detect_interval")]
    pub detect_interval_ms: u64,
}

impl Default for StabilizationConfig {
    fn default() -> Self {
        Self {
            required_repeats: default_required_repeats(),
            detect_interval_ms: default_detect_interval(),
        }
    }
}

fn default_required_repeats() -> u32 {
    REQUIRED_REPEATS
}

fn default_detect_interval() -> u64 {
    800
}

// ============================================================================
// Translation Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TranslationConfig {
    /// Translate accepted tokens when the output language differs
    #[serde(default = "default_translation_enabled")]
    pub enabled: bool,
    /// Base URL of an OpenAI-compatible API
    #[serde(default)]
    pub base_url: String,
    /// Preset shortcuts: "lm_studio", "openai", "ollama", "lovable"
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default = "default_translation_model")]
    pub model: String,
    /// API key (supports ${ENV_VAR} syntax)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Upper bound on one translation round-trip
    #[serde(default = "default_translation_timeout")]
    pub timeout_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: default_translation_enabled(),
            base_url: String::new(),
            preset: None,
            model: default_translation_model(),
            api_key: None,
            timeout_ms: default_translation_timeout(),
        }
    }
}

fn default_translation_enabled() -> bool {
    true
}

fn default_translation_model() -> String {
    "google/gemini-2.5-flash".into()
}

fn default_translation_timeout() -> u64 {
    3000
}

const LM_STUDIO_URL: &str = "http://localhost:1234/v1";

impl TranslationConfig {
    /// Resolve preset to base_url if needed, and expand env vars in api_key
    pub fn resolve_presets(&mut self) {
        if self.base_url.is_empty() {
            self.base_url = match self.preset.as_deref() {
                Some("lm_studio") | None => LM_STUDIO_URL.to_string(),
                Some("openai") => "https://api.openai.com/v1".to_string(),
                Some("ollama") => "http://localhost:11434/v1".to_string(),
                Some("lovable") => "https://ai.gateway.lovable.dev/v1".to_string(),
                Some(other) => {
                    warn!("Unknown preset '{}', using LM Studio default", other);
                    LM_STUDIO_URL.to_string()
                }
            };
        }

        if let Some(key) = &mut self.api_key {
            *key = expand_env_vars(key);
        }
    }
}

// ============================================================================
// Images Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImagesConfig {
    /// Directory holding one reference image per letter (`a.png` .. `z.png`)
    #[serde(default = "default_images_dir")]
    pub dir: PathBuf,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: default_images_dir(),
        }
    }
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("signs")
}

/// Expand ${VAR} to environment variable values
fn expand_env_vars(s: &str) -> String {
    let mut result = s.to_string();

    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_else(|_| {
                warn!("Environment variable '{}' not found", var_name);
                String::new()
            });
            result.replace_range(start..start + end + 1, &value);
        } else {
            break;
        }
    }

    result
}

impl Config {
    /// Load from `path`; a missing or unreadable file yields defaults
    pub fn load(path: &Path) -> Self {
        let mut config = if path.exists() {
            match fs::read_to_string(path)
                .map_err(anyhow::Error::from)
                .and_then(|s| Self::from_toml(&s))
            {
                Ok(config) => config,
                Err(e) => {
                    warn!("Ignoring {}: {}", path.display(), e);
                    Config::default()
                }
            }
        } else {
            Config::default()
        };

        config.translation.resolve_presets();
        config
    }

    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
