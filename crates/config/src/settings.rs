// Application settings
// Loaded from ~/.config/askgrid/settings.json

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Default upper bound on completion tokens
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default character limit applied to the serialized dataset
pub const DEFAULT_CHAR_LIMIT: usize = 3500;

/// Default cap on dataset text inside the final prompt
pub const DEFAULT_CONTEXT_CAP: usize = 2000;

/// Default preview row count, and its allowed range
pub const DEFAULT_PREVIEW_ROWS: usize = 10;
pub const MIN_PREVIEW_ROWS: usize = 1;
pub const MAX_PREVIEW_ROWS: usize = 100;

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// AI features disabled
    None,
    /// OpenAI API
    #[default]
    #[serde(rename = "openai")]
    OpenAI,
    /// Local OpenAI-compatible server (e.g. Ollama)
    Local,
}

impl AIProvider {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::OpenAI => "openai",
            AIProvider::Local => "local",
        }
    }

    pub fn needs_api_key(&self) -> bool {
        matches!(self, AIProvider::OpenAI)
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::OpenAI => DEFAULT_MODEL,
            AIProvider::Local => "llama3:8b",
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            AIProvider::Local => "http://localhost:11434/v1",
            AIProvider::None | AIProvider::OpenAI => "https://api.openai.com/v1",
        }
    }
}

/// AI-specific settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AISettings {
    pub provider: AIProvider,

    /// Model identifier (empty = provider default)
    pub model: String,

    /// Base URL of the chat-completions API (None = provider default)
    pub endpoint: Option<String>,

    pub max_tokens: u32,

    /// Request timeout in seconds. None waits indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::default(),
            model: String::new(),
            endpoint: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: None,
        }
    }
}

impl AISettings {
    /// Get the effective model (user-specified or provider default)
    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    pub fn effective_endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.provider.default_endpoint())
    }
}

/// Limits applied when building prompts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    pub char_limit: usize,
    pub context_cap: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            char_limit: DEFAULT_CHAR_LIMIT,
            context_cap: DEFAULT_CONTEXT_CAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub default_rows: usize,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self { default_rows: DEFAULT_PREVIEW_ROWS }
    }
}

impl PreviewSettings {
    /// Default row count clamped to the allowed range
    pub fn effective_rows(&self) -> usize {
        clamp_preview_rows(self.default_rows)
    }
}

pub fn clamp_preview_rows(rows: usize) -> usize {
    rows.clamp(MIN_PREVIEW_ROWS, MAX_PREVIEW_ROWS)
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai: AISettings,
    pub prompt: PromptSettings,
    pub preview: PreviewSettings,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("askgrid");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file yields defaults; a broken
    /// file is reported and also yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}
