// AI configuration and secrets management
//
// API keys are looked up in:
// 1. System keychain (preferred)
// 2. Environment variables, optionally seeded from a dotenv file
//
// Keys are NEVER stored in settings.json and never logged.

use std::env;
use std::path::Path;

use crate::settings::{AIProvider, AISettings};

/// Service name for keychain storage
#[cfg(feature = "keychain")]
const KEYCHAIN_SERVICE: &str = "askgrid";

/// Dotenv files consulted at startup, in order
pub const DOTENV_FILES: &[&str] = &["key.env", ".env"];

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Keychain,
    Environment,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Environment variables checked for a provider's key, in priority order
pub fn env_var_names(provider: &str) -> Vec<String> {
    let mut names = vec![format!("ASKGRID_{}_KEY", provider.to_uppercase())];
    if provider.eq_ignore_ascii_case("openai") {
        names.push("OPENAI_API_KEY".to_string());
    }
    names
}

#[cfg(feature = "keychain")]
fn keychain_account(provider: &str) -> String {
    format!("ai/{}", provider.to_lowercase())
}

/// Load dotenv files from `dir` into the process environment.
/// Variables that are already set are left untouched. Returns the files
/// that were loaded.
pub fn load_dotenv(dir: &Path) -> Vec<String> {
    let mut loaded = Vec::new();
    for name in DOTENV_FILES {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => {
                log::debug!("loaded environment from {}", path.display());
                loaded.push(path.display().to_string());
            }
            Err(e) => log::warn!("could not load {}: {}", path.display(), e),
        }
    }
    loaded
}

/// Get an API key for the specified provider
///
/// Checks in order:
/// 1. System keychain
/// 2. ASKGRID_<PROVIDER>_KEY, then OPENAI_API_KEY for OpenAI
pub fn get_api_key(provider: &str) -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider)) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    for name in env_var_names(provider) {
        if let Ok(key) = env::var(&name) {
            if !key.is_empty() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Environment,
                };
            }
        }
    }

    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Store an API key in the system keychain
#[cfg(feature = "keychain")]
pub fn set_api_key(provider: &str, key: &str) -> Result<(), String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider))
        .map_err(|e| format!("Failed to create keychain entry: {}", e))?;

    entry
        .set_password(key)
        .map_err(|e| format!("Failed to store key in keychain: {}", e))
}

#[cfg(not(feature = "keychain"))]
pub fn set_api_key(_provider: &str, _key: &str) -> Result<(), String> {
    Err("Keychain support not enabled. Set ASKGRID_<PROVIDER>_KEY instead.".to_string())
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration
// ============================================================================

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// provider = none
    Disabled,
    Ready,
    /// Provider needs a key and none was found. Not fatal: calls will fail
    /// and surface as completion errors.
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }
}

/// The effective AI configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    pub model: String,
    /// Base URL of the chat-completions API
    pub endpoint: String,
    pub max_tokens: u32,
    pub timeout_secs: Option<u64>,
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

impl ResolvedAIConfig {
    /// Resolve from settings plus the key store.
    pub fn from_settings(settings: &AISettings) -> Self {
        let lookup = if settings.provider.needs_api_key() {
            get_api_key(settings.provider.name())
        } else {
            KeyLookup { key: None, source: KeySource::None }
        };
        Self::resolve(settings, lookup)
    }

    /// Resolve from settings with an explicit key lookup result.
    pub fn resolve(settings: &AISettings, lookup: KeyLookup) -> Self {
        let provider = settings.provider;

        let (status, blocking_reason) = if !provider.is_enabled() {
            (AIConfigStatus::Disabled, Some("provider=none".to_string()))
        } else if provider.needs_api_key() && lookup.key.is_none() {
            (
                AIConfigStatus::MissingKey,
                Some(format!(
                    "No API key found. Set via keychain or {}",
                    env_var_names(provider.name()).join(" / ")
                )),
            )
        } else {
            (AIConfigStatus::Ready, None)
        };

        Self {
            provider,
            model: settings.effective_model().to_string(),
            endpoint: settings.effective_endpoint().trim_end_matches('/').to_string(),
            max_tokens: settings.max_tokens,
            timeout_secs: settings.timeout_secs,
            api_key: lookup.key,
            key_source: lookup.source,
            status,
            blocking_reason,
        }
    }
}

// ============================================================================
// Diagnostics (for `askgrid ai doctor`)
// ============================================================================

#[derive(Debug)]
pub struct AIDiagnostics {
    pub provider: String,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: u32,
    pub timeout_secs: Option<u64>,
    pub status: AIConfigStatus,
    pub blocking_reason: Option<String>,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            provider: config.provider.name().to_string(),
            model: config.model.clone(),
            endpoint: config.endpoint.clone(),
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
            status: config.status,
            blocking_reason: config.blocking_reason.clone(),
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
        }
    }
}

impl std::fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Doctor")?;
        writeln!(f, "---------")?;
        writeln!(f, "status:          {}", self.status.as_str())?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "blocking_reason: {}", reason)?;
        }
        writeln!(f, "provider:        {}", self.provider)?;
        writeln!(f, "model:           {}", self.model)?;
        writeln!(f, "endpoint:        {}", self.endpoint)?;
        writeln!(f, "max_tokens:      {}", self.max_tokens)?;
        match self.timeout_secs {
            Some(secs) => writeln!(f, "timeout:         {}s", secs)?,
            None => writeln!(f, "timeout:         none")?,
        }
        writeln!(f, "key:             {}", if self.key_present { "present" } else { "missing" })?;
        writeln!(f, "key_source:      {}", self.key_source.as_str())?;
        write!(f, "keychain:        {}", if self.keychain_available { "ok" } else { "unavailable" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_env_var_names() {
        assert_eq!(env_var_names("openai"), vec!["ASKGRID_OPENAI_KEY", "OPENAI_API_KEY"]);
        assert_eq!(env_var_names("local"), vec!["ASKGRID_LOCAL_KEY"]);
    }

    #[test]
    fn test_key_lookup_from_env() {
        env::set_var("ASKGRID_TESTPROVIDER_KEY", "test-key-123");

        let lookup = get_api_key("testprovider");
        assert_eq!(lookup.source, KeySource::Environment);
        assert_eq!(lookup.key, Some("test-key-123".to_string()));

        env::remove_var("ASKGRID_TESTPROVIDER_KEY");
    }

    #[test]
    fn test_key_lookup_missing() {
        let lookup = get_api_key("nonexistent_provider_xyz");
        assert_eq!(lookup.source, KeySource::None);
        assert!(lookup.key.is_none());
    }

    #[test]
    fn test_load_dotenv_does_not_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("key.env"),
            "ASKGRID_DOTENV_PROBE=from-file\nASKGRID_DOTENV_KEEP=from-file\n",
        )
        .unwrap();
        env::set_var("ASKGRID_DOTENV_KEEP", "from-env");

        let loaded = load_dotenv(dir.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(env::var("ASKGRID_DOTENV_PROBE").unwrap(), "from-file");
        assert_eq!(env::var("ASKGRID_DOTENV_KEEP").unwrap(), "from-env");

        env::remove_var("ASKGRID_DOTENV_PROBE");
        env::remove_var("ASKGRID_DOTENV_KEEP");
    }

    #[test]
    fn test_resolve_missing_key_is_not_fatal() {
        let settings = AISettings::default();
        let config = ResolvedAIConfig::resolve(
            &settings,
            KeyLookup { key: None, source: KeySource::None },
        );
        assert_eq!(config.status, AIConfigStatus::MissingKey);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.endpoint, "https://api.openai.com/v1");
        assert!(config.blocking_reason.unwrap().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_resolve_ready_and_disabled() {
        let settings = AISettings {
            endpoint: Some("http://127.0.0.1:9999/v1/".to_string()),
            ..AISettings::default()
        };
        let config = ResolvedAIConfig::resolve(
            &settings,
            KeyLookup { key: Some("sk-test".into()), source: KeySource::Environment },
        );
        assert_eq!(config.status, AIConfigStatus::Ready);
        assert_eq!(config.endpoint, "http://127.0.0.1:9999/v1");

        let disabled = AISettings { provider: AIProvider::None, ..AISettings::default() };
        let config = ResolvedAIConfig::resolve(
            &disabled,
            KeyLookup { key: None, source: KeySource::None },
        );
        assert_eq!(config.status, AIConfigStatus::Disabled);
    }

    #[test]
    fn test_local_provider_needs_no_key() {
        let settings = AISettings { provider: AIProvider::Local, ..AISettings::default() };
        let config = ResolvedAIConfig::from_settings(&settings);
        assert_eq!(config.status, AIConfigStatus::Ready);
        assert_eq!(config.endpoint, "http://localhost:11434/v1");
    }
}
