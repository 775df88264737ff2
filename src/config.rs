use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::tables::ProfileTables;

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LOG_LEVEL: &str = "insight_atlas=info";

/// Main configuration structure loaded from insight_atlas.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    /// Optional TOML file replacing the built-in lexicons and narrative rules
    pub tables_path: Option<PathBuf>,
    pub polish: PolishConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            tables_path: None,
            polish: PolishConfig::default(),
        }
    }
}

/// Narrative polish (optional rewrite) settings
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolishConfig {
    pub enabled: bool,
    /// Credential for the rewriting service; env only, never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 20_000,
        }
    }
}

impl std::fmt::Debug for PolishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolishConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl PolishConfig {
    /// Enabled and holding a credential. Anything else means "no network call".
    pub fn is_available(&self) -> bool {
        self.enabled && self.api_key.is_some()
    }

    /// Apply `OPENAI_*` / `ATLAS_POLISH_*` overrides from a key lookup
    pub fn apply_env_with<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(enabled) = lookup("OPENAI_POLISH_ENABLED") {
            self.enabled = enabled == "1" || enabled.eq_ignore_ascii_case("true");
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
        if let Some(base) = lookup("OPENAI_BASE_URL").filter(|b| !b.trim().is_empty()) {
            self.base_url = base;
        }
        if let Some(timeout) = lookup("ATLAS_POLISH_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.timeout_ms = timeout;
        }
        self.normalize();
    }

    /// Blank credentials count as absent; zero timeouts are raised to 1ms
    fn normalize(&mut self) {
        if self
            .api_key
            .as_deref()
            .is_some_and(|k| k.trim().is_empty())
        {
            self.api_key = None;
        }
        if self.timeout_ms == 0 {
            tracing::warn!("polish timeout_ms of 0 is not usable, using 1ms");
            self.timeout_ms = 1;
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses INSIGHT_ATLAS_CONFIG environment variable or defaults to "insight_atlas.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("ATLAS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("INSIGHT_ATLAS_CONFIG")
            .unwrap_or_else(|_| "insight_atlas.toml".to_string());

        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(content) => Self::from_toml_str(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path))?,
            Err(_) => {
                tracing::warn!("Config file {} not found, using defaults", config_path);
                Self::default()
            }
        };

        config.apply_env_with(&|key| std::env::var(key).ok());

        if config.polish.enabled && config.polish.api_key.is_none() {
            tracing::warn!("Narrative polish enabled but OPENAI_API_KEY is not set; polish disabled");
        }
        tracing::debug!(polish = ?config.polish, "configuration loaded");

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let mut config: Config = toml::from_str(content)?;
        config.polish.normalize();
        if config.log_level.trim().is_empty() {
            config.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
        Ok(config)
    }

    pub fn apply_env_with<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("LOG_LEVEL").filter(|l| !l.trim().is_empty()) {
            self.log_level = level;
        }
        if let Some(path) = lookup("ATLAS_TABLES").filter(|p| !p.trim().is_empty()) {
            tracing::debug!("ATLAS_TABLES env override applied");
            self.tables_path = Some(PathBuf::from(path));
        }
        if self.log_level.trim().is_empty() {
            self.log_level = DEFAULT_LOG_LEVEL.to_string();
        }
        self.polish.apply_env_with(lookup);
    }

    /// Tables named by `tables_path`, or the built-in set
    pub fn tables(&self) -> anyhow::Result<ProfileTables> {
        match &self.tables_path {
            Some(path) => ProfileTables::load(path)
                .with_context(|| format!("Failed to load tables from {}", path.display())),
            None => Ok(ProfileTables::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_disable_polish() {
        let cfg = Config::from_toml_str("").unwrap();
        assert!(!cfg.polish.enabled);
        assert!(!cfg.polish.is_available());
        assert_eq!(cfg.polish.model, DEFAULT_MODEL);
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_env_with(&lookup(&[
            ("OPENAI_POLISH_ENABLED", "TRUE"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-test"),
            ("ATLAS_POLISH_TIMEOUT_MS", "1500"),
            ("ATLAS_TABLES", "tables.toml"),
        ]));
        assert!(cfg.polish.is_available());
        assert_eq!(cfg.polish.model, "gpt-test");
        assert_eq!(cfg.polish.timeout_ms, 1500);
        assert_eq!(cfg.tables_path, Some(PathBuf::from("tables.toml")));
        assert_eq!(cfg.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn test_blank_key_means_unavailable() {
        let mut cfg = PolishConfig::default();
        cfg.apply_env_with(&lookup(&[("OPENAI_POLISH_ENABLED", "1"), ("OPENAI_API_KEY", "  ")]));
        assert!(cfg.enabled);
        assert!(cfg.api_key.is_none());
        assert!(!cfg.is_available());
    }

    #[test]
    fn test_debug_redacts_key() {
        let cfg = PolishConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let shown = format!("{:?}", cfg);
        assert!(!shown.contains("sk-secret"));
        assert!(shown.contains("<redacted>"));
    }

    #[test]
    fn test_toml_polish_section() {
        let cfg = Config::from_toml_str(
            r#"
log_level = "insight_atlas=debug"

[polish]
enabled = true
model = "gpt-4.1"
timeout_ms = 0
"#,
        )
        .unwrap();
        assert!(cfg.polish.enabled);
        assert_eq!(cfg.polish.model, "gpt-4.1");
        assert_eq!(cfg.polish.timeout_ms, 1);
        assert_eq!(cfg.polish.base_url, DEFAULT_BASE_URL);
        // still no credential
        assert!(!cfg.polish.is_available());
    }
}
