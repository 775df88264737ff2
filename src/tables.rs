//! Declarative scoring tables: lexicons and narrative rules.
//!
//! The built-in set is available as [`DEFAULT_TABLES`]. A TOML file may
//! replace any table; tables it omits keep their built-in contents.
//!
//! ```toml
//! [lexicons]
//! technical = ["api", "cli", "kubernetes"]
//!
//! [[narrative.hypotheses]]
//! signal = "systems_thinking"
//! comparison = "at_least"
//! threshold = 70.0
//! message = "Strong systems orientation."
//! ```

use crate::error::{AtlasError, Result};
use crate::lexicon::Lexicons;
use crate::narrative::{NarrativeRule, NarrativeRules};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Built-in tables shared by every default-configured analysis
pub static DEFAULT_TABLES: Lazy<ProfileTables> = Lazy::new(ProfileTables::default);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileTables {
    pub lexicons: Lexicons,
    pub narrative: NarrativeRules,
}

impl ProfileTables {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let tables: ProfileTables = toml::from_str(content)?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| AtlasError::Config {
            message: format!("Failed to read tables file {}: {}", path.display(), e),
        })?;
        let tables = Self::from_toml_str(&content)?;
        tracing::info!(
            path = %path.display(),
            hypotheses = tables.narrative.hypotheses.len(),
            suggestions = tables.narrative.suggestions.len(),
            "Loaded profile tables"
        );
        Ok(tables)
    }

    /// Reject tables that would make rule evaluation meaningless
    pub fn validate(&self) -> Result<()> {
        let check = |rule: &NarrativeRule, table: &str| -> Result<()> {
            if !rule.threshold.is_finite() {
                return Err(AtlasError::Config {
                    message: format!(
                        "{} rule on {} has non-finite threshold",
                        table,
                        rule.signal.as_str()
                    ),
                });
            }
            if rule.message.trim().is_empty() {
                return Err(AtlasError::Config {
                    message: format!("{} rule on {} has empty message", table, rule.signal.as_str()),
                });
            }
            Ok(())
        };
        for rule in &self.narrative.hypotheses {
            check(rule, "hypotheses")?;
        }
        for rule in &self.narrative.suggestions {
            check(rule, "suggestions")?;
        }
        if self.narrative.fallback_hypothesis.trim().is_empty() {
            return Err(AtlasError::Config {
                message: "fallback_hypothesis must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
