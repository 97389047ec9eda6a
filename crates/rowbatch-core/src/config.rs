//! Coordinator configuration
//!
//! ```toml
//! mode = "declarative"
//! declarative_animation = "fade"
//! validate_counts = true
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{BatchError, Result};
use crate::model::RowAnimation;

/// How edits reach the change set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileMode {
    /// Callers record every edit explicitly
    #[default]
    Imperative,
    /// Edits are derived by diffing the data source's content at commit
    Declarative,
}

impl std::fmt::Display for ReconcileMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileMode::Imperative => write!(f, "imperative"),
            ReconcileMode::Declarative => write!(f, "declarative"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoordinatorConfig {
    pub mode: ReconcileMode,
    /// Animation attached to every edit produced by a declarative diff
    pub declarative_animation: RowAnimation,
    /// Check recorded edits against old/new counts before flushing
    pub validate_counts: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            mode: ReconcileMode::Imperative,
            declarative_animation: RowAnimation::Automatic,
            validate_counts: true,
        }
    }
}

impl CoordinatorConfig {
    /// Parse a TOML document; missing keys take their defaults
    ///
    /// # Errors
    ///
    /// `Serialization` if the document is malformed or has unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| BatchError::Serialization {
            message: e.to_string(),
        })
    }
}
