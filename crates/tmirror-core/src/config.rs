#![forbid(unsafe_code)]

//! Tunable behavior of the mirroring engine.
//!
//! [`MirrorConfig`] groups every knob into one struct that can be loaded from
//! TOML or JSON (feature `config`).
//!
//! ```toml
//! # tmirror.toml
//! [align]
//! verify = true
//! trace_edits = false
//!
//! [tree]
//! start_imitating = true
//! max_depth = 64
//! ```
//!
//! ```rust,ignore
//! let config = MirrorConfig::from_toml_file("tmirror.toml")?.with_env_overrides();
//! ```
//!
//! # Defaults
//!
//! `MirrorConfig::default()` reproduces the built-in behavior: verification in
//! debug builds only, no per-edit tracing, trees imitate on creation and
//! expand without a depth limit.
//!
//! # Environment
//!
//! `TMIRROR_VERIFY_ALIGNMENT=1` (or `0`) forces post-alignment verification on
//! (or off) regardless of the loaded value.

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`AlignConfig::verify`].
pub const VERIFY_ENV_VAR: &str = "TMIRROR_VERIFY_ALIGNMENT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct MirrorConfig {
    /// Sequence aligner behavior.
    pub align: AlignConfig,

    /// Wrapper tree behavior.
    pub tree: TreeConfig,
}

/// Sequence aligner behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct AlignConfig {
    /// Check after every pass that the list matches the target.
    /// A mismatch is an internal invariant violation and panics.
    pub verify: bool,

    /// Emit a `trace!` event per structural edit.
    pub trace_edits: bool,
}

impl Default for AlignConfig {
    fn default() -> Self {
        Self {
            verify: cfg!(debug_assertions),
            trace_edits: false,
        }
    }
}

/// Wrapper tree behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TreeConfig {
    /// Whether a freshly wrapped root starts imitating its source.
    pub start_imitating: bool,

    /// Nodes at this depth or deeper are created paused. `None` = unlimited.
    pub max_depth: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            start_imitating: true,
            max_depth: None,
        }
    }
}

impl TreeConfig {
    /// Whether a node at `depth` may expand its children on creation.
    #[must_use]
    pub fn expands_at(&self, depth: usize) -> bool {
        self.max_depth.is_none_or(|max| depth < max)
    }
}

impl MirrorConfig {
    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate all parameters.
    ///
    /// Returns a list of problems. An empty list means the config is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.tree.max_depth == Some(0) {
            errors.push("tree.max_depth must be > 0 (the root always expands)".into());
        }
        errors
    }

    /// Apply [`VERIFY_ENV_VAR`] if set.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(VERIFY_ENV_VAR) {
            match value.trim() {
                "1" | "true" => self.align.verify = true,
                "0" | "false" => self.align.verify = false,
                other => tracing::warn!(value = other, "ignoring unrecognized {VERIFY_ENV_VAR}"),
            }
        }
        self
    }

    #[cfg(feature = "config")]
    fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Errors that can occur when loading a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),

    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[source] toml::de::Error),

    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[source] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
