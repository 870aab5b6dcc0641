//! Startup configuration
//!
//! [`Settings`] is read once (TOML text, a file, or defaults) and turned into
//! the immutable attribute registry that the rest of the system shares.

use crate::error::{CoreError, CoreResult};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use strata_attrib::{AttributeConfig, AttributeRegistry};

/// Closure cache sizing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum cached closures
    pub capacity: u64,
    /// Entry lifetime; `None` keeps entries until evicted
    pub ttl_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl_secs: None,
        }
    }
}

impl CacheSettings {
    /// TTL as a duration
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}

/// Process configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Load the built-in attribute table first
    pub builtin_attributes: bool,
    /// Additional attribute definitions, registered after the built-ins
    pub attributes: Vec<AttributeConfig>,
    /// Closure cache sizing
    pub closure_cache: CacheSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            builtin_attributes: true,
            attributes: Vec::new(),
            closure_cache: CacheSettings::default(),
        }
    }
}

impl Settings {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// `Settings` on malformed TOML or mistyped keys.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        toml::from_str(text).map_err(|e| CoreError::Settings(e.to_string()))
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// `Settings` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Settings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Without the built-in attribute table
    #[inline]
    #[must_use]
    pub fn without_builtins(mut self) -> Self {
        self.builtin_attributes = false;
        self
    }

    /// Build the shared attribute registry
    ///
    /// # Errors
    /// `Configuration` for unknown type names, duplicate names in an
    /// overlapping scope or defaults of the wrong type.
    pub fn build_registry(&self) -> CoreResult<Arc<AttributeRegistry>> {
        let mut registry = if self.builtin_attributes {
            AttributeRegistry::with_builtins()?
        } else {
            AttributeRegistry::new()
        };
        registry.register_configs(self.attributes.iter().cloned())?;
        tracing::info!(attributes = registry.len(), "attribute registry built");
        Ok(Arc::new(registry))
    }
}
