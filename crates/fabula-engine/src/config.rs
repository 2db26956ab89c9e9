//! Engine configuration.

use std::path::Path;

use fabula_core::PathRules;
use serde::{Deserialize, Serialize};

use crate::error::{StoryError, StoryResult};

/// Configuration for a [`crate::StoryEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rules for canonical module paths.
    pub paths: PathRules,
    /// Helper modules loaded after the bootstrap sequence, in order.
    pub preload: Vec<String>,
    /// Route script `print` output to the log instead of stdout.
    pub redirect_print: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            paths: PathRules::default(),
            preload: Vec::new(),
            redirect_print: true,
        }
    }
}

impl EngineConfig {
    /// Set the script root.
    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.paths = self.paths.with_root(root);
        self
    }

    /// Set the required source extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.paths = self.paths.with_extension(extension);
        self
    }

    /// Set the opaque identifier marker.
    pub fn with_opaque_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.paths = self.paths.with_opaque_prefix(prefix);
        self
    }

    /// Add a helper module to the preload list.
    pub fn with_preload(mut self, module: impl Into<String>) -> Self {
        self.preload.push(module.into());
        self
    }

    /// Enable or disable print redirection.
    pub fn with_redirect_print(mut self, redirect: bool) -> Self {
        self.redirect_print = redirect;
        self
    }

    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> StoryResult<Self> {
        serde_json::from_str(json).map_err(|e| StoryError::Config(e.to_string()))
    }

    /// Read and parse a JSON configuration file.
    pub fn from_json_file(path: &Path) -> StoryResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| StoryError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }
}
