//! Report layout and release policies

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When a node's measurement stops advancing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FreezePolicy {
    /// Every node freezes at its own release.
    #[default]
    OnRelease,
    /// Only the root freezes, when it is released. Every other node is
    /// sampled live at render time, released or not.
    RootOnly,
}

/// What to do with descendants still open when the root renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnreleasedPolicy {
    /// Sample them live and log at debug level.
    Allow,
    /// Sample them live and log a warning per scope.
    #[default]
    Warn,
    /// Refuse to render; releasing the root returns an error.
    Reject,
}

/// Report configuration.
///
/// The defaults reproduce the classic layout: four spaces per level and a
/// twenty character name column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    /// Spaces of indentation per depth level
    pub indent_width: usize,

    /// Minimum width of the indented name column, left-justified.
    ///
    /// Longer names are not truncated.
    pub name_column_width: usize,

    /// Label of the synthetic self-time line
    pub rest_label: String,

    /// When measurements freeze
    pub freeze_policy: FreezePolicy,

    /// Handling of scopes never released before the root
    pub unreleased_policy: UnreleasedPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            name_column_width: 20,
            rest_label: "Rest".to_string(),
            freeze_policy: FreezePolicy::OnRelease,
            unreleased_policy: UnreleasedPolicy::Warn,
        }
    }
}

impl ReportConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every scope must be released, and each freezes when it is.
    pub fn strict() -> Self {
        Self {
            freeze_policy: FreezePolicy::OnRelease,
            unreleased_policy: UnreleasedPolicy::Reject,
            ..Self::default()
        }
    }

    /// Builder method to set the indentation per level.
    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Builder method to set the name column width.
    pub fn with_name_column_width(mut self, width: usize) -> Self {
        self.name_column_width = width;
        self
    }

    /// Builder method to set the self-time label.
    pub fn with_rest_label(mut self, label: impl Into<String>) -> Self {
        self.rest_label = label.into();
        self
    }

    /// Builder method to set the freeze policy.
    pub fn with_freeze_policy(mut self, policy: FreezePolicy) -> Self {
        self.freeze_policy = policy;
        self
    }

    /// Builder method to set the unreleased-scope policy.
    pub fn with_unreleased_policy(mut self, policy: UnreleasedPolicy) -> Self {
        self.unreleased_policy = policy;
        self
    }

    /// Whether releasing a non-root node freezes its measurement.
    pub fn freezes_on_release(&self) -> bool {
        self.freeze_policy == FreezePolicy::OnRelease
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration file, falling back to defaults if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(
                target: "scope_timer",
                path = %path.display(),
                "config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
