//! Configuration types for unitreg.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML produces a working configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default unit-file extension for namespaces that do not set one.
pub const DEFAULT_EXTENSION: &str = "toml";

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Namespace definitions keyed by namespace name.
    pub namespaces: BTreeMap<String, NamespaceSection>,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

impl Config {
    /// Look up a namespace definition by name.
    #[must_use]
    pub fn namespace(&self, name: &str) -> Option<&NamespaceSection> {
        self.namespaces.get(name)
    }
}

// ---------------------------------------------------------------------------
// NamespaceSection
// ---------------------------------------------------------------------------

/// One namespace: a directory of unit files sharing an extension.
///
/// ```toml
/// [namespaces.exploits]
/// directory = "modules/exploits"
/// extension = "toml"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSection {
    /// Base directory of the namespace's unit files. Relative paths are
    /// resolved against the layer that declared them.
    pub directory: PathBuf,
    /// Unit-file extension, without the leading dot.
    pub extension: String,
}

impl Default for NamespaceSection {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"`, or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["unitreg_core=debug"]`).
    pub directives: Vec<String>,
    /// Write daily-rotated log files here instead of stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
