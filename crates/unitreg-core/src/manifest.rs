//! Declarative TOML unit files.
//!
//! A manifest unit announces its registrations as `[[register]]` tables:
//!
//! ```toml
//! [[register]]
//! id = "windows/smb/psexec"
//! kind = "exploit"
//! name = "PsExec"
//! description = "Executes a payload over SMB"
//!
//! [register.metadata]
//! rank = "excellent"
//! ```
//!
//! [`ManifestLoader`] reads such a file, turns each entry into a value via a
//! host-supplied factory, and hands the resulting [`Unit`] to the namespace.

use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BoxError;
use crate::loader::{LoadError, Unit, UnitLoader};

/// Default extension for manifest unit files.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Maximum size of a manifest unit file (1 MB).
const MAX_MANIFEST_SIZE: usize = 1_048_576;

/// One registration declared by a manifest unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    /// Identifier the unit registers itself under.
    pub id: String,
    /// Free-form category (e.g. `"exploit"`, `"payload"`).
    pub kind: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Arbitrary unit-specific settings.
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub metadata: toml::Table,
}

/// Parsed contents of a manifest unit file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitManifest {
    /// Registrations in file order. Empty if the unit registers nothing.
    #[serde(default)]
    pub register: Vec<UnitDescriptor>,
}

impl UnitManifest {
    /// Parse manifest text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the text is not a valid manifest.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Read and parse the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] if the file cannot be read and
    /// [`LoadError::Unit`] if it is too large, not UTF-8, or malformed.
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        let bytes = std::fs::read(path).map_err(|e| LoadError::unreadable(path, e))?;

        if bytes.len() > MAX_MANIFEST_SIZE {
            return Err(LoadError::unit(format!(
                "unit file {} is {} bytes, exceeding the {MAX_MANIFEST_SIZE} byte limit",
                path.display(),
                bytes.len()
            )));
        }

        let content = String::from_utf8(bytes).map_err(|e| {
            LoadError::unit(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unit file {} is not valid UTF-8: {e}", path.display()),
            ))
        })?;

        Self::parse(&content).map_err(|e| {
            LoadError::unit(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("malformed unit file {}: {e}", path.display()),
            ))
        })
    }
}

type Factory<T> = dyn Fn(&UnitDescriptor) -> Result<T, BoxError> + Send + Sync;

/// A [`UnitLoader`] for TOML manifest units.
pub struct ManifestLoader<T> {
    factory: Box<Factory<T>>,
}

impl<T> ManifestLoader<T> {
    /// Build values with `factory`.
    ///
    /// A factory error is reported as the unit's own failure.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn(&UnitDescriptor) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
        }
    }
}

impl ManifestLoader<Arc<UnitDescriptor>> {
    /// A loader whose values are the descriptors themselves.
    #[must_use]
    pub fn descriptors() -> Self {
        Self::new(|descriptor| Ok(Arc::new(descriptor.clone())))
    }
}

impl<T> UnitLoader<T> for ManifestLoader<T> {
    fn load(&self, path: &Path) -> Result<Unit<T>, LoadError> {
        let manifest = UnitManifest::read(path)?;
        debug!(
            path = %path.display(),
            registrations = manifest.register.len(),
            "Parsed unit manifest"
        );

        let mut unit = Unit::new();
        for descriptor in &manifest.register {
            let value = (self.factory)(descriptor).map_err(LoadError::Unit)?;
            unit.push(descriptor.id.clone(), value);
        }
        Ok(unit)
    }
}

impl<T> std::fmt::Debug for ManifestLoader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestLoader").finish_non_exhaustive()
    }
}
