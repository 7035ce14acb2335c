//! Registry error types.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A boxed error raised by a unit while it was being loaded.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A directory-dependent operation was called before [`configure`].
    ///
    /// This is a setup bug in the host, not a missing unit.
    ///
    /// [`configure`]: crate::Namespace::configure
    #[error("namespace '{namespace}' has no directory configured")]
    NotConfigured {
        /// Namespace that was accessed.
        namespace: String,
    },

    /// The requested identifier could not be resolved to a value.
    #[error("class not found: '{id}' in namespace '{namespace}': {cause}")]
    ClassNotFound {
        /// Namespace that was searched.
        namespace: String,
        /// Identifier that was requested.
        id: String,
        /// Why the lookup failed.
        cause: NotFoundCause,
    },

    /// The unit itself failed while loading. Passed through untouched.
    #[error(transparent)]
    Unit(BoxError),
}

impl RegistryError {
    /// The [`NotFoundCause`] if this is a [`RegistryError::ClassNotFound`].
    #[must_use]
    pub fn not_found_cause(&self) -> Option<&NotFoundCause> {
        match self {
            Self::ClassNotFound { cause, .. } => Some(cause),
            _ => None,
        }
    }

    /// Whether this is a [`RegistryError::ClassNotFound`].
    #[must_use]
    pub fn is_class_not_found(&self) -> bool {
        matches!(self, Self::ClassNotFound { .. })
    }
}

/// The distinguishable reasons a [`RegistryError::ClassNotFound`] is raised.
#[derive(Debug, Error)]
pub enum NotFoundCause {
    /// No unit file exists for the identifier.
    #[error("{}", describe_missing(directory, path.as_deref()))]
    MissingFile {
        /// Base directory of the namespace.
        directory: PathBuf,
        /// Path that was probed; `None` when the identifier cannot name a
        /// file under `directory` (empty, `.`/`..` segments, absolute).
        path: Option<PathBuf>,
    },

    /// The loader could not read the unit file.
    #[error("failed to load {}: {source}", path.display())]
    LoadFailed {
        /// Path of the unit file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The unit loaded cleanly but registered nothing.
    #[error("{} loaded but did not register itself", path.display())]
    NoSelfRegistration {
        /// Path of the unit file.
        path: PathBuf,
    },

    /// The unit registered under identifiers other than the one requested.
    #[error("{} registered {} instead", path.display(), registered.join(", "))]
    IdMismatch {
        /// Path of the unit file.
        path: PathBuf,
        /// Identifiers the unit actually registered, sorted.
        registered: Vec<String>,
    },
}

impl NotFoundCause {
    /// Short machine-readable name for the cause.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFile { .. } => "missing-file",
            Self::LoadFailed { .. } => "load-failure",
            Self::NoSelfRegistration { .. } => "no-self-registration",
            Self::IdMismatch { .. } => "id-mismatch",
        }
    }
}

fn describe_missing(directory: &Path, path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("no unit file at {}", path.display()),
        None => format!(
            "identifier does not name a unit file under {}",
            directory.display()
        ),
    }
}

/// A specialized Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
