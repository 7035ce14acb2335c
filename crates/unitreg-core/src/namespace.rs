//! The namespace registry.
//!
//! A [`Namespace`] binds a logical name (e.g. `"exploits"`) to a directory
//! of unit files and caches every value those files register. Values are
//! loaded lazily: [`Namespace::load`] resolves an identifier to a file,
//! evaluates it through the namespace's [`UnitLoader`] exactly once, and
//! keeps the result resident for the lifetime of the namespace.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, trace, warn};

use crate::discovery::{Identifiers, candidate_path};
use crate::error::{NotFoundCause, RegistryError, RegistryResult};
use crate::flight::InFlight;
use crate::loader::{LoadError, UnitLoader};

/// A registry of lazily loaded units sharing one directory.
///
/// All operations take `&self`; share a namespace between threads with an
/// `Arc`. Concurrent first loads of the same identifier are de-duplicated:
/// the loader runs once and every caller receives the same value.
pub struct Namespace<T> {
    name: String,
    extension: String,
    directory: RwLock<Option<PathBuf>>,
    entries: RwLock<HashMap<String, T>>,
    loader: Box<dyn UnitLoader<T>>,
    in_flight: InFlight,
}

impl<T: Clone> Namespace<T> {
    /// Create an unconfigured namespace.
    ///
    /// `extension` is the unit-file extension; a leading dot is ignored.
    pub fn new(
        name: impl Into<String>,
        extension: impl AsRef<str>,
        loader: impl UnitLoader<T> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.as_ref().trim_start_matches('.').to_owned(),
            directory: RwLock::new(None),
            entries: RwLock::new(HashMap::new()),
            loader: Box::new(loader),
            in_flight: InFlight::default(),
        }
    }

    /// Configure the directory at construction time.
    #[must_use]
    pub fn with_directory(self, directory: impl Into<PathBuf>) -> Self {
        self.configure(directory);
        self
    }

    /// Logical name of this namespace.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit-file extension, without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Set the base directory, replacing any previous value.
    ///
    /// The path is not checked here; a bad directory surfaces later as a
    /// missing unit.
    pub fn configure(&self, directory: impl Into<PathBuf>) {
        let directory = directory.into();
        info!(
            namespace = %self.name,
            path = %directory.display(),
            "Configured unit directory"
        );
        *self
            .directory
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(directory);
    }

    /// The configured base directory.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotConfigured`] if [`configure`](Self::configure)
    /// was never called.
    pub fn directory(&self) -> RegistryResult<PathBuf> {
        self.directory
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| RegistryError::NotConfigured {
                namespace: self.name.clone(),
            })
    }

    /// Identifiers of every unit file under the base directory.
    ///
    /// Walks the directory afresh on each call. Does not load anything.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotConfigured`] if no directory is set.
    pub fn list_identifiers(&self) -> RegistryResult<Identifiers> {
        Ok(Identifiers::new(self.directory()?, self.extension.clone()))
    }

    /// Path of the unit file for `id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotConfigured`] if no directory is set.
    pub fn path_for(&self, id: &str) -> RegistryResult<Option<PathBuf>> {
        let directory = self.directory()?;
        Ok(candidate_path(&directory, id, &self.extension).filter(|p| p.is_file()))
    }

    /// Make `value` resident under `id`, replacing any previous value.
    pub fn register(&self, id: impl Into<String>, value: T) {
        let id = id.into();
        debug!(namespace = %self.name, id = %id, "Registered unit");
        self.entries_mut().insert(id, value);
    }

    /// The resident value for `id`, without touching the filesystem.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<T> {
        self.entries().get(id).cloned()
    }

    /// Whether `id` is resident.
    #[must_use]
    pub fn is_resident(&self, id: &str) -> bool {
        self.entries().contains_key(id)
    }

    /// All resident identifiers, sorted.
    #[must_use]
    pub fn resident_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of resident values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Whether nothing is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Resolve `id` to its value, loading its unit file on first use.
    ///
    /// A resident value is returned without I/O. Otherwise the unit file is
    /// evaluated, every registration it announces is applied, and the value
    /// registered under `id` is returned.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotConfigured`] if no directory is set and `id` is
    ///   not resident.
    /// - [`RegistryError::ClassNotFound`] with [`NotFoundCause::MissingFile`],
    ///   [`NotFoundCause::LoadFailed`], [`NotFoundCause::NoSelfRegistration`]
    ///   or [`NotFoundCause::IdMismatch`].
    /// - [`RegistryError::Unit`] if the unit itself failed; passed through
    ///   as the loader reported it.
    pub fn load(&self, id: &str) -> RegistryResult<T> {
        if let Some(value) = self.get(id) {
            trace!(namespace = %self.name, id, "Unit cache hit");
            return Ok(value);
        }

        let ticket = self.in_flight.ticket(id);
        let _gate = ticket.wait();

        // Another caller may have finished loading while we waited.
        if let Some(value) = self.get(id) {
            debug!(namespace = %self.name, id, "Unit resolved by concurrent load");
            return Ok(value);
        }

        let directory = self.directory()?;
        let path = match candidate_path(&directory, id, &self.extension) {
            Some(path) if path.is_file() => path,
            path => {
                return Err(self.not_found(id, NotFoundCause::MissingFile { directory, path }));
            },
        };

        self.load_from(id, &path)
    }

    fn load_from(&self, id: &str, path: &Path) -> RegistryResult<T> {
        debug!(namespace = %self.name, id, path = %path.display(), "Loading unit");

        let unit = match self.loader.load(path) {
            Ok(unit) => unit,
            Err(LoadError::Unreadable { source, .. }) => {
                warn!(
                    namespace = %self.name,
                    id,
                    path = %path.display(),
                    error = %source,
                    "Unit file could not be loaded"
                );
                return Err(self.not_found(
                    id,
                    NotFoundCause::LoadFailed {
                        path: path.to_path_buf(),
                        source,
                    },
                ));
            },
            Err(LoadError::Unit(e)) => {
                warn!(namespace = %self.name, id, path = %path.display(), error = %e, "Unit raised an error while loading");
                return Err(RegistryError::Unit(e));
            },
        };

        let mut announced: Vec<String> = unit.ids().map(str::to_owned).collect();
        for (unit_id, value) in unit.into_registrations() {
            self.register(unit_id, value);
        }

        if let Some(value) = self.get(id) {
            info!(namespace = %self.name, id, path = %path.display(), "Loaded unit");
            return Ok(value);
        }

        let path = path.to_path_buf();
        if announced.is_empty() {
            warn!(namespace = %self.name, id, path = %path.display(), "Unit did not register itself");
            return Err(self.not_found(id, NotFoundCause::NoSelfRegistration { path }));
        }

        announced.sort();
        announced.dedup();
        warn!(
            namespace = %self.name,
            id,
            path = %path.display(),
            registered = ?announced,
            "Unit registered under a different identifier"
        );
        Err(self.not_found(
            id,
            NotFoundCause::IdMismatch {
                path,
                registered: announced,
            },
        ))
    }

    fn not_found(&self, id: &str, cause: NotFoundCause) -> RegistryError {
        RegistryError::ClassNotFound {
            namespace: self.name.clone(),
            id: id.to_owned(),
            cause,
        }
    }

    fn entries(&self) -> RwLockReadGuard<'_, HashMap<String, T>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn entries_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, T>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for Namespace<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resident = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Namespace")
            .field("name", &self.name)
            .field("extension", &self.extension)
            .field(
                "directory",
                &*self.directory.read().unwrap_or_else(PoisonError::into_inner),
            )
            .field("resident_count", &resident)
            .finish_non_exhaustive()
    }
}
