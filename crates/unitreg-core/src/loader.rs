//! The seam between a [`Namespace`](crate::Namespace) and the host's
//! file → unit mechanism.
//!
//! A loader does not mutate the registry. It evaluates a unit file and hands
//! back a [`Unit`] describing every identifier the file announces; the
//! namespace applies those registrations itself and then checks that the
//! requested identifier was among them.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::error::BoxError;

/// The registrations produced by evaluating one unit file.
#[derive(Debug, Clone)]
pub struct Unit<T> {
    registrations: Vec<(String, T)>,
}

impl<T> Unit<T> {
    /// A unit that registers nothing.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Announce `value` under `id`.
    #[must_use]
    pub fn register(mut self, id: impl Into<String>, value: T) -> Self {
        self.push(id, value);
        self
    }

    /// Announce `value` under `id` in place.
    pub fn push(&mut self, id: impl Into<String>, value: T) {
        self.registrations.push((id.into(), value));
    }

    /// Identifiers announced so far, in announcement order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.registrations.iter().map(|(id, _)| id.as_str())
    }

    /// Number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether the unit registers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Consume the unit, yielding its registrations in order.
    #[must_use]
    pub fn into_registrations(self) -> Vec<(String, T)> {
        self.registrations
    }
}

impl<T> Default for Unit<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(String, T)> for Unit<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            registrations: iter.into_iter().collect(),
        }
    }
}

/// Errors a [`UnitLoader`] may return.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be located or read.
    ///
    /// The namespace wraps this into a class-not-found error.
    #[error("cannot read unit file {}: {source}", path.display())]
    Unreadable {
        /// Path of the unit file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The unit was read but failed on its own terms.
    ///
    /// The namespace propagates this unchanged.
    #[error(transparent)]
    Unit(BoxError),
}

impl LoadError {
    /// Wrap an I/O failure for `path`.
    pub fn unreadable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Wrap a failure raised by the unit itself.
    pub fn unit(err: impl Into<BoxError>) -> Self {
        Self::Unit(err.into())
    }
}

/// Turns a unit file into the registrations it announces.
pub trait UnitLoader<T>: Send + Sync {
    /// Evaluate the unit file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Unreadable`] when the file cannot be read and
    /// [`LoadError::Unit`] when the unit's own evaluation fails.
    fn load(&self, path: &Path) -> Result<Unit<T>, LoadError>;
}

impl<T, L> UnitLoader<T> for Arc<L>
where
    L: UnitLoader<T> + ?Sized,
{
    fn load(&self, path: &Path) -> Result<Unit<T>, LoadError> {
        (**self).load(path)
    }
}

impl<T, L> UnitLoader<T> for Box<L>
where
    L: UnitLoader<T> + ?Sized,
{
    fn load(&self, path: &Path) -> Result<Unit<T>, LoadError> {
        (**self).load(path)
    }
}

/// A [`UnitLoader`] backed by a closure.
pub struct FnLoader<F>(F);

impl<F> FnLoader<F> {
    /// Wrap `f` as a loader.
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, F> UnitLoader<T> for FnLoader<F>
where
    F: Fn(&Path) -> Result<Unit<T>, LoadError> + Send + Sync,
{
    fn load(&self, path: &Path) -> Result<Unit<T>, LoadError> {
        (self.0)(path)
    }
}

impl<F> std::fmt::Debug for FnLoader<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnLoader").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_builder_keeps_order() {
        let unit = Unit::new().register("b", 2).register("a", 1);
        assert_eq!(unit.ids().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(unit.len(), 2);
        assert_eq!(
            unit.into_registrations(),
            vec![("b".to_string(), 2), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn test_empty_unit() {
        let unit: Unit<u8> = Unit::default();
        assert!(unit.is_empty());
    }

    #[test]
    fn test_fn_loader_forwards_path() {
        let loader = FnLoader::new(|path: &Path| {
            let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
            Ok::<_, LoadError>(Unit::new().register(stem, 7_u32))
        });
        let unit = loader.load(Path::new("/tmp/widget.toml")).unwrap();
        assert_eq!(unit.ids().collect::<Vec<_>>(), vec!["widget"]);
    }

    #[test]
    fn test_arc_loader_delegates() {
        let loader: Arc<dyn UnitLoader<u8>> = Arc::new(FnLoader::new(|_: &Path| {
            Ok::<_, LoadError>(Unit::new().register("x", 1_u8))
        }));
        assert_eq!(loader.load(Path::new("x")).unwrap().len(), 1);
    }

    #[test]
    fn test_load_error_constructors() {
        let err = LoadError::unreadable(
            "gone.toml",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("gone.toml"));

        let err = LoadError::unit("bad unit");
        assert_eq!(err.to_string(), "bad unit");
    }
}
