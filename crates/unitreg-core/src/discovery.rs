//! Unit file discovery and identifier ↔ path mapping.
//!
//! The filesystem convention is `<base_dir>/<identifier>.<ext>`, where the
//! identifier may contain `/` to address units in sub-directories.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

/// Separator used inside identifiers, independent of the host platform.
pub const ID_SEPARATOR: char = '/';

/// Lazy iterator over the identifiers of unit files under a base directory.
///
/// Each call to [`Namespace::list_identifiers`](crate::Namespace::list_identifiers)
/// starts a fresh walk, so the sequence is restartable. Ordering follows the
/// filesystem and is not stable across platforms.
pub struct Identifiers {
    base: PathBuf,
    extension: String,
    walker: Option<walkdir::IntoIter>,
}

impl Identifiers {
    pub(crate) fn new(base: PathBuf, extension: String) -> Self {
        let walker = if base.is_dir() {
            Some(WalkDir::new(&base).follow_links(true).into_iter())
        } else {
            debug!(path = %base.display(), "Unit directory does not exist, nothing to list");
            None
        };
        Self {
            base,
            extension,
            walker,
        }
    }
}

impl Iterator for Identifiers {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let walker = self.walker.as_mut()?;
        loop {
            let entry = match walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(
                        path = %self.base.display(),
                        error = %e,
                        "Skipping unreadable entry during unit discovery"
                    );
                    continue;
                },
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(id) = identifier_for(&self.base, entry.path(), &self.extension) {
                return Some(id);
            }
        }
    }
}

impl std::fmt::Debug for Identifiers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identifiers")
            .field("base", &self.base)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// Derive the identifier for a unit file at `path` under `base`.
///
/// Returns `None` if the file is outside `base`, has a different extension,
/// or its relative path is not valid UTF-8.
#[must_use]
pub fn identifier_for(base: &Path, path: &Path, extension: &str) -> Option<String> {
    if path.extension().and_then(|e| e.to_str()) != Some(extension) {
        return None;
    }
    let relative = path.strip_prefix(base).ok()?.with_extension("");
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join(&ID_SEPARATOR.to_string()))
}

/// Compute the candidate file path for `id` without touching the filesystem.
///
/// Identifiers that are empty, absolute, or contain `.`/`..` segments do not
/// map to a path: a unit can never live outside its namespace directory.
#[must_use]
pub fn candidate_path(base: &Path, id: &str, extension: &str) -> Option<PathBuf> {
    let mut segments = id.split(ID_SEPARATOR).peekable();
    segments.peek()?;

    let mut path = base.to_path_buf();
    while let Some(segment) = segments.next() {
        if segment.is_empty() || segment == "." || segment == ".." {
            return None;
        }
        let mut parts = Path::new(segment).components();
        if !matches!(
            (parts.next(), parts.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return None;
        }
        if segments.peek().is_some() {
            path.push(segment);
        } else {
            path.push(format!("{segment}.{extension}"));
        }
    }
    Some(path)
}
