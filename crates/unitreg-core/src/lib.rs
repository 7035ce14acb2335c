//! Namespaced unit registry with lazy, on-demand loading by identifier.
//!
//! A host defines one [`Namespace`] per logical group of plugins (e.g.
//! `"exploits"`, `"payloads"`) and binds it to a directory of unit files.
//! Each unit file announces the identifiers it provides; the namespace
//! loads a file the first time one of its identifiers is requested and
//! keeps the result resident afterwards.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use unitreg_core::{ManifestLoader, Namespace, MANIFEST_EXTENSION};
//!
//! # fn main() -> Result<(), unitreg_core::RegistryError> {
//! let exploits = Arc::new(Namespace::new(
//!     "exploits",
//!     MANIFEST_EXTENSION,
//!     ManifestLoader::descriptors(),
//! ));
//! exploits.configure("modules/exploits");
//!
//! for id in exploits.list_identifiers()? {
//!     println!("available: {id}");
//! }
//!
//! let psexec = exploits.load("windows/smb/psexec")?;
//! println!("{} ({})", psexec.id, psexec.kind);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod discovery;
pub mod error;
mod flight;
pub mod loader;
pub mod manifest;
pub mod namespace;

pub use discovery::Identifiers;
pub use error::{BoxError, NotFoundCause, RegistryError, RegistryResult};
pub use loader::{FnLoader, LoadError, Unit, UnitLoader};
pub use manifest::{MANIFEST_EXTENSION, ManifestLoader, UnitDescriptor, UnitManifest};
pub use namespace::Namespace;
