//! A lazy component registry.
//!
//! Given a components directory, the registry resolves a component name to an instantiated
//! component, caches the outcome so repeated lookups are free, and can warm the whole cache
//! by walking the directory tree.
//!
//! # Core Features
//!
//! - **Validated Root**: The components directory is checked once, at construction, and
//!   normalized to end with exactly one separator.
//! - **Write-Once Cache**: Every name is loaded at most once. Failures are cached too and
//!   are never retried or logged twice.
//! - **Coalesced Loads**: Concurrent first lookups of the same name wait for a single load.
//! - **Warm Pass**: A background walk resolves every file carrying the loadable extension.
//! - **Pluggable Collaborators**: Loading goes through [`ComponentLoader`], diagnostics
//!   through [`RegistryLogger`] (defaults to `tracing`).
//!
//! # Architectural Overview
//!
//! 1.  **[`Registry`]**: The thread-safe handle; `resolve` and the warm pass.
//! 2.  **[`RegistryBuilder`]**: A type-safe builder; root and loader are required.
//! 3.  **[`FactoryTable`]** / **[`FileLoader`]**: Ready-made loading collaborators.
//!
//! # Examples
//!
//! ```rust
//! use autoload::{ComponentSource, FileLoader, Imports, Registry, RegistryError};
//!
//! #[derive(Debug, serde::Deserialize)]
//! struct Model {
//!     table: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), RegistryError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # std::fs::create_dir_all(tmp.path().join("models")).unwrap();
//!     # std::fs::write(tmp.path().join("models/user.json"), br#"{"table":"users"}"#).unwrap();
//!     # let root = tmp.path().to_str().unwrap();
//!     let registry = Registry::builder()
//!         .root(root)
//!         .loader(FileLoader::new(|source: &ComponentSource<'_>, _: &Imports| {
//!             serde_json::from_slice::<Model>(source.bytes)
//!         }))
//!         .build()?;
//!
//!     // Pre-load everything, then lookups are cache hits.
//!     let report = registry.warm_all(|| println!("components ready")).await?;
//!     assert_eq!(report.resolved, 1);
//!
//!     let user = registry.resolve("models/user.json")?;
//!     assert_eq!(user.downcast_ref::<Model>().map(|m| m.table.as_str()), Some("users"));
//!
//!     Ok(())
//! }
//! ```

mod builder;
mod component;
mod config;
mod error;
mod loader;
mod logging;
mod path;
mod registry;
mod walk;

pub use builder::{DEFAULT_EXTENSION, RegistryBuilder};
pub use component::{Component, Imports};
pub use crate::config::{ENV_PREFIX, RegistryConfig, load_config};
pub use error::{BoxError, LoadError, RegistryError, RegistryErrorExt};
pub use loader::{ComponentLoader, ComponentSource, FactoryTable, FileLoader, LoadRequest};
pub use logging::{LogEvent, RegistryLogger, Severity, TracingLogger};
pub use registry::Registry;
pub use walk::{WarmHandle, WarmReport};
