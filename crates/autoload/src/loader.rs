//! Loading collaborators.
//!
//! A loader turns a `(name, path)` pair plus the shared [`Imports`] into a [`Component`].
//! It must keep "nothing to load here" ([`LoadError::NotFound`]) apart from every other
//! failure; the registry logs the two differently.

use crate::component::{Component, Imports};
use crate::error::{BoxError, LoadError};
use fxhash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// What the registry asks a loader for.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    /// Component name exactly as the caller supplied it.
    pub name: &'a str,
    /// Base path concatenated with the name.
    pub path: &'a Path,
}

/// Turns a component name into an instantiated component.
///
/// A panic inside `load` is caught by the registry and cached as a failed resolution, with
/// the panic message reported to the [`RegistryLogger`](crate::RegistryLogger). Catching
/// does not bypass the process panic hook: the default hook still prints the panic to
/// stderr. Hosts that want every diagnostic routed through the logger should install their
/// own hook with [`std::panic::set_hook`], or return an error instead of panicking.
pub trait ComponentLoader: fmt::Debug + Send + Sync {
    /// Loads and instantiates the unit described by `request`.
    ///
    /// # Errors
    /// Returns [`LoadError::NotFound`] when no loadable unit exists for the request, and any
    /// other variant when the unit exists but could not be instantiated.
    fn load(&self, request: &LoadRequest<'_>, imports: &Imports) -> Result<Component, LoadError>;
}

type Factory = Box<dyn Fn(&Imports) -> Result<Component, BoxError> + Send + Sync>;

/// An explicit table of factory functions keyed by component name.
///
/// Names that were never registered load as [`LoadError::NotFound`].
///
/// ```rust
/// use autoload::{FactoryTable, Imports};
///
/// let table = FactoryTable::new()
///     .register("greeter.json", |imports: &Imports| {
///         Ok::<_, std::io::Error>(format!("hello from {}", imports.len()))
///     });
/// assert!(table.contains("greeter.json"));
/// ```
#[derive(Default)]
pub struct FactoryTable {
    factories: FxHashMap<String, Factory>,
}

impl FactoryTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under `name`, replacing any earlier registration.
    #[must_use]
    pub fn register<T, E, F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&Imports) -> Result<T, E> + Send + Sync + 'static,
    {
        self.factories.insert(
            name.into(),
            Box::new(move |imports| factory(imports).map(Component::new).map_err(Into::into)),
        );
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for FactoryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FactoryTable").field("names", &names).finish()
    }
}

impl ComponentLoader for FactoryTable {
    fn load(&self, request: &LoadRequest<'_>, imports: &Imports) -> Result<Component, LoadError> {
        let factory = self
            .factories
            .get(request.name)
            .ok_or_else(|| LoadError::NotFound { path: request.path.to_path_buf() })?;

        factory(imports).map_err(LoadError::factory)
    }
}

/// The raw unit handed to a [`FileLoader`] factory.
#[derive(Debug, Clone, Copy)]
pub struct ComponentSource<'a> {
    pub name: &'a str,
    pub path: &'a Path,
    pub bytes: &'a [u8],
}

type SourceFactory =
    Box<dyn Fn(&ComponentSource<'_>, &Imports) -> Result<Component, BoxError> + Send + Sync>;

/// Reads the unit from disk and instantiates it with a single factory.
///
/// A missing file is [`LoadError::NotFound`]; any other I/O failure is [`LoadError::Io`].
pub struct FileLoader {
    factory: SourceFactory,
}

impl FileLoader {
    pub fn new<T, E, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(&ComponentSource<'_>, &Imports) -> Result<T, E> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(move |source, imports| {
                factory(source, imports).map(Component::new).map_err(Into::into)
            }),
        }
    }
}

impl fmt::Debug for FileLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileLoader").finish_non_exhaustive()
    }
}

impl ComponentLoader for FileLoader {
    fn load(&self, request: &LoadRequest<'_>, imports: &Imports) -> Result<Component, LoadError> {
        let bytes = match std::fs::read(request.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LoadError::NotFound { path: request.path.to_path_buf() });
            },
            Err(source) => {
                return Err(LoadError::Io { path: request.path.to_path_buf(), source });
            },
        };

        let source = ComponentSource { name: request.name, path: request.path, bytes: &bytes };
        (self.factory)(&source, imports).map_err(LoadError::factory)
    }
}
