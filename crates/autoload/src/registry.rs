//! The registry engine: resolution, the write-once cache and the warm pass entry points.
//!
//! [`Registry`] is a cheap handle around shared state. Every clone sees the same cache;
//! every `build()` produces an independent registry.

use crate::builder::RegistryBuilder;
use crate::component::{Component, Imports};
use crate::error::{LoadError, RegistryError, RegistryErrorExt};
use crate::loader::{ComponentLoader, LoadRequest};
use crate::logging::{LogEvent, RegistryLogger, Severity};
use crate::walk::{self, WarmHandle, WarmReport};
use moka::sync::Cache;
use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Outcome stored for a component name.
pub(crate) type Outcome = Result<Component, RegistryError>;

/// The internal shared state of a [`Registry`].
pub struct RegistryInner {
    /// Validated components directory, always ending with one separator.
    pub(crate) base_path: String,
    /// Forwarded to every factory.
    pub(crate) imports: Imports,
    pub(crate) logger: Arc<dyn RegistryLogger>,
    pub(crate) loader: Arc<dyn ComponentLoader>,
    /// Extension of loadable units, without the leading dot.
    pub(crate) extension: Cow<'static, str>,
    /// Write-once name -> outcome map. Concurrent initializations of one key are coalesced.
    pub(crate) cache: Cache<String, Outcome>,
}

impl fmt::Debug for RegistryInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryInner")
            .field("base_path", &self.base_path)
            .field("imports", &self.imports)
            .field("logger", &self.logger)
            .field("loader", &self.loader)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

/// A lazy component registry rooted at a validated directory.
///
/// Components are loaded on first [`resolve`](Registry::resolve) and cached for the
/// lifetime of the registry, failures included: a name that failed once keeps failing
/// without invoking the loader again.
///
/// # Example
///
/// ```rust
/// use autoload::{FactoryTable, Imports, Registry, RegistryError};
///
/// # fn main() -> Result<(), RegistryError> {
/// # let tmp = tempfile::tempdir().unwrap();
/// # let root = tmp.path().to_str().unwrap();
/// let registry = Registry::builder()
///     .root(root)
///     .imports(Imports::new().with("greeting", "hello"))
///     .loader(FactoryTable::new().register("greeter.json", |imports: &Imports| {
///         Ok::<_, std::io::Error>(imports["greeting"].to_string())
///     }))
///     .build()?;
///
/// let first = registry.resolve("greeter.json")?;
/// let second = registry.resolve("greeter.json")?;
/// assert!(first.ptr_eq(&second));
///
/// assert!(registry.resolve("missing.json").is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    pub(crate) inner: Arc<RegistryInner>,
}

impl Deref for Registry {
    type Target = RegistryInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Registry {
    #[must_use = "The registry is not constructed until you call .build()"]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Returns the component registered under `name`, loading it on first use.
    ///
    /// The first call for a name invokes the loader and stores the outcome; every later
    /// call returns the stored outcome. Concurrent first calls for the same name wait for a
    /// single load.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ComponentNotFound`] when the unit does not exist or failed to
    /// load. The cause is only reported to the logging collaborator.
    pub fn resolve(&self, name: &str) -> Result<Component, RegistryError> {
        self.cache.get_with_by_ref(name, || self.fetch(name))
    }

    /// Awaitable form of [`resolve`](Registry::resolve).
    ///
    /// The load runs on the blocking pool so a slow factory never stalls the async executor.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Registry::resolve); [`RegistryError::Internal`] if the blocking
    /// task could not complete.
    pub async fn resolve_async(
        &self,
        name: impl Into<String>,
    ) -> Result<Component, RegistryError> {
        let registry = self.clone();
        let name = name.into();

        tokio::task::spawn_blocking(move || registry.resolve(&name))
            .await
            .context("Component resolution task failed")?
    }

    /// Eagerly resolves every loadable unit under the base path on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Walk`] if the directory cannot be walked. Per-component
    /// failures never fail the pass.
    pub async fn warm(&self) -> Result<WarmReport, RegistryError> {
        let registry = self.clone();

        tokio::task::spawn_blocking(move || registry.warm_blocking())
            .await
            .context("Warm pass task failed")?
    }

    /// Starts a warm pass in the background and calls `on_done` once it has completed.
    ///
    /// Returns immediately. Inside a Tokio runtime the pass runs as a task on that runtime;
    /// without one it runs on a dedicated thread. The returned handle yields the
    /// [`WarmReport`], or the walk failure, and can be awaited or waited on. `on_done` is not
    /// called when the walk fails.
    pub fn warm_all<F>(&self, on_done: F) -> WarmHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let registry = self.clone();
        let (tx, rx) = oneshot::channel();
        let finish = move |report: Result<WarmReport, RegistryError>| {
            if report.is_ok() {
                on_done();
            }
            let _ = tx.send(report);
        };

        if let Ok(runtime) = Handle::try_current() {
            runtime.spawn(async move { finish(registry.warm().await) });
            return WarmHandle::new(rx);
        }

        let logger = Arc::clone(&self.logger);
        let spawned = std::thread::Builder::new()
            .name("autoload-warm".to_owned())
            .spawn(move || finish(registry.warm_blocking()));

        if let Err(err) = spawned {
            logger.log(
                Severity::Error,
                &LogEvent::new("Unable to start the warm pass thread").cause(&err),
            );
        }

        WarmHandle::new(rx)
    }

    /// Synchronous warm pass for hosts without an async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Walk`] if the directory cannot be walked.
    pub fn warm_blocking(&self) -> Result<WarmReport, RegistryError> {
        walk::warm(self)
    }

    /// The validated components directory, ending with one separator.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn imports(&self) -> &Imports {
        &self.imports
    }

    /// Extension of loadable units, without the leading dot.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// `true` once `name` has been resolved, successfully or not.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }

    /// Names with a cached outcome, sorted.
    #[must_use]
    pub fn cached_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.iter().map(|(name, _)| name.to_string()).collect();
        names.sort_unstable();
        names
    }

    /// Loads `name` through the loader. Runs at most once per name.
    fn fetch(&self, name: &str) -> Outcome {
        let path = PathBuf::from(format!("{}{name}", self.base_path));
        let request = LoadRequest { name, path: &path };

        self.logger
            .log(Severity::Debug, &LogEvent::new("Loading component").name(name).path(&path));

        let err = match self.invoke(&request) {
            Ok(component) => return Ok(component),
            Err(err) => err,
        };

        if err.is_not_found() {
            self.logger.log(
                Severity::Warning,
                &LogEvent::new("Component not found").name(name).path(&path),
            );
        } else {
            self.logger.log(
                Severity::Error,
                &LogEvent::new("Unexpected failure while loading component")
                    .name(name)
                    .path(&path)
                    .cause(&err),
            );
        }

        Err(RegistryError::ComponentNotFound {
            message: name.to_owned().into(),
            context: Some(path.display().to_string().into()),
        })
    }

    fn invoke(&self, request: &LoadRequest<'_>) -> Result<Component, LoadError> {
        catch_unwind(AssertUnwindSafe(|| self.loader.load(request, &self.imports)))
            .unwrap_or_else(|payload| {
                Err(LoadError::Panicked { message: panic_message(payload.as_ref()) })
            })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'static, str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Cow::Owned(message.clone())
    } else {
        Cow::Borrowed("non-string panic payload")
    }
}
