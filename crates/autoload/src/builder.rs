use crate::component::Imports;
use crate::config::RegistryConfig;
use crate::error::RegistryError;
use crate::loader::ComponentLoader;
use crate::logging::{RegistryLogger, TracingLogger};
use crate::path;
use crate::registry::{Registry, RegistryInner};
use moka::sync::Cache;
use private::Sealed;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Extension of loadable units when none is configured.
pub const DEFAULT_EXTENSION: &str = "json";

struct RegistryOptions {
    imports: Imports,
    logger: Arc<dyn RegistryLogger>,
    extension: Cow<'static, str>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            imports: Imports::default(),
            logger: Arc::new(TracingLogger),
            extension: Cow::Borrowed(DEFAULT_EXTENSION),
        }
    }
}

impl fmt::Debug for RegistryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryOptions")
            .field("imports", &self.imports)
            .field("logger", &self.logger)
            .field("extension", &self.extension)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(String);
#[derive(Debug, Default)]
pub struct NoLoader;
#[derive(Debug)]
pub struct WithLoader(Arc<dyn ComponentLoader>);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}
impl Sealed for NoLoader {}
impl Sealed for WithLoader {}

/// Type-safe builder for a [`Registry`].
///
/// Both the components directory and the loader are required; `build` only exists once
/// both have been supplied.
#[derive(Debug, Default)]
pub struct RegistryBuilder<R: Sealed = NoRoot, L: Sealed = NoLoader> {
    root: R,
    loader: L,
    options: RegistryOptions,
}

impl<R: Sealed, L: Sealed> RegistryBuilder<R, L> {
    /// Sets the configuration object forwarded to every component factory.
    #[must_use = "Sets the imports passed to every component factory"]
    pub fn imports(mut self, imports: Imports) -> Self {
        self.options.imports = imports;
        self
    }

    /// Replaces the default [`TracingLogger`].
    #[must_use = "Sets the logging collaborator of the registry"]
    pub fn logger(mut self, logger: Arc<dyn RegistryLogger>) -> Self {
        self.options.logger = logger;
        self
    }

    /// Sets the file extension of loadable units used by the warm pass.
    ///
    /// A leading dot is ignored, so `".json"` and `"json"` are equivalent.
    #[must_use = "Sets the extension filter of the warm pass"]
    pub fn extension(mut self, extension: impl Into<Cow<'static, str>>) -> Self {
        let extension = extension.into();
        self.options.extension = match extension.strip_prefix('.') {
            Some(stripped) => Cow::Owned(stripped.to_owned()),
            None => extension,
        };
        self
    }
}

impl RegistryBuilder<NoRoot, NoLoader> {
    #[must_use = "Creates a new registry builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }
}

impl<L: Sealed> RegistryBuilder<NoRoot, L> {
    /// Sets the components directory.
    #[must_use = "Sets the components directory of the registry"]
    pub fn root(self, path: impl Into<String>) -> RegistryBuilder<WithRoot, L> {
        RegistryBuilder { root: WithRoot(path.into()), loader: self.loader, options: self.options }
    }

    /// Applies a deserialized [`RegistryConfig`]: root, imports and extension.
    #[must_use = "Applies the configuration to the registry builder"]
    pub fn config(self, config: RegistryConfig) -> RegistryBuilder<WithRoot, L> {
        let RegistryConfig { components_path, imports, extension } = config;
        self.root(components_path).imports(imports).extension(extension)
    }
}

impl<R: Sealed> RegistryBuilder<R, NoLoader> {
    /// Sets the loading collaborator.
    #[must_use = "Sets the loader of the registry"]
    pub fn loader(self, loader: impl ComponentLoader + 'static) -> RegistryBuilder<R, WithLoader> {
        self.shared_loader(Arc::new(loader))
    }

    /// Sets a loading collaborator that is shared with other owners.
    #[must_use = "Sets the loader of the registry"]
    pub fn shared_loader(self, loader: Arc<dyn ComponentLoader>) -> RegistryBuilder<R, WithLoader> {
        RegistryBuilder { root: self.root, loader: WithLoader(loader), options: self.options }
    }
}

impl RegistryBuilder<WithRoot, WithLoader> {
    /// Validates the components directory and produces the registry.
    ///
    /// The directory must exist and be a directory. On success the base path is normalized
    /// to end with exactly one separator; it never changes afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::ComponentPathNotFound`] if the path is missing, is not a
    /// directory or cannot be inspected. The failure is logged at fatal severity first.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let RegistryOptions { imports, logger, extension } = self.options;
        let base_path = path::validate_base_path(&self.root.0, logger.as_ref())?;

        Ok(Registry {
            inner: Arc::new(RegistryInner {
                base_path,
                imports,
                logger,
                loader: self.loader.0,
                extension,
                cache: Cache::builder().name("autoload-components").build(),
            }),
        })
    }
}
