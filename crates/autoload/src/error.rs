use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

/// Boxed error produced by component factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Caller-facing errors of the registry.
///
/// The type is cheap to clone because failed resolutions are stored in the cache
/// and handed back verbatim on every later lookup.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    /// The components directory is missing, is not a directory, or cannot be inspected.
    #[error("Component path not found{}: {message}", format_context(.context))]
    ComponentPathNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The component could not be loaded. Details only go to the log.
    #[error("Component not found{}: {message}", format_context(.context))]
    ComponentNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The warm pass could not walk the components directory.
    #[error("Directory walk failure{}: {source}", format_context(.context))]
    Walk { source: Arc<walkdir::Error>, context: Option<Cow<'static, str>> },

    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: Arc<config::ConfigError>, context: Option<Cow<'static, str>> },

    #[error("Internal registry error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Loader-level failure taxonomy.
///
/// The registry collapses every variant into [`RegistryError::ComponentNotFound`] and only
/// reports the distinction to the logging collaborator.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Nothing loadable exists for the requested name.
    #[error("No loadable unit at {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: std::io::Error },

    /// The factory ran and reported a failure.
    #[error("Component factory failed: {source}")]
    Factory { source: BoxError },

    /// The factory panicked.
    #[error("Component factory panicked: {message}")]
    Panicked { message: Cow<'static, str> },
}

impl LoadError {
    /// Wraps any factory failure.
    pub fn factory(source: impl Into<BoxError>) -> Self {
        Self::Factory { source: source.into() }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Adds `.context(..)` to results that can be converted into [`RegistryError`].
pub trait RegistryErrorExt<T> {
    /// Attaches a human readable context to the error.
    ///
    /// # Errors
    /// Returns the converted error with `context` attached.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, RegistryError>;
}

impl<T> RegistryErrorExt<T> for Result<T, RegistryError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                RegistryError::ComponentPathNotFound { context: c, .. }
                | RegistryError::ComponentNotFound { context: c, .. }
                | RegistryError::Walk { context: c, .. }
                | RegistryError::Config { context: c, .. }
                | RegistryError::Internal { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> RegistryErrorExt<T> for Result<T, walkdir::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, RegistryError> {
        self.map_err(|source| RegistryError::Walk {
            source: Arc::new(source),
            context: Some(context.into()),
        })
    }
}

impl<T> RegistryErrorExt<T> for Result<T, config::ConfigError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, RegistryError> {
        self.map_err(|source| RegistryError::Config {
            source: Arc::new(source),
            context: Some(context.into()),
        })
    }
}

impl<T> RegistryErrorExt<T> for Result<T, tokio::task::JoinError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, RegistryError> {
        self.map_err(|source| RegistryError::Internal {
            message: source.to_string().into(),
            context: Some(context.into()),
        })
    }
}

impl From<walkdir::Error> for RegistryError {
    #[inline]
    fn from(source: walkdir::Error) -> Self {
        Self::Walk { source: Arc::new(source), context: None }
    }
}

impl From<config::ConfigError> for RegistryError {
    #[inline]
    fn from(source: config::ConfigError) -> Self {
        Self::Config { source: Arc::new(source), context: None }
    }
}

#[allow(clippy::ref_option)]
fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
