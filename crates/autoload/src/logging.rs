//! Logging collaborator used by the registry.
//!
//! The registry never writes to a sink directly; it reports through a [`RegistryLogger`]
//! supplied at construction. [`TracingLogger`] is the default and forwards every event to
//! the `tracing` macros with structured fields, so a host only needs to install a
//! subscriber.

use std::error::Error;
use std::fmt;
use std::path::Path;

/// Severity of a registry log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    /// Unrecoverable condition; reported right before the failing call returns.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Fatal => write!(f, "FATAL"),
        }
    }
}

/// A single structured log event.
#[derive(Debug, Clone, Copy)]
pub struct LogEvent<'a> {
    /// Static message template.
    pub message: &'static str,
    /// Component name, when the event concerns one.
    pub name: Option<&'a str>,
    /// Filesystem path involved in the event.
    pub path: Option<&'a Path>,
    /// Original failure attached as context.
    pub cause: Option<&'a (dyn Error + 'static)>,
}

impl<'a> LogEvent<'a> {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message, name: None, path: None, cause: None }
    }

    #[must_use]
    pub const fn name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    #[must_use]
    pub const fn path(mut self, path: &'a Path) -> Self {
        self.path = Some(path);
        self
    }

    #[must_use]
    pub const fn cause(mut self, cause: &'a (dyn Error + 'static)) -> Self {
        self.cause = Some(cause);
        self
    }
}

/// Sink for registry diagnostics.
pub trait RegistryLogger: fmt::Debug + Send + Sync {
    fn log(&self, severity: Severity, event: &LogEvent<'_>);
}

/// Default [`RegistryLogger`] that forwards to `tracing`.
///
/// `tracing` has no fatal level, so fatal events are emitted at `ERROR` with `fatal = true`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RegistryLogger for TracingLogger {
    fn log(&self, severity: Severity, event: &LogEvent<'_>) {
        let name = event.name;
        let path = event.path.map(|p| p.display().to_string());
        let path = path.as_deref();
        let cause = event.cause.map(ToString::to_string);
        let cause = cause.as_deref();
        let message = event.message;

        match severity {
            Severity::Debug => tracing::debug!(name, path, cause, "{message}"),
            Severity::Info => tracing::info!(name, path, cause, "{message}"),
            Severity::Warning => tracing::warn!(name, path, cause, "{message}"),
            Severity::Error => tracing::error!(name, path, cause, "{message}"),
            Severity::Fatal => tracing::error!(fatal = true, name, path, cause, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().map_err(|_| io::Error::other("poisoned"))?.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let sink = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = sink.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[test]
    fn tracing_logger_emits_structured_fields() {
        let path = Path::new("/srv/components/a.json");
        let output = capture(|| {
            TracingLogger.log(
                Severity::Warning,
                &LogEvent::new("Component not found").name("a.json").path(path),
            );
        });

        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("Component not found"), "{output}");
        assert!(output.contains("a.json"), "{output}");
        assert!(output.contains("/srv/components/a.json"), "{output}");
    }

    #[test]
    fn tracing_logger_marks_fatal_events() {
        let output = capture(|| {
            TracingLogger.log(Severity::Fatal, &LogEvent::new("Unable to open components"));
        });

        assert!(output.contains("ERROR"), "{output}");
        assert!(output.contains("fatal=true"), "{output}");
    }

    #[test]
    fn tracing_logger_attaches_the_cause() {
        let cause = io::Error::other("disk on fire");
        let output = capture(|| {
            TracingLogger.log(Severity::Error, &LogEvent::new("Load failed").cause(&cause));
        });

        assert!(output.contains("disk on fire"), "{output}");
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Debug < Severity::Warning);
        assert!(Severity::Error < Severity::Fatal);
        assert_eq!(Severity::Warning.to_string(), "WARN");
    }
}
