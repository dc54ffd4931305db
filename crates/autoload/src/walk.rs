use crate::error::{RegistryError, RegistryErrorExt};
use crate::logging::{LogEvent, Severity};
use crate::registry::Registry;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use walkdir::{DirEntry, WalkDir};

/// Summary of one warm pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    /// Regular files found under the base path.
    pub visited: usize,
    /// Loadable files whose component resolved.
    pub resolved: usize,
    /// Loadable files whose component failed to resolve.
    pub failed: usize,
    /// Files that do not carry the loadable extension.
    pub skipped: usize,
}

type Outcome = Result<WarmReport, RegistryError>;

/// Completion handle of a background warm pass started by
/// [`Registry::warm_all`](crate::Registry::warm_all).
///
/// Await it from async code, or call [`wait`](WarmHandle::wait) from a plain thread.
/// Dropping the handle does not stop the pass.
#[derive(Debug)]
#[must_use = "The handle reports how the warm pass ended"]
pub struct WarmHandle {
    rx: oneshot::Receiver<Outcome>,
}

impl WarmHandle {
    pub(crate) const fn new(rx: oneshot::Receiver<Outcome>) -> Self {
        Self { rx }
    }

    /// Blocks the current thread until the pass has finished.
    ///
    /// # Errors
    ///
    /// Returns the walk failure, or [`RegistryError::Internal`] if the pass ended without
    /// producing a result.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context; await the handle
    /// there instead.
    pub fn wait(self) -> Outcome {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(abandoned()))
    }
}

impl Future for WarmHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or_else(|_| Err(abandoned())))
    }
}

fn abandoned() -> RegistryError {
    RegistryError::Internal { message: "Warm pass ended without a result".into(), context: None }
}

/// Resolves every loadable file under the registry's base path.
///
/// Resolution failures are absorbed into the cache. A walk failure aborts the pass.
pub(crate) fn warm(registry: &Registry) -> Result<WarmReport, RegistryError> {
    let root = Path::new(registry.base_path());
    let extension = registry.extension();
    let mut report = WarmReport::default();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                registry.logger.log(
                    Severity::Error,
                    &LogEvent::new("Components directory walk failed")
                        .path(err.path().unwrap_or(root))
                        .cause(&err),
                );
                return Err(err).context(format!("Failed to walk {}", root.display()));
            },
        };

        if !entry.file_type().is_file() {
            continue;
        }
        report.visited += 1;

        if !is_loadable(&entry, extension) {
            report.skipped += 1;
            continue;
        }

        let Some(name) = component_name(root, entry.path()) else {
            registry.logger.log(
                Severity::Warning,
                &LogEvent::new("Skipping component with a non UTF-8 path").path(entry.path()),
            );
            report.skipped += 1;
            continue;
        };

        match registry.resolve(&name) {
            Ok(_) => report.resolved += 1,
            Err(_) => report.failed += 1,
        }
    }

    registry.logger.log(Severity::Info, &LogEvent::new("Warm pass completed").path(root));

    Ok(report)
}

fn is_loadable(entry: &DirEntry, extension: &str) -> bool {
    entry.path().extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext == extension)
}

/// Path of `path` relative to `root`, components joined with `/`.
fn component_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Option<Vec<&str>> =
        relative.components().map(|part| part.as_os_str().to_str()).collect();

    parts.map(|parts| parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_name_strips_the_base_path() {
        let root = Path::new("/srv/components/");

        assert_eq!(
            component_name(root, Path::new("/srv/components/a.json")).as_deref(),
            Some("a.json")
        );
        assert_eq!(
            component_name(root, Path::new("/srv/components/models/user.json")).as_deref(),
            Some("models/user.json")
        );
        assert_eq!(component_name(root, Path::new("/elsewhere/a.json")), None);
    }

    #[test]
    fn loadable_files_match_the_extension_exactly() {
        let tmp = tempfile::tempdir().unwrap();
        for file in ["a.json", "b.JSON", "c.json.bak", "json"] {
            std::fs::write(tmp.path().join(file), b"{}").unwrap();
        }

        let mut loadable: Vec<String> = WalkDir::new(tmp.path())
            .into_iter()
            .flatten()
            .filter(|entry| entry.file_type().is_file() && is_loadable(entry, "json"))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        loadable.sort();

        assert_eq!(loadable, ["a.json"]);
    }
}
