#![allow(dead_code)]

use autoload::{
    BoxError, Component, ComponentLoader, Imports, LoadError, LoadRequest, LogEvent, Registry,
    RegistryLogger, Severity,
};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// One captured log event, owned.
#[derive(Debug, Clone)]
pub struct Record {
    pub severity: Severity,
    pub message: &'static str,
    pub name: Option<String>,
    pub path: Option<String>,
    pub cause: Option<String>,
}

/// Logger that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    records: Mutex<Vec<Record>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.records.lock().iter().filter(|r| r.severity == severity).count()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Record> {
        self.records.lock().iter().filter(|r| r.severity == severity).cloned().collect()
    }
}

impl RegistryLogger for RecordingLogger {
    fn log(&self, severity: Severity, event: &LogEvent<'_>) {
        self.records.lock().push(Record {
            severity,
            message: event.message,
            name: event.name.map(str::to_owned),
            path: event.path.map(|p| p.display().to_string()),
            cause: event.cause.map(ToString::to_string),
        });
    }
}

/// How a [`ScriptedLoader`] answers a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Instantiate a component holding the requested name.
    Load,
    /// Report that nothing exists under that name.
    Missing,
    /// Fail as a factory would.
    Fail,
}

/// Loader that counts invocations and answers according to a rule.
#[derive(Debug)]
pub struct ScriptedLoader {
    calls: AtomicUsize,
    delay: Duration,
    rule: fn(&str) -> Behavior,
}

impl ScriptedLoader {
    pub fn new(rule: fn(&str) -> Behavior) -> Arc<Self> {
        Self::with_delay(rule, Duration::ZERO)
    }

    pub fn with_delay(rule: fn(&str) -> Behavior, delay: Duration) -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0), delay, rule })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ComponentLoader for ScriptedLoader {
    fn load(&self, request: &LoadRequest<'_>, _imports: &Imports) -> Result<Component, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        match (self.rule)(request.name) {
            Behavior::Load => Ok(Component::new(request.name.to_owned())),
            Behavior::Missing => Err(LoadError::NotFound { path: request.path.to_path_buf() }),
            Behavior::Fail => Err(LoadError::factory(BoxError::from("factory blew up"))),
        }
    }
}

/// Loads every name.
pub fn always(_: &str) -> Behavior {
    Behavior::Load
}

/// Loads every name except the ones starting with `missing` or `broken`.
pub fn by_prefix(name: &str) -> Behavior {
    if name.starts_with("missing") {
        Behavior::Missing
    } else if name.starts_with("broken") {
        Behavior::Fail
    } else {
        Behavior::Load
    }
}

/// Creates `files` (relative paths, parents included) under a fresh temporary directory.
pub fn tree(files: &[&str]) -> TempDir {
    let tmp = tempfile::tempdir().expect("temp dir");
    for file in files {
        write(tmp.path(), file, b"{}");
    }
    tmp
}

pub fn write(root: &Path, file: &str, contents: &[u8]) {
    let path = root.join(file);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent");
    }
    std::fs::write(path, contents).expect("write file");
}

pub fn root_str(tmp: &TempDir) -> &str {
    tmp.path().to_str().expect("utf-8 temp path")
}

/// Builds a registry over `tmp` with the given loader and a recording logger.
pub fn registry(
    tmp: &TempDir,
    loader: Arc<ScriptedLoader>,
) -> (Registry, Arc<RecordingLogger>) {
    let logger = RecordingLogger::new();
    let registry = Registry::builder()
        .root(root_str(tmp))
        .logger(logger.clone())
        .shared_loader(loader)
        .build()
        .expect("registry should build");
    (registry, logger)
}
