//! Opaque component values and the shared `imports` object handed to every factory.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::any::{Any, TypeId};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A loaded, instantiated component.
///
/// The registry treats components as opaque: it never looks inside, it only stores and
/// hands back the handle. Cloning is an `Arc` clone, so every resolution of the same name
/// yields the very same instance.
#[derive(Clone)]
pub struct Component {
    id: TypeId,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

impl Component {
    /// Wraps a concrete value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps a value that is already shared.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self { id: TypeId::of::<T>(), type_name: std::any::type_name::<T>(), value }
    }

    /// Borrows the component as `T`, if that is what the factory produced.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns a shared handle to the component as `T`.
    #[must_use]
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Name of the concrete type the factory produced.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `true` when both handles point at the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component").field("type", &self.type_name).finish_non_exhaustive()
    }
}

/// Configuration object forwarded unchanged to every component factory.
///
/// Thin Arc-wrapped JSON object for inexpensive cloning into factories and tasks.
#[derive(Default, Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Imports {
    inner: Arc<Map<String, Value>>,
}

impl Imports {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.inner).insert(key.into(), value.into());
        self
    }

    /// `true` when both handles share the same underlying object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for Imports {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<Map<String, Value>> for Imports {
    fn from(map: Map<String, Value>) -> Self {
        Self { inner: Arc::new(map) }
    }
}
