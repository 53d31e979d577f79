use serde::{Deserialize, Serialize};

/// Unique identifier for graph nodes.
pub type NodeId = u32;

/// Build-local handle identifying one grouped input stream.
///
/// Two cogroup entries that carry the same `StreamId` refer to the same
/// stream, no matter how many times the handle was cloned.
pub type StreamId = u32;

/// A duration or timestamp in milliseconds.
pub type Millis = i64;

/// Trait bound for aggregate values kept in a table.
pub trait StreamData: Send + Sync + Clone + Serialize + for<'de> Deserialize<'de> + 'static {}

// Blanket implementation: any type satisfying the bounds is StreamData.
impl<T> StreamData for T where
    T: Send + Sync + Clone + Serialize + for<'de> Deserialize<'de> + 'static
{
}

// --- Type-erased cloneable value ---

/// Trait object that supports Any + Clone.
pub trait CloneableAny: std::any::Any + Send + Sync {
    fn clone_box(&self) -> Box<dyn CloneableAny>;
    fn as_any(&self) -> &dyn std::any::Any;
}

impl<T: Clone + Send + Sync + 'static> CloneableAny for T {
    fn clone_box(&self) -> Box<dyn CloneableAny> {
        Box::new(self.clone())
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// A cloneable, type-erased input value.
///
/// Cogrouped inputs each carry their own value type, so the per-input
/// aggregators receive their values through this box and recover the
/// concrete type on entry.
pub struct BoxedValue {
    inner: Box<dyn CloneableAny>,
    type_name: &'static str,
}

impl BoxedValue {
    /// Wrap a concrete value into a type-erased box.
    pub fn new<T: Clone + Send + Sync + 'static>(val: T) -> Self {
        Self {
            inner: Box::new(val),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Try to get a reference to the inner value as type `T`. Returns `None` on mismatch.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.as_any().downcast_ref()
    }

    /// Name of the wrapped type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Clone for BoxedValue {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone_box(),
            type_name: self.type_name,
        }
    }
}

impl std::fmt::Debug for BoxedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoxedValue(<{}>)", self.type_name)
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
