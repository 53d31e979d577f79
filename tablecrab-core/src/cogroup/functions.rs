use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::types::BoxedValue;

// ── Initializer ───────────────────────────────────────────────────────────────

/// Creates the empty aggregate for a key seen for the first time.
pub struct Initializer<VA> {
    init_fn: Arc<dyn Fn() -> VA + Send + Sync>,
}

impl<VA> Initializer<VA> {
    pub fn new<F>(init_fn: F) -> Self
    where
        F: Fn() -> VA + Send + Sync + 'static,
    {
        Self {
            init_fn: Arc::new(init_fn),
        }
    }

    pub fn apply(&self) -> VA {
        (self.init_fn)()
    }
}

impl<VA> Clone for Initializer<VA> {
    fn clone(&self) -> Self {
        Self {
            init_fn: Arc::clone(&self.init_fn),
        }
    }
}

impl<VA> std::fmt::Debug for Initializer<VA> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Initializer(<fn>)")
    }
}

// ── Aggregator ────────────────────────────────────────────────────────────────

type ErasedAggregateFn<K, VA> = dyn Fn(&K, &BoxedValue, VA) -> Result<VA> + Send + Sync;

/// Folds one input value into the running aggregate of its key.
///
/// Every cogrouped input carries its own value type `V`; the aggregator
/// erases it so that the aggregators of all inputs share one type.
pub struct Aggregator<K, VA> {
    aggregate_fn: Arc<ErasedAggregateFn<K, VA>>,
    value_type: &'static str,
}

impl<K: 'static, VA: 'static> Aggregator<K, VA> {
    pub fn new<V, F>(aggregate_fn: F) -> Self
    where
        V: 'static,
        F: Fn(&K, &V, VA) -> VA + Send + Sync + 'static,
    {
        let value_type = std::any::type_name::<V>();
        Self {
            aggregate_fn: Arc::new(move |key: &K, value: &BoxedValue, aggregate: VA| {
                let value = value.downcast_ref::<V>().ok_or_else(|| {
                    anyhow!(
                        "aggregator over {} received a {}",
                        value_type,
                        value.type_name()
                    )
                })?;
                Ok(aggregate_fn(key, value, aggregate))
            }),
            value_type,
        }
    }
}

impl<K, VA> Aggregator<K, VA> {
    pub fn apply(&self, key: &K, value: &BoxedValue, aggregate: VA) -> Result<VA> {
        (self.aggregate_fn)(key, value, aggregate)
    }

    /// Name of the input value type this aggregator accepts.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }
}

impl<K, VA> Clone for Aggregator<K, VA> {
    fn clone(&self) -> Self {
        Self {
            aggregate_fn: Arc::clone(&self.aggregate_fn),
            value_type: self.value_type,
        }
    }
}

impl<K, VA> std::fmt::Debug for Aggregator<K, VA> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Aggregator(<{}>)", self.value_type)
    }
}

// ── Merger ────────────────────────────────────────────────────────────────────

/// Combines the aggregates of two sessions that grew into each other.
pub struct Merger<K, VA> {
    merge_fn: Arc<dyn Fn(&K, VA, VA) -> VA + Send + Sync>,
}

impl<K, VA> Merger<K, VA> {
    pub fn new<F>(merge_fn: F) -> Self
    where
        F: Fn(&K, VA, VA) -> VA + Send + Sync + 'static,
    {
        Self {
            merge_fn: Arc::new(merge_fn),
        }
    }

    pub fn apply(&self, key: &K, left: VA, right: VA) -> VA {
        (self.merge_fn)(key, left, right)
    }
}

impl<K, VA> Clone for Merger<K, VA> {
    fn clone(&self) -> Self {
        Self {
            merge_fn: Arc::clone(&self.merge_fn),
        }
    }
}

impl<K, VA> std::fmt::Debug for Merger<K, VA> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Merger(<fn>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregator_applies_typed_fn() {
        let agg = Aggregator::new(|_key: &String, clicks: &u32, total: u64| total + *clicks as u64);
        let total = agg
            .apply(&"user-1".to_string(), &BoxedValue::new(3u32), 4)
            .unwrap();
        assert_eq!(total, 7);
        assert_eq!(agg.value_type(), "u32");
    }

    #[test]
    fn test_aggregator_rejects_other_value_type() {
        let agg = Aggregator::new(|_key: &String, clicks: &u32, total: u64| total + *clicks as u64);
        let err = agg
            .apply(&"user-1".to_string(), &BoxedValue::new("oops".to_string()), 0)
            .unwrap_err();
        assert!(err.to_string().contains("aggregator over u32"));
    }

    #[test]
    fn test_initializer_and_merger() {
        let init = Initializer::new(|| 10u64);
        let merger = Merger::new(|_key: &String, a: u64, b: u64| a + b);
        let merged = merger.apply(&"k".to_string(), init.apply(), init.clone().apply());
        assert_eq!(merged, 20);
    }
}
