//! # State Store Descriptors
//!
//! The durable store behind each aggregation lives outside this crate; the
//! topology only carries a description of it.

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::graph::{TopologyBuilder, validate_name};
use crate::types::Millis;
use crate::window::WindowSpec;

/// Describes the store shared by every aggregation of one cogroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDescriptor {
    name: String,
    queryable: bool,
    versioned: bool,
    logging_enabled: bool,
    caching_enabled: bool,
    retention_ms: Option<Millis>,
}

impl StoreDescriptor {
    /// A store with a user-chosen name; it can be queried by that name.
    pub fn named(name: impl Into<String>) -> Result<Self, TopologyError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self::with_name(name, true))
    }

    /// A store whose name is generated by the builder; it is not queryable.
    pub fn generated<B>(builder: &mut B, prefix: &str) -> Self
    where
        B: TopologyBuilder + ?Sized,
    {
        Self::with_name(builder.new_store_name(prefix), false)
    }

    fn with_name(name: String, queryable: bool) -> Self {
        Self {
            name,
            queryable,
            versioned: false,
            logging_enabled: true,
            caching_enabled: true,
            retention_ms: None,
        }
    }

    /// Keep a history of values per key instead of only the latest one.
    pub fn with_versioning(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    pub fn with_logging_disabled(mut self) -> Self {
        self.logging_enabled = false;
        self
    }

    pub fn with_caching_disabled(mut self) -> Self {
        self.caching_enabled = false;
        self
    }

    /// Retain windows for `retention_ms`. Only meaningful for windowed stores.
    pub fn with_retention_ms(mut self, retention_ms: Millis) -> Self {
        self.retention_ms = Some(retention_ms);
        self
    }

    pub fn store_name(&self) -> &str {
        &self.name
    }

    /// The name under which the store can be queried, when the user chose it.
    pub fn queryable_name(&self) -> Option<&str> {
        self.queryable.then_some(self.name.as_str())
    }

    pub fn is_versioned(&self) -> bool {
        self.versioned
    }

    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled
    }

    pub fn caching_enabled(&self) -> bool {
        self.caching_enabled
    }

    /// Retention of the window store backing `window`.
    ///
    /// Defaults to the minimum the window needs; an explicit retention must
    /// not be shorter than that minimum.
    pub fn effective_retention_ms(&self, window: &WindowSpec) -> Result<Option<Millis>, TopologyError> {
        let Some(required_ms) = window.required_retention_ms() else {
            return Ok(None);
        };
        match self.retention_ms {
            None => Ok(Some(required_ms)),
            Some(retention_ms) if retention_ms >= required_ms => Ok(Some(retention_ms)),
            Some(retention_ms) => Err(TopologyError::InvalidRetention {
                store: self.name.clone(),
                retention_ms,
                required_ms,
            }),
        }
    }
}
