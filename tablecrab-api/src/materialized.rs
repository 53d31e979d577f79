use tablecrab_core::cogroup::TableCodecs;
use tablecrab_core::error::TopologyError;
use tablecrab_core::graph::{TopologyBuilder, validate_name};
use tablecrab_core::store::StoreDescriptor;
use tablecrab_core::types::Millis;

/// Store name prefix of cogroup aggregates without a user-chosen store.
const AGGREGATE_STORE_PREFIX: &str = "COGROUPKSTREAM-AGGREGATE-";

/// Options for grouping a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grouped {
    pub(crate) name: Option<String>,
    pub(crate) key_codec: Option<String>,
    pub(crate) value_codec: Option<String>,
}

impl Grouped {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the repartition topic created when the grouped stream was re-keyed.
    pub fn as_name(name: impl Into<String>) -> Result<Self, TopologyError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name: Some(name),
            ..Self::default()
        })
    }

    pub fn with_key_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.key_codec = Some(codec_id.into());
        self
    }

    pub fn with_value_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.value_codec = Some(codec_id.into());
        self
    }
}

/// How the result table of an aggregation is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Materialized {
    store_name: Option<String>,
    key_codec: Option<String>,
    value_codec: Option<String>,
    versioned: bool,
    logging_disabled: bool,
    caching_disabled: bool,
    retention_ms: Option<Millis>,
}

impl Materialized {
    /// A store whose name is generated.
    pub fn new() -> Self {
        Self::default()
    }

    /// A queryable store called `store_name`.
    pub fn as_store(store_name: impl Into<String>) -> Result<Self, TopologyError> {
        let store_name = store_name.into();
        validate_name(&store_name)?;
        Ok(Self {
            store_name: Some(store_name),
            ..Self::default()
        })
    }

    pub fn with_key_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.key_codec = Some(codec_id.into());
        self
    }

    pub fn with_value_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.value_codec = Some(codec_id.into());
        self
    }

    /// Keep value history per key. Only rolling aggregations are versioned.
    pub fn with_versioning(mut self) -> Self {
        self.versioned = true;
        self
    }

    pub fn with_logging_disabled(mut self) -> Self {
        self.logging_disabled = true;
        self
    }

    pub fn with_caching_disabled(mut self) -> Self {
        self.caching_disabled = true;
        self
    }

    pub fn with_retention_ms(mut self, retention_ms: Millis) -> Self {
        self.retention_ms = Some(retention_ms);
        self
    }

    pub(crate) fn is_versioned(&self) -> bool {
        self.versioned
    }

    pub(crate) fn codecs(&self) -> TableCodecs {
        TableCodecs {
            key_codec: self.key_codec.clone(),
            value_codec: self.value_codec.clone(),
        }
    }

    pub(crate) fn store<B>(&self, builder: &mut B) -> Result<StoreDescriptor, TopologyError>
    where
        B: TopologyBuilder + ?Sized,
    {
        let mut store = match &self.store_name {
            Some(name) => StoreDescriptor::named(name.as_str())?,
            None => StoreDescriptor::generated(builder, AGGREGATE_STORE_PREFIX),
        };
        store = store.with_versioning(self.versioned);
        if self.logging_disabled {
            store = store.with_logging_disabled();
        }
        if self.caching_disabled {
            store = store.with_caching_disabled();
        }
        if let Some(retention_ms) = self.retention_ms {
            store = store.with_retention_ms(retention_ms);
        }
        Ok(store)
    }
}
