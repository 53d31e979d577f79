/// Version written by this crate.
pub const CURRENT_VERSION: i8 = 0;

/// Reply from the foreign-key side of a join to the subscribing primary side.
///
/// `original_value_hash` is the hash of the primary-side value that triggered
/// the subscription; the primary side drops replies whose hash no longer
/// matches its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionResponseWrapper<V> {
    original_value_hash: Option<[u64; 2]>,
    foreign_value: Option<V>,
    version: i8,
    primary_partition: Option<u32>,
}

impl<V> SubscriptionResponseWrapper<V> {
    /// A response at [`CURRENT_VERSION`].
    pub fn new(original_value_hash: Option<[u64; 2]>, foreign_value: Option<V>) -> Self {
        Self::with_version(original_value_hash, foreign_value, CURRENT_VERSION)
    }

    /// A response at an explicit version. Validity is checked on encode.
    pub fn with_version(
        original_value_hash: Option<[u64; 2]>,
        foreign_value: Option<V>,
        version: i8,
    ) -> Self {
        Self {
            original_value_hash,
            foreign_value,
            version,
            primary_partition: None,
        }
    }

    /// Partition of the primary record. Used for routing only; not encoded.
    pub fn with_primary_partition(mut self, partition: u32) -> Self {
        self.primary_partition = Some(partition);
        self
    }

    pub fn original_value_hash(&self) -> Option<[u64; 2]> {
        self.original_value_hash
    }

    pub fn foreign_value(&self) -> Option<&V> {
        self.foreign_value.as_ref()
    }

    pub fn into_foreign_value(self) -> Option<V> {
        self.foreign_value
    }

    pub fn version(&self) -> i8 {
        self.version
    }

    pub fn primary_partition(&self) -> Option<u32> {
        self.primary_partition
    }
}
