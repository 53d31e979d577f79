//! # Codecs
//!
//! Converts keys and values to and from the bytes carried by topics.

use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serializer and deserializer for one data type.
///
/// `topic` names the topic the bytes are written to or read from.
pub trait Codec<T>: Send + Sync {
    fn serialize(&self, topic: &str, value: &T) -> Result<Vec<u8>>;

    fn deserialize(&self, topic: &str, bytes: &[u8]) -> Result<T>;
}

/// Passes raw bytes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn serialize(&self, _topic: &str, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn deserialize(&self, _topic: &str, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec<String> for StringCodec {
    fn serialize(&self, _topic: &str, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn deserialize(&self, topic: &str, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .with_context(|| format!("record on `{topic}` is not valid UTF-8"))
    }
}

/// Any serde type, encoded with bincode.
pub struct BincodeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for BincodeCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BincodeCodec<{}>", std::any::type_name::<T>())
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> for BincodeCodec<T> {
    fn serialize(&self, _topic: &str, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize(&self, topic: &str, bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes).with_context(|| {
            format!(
                "failed to decode {} from `{topic}`",
                std::any::type_name::<T>()
            )
        })
    }
}

/// Resolves the codecs an operator falls back to when none was given.
pub trait CodecRegistry<V> {
    /// The default value codec, if one is configured.
    fn value_codec(&self) -> Option<Arc<dyn Codec<V>>>;
}

/// Codecs resolved for one operator instance.
pub struct OperatorCodecs<V> {
    value_codec: Option<Arc<dyn Codec<V>>>,
}

impl<V> OperatorCodecs<V> {
    pub fn new() -> Self {
        Self { value_codec: None }
    }

    pub fn with_value_codec(mut self, codec: Arc<dyn Codec<V>>) -> Self {
        self.value_codec = Some(codec);
        self
    }
}

impl<V> Default for OperatorCodecs<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CodecRegistry<V> for OperatorCodecs<V> {
    fn value_codec(&self) -> Option<Arc<dyn Codec<V>>> {
        self.value_codec.clone()
    }
}
