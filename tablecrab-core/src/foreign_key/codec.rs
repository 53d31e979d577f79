//! # Subscription Response Codec
//!
//! Wire layout, all integers big-endian:
//!
//! ```text
//! byte 0      bit 7 = hash absent, bits 6..0 = version
//! bytes 1..17 original value hash as two u64 words (only when present)
//! rest        foreign value bytes (empty when there is no value)
//! ```
//!
//! The primary partition is not part of the layout and decodes as `None`.

use std::sync::Arc;

use crate::codec::{Codec, CodecRegistry};
use crate::error::CodecError;
use crate::foreign_key::SubscriptionResponseWrapper;

const HASH_NULL_FLAG: u8 = 0x80;
const VERSION_MASK: u8 = 0x7f;
const HASH_LEN: usize = 16;

/// Pack the version and the hash-absent flag into the header byte.
pub fn pack_header(version: i8, hash_is_null: bool) -> Result<u8, CodecError> {
    if version < 0 {
        return Err(CodecError::InvalidVersion(version));
    }
    let flag = if hash_is_null { HASH_NULL_FLAG } else { 0 };
    Ok(version as u8 | flag)
}

/// Split a header byte into `(version, hash_is_null)`.
pub fn unpack_header(header: u8) -> (i8, bool) {
    ((header & VERSION_MASK) as i8, header & HASH_NULL_FLAG != 0)
}

/// The codec for foreign values, bound at most once.
#[derive(Clone)]
pub enum CodecBinding<V> {
    Unbound,
    Bound(Arc<dyn Codec<V>>),
}

impl<V> CodecBinding<V> {
    pub fn is_bound(&self) -> bool {
        matches!(self, CodecBinding::Bound(_))
    }
}

impl<V> std::fmt::Debug for CodecBinding<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecBinding::Unbound => f.write_str("Unbound"),
            CodecBinding::Bound(_) => f.write_str("Bound(<codec>)"),
        }
    }
}

/// Encodes and decodes [`SubscriptionResponseWrapper`]s.
#[derive(Debug, Clone)]
pub struct SubscriptionResponseCodec<V> {
    value_codec: CodecBinding<V>,
}

impl<V> SubscriptionResponseCodec<V> {
    /// A codec using `value_codec`, or one to be bound later with
    /// [`bind_if_unset`](Self::bind_if_unset).
    pub fn new(value_codec: Option<Arc<dyn Codec<V>>>) -> Self {
        let value_codec = match value_codec {
            Some(codec) => CodecBinding::Bound(codec),
            None => CodecBinding::Unbound,
        };
        Self { value_codec }
    }

    pub fn is_ready(&self) -> bool {
        self.value_codec.is_bound()
    }

    /// Bind the operator's default value codec unless a codec is already
    /// bound. Fails with [`CodecError::NotReady`] when the registry has none.
    pub fn bind_if_unset(&mut self, registry: &dyn CodecRegistry<V>) -> Result<(), CodecError> {
        if self.value_codec.is_bound() {
            tracing::debug!("subscription response value codec already bound");
            return Ok(());
        }
        let codec = registry.value_codec().ok_or(CodecError::NotReady)?;
        tracing::debug!("bound subscription response value codec from registry");
        self.value_codec = CodecBinding::Bound(codec);
        Ok(())
    }

    fn bound(&self) -> Result<&dyn Codec<V>, CodecError> {
        match &self.value_codec {
            CodecBinding::Bound(codec) => Ok(codec.as_ref()),
            CodecBinding::Unbound => Err(CodecError::NotReady),
        }
    }

    pub fn encode(
        &self,
        topic: &str,
        response: &SubscriptionResponseWrapper<V>,
    ) -> Result<Vec<u8>, CodecError> {
        let codec = self.bound()?;
        let hash = response.original_value_hash();
        let header = pack_header(response.version(), hash.is_none())?;

        let value = match response.foreign_value() {
            Some(value) => codec.serialize(topic, value).map_err(CodecError::Value)?,
            None => Vec::new(),
        };

        let hash_len = if hash.is_some() { HASH_LEN } else { 0 };
        let mut buf = Vec::with_capacity(1 + hash_len + value.len());
        buf.push(header);
        if let Some([hi, lo]) = hash {
            buf.extend_from_slice(&hi.to_be_bytes());
            buf.extend_from_slice(&lo.to_be_bytes());
        }
        buf.extend_from_slice(&value);
        Ok(buf)
    }

    pub fn decode(
        &self,
        topic: &str,
        bytes: &[u8],
    ) -> Result<SubscriptionResponseWrapper<V>, CodecError> {
        let codec = self.bound()?;
        let (&header, rest) = bytes
            .split_first()
            .ok_or_else(|| CodecError::Malformed("empty buffer".to_string()))?;
        let (version, hash_is_null) = unpack_header(header);

        let (hash, rest) = if hash_is_null {
            (None, rest)
        } else {
            let truncated = || {
                CodecError::Malformed(format!(
                    "hash needs {HASH_LEN} bytes, {} remain",
                    rest.len()
                ))
            };
            let (hi, rest) = rest.split_first_chunk::<8>().ok_or_else(truncated)?;
            let (lo, rest) = rest.split_first_chunk::<8>().ok_or_else(truncated)?;
            (
                Some([u64::from_be_bytes(*hi), u64::from_be_bytes(*lo)]),
                rest,
            )
        };

        let value = if rest.is_empty() {
            None
        } else {
            Some(codec.deserialize(topic, rest).map_err(CodecError::Value)?)
        };
        Ok(SubscriptionResponseWrapper::with_version(hash, value, version))
    }
}

impl<V> Codec<SubscriptionResponseWrapper<V>> for SubscriptionResponseCodec<V> {
    fn serialize(&self, topic: &str, value: &SubscriptionResponseWrapper<V>) -> anyhow::Result<Vec<u8>> {
        Ok(self.encode(topic, value)?)
    }

    fn deserialize(&self, topic: &str, bytes: &[u8]) -> anyhow::Result<SubscriptionResponseWrapper<V>> {
        Ok(self.decode(topic, bytes)?)
    }
}

#[cfg(test)]
#[path = "tests/codec_tests.rs"]
mod tests;
