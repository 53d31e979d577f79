use serde::{Deserialize, Serialize};

/// Topology-wide settings consulted while the graph is assembled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Application id; shown in topology descriptions.
    pub application_id: String,
    /// Codec id used for keys of streams that do not name one.
    pub default_key_codec: String,
    /// Codec id used for values of streams that do not name one.
    pub default_value_codec: String,
    /// Reject internal topics whose names would be generated.
    pub ensure_explicit_internal_naming: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            application_id: "tablecrab-app".to_string(),
            default_key_codec: "bytes".to_string(),
            default_value_codec: "bytes".to_string(),
            ensure_explicit_internal_naming: false,
        }
    }
}

impl TopologyConfig {
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            ..Self::default()
        }
    }

    pub fn with_default_key_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.default_key_codec = codec_id.into();
        self
    }

    pub fn with_default_value_codec(mut self, codec_id: impl Into<String>) -> Self {
        self.default_value_codec = codec_id.into();
        self
    }

    pub fn with_explicit_internal_naming(mut self, enforce: bool) -> Self {
        self.ensure_explicit_internal_naming = enforce;
        self
    }

    /// Resolve an optional key codec id against the configured default.
    pub fn key_codec_or_default(&self, codec_id: Option<&str>) -> String {
        codec_id.unwrap_or(&self.default_key_codec).to_string()
    }

    /// Resolve an optional value codec id against the configured default.
    pub fn value_codec_or_default(&self, codec_id: Option<&str>) -> String {
        codec_id.unwrap_or(&self.default_value_codec).to_string()
    }
}
