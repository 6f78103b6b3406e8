//! Messages exchanged with the background compute context
//!
//! One `render` request produces zero or more `progress` messages followed by
//! exactly one terminal `complete` or `error` message. The JSON form mirrors the
//! wire shape (`{"type": "render", "sourceText": ..., "format": "stl"}`).

use meshtune_core::Result;
use meshtune_io::MeshFormat;
use serde::{Deserialize, Serialize};

/// Request sent to the compute context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerRequest {
    Render {
        #[serde(rename = "sourceText")]
        source_text: String,
        format: MeshFormat,
    },
}

/// Message sent back by the compute context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WorkerMessage {
    Progress { progress: f32 },
    Complete { data: Vec<u8> },
    Error { error: String },
}

impl WorkerMessage {
    /// Whether this message ends its job
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerMessage::Progress { .. })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl WorkerRequest {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
