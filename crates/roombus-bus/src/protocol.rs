//! Wire protocol for the `/call-center` namespace (§4.2, §6 "Signaling
//! channel").
//!
//! Every inbound frame is a [`ClientEnvelope`]. Request events get a
//! [`ReplyEnvelope`] carrying the same `request_id` back; broadcasts use
//! [`BroadcastEnvelope`] and carry no request id at all since no particular
//! client asked for them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct ClientEnvelope {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyEnvelope {
    pub request_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplyEnvelope {
    pub fn ok(request_id: String, data: serde_json::Value) -> Self {
        Self { request_id, success: true, data: Some(data), error: None }
    }

    pub fn err(request_id: String, message: impl Into<String>) -> Self {
        Self { request_id, success: false, data: None, error: Some(message.into()) }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastEnvelope {
    pub event: String,
    pub data: serde_json::Value,
}
