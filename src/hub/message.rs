//! Dashboard wire messages

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

use crate::types::{AlertPayload, WATCHLIST_ALERT};

/// Outbound broadcast envelope `{type, data}`.
///
/// Also the body accepted by the internal publish endpoint, so `data` stays
/// free-form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl BroadcastEnvelope {
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    pub fn watchlist_alert(payload: &AlertPayload) -> Result<Self, serde_json::Error> {
        Ok(Self::new(WATCHLIST_ALERT, serde_json::to_value(payload)?))
    }

    /// Fleet vehicle the message is about, used for session filtering.
    ///
    /// A non-empty string or a number (compared in its decimal form) targets
    /// that vehicle. Anything else, including `""`, is untargeted.
    pub fn vehicle_id(&self) -> Option<Cow<'_, str>> {
        match self.data.get("vehicle_id")? {
            Value::String(s) if !s.is_empty() => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            _ => None,
        }
    }
}

/// Control messages a viewer may send
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewerMessage {
    Subscribe {
        #[serde(default)]
        vehicle_id: Option<String>,
    },
    Ping,
}

impl ViewerMessage {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Reply to a viewer `ping`
pub const PONG_FRAME: &str = r#"{"type":"pong"}"#;
