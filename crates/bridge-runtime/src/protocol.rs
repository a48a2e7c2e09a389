//! JSON-lines protocol spoken on stdin/stdout
//!
//! Input, one trigger per line:
//!
//! ```text
//! {"target": "scores", "data": {"chart": "hard"}, "args": {"row": 3}}
//! ```
//!
//! Output, one outcome per line, tagged by `event`:
//!
//! ```text
//! {"event":"delivered","correlator":"scores","request_id":"…","response":{…},"args":{"row":3}}
//! {"event":"abandoned","correlator":"scores","request_id":"…","reason":"timed_out"}
//! {"event":"failed","correlator":"scores","error":"…"}
//! {"event":"rejected","error":"…"}
//! ```

use serde::{Deserialize, Serialize};
use shared_bus::{AbandonReason, BridgeEvent};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid trigger line: {0}")]
    InvalidTrigger(#[from] serde_json::Error),
}

/// One trigger read from the input stream.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TriggerLine {
    pub target: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub args: serde_json::Value,
}

impl TriggerLine {
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(line)?)
    }

    /// The bus event for this trigger. Outcomes are reported as output
    /// lines, so no callback is attached.
    pub fn into_event(self) -> BridgeEvent {
        BridgeEvent::RequestTriggered {
            target: self.target,
            data: self.data,
            args: self.args,
            callback: None,
        }
    }
}

/// One outcome written to the output stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutputLine {
    Delivered {
        correlator: String,
        request_id: String,
        response: serde_json::Value,
        args: serde_json::Value,
    },
    Abandoned {
        correlator: String,
        request_id: String,
        reason: AbandonReason,
    },
    Failed {
        correlator: String,
        error: String,
    },
    /// The input line never reached a correlator.
    Rejected { error: String },
}

impl OutputLine {
    /// Map an outcome event; triggers have no output line.
    pub fn from_event(event: &BridgeEvent) -> Option<Self> {
        match event {
            BridgeEvent::RequestTriggered { .. } => None,
            BridgeEvent::ResponseDelivered {
                source,
                request_id,
                response,
                args,
            } => Some(Self::Delivered {
                correlator: source.clone(),
                request_id: request_id.to_string(),
                response: response.clone(),
                args: args.clone(),
            }),
            BridgeEvent::RequestAbandoned {
                source,
                request_id,
                reason,
            } => Some(Self::Abandoned {
                correlator: source.clone(),
                request_id: request_id.to_string(),
                reason: *reason,
            }),
            BridgeEvent::RequestFailed { source, error } => Some(Self::Failed {
                correlator: source.clone(),
                error: error.clone(),
            }),
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self::Rejected {
            error: error.into(),
        }
    }

    /// Encode as a single line including the trailing newline.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}
