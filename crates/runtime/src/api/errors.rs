//! Error types surfaced by the bridge.
//!
//! Transport and decode failures end an episode; they are carried in the
//! episode's [`ExitReason`]. Only a failure of the terminal flush itself is
//! returned as a [`BridgeError`], since at that point the remote side may be
//! left waiting.
use std::io;

use thiserror::Error;

use crate::scheduler::ExitReason;
use crate::transport::Endpoint;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("terminal flush failed after episode ended ({exit})")]
    TerminalFlush {
        exit: ExitReason,
        #[source]
        source: TransportError,
    },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("stream i/o failed")]
    Io(#[from] io::Error),

    #[error("{endpoint} request failed")]
    Http {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to encode state report")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode action message {payload:?}")]
    Decode {
        payload: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    pub(crate) fn decode(payload: &str, source: serde_json::Error) -> Self {
        TransportError::Decode {
            payload: payload.to_string(),
            source,
        }
    }

    /// Returns true if the remote answered but the action could not be decoded.
    pub fn is_decode(&self) -> bool {
        matches!(self, TransportError::Decode { .. })
    }
}
