//! Wire realizations of the report/action exchange.
//!
//! Both transports honor the same ordering contract: the scheduler alternates
//! exactly one report with exactly one action read, apart from the opening
//! reset and the terminal flush. Every outgoing message is serialized in full
//! before any byte is written, so a failed encode never leaves a partial
//! message on the wire.
use async_trait::async_trait;
use bridge_protocol::{Action, StateReport};

use crate::api::TransportError;

mod http;
mod stream;

pub use http::HttpTransport;
pub use stream::{StreamTransport, TcpStreamTransport};

/// Logical operations of the exchange, named after the HTTP endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
pub enum Endpoint {
    #[strum(serialize = "reset-for-new-run")]
    Reset,
    #[strum(serialize = "get-action")]
    GetAction,
    #[strum(serialize = "set-state")]
    SetState,
}

/// Channel to the policy server.
#[async_trait]
pub trait Transport: Send {
    /// Sends the episode's opening report.
    async fn reset(&mut self, report: &StateReport) -> Result<(), TransportError>;

    /// Blocks for the next action.
    ///
    /// `Ok(None)` means the server sent no action (a `null` message or a
    /// closed stream). There is no timeout: the server is the authority the
    /// agent serves, and an unresponsive server stalls the episode.
    async fn next_action(&mut self) -> Result<Option<Action>, TransportError>;

    /// Sends a turn report or the terminal flush.
    async fn set_state(&mut self, report: &StateReport) -> Result<(), TransportError>;

    /// Releases the underlying connection once the episode is over.
    async fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn reset(&mut self, report: &StateReport) -> Result<(), TransportError> {
        (**self).reset(report).await
    }

    async fn next_action(&mut self) -> Result<Option<Action>, TransportError> {
        (**self).next_action().await
    }

    async fn set_state(&mut self, report: &StateReport) -> Result<(), TransportError> {
        (**self).set_state(report).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        (**self).close().await
    }
}

/// Serializes `report` as one newline-terminated JSON document.
pub(crate) fn encode_line(report: &StateReport) -> Result<Vec<u8>, TransportError> {
    let mut line = serde_json::to_vec(report).map_err(TransportError::Encode)?;
    line.push(b'\n');
    Ok(line)
}
