//! Persistent bidirectional stream carrying one JSON document per line.
use async_trait::async_trait;
use bridge_protocol::{Action, StateReport};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, trace};

use super::{Transport, encode_line};
use crate::api::TransportError;

/// Stream transport over a TCP connection.
pub type TcpStreamTransport = StreamTransport<BufReader<OwnedReadHalf>, OwnedWriteHalf>;

/// Line-delimited JSON transport over any async byte stream.
///
/// Reports are written as a single line each; the server answers every report
/// except the last with one line holding a bare action object
/// (`{"name": .., "value": ..}`) or `null`.
pub struct StreamTransport<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl TcpStreamTransport {
    /// Opens a TCP connection to the policy server.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TransportError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;

        debug!(target: "bridge::transport", addr, "connected to policy server");

        let (reader, writer) = stream.into_split();
        Ok(Self::new(BufReader::new(reader), writer))
    }
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            line: String::new(),
        }
    }

    async fn write_report(&mut self, report: &StateReport) -> Result<(), TransportError> {
        let line = encode_line(report)?;
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;

        trace!(target: "bridge::transport", bytes = line.len(), "report written");
        Ok(())
    }
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn reset(&mut self, report: &StateReport) -> Result<(), TransportError> {
        self.write_report(report).await
    }

    async fn next_action(&mut self) -> Result<Option<Action>, TransportError> {
        self.line.clear();
        let read = self.reader.read_line(&mut self.line).await?;
        if read == 0 {
            debug!(target: "bridge::transport", "policy server closed the stream");
            return Ok(None);
        }

        decode_action_line(&self.line)
    }

    async fn set_state(&mut self, report: &StateReport) -> Result<(), TransportError> {
        self.write_report(report).await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Decodes one incoming line; `null` means the server has no action.
fn decode_action_line(line: &str) -> Result<Option<Action>, TransportError> {
    let payload = line.trim_end_matches(['\r', '\n']);
    serde_json::from_str(payload).map_err(|source| TransportError::decode(payload, source))
}
