//! Host-side client.
//!
//! Sends one command at a time over an async byte stream and waits for the
//! matching response frame.
//!
//! # Example
//!
//! ```ignore
//! use stepwire::client::HostClient;
//! use stepwire::protocol::{FrameMarkers, MessageSpec};
//!
//! let spec = MessageSpec::new(32, 8)?;
//! let mut client = HostClient::new(serial_port, spec, FrameMarkers::default());
//!
//! client.write(88, 9).await?;
//! let reply = client.read(88).await?;
//! assert_eq!(reply.payload.data(), Some(9));
//!
//! client.step().await?;
//! let status = client.status().await?;
//! ```

use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, StepwireError};
use crate::protocol::{
    encode_frame, Command, FrameMarkers, FrameReceiver, Message, MessageSpec, Payload,
    ResponseMessage,
};

/// Default time to wait for a response frame.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Initial capacity of the read buffer.
const READ_BUFFER_CAPACITY: usize = 256;

/// Request/response client for a controller on the far end of `stream`.
pub struct HostClient<S> {
    stream: S,
    spec: MessageSpec,
    markers: FrameMarkers,
    receiver: FrameReceiver,
    buf: BytesMut,
    timeout: Duration,
}

impl<S: AsyncRead + AsyncWrite + Unpin> HostClient<S> {
    pub fn new(stream: S, spec: MessageSpec, markers: FrameMarkers) -> Self {
        Self {
            stream,
            spec,
            markers,
            receiver: FrameReceiver::new(spec, markers),
            buf: BytesMut::with_capacity(READ_BUFFER_CAPACITY),
            timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Set how long to wait for each response.
    ///
    /// Default: 5 seconds
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[inline]
    pub fn spec(&self) -> &MessageSpec {
        &self.spec
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    pub async fn read(&mut self, address: u64) -> Result<ResponseMessage> {
        self.request(Command::Read, Payload::Address { address, data: 0 })
            .await
    }

    pub async fn write(&mut self, address: u64, data: u64) -> Result<ResponseMessage> {
        self.request(Command::Write, Payload::Address { address, data })
            .await
    }

    pub async fn reset(&mut self) -> Result<ResponseMessage> {
        self.request(Command::Reset, Payload::Value(0)).await
    }

    pub async fn step(&mut self) -> Result<ResponseMessage> {
        self.request(Command::Step, Payload::Value(0)).await
    }

    pub async fn start(&mut self) -> Result<ResponseMessage> {
        self.request(Command::Start, Payload::Value(0)).await
    }

    pub async fn pause(&mut self) -> Result<ResponseMessage> {
        self.request(Command::Pause, Payload::Value(0)).await
    }

    pub async fn status(&mut self) -> Result<ResponseMessage> {
        self.request(Command::Status, Payload::Value(0)).await
    }

    /// Send any command and wait for its response.
    pub async fn request(
        &mut self,
        command: Command,
        payload: Payload,
    ) -> Result<ResponseMessage> {
        let msg = self.spec.encode_payload(command.code(), &payload)?;
        let frame = encode_frame(&self.spec, &self.markers, &msg);

        tracing::debug!(?command, len = frame.len(), "Sending request");
        self.stream.write_all(&frame).await?;
        self.stream.flush().await?;

        match tokio::time::timeout(self.timeout, self.recv(command)).await {
            Ok(result) => result,
            Err(_) => {
                self.receiver.reset();
                self.buf.clear();
                Err(StepwireError::Timeout)
            }
        }
    }

    /// Read until a response frame for `command` is complete.
    ///
    /// Responses that answer a different command (a late reply to a request
    /// that already timed out) are skipped. Bytes after the frame stay
    /// buffered for the next call.
    async fn recv(&mut self, command: Command) -> Result<ResponseMessage> {
        loop {
            while self.buf.has_remaining() {
                self.receiver.push_byte(self.buf.get_u8());
                if let Some(msg) = self.receiver.take_message() {
                    let reply = self.decode(&msg)?;
                    if command.responses().contains(&reply.response) {
                        return Ok(reply);
                    }
                    tracing::warn!(
                        ?command,
                        response = ?reply.response,
                        "Skipping stale response"
                    );
                }
            }

            let n = self.stream.read_buf(&mut self.buf).await?;
            if n == 0 {
                return Err(StepwireError::ConnectionClosed);
            }
        }
    }

    fn decode(&self, msg: &Message) -> Result<ResponseMessage> {
        self.spec
            .decode_response(msg)
            .ok_or_else(|| StepwireError::UnexpectedResponse(self.spec.parse_opcode(msg)))
    }
}
