//! Async byte-stream service.
//!
//! Runs a [`Controller`] against any tokio reader/writer pair (a serial port,
//! a socket, a `tokio::io::duplex` in tests).
//!
//! ```text
//! reader ─► read_buf ─► feed ─► tick ─► drain ─► write_all + flush ─► writer
//!                        ▲                │
//!                        └── rx full ─────┘
//! ```
//!
//! The controller only ticks while there is input to process or output to
//! flush, so an autonomous experiment advances as the host talks to it.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::control::Controller;
use crate::error::Result;
use crate::experiment::ExperimentBus;

/// Default read buffer size.
pub const DEFAULT_READ_BUFFER: usize = 4096;

/// Serve `controller` until `reader` reaches EOF.
///
/// Returns `Ok(())` on a clean close and the I/O error otherwise.
pub async fn serve<E, R, W>(
    controller: &mut Controller<E>,
    mut reader: R,
    mut writer: W,
) -> Result<()>
where
    E: ExperimentBus,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(DEFAULT_READ_BUFFER);

    loop {
        buf.clear();
        let n = reader.read_buf(&mut buf).await?;
        if n == 0 {
            tracing::debug!("Input closed");
            flush_pending(controller, &mut writer).await?;
            return Ok(());
        }

        let mut input = &buf[..n];
        loop {
            let accepted = controller.feed(input);
            input = &input[accepted..];

            controller.tick();
            write_out(controller, &mut writer).await?;

            if input.is_empty() && !controller.has_pending_work() {
                break;
            }
        }
    }
}

async fn write_out<E, W>(controller: &mut Controller<E>, writer: &mut W) -> Result<()>
where
    E: ExperimentBus,
    W: AsyncWrite + Unpin,
{
    let out = controller.drain();
    if !out.is_empty() {
        tracing::trace!(len = out.len(), "tx chunk");
        writer.write_all(&out).await?;
        writer.flush().await?;
    }
    Ok(())
}

async fn flush_pending<E, W>(controller: &mut Controller<E>, writer: &mut W) -> Result<()>
where
    E: ExperimentBus,
    W: AsyncWrite + Unpin,
{
    while controller.has_pending_work() {
        controller.tick();
        write_out(controller, writer).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ControllerBuilder;
    use crate::experiment::RamExperiment;
    use crate::protocol::{encode_frame, Command, FrameReceiver, Response};

    #[tokio::test]
    async fn test_serve_answers_and_stops_on_eof() {
        let mut ctl = ControllerBuilder::new()
            .build(RamExperiment::new(16, 8).unwrap())
            .unwrap();
        let spec = *ctl.spec();
        let markers = *ctl.markers();

        let mut input = Vec::new();
        for _ in 0..5 {
            let msg = spec.encode_value_type(Command::Step.code(), 0).unwrap();
            input.extend(encode_frame(&spec, &markers, &msg));
        }

        let mut output = Vec::new();
        serve(&mut ctl, &input[..], &mut output).await.unwrap();

        let mut receiver = FrameReceiver::new(spec, markers);
        let mut counts = Vec::new();
        for byte in output {
            receiver.push_byte(byte);
            if let Some(msg) = receiver.take_message() {
                let r = spec.decode_response(&msg).unwrap();
                assert_eq!(r.response, Response::StepSuccess);
                counts.push(r.payload.value().unwrap());
            }
        }
        assert_eq!(counts, vec![1, 2, 3, 4, 5]);
        assert_eq!(ctl.cycle_count(), 5);
    }

    #[tokio::test]
    async fn test_serve_empty_input() {
        let mut ctl = ControllerBuilder::new()
            .build(RamExperiment::new(16, 8).unwrap())
            .unwrap();
        let mut output = Vec::new();
        serve(&mut ctl, tokio::io::empty(), &mut output).await.unwrap();
        assert!(output.is_empty());
    }
}
