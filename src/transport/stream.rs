//! Framed links over byte streams.
//!
//! [`framed`] splits a stream into halves, spawns a writer task for the
//! outbound queue and a reader task that turns incoming bytes into
//! envelopes. The returned [`Link`] behaves exactly like an in-memory one.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::writer::spawn_writer_task;
use super::Link;
use crate::config::BridgeConfig;
use crate::error::{BridgeError, Result};
use crate::message::{Envelope, Side};
use crate::protocol::FrameBuffer;

/// Size of the read buffer used by the reader task.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Background tasks serving a framed link.
#[derive(Debug)]
pub struct FramedTasks {
    pub reader: JoinHandle<Result<()>>,
    pub writer: JoinHandle<Result<()>>,
}

/// Wrap `stream` as the `local` side's end of a link.
///
/// Frames whose sender flag claims the local side are dropped with a
/// warning. A frame that fails validation ends the reader, which the channel
/// on top observes as the peer hanging up.
pub fn framed<S>(stream: S, local: Side, config: &BridgeConfig) -> (Link, FramedTasks)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);

    let (outbound, writer) = spawn_writer_task(write_half, local, config.write_batch);

    let (inbound_tx, inbound) = mpsc::unbounded_channel();
    let max_payload = config.max_payload_size;
    let reader = tokio::spawn(async move {
        let result = read_loop(read_half, local, max_payload, inbound_tx).await;
        match &result {
            Ok(()) => tracing::debug!(side = ?local, "Stream closed"),
            Err(e) => tracing::warn!(side = ?local, error = %e, "Stream reader stopped"),
        }
        result
    });

    (Link::new(outbound, inbound), FramedTasks { reader, writer })
}

async fn read_loop<R>(
    mut reader: R,
    local: Side,
    max_payload: u32,
    inbound: mpsc::UnboundedSender<Envelope>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut frame_buffer = FrameBuffer::with_max_payload(max_payload);
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            read = reader.read(&mut buf) => read.map_err(BridgeError::Io)?,
            _ = inbound.closed() => return Ok(()),
        };
        if n == 0 {
            return Ok(());
        }

        for frame in frame_buffer.push(&buf[..n])? {
            if frame.sender() == local {
                tracing::warn!(side = ?local, "Dropping frame sent by this side");
                continue;
            }
            let envelope = match frame.into_envelope() {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping undecodable frame");
                    continue;
                }
            };
            if inbound.send(envelope).is_err() {
                return Ok(());
            }
        }
    }
}
