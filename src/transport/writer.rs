//! Dedicated writer task for framed links.
//!
//! ```text
//! Dispatcher ─► mpsc::UnboundedSender<Envelope> ─► Writer Task ─► Stream
//! ```
//!
//! The task encodes each envelope into a frame and coalesces whatever is
//! already queued (up to the batch limit) into a single write and flush.

use bytes::BytesMut;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::message::{Envelope, Side};
use crate::protocol::Frame;

/// Spawn the writer task for `sender`'s end of a stream.
///
/// The task ends cleanly once every sender handle is dropped, shutting the
/// write half down.
pub(crate) fn spawn_writer_task<W>(
    writer: W,
    sender: Side,
    batch_limit: usize,
) -> (mpsc::UnboundedSender<Envelope>, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(async move {
        let result = writer_loop(rx, writer, sender, batch_limit.max(1)).await;
        if let Err(e) = &result {
            tracing::error!(side = ?sender, error = %e, "Writer task failed");
        }
        result
    });
    (tx, task)
}

async fn writer_loop<W>(
    mut rx: mpsc::UnboundedReceiver<Envelope>,
    mut writer: W,
    sender: Side,
    batch_limit: usize,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(8 * 1024);

    while let Some(first) = rx.recv().await {
        let mut frames = 0usize;
        encode_into(&mut buf, &first, sender, &mut frames);

        while frames < batch_limit {
            match rx.try_recv() {
                Ok(envelope) => encode_into(&mut buf, &envelope, sender, &mut frames),
                Err(_) => break,
            }
        }

        if buf.is_empty() {
            continue;
        }
        writer.write_all(&buf).await?;
        writer.flush().await?;
        tracing::trace!(side = ?sender, frames, bytes = buf.len(), "Wrote batch");
        buf.clear();
    }

    writer.shutdown().await?;
    Ok(())
}

fn encode_into(buf: &mut BytesMut, envelope: &Envelope, sender: Side, frames: &mut usize) {
    match Frame::from_envelope(envelope, sender) {
        Ok(frame) => {
            frame.write_to(buf);
            *frames += 1;
        }
        Err(e) => tracing::warn!(
            name = envelope.name().unwrap_or("<none>"),
            error = %e,
            "Dropping envelope that failed to encode"
        ),
    }
}
