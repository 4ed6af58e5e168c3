//! Transport module - links that carry envelopes between the two sides.
//!
//! A [`Link`] is one end of a duplex envelope queue. Two flavours exist:
//! - [`memory::pair`] - both ends in the same process
//! - [`stream::framed`] - one end over any byte stream, using the wire
//!   format from [`crate::protocol`]
//!
//! Either way delivery is FIFO per direction and the far end closing is
//! observed as the inbound queue ending.

pub mod memory;
pub mod stream;
mod writer;

use tokio::sync::mpsc;

use crate::error::{BridgeError, Result};
use crate::message::Envelope;

/// One end of a duplex envelope link.
pub struct Link {
    outbound: mpsc::UnboundedSender<Envelope>,
    inbound: mpsc::UnboundedReceiver<Envelope>,
}

impl Link {
    pub fn new(
        outbound: mpsc::UnboundedSender<Envelope>,
        inbound: mpsc::UnboundedReceiver<Envelope>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Send an envelope to the far end.
    pub fn send(&self, envelope: Envelope) -> Result<()> {
        self.outbound
            .send(envelope)
            .map_err(|_| BridgeError::ConnectionClosed)
    }

    /// Receive the next envelope; `None` once the far end is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.inbound.recv().await
    }

    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedSender<Envelope>,
        mpsc::UnboundedReceiver<Envelope>,
    ) {
        (self.outbound, self.inbound)
    }
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("closed", &self.outbound.is_closed())
            .finish()
    }
}
