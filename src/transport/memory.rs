//! In-process links.

use tokio::sync::mpsc;

use super::Link;

/// Create two connected link ends, one for each side.
///
/// # Example
///
/// ```
/// use content_bridge::message::{Envelope, RawMessage};
/// use content_bridge::transport::memory;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let (a, mut b) = memory::pair();
/// a.send(Envelope::Post(RawMessage::new("ChannelInit::Hello"))).unwrap();
/// assert_eq!(b.recv().await.unwrap().name(), Some("ChannelInit::Hello"));
/// # }
/// ```
pub fn pair() -> (Link, Link) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (Link::new(a_tx, a_rx), Link::new(b_tx, b_rx))
}
