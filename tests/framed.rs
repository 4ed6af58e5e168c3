//! Host and content talking over a framed byte stream.

use std::sync::Arc;
use std::time::Duration;

use content_bridge::config::BridgeConfig;
use content_bridge::content::{ContentScript, Document};
use content_bridge::host::HostChannel;
use content_bridge::message::{names, DataAnswer, DataRequest, DisplayPort, Message};
use content_bridge::protocol::{flags, FrameBuffer, Header};
use content_bridge::transport::stream::framed;
use content_bridge::{ChannelState, Side};
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};

#[tokio::test]
async fn test_full_session_over_duplex() {
    let (host_io, content_io) = duplex(16 * 1024);
    let config = BridgeConfig::default();

    let (host_link, _host_tasks) = framed(host_io, Side::Host, &config);
    let (content_link, _content_tasks) = framed(content_io, Side::Content, &config);

    let host = HostChannel::builder()
        .handle(names::DATA_GET, |msg, _ctx| match msg {
            Message::DataGet(req) => Some(DataAnswer::new("test", req.val.replace('1', "2")).into()),
            _ => None,
        })
        .attach(host_link)
        .unwrap();
    let document = Arc::new(Document::default());
    let script = ContentScript::attach(content_link, document.clone(), config).unwrap();

    assert!(host.wait_ready(Duration::from_secs(2)).await);

    let result = script
        .channel()
        .send_sync(DataRequest::new("1"))
        .await
        .unwrap();
    assert_eq!(result, vec![Message::DataAnswer(DataAnswer::new("test", "2"))]);

    let rect = DisplayPort::new(4.0, 8.0, 640.0, 360.0);
    host.set_display_port(rect).unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while document.display_port() != Some(rect) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(host.ready_count(), 1);
}

#[tokio::test]
async fn test_content_announces_ready_on_the_wire() {
    let (mut wire, content_io) = duplex(16 * 1024);
    let (content_link, _tasks) =
        framed(content_io, Side::Content, &BridgeConfig::default());
    let _script =
        ContentScript::attach(content_link, Arc::new(Document::default()), BridgeConfig::default())
            .unwrap();

    let mut buffer = FrameBuffer::new();
    let mut buf = [0u8; 1024];
    let frame = loop {
        let n = wire.read(&mut buf).await.unwrap();
        assert!(n > 0, "stream closed before Ready");
        if let Some(frame) = buffer.push(&buf[..n]).unwrap().into_iter().next() {
            break frame;
        }
    };

    assert_eq!(frame.header.flags, flags::TO_HOST);
    assert_eq!(frame.header.correlation_id, 0);
    assert_eq!(frame.into_envelope().unwrap().name(), Some(names::READY));
}

#[tokio::test]
async fn test_corrupt_stream_tears_channel_down() {
    let (mut wire, content_io) = duplex(16 * 1024);
    let (content_link, _tasks) =
        framed(content_io, Side::Content, &BridgeConfig::default());
    let script =
        ContentScript::attach(content_link, Arc::new(Document::default()), BridgeConfig::default())
            .unwrap();

    wire.write_all(&Header::new(flags::SYNC | flags::REPLY, 1, 0).encode())
        .await
        .unwrap();

    let handle = script.channel();
    tokio::time::timeout(Duration::from_secs(2), async {
        while handle.state() != ChannelState::TornDown {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .unwrap();
}
