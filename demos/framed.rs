//! Framed demo - the same session over a byte stream.
//!
//! Both ends are wrapped with `transport::stream::framed`, so every envelope
//! crosses the wire as a 9-byte header plus a MessagePack payload. A
//! `tokio::io::duplex` pipe stands in for a socket.
//!
//! ```sh
//! RUST_LOG=content_bridge=trace cargo run --example framed
//! ```

use std::sync::Arc;
use std::time::Duration;

use content_bridge::config::{BridgeConfig, Preferences};
use content_bridge::content::{ContentScript, Document};
use content_bridge::host::HostChannel;
use content_bridge::message::{names, DataAnswer, DataRequest, Message, Side};
use content_bridge::transport::stream::framed;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("content_bridge=debug,info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let prefs = Preferences::from_json(
        r#"{"bridge.sync_timeout_ms": 2000, "bridge.max_payload_size": 65536, "plugin.disable": true}"#,
    )?;
    let config = BridgeConfig::from_preferences(&prefs);

    let (host_io, content_io) = tokio::io::duplex(64 * 1024);
    let (host_link, _host_tasks) = framed(host_io, Side::Host, &config);
    let (content_link, _content_tasks) = framed(content_io, Side::Content, &config);

    let host = HostChannel::builder()
        .config(config.clone())
        .handle(names::DATA_GET, |msg, _ctx| match msg {
            Message::DataGet(req) => Some(DataAnswer::new("test", format!("{}+1", req.val)).into()),
            _ => None,
        })
        .attach(host_link)?;
    let script = ContentScript::attach(content_link, Arc::new(Document::default()), config)?;

    if !host.wait_ready(Duration::from_secs(1)).await {
        return Err("content never became ready".into());
    }

    let answered = script.channel().send_sync(DataRequest::new("41")).await?;
    println!("Data::Get answered with {:?}", answered);

    let unanswered = host.call_json("Gesture::DoubleTap", r#"{"x": 10, "y": 20}"#).await?;
    println!("unhandled call resolved to {} message(s)", unanswered.len());

    host.detach();
    tokio::time::sleep(Duration::from_millis(10)).await;
    println!("content channel state after host detach: {:?}", script.channel().state());
    Ok(())
}
