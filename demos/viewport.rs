//! Viewport demo - host and content script in one process.
//!
//! This example demonstrates:
//! - Attaching a content script and waiting for `ChannelInit::Ready`
//! - Pushing display port rectangles from the host
//! - The title-change bridge performing a sync `Data::Get` round trip
//! - Delivering a `window-opened` notification
//!
//! ```sh
//! RUST_LOG=content_bridge=debug cargo run --example viewport
//! ```

use std::sync::Arc;
use std::time::Duration;

use content_bridge::content::{ContentScript, Document};
use content_bridge::host::HostChannel;
use content_bridge::message::{names, DataAnswer, DisplayPort, Message};
use content_bridge::transport::memory;
use content_bridge::BridgeConfig;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("content_bridge=info,info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(env_filter)
        .init();

    let (host_link, content_link) = memory::pair();

    let host = HostChannel::builder()
        .handle(names::DATA_GET, |msg, _ctx| match msg {
            Message::DataGet(req) => {
                tracing::info!(val = %req.val, "Host got data request");
                Some(DataAnswer::new("test", "2").into())
            }
            _ => None,
        })
        .attach(host_link)?;

    let document = Arc::new(Document::new("about:blank"));
    let script = ContentScript::attach(content_link, document.clone(), BridgeConfig::default())?;

    if !host.wait_ready(Duration::from_secs(1)).await {
        return Err("content never became ready".into());
    }

    host.say_hello()?;
    host.set_display_port(DisplayPort::new(0.0, 0.0, 980.0, 1200.0))?;
    host.send_json(
        names::SET_DISPLAY_PORT,
        r#"{"x": 0, "y": 240, "width": 980, "height": 1200}"#,
    )?;

    let mut answers = script.answers();
    script.set_title("Example Domain")?;
    let answer = answers.wait_for(Option::is_some).await?.clone();
    println!("title change answered with {:?}", answer);

    script.notify_window_opened("chrome://browser/content/browser.xul")?;

    tokio::time::sleep(Duration::from_millis(10)).await;
    println!(
        "display port {:?} (revision {}), windows opened: {}",
        document.display_port(),
        document.revision(),
        script.windows_opened()
    );

    script.detach();
    Ok(())
}
