//! Typed message variants.
//!
//! Every name in the bridge vocabulary has its own variant with a typed
//! payload. Names outside the vocabulary survive as [`Message::Unknown`] so a
//! newer peer can still talk to an older one.

use super::names;
use super::raw::RawMessage;
use super::value::{Fields, Value};
use crate::error::{BridgeError, Result};

/// Viewport rectangle the content treats as its active renderable area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayPort {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayPort {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Payload of `Data::Get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub val: String,
}

impl DataRequest {
    pub fn new(val: impl Into<String>) -> Self {
        Self { val: val.into() }
    }
}

/// Payload of `Data::Answer`, also the reply to `Data::Get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataAnswer {
    pub id: String,
    pub val: String,
}

impl DataAnswer {
    pub fn new(id: impl Into<String>, val: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            val: val.into(),
        }
    }
}

/// A typed bridge message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// `ChannelInit::Hello`, host to content.
    Hello,
    /// `ChannelInit::Ready`, content to host, once per channel.
    Ready,
    /// `Viewport::SetDisplayPort`, host to content.
    SetDisplayPort(DisplayPort),
    /// `Data::Get`, content to host, sync.
    DataGet(DataRequest),
    /// `Data::Answer`, host to content.
    DataAnswer(DataAnswer),
    /// Any other name, payload kept as-is.
    Unknown { name: String, fields: Fields },
}

impl Message {
    /// Build a message outside the known vocabulary.
    pub fn unknown(name: impl Into<String>, fields: Fields) -> Self {
        Message::Unknown {
            name: name.into(),
            fields,
        }
    }

    /// Wire name of the message.
    pub fn name(&self) -> &str {
        match self {
            Message::Hello => names::HELLO,
            Message::Ready => names::READY,
            Message::SetDisplayPort(_) => names::SET_DISPLAY_PORT,
            Message::DataGet(_) => names::DATA_GET,
            Message::DataAnswer(_) => names::DATA_ANSWER,
            Message::Unknown { name, .. } => name,
        }
    }

    /// Whether the name belongs to the known vocabulary.
    pub fn is_known(&self) -> bool {
        !matches!(self, Message::Unknown { .. })
    }

    /// Flatten into the wire form.
    pub fn to_raw(&self) -> RawMessage {
        let raw = RawMessage::new(self.name());
        match self {
            Message::Hello | Message::Ready => raw,
            Message::SetDisplayPort(rect) => raw
                .with_field("x", rect.x)
                .with_field("y", rect.y)
                .with_field("width", rect.width)
                .with_field("height", rect.height),
            Message::DataGet(req) => raw.with_field("val", req.val.as_str()),
            Message::DataAnswer(answer) => raw
                .with_field("id", answer.id.as_str())
                .with_field("val", answer.val.as_str()),
            Message::Unknown { fields, .. } => RawMessage {
                fields: fields.clone(),
                ..raw
            },
        }
    }

    /// Type a wire message.
    ///
    /// Unknown names never fail. Known names fail with
    /// [`BridgeError::MalformedPayload`] when a required field is missing or
    /// has the wrong type; extra fields are ignored.
    pub fn from_raw(raw: RawMessage) -> Result<Self> {
        let RawMessage { name, fields } = raw;
        let message = match name.as_str() {
            names::HELLO => Message::Hello,
            names::READY => Message::Ready,
            names::SET_DISPLAY_PORT => Message::SetDisplayPort(DisplayPort {
                x: number(&name, &fields, "x")?,
                y: number(&name, &fields, "y")?,
                width: number(&name, &fields, "width")?,
                height: number(&name, &fields, "height")?,
            }),
            names::DATA_GET => Message::DataGet(DataRequest {
                val: string(&name, &fields, "val")?,
            }),
            names::DATA_ANSWER => Message::DataAnswer(DataAnswer {
                id: string(&name, &fields, "id")?,
                val: string(&name, &fields, "val")?,
            }),
            _ => return Ok(Message::Unknown { name, fields }),
        };
        Ok(message)
    }
}

impl From<DisplayPort> for Message {
    fn from(rect: DisplayPort) -> Self {
        Message::SetDisplayPort(rect)
    }
}

impl From<DataRequest> for Message {
    fn from(req: DataRequest) -> Self {
        Message::DataGet(req)
    }
}

impl From<DataAnswer> for Message {
    fn from(answer: DataAnswer) -> Self {
        Message::DataAnswer(answer)
    }
}

fn field<'a>(name: &str, fields: &'a Fields, key: &str) -> Result<&'a Value> {
    fields
        .get(key)
        .ok_or_else(|| BridgeError::malformed(name, format!("missing field `{}`", key)))
}

fn number(name: &str, fields: &Fields, key: &str) -> Result<f64> {
    let value = field(name, fields, key)?;
    let number = value.as_f64().ok_or_else(|| {
        BridgeError::malformed(
            name,
            format!("field `{}` must be numeric, got {}", key, value.type_name()),
        )
    })?;
    if !number.is_finite() {
        return Err(BridgeError::malformed(
            name,
            format!("field `{}` must be finite, got {}", key, number),
        ));
    }
    Ok(number)
}

fn string(name: &str, fields: &Fields, key: &str) -> Result<String> {
    let value = field(name, fields, key)?;
    value.as_str().map(str::to_string).ok_or_else(|| {
        BridgeError::malformed(
            name,
            format!("field `{}` must be a string, got {}", key, value.type_name()),
        )
    })
}
