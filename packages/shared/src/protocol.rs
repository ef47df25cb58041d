//! Wire protocol shared by the hiroma server and client.
//!
//! Every frame on the TCP stream is a 2-byte big-endian length prefix
//! followed by a UTF-8 JSON object:
//!
//! ```text
//! {"type":"PUBLIC_MESSAGE","sender":"alice","message":"hi","timestamp":"2024-01-01T00:00:00.000Z"}
//! ```
//!
//! [`encode_payload`] / [`decode_payload`] are the stateless JSON half of the
//! protocol; [`MessageCodec`] adds framing for use with `FramedRead` /
//! `FramedWrite`.

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

use crate::time::now_rfc3339;

/// Size of the length prefix in bytes
pub const LENGTH_FIELD_LEN: usize = 2;

/// Largest payload a single frame can carry
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize;

/// Sender name used on every server-originated frame
pub const SERVER_SENDER: &str = "Server";

/// Fixed bodies of server-originated frames.
pub mod reasons {
    pub const INVALID_CREDENTIALS: &str = "invalid credentials";
    pub const USER_ALREADY_ONLINE: &str = "user already online";
    pub const LOGIN_ALREADY_TAKEN: &str = "login already taken";
    pub const AUTHENTICATION_REQUIRED: &str = "authentication required";
    pub const RATE_LIMITED: &str = "rate limited";
    pub const MALFORMED_FRAME: &str = "malformed frame";
    pub const MESSAGE_TOO_LARGE: &str = "message too large";
    pub const INTERNAL_ERROR: &str = "internal server error";
    pub const REGISTRATION_SUCCESSFUL: &str = "registration successful";
    /// Body of the `LOGOUT_OK` acknowledgement
    pub const LOGOUT: &str = "logout";
}

/// Frame type tag
///
/// Unrecognised tags decode to [`MessageKind::Unknown`] instead of failing,
/// so peers can ignore frame types they do not understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Auth,
    AuthOk,
    Register,
    RegOk,
    Error,
    PublicMessage,
    PresenceUpdate,
    Logout,
    LogoutOk,
    #[serde(other)]
    Unknown,
}

/// Protocol-level errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Payload is not a valid message object
    #[error("invalid message payload: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoded message does not fit into one frame
    #[error("message of {len} bytes exceeds the frame limit")]
    FrameTooLarge { len: usize },

    /// Transport failure while reading or writing frames
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// One protocol message. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub sender: String,
    #[serde(rename = "message", alias = "body", default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: String,
}

impl Message {
    /// Build a message stamped with the current time
    pub fn new(kind: MessageKind, sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            kind,
            sender: sender.into(),
            body: body.into(),
            timestamp: now_rfc3339(),
        }
    }

    /// Server-originated frame
    pub fn server(kind: MessageKind, body: impl Into<String>) -> Self {
        Self::new(kind, SERVER_SENDER, body)
    }

    /// `ERROR` frame from the server
    pub fn error(reason: impl Into<String>) -> Self {
        Self::server(MessageKind::Error, reason)
    }

    /// `AUTH` request carrying `"<login> <password>"`
    pub fn auth(login: &str, password: &str) -> Self {
        Self::new(MessageKind::Auth, "", format!("{login} {password}"))
    }

    /// `REGISTER` request carrying `"<login> <password>"`
    pub fn register(login: &str, password: &str) -> Self {
        Self::new(MessageKind::Register, "", format!("{login} {password}"))
    }

    /// `PUBLIC_MESSAGE` from `sender`
    pub fn public(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(MessageKind::PublicMessage, sender, body)
    }

    /// `LOGOUT` request
    pub fn logout() -> Self {
        Self::new(MessageKind::Logout, "", "")
    }

    /// `PRESENCE_UPDATE` carrying the ordered list of online users as a JSON array
    pub fn presence(names: &[String]) -> Result<Self, ProtocolError> {
        let body = serde_json::to_string(names)?;
        Ok(Self::server(MessageKind::PresenceUpdate, body))
    }

    /// Parse the user list out of a `PRESENCE_UPDATE` body
    pub fn presence_names(&self) -> Result<Vec<String>, ProtocolError> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Split an `AUTH` / `REGISTER` body into `(login, password)`.
    ///
    /// The body is split on the first run of whitespace; a missing part is
    /// returned as an empty string.
    pub fn credentials(&self) -> (&str, &str) {
        let body = self.body.trim();
        match body.split_once(char::is_whitespace) {
            Some((login, password)) => (login, password.trim_start()),
            None => (body, ""),
        }
    }
}

/// Serialize a message into a frame payload (without length prefix)
pub fn encode_payload(message: &Message) -> Result<Bytes, ProtocolError> {
    let payload = serde_json::to_vec(message)?;
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::FrameTooLarge { len: payload.len() });
    }
    Ok(Bytes::from(payload))
}

/// Parse a frame payload (without length prefix) into a message
pub fn decode_payload(payload: &[u8]) -> Result<Message, ProtocolError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Length-prefix framing used on the wire
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(LENGTH_FIELD_LEN)
        .max_frame_length(MAX_PAYLOAD_LEN)
        .big_endian()
        .new_codec()
}

/// Framed message codec.
///
/// Decoding yields one `Result` per frame: a payload that is not a valid
/// message is reported as an inner `Err` and the stream keeps going. Only
/// framing and transport failures surface as the outer error, which ends the
/// stream.
#[derive(Debug)]
pub struct MessageCodec {
    frames: LengthDelimitedCodec,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            frames: frame_codec(),
        }
    }
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for MessageCodec {
    type Item = Result<Message, ProtocolError>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.frames.decode(src)? {
            Some(frame) => Ok(Some(decode_payload(&frame))),
            None => Ok(None),
        }
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let payload = encode_payload(&item)?;
        self.frames.encode(payload, dst)?;
        Ok(())
    }
}
