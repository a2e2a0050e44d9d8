//! Binary envelope codec: `data:<media-type>;base64,<payload>`.

use base64::{engine::general_purpose::STANDARD, Engine};
use exambank_model::{BinaryPayload, Value};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Tagged as base64 but the payload does not decode.
    #[error("malformed binary envelope: {0}")]
    MalformedEnvelope(String),
}

/// What a snapshot string turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Binary(BinaryPayload),
    /// Not an envelope; the original text.
    Text(String),
}

impl From<Decoded> for Value {
    fn from(decoded: Decoded) -> Self {
        match decoded {
            Decoded::Binary(payload) => Value::Blob(payload),
            Decoded::Text(text) => Value::String(text),
        }
    }
}

/// Reads `reader` to completion and wraps the bytes in an envelope.
///
/// Only a failing reader makes this fail; payload size is not limited.
pub async fn encode<R>(media_type: &str, mut reader: R) -> io::Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    Ok(envelope(media_type, &bytes))
}

/// Envelope for a payload already in memory.
pub fn encode_payload(payload: &BinaryPayload) -> String {
    envelope(&payload.media_type, &payload.bytes)
}

fn envelope(media_type: &str, bytes: &[u8]) -> String {
    format!("{SCHEME}{media_type}{BASE64_MARKER},{}", STANDARD.encode(bytes))
}

/// Returns true if `text` is tagged as a base64 envelope.
///
/// Says nothing about whether the payload decodes.
pub fn is_envelope(text: &str) -> bool {
    split(text).is_some()
}

/// Decodes an envelope. Untagged strings come back as [`Decoded::Text`].
pub fn decode(text: &str) -> Result<Decoded, CodecError> {
    let Some((media_type, payload)) = split(text) else {
        return Ok(Decoded::Text(text.to_string()));
    };
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CodecError::MalformedEnvelope(e.to_string()))?;
    Ok(Decoded::Binary(BinaryPayload::new(media_type, bytes)))
}

fn split(text: &str) -> Option<(&str, &str)> {
    let (header, payload) = text.strip_prefix(SCHEME)?.split_once(',')?;
    let media_type = header.strip_suffix(BASE64_MARKER)?;
    Some((media_type, payload))
}
