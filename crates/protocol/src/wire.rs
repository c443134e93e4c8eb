//! Wire-Format fuer den Signaling-Kanal
//!
//! Jede Nachricht ist ein einzelnes JSON-Objekt in einem Text-Frame.
//! Dieses Modul verbindet Text und [`codec`](crate::codec): es parst den
//! Text, prueft die Groesse und liefert die typisierte Nachricht.

use serde_json::Value;

use crate::codec;
use crate::error::{DecodeError, DecodeResult};
use crate::message::Message;

// ---------------------------------------------------------------------------
// Konstanten
// ---------------------------------------------------------------------------

/// Standard-maximale Nachrichtengroesse (1 MB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

// ---------------------------------------------------------------------------
// Text <-> Message
// ---------------------------------------------------------------------------

/// Dekodiert einen Text-Frame
pub fn decode_text(text: &str) -> DecodeResult<Message> {
    decode_text_begrenzt(text, DEFAULT_MAX_MESSAGE_SIZE)
}

/// Dekodiert einen Text-Frame mit eigener Groessengrenze
pub fn decode_text_begrenzt(text: &str, max_groesse: usize) -> DecodeResult<Message> {
    if text.len() > max_groesse {
        return Err(DecodeError::nutzlast(format!(
            "Nachricht zu gross: {} Bytes (max. {max_groesse})",
            text.len()
        )));
    }
    let wert: Value = serde_json::from_str(text)
        .map_err(|e| DecodeError::nutzlast(format!("Kein gueltiges JSON: {e}")))?;
    match wert {
        Value::Object(map) => codec::decode_map(map),
        anderes => codec::decode(&anderes),
    }
}

/// Enkodiert eine Nachricht als Text-Frame
pub fn encode_text(nachricht: &Message) -> String {
    codec::encode(nachricht).to_string()
}

impl Message {
    /// Serialisiert die Nachricht als JSON-Text
    pub fn to_json(&self) -> String {
        encode_text(self)
    }

    /// Deserialisiert eine Nachricht aus JSON-Text
    pub fn from_json(json: &str) -> DecodeResult<Self> {
        decode_text(json)
    }
}
