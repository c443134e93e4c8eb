//! Fehlertypen fuer den Nachrichten-Codec

use thiserror::Error;

/// Result-Typ fuer den Codec
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Fehler beim Dekodieren einer Signaling-Nachricht
///
/// Dekodierfehler sind lokal und nie fatal: die Verbindung meldet die
/// Nutzlast als verworfen und laeuft weiter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Pflichtfeld fehlt
    #[error("Pflichtfeld fehlt: {0}")]
    MissingField(&'static str),

    /// Feld hat einen ungueltigen Wert oder falschen Typ
    #[error("Ungueltiger Wert fuer '{key}': {value}")]
    InvalidEnumValue { key: &'static str, value: String },

    /// `type` fehlt oder ist nicht bekannt
    #[error("Unbekannter Nachrichtentyp: {0:?}")]
    UnknownMessageType(Option<String>),

    /// Nutzlast ist kein JSON-Objekt
    #[error("Ungueltige Nutzlast: {0}")]
    MalformedPayload(String),
}

impl DecodeError {
    /// Erstellt einen Fehler fuer einen ungueltigen Feldwert
    pub fn ungueltig(key: &'static str, value: impl ToString) -> Self {
        Self::InvalidEnumValue {
            key,
            value: value.to_string(),
        }
    }

    /// Erstellt einen Fehler fuer eine unlesbare Nutzlast
    pub fn nutzlast(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }
}

impl From<sora_core::SoraError> for DecodeError {
    fn from(e: sora_core::SoraError) -> Self {
        match e {
            sora_core::SoraError::UnbekannterWert { schluessel, wert } => Self::InvalidEnumValue {
                key: schluessel,
                value: wert,
            },
            sora_core::SoraError::LeereId(schluessel) => Self::InvalidEnumValue {
                key: schluessel,
                value: String::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        assert_eq!(
            DecodeError::MissingField("sdp").to_string(),
            "Pflichtfeld fehlt: sdp"
        );
        let e = DecodeError::ungueltig("role", "sideways");
        assert!(e.to_string().contains("role"));
        assert!(e.to_string().contains("sideways"));
    }

    #[test]
    fn core_fehler_wird_ungueltiger_wert() {
        let e: DecodeError = sora_core::SoraError::unbekannt("video_codec_type", "AV1").into();
        assert_eq!(
            e,
            DecodeError::InvalidEnumValue {
                key: "video_codec_type",
                value: "AV1".into()
            }
        );
    }
}
