//! Fehlertypen fuer den Signaling-Client

use sora_protocol::DecodeError;
use thiserror::Error;

use crate::state::ConnectionState;

/// Fehlertyp fuer den Signaling-Client
///
/// `ProtocolFailure`, `TransportFailure` und `NegotiationFailure` sind fatal:
/// die Verbindung wechselt genau einmal nach `Failed`. Dekodierfehler werden
/// nie als `SignalingError` weitergereicht, sondern als verworfene Nachricht
/// gemeldet.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalingError {
    /// Operation im aktuellen Zustand nicht erlaubt (Programmierfehler)
    #[error("Ungueltiger Zustandswechsel: '{operation}' im Zustand {from}")]
    InvalidStateTransition {
        from: ConnectionState,
        operation: &'static str,
    },

    /// Server hat `error` oder `signaling-failed` gesendet
    #[error("Protokollfehler: {0}")]
    ProtocolFailure(String),

    /// Transport gescheitert oder unerwartet geschlossen
    #[error("Transportfehler: {0}")]
    TransportFailure(String),

    /// Peer-Verhandlung gescheitert
    #[error("Verhandlungsfehler: {0}")]
    NegotiationFailure(String),

    /// Ungueltige Anfrage (z.B. unvollstaendige Konfiguration)
    #[error("Ungueltige Anfrage: {0}")]
    UngueltigeAnfrage(String),

    /// Dekodierfehler, nur fuer Aufrufer die selbst dekodieren
    #[error("Dekodierfehler: {0}")]
    Decode(#[from] DecodeError),

    /// Verbindungs-Task ist nicht mehr erreichbar
    #[error("Verbindungs-Task beendet")]
    Beendet,
}

impl SignalingError {
    /// Erstellt einen Fehler fuer einen unerlaubten Zustandswechsel
    pub fn zustandswechsel(from: ConnectionState, operation: &'static str) -> Self {
        Self::InvalidStateTransition { from, operation }
    }

    /// Erstellt einen Transportfehler
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportFailure(msg.into())
    }

    /// Erstellt einen Verhandlungsfehler
    pub fn verhandlung(msg: impl Into<String>) -> Self {
        Self::NegotiationFailure(msg.into())
    }

    /// Gibt true zurueck wenn der Fehler die Session beendet
    pub fn ist_fatal(&self) -> bool {
        matches!(
            self,
            Self::ProtocolFailure(_) | Self::TransportFailure(_) | Self::NegotiationFailure(_)
        )
    }
}

/// Result-Typ fuer den Signaling-Client
pub type SignalingResult<T> = Result<T, SignalingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = SignalingError::zustandswechsel(ConnectionState::Closed, "open");
        assert_eq!(
            e.to_string(),
            "Ungueltiger Zustandswechsel: 'open' im Zustand closed"
        );
    }

    #[test]
    fn fatale_fehler() {
        assert!(SignalingError::transport("reset").ist_fatal());
        assert!(SignalingError::verhandlung("sdp").ist_fatal());
        assert!(SignalingError::ProtocolFailure("AUTH".into()).ist_fatal());
        assert!(!SignalingError::Beendet.ist_fatal());
        assert!(!SignalingError::zustandswechsel(ConnectionState::Open, "open").ist_fatal());
    }
}
