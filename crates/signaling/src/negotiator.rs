//! Schnittstelle zur Peer-Verhandlung
//!
//! Die eigentliche PeerConnection (ICE/DTLS/SRTP) ist ein externer
//! Mitspieler. Die Verbindung reicht Offer und Candidates weiter, holt das
//! Answer ab und reagiert auf dessen Ereignisse.

use serde_json::Value;
use thiserror::Error;

/// Ereignis des Negotiators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiatorEvent {
    /// Peer-Verbindung steht
    NegotiationComplete,
    /// Verhandlung gescheitert
    NegotiationFailed(String),
    /// Lokaler ICE-Candidate, wird als `candidate` gesendet
    LocalCandidateGenerated(String),
}

/// Fehler einer Negotiator-Operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct NegotiationError(pub String);

impl NegotiationError {
    pub fn neu(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Peer-Verhandlung fuer eine Session
pub trait PeerNegotiator: Send {
    /// Uebernimmt die `config` aus dem Offer (ICE-Server usw.)
    fn konfigurieren(&mut self, _config: &Value) -> Result<(), NegotiationError> {
        Ok(())
    }

    /// Setzt das Offer-SDP als Remote-Description
    fn set_remote_description(&mut self, sdp: &str) -> Result<(), NegotiationError>;

    /// Erzeugt das Answer-SDP
    fn create_answer(&mut self) -> Result<String, NegotiationError>;

    fn add_remote_candidate(&mut self, candidate: &str) -> Result<(), NegotiationError>;

    /// Gibt die Peer-Verbindung frei
    fn close(&mut self) {}
}

impl<N: PeerNegotiator + ?Sized> PeerNegotiator for Box<N> {
    fn konfigurieren(&mut self, config: &Value) -> Result<(), NegotiationError> {
        (**self).konfigurieren(config)
    }

    fn set_remote_description(&mut self, sdp: &str) -> Result<(), NegotiationError> {
        (**self).set_remote_description(sdp)
    }

    fn create_answer(&mut self) -> Result<String, NegotiationError> {
        (**self).create_answer()
    }

    fn add_remote_candidate(&mut self, candidate: &str) -> Result<(), NegotiationError> {
        (**self).add_remote_candidate(candidate)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
