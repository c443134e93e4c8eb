//! Verbindungszustand des Signaling-Clients
//!
//! ```text
//! Connecting -> Open -> PeerConnecting -> PeerOpen -> Closing -> Closed
//!      |          |            |              |
//!      +----------+------------+--------------+-----> Failed
//! ```
//!
//! `Closed` und `Failed` sind terminal, eine Instanz wird nie wiederverwendet.

use std::fmt;

/// Zustand einer Signaling-Verbindung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Initialzustand, Transport wird aufgebaut
    Connecting,
    /// Transport steht, `connect` gesendet
    Open,
    /// Offer erhalten, Answer wird erzeugt
    PeerConnecting,
    /// Peer-Verhandlung abgeschlossen
    PeerOpen,
    /// Abbau laeuft
    Closing,
    Closed,
    Failed,
}

impl ConnectionState {
    pub fn ist_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }

    /// Eingehende Candidates werden an den Negotiator weitergereicht
    pub fn nimmt_candidates_an(&self) -> bool {
        matches!(self, Self::Open | Self::PeerConnecting | Self::PeerOpen)
    }

    /// Transport steht und Nachrichten vom Server werden verarbeitet
    pub fn ist_verbunden(&self) -> bool {
        matches!(self, Self::Open | Self::PeerConnecting | Self::PeerOpen)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::PeerConnecting => "peer-connecting",
            Self::PeerOpen => "peer-open",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
