//! sora-signaling – Signaling-Client fuer Sora
//!
//! Dieser Crate implementiert die Client-Seite des Sora-Signalings: den
//! Zustandsautomaten einer Verbindung, die Session-Daten und die Zustellung
//! von Ereignissen an genau einen Observer. Transport (WebSocket) und
//! Peer-Verhandlung (WebRTC) sind austauschbare Mitspieler hinter Traits.
//!
//! ## Architektur
//!
//! ```text
//! SignalingHandle (open / close / Observer)
//!     |
//!     v
//! ConnectionDriver (ein Task pro Verbindung, serialisiert alles)
//!     |
//!     v
//! SignalingConnection
//!     |  State Machine: Connecting -> Open -> PeerConnecting -> PeerOpen
//!     |                 ... -> Closing -> Closed | Failed
//!     |
//!     +-- Transport       (WebSocketTransport oder eigener)
//!     +-- PeerNegotiator  (Offer/Answer, ICE-Candidates)
//!     +-- SessionState    (Rolle, Channel, Client-ID, Codecs)
//!     +-- EventDispatcher (ConnectionObserver)
//!     +-- EventLog        (Ereignisprotokoll)
//! ```

pub mod config;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod negotiator;
pub mod runtime;
pub mod session;
pub mod state;
pub mod transport;
pub mod ws;

// Bequeme Re-Exporte
pub use config::SignalingConfig;
pub use connection::SignalingConnection;
pub use dispatcher::{
    ConnectionObserver, DiscardReason, DiscardedMessage, DiscardedPayload, EventDispatcher,
    ObserverContext, ObserverToken,
};
pub use error::{SignalingError, SignalingResult};
pub use negotiator::{NegotiationError, NegotiatorEvent, PeerNegotiator};
pub use runtime::{ConnectionDriver, NegotiatorEventSender, SignalingHandle, TransportEventSender};
pub use session::{SessionStage, SessionState};
pub use state::ConnectionState;
pub use transport::{Transport, TransportError, TransportEvent};
pub use ws::{verbinden, WebSocketTransport};
