//! sora-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt die Bausteine bereit, die Protokoll- und
//! Signaling-Crate gemeinsam nutzen: IDs, Rolle, Codecs und Fehlergruende.

pub mod error;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{Result, SoraError};
pub use types::{
    AudioCodec, ChannelId, ClientId, ConnectionId, FailureReason, Role, VideoCodec,
};
