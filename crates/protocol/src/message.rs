//! Nachrichtenmodell des Sora-Signaling-Protokolls
//!
//! Alle Nachrichten bilden eine einzige getaggte Union [`Message`]. Felder,
//! die mehrere Nachrichtenarten gemeinsam haben (Rolle/Client/Kanal bei den
//! Streaming-Nachrichten, Verbindungszahlen bei `signaling-connected` und
//! `signaling-updated`), liegen in eigenen Structs und sind ueber
//! [`Message::streaming`] und [`Message::connection_counts`] erreichbar.
//!
//! Jede Nachricht traegt zusaetzlich `optional_items`: alle JSON-Felder, die
//! der Codec nicht kennt. Sie werden beim Dekodieren unveraendert uebernommen
//! und beim Enkodieren wieder ausgegeben.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sora_core::{AudioCodec, ChannelId, ClientId, FailureReason, Role, VideoCodec};

/// Unbekannte JSON-Felder einer Nachricht
pub type OptionalItems = Map<String, Value>;

// ---------------------------------------------------------------------------
// Nachrichtentyp
// ---------------------------------------------------------------------------

/// Geschlossene Menge der `type`-Werte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Connect,
    Offer,
    Answer,
    Candidate,
    Error,
    SignalingConnected,
    SignalingUpdated,
    SignalingDisconnected,
    SignalingFailed,
    ArchiveFinished,
    ArchiveFailed,
    TransportEncrypted,
}

impl MessageType {
    /// Alle Nachrichtentypen in Protokollreihenfolge
    pub const ALLE: [MessageType; 12] = [
        Self::Connect,
        Self::Offer,
        Self::Answer,
        Self::Candidate,
        Self::Error,
        Self::SignalingConnected,
        Self::SignalingUpdated,
        Self::SignalingDisconnected,
        Self::SignalingFailed,
        Self::ArchiveFinished,
        Self::ArchiveFailed,
        Self::TransportEncrypted,
    ];

    /// Feste Wire-Schreibweise des Typs
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::Candidate => "candidate",
            Self::Error => "error",
            Self::SignalingConnected => "signaling-connected",
            Self::SignalingUpdated => "signaling-updated",
            Self::SignalingDisconnected => "signaling-disconnected",
            Self::SignalingFailed => "signaling-failed",
            Self::ArchiveFinished => "archive-finished",
            Self::ArchiveFailed => "archive-failed",
            Self::TransportEncrypted => "transport-encrypted",
        }
    }

    /// Sucht den Typ zu einem Wire-Namen
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALLE.into_iter().find(|t| t.wire_name() == name)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// Client -> Server
// ---------------------------------------------------------------------------

/// `connect`-Kommando
///
/// Rolle und Kanal sind nach dem Senden fuer die Session unveraenderlich.
/// Codec- und Medien-Felder werden immer gesendet, auch mit Standardwerten.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectRequest {
    pub role: Role,
    pub channel_id: ChannelId,
    pub access_token: Option<String>,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub video_enabled: bool,
    pub audio_enabled: bool,
    /// Frei waehlbare Metadaten fuer den Auth-Webhook
    pub metadata: Option<Value>,
    pub optional_items: OptionalItems,
}

impl ConnectRequest {
    /// Erstellt ein Connect-Kommando mit Standard-Codecs und aktivierten Medien
    pub fn neu(role: Role, channel_id: ChannelId) -> Self {
        Self {
            role,
            channel_id,
            access_token: None,
            video_codec: VideoCodec::default(),
            audio_codec: AudioCodec::default(),
            video_enabled: true,
            audio_enabled: true,
            metadata: None,
            optional_items: OptionalItems::new(),
        }
    }

    pub fn mit_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn mit_video_codec(mut self, codec: VideoCodec) -> Self {
        self.video_codec = codec;
        self
    }

    pub fn mit_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// `answer`-Kommando
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerMessage {
    pub sdp: String,
    pub optional_items: OptionalItems,
}

impl AnswerMessage {
    pub fn neu(sdp: impl Into<String>) -> Self {
        Self {
            sdp: sdp.into(),
            optional_items: OptionalItems::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server -> Client
// ---------------------------------------------------------------------------

/// `offer` vom Server, genau einmal pro Session direkt nach `connect`
#[derive(Debug, Clone, PartialEq)]
pub struct OfferMessage {
    pub client_id: ClientId,
    pub sdp: String,
    /// Verhandlungs-Konfiguration (ICE-Server usw.), vom Negotiator ausgewertet
    pub config: Option<Value>,
    pub optional_items: OptionalItems,
}

/// `candidate` in beide Richtungen
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMessage {
    pub candidate: String,
    pub optional_items: OptionalItems,
}

impl CandidateMessage {
    pub fn neu(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            optional_items: OptionalItems::new(),
        }
    }
}

/// `error` vom Server, fuer den Client immer terminal
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub reason: String,
    pub verbose_reason: Option<String>,
    pub optional_items: OptionalItems,
}

/// Gemeinsame Felder aller Streaming-Nachrichten
#[derive(Debug, Clone, PartialEq)]
pub struct StreamingInfo {
    pub role: Role,
    pub client_id: ClientId,
    pub channel_id: ChannelId,
}

/// Verbindungszahlen aus `signaling-connected` / `signaling-updated`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionCounts {
    /// Verstrichene Minuten seit Verbindungsaufbau
    pub minutes: u64,
    pub channel_connections: u64,
    pub upstream_connections: u64,
    pub downstream_connections: u64,
}

/// `signaling-connected` und `signaling-updated`
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingStatus {
    pub streaming: StreamingInfo,
    pub counts: ConnectionCounts,
    pub optional_items: OptionalItems,
}

/// `signaling-disconnected`
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingDisconnected {
    pub streaming: StreamingInfo,
    pub optional_items: OptionalItems,
}

/// `signaling-failed`
#[derive(Debug, Clone, PartialEq)]
pub struct SignalingFailed {
    pub streaming: StreamingInfo,
    pub reason: FailureReason,
    pub optional_items: OptionalItems,
}

/// `archive-finished`: Aufzeichnung abgeschlossen
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveFinished {
    pub streaming: StreamingInfo,
    pub created_at: DateTime<Utc>,
    pub file_path: String,
    pub file_name: String,
    /// Dateigroesse in Bytes
    pub size: u64,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub optional_items: OptionalItems,
}

/// `archive-failed`
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveFailed {
    pub client_id: ClientId,
    pub channel_id: ChannelId,
    pub reason: FailureReason,
    pub optional_items: OptionalItems,
}

/// `transport-encrypted`, ohne eigene Felder
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransportEncrypted {
    pub optional_items: OptionalItems,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Jede Signaling-Nachricht, getaggt nach `type`
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Connect(ConnectRequest),
    Offer(OfferMessage),
    Answer(AnswerMessage),
    Candidate(CandidateMessage),
    Error(ErrorResponse),
    SignalingConnected(SignalingStatus),
    SignalingUpdated(SignalingStatus),
    SignalingDisconnected(SignalingDisconnected),
    SignalingFailed(SignalingFailed),
    ArchiveFinished(ArchiveFinished),
    ArchiveFailed(ArchiveFailed),
    TransportEncrypted(TransportEncrypted),
}

impl Message {
    /// Diskriminante der Nachricht
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::Connect(_) => MessageType::Connect,
            Self::Offer(_) => MessageType::Offer,
            Self::Answer(_) => MessageType::Answer,
            Self::Candidate(_) => MessageType::Candidate,
            Self::Error(_) => MessageType::Error,
            Self::SignalingConnected(_) => MessageType::SignalingConnected,
            Self::SignalingUpdated(_) => MessageType::SignalingUpdated,
            Self::SignalingDisconnected(_) => MessageType::SignalingDisconnected,
            Self::SignalingFailed(_) => MessageType::SignalingFailed,
            Self::ArchiveFinished(_) => MessageType::ArchiveFinished,
            Self::ArchiveFailed(_) => MessageType::ArchiveFailed,
            Self::TransportEncrypted(_) => MessageType::TransportEncrypted,
        }
    }

    /// Nicht erkannte Felder der Nachricht
    pub fn optional_items(&self) -> &OptionalItems {
        match self {
            Self::Connect(m) => &m.optional_items,
            Self::Offer(m) => &m.optional_items,
            Self::Answer(m) => &m.optional_items,
            Self::Candidate(m) => &m.optional_items,
            Self::Error(m) => &m.optional_items,
            Self::SignalingConnected(m) | Self::SignalingUpdated(m) => &m.optional_items,
            Self::SignalingDisconnected(m) => &m.optional_items,
            Self::SignalingFailed(m) => &m.optional_items,
            Self::ArchiveFinished(m) => &m.optional_items,
            Self::ArchiveFailed(m) => &m.optional_items,
            Self::TransportEncrypted(m) => &m.optional_items,
        }
    }

    pub fn optional_items_mut(&mut self) -> &mut OptionalItems {
        match self {
            Self::Connect(m) => &mut m.optional_items,
            Self::Offer(m) => &mut m.optional_items,
            Self::Answer(m) => &mut m.optional_items,
            Self::Candidate(m) => &mut m.optional_items,
            Self::Error(m) => &mut m.optional_items,
            Self::SignalingConnected(m) | Self::SignalingUpdated(m) => &mut m.optional_items,
            Self::SignalingDisconnected(m) => &mut m.optional_items,
            Self::SignalingFailed(m) => &mut m.optional_items,
            Self::ArchiveFinished(m) => &mut m.optional_items,
            Self::ArchiveFailed(m) => &mut m.optional_items,
            Self::TransportEncrypted(m) => &mut m.optional_items,
        }
    }

    /// Rolle, Client und Kanal bei Streaming-Nachrichten
    pub fn streaming(&self) -> Option<&StreamingInfo> {
        match self {
            Self::SignalingConnected(m) | Self::SignalingUpdated(m) => Some(&m.streaming),
            Self::SignalingDisconnected(m) => Some(&m.streaming),
            Self::SignalingFailed(m) => Some(&m.streaming),
            Self::ArchiveFinished(m) => Some(&m.streaming),
            _ => None,
        }
    }

    /// Verbindungszahlen bei `signaling-connected` / `signaling-updated`
    pub fn connection_counts(&self) -> Option<&ConnectionCounts> {
        match self {
            Self::SignalingConnected(m) | Self::SignalingUpdated(m) => Some(&m.counts),
            _ => None,
        }
    }

    /// Fehlergrund bei `signaling-failed` / `archive-failed`
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::SignalingFailed(m) => Some(m.reason),
            Self::ArchiveFailed(m) => Some(m.reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming() -> StreamingInfo {
        StreamingInfo {
            role: Role::Upstream,
            client_id: ClientId::from("c1"),
            channel_id: ChannelId::neu("room-1").unwrap(),
        }
    }

    #[test]
    fn wire_namen_eindeutig_und_umkehrbar() {
        for typ in MessageType::ALLE {
            assert_eq!(MessageType::from_wire(typ.wire_name()), Some(typ));
        }
        assert_eq!(MessageType::from_wire("ping"), None);
        assert_eq!(MessageType::from_wire("Offer"), None);
    }

    #[test]
    fn connect_standardwerte() {
        let req = ConnectRequest::neu(Role::Downstream, ChannelId::neu("room-1").unwrap());
        assert_eq!(req.video_codec, VideoCodec::Vp8);
        assert_eq!(req.audio_codec, AudioCodec::Opus);
        assert!(req.video_enabled);
        assert!(req.audio_enabled);
        assert!(req.access_token.is_none());
    }

    #[test]
    fn gemeinsame_zugriffe() {
        let status = Message::SignalingUpdated(SignalingStatus {
            streaming: streaming(),
            counts: ConnectionCounts {
                minutes: 3,
                channel_connections: 2,
                upstream_connections: 1,
                downstream_connections: 1,
            },
            optional_items: OptionalItems::new(),
        });
        assert_eq!(status.message_type(), MessageType::SignalingUpdated);
        assert_eq!(status.streaming().unwrap().client_id.as_str(), "c1");
        assert_eq!(status.connection_counts().unwrap().minutes, 3);
        assert!(status.failure_reason().is_none());

        let failed = Message::SignalingFailed(SignalingFailed {
            streaming: streaming(),
            reason: FailureReason::AuthenticationFailure,
            optional_items: OptionalItems::new(),
        });
        assert!(failed.connection_counts().is_none());
        assert_eq!(
            failed.failure_reason(),
            Some(FailureReason::AuthenticationFailure)
        );

        let answer = Message::Answer(AnswerMessage::neu("v=0"));
        assert!(answer.streaming().is_none());
    }
}
