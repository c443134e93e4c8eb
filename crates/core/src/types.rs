//! Gemeinsame Identifikations- und Aufzaehlungstypen fuer Sora
//!
//! IDs verwenden das Newtype-Pattern um Verwechslungen zwischen Kanal-,
//! Client- und Verbindungs-IDs zur Compilezeit auszuschliessen. Die
//! Aufzaehlungen kennen ihre exakte Wire-Schreibweise (`as_str` / `FromStr`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SoraError;

// ---------------------------------------------------------------------------
// IDs
// ---------------------------------------------------------------------------

/// Lokale ID einer Signaling-Verbindung (nur clientseitig, nie auf dem Wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    /// Erstellt eine neue zufaellige ConnectionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection:{}", self.0)
    }
}

/// Kanal-ID wie sie der Sora-Server erwartet (frei waehlbarer String)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelId(String);

impl ChannelId {
    /// Erstellt eine ChannelId, leere IDs werden abgelehnt
    pub fn neu(id: impl Into<String>) -> Result<Self, SoraError> {
        let id = id.into();
        if id.is_empty() {
            return Err(SoraError::LeereId("channel_id"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChannelId {
    type Error = SoraError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::neu(s)
    }
}

impl From<ChannelId> for String {
    fn from(id: ChannelId) -> Self {
        id.0
    }
}

impl FromStr for ChannelId {
    type Err = SoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::neu(s)
    }
}

/// Vom Server vergebene Client-ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Rolle
// ---------------------------------------------------------------------------

/// Rolle einer Verbindung: senden (upstream) oder empfangen (downstream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Upstream,
    Downstream,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upstream => "upstream",
            Self::Downstream => "downstream",
        }
    }
}

impl FromStr for Role {
    type Err = SoraError;

    /// Gross-/Kleinschreibung wird beachtet
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upstream" => Ok(Self::Upstream),
            "downstream" => Ok(Self::Downstream),
            _ => Err(SoraError::unbekannt("role", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Codecs
// ---------------------------------------------------------------------------

/// Video-Codec, Standard ist VP8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VideoCodec {
    #[default]
    #[serde(rename = "VP8")]
    Vp8,
    #[serde(rename = "VP9")]
    Vp9,
    #[serde(rename = "H264")]
    H264,
}

impl VideoCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vp8 => "VP8",
            Self::Vp9 => "VP9",
            Self::H264 => "H264",
        }
    }
}

impl FromStr for VideoCodec {
    type Err = SoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VP8" => Ok(Self::Vp8),
            "VP9" => Ok(Self::Vp9),
            "H264" => Ok(Self::H264),
            _ => Err(SoraError::unbekannt("video_codec_type", s)),
        }
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio-Codec, derzeit nur Opus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AudioCodec {
    #[default]
    #[serde(rename = "OPUS")]
    Opus,
}

impl AudioCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opus => "OPUS",
        }
    }
}

impl FromStr for AudioCodec {
    type Err = SoraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPUS" => Ok(Self::Opus),
            _ => Err(SoraError::unbekannt("audio_codec_type", s)),
        }
    }
}

impl fmt::Display for AudioCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Fehlergrund
// ---------------------------------------------------------------------------

/// Fehlergrund in `signaling-failed` und `archive-failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    DuplicatedChannelId,
    AuthenticationFailure,
    SdpParseFailure,
    UnknownType,
}

impl FailureReason {
    /// Kanonische Wire-Schreibweise (klein)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DuplicatedChannelId => "duplicated-channel-id",
            Self::AuthenticationFailure => "authentication-failure",
            Self::SdpParseFailure => "sdp-parse-failure",
            Self::UnknownType => "unknown-type",
        }
    }
}

impl FromStr for FailureReason {
    type Err = SoraError;

    /// Akzeptiert die kleine und die vom Server genutzte grosse Schreibweise
    /// (`UNKNOWN-TYPE`), aber keine Mischformen.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let klein = if s.chars().all(|c| !c.is_ascii_lowercase()) {
            s.to_ascii_lowercase()
        } else {
            s.to_string()
        };
        match klein.as_str() {
            "duplicated-channel-id" => Ok(Self::DuplicatedChannelId),
            "authentication-failure" => Ok(Self::AuthenticationFailure),
            "sdp-parse-failure" => Ok(Self::SdpParseFailure),
            "unknown-type" => Ok(Self::UnknownType),
            _ => Err(SoraError::unbekannt("reason", s)),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
