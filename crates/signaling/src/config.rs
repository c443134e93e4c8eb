//! Konfiguration des Signaling-Clients
//!
//! Wird aus einer TOML-Datei geladen. Fehlende Felder nehmen Standardwerte an.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sora_core::{AudioCodec, ChannelId, Role, VideoCodec};
use sora_observability::EventLog;
use sora_protocol::ConnectRequest;

use crate::error::{SignalingError, SignalingResult};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalingConfig {
    pub verbindung: VerbindungsConfig,
    pub logging: LoggingConfig,
    pub event_log: EventLogConfig,
}

/// Verbindung zum Sora-Server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbindungsConfig {
    /// Signaling-URL (ws:// oder wss://)
    pub url: String,
    pub role: Role,
    pub channel_id: String,
    pub access_token: Option<String>,
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    pub video: bool,
    pub audio: bool,
    /// Frei waehlbare Metadaten, werden mit `connect` gesendet
    pub metadata: Option<Value>,
    /// Keep-Alive-Ping des WebSocket-Transports, 0 = aus
    pub ping_intervall_sek: u64,
    /// Maximale Groesse einer eingehenden Nachricht in Bytes
    pub max_nachricht_bytes: usize,
}

impl Default for VerbindungsConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:5000/signaling".to_string(),
            role: Role::Downstream,
            channel_id: String::new(),
            access_token: None,
            video_codec: VideoCodec::default(),
            audio_codec: AudioCodec::default(),
            video: true,
            audio: true,
            metadata: None,
            ping_intervall_sek: 0,
            max_nachricht_bytes: sora_protocol::wire::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Logging-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log-Level (trace, debug, info, warn, error)
    pub level: String,
    /// Format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Initialisiert tracing; Umgebungsvariablen haben Vorrang
    pub fn initialisieren(&self) -> bool {
        sora_observability::logging_initialisieren(&self.level, &self.format)
    }
}

/// Einstellungen des Ereignisprotokolls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    pub aktiviert: bool,
    /// Maximale Anzahl Eintraege, ohne Angabe unbegrenzt
    pub limit: Option<usize>,
    /// Jedes Ereignis zusaetzlich ins Log schreiben
    pub debug: bool,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            aktiviert: true,
            limit: Some(1000),
            debug: false,
        }
    }
}

impl EventLogConfig {
    pub fn event_log(&self) -> EventLog {
        EventLog::mit_einstellungen(self.aktiviert, self.limit, self.debug)
    }
}

impl SignalingConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei
    ///
    /// Gibt die Standard-Konfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => Self::aus_toml(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Parst die Konfiguration aus einem TOML-String
    pub fn aus_toml(inhalt: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(inhalt)?;
        config.pruefen()?;
        Ok(config)
    }

    /// Prueft Werte, die serde nicht abdeckt
    pub fn pruefen(&self) -> anyhow::Result<()> {
        let url = &self.verbindung.url;
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            anyhow::bail!("Signaling-URL muss mit ws:// oder wss:// beginnen: {url}");
        }
        #[cfg(not(feature = "tls"))]
        if url.starts_with("wss://") {
            anyhow::bail!("wss:// erfordert das Feature `tls`: {url}");
        }
        if !sora_observability::logging::log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Ungueltiger Log-Level: {}", self.logging.level);
        }
        if !sora_observability::logging::log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Ungueltiges Log-Format: {}", self.logging.format);
        }
        Ok(())
    }

    /// Baut das Connect-Kommando aus `[verbindung]`
    pub fn connect_request(&self) -> SignalingResult<ConnectRequest> {
        let v = &self.verbindung;
        let channel_id = ChannelId::neu(v.channel_id.clone())
            .map_err(|_| SignalingError::UngueltigeAnfrage("channel_id fehlt".into()))?;

        let mut request = ConnectRequest::neu(v.role, channel_id);
        request.access_token = v.access_token.clone();
        request.video_codec = v.video_codec;
        request.audio_codec = v.audio_codec;
        request.video_enabled = v.video;
        request.audio_enabled = v.audio;
        request.metadata = v.metadata.clone();
        Ok(request)
    }
}
