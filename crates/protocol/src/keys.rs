//! JSON-Schluessel des Sora-Signaling-Protokolls
//!
//! Die Schreibweise ist Teil der Kompatibilitaetsflaeche und muss Byte fuer
//! Byte mit dem Server uebereinstimmen.

pub const TYPE: &str = "type";
pub const CHANNEL_ID: &str = "channel_id";
pub const CLIENT_ID: &str = "client_id";
pub const ROLE: &str = "role";
pub const ACCESS_TOKEN: &str = "access_token";
pub const SDP: &str = "sdp";
pub const CANDIDATE: &str = "candidate";
pub const CONFIG: &str = "config";
pub const VIDEO: &str = "video";
pub const AUDIO: &str = "audio";
pub const VIDEO_CODEC_TYPE: &str = "video_codec_type";
pub const AUDIO_CODEC_TYPE: &str = "audio_codec_type";
pub const DATA: &str = "data";
pub const METADATA: &str = "metadata";
pub const REASON: &str = "reason";
pub const ERROR_REASON: &str = "error_reason";
pub const MINUTES: &str = "minutes";
pub const CHANNEL_CONNECTIONS: &str = "channel_connections";
pub const UPSTREAM_CONNECTIONS: &str = "upstream_connections";
pub const DOWNSTREAM_CONNECTIONS: &str = "downstream_connections";
pub const CREATED_AT: &str = "created_at";
pub const FILE_PATH: &str = "file_path";
pub const FILE_NAME: &str = "file_name";
pub const SIZE: &str = "size";
