//! sora-protocol – Nachrichtenmodell des Sora-Signalings
//!
//! Dieses Crate definiert alle Nachrichten, die zwischen Client und
//! Sora-Server ueber den Signaling-Kanal ausgetauscht werden, sowie den
//! JSON-Codec in beide Richtungen. Es haelt keinen Zustand.

pub mod codec;
pub mod error;
pub mod keys;
pub mod message;
pub mod wire;

pub use codec::{decode, encode};
pub use error::{DecodeError, DecodeResult};
pub use message::{
    AnswerMessage, ArchiveFailed, ArchiveFinished, CandidateMessage, ConnectRequest,
    ConnectionCounts, ErrorResponse, Message, MessageType, OfferMessage, OptionalItems,
    SignalingDisconnected, SignalingFailed, SignalingStatus, StreamingInfo, TransportEncrypted,
};
pub use wire::{decode_text, encode_text};
