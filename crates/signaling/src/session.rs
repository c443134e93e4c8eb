//! Session-Zustand einer Signaling-Verbindung
//!
//! Haelt Identitaet (Rolle, Kanal, Client-ID) und verhandelte Parameter
//! einer Session. Nur die [`SignalingConnection`](crate::SignalingConnection)
//! veraendert ihn; nach aussen gibt es ausschliesslich Lesezugriffe.
//!
//! ## Phasen
//! ```text
//! Unopened --offer--> Negotiating --answer gesendet--> Active
//! ```

use sora_core::{AudioCodec, ChannelId, ClientId, Role, VideoCodec};
use sora_protocol::ConnectRequest;

use crate::error::{SignalingError, SignalingResult};
use crate::state::ConnectionState;

/// Phase der Session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStage {
    /// Rolle/Kanal gesetzt, noch keine Client-ID
    Unopened,
    /// Client-ID aus dem Offer, Answer noch nicht gesendet
    Negotiating,
    /// Answer gesendet, Candidates duerfen fliessen
    Active,
}

/// Zustand einer Session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    role: Role,
    channel_id: ChannelId,
    client_id: Option<ClientId>,
    video_codec: VideoCodec,
    audio_codec: AudioCodec,
    video_enabled: bool,
    audio_enabled: bool,
    stage: SessionStage,
    /// Lokale Candidates, die vor dem Answer entstanden sind
    vorgemerkte_candidates: Vec<String>,
}

impl SessionState {
    /// Erstellt den Zustand aus dem gesendeten Connect-Kommando
    pub(crate) fn neu(request: &ConnectRequest) -> Self {
        Self {
            role: request.role,
            channel_id: request.channel_id.clone(),
            client_id: None,
            video_codec: request.video_codec,
            audio_codec: request.audio_codec,
            video_enabled: request.video_enabled,
            audio_enabled: request.audio_enabled,
            stage: SessionStage::Unopened,
            vorgemerkte_candidates: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Client-ID, erst nach dem Offer gesetzt
    pub fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    pub fn video_codec(&self) -> VideoCodec {
        self.video_codec
    }

    pub fn audio_codec(&self) -> AudioCodec {
        self.audio_codec
    }

    pub fn video_enabled(&self) -> bool {
        self.video_enabled
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn stage(&self) -> SessionStage {
        self.stage
    }

    /// Lokale Candidates duerfen direkt gesendet werden
    pub fn candidates_erlaubt(&self) -> bool {
        self.stage == SessionStage::Active
    }

    pub fn vorgemerkte_candidates(&self) -> &[String] {
        &self.vorgemerkte_candidates
    }

    // -----------------------------------------------------------------------
    // Mutationen (nur durch die Verbindung)
    // -----------------------------------------------------------------------

    /// Unopened -> Negotiating; die Client-ID ist danach unveraenderlich
    pub(crate) fn offer_erhalten(
        &mut self,
        client_id: ClientId,
        zustand: ConnectionState,
    ) -> SignalingResult<()> {
        if self.stage != SessionStage::Unopened {
            return Err(SignalingError::zustandswechsel(zustand, "offer"));
        }
        self.client_id = Some(client_id);
        self.stage = SessionStage::Negotiating;
        Ok(())
    }

    /// Negotiating -> Active
    pub(crate) fn answer_gesendet(&mut self, zustand: ConnectionState) -> SignalingResult<()> {
        if self.stage != SessionStage::Negotiating {
            return Err(SignalingError::zustandswechsel(zustand, "answer"));
        }
        self.stage = SessionStage::Active;
        Ok(())
    }

    pub(crate) fn candidate_vormerken(&mut self, candidate: String) {
        self.vorgemerkte_candidates.push(candidate);
    }

    /// Entnimmt alle vorgemerkten Candidates in Erzeugungsreihenfolge
    pub(crate) fn vorgemerkte_entnehmen(&mut self) -> Vec<String> {
        std::mem::take(&mut self.vorgemerkte_candidates)
    }
}
