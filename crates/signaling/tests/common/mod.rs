//! Gemeinsame Test-Mitspieler: aufzeichnender Transport, Negotiator und Observer

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use sora_core::{ChannelId, Role};
use sora_protocol::{AnswerMessage, ConnectRequest, ErrorResponse, Message};
use sora_signaling::{
    ConnectionObserver, ConnectionState, DiscardedMessage, NegotiationError, ObserverContext,
    PeerNegotiator, SignalingError, Transport, TransportError,
};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TransportProtokoll {
    pub geoeffnet: usize,
    pub gesendet: Vec<String>,
    pub geschlossen: usize,
}

impl TransportProtokoll {
    /// Gesendete Frames als JSON
    pub fn json(&self) -> Vec<serde_json::Value> {
        self.gesendet
            .iter()
            .map(|t| serde_json::from_str(t).unwrap())
            .collect()
    }
}

pub struct MockTransport {
    pub protokoll: Arc<Mutex<TransportProtokoll>>,
    pub open_fehler: Option<String>,
}

impl MockTransport {
    pub fn neu() -> (Self, Arc<Mutex<TransportProtokoll>>) {
        let protokoll = Arc::new(Mutex::new(TransportProtokoll::default()));
        (
            Self {
                protokoll: Arc::clone(&protokoll),
                open_fehler: None,
            },
            protokoll,
        )
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if let Some(fehler) = &self.open_fehler {
            return Err(TransportError::neu(fehler.clone()));
        }
        self.protokoll.lock().unwrap().geoeffnet += 1;
        Ok(())
    }

    fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.protokoll.lock().unwrap().gesendet.push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.protokoll.lock().unwrap().geschlossen += 1;
    }
}

// ---------------------------------------------------------------------------
// Negotiator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct NegotiatorProtokoll {
    pub konfiguration: Option<serde_json::Value>,
    pub remote_sdp: Vec<String>,
    pub remote_candidates: Vec<String>,
    pub geschlossen: usize,
}

pub struct MockNegotiator {
    pub protokoll: Arc<Mutex<NegotiatorProtokoll>>,
}

impl MockNegotiator {
    pub fn neu() -> (Self, Arc<Mutex<NegotiatorProtokoll>>) {
        let protokoll = Arc::new(Mutex::new(NegotiatorProtokoll::default()));
        (
            Self {
                protokoll: Arc::clone(&protokoll),
            },
            protokoll,
        )
    }
}

impl PeerNegotiator for MockNegotiator {
    fn konfigurieren(&mut self, config: &serde_json::Value) -> Result<(), NegotiationError> {
        self.protokoll.lock().unwrap().konfiguration = Some(config.clone());
        Ok(())
    }

    fn set_remote_description(&mut self, sdp: &str) -> Result<(), NegotiationError> {
        self.protokoll.lock().unwrap().remote_sdp.push(sdp.to_string());
        Ok(())
    }

    fn create_answer(&mut self) -> Result<String, NegotiationError> {
        Ok("v=0 answer".to_string())
    }

    fn add_remote_candidate(&mut self, candidate: &str) -> Result<(), NegotiationError> {
        if candidate == "kaputt" {
            return Err(NegotiationError::neu("Candidate nicht parsebar"));
        }
        self.protokoll
            .lock()
            .unwrap()
            .remote_candidates
            .push(candidate.to_string());
        Ok(())
    }

    fn close(&mut self) {
        self.protokoll.lock().unwrap().geschlossen += 1;
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Mitschrift aller Benachrichtigungen in Aufrufreihenfolge
#[derive(Debug, Clone, PartialEq)]
pub enum Beobachtung {
    Open,
    Zustand(ConnectionState, ConnectionState),
    Nachricht(String),
    Verworfen(String),
    Fehlerantwort(String),
    Fehler(SignalingError),
    Pong(Vec<u8>),
    Zaehler(u64),
}

#[derive(Default)]
pub struct MockObserver {
    pub mitschrift: Arc<Mutex<Vec<Beobachtung>>>,
    /// In `on_open` close anfordern
    pub close_bei_open: bool,
    /// Answer-SDP ersetzen
    pub answer_sdp: Option<String>,
}

impl MockObserver {
    pub fn neu() -> (Self, Arc<Mutex<Vec<Beobachtung>>>) {
        let observer = Self::default();
        let mitschrift = Arc::clone(&observer.mitschrift);
        (observer, mitschrift)
    }

    fn notieren(&self, b: Beobachtung) {
        self.mitschrift.lock().unwrap().push(b);
    }
}

impl ConnectionObserver for MockObserver {
    fn on_error_response(&mut self, _ctx: &mut ObserverContext<'_>, error: &ErrorResponse) {
        self.notieren(Beobachtung::Fehlerantwort(error.reason.clone()));
    }

    fn on_failure(&mut self, _ctx: &mut ObserverContext<'_>, fehler: &SignalingError) {
        self.notieren(Beobachtung::Fehler(fehler.clone()));
    }

    fn on_open(&mut self, ctx: &mut ObserverContext<'_>) {
        self.notieren(Beobachtung::Open);
        if self.close_bei_open {
            ctx.close();
        }
    }

    fn on_state_changed(
        &mut self,
        _ctx: &mut ObserverContext<'_>,
        von: ConnectionState,
        nach: ConnectionState,
    ) {
        self.notieren(Beobachtung::Zustand(von, nach));
    }

    fn on_message(&mut self, _ctx: &mut ObserverContext<'_>, nachricht: &Message) {
        self.notieren(Beobachtung::Nachricht(nachricht.message_type().to_string()));
    }

    fn on_discarded(&mut self, _ctx: &mut ObserverContext<'_>, verworfen: &DiscardedMessage) {
        self.notieren(Beobachtung::Verworfen(format!("{:?}", verworfen.reason)));
    }

    fn will_send_answer(
        &mut self,
        _ctx: &mut ObserverContext<'_>,
        mut answer: AnswerMessage,
    ) -> AnswerMessage {
        if let Some(sdp) = &self.answer_sdp {
            answer.sdp = sdp.clone();
        }
        answer
    }

    fn on_pong(&mut self, _ctx: &mut ObserverContext<'_>, payload: &[u8]) {
        self.notieren(Beobachtung::Pong(payload.to_vec()));
    }

    fn on_connection_counts(
        &mut self,
        _ctx: &mut ObserverContext<'_>,
        counts: &sora_protocol::ConnectionCounts,
    ) {
        self.notieren(Beobachtung::Zaehler(counts.channel_connections));
    }
}

pub fn request(role: Role, channel: &str) -> ConnectRequest {
    ConnectRequest::neu(role, ChannelId::neu(channel).unwrap())
}

/// Anzahl der Mitschrift-Eintraege, die `pred` erfuellen
pub fn zaehlen(
    mitschrift: &Arc<Mutex<Vec<Beobachtung>>>,
    pred: impl Fn(&Beobachtung) -> bool,
) -> usize {
    mitschrift.lock().unwrap().iter().filter(|b| pred(b)).count()
}
