//! Signaling-Verbindung – State Machine einer einzelnen Session
//!
//! `SignalingConnection` verarbeitet Transport-Ereignisse, Nachrichten vom
//! Server, Negotiator-Ereignisse und Kommandos des Aufrufers streng
//! nacheinander. Sie ist selbst synchron; die Serialisierung uebernimmt der
//! Aufrufer oder der [`ConnectionDriver`](crate::runtime::ConnectionDriver).
//!
//! ## State Machine
//! ```text
//! open()                 Connected             offer
//!   |                        |                   |
//! Connecting ------------> Open ------------> PeerConnecting
//!                                                 | NegotiationComplete
//!                                                 v
//!   close(): * -> Closing -> Closed            PeerOpen
//!   error / signaling-failed / Transport- oder Verhandlungsfehler: * -> Failed
//! ```
//!
//! ## Verworfene Nachrichten
//! Nicht dekodierbare Nutzlast, Binaer-Frames und Nachrichten, die im
//! aktuellen Zustand nicht erlaubt sind (z.B. ein zweites Offer), aendern den
//! Zustand nicht und werden nur ueber `on_discarded` gemeldet.

use sora_core::ConnectionId;
use sora_observability::{EventLog, EventTyp};
use sora_protocol::{
    wire, AnswerMessage, CandidateMessage, ConnectRequest, ErrorResponse, Message, MessageType,
    OfferMessage,
};

use crate::dispatcher::{
    ConnectionObserver, DiscardReason, DiscardedMessage, DiscardedPayload, EventDispatcher,
    ObserverContext, ObserverToken,
};
use crate::error::{SignalingError, SignalingResult};
use crate::negotiator::{NegotiatorEvent, PeerNegotiator};
use crate::session::{SessionStage, SessionState};
use crate::state::ConnectionState;
use crate::transport::{Transport, TransportEvent};

/// Ursache eines fatalen Fehlers
enum Fatal {
    /// `error`-Nachricht vom Server
    Fehlerantwort(ErrorResponse),
    Fehler(SignalingError),
}

// ---------------------------------------------------------------------------
// SignalingConnection
// ---------------------------------------------------------------------------

/// Eine Signaling-Session von `open` bis `close`
///
/// Eine Instanz wird nie wiederverwendet: nach `Closed` oder `Failed` ist
/// fuer eine neue Verbindung eine neue Instanz noetig.
pub struct SignalingConnection<T, N> {
    id: ConnectionId,
    zustand: ConnectionState,
    /// `open` wurde bereits aufgerufen
    geoeffnet: bool,
    transport: T,
    negotiator: N,
    session: Option<SessionState>,
    /// Connect-Kommando, bis der Transport bereit ist
    connect: Option<ConnectRequest>,
    dispatcher: EventDispatcher,
    event_log: EventLog,
    close_angefordert: bool,
    letzter_fehler: Option<SignalingError>,
    /// Obergrenze fuer eingehende Text-Frames in Bytes
    max_nachricht_bytes: usize,
}

impl<T, N> SignalingConnection<T, N>
where
    T: Transport,
    N: PeerNegotiator,
{
    /// Erstellt eine neue Verbindung im Zustand `Connecting`
    pub fn neu(transport: T, negotiator: N) -> Self {
        Self::mit_event_log(transport, negotiator, EventLog::neu())
    }

    /// Erstellt eine neue Verbindung mit vorkonfiguriertem Ereignisprotokoll
    pub fn mit_event_log(transport: T, negotiator: N, event_log: EventLog) -> Self {
        Self {
            id: ConnectionId::new(),
            zustand: ConnectionState::Connecting,
            geoeffnet: false,
            transport,
            negotiator,
            session: None,
            connect: None,
            dispatcher: EventDispatcher::neu(),
            event_log,
            close_angefordert: false,
            letzter_fehler: None,
            max_nachricht_bytes: wire::DEFAULT_MAX_MESSAGE_SIZE,
        }
    }

    /// Setzt die Groessengrenze fuer eingehende Nachrichten
    pub fn set_max_nachricht_bytes(&mut self, max: usize) {
        self.max_nachricht_bytes = max;
    }

    // -----------------------------------------------------------------------
    // Lesezugriffe
    // -----------------------------------------------------------------------

    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.zustand
    }

    /// Session, solange die Verbindung geoeffnet und nicht terminal ist
    pub fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Fehler, der die Verbindung nach `Failed` gebracht hat
    pub fn letzter_fehler(&self) -> Option<&SignalingError> {
        self.letzter_fehler.as_ref()
    }

    // -----------------------------------------------------------------------
    // Observer
    // -----------------------------------------------------------------------

    pub fn set_observer(&mut self, observer: Box<dyn ConnectionObserver>) -> ObserverToken {
        self.dispatcher.set_observer(observer)
    }

    pub fn remove_observer(&mut self, token: ObserverToken) -> bool {
        self.dispatcher.remove_observer(token)
    }

    // -----------------------------------------------------------------------
    // Kommandos
    // -----------------------------------------------------------------------

    /// Startet die Session
    ///
    /// Nur einmal pro Instanz erlaubt. Das Connect-Kommando geht raus, sobald
    /// der Transport [`TransportEvent::Connected`] meldet.
    pub fn open(&mut self, request: ConnectRequest) -> SignalingResult<()> {
        if self.geoeffnet || self.zustand != ConnectionState::Connecting {
            let fehler = SignalingError::zustandswechsel(self.zustand, "open");
            tracing::warn!(connection = %self.id, fehler = %fehler, "open abgelehnt");
            return Err(fehler);
        }

        tracing::info!(
            connection = %self.id,
            role = %request.role,
            channel_id = %request.channel_id,
            "Signaling-Verbindung wird geoeffnet"
        );
        self.geoeffnet = true;
        self.session = Some(SessionState::neu(&request));
        self.connect = Some(request);
        self.event_log.markieren(EventTyp::WebSocket, "Verbindungsaufbau");

        if let Err(e) = self.transport.open() {
            let fehler = SignalingError::transport(e.0);
            self.fatal(Fatal::Fehler(fehler.clone()));
            self.nachlauf();
            return Err(fehler);
        }
        Ok(())
    }

    /// Baut die Verbindung ab
    ///
    /// In terminalen Zustaenden ein No-op. Aus Observer-Callbacks heraus
    /// [`ObserverContext::close`] verwenden.
    pub fn close(&mut self) {
        if self.zustand.ist_terminal() || self.zustand == ConnectionState::Closing {
            tracing::debug!(connection = %self.id, zustand = %self.zustand, "close ignoriert");
            return;
        }

        tracing::info!(connection = %self.id, zustand = %self.zustand, "Verbindung wird geschlossen");
        self.zustand_setzen(ConnectionState::Closing);
        self.abbauen();
        self.zustand_setzen(ConnectionState::Closed);
        self.event_log.markieren(EventTyp::WebSocket, "geschlossen");
        self.session = None;
        self.connect = None;
        self.close_angefordert = false;
    }

    // -----------------------------------------------------------------------
    // Ereignisse
    // -----------------------------------------------------------------------

    /// Verarbeitet ein Ereignis des Transports
    pub fn transport_ereignis(&mut self, ereignis: TransportEvent) {
        match ereignis {
            TransportEvent::Connected => self.transport_verbunden(),
            TransportEvent::Text(text) => self.text_empfangen(text),
            TransportEvent::Binary(daten) => {
                if self.zustand.ist_verbunden() {
                    self.verwerfen(DiscardReason::Binary, DiscardedPayload::Binary(daten));
                }
            }
            TransportEvent::Pong(payload) => {
                if !self.zustand.ist_terminal() {
                    tracing::trace!(connection = %self.id, "Pong empfangen");
                    self.benachrichtigen(|o, ctx| o.on_pong(ctx, &payload));
                }
            }
            TransportEvent::Failed(grund) => {
                self.event_log
                    .markieren(EventTyp::WebSocket, format!("Fehler: {grund}"));
                self.fatal(Fatal::Fehler(SignalingError::transport(grund)));
            }
            TransportEvent::Closed => {
                if !self.zustand.ist_terminal() {
                    self.event_log
                        .markieren(EventTyp::WebSocket, "unerwartet geschlossen");
                    self.fatal(Fatal::Fehler(SignalingError::transport(
                        "Transport unerwartet geschlossen",
                    )));
                }
            }
        }
        self.nachlauf();
    }

    /// Verarbeitet ein Ereignis des Negotiators
    pub fn negotiator_ereignis(&mut self, ereignis: NegotiatorEvent) {
        if self.zustand.ist_terminal() {
            tracing::trace!(connection = %self.id, ereignis = ?ereignis, "Negotiator-Ereignis nach Ende");
            return;
        }

        match ereignis {
            NegotiatorEvent::NegotiationComplete => {
                if self.zustand == ConnectionState::PeerConnecting {
                    self.event_log
                        .markieren(EventTyp::PeerConnection, "Verhandlung abgeschlossen");
                    self.zustand_setzen(ConnectionState::PeerOpen);
                } else {
                    tracing::debug!(
                        connection = %self.id,
                        zustand = %self.zustand,
                        "NegotiationComplete ausserhalb von peer-connecting"
                    );
                }
            }
            NegotiatorEvent::NegotiationFailed(grund) => {
                self.event_log
                    .markieren(EventTyp::PeerConnection, format!("Fehler: {grund}"));
                self.fatal(Fatal::Fehler(SignalingError::verhandlung(grund)));
            }
            NegotiatorEvent::LocalCandidateGenerated(candidate) => {
                self.lokaler_candidate(candidate);
            }
        }
        self.nachlauf();
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn transport_verbunden(&mut self) {
        if !self.geoeffnet || self.zustand != ConnectionState::Connecting {
            tracing::warn!(connection = %self.id, zustand = %self.zustand, "Unerwartetes Connected");
            return;
        }
        let Some(request) = self.connect.take() else {
            return;
        };

        self.event_log.markieren(EventTyp::WebSocket, "verbunden");
        if let Err(e) = self.senden(&Message::Connect(request)) {
            self.fatal(Fatal::Fehler(e));
            return;
        }
        self.event_log.markieren(EventTyp::Signaling, "connect gesendet");
        self.zustand_setzen(ConnectionState::Open);
        self.benachrichtigen(|o, ctx| o.on_open(ctx));
    }

    fn senden(&mut self, nachricht: &Message) -> SignalingResult<()> {
        let text = wire::encode_text(nachricht);
        tracing::trace!(
            connection = %self.id,
            typ = %nachricht.message_type(),
            laenge = text.len(),
            "Nachricht senden"
        );
        self.transport
            .send(text)
            .map_err(|e| SignalingError::transport(e.0))
    }

    fn abbauen(&mut self) {
        if self.geoeffnet {
            self.transport.close();
        }
        self.negotiator.close();
    }

    // -----------------------------------------------------------------------
    // Eingehende Nachrichten
    // -----------------------------------------------------------------------

    fn text_empfangen(&mut self, text: String) {
        if self.zustand.ist_terminal() || self.zustand == ConnectionState::Closing {
            tracing::trace!(connection = %self.id, "Nachricht nach Ende ignoriert");
            return;
        }

        let nachricht = match wire::decode_text_begrenzt(&text, self.max_nachricht_bytes) {
            Ok(n) => n,
            Err(e) => {
                self.verwerfen(DiscardReason::Decode(e), DiscardedPayload::Text(text));
                return;
            }
        };

        let typ = nachricht.message_type();
        if !self.nachricht_erlaubt(typ) {
            self.verwerfen(
                DiscardReason::UnexpectedInState {
                    message_type: typ,
                    state: self.zustand,
                },
                DiscardedPayload::Text(text),
            );
            return;
        }

        tracing::debug!(connection = %self.id, typ = %typ, "Nachricht empfangen");
        self.event_log
            .markieren(EventTyp::Signaling, format!("{typ} empfangen"));
        self.benachrichtigen(|o, ctx| o.on_message(ctx, &nachricht));

        match nachricht {
            Message::Offer(offer) => self.offer_verarbeiten(offer),
            Message::Candidate(candidate) => self.remote_candidate(candidate),
            Message::Error(antwort) => self.fatal(Fatal::Fehlerantwort(antwort)),
            Message::SignalingFailed(fehlschlag) => {
                self.benachrichtigen(|o, ctx| o.on_signaling_failed(ctx, &fehlschlag));
                self.fatal(Fatal::Fehler(SignalingError::ProtocolFailure(
                    fehlschlag.reason.as_str().to_string(),
                )));
            }
            Message::SignalingConnected(status) | Message::SignalingUpdated(status) => {
                self.benachrichtigen(|o, ctx| o.on_connection_counts(ctx, &status.counts));
            }
            _ => {}
        }
    }

    /// Darf ein Nachrichtentyp im aktuellen Zustand verarbeitet werden?
    fn nachricht_erlaubt(&self, typ: MessageType) -> bool {
        // Fehlermeldungen des Servers gelten in jedem nicht-terminalen Zustand
        if matches!(typ, MessageType::Error | MessageType::SignalingFailed) {
            return !self.zustand.ist_terminal();
        }
        if !self.zustand.ist_verbunden() {
            return false;
        }
        match typ {
            MessageType::Offer => self.zustand == ConnectionState::Open,
            MessageType::Candidate => self.zustand.nimmt_candidates_an(),
            // Nur Client -> Server
            MessageType::Connect | MessageType::Answer => false,
            _ => true,
        }
    }

    fn verwerfen(&mut self, reason: DiscardReason, payload: DiscardedPayload) {
        tracing::warn!(
            connection = %self.id,
            zustand = %self.zustand,
            grund = ?reason,
            "Nachricht verworfen"
        );
        self.event_log
            .markieren(EventTyp::Signaling, "Nachricht verworfen");
        let verworfen = DiscardedMessage { reason, payload };
        self.benachrichtigen(|o, ctx| o.on_discarded(ctx, &verworfen));
    }

    // -----------------------------------------------------------------------
    // Peer-Verhandlung
    // -----------------------------------------------------------------------

    fn offer_verarbeiten(&mut self, offer: OfferMessage) {
        let zustand = self.zustand;
        let ergebnis = match self.session.as_mut() {
            Some(session) => session.offer_erhalten(offer.client_id.clone(), zustand),
            None => Err(SignalingError::zustandswechsel(zustand, "offer")),
        };
        if let Err(e) = ergebnis {
            tracing::warn!(connection = %self.id, fehler = %e, "Offer ignoriert");
            return;
        }

        tracing::info!(connection = %self.id, client_id = %offer.client_id, "Offer erhalten");
        self.zustand_setzen(ConnectionState::PeerConnecting);
        self.benachrichtigen(|o, ctx| o.on_offer(ctx, &offer));

        if let Err(e) = self.answer_senden(&offer) {
            self.fatal(Fatal::Fehler(e));
        }
    }

    fn answer_senden(&mut self, offer: &OfferMessage) -> SignalingResult<()> {
        if let Some(config) = &offer.config {
            self.negotiator
                .konfigurieren(config)
                .map_err(|e| SignalingError::verhandlung(e.0))?;
        }
        self.negotiator
            .set_remote_description(&offer.sdp)
            .map_err(|e| SignalingError::verhandlung(e.0))?;
        self.event_log
            .markieren(EventTyp::PeerConnection, "Remote-Description gesetzt");

        let sdp = self
            .negotiator
            .create_answer()
            .map_err(|e| SignalingError::verhandlung(e.0))?;

        let answer = {
            let mut ctx = ObserverContext::neu(
                self.id,
                self.zustand,
                self.session.as_ref(),
                &self.event_log,
                &mut self.close_angefordert,
            );
            self.dispatcher
                .dispatch_mit(&mut ctx, AnswerMessage::neu(sdp), |o, ctx, answer| {
                    o.will_send_answer(ctx, answer)
                })
        };

        self.senden(&Message::Answer(answer))?;
        self.event_log.markieren(EventTyp::Signaling, "answer gesendet");

        let zustand = self.zustand;
        let vorgemerkt = match self.session.as_mut() {
            Some(session) => {
                session.answer_gesendet(zustand)?;
                session.vorgemerkte_entnehmen()
            }
            None => Vec::new(),
        };
        for candidate in vorgemerkt {
            self.candidate_senden(candidate)?;
        }
        Ok(())
    }

    fn remote_candidate(&mut self, candidate: CandidateMessage) {
        self.event_log
            .markieren(EventTyp::PeerConnection, "Remote-Candidate");
        if let Err(e) = self.negotiator.add_remote_candidate(&candidate.candidate) {
            // Einzelne Candidates duerfen scheitern, die Verhandlung laeuft weiter
            tracing::warn!(connection = %self.id, fehler = %e, "Remote-Candidate abgelehnt");
        }
    }

    fn lokaler_candidate(&mut self, candidate: String) {
        let stage = self.session.as_ref().map(|s| s.stage());
        match stage {
            Some(SessionStage::Active) if self.zustand.ist_verbunden() => {
                if let Err(e) = self.candidate_senden(candidate) {
                    self.fatal(Fatal::Fehler(e));
                }
            }
            Some(SessionStage::Unopened | SessionStage::Negotiating) => {
                tracing::debug!(connection = %self.id, "Lokaler Candidate vor dem Answer vorgemerkt");
                if let Some(session) = self.session.as_mut() {
                    session.candidate_vormerken(candidate);
                }
            }
            _ => {
                tracing::debug!(connection = %self.id, zustand = %self.zustand, "Lokaler Candidate verworfen");
            }
        }
    }

    fn candidate_senden(&mut self, candidate: String) -> SignalingResult<()> {
        self.senden(&Message::Candidate(CandidateMessage::neu(candidate)))?;
        self.event_log
            .markieren(EventTyp::PeerConnection, "Lokaler Candidate gesendet");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Zustand und Benachrichtigung
    // -----------------------------------------------------------------------

    fn zustand_setzen(&mut self, neu: ConnectionState) {
        let alt = self.zustand;
        if alt == neu {
            return;
        }
        self.zustand = neu;
        tracing::debug!(connection = %self.id, von = %alt, nach = %neu, "Zustandswechsel");
        self.benachrichtigen(|o, ctx| o.on_state_changed(ctx, alt, neu));
    }

    /// Wechselt genau einmal nach `Failed` und meldet die Pflicht-Benachrichtigung
    fn fatal(&mut self, ursache: Fatal) {
        if self.zustand.ist_terminal() {
            tracing::debug!(connection = %self.id, zustand = %self.zustand, "Weiterer Fehler nach Ende ignoriert");
            return;
        }

        let fehler = match &ursache {
            Fatal::Fehlerantwort(antwort) => SignalingError::ProtocolFailure(antwort.reason.clone()),
            Fatal::Fehler(fehler) => fehler.clone(),
        };
        tracing::error!(connection = %self.id, zustand = %self.zustand, fehler = %fehler, "Verbindung gescheitert");
        self.event_log
            .markieren(EventTyp::Signaling, format!("gescheitert: {fehler}"));
        self.letzter_fehler = Some(fehler);

        self.zustand_setzen(ConnectionState::Failed);
        self.abbauen();

        let mut ctx = ObserverContext::neu(
            self.id,
            self.zustand,
            self.session.as_ref(),
            &self.event_log,
            &mut self.close_angefordert,
        );
        match &ursache {
            Fatal::Fehlerantwort(antwort) => {
                self.dispatcher
                    .dispatch_pflicht(&mut ctx, "on_error_response", |o, ctx| {
                        o.on_error_response(ctx, antwort)
                    })
            }
            Fatal::Fehler(fehler) => self
                .dispatcher
                .dispatch_pflicht(&mut ctx, "on_failure", |o, ctx| o.on_failure(ctx, fehler)),
        }

        self.session = None;
        self.connect = None;
    }

    fn benachrichtigen<F>(&mut self, f: F)
    where
        F: FnOnce(&mut (dyn ConnectionObserver + 'static), &mut ObserverContext<'_>),
    {
        let mut ctx = ObserverContext::neu(
            self.id,
            self.zustand,
            self.session.as_ref(),
            &self.event_log,
            &mut self.close_angefordert,
        );
        self.dispatcher.dispatch(&mut ctx, f);
    }

    /// Fuehrt ein aus einem Callback angefordertes `close` aus
    fn nachlauf(&mut self) {
        if std::mem::take(&mut self.close_angefordert) {
            tracing::debug!(connection = %self.id, "close aus Observer-Callback");
            self.close();
        }
    }
}

impl<T, N> std::fmt::Debug for SignalingConnection<T, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalingConnection")
            .field("id", &self.id)
            .field("zustand", &self.zustand)
            .field("session", &self.session)
            .finish()
    }
}
