//! Event-Dispatcher – Liefert Benachrichtigungen an genau einen Observer
//!
//! Der Dispatcher haelt einen einzigen, austauschbaren Observer-Slot. Ein
//! ersetzter Observer bekommt ab sofort nichts mehr; verpasste Ereignisse
//! werden weder gepuffert noch nachgeliefert.
//!
//! ## Pflicht und Kuer
//! - Pflicht: [`ConnectionObserver::on_error_response`] (Server hat `error`
//!   gesendet) und [`ConnectionObserver::on_failure`] (fataler Fehler).
//! - Alle anderen Methoden haben leere Standard-Implementierungen; ein
//!   Observer implementiert nur, was ihn interessiert.

use sora_core::ConnectionId;
use sora_observability::EventLog;
use sora_protocol::{
    AnswerMessage, ConnectionCounts, DecodeError, ErrorResponse, Message, MessageType,
    OfferMessage, SignalingFailed,
};

use crate::error::SignalingError;
use crate::session::SessionState;
use crate::state::ConnectionState;

// ---------------------------------------------------------------------------
// Verworfene Nachrichten
// ---------------------------------------------------------------------------

/// Grund fuer das Verwerfen einer eingehenden Nutzlast
#[derive(Debug, Clone, PartialEq)]
pub enum DiscardReason {
    /// Nutzlast liess sich nicht dekodieren
    Decode(DecodeError),
    /// Nachricht ist im aktuellen Zustand nicht erlaubt (z.B. zweites Offer)
    UnexpectedInState {
        message_type: MessageType,
        state: ConnectionState,
    },
    /// Binaer-Frame, das Signaling ist rein textbasiert
    Binary,
}

/// Rohe Nutzlast einer verworfenen Nachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscardedPayload {
    Text(String),
    Binary(Vec<u8>),
}

/// Verworfene Nachricht mit Grund
#[derive(Debug, Clone, PartialEq)]
pub struct DiscardedMessage {
    pub reason: DiscardReason,
    pub payload: DiscardedPayload,
}

// ---------------------------------------------------------------------------
// ObserverContext
// ---------------------------------------------------------------------------

/// Kontext einer Benachrichtigung
///
/// Gibt Lesezugriff auf Verbindung und Session. [`ObserverContext::close`]
/// darf aus jedem Callback aufgerufen werden; der Abbau laeuft nach dem
/// aktuellen Ereignis.
pub struct ObserverContext<'a> {
    connection_id: ConnectionId,
    state: ConnectionState,
    session: Option<&'a SessionState>,
    event_log: &'a EventLog,
    close_angefordert: &'a mut bool,
}

impl<'a> ObserverContext<'a> {
    pub(crate) fn neu(
        connection_id: ConnectionId,
        state: ConnectionState,
        session: Option<&'a SessionState>,
        event_log: &'a EventLog,
        close_angefordert: &'a mut bool,
    ) -> Self {
        Self {
            connection_id,
            state,
            session,
            event_log,
            close_angefordert,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Zustand zum Zeitpunkt der Benachrichtigung
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn session(&self) -> Option<&SessionState> {
        self.session
    }

    pub fn event_log(&self) -> &EventLog {
        self.event_log
    }

    /// Fordert den Abbau der Verbindung an
    pub fn close(&mut self) {
        *self.close_angefordert = true;
    }

    pub fn close_angefordert(&self) -> bool {
        *self.close_angefordert
    }
}

// ---------------------------------------------------------------------------
// ConnectionObserver
// ---------------------------------------------------------------------------

/// Empfaenger der Verbindungs-Benachrichtigungen
///
/// Alle Callbacks laufen seriell auf der Verbindungsschleife.
#[allow(unused_variables)]
pub trait ConnectionObserver: Send {
    /// Pflicht: Server hat `error` gesendet, die Verbindung ist `Failed`
    fn on_error_response(&mut self, ctx: &mut ObserverContext<'_>, error: &ErrorResponse);

    /// Pflicht: fataler Fehler (Transport, Verhandlung, `signaling-failed`)
    fn on_failure(&mut self, ctx: &mut ObserverContext<'_>, fehler: &SignalingError);

    /// Transport steht und `connect` ist gesendet
    fn on_open(&mut self, ctx: &mut ObserverContext<'_>) {}

    fn on_state_changed(
        &mut self,
        ctx: &mut ObserverContext<'_>,
        von: ConnectionState,
        nach: ConnectionState,
    ) {
    }

    /// Jede angenommene Nachricht vom Server, vor der typspezifischen Verarbeitung
    fn on_message(&mut self, ctx: &mut ObserverContext<'_>, nachricht: &Message) {}

    fn on_discarded(&mut self, ctx: &mut ObserverContext<'_>, verworfen: &DiscardedMessage) {}

    fn on_offer(&mut self, ctx: &mut ObserverContext<'_>, offer: &OfferMessage) {}

    /// Darf das Answer vor dem Senden umschreiben
    fn will_send_answer(
        &mut self,
        ctx: &mut ObserverContext<'_>,
        answer: AnswerMessage,
    ) -> AnswerMessage {
        answer
    }

    fn on_pong(&mut self, ctx: &mut ObserverContext<'_>, payload: &[u8]) {}

    /// Verbindungszahlen aus `signaling-connected` / `signaling-updated`
    fn on_connection_counts(&mut self, ctx: &mut ObserverContext<'_>, counts: &ConnectionCounts) {
    }

    fn on_signaling_failed(&mut self, ctx: &mut ObserverContext<'_>, nachricht: &SignalingFailed) {
    }
}

// ---------------------------------------------------------------------------
// EventDispatcher
// ---------------------------------------------------------------------------

/// Handle eines registrierten Observers, zum gezielten Abmelden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverToken(u64);

/// Einzelner Observer-Slot
#[derive(Default)]
pub struct EventDispatcher {
    slot: Option<(ObserverToken, Box<dyn ConnectionObserver>)>,
    naechstes_token: u64,
}

impl EventDispatcher {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Setzt den Observer und ersetzt einen vorhandenen
    pub fn set_observer(&mut self, observer: Box<dyn ConnectionObserver>) -> ObserverToken {
        self.naechstes_token += 1;
        let token = ObserverToken(self.naechstes_token);
        if self.slot.replace((token, observer)).is_some() {
            tracing::debug!("Observer ersetzt");
        }
        token
    }

    /// Entfernt den Observer, falls das Token noch aktuell ist
    pub fn remove_observer(&mut self, token: ObserverToken) -> bool {
        if self.slot.as_ref().map(|(aktuell, _)| *aktuell) == Some(token) {
            self.slot = None;
            return true;
        }
        false
    }

    pub fn hat_observer(&self) -> bool {
        self.slot.is_some()
    }

    /// Ruft den Observer auf; ohne Observer passiert nichts
    pub fn dispatch<F>(&mut self, ctx: &mut ObserverContext<'_>, f: F)
    where
        F: FnOnce(&mut (dyn ConnectionObserver + 'static), &mut ObserverContext<'_>),
    {
        if let Some((_, observer)) = self.slot.as_mut() {
            f(observer.as_mut(), ctx);
        }
    }

    /// Wie [`dispatch`](Self::dispatch), mit Rueckgabewert; ohne Observer gilt `standard`
    pub fn dispatch_mit<R, F>(&mut self, ctx: &mut ObserverContext<'_>, standard: R, f: F) -> R
    where
        F: FnOnce(&mut (dyn ConnectionObserver + 'static), &mut ObserverContext<'_>, R) -> R,
    {
        match self.slot.as_mut() {
            Some((_, observer)) => f(observer.as_mut(), ctx, standard),
            None => standard,
        }
    }

    /// Pflicht-Benachrichtigung; fehlt der Observer, wird das laut geloggt
    pub fn dispatch_pflicht<F>(&mut self, ctx: &mut ObserverContext<'_>, was: &str, f: F)
    where
        F: FnOnce(&mut (dyn ConnectionObserver + 'static), &mut ObserverContext<'_>),
    {
        if self.slot.is_none() {
            tracing::error!(
                connection = %ctx.connection_id(),
                benachrichtigung = was,
                "Pflicht-Benachrichtigung ohne Observer"
            );
            return;
        }
        self.dispatch(ctx, f);
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("token", &self.slot.as_ref().map(|(t, _)| *t))
            .finish()
    }
}
