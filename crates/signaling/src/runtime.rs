//! Verbindungsschleife – serialisiert Kommandos und Ereignisse
//!
//! Der [`ConnectionDriver`] besitzt eine [`SignalingConnection`] in einem
//! eigenen tokio-Task. Kommandos des Aufrufers ([`SignalingHandle`]) sowie
//! Transport- und Negotiator-Ereignisse laufen ueber eine gemeinsame Queue
//! und werden streng nacheinander verarbeitet. Observer-Callbacks laufen
//! dadurch nie parallel.
//!
//! ```text
//! SignalingHandle ------+
//! TransportEventSender -+--> Queue --> Task: SignalingConnection --> Observer
//! NegotiatorEventSender +                       |
//!                                               +--> watch: Zustand/Session
//! ```
//!
//! Der Task endet, sobald die Verbindung terminal ist oder alle Sender
//! verworfen wurden.

use sora_core::ConnectionId;
use sora_protocol::ConnectRequest;
use tokio::sync::{mpsc, oneshot, watch};

use crate::connection::SignalingConnection;
use crate::dispatcher::{ConnectionObserver, ObserverToken};
use crate::error::{SignalingError, SignalingResult};
use crate::negotiator::{NegotiatorEvent, PeerNegotiator};
use crate::session::SessionState;
use crate::state::ConnectionState;
use crate::transport::{Transport, TransportEvent};

// ---------------------------------------------------------------------------
// Queue-Eintraege
// ---------------------------------------------------------------------------

enum Befehl {
    Open {
        request: ConnectRequest,
        antwort: oneshot::Sender<SignalingResult<()>>,
    },
    Close {
        antwort: oneshot::Sender<()>,
    },
    SetObserver {
        observer: Box<dyn ConnectionObserver>,
        antwort: oneshot::Sender<ObserverToken>,
    },
    RemoveObserver {
        token: ObserverToken,
        antwort: oneshot::Sender<bool>,
    },
}

enum Eingabe {
    Befehl(Befehl),
    Transport(TransportEvent),
    Negotiator(NegotiatorEvent),
}

/// Zustand und Session nach dem letzten verarbeiteten Eintrag
#[derive(Debug, Clone)]
struct Momentaufnahme {
    zustand: ConnectionState,
    session: Option<SessionState>,
    fehler: Option<SignalingError>,
}

impl Momentaufnahme {
    fn von<T: Transport, N: PeerNegotiator>(v: &SignalingConnection<T, N>) -> Self {
        Self {
            zustand: v.state(),
            session: v.session().cloned(),
            fehler: v.letzter_fehler().cloned(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ereignis-Sender
// ---------------------------------------------------------------------------

/// Sender fuer Transport-Ereignisse, an den Transport zu uebergeben
#[derive(Clone, Debug)]
pub struct TransportEventSender {
    tx: mpsc::UnboundedSender<Eingabe>,
}

impl TransportEventSender {
    /// Reiht ein Ereignis ein; `false` wenn die Verbindung beendet ist
    pub fn senden(&self, ereignis: TransportEvent) -> bool {
        self.tx.send(Eingabe::Transport(ereignis)).is_ok()
    }
}

/// Sender fuer Negotiator-Ereignisse, an den Negotiator zu uebergeben
#[derive(Clone, Debug)]
pub struct NegotiatorEventSender {
    tx: mpsc::UnboundedSender<Eingabe>,
}

impl NegotiatorEventSender {
    pub fn senden(&self, ereignis: NegotiatorEvent) -> bool {
        self.tx.send(Eingabe::Negotiator(ereignis)).is_ok()
    }
}

impl std::fmt::Debug for Eingabe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Befehl(_) => f.write_str("Befehl"),
            Self::Transport(e) => write!(f, "Transport({e:?})"),
            Self::Negotiator(e) => write!(f, "Negotiator({e:?})"),
        }
    }
}

// ---------------------------------------------------------------------------
// ConnectionDriver
// ---------------------------------------------------------------------------

/// Baut die Queue auf und startet den Verbindungs-Task
///
/// Ablauf: Driver erzeugen, Sender an Transport und Negotiator geben,
/// daraus die [`SignalingConnection`] bauen und [`starten`](Self::starten).
pub struct ConnectionDriver {
    tx: mpsc::UnboundedSender<Eingabe>,
    rx: mpsc::UnboundedReceiver<Eingabe>,
}

impl ConnectionDriver {
    pub fn neu() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn transport_sender(&self) -> TransportEventSender {
        TransportEventSender {
            tx: self.tx.clone(),
        }
    }

    pub fn negotiator_sender(&self) -> NegotiatorEventSender {
        NegotiatorEventSender {
            tx: self.tx.clone(),
        }
    }

    /// Startet den Task; muss innerhalb einer tokio-Runtime aufgerufen werden
    pub fn starten<T, N>(self, verbindung: SignalingConnection<T, N>) -> SignalingHandle
    where
        T: Transport + 'static,
        N: PeerNegotiator + 'static,
    {
        let connection_id = verbindung.connection_id();
        let (status_tx, status_rx) = watch::channel(Momentaufnahme::von(&verbindung));
        tokio::spawn(verbindung_betreiben(verbindung, self.rx, status_tx));
        SignalingHandle {
            connection_id,
            tx: self.tx,
            status: status_rx,
        }
    }
}

impl Default for ConnectionDriver {
    fn default() -> Self {
        Self::neu()
    }
}

async fn verbindung_betreiben<T, N>(
    mut verbindung: SignalingConnection<T, N>,
    mut rx: mpsc::UnboundedReceiver<Eingabe>,
    status: watch::Sender<Momentaufnahme>,
) where
    T: Transport,
    N: PeerNegotiator,
{
    let id = verbindung.connection_id();
    tracing::debug!(connection = %id, "Verbindungs-Task gestartet");

    while let Some(eingabe) = rx.recv().await {
        tracing::trace!(connection = %id, eingabe = ?eingabe, "Eingabe verarbeiten");
        match eingabe {
            Eingabe::Befehl(Befehl::Open { request, antwort }) => {
                let ergebnis = verbindung.open(request);
                status.send_replace(Momentaufnahme::von(&verbindung));
                let _ = antwort.send(ergebnis);
            }
            Eingabe::Befehl(Befehl::Close { antwort }) => {
                verbindung.close();
                status.send_replace(Momentaufnahme::von(&verbindung));
                let _ = antwort.send(());
            }
            Eingabe::Befehl(Befehl::SetObserver { observer, antwort }) => {
                let _ = antwort.send(verbindung.set_observer(observer));
            }
            Eingabe::Befehl(Befehl::RemoveObserver { token, antwort }) => {
                let _ = antwort.send(verbindung.remove_observer(token));
            }
            Eingabe::Transport(ereignis) => verbindung.transport_ereignis(ereignis),
            Eingabe::Negotiator(ereignis) => verbindung.negotiator_ereignis(ereignis),
        }

        status.send_replace(Momentaufnahme::von(&verbindung));
        if verbindung.state().ist_terminal() {
            break;
        }
    }

    tracing::debug!(connection = %id, zustand = %verbindung.state(), "Verbindungs-Task beendet");
}

// ---------------------------------------------------------------------------
// SignalingHandle
// ---------------------------------------------------------------------------

/// Handle auf eine laufende Verbindung
#[derive(Clone, Debug)]
pub struct SignalingHandle {
    connection_id: ConnectionId,
    tx: mpsc::UnboundedSender<Eingabe>,
    status: watch::Receiver<Momentaufnahme>,
}

impl SignalingHandle {
    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Zustand nach dem zuletzt verarbeiteten Eintrag
    pub fn state(&self) -> ConnectionState {
        self.status.borrow().zustand
    }

    /// Kopie der Session, solange die Verbindung lebt
    pub fn session(&self) -> Option<SessionState> {
        self.status.borrow().session.clone()
    }

    pub fn letzter_fehler(&self) -> Option<SignalingError> {
        self.status.borrow().fehler.clone()
    }

    pub async fn open(&self, request: ConnectRequest) -> SignalingResult<()> {
        let zustand = self.state();
        if zustand.ist_terminal() {
            return Err(SignalingError::zustandswechsel(zustand, "open"));
        }
        let (antwort, rx) = oneshot::channel();
        self.befehl(Befehl::Open { request, antwort })?;
        rx.await.map_err(|_| SignalingError::Beendet)?
    }

    /// Schliesst die Verbindung; nach dem Ende ein No-op
    pub async fn close(&self) {
        let (antwort, rx) = oneshot::channel();
        if self.befehl(Befehl::Close { antwort }).is_ok() {
            let _ = rx.await;
        }
    }

    pub async fn set_observer<O>(&self, observer: O) -> SignalingResult<ObserverToken>
    where
        O: ConnectionObserver + 'static,
    {
        let (antwort, rx) = oneshot::channel();
        self.befehl(Befehl::SetObserver {
            observer: Box::new(observer),
            antwort,
        })?;
        rx.await.map_err(|_| SignalingError::Beendet)
    }

    pub async fn remove_observer(&self, token: ObserverToken) -> SignalingResult<bool> {
        let (antwort, rx) = oneshot::channel();
        self.befehl(Befehl::RemoveObserver { token, antwort })?;
        rx.await.map_err(|_| SignalingError::Beendet)
    }

    /// Wartet bis der Zustand `bedingung` erfuellt
    ///
    /// Endet der Task vorher, wird der letzte bekannte Zustand geliefert.
    pub async fn warten_bis<F>(&self, bedingung: F) -> ConnectionState
    where
        F: Fn(ConnectionState) -> bool,
    {
        let mut status = self.status.clone();
        let ergebnis = status
            .wait_for(|m| bedingung(m.zustand) || m.zustand.ist_terminal())
            .await
            .map(|m| m.zustand);
        match ergebnis {
            Ok(zustand) => zustand,
            Err(_) => status.borrow().zustand,
        }
    }

    fn befehl(&self, befehl: Befehl) -> SignalingResult<()> {
        self.tx
            .send(Eingabe::Befehl(befehl))
            .map_err(|_| SignalingError::Beendet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiator::NegotiationError;
    use crate::transport::TransportError;
    use sora_core::{ChannelId, Role};
    use sora_protocol::ErrorResponse;
    use std::sync::{Arc, Mutex};

    /// Transport, der beim Oeffnen sofort `Connected` meldet
    struct SofortTransport {
        sink: TransportEventSender,
        gesendet: Arc<Mutex<Vec<String>>>,
    }

    impl Transport for SofortTransport {
        fn open(&mut self) -> Result<(), TransportError> {
            self.sink.senden(TransportEvent::Connected);
            Ok(())
        }

        fn send(&mut self, text: String) -> Result<(), TransportError> {
            self.gesendet.lock().unwrap().push(text);
            Ok(())
        }

        fn close(&mut self) {}
    }

    struct Echo;

    impl PeerNegotiator for Echo {
        fn set_remote_description(&mut self, _sdp: &str) -> Result<(), NegotiationError> {
            Ok(())
        }

        fn create_answer(&mut self) -> Result<String, NegotiationError> {
            Ok("v=0".into())
        }

        fn add_remote_candidate(&mut self, _c: &str) -> Result<(), NegotiationError> {
            Ok(())
        }
    }

    struct Still;

    impl ConnectionObserver for Still {
        fn on_error_response(&mut self, _: &mut crate::ObserverContext<'_>, _: &ErrorResponse) {}
        fn on_failure(&mut self, _: &mut crate::ObserverContext<'_>, _: &SignalingError) {}
    }

    fn starten() -> (SignalingHandle, TransportEventSender, Arc<Mutex<Vec<String>>>) {
        let driver = ConnectionDriver::neu();
        let gesendet = Arc::new(Mutex::new(Vec::new()));
        let sink = driver.transport_sender();
        let transport = SofortTransport {
            sink: sink.clone(),
            gesendet: Arc::clone(&gesendet),
        };
        let handle = driver.starten(SignalingConnection::neu(transport, Echo));
        (handle, sink, gesendet)
    }

    fn request() -> ConnectRequest {
        ConnectRequest::neu(Role::Downstream, ChannelId::neu("room-1").unwrap())
    }

    #[tokio::test]
    async fn open_und_close_ueber_handle() {
        let (handle, _sink, gesendet) = starten();
        handle.set_observer(Still).await.unwrap();
        handle.open(request()).await.unwrap();

        let zustand = handle.warten_bis(|z| z == ConnectionState::Open).await;
        assert_eq!(zustand, ConnectionState::Open);
        assert_eq!(gesendet.lock().unwrap().len(), 1);

        handle.close().await;
        assert_eq!(
            handle.warten_bis(|z| z.ist_terminal()).await,
            ConnectionState::Closed
        );
        // Nach dem Ende: close ist No-op, open ein Zustandsfehler
        handle.close().await;
        assert!(matches!(
            handle.open(request()).await,
            Err(SignalingError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn zweites_open_abgelehnt() {
        let (handle, _sink, _) = starten();
        handle.open(request()).await.unwrap();
        let e = handle.open(request()).await.unwrap_err();
        assert!(matches!(
            e,
            SignalingError::InvalidStateTransition {
                operation: "open",
                ..
            }
        ));
        handle.close().await;
    }

    #[tokio::test]
    async fn ereignisse_ueber_sender() {
        let (handle, sink, _) = starten();
        handle.open(request()).await.unwrap();
        handle.warten_bis(|z| z == ConnectionState::Open).await;

        assert!(sink.senden(TransportEvent::Text(
            r#"{"type":"offer","client_id":"c9","sdp":"v=0"}"#.into()
        )));
        handle
            .warten_bis(|z| z == ConnectionState::PeerConnecting)
            .await;
        let session = handle.session().expect("Session muss existieren");
        assert_eq!(session.client_id().unwrap().as_str(), "c9");

        sink.senden(TransportEvent::Failed("reset".into()));
        assert_eq!(
            handle.warten_bis(|z| z.ist_terminal()).await,
            ConnectionState::Failed
        );
        assert_eq!(
            handle.letzter_fehler(),
            Some(SignalingError::TransportFailure("reset".into()))
        );
        assert!(handle.session().is_none());
        // Task ist beendet, Sender liefern false
        tokio::task::yield_now().await;
        assert!(matches!(
            handle.set_observer(Still).await,
            Err(SignalingError::Beendet)
        ));
    }
}
