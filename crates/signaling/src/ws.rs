//! WebSocket-Transport auf Basis von tokio-tungstenite
//!
//! Ein Hintergrund-Task haelt den Socket. Ausgehende Frames laufen ueber
//! eine Queue zum Task, eingehende Frames werden als [`TransportEvent`]
//! an den [`TransportEventSender`] gemeldet.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::config::{SignalingConfig, VerbindungsConfig};
use crate::connection::SignalingConnection;
use crate::dispatcher::ConnectionObserver;
use crate::error::SignalingResult;
use crate::negotiator::PeerNegotiator;
use crate::runtime::{ConnectionDriver, NegotiatorEventSender, SignalingHandle, TransportEventSender};
use crate::transport::{Transport, TransportError, TransportEvent};

#[derive(Debug)]
enum WsBefehl {
    Text(String),
    Schliessen,
}

/// WebSocket-Verbindung zum Sora-Server
#[derive(Debug)]
pub struct WebSocketTransport {
    url: String,
    sink: TransportEventSender,
    ping_intervall: Option<Duration>,
    max_nachricht_bytes: Option<usize>,
    ausgang: Option<mpsc::UnboundedSender<WsBefehl>>,
}

impl WebSocketTransport {
    pub fn neu(url: impl Into<String>, sink: TransportEventSender) -> Self {
        Self {
            url: url.into(),
            sink,
            ping_intervall: None,
            max_nachricht_bytes: None,
            ausgang: None,
        }
    }

    pub fn aus_config(config: &VerbindungsConfig, sink: TransportEventSender) -> Self {
        let mut transport = Self::neu(config.url.clone(), sink);
        if config.ping_intervall_sek > 0 {
            transport.ping_intervall = Some(Duration::from_secs(config.ping_intervall_sek));
        }
        transport.max_nachricht_bytes = Some(config.max_nachricht_bytes);
        transport
    }

    /// Keep-Alive-Ping in festem Abstand
    pub fn mit_ping(mut self, intervall: Duration) -> Self {
        self.ping_intervall = Some(intervall);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn ws_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        if let Some(max) = self.max_nachricht_bytes {
            config.max_message_size = Some(max);
        }
        config
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.ausgang.is_some() {
            return Err(TransportError::neu("WebSocket bereits geoeffnet"));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| TransportError::neu("Keine tokio-Runtime aktiv"))?;

        #[cfg(feature = "tls")]
        tls_initialisieren();

        let (tx, rx) = mpsc::unbounded_channel();
        self.ausgang = Some(tx);
        runtime.spawn(socket_betreiben(
            self.url.clone(),
            self.ws_config(),
            self.ping_intervall,
            self.sink.clone(),
            rx,
        ));
        tracing::debug!(url = %self.url, "WebSocket-Verbindungsaufbau gestartet");
        Ok(())
    }

    fn send(&mut self, text: String) -> Result<(), TransportError> {
        let ausgang = self
            .ausgang
            .as_ref()
            .ok_or_else(|| TransportError::neu("WebSocket nicht geoeffnet"))?;
        ausgang
            .send(WsBefehl::Text(text))
            .map_err(|_| TransportError::neu("WebSocket-Task beendet"))
    }

    fn close(&mut self) {
        if let Some(ausgang) = self.ausgang.take() {
            let _ = ausgang.send(WsBefehl::Schliessen);
            tracing::debug!(url = %self.url, "WebSocket wird geschlossen");
        }
    }
}

#[cfg(feature = "tls")]
fn tls_initialisieren() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        // Schlaegt fehl wenn bereits ein Provider installiert ist
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

async fn socket_betreiben(
    url: String,
    config: WebSocketConfig,
    ping_intervall: Option<Duration>,
    sink: TransportEventSender,
    mut ausgang: mpsc::UnboundedReceiver<WsBefehl>,
) {
    let stream =
        match tokio_tungstenite::connect_async_with_config(url.as_str(), Some(config), false).await
        {
            Ok((stream, _antwort)) => stream,
            Err(e) => {
                tracing::warn!(url = %url, fehler = %e, "WebSocket-Verbindung fehlgeschlagen");
                sink.senden(TransportEvent::Failed(format!(
                    "Verbindungsaufbau zu {url} fehlgeschlagen: {e}"
                )));
                return;
            }
        };

    tracing::info!(url = %url, "WebSocket verbunden");
    sink.senden(TransportEvent::Connected);

    let (mut schreiber, mut leser) = stream.split();
    let mut ping = ping_intervall.map(|d| {
        let mut intervall = tokio::time::interval_at(Instant::now() + d, d);
        intervall.set_missed_tick_behavior(MissedTickBehavior::Skip);
        intervall
    });

    loop {
        tokio::select! {
            befehl = ausgang.recv() => match befehl {
                Some(WsBefehl::Text(text)) => {
                    if let Err(e) = schreiber.send(WsMessage::Text(text)).await {
                        sink.senden(TransportEvent::Failed(format!("Senden fehlgeschlagen: {e}")));
                        return;
                    }
                }
                // Lokal geschlossen, kein Ereignis mehr melden
                Some(WsBefehl::Schliessen) | None => {
                    let _ = schreiber.send(WsMessage::Close(None)).await;
                    let _ = schreiber.close().await;
                    tracing::debug!(url = %url, "WebSocket geschlossen");
                    return;
                }
            },
            frame = leser.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => {
                    sink.senden(TransportEvent::Text(text));
                }
                Some(Ok(WsMessage::Binary(daten))) => {
                    sink.senden(TransportEvent::Binary(daten));
                }
                Some(Ok(WsMessage::Pong(daten))) => {
                    sink.senden(TransportEvent::Pong(daten));
                }
                Some(Ok(WsMessage::Ping(_))) | Some(Ok(WsMessage::Frame(_))) => {}
                Some(Ok(WsMessage::Close(frame))) => {
                    tracing::info!(url = %url, frame = ?frame, "WebSocket vom Server geschlossen");
                    sink.senden(TransportEvent::Closed);
                    return;
                }
                None => {
                    sink.senden(TransportEvent::Closed);
                    return;
                }
                Some(Err(e)) => {
                    tracing::warn!(url = %url, fehler = %e, "WebSocket-Fehler");
                    sink.senden(TransportEvent::Failed(e.to_string()));
                    return;
                }
            },
            _ = naechster_ping(&mut ping) => {
                if let Err(e) = schreiber.send(WsMessage::Ping(Vec::new())).await {
                    sink.senden(TransportEvent::Failed(format!("Ping fehlgeschlagen: {e}")));
                    return;
                }
            }
        }
    }
}

async fn naechster_ping(ping: &mut Option<Interval>) {
    match ping {
        Some(intervall) => {
            intervall.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

// ---------------------------------------------------------------------------
// Verbindungsaufbau aus der Konfiguration
// ---------------------------------------------------------------------------

/// Baut Transport, Negotiator und Driver auf und sendet `connect`
///
/// `negotiator_bauen` erhaelt den Sender, ueber den der Negotiator seine
/// Ereignisse meldet.
pub async fn verbinden<N, F, O>(
    config: &SignalingConfig,
    negotiator_bauen: F,
    observer: O,
) -> SignalingResult<SignalingHandle>
where
    N: PeerNegotiator + 'static,
    F: FnOnce(NegotiatorEventSender) -> N,
    O: ConnectionObserver + 'static,
{
    let request = config.connect_request()?;
    let driver = ConnectionDriver::neu();
    let transport = WebSocketTransport::aus_config(&config.verbindung, driver.transport_sender());
    let negotiator = negotiator_bauen(driver.negotiator_sender());

    let mut verbindung =
        SignalingConnection::mit_event_log(transport, negotiator, config.event_log.event_log());
    verbindung.set_max_nachricht_bytes(config.verbindung.max_nachricht_bytes);
    verbindung.set_observer(Box::new(observer));

    let handle = driver.starten(verbindung);
    handle.open(request).await?;
    Ok(handle)
}
