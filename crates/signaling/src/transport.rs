//! Schnittstelle zum Nachrichten-Transport
//!
//! Der Transport (typisch WebSocket) ist ein externer Mitspieler: er nimmt
//! Text zum Senden entgegen und meldet Ereignisse ueber einen
//! [`TransportEventSender`](crate::runtime::TransportEventSender) oder direkt
//! an [`SignalingConnection::transport_ereignis`](crate::SignalingConnection::transport_ereignis).
//! Keep-Alive, Framing und Reconnect sind seine Sache.

use thiserror::Error;

/// Ereignis des Transports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Verbindung steht, `connect` kann gesendet werden
    Connected,
    /// Text-Frame empfangen
    Text(String),
    /// Binaer-Frame empfangen (im Signaling nicht vorgesehen)
    Binary(Vec<u8>),
    /// Pong auf einen Keep-Alive-Ping
    Pong(Vec<u8>),
    /// Transport gescheitert
    Failed(String),
    /// Transport geschlossen
    Closed,
}

/// Fehler einer Transport-Operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    pub fn neu(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Nachrichten-Transport einer Signaling-Verbindung
pub trait Transport: Send {
    /// Startet den Verbindungsaufbau; Erfolg wird als
    /// [`TransportEvent::Connected`] gemeldet
    fn open(&mut self) -> Result<(), TransportError>;

    /// Sendet einen Text-Frame
    fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Baut die Verbindung ab; mehrfacher Aufruf ist erlaubt
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn send(&mut self, text: String) -> Result<(), TransportError> {
        (**self).send(text)
    }

    fn close(&mut self) {
        (**self).close()
    }
}
