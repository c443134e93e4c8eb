//! Ereignisprotokoll einer Signaling-Verbindung
//!
//! Jede Verbindung fuehrt ein `EventLog` mit Zeitstempeln fuer WebSocket-,
//! Signaling- und PeerConnection-Meilensteine. Das Protokoll ist optional
//! begrenzt (aelteste Eintraege fallen zuerst heraus), kann abgeschaltet
//! werden und spiegelt im Debug-Modus jedes Ereignis ins tracing-Log.
//!
//! `EventLog` ist `Clone` und teilt den Inhalt zwischen allen Klonen.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Herkunft eines Ereignisses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventTyp {
    WebSocket,
    Signaling,
    PeerConnection,
    VideoRenderer,
}

impl EventTyp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WebSocket => "WebSocket",
            Self::Signaling => "Signaling",
            Self::PeerConnection => "PeerConnection",
            Self::VideoRenderer => "VideoRenderer",
        }
    }
}

/// Ein protokolliertes Ereignis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub typ: EventTyp,
    pub kommentar: String,
    pub zeitpunkt: DateTime<Utc>,
}

impl Event {
    pub fn neu(typ: EventTyp, kommentar: impl Into<String>) -> Self {
        Self {
            typ,
            kommentar: kommentar.into(),
            zeitpunkt: Utc::now(),
        }
    }
}

impl fmt::Display for Event {
    /// `[yyyy-MM-dd HH:mm:ss] Typ: Kommentar`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.zeitpunkt.format("%Y-%m-%d %H:%M:%S"),
            self.typ.as_str(),
            self.kommentar
        )
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Callback nach jeder Markierung
pub type MarkierungsHook = Arc<dyn Fn(&Event) + Send + Sync>;

struct Inner {
    ereignisse: Vec<Event>,
    aktiviert: bool,
    limit: Option<usize>,
    debug: bool,
    hook: Option<MarkierungsHook>,
}

/// Geteiltes, optional begrenztes Ereignisprotokoll
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Mutex<Inner>>,
}

impl EventLog {
    /// Erstellt ein aktiviertes, unbegrenztes Protokoll
    pub fn neu() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                ereignisse: Vec::new(),
                aktiviert: true,
                limit: None,
                debug: false,
                hook: None,
            })),
        }
    }

    /// Erstellt ein Protokoll mit Einstellungen aus der Konfiguration
    pub fn mit_einstellungen(aktiviert: bool, limit: Option<usize>, debug: bool) -> Self {
        let log = Self::neu();
        {
            let mut inner = log.inner.lock();
            inner.aktiviert = aktiviert;
            inner.limit = limit;
            inner.debug = debug;
        }
        log
    }

    /// Haelt ein Ereignis fest
    pub fn markieren(&self, typ: EventTyp, kommentar: impl Into<String>) {
        self.ereignis_markieren(Event::neu(typ, kommentar));
    }

    pub fn ereignis_markieren(&self, event: Event) {
        let hook = {
            let mut inner = self.inner.lock();
            if !inner.aktiviert {
                return;
            }
            if inner.debug {
                tracing::debug!(typ = event.typ.as_str(), "{}", event);
            }
            if let Some(limit) = inner.limit {
                if limit == 0 {
                    return;
                }
                while inner.ereignisse.len() >= limit {
                    inner.ereignisse.remove(0);
                }
            }
            inner.ereignisse.push(event.clone());
            inner.hook.clone()
        };
        // Hook ausserhalb des Locks, er darf selbst markieren
        if let Some(hook) = hook {
            hook(&event);
        }
    }

    /// Kopie aller Ereignisse, aelteste zuerst
    pub fn ereignisse(&self) -> Vec<Event> {
        self.inner.lock().ereignisse.clone()
    }

    pub fn anzahl(&self) -> usize {
        self.inner.lock().ereignisse.len()
    }

    pub fn leeren(&self) {
        self.inner.lock().ereignisse.clear();
    }

    /// Setzt das Limit; ueberzaehlige alte Eintraege werden sofort entfernt
    pub fn set_limit(&self, limit: Option<usize>) {
        let mut inner = self.inner.lock();
        inner.limit = limit;
        if let Some(limit) = limit {
            let laenge = inner.ereignisse.len();
            if laenge > limit {
                inner.ereignisse.drain(..laenge - limit);
            }
        }
    }

    pub fn set_aktiviert(&self, aktiviert: bool) {
        self.inner.lock().aktiviert = aktiviert;
    }

    pub fn ist_aktiviert(&self) -> bool {
        self.inner.lock().aktiviert
    }

    pub fn set_debug(&self, debug: bool) {
        self.inner.lock().debug = debug;
    }

    /// Registriert den Hook fuer neue Markierungen (ersetzt einen vorherigen)
    pub fn bei_markierung<F>(&self, hook: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.lock().hook = Some(Arc::new(hook));
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::neu()
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EventLog")
            .field("anzahl", &inner.ereignisse.len())
            .field("aktiviert", &inner.aktiviert)
            .field("limit", &inner.limit)
            .field("debug", &inner.debug)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn markieren_und_lesen() {
        let log = EventLog::neu();
        log.markieren(EventTyp::WebSocket, "geoeffnet");
        log.markieren(EventTyp::Signaling, "connect gesendet");
        let ereignisse = log.ereignisse();
        assert_eq!(ereignisse.len(), 2);
        assert_eq!(ereignisse[0].typ, EventTyp::WebSocket);
        assert_eq!(ereignisse[1].kommentar, "connect gesendet");
    }

    #[test]
    fn limit_verwirft_aelteste() {
        let log = EventLog::mit_einstellungen(true, Some(2), false);
        for i in 0..5 {
            log.markieren(EventTyp::Signaling, format!("e{i}"));
        }
        let kommentare: Vec<_> = log.ereignisse().into_iter().map(|e| e.kommentar).collect();
        assert_eq!(kommentare, vec!["e3", "e4"]);
    }

    #[test]
    fn limit_nachtraeglich_kuerzen() {
        let log = EventLog::neu();
        for i in 0..4 {
            log.markieren(EventTyp::PeerConnection, format!("e{i}"));
        }
        log.set_limit(Some(1));
        assert_eq!(log.anzahl(), 1);
        assert_eq!(log.ereignisse()[0].kommentar, "e3");
    }

    #[test]
    fn deaktiviert_nimmt_nichts_auf() {
        let log = EventLog::neu();
        log.set_aktiviert(false);
        log.markieren(EventTyp::Signaling, "ignoriert");
        assert_eq!(log.anzahl(), 0);
        log.set_aktiviert(true);
        log.markieren(EventTyp::Signaling, "ok");
        assert_eq!(log.anzahl(), 1);
    }

    #[test]
    fn klone_teilen_inhalt() {
        let log = EventLog::neu();
        let klon = log.clone();
        klon.markieren(EventTyp::WebSocket, "x");
        assert_eq!(log.anzahl(), 1);
        log.leeren();
        assert_eq!(klon.anzahl(), 0);
    }

    #[test]
    fn hook_wird_aufgerufen() {
        let log = EventLog::neu();
        let zaehler = Arc::new(AtomicUsize::new(0));
        let z = Arc::clone(&zaehler);
        log.bei_markierung(move |_| {
            z.fetch_add(1, Ordering::SeqCst);
        });
        log.markieren(EventTyp::Signaling, "a");
        log.markieren(EventTyp::Signaling, "b");
        assert_eq!(zaehler.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn hook_darf_selbst_markieren() {
        let log = EventLog::neu();
        let klon = log.clone();
        log.bei_markierung(move |e| {
            if e.typ == EventTyp::Signaling {
                klon.markieren(EventTyp::VideoRenderer, "folge");
            }
        });
        log.markieren(EventTyp::Signaling, "start");
        assert_eq!(log.anzahl(), 2);
    }

    #[test]
    fn beschreibung_format() {
        let event = Event {
            typ: EventTyp::PeerConnection,
            kommentar: "answer gesendet".into(),
            zeitpunkt: Utc.with_ymd_and_hms(2016, 5, 20, 8, 3, 9).unwrap(),
        };
        assert_eq!(
            event.to_string(),
            "[2016-05-20 08:03:09] PeerConnection: answer gesendet"
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["typ"], "PeerConnection");
    }
}
