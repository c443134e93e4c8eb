//! # sora-observability
//!
//! Observability-Crate fuer den Sora-Signaling-Client:
//! - Structured Logging via tracing-subscriber (Text oder JSON)
//! - Ereignisprotokoll (`EventLog`) pro Verbindung

pub mod event_log;
pub mod logging;

pub use event_log::{Event, EventLog, EventTyp};
pub use logging::logging_initialisieren;
