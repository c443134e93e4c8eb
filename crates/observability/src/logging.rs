//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Umgebungsvariable:
//! - `SORA_LOG_LEVEL`: Log-Level oder Filter-Direktive, Standard: info
//! - `SORA_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Verbindungs-IDs werden als strukturierte Felder mitgeloggt.

use tracing_subscriber::{fmt, EnvFilter};

/// Umgebungsvariable fuer den Log-Level
pub const ENV_LOG_LEVEL: &str = "SORA_LOG_LEVEL";

/// Umgebungsvariable fuer das Log-Format
pub const ENV_LOG_FORMAT: &str = "SORA_LOG_FORMAT";

/// Initialisiert das Logging-System.
///
/// Liest `SORA_LOG_LEVEL` und `SORA_LOG_FORMAT` aus der Umgebung, die
/// Parameter gelten nur als Fallback. Ist bereits ein globaler Subscriber
/// gesetzt (z.B. durch die Anwendung oder einen Test), bleibt dieser aktiv
/// und es wird `false` zurueckgegeben.
pub fn logging_initialisieren(level: &str, format: &str) -> bool {
    let filter = EnvFilter::try_from_env(ENV_LOG_LEVEL)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_env = std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| format.to_string());

    let ergebnis = match format_env.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(true)
            .try_init(),
        _ => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    match ergebnis {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(fehler = %e, "Logging bereits initialisiert");
            false
        }
    }
}

/// Gibt den konfigurierten Log-Level aus der Umgebung zurueck.
/// Fallback: "info"
pub fn log_level_aus_env() -> String {
    std::env::var(ENV_LOG_LEVEL).unwrap_or_else(|_| "info".to_string())
}

/// Gibt das konfigurierte Log-Format aus der Umgebung zurueck.
/// Fallback: "text"
pub fn log_format_aus_env() -> String {
    std::env::var(ENV_LOG_FORMAT).unwrap_or_else(|_| "text".to_string())
}

/// Validiert ob ein Log-Level-String gueltig ist.
pub fn log_level_gueltig(level: &str) -> bool {
    matches!(level, "trace" | "debug" | "info" | "warn" | "error")
}

/// Validiert ob ein Log-Format-String gueltig ist.
pub fn log_format_gueltig(format: &str) -> bool {
    matches!(format, "text" | "json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_gueltige_werte() {
        for level in ["trace", "debug", "info", "warn", "error"] {
            assert!(log_level_gueltig(level), "{level} muss gueltig sein");
        }
    }

    #[test]
    fn log_level_ungueltige_werte() {
        assert!(!log_level_gueltig("verbose"));
        assert!(!log_level_gueltig("INFO")); // Gross-/Kleinschreibung
        assert!(!log_level_gueltig(""));
    }

    #[test]
    fn log_format_werte() {
        assert!(log_format_gueltig("text"));
        assert!(log_format_gueltig("json"));
        assert!(!log_format_gueltig("JSON"));
        assert!(!log_format_gueltig("xml"));
    }

    // Ein Test pro Variable, damit parallele Tests sich nicht stoeren
    #[test]
    fn log_level_aus_env_mit_fallback() {
        std::env::remove_var(ENV_LOG_LEVEL);
        assert_eq!(log_level_aus_env(), "info");
        std::env::set_var(ENV_LOG_LEVEL, "debug");
        assert_eq!(log_level_aus_env(), "debug");
        std::env::remove_var(ENV_LOG_LEVEL);
    }

    #[test]
    fn log_format_aus_env_mit_fallback() {
        std::env::remove_var(ENV_LOG_FORMAT);
        assert_eq!(log_format_aus_env(), "text");
        std::env::set_var(ENV_LOG_FORMAT, "json");
        assert_eq!(log_format_aus_env(), "json");
        std::env::remove_var(ENV_LOG_FORMAT);
    }

    #[test]
    fn zweite_initialisierung_ist_harmlos() {
        logging_initialisieren("warn", "text");
        assert!(!logging_initialisieren("debug", "json"));
    }
}
