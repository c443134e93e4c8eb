//! Fehlertypen fuer gemeinsame Sora-Typen
//!
//! Wird von den `FromStr`-Implementierungen in [`crate::types`] genutzt.
//! Hoehere Schichten (Codec, Signaling) bilden ihn auf eigene Fehler ab.

use thiserror::Error;

/// Result-Alias fuer sora-core
pub type Result<T> = std::result::Result<T, SoraError>;

/// Fehler beim Interpretieren gemeinsamer Werte
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SoraError {
    /// Wert liegt ausserhalb der bekannten Aufzaehlung
    #[error("Unbekannter Wert fuer '{schluessel}': {wert}")]
    UnbekannterWert { schluessel: &'static str, wert: String },

    /// Pflicht-ID ist leer
    #[error("Leere ID: {0}")]
    LeereId(&'static str),
}

impl SoraError {
    /// Erstellt einen Fehler fuer einen unbekannten Aufzaehlungswert
    pub fn unbekannt(schluessel: &'static str, wert: impl Into<String>) -> Self {
        Self::UnbekannterWert {
            schluessel,
            wert: wert.into(),
        }
    }

    /// Wire-Schluessel auf den sich der Fehler bezieht
    pub fn schluessel(&self) -> &'static str {
        match self {
            Self::UnbekannterWert { schluessel, .. } => schluessel,
            Self::LeereId(schluessel) => schluessel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = SoraError::unbekannt("role", "sideways");
        assert_eq!(e.to_string(), "Unbekannter Wert fuer 'role': sideways");
        assert_eq!(e.schluessel(), "role");
    }

    #[test]
    fn leere_id_anzeige() {
        let e = SoraError::LeereId("channel_id");
        assert!(e.to_string().contains("channel_id"));
    }
}
