//! Grouping of readings into dashboard panels and value formatting.

use crate::config::Thresholds;
use crate::iec_types::RegisterKind;
use crate::snapshot::{ReadingSnapshot, ReadingValue};
use crate::status::StatusLevel;
use serde::Serialize;

/// Functional group shown as one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    /// Generator phase voltages and excitation.
    Generator,
    /// Turbine position and flow.
    Turbine,
    /// Hydraulic units and water levels.
    Hydraulic,
    /// RTD temperatures.
    Temperature,
}

impl PanelKind {
    /// Cards in display order.
    pub const ALL: [PanelKind; 4] = [
        Self::Generator,
        Self::Turbine,
        Self::Hydraulic,
        Self::Temperature,
    ];

    /// Card title.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Generator => "Gerador",
            Self::Turbine => "Turbina",
            Self::Hydraulic => "Sistema Hidráulico",
            Self::Temperature => "Temperaturas",
        }
    }

    /// Does a `REAL` register belong on this card.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Generator => name.starts_with("Gerador_"),
            Self::Turbine => name.starts_with("Turbina_"),
            Self::Hydraulic => ["UHLM_", "UHRV_", "QCC_", "QTA_"]
                .iter()
                .any(|prefix| name.starts_with(prefix)),
            Self::Temperature => is_temperature(name),
        }
    }
}

/// Temperature registers are the RTD channels.
#[must_use]
pub fn is_temperature(name: &str) -> bool {
    name.contains("RTD")
}

/// Format a reading for display.
///
/// Speeds and flows are whole numbers; other numbers keep two decimals.
#[must_use]
pub fn format_value(name: &str, value: &ReadingValue) -> String {
    match value {
        ReadingValue::Missing => "N/A".to_string(),
        ReadingValue::Number(v) if name.contains("Velocidade") || name.contains("Vazao") => {
            format!("{:.0}", round_half_up(*v))
        }
        ReadingValue::Number(v) => format!("{v:.2}"),
        ReadingValue::Text(s) => s.clone(),
    }
}

/// Round halves toward positive infinity, never yielding `-0`.
fn round_half_up(v: f64) -> f64 {
    let rounded = (v + 0.5).floor();
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// One row of a card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelEntry {
    /// Register name.
    pub name: String,
    /// Raw value.
    pub value: ReadingValue,
    /// Display string.
    pub display: String,
    /// Status indicator.
    pub status: StatusLevel,
}

/// A card with its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    /// Functional group.
    pub kind: PanelKind,
    /// Card title.
    pub title: &'static str,
    /// Rows ordered by register name.
    pub entries: Vec<PanelEntry>,
}

/// Split the `REAL` readings of a snapshot into the four cards.
#[must_use]
pub fn build_panels(snapshot: &ReadingSnapshot, thresholds: &Thresholds) -> Vec<Panel> {
    let real = snapshot.group(RegisterKind::Real);

    PanelKind::ALL
        .iter()
        .map(|kind| Panel {
            kind: *kind,
            title: kind.title(),
            entries: real
                .iter()
                .filter(|(name, _)| kind.matches(name))
                .map(|(name, value)| PanelEntry {
                    name: name.clone(),
                    value: value.clone(),
                    display: format_value(name, value),
                    status: StatusLevel::classify(value, thresholds),
                })
                .collect(),
        })
        .collect()
}
