//! Threshold-based status classification.

use crate::config::{PlantStatusRules, Thresholds};
use crate::iec_types::RegisterKind;
use crate::panels::is_temperature;
use crate::snapshot::{ReadingSnapshot, ReadingValue};
use serde::Serialize;
use std::fmt;

/// Status indicator of a single reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Below the warning threshold, or a textual reading.
    Normal,
    /// At or above the warning threshold.
    Warning,
    /// At or above the critical threshold.
    Critical,
    /// No value.
    Unknown,
}

impl StatusLevel {
    /// Classify one reading.
    #[must_use]
    pub fn classify(value: &ReadingValue, thresholds: &Thresholds) -> Self {
        match value {
            ReadingValue::Number(v) if *v >= thresholds.critical => Self::Critical,
            ReadingValue::Number(v) if *v >= thresholds.warning => Self::Warning,
            ReadingValue::Number(_) | ReadingValue::Text(_) => Self::Normal,
            ReadingValue::Missing => Self::Unknown,
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Plant-wide status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlantStatus {
    /// Nothing out of range.
    Normal,
    /// A monitored pressure is low.
    Attention,
    /// A temperature is above the alert limit.
    Alert,
}

impl PlantStatus {
    /// Derive the badge from the `REAL` readings.
    ///
    /// Temperature has priority: any temperature above the limit is an alert
    /// regardless of pressures.
    #[must_use]
    pub fn derive(snapshot: &ReadingSnapshot, rules: &PlantStatusRules) -> Self {
        let real = snapshot.group(RegisterKind::Real);

        let hot = real
            .iter()
            .filter(|(name, _)| is_temperature(name))
            .filter_map(|(_, value)| value.as_f64())
            .any(|t| t > rules.temperature_alert);
        if hot {
            return Self::Alert;
        }

        let low_pressure = rules
            .pressure_registers
            .iter()
            .filter_map(|name| real.get(name).and_then(ReadingValue::as_f64))
            .any(|p| p < rules.pressure_attention);
        if low_pressure {
            return Self::Attention;
        }

        Self::Normal
    }
}

impl fmt::Display for PlantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "Normal"),
            Self::Attention => write!(f, "Attention"),
            Self::Alert => write!(f, "Alert"),
        }
    }
}
