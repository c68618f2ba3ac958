//! Reading snapshots returned by the backend.

use crate::error::{MonitorError, MonitorResult};
use crate::iec_types::RegisterKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Current value of one register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    /// Numeric reading.
    Number(f64),
    /// Textual reading (some backends report status words as text).
    Text(String),
    /// The backend returned `null` for this register.
    Missing,
}

impl ReadingValue {
    /// Numeric value, if this reading is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for ReadingValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ReadingValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl fmt::Display for ReadingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Missing => f.write_str("null"),
        }
    }
}

/// Register name to value, ordered by name.
pub type ReadingGroup = BTreeMap<String, ReadingValue>;

/// Full set of register values from one successful fetch.
///
/// Groups missing from the response deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingSnapshot {
    /// Floating point readings.
    #[serde(rename = "REAL")]
    pub real: ReadingGroup,
    /// 16-bit integer readings.
    #[serde(rename = "INT")]
    pub int: ReadingGroup,
    /// 32-bit integer readings.
    #[serde(rename = "DINT")]
    pub dint: ReadingGroup,
    /// Duration readings.
    #[serde(rename = "TIME")]
    pub time: ReadingGroup,
}

impl ReadingSnapshot {
    /// Decode a backend response body.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::MalformedResponse`] if the body is not a JSON
    /// object of groups mapping names to numbers, strings, or null.
    pub fn from_json(body: &[u8]) -> MonitorResult<Self> {
        serde_json::from_slice(body).map_err(|e| MonitorError::MalformedResponse {
            reason: e.to_string(),
        })
    }

    /// Readings of one group.
    #[must_use]
    pub fn group(&self, kind: RegisterKind) -> &ReadingGroup {
        match kind {
            RegisterKind::Real => &self.real,
            RegisterKind::Int => &self.int,
            RegisterKind::Dint => &self.dint,
            RegisterKind::Time => &self.time,
        }
    }

    /// Mutable readings of one group.
    pub fn group_mut(&mut self, kind: RegisterKind) -> &mut ReadingGroup {
        match kind {
            RegisterKind::Real => &mut self.real,
            RegisterKind::Int => &mut self.int,
            RegisterKind::Dint => &mut self.dint,
            RegisterKind::Time => &mut self.time,
        }
    }

    /// Look up a reading by group and name.
    #[must_use]
    pub fn get(&self, kind: RegisterKind, name: &str) -> Option<&ReadingValue> {
        self.group(kind).get(name)
    }

    /// Total number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        RegisterKind::ALL.iter().map(|k| self.group(*k).len()).sum()
    }

    /// Returns true if no group holds a reading.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every reading with its group.
    pub fn iter(&self) -> impl Iterator<Item = (RegisterKind, &str, &ReadingValue)> {
        RegisterKind::ALL.into_iter().flat_map(move |kind| {
            self.group(kind)
                .iter()
                .map(move |(name, value)| (kind, name.as_str(), value))
        })
    }
}
