//! Connection descriptor sent to the backend with every read request.
//!
//! Field names on the wire follow the backend's JSON schema; the Rust names
//! are descriptive.

use crate::iec_types::RegisterKind;
use serde::{Deserialize, Serialize};

/// One named register read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRead {
    /// Human-readable register name (key in the response).
    #[serde(rename = "nome")]
    pub name: String,
    /// Register address on the controller.
    pub addr: u32,
}

impl RegisterRead {
    /// Create a register read entry.
    pub fn new(name: impl Into<String>, addr: u32) -> Self {
        Self {
            name: name.into(),
            addr,
        }
    }
}

/// Register reads per group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterReads {
    /// Floating point registers.
    #[serde(rename = "REAL")]
    pub real: Vec<RegisterRead>,
    /// 16-bit integer registers.
    #[serde(rename = "INT")]
    pub int: Vec<RegisterRead>,
    /// 32-bit integer registers.
    #[serde(rename = "DINT")]
    pub dint: Vec<RegisterRead>,
    /// Duration registers.
    #[serde(rename = "TIME")]
    pub time: Vec<RegisterRead>,
}

impl RegisterReads {
    /// Registers of one group.
    #[must_use]
    pub fn group(&self, kind: RegisterKind) -> &[RegisterRead] {
        match kind {
            RegisterKind::Real => &self.real,
            RegisterKind::Int => &self.int,
            RegisterKind::Dint => &self.dint,
            RegisterKind::Time => &self.time,
        }
    }

    /// Total number of registers across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        RegisterKind::ALL.iter().map(|k| self.group(*k).len()).sum()
    }

    /// Returns true if no register is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolved request parameters for one controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    /// Logical table name of the plant.
    pub table: String,
    /// Numeric controller id.
    pub id: u32,
    /// Generating unit label (e.g. "UG-01").
    pub ug: String,
    /// Intermediary server address.
    #[serde(rename = "ip_servidor")]
    pub server_ip: String,
    /// Intermediary server port.
    #[serde(rename = "porta_servidor", with = "port_string")]
    pub server_port: u16,
    /// Controller address.
    #[serde(rename = "ip_clp")]
    pub controller_ip: String,
    /// Controller port.
    #[serde(rename = "porta_clp", with = "port_string")]
    pub controller_port: u16,
    /// Registers to read, per group.
    #[serde(rename = "leituras")]
    pub readings: RegisterReads,
}

/// Ports travel as strings ("502"); numbers are accepted on input.
pub(crate) mod port_string {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S>(port: &u16, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&port.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u16, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PortVisitor;

        impl<'de> Visitor<'de> for PortVisitor {
            type Value = u16;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a port number or a string holding one")
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u16::try_from(value).map_err(|_| E::custom(format!("port {value} out of range")))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u16::try_from(value).map_err(|_| E::custom(format!("port {value} out of range")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                value
                    .trim()
                    .parse()
                    .map_err(|_| E::custom(format!("invalid port '{value}'")))
            }
        }

        deserializer.deserialize_any(PortVisitor)
    }
}
