//! IEC 61131-3 data types used to group controller registers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Register group, named after the controller's elementary data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegisterKind {
    /// 32-bit floating point.
    Real,
    /// 16-bit signed integer.
    Int,
    /// 32-bit signed integer.
    Dint,
    /// Duration.
    Time,
}

impl RegisterKind {
    /// All groups in wire order.
    pub const ALL: [RegisterKind; 4] = [Self::Real, Self::Int, Self::Dint, Self::Time];

    /// Group name as used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "REAL",
            Self::Int => "INT",
            Self::Dint => "DINT",
            Self::Time => "TIME",
        }
    }
}

impl fmt::Display for RegisterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
