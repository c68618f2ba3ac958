use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Which of the three selection identifiers could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    /// Plant (usina) identifier.
    Plant,
    /// Intermediary server identifier.
    Server,
    /// Controller (CLP) identifier.
    Controller,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plant => write!(f, "plant"),
            Self::Server => write!(f, "server"),
            Self::Controller => write!(f, "controller"),
        }
    }
}

/// Monitor error types covering configuration, transport, and payload failures.
///
/// Every variant is recoverable: the polling session stores it in its state
/// and the next manual or automatic fetch starts from scratch.
#[derive(Debug, Error, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MonitorError {
    /// Required selection identifiers are missing.
    #[error("configuration incomplete: {reason}")]
    ConfigIncomplete {
        /// What is missing.
        reason: String,
    },

    /// An identifier is absent from the registry.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Which identifier failed.
        #[serde(rename = "identifier")]
        kind: IdentifierKind,
        /// The identifier value that was looked up.
        id: String,
    },

    /// Transport failure (unreachable host, refused connection, timeout).
    #[error("network error: {reason}")]
    Network {
        /// Transport error description.
        reason: String,
    },

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}")]
    Protocol {
        /// HTTP status code.
        status: u16,
    },

    /// The response body does not match the snapshot schema.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// Decoder error description.
        reason: String,
    },
}

impl MonitorError {
    /// Short machine-readable name of the error kind (used as a metric label).
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ConfigIncomplete { .. } => "config_incomplete",
            Self::NotFound { .. } => "not_found",
            Self::Network { .. } => "network",
            Self::Protocol { .. } => "protocol",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// Returns true for misconfiguration, which no retry can fix.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::ConfigIncomplete { .. } | Self::NotFound { .. })
    }
}

/// Convenience type alias for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
