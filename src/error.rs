//! Error taxonomy for ownership resolution.
//!
//! Two layers:
//! - [`ProviderError`] is what a registry collaborator returns when a call
//!   fails outright (timeout, transport, unparseable payload).
//! - [`TraceError`] is what the walker records on an edge when a branch
//!   cannot be followed. It never escapes a resolution call.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which piece of registry data was missing for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataKind {
    Profile,
    Holders,
}

impl DataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Profile => "profile",
            DataKind::Holders => "holder",
        }
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_ref()
        .map(|r| format!(": {}", r))
        .unwrap_or_default()
}

/// Failures recorded on terminal edges. None of them abort a resolution.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TraceError {
    #[error("identifier not found for '{name}'")]
    LookupFailure { name: String },

    #[error("no {kind} data for '{entity}'{}", reason_suffix(.reason))]
    DataUnavailable {
        entity: String,
        kind: DataKind,
        reason: Option<String>,
    },

    #[error("ratio undefined for '{holder}': missing numerator or denominator")]
    ComputationUndefined { holder: String },
}

impl TraceError {
    pub fn lookup(name: &str) -> Self {
        TraceError::LookupFailure {
            name: name.to_string(),
        }
    }

    pub fn unavailable(entity: &str, kind: DataKind) -> Self {
        TraceError::DataUnavailable {
            entity: entity.to_string(),
            kind,
            reason: None,
        }
    }

    /// Provider call failed outright; the reason is kept for the audit trail.
    pub fn provider_failure(entity: &str, kind: DataKind, err: &ProviderError) -> Self {
        TraceError::DataUnavailable {
            entity: entity.to_string(),
            kind,
            reason: Some(err.to_string()),
        }
    }
}

/// Errors surfaced by registry collaborators.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("registry call timed out after {millis}ms")]
    Timeout { millis: u64 },

    #[error("registry transport error: {0}")]
    Transport(String),

    #[error("malformed registry payload: {0}")]
    Malformed(String),
}
