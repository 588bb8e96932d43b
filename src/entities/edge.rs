// 🔗 Ownership Edge - one holder row as seen from its source entity
//
// Append-only output of the walker. Terminal edges (lookup or data
// failures) carry empty holder fields and a Failure note.

use super::company::EntityClass;
use crate::error::TraceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// RATIO BASIS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioBasis {
    /// Held shares / issued shares
    Shares,

    /// Invested amount / total capital
    Capital,
}

impl RatioBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatioBasis::Shares => "shares",
            RatioBasis::Capital => "capital",
        }
    }
}

// ============================================================================
// EDGE NOTE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeNote {
    /// Branch could not be followed
    Failure(TraceError),

    /// Listed holder above the exemption ratio; not traversed
    ListedExemption,

    /// Listed holder at or below the exemption ratio
    ListedHolder,
}

impl fmt::Display for EdgeNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeNote::Failure(err) => write!(f, "{}", err),
            EdgeNote::ListedExemption => write!(f, "listed holder above exemption ratio, identification exempt"),
            EdgeNote::ListedHolder => write!(f, "listed holder"),
        }
    }
}

// ============================================================================
// OWNERSHIP EDGE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipEdge {
    /// Entity whose holder list produced this edge
    pub source_name: String,
    pub source_id: Option<String>,

    /// Traversal depth of the source entity (seed = 0)
    pub depth: usize,

    pub title: String,
    pub person_name: String,

    /// Represented corporate holder, empty for individuals
    pub represented_entity: String,

    pub held_shares: Option<Decimal>,
    pub invested_amount: Option<Decimal>,

    /// Resolved id of the represented entity
    pub target_id: Option<String>,

    pub is_corporate_representative: bool,
    pub ratio: Option<Decimal>,
    pub basis: Option<RatioBasis>,
    pub note: Option<EdgeNote>,

    /// Classification of the source entity, when its profile was fetched
    #[serde(default)]
    pub source_class: Option<EntityClass>,
}

impl OwnershipEdge {
    /// Terminal edge for a branch that could not be expanded.
    pub fn terminal(
        source_name: &str,
        source_id: Option<String>,
        depth: usize,
        basis: Option<RatioBasis>,
        failure: TraceError,
    ) -> Self {
        OwnershipEdge {
            source_name: source_name.to_string(),
            source_id,
            depth,
            title: String::new(),
            person_name: String::new(),
            represented_entity: String::new(),
            held_shares: None,
            invested_amount: None,
            target_id: None,
            is_corporate_representative: false,
            ratio: None,
            basis,
            note: Some(EdgeNote::Failure(failure)),
            source_class: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.note, Some(EdgeNote::Failure(_))) && self.person_name.is_empty()
    }

    /// Trimmed represented-entity name, None for individual seats.
    pub fn represented(&self) -> Option<&str> {
        let name = self.represented_entity.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Deterministic output order: depth, source, title, person.
    pub fn sort_key(&self) -> (usize, &str, &str, &str) {
        (
            self.depth,
            self.source_name.as_str(),
            self.title.as_str(),
            self.person_name.as_str(),
        )
    }
}
