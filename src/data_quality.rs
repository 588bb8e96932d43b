// ✅ Data Quality - disclosure completeness of a resolved edge set
//
// Sums every defined ratio in the walk (all depths) and flags the result
// when too little ownership is accounted for. Independent of which
// beneficial-owner branch the resolver took.

use crate::aggregation::percent;
use crate::entities::OwnershipEdge;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// QUALITY ISSUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Nothing disclosed; result cannot be relied on
    Warning,  // Result is likely incomplete
}

impl Severity {
    pub fn marker(&self) -> &'static str {
        match self {
            Severity::Critical => "❌",
            Severity::Warning => "⚠️",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

// ============================================================================
// DISCLOSURE REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureReport {
    /// Sum of every defined edge ratio
    pub total_disclosed: Decimal,
    pub threshold: Decimal,
    pub issue: Option<QualityIssue>,
}

impl DisclosureReport {
    pub fn is_complete(&self) -> bool {
        self.issue.is_none()
    }

    pub fn summary(&self) -> String {
        format!(
            "Disclosed: {} (threshold {}), {}",
            percent(self.total_disclosed),
            percent(self.threshold),
            if self.is_complete() { "complete" } else { "incomplete" }
        )
    }
}

// ============================================================================
// DISCLOSURE CHECKER
// ============================================================================

pub struct DisclosureChecker {
    threshold: Decimal,
}

impl DisclosureChecker {
    pub fn new(threshold: Decimal) -> Self {
        DisclosureChecker { threshold }
    }

    pub fn total_disclosed(edges: &[OwnershipEdge]) -> Decimal {
        edges
            .iter()
            .filter_map(|e| e.ratio)
            .fold(Decimal::ZERO, |acc, r| acc.checked_add(r).unwrap_or(Decimal::MAX))
    }

    pub fn check(&self, edges: &[OwnershipEdge]) -> DisclosureReport {
        let total = Self::total_disclosed(edges);

        let issue = if total < self.threshold && total.is_zero() {
            tracing::warn!(threshold = %self.threshold, "no holdings disclosed");
            Some(QualityIssue {
                severity: Severity::Critical,
                field: "ratio".to_string(),
                issue: "no director or shareholder holdings disclosed; ownership cannot be determined"
                    .to_string(),
                recommendation:
                    "request the shareholder register or ownership documents before relying on this result"
                        .to_string(),
            })
        } else if total < self.threshold {
            tracing::warn!(total = %total, threshold = %self.threshold, "disclosure below threshold");
            Some(QualityIssue {
                severity: Severity::Warning,
                field: "ratio".to_string(),
                issue: format!(
                    "director and shareholder holdings total only {}; undisclosed shareholders likely",
                    percent(total)
                ),
                recommendation:
                    "request the shareholder register or ownership documents to identify the remaining holders"
                        .to_string(),
            })
        } else {
            None
        };

        DisclosureReport {
            total_disclosed: total,
            threshold: self.threshold,
            issue,
        }
    }
}

impl Default for DisclosureChecker {
    fn default() -> Self {
        Self::new(Decimal::new(75, 2))
    }
}

// ============================================================================
// TESTS
// ============================================================================
