// 🧮 Path Aggregator - root-to-leaf chains for natural-person holders
//
// Each natural-person leaf is walked upward one depth at a time, matching
// the parent edge whose represented entity is the leaf's source. The chain
// product is that person's contribution; contributions are summed per name.

use crate::entities::OwnershipEdge;
use crate::rules::PersonDetector;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// Entity whose holder list contains this step
    pub entity: String,
    pub ratio: Decimal,
}

/// Ownership chain from the outermost resolved entity down to a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipPath {
    pub person: String,

    /// Root first, leaf last
    pub steps: Vec<PathStep>,
}

impl OwnershipPath {
    /// Product of every step ratio. Saturates instead of overflowing on
    /// nonsensical registry data.
    pub fn contribution(&self) -> Decimal {
        self.steps.iter().fold(Decimal::ONE, |acc, step| {
            acc.checked_mul(step.ratio).unwrap_or(Decimal::MAX)
        })
    }

    /// Audit line, e.g.
    /// `王大明: 甲公司 → 乙公司\n  calc: 40.00% × 60.00% = 24.00%`
    pub fn describe(&self) -> String {
        let chain: Vec<&str> = self.steps.iter().map(|s| s.entity.as_str()).collect();
        let factors: Vec<String> = self.steps.iter().map(|s| percent(s.ratio)).collect();

        format!(
            "{}: {}\n  calc: {} = {}",
            self.person,
            chain.join(" → "),
            factors.join(" × "),
            percent(self.contribution())
        )
    }
}

pub fn percent(ratio: Decimal) -> String {
    let scaled = ratio
        .checked_mul(Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::MAX);
    format!("{:.2}%", scaled)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    /// Persons whose summed contribution exceeds the threshold
    pub person_shares: BTreeMap<String, Decimal>,

    /// Every reconstructed path, in leaf order
    pub paths: Vec<OwnershipPath>,

    /// One `describe()` entry per path
    pub log: Vec<String>,
}

pub struct PathAggregator<'a> {
    detector: &'a dyn PersonDetector,
}

impl<'a> PathAggregator<'a> {
    pub fn new(detector: &'a dyn PersonDetector) -> Self {
        PathAggregator { detector }
    }

    /// Rebuild every natural-person path. `edges` must be in walker order
    /// (depth, source, title, person); the first matching parent wins.
    pub fn paths(&self, edges: &[OwnershipEdge]) -> Vec<OwnershipPath> {
        edges
            .iter()
            .filter(|edge| self.is_leaf(edge))
            .filter_map(|leaf| {
                let ratio = leaf.ratio?;
                let mut steps = vec![PathStep {
                    entity: leaf.source_name.clone(),
                    ratio,
                }];
                let mut current = leaf.source_name.as_str();

                for depth in (0..leaf.depth).rev() {
                    let parent = edges
                        .iter()
                        .find(|e| e.depth == depth && e.represented() == Some(current));
                    let Some(parent) = parent else { break };
                    let Some(parent_ratio) = parent.ratio else { break };

                    steps.push(PathStep {
                        entity: parent.source_name.clone(),
                        ratio: parent_ratio,
                    });
                    current = parent.source_name.as_str();
                }

                steps.reverse();
                Some(OwnershipPath {
                    person: leaf.person_name.clone(),
                    steps,
                })
            })
            .collect()
    }

    /// Sum path contributions per person and keep those strictly above
    /// `threshold`.
    pub fn aggregate(&self, edges: &[OwnershipEdge], threshold: Decimal) -> Aggregation {
        let paths = self.paths(edges);
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
        let mut log = Vec::with_capacity(paths.len());

        for path in &paths {
            let total = totals.entry(path.person.clone()).or_insert(Decimal::ZERO);
            *total = total.checked_add(path.contribution()).unwrap_or(Decimal::MAX);

            let line = path.describe();
            tracing::debug!("{}", line);
            log.push(line);
        }

        totals.retain(|_, share| *share > threshold);

        Aggregation {
            person_shares: totals,
            paths,
            log,
        }
    }

    fn is_leaf(&self, edge: &OwnershipEdge) -> bool {
        edge.ratio.is_some()
            && edge.represented().is_none()
            && self.detector.is_natural_person(&edge.person_name)
    }
}

// ============================================================================
// TESTS
// ============================================================================
