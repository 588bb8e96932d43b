// 🕸️ Ownership Graph Walker - depth-bounded traversal of holder chains
//
// Iterative: one work list of (entity name, depth) and one visited set per
// walk. Every failure becomes a terminal edge; nothing aborts the walk.

use crate::entities::{EdgeNote, EntityClass, EntityProfile, HolderRow, OwnershipEdge, RatioBasis};
use crate::error::{DataKind, TraceError};
use crate::provider::RegistryProvider;
use crate::ratio::RatioCalculator;
use crate::rules::ClassificationRules;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// Which pending entity is expanded next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraversalOrder {
    /// Stack order (depth-first, last pushed explored first)
    #[default]
    LastPushedFirst,

    /// Queue order (breadth-first)
    FirstPushedFirst,
}

pub struct OwnershipWalker<'a, P: ?Sized> {
    provider: &'a P,
    order: TraversalOrder,
    listed_exemption_ratio: Decimal,
    classification: ClassificationRules,
}

impl<'a, P: RegistryProvider + ?Sized> OwnershipWalker<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        OwnershipWalker {
            provider,
            order: TraversalOrder::default(),
            listed_exemption_ratio: Decimal::new(5, 1),
            classification: ClassificationRules::default(),
        }
    }

    pub fn with_order(mut self, order: TraversalOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_listed_exemption_ratio(mut self, ratio: Decimal) -> Self {
        self.listed_exemption_ratio = ratio;
        self
    }

    pub fn with_classification(mut self, rules: ClassificationRules) -> Self {
        self.classification = rules;
        self
    }

    /// Walk the ownership graph from `seed`, returning every edge sorted by
    /// (depth, source, title, person).
    pub fn walk(&self, seed: &str, max_depth: usize) -> Vec<OwnershipEdge> {
        let mut pending: VecDeque<(String, usize)> = VecDeque::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut edges = Vec::new();

        pending.push_back((seed.trim().to_string(), 0));

        while let Some((name, depth)) = self.next(&mut pending) {
            if depth > max_depth || name.is_empty() || visited.contains(&name) {
                continue;
            }
            visited.insert(name.clone());

            for child in self.expand(&name, depth, &mut edges) {
                pending.push_back((child, depth + 1));
            }
        }

        edges.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        edges
    }

    fn next(&self, pending: &mut VecDeque<(String, usize)>) -> Option<(String, usize)> {
        match self.order {
            TraversalOrder::LastPushedFirst => pending.pop_back(),
            TraversalOrder::FirstPushedFirst => pending.pop_front(),
        }
    }

    /// Expand one entity: append its edges, return the corporate holders
    /// to visit next.
    fn expand(&self, name: &str, depth: usize, edges: &mut Vec<OwnershipEdge>) -> Vec<String> {
        tracing::debug!(entity = name, depth, "expanding entity");

        let id = match self.provider.resolve_identifier(name) {
            Ok(Some(id)) => id,
            Ok(None) => {
                edges.push(self.terminal(name, None, depth, None, TraceError::lookup(name)));
                return Vec::new();
            }
            Err(e) => {
                let failure = TraceError::provider_failure(name, DataKind::Profile, &e);
                edges.push(self.terminal(name, None, depth, None, failure));
                return Vec::new();
            }
        };

        let profile: EntityProfile = match self.provider.fetch_profile(&id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                let failure = TraceError::unavailable(name, DataKind::Profile);
                edges.push(self.terminal(name, Some(id), depth, None, failure));
                return Vec::new();
            }
            Err(e) => {
                let failure = TraceError::provider_failure(name, DataKind::Profile, &e);
                edges.push(self.terminal(name, Some(id), depth, None, failure));
                return Vec::new();
            }
        };

        let class = self.classification.classify(&profile.business_activities);
        tracing::debug!(entity = name, class = class.as_str(), "classified entity");

        let calculator = RatioCalculator::for_profile(&profile);
        let basis = calculator.basis();

        let holders = match self.provider.fetch_holders(&id) {
            Ok(rows) if !rows.is_empty() => rows,
            Ok(_) => {
                let failure = TraceError::unavailable(name, DataKind::Holders);
                let mut edge = self.terminal(name, Some(id), depth, basis, failure);
                edge.source_class = Some(class);
                edges.push(edge);
                return Vec::new();
            }
            Err(e) => {
                let failure = TraceError::provider_failure(name, DataKind::Holders, &e);
                let mut edge = self.terminal(name, Some(id), depth, basis, failure);
                edge.source_class = Some(class);
                edges.push(edge);
                return Vec::new();
            }
        };

        let ratios = calculator.ratios(&holders);
        let mut children = Vec::new();

        for (row, ratio) in holders.iter().zip(ratios) {
            let mut edge = self.holder_edge(name, &id, depth, row, ratio, basis);
            edge.source_class = Some(class);

            if let Some(entity) = row.represented() {
                let listed = self
                    .provider
                    .is_listed(edge.target_id.as_deref().unwrap_or_default(), entity);
                let exempt = listed && ratio.is_some_and(|r| r > self.listed_exemption_ratio);

                if exempt {
                    edge.note = Some(EdgeNote::ListedExemption);
                    tracing::debug!(holder = entity, "listed holder exempt, not traversed");
                } else {
                    if listed {
                        edge.note = Some(EdgeNote::ListedHolder);
                    }
                    tracing::debug!(holder = entity, depth = depth + 1, "queueing corporate holder");
                    children.push(entity.to_string());
                }
            }

            edges.push(edge);
        }

        children
    }

    fn holder_edge(
        &self,
        source: &str,
        source_id: &str,
        depth: usize,
        row: &HolderRow,
        ratio: Option<Decimal>,
        basis: Option<RatioBasis>,
    ) -> OwnershipEdge {
        let target_id = row.represented().and_then(|entity| {
            match self.provider.resolve_identifier(entity) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(holder = entity, "identifier lookup failed: {}", e);
                    None
                }
            }
        });

        let note = if ratio.is_none() {
            Some(EdgeNote::Failure(TraceError::ComputationUndefined {
                holder: row.person_name.trim().to_string(),
            }))
        } else {
            None
        };

        OwnershipEdge {
            source_name: source.to_string(),
            source_id: Some(source_id.to_string()),
            depth,
            title: row.title.trim().to_string(),
            person_name: row.person_name.trim().to_string(),
            represented_entity: row.represented().unwrap_or_default().to_string(),
            held_shares: row.held_shares,
            invested_amount: row.invested_amount,
            target_id,
            is_corporate_representative: row.is_corporate_representative(),
            ratio,
            basis,
            note,
            source_class: None,
        }
    }

    fn terminal(
        &self,
        name: &str,
        id: Option<String>,
        depth: usize,
        basis: Option<RatioBasis>,
        failure: TraceError,
    ) -> OwnershipEdge {
        tracing::warn!(entity = name, depth, "branch terminated: {}", failure);
        OwnershipEdge::terminal(name, id, depth, basis, failure)
    }
}

// ============================================================================
// TESTS
// ============================================================================
