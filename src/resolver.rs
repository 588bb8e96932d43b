// 🎯 Ownership Resolver - seed entity in, beneficial owners out
//
// Pipeline per call: seed pre-checks → walk → aggregate → (fallback) →
// disclosure check. Every call returns a Resolution; provider failures end
// up as terminal edges or warnings, never as errors.

use crate::aggregation::PathAggregator;
use crate::config::ResolverConfig;
use crate::data_quality::DisclosureChecker;
use crate::entities::{BeneficialOwnerRecord, Entity, OwnershipEdge};
use crate::fallback::FallbackEngine;
use crate::provider::RegistryProvider;
use crate::rules::{KeywordPersonDetector, PersonDetector};
use crate::walker::OwnershipWalker;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

// ============================================================================
// RESOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionStatus {
    /// At least one natural person above the threshold
    Identified,

    /// A listed holder above the exemption ratio waives identification
    ListedHolderExempt,

    /// Corporate-holder or senior-management fallback applied
    FallbackApplied,

    /// Nothing to report, not even senior officers
    Unidentified,

    /// The seed itself is listed; not walked
    SeedListed,

    /// The seed's registration status is not approved; not walked
    NotApproved,
}

impl ResolutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionStatus::Identified => "identified",
            ResolutionStatus::ListedHolderExempt => "listed holder exempt",
            ResolutionStatus::FallbackApplied => "fallback applied",
            ResolutionStatus::Unidentified => "unidentified",
            ResolutionStatus::SeedListed => "seed listed",
            ResolutionStatus::NotApproved => "not approved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub run_id: Uuid,
    pub seed: String,
    pub resolved_at: DateTime<Utc>,
    pub status: ResolutionStatus,

    /// Seed as found in the registry, if it could be resolved
    pub seed_entity: Option<Entity>,

    pub edges: Vec<OwnershipEdge>,
    pub beneficial_owners: Vec<BeneficialOwnerRecord>,
    pub calculation_log: Vec<String>,
    pub warnings: Vec<String>,

    /// SHA-256 over the edge collection, hex encoded
    pub fingerprint: String,
}

/// Hex SHA-256 of the serialised edges. Identical registry data yields an
/// identical fingerprint across runs.
pub fn edge_fingerprint(edges: &[OwnershipEdge]) -> String {
    let mut hasher = Sha256::new();
    for edge in edges {
        match serde_json::to_vec(edge) {
            Ok(bytes) => hasher.update(&bytes),
            Err(e) => tracing::warn!("edge not hashable: {}", e),
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// RESOLVER
// ============================================================================

pub struct OwnershipResolver<P> {
    provider: P,
    config: ResolverConfig,
    detector: Arc<dyn PersonDetector>,
}

impl<P: RegistryProvider> OwnershipResolver<P> {
    pub fn new(provider: P, config: ResolverConfig) -> Self {
        let detector = Arc::new(KeywordPersonDetector::new(config.entity_markers.clone()));
        OwnershipResolver {
            provider,
            config,
            detector,
        }
    }

    /// Replace the legal-entity suffix heuristic with another predicate.
    pub fn with_person_detector(mut self, detector: impl PersonDetector + 'static) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn resolve(&self, seed: &str) -> Resolution {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let resolved_at = Utc::now();
        let seed = seed.trim().to_string();

        let seed_entity = self.seed_entity(&seed);
        let mut warnings = Vec::new();

        let early = seed_entity.as_ref().and_then(|entity| self.pre_check(entity));
        let (status, edges, beneficial_owners, calculation_log) = match early {
            Some((status, warning)) => {
                warnings.push(warning);
                (status, Vec::new(), Vec::new(), Vec::new())
            }
            None => {
                // walk by registered name so the visited set can recognise the seed again
                let root = seed_entity
                    .as_ref()
                    .map(|entity| entity.name().to_string())
                    .unwrap_or_else(|| seed.clone());
                let (status, edges, owners, log) = self.trace(&root);
                let report = DisclosureChecker::new(self.config.disclosure_threshold).check(&edges);
                if let Some(issue) = report.issue {
                    warnings.push(format!("{} {}", issue.severity.marker(), issue.issue));
                    warnings.push(issue.recommendation);
                }
                (status, edges, owners, log)
            }
        };

        let fingerprint = edge_fingerprint(&edges);

        tracing::info!(
            "resolve: seed={} run={} status={} edges={} owners={} in {}ms",
            seed,
            run_id,
            status.as_str(),
            edges.len(),
            beneficial_owners.len(),
            started.elapsed().as_millis()
        );

        Resolution {
            run_id,
            seed,
            resolved_at,
            status,
            seed_entity,
            edges,
            beneficial_owners,
            calculation_log,
            warnings,
            fingerprint,
        }
    }

    fn trace(
        &self,
        root: &str,
    ) -> (ResolutionStatus, Vec<OwnershipEdge>, Vec<BeneficialOwnerRecord>, Vec<String>) {
        let edges = OwnershipWalker::new(&self.provider)
            .with_order(self.config.traversal_order)
            .with_listed_exemption_ratio(self.config.listed_exemption_ratio)
            .with_classification(self.config.classification.clone())
            .walk(root, self.config.max_depth);

        let aggregation = PathAggregator::new(self.detector.as_ref())
            .aggregate(&edges, self.config.natural_person_threshold);

        if !aggregation.person_shares.is_empty() {
            let mut owners: Vec<BeneficialOwnerRecord> = aggregation
                .person_shares
                .into_iter()
                .map(|(name, ratio)| BeneficialOwnerRecord::NaturalPerson { name, ratio })
                .collect();
            // largest holding first; BTreeMap order breaks ties by name
            owners.sort_by(|a, b| b.ratio().cmp(&a.ratio()));
            return (ResolutionStatus::Identified, edges, owners, aggregation.log);
        }

        let owners = FallbackEngine::new(&self.provider, &self.config.titles, self.config.fallback_threshold)
            .with_listed_exemption_ratio(self.config.listed_exemption_ratio)
            .determine(&edges);

        let status = match owners.first() {
            Some(BeneficialOwnerRecord::ListedExemption { .. }) => ResolutionStatus::ListedHolderExempt,
            Some(_) => ResolutionStatus::FallbackApplied,
            None => ResolutionStatus::Unidentified,
        };

        (status, edges, owners, aggregation.log)
    }

    /// Seed gates that end the call before walking.
    fn pre_check(&self, entity: &Entity) -> Option<(ResolutionStatus, String)> {
        if let Some(approved) = self.config.approved_status.as_deref() {
            if entity.profile.status != approved {
                return Some((
                    ResolutionStatus::NotApproved,
                    format!(
                        "⚠️ '{}' registration status is '{}', not '{}'; manual review required",
                        entity.name(),
                        entity.profile.status,
                        approved
                    ),
                ));
            }
        }

        if entity.listed && self.config.exempt_listed_seed {
            return Some((
                ResolutionStatus::SeedListed,
                format!(
                    "'{}' is a listed company; beneficial-owner identification exempt",
                    entity.name()
                ),
            ));
        }

        None
    }

    /// Resolve and profile the seed. Any failure is left for the walker to
    /// record as a terminal edge.
    fn seed_entity(&self, seed: &str) -> Option<Entity> {
        let id = match self.provider.resolve_identifier(seed) {
            Ok(id) => id?,
            Err(e) => {
                tracing::warn!(seed, "seed lookup failed: {}", e);
                return None;
            }
        };

        let mut profile = match self.provider.fetch_profile(&id) {
            Ok(profile) => profile?,
            Err(e) => {
                tracing::warn!(seed, "seed profile failed: {}", e);
                return None;
            }
        };
        if profile.name.is_empty() {
            profile.name = seed.to_string();
        }

        let classification = self.config.classification.classify(&profile.business_activities);
        let listed = self.provider.is_listed(&id, &profile.name);

        Some(Entity {
            id,
            profile,
            classification,
            listed,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntityClass, HolderRow, RawProfile};
    use crate::provider::FixtureProvider;
    use rust_decimal::Decimal;

    fn approved(issued: &str) -> Option<RawProfile> {
        Some(RawProfile {
            status: Some("核准設立".to_string()),
            issued_shares: Some(issued.to_string()),
            business_activities: Some("H201010一般投資業".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_not_approved_seed_is_not_walked() {
        let provider = FixtureProvider::new().company(
            "10000001",
            "甲公司",
            Some(RawProfile {
                status: Some("解散".to_string()),
                ..Default::default()
            }),
            vec![HolderRow::individual("董事長", "王大明", Some(Decimal::from(600)))],
        );

        let resolution = OwnershipResolver::new(provider, ResolverConfig::default()).resolve("甲公司");

        assert_eq!(resolution.status, ResolutionStatus::NotApproved);
        assert!(resolution.edges.is_empty());
        assert_eq!(resolution.warnings.len(), 1);
        assert!(resolution.warnings[0].contains("解散"));
    }

    #[test]
    fn test_status_gate_can_be_disabled() {
        let provider = FixtureProvider::new().company(
            "10000001",
            "甲公司",
            Some(RawProfile {
                issued_shares: Some("1000".to_string()),
                ..Default::default()
            }),
            vec![HolderRow::individual("董事長", "王大明", Some(Decimal::from(600)))],
        );
        let config = ResolverConfig::default().with_approved_status(None);

        let resolution = OwnershipResolver::new(provider, config).resolve("甲公司");

        assert_eq!(resolution.status, ResolutionStatus::Identified);
    }

    #[test]
    fn test_listed_seed_is_exempt() {
        let provider = FixtureProvider::new()
            .company("22099131", "上市公司", approved("1000"), Vec::new())
            .with_listed({
                let mut listed = crate::listed::ListedRegistry::new();
                listed.insert("22099131", "");
                listed
            });

        let resolution = OwnershipResolver::new(provider, ResolverConfig::default()).resolve("22099131");

        assert_eq!(resolution.status, ResolutionStatus::SeedListed);
        let seed = resolution.seed_entity.unwrap();
        assert!(seed.listed);
        assert_eq!(seed.classification, EntityClass::PassiveNonFinancial);
    }

    #[test]
    fn test_unresolvable_seed_still_walks() {
        let resolution =
            OwnershipResolver::new(FixtureProvider::new(), ResolverConfig::default()).resolve("無此公司");

        assert_eq!(resolution.status, ResolutionStatus::Unidentified);
        assert!(resolution.seed_entity.is_none());
        assert_eq!(resolution.edges.len(), 1);
        assert!(resolution.edges[0].is_terminal());
        // nothing disclosed at all
        assert_eq!(resolution.warnings.len(), 2);
        assert!(resolution.warnings[0].starts_with("❌ no director or shareholder holdings"));
    }

    #[test]
    fn test_custom_person_detector() {
        let provider = FixtureProvider::new().company(
            "10000001",
            "Acme Trading Ltd",
            approved("1000"),
            vec![
                HolderRow::individual("Director", "Jane Doe", Some(Decimal::from(600))),
                HolderRow::individual("Director", "Nominee Holdings Ltd", Some(Decimal::from(400))),
            ],
        );
        let detector = |name: &str| !name.ends_with("Ltd");

        let resolution = OwnershipResolver::new(provider, ResolverConfig::default())
            .with_person_detector(detector)
            .resolve("Acme Trading Ltd");

        assert_eq!(
            resolution.beneficial_owners,
            vec![BeneficialOwnerRecord::NaturalPerson {
                name: "Jane Doe".to_string(),
                ratio: Decimal::new(6, 1),
            }]
        );
    }

    #[test]
    fn test_fingerprint_is_stable_across_runs() {
        let provider = FixtureProvider::new().company(
            "10000001",
            "甲公司",
            approved("1000"),
            vec![HolderRow::individual("董事長", "王大明", Some(Decimal::from(600)))],
        );
        let resolver = OwnershipResolver::new(provider, ResolverConfig::default());

        let first = resolver.resolve("甲公司");
        let second = resolver.resolve("甲公司");

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.fingerprint, second.fingerprint);
        assert_eq!(first.fingerprint.len(), 64);
    }
}
