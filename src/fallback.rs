// 🪜 Fallback Engine - who to report when no person clears the threshold
//
// Three tiers over the seed's own (depth 0) holder rows, first non-empty
// tier wins:
//   1. a listed corporate holder above the exemption ratio
//   2. every corporate holder above the threshold, with its representative
//   3. senior officers of the seed

use crate::entities::{BeneficialOwnerRecord, OwnershipEdge};
use crate::provider::RegistryProvider;
use crate::rules::TitleRules;
use rust_decimal::Decimal;

/// One distinct corporate holder of the seed.
#[derive(Debug, Clone, PartialEq)]
struct RootHolder<'e> {
    entity: &'e str,
    entity_id: Option<&'e str>,
    ratio: Option<Decimal>,
}

pub struct FallbackEngine<'a, P: ?Sized> {
    provider: &'a P,
    titles: &'a TitleRules,
    threshold: Decimal,
    listed_exemption_ratio: Decimal,
}

impl<'a, P: RegistryProvider + ?Sized> FallbackEngine<'a, P> {
    pub fn new(provider: &'a P, titles: &'a TitleRules, threshold: Decimal) -> Self {
        FallbackEngine {
            provider,
            titles,
            threshold,
            listed_exemption_ratio: Decimal::new(5, 1),
        }
    }

    pub fn with_listed_exemption_ratio(mut self, ratio: Decimal) -> Self {
        self.listed_exemption_ratio = ratio;
        self
    }

    pub fn determine(&self, edges: &[OwnershipEdge]) -> Vec<BeneficialOwnerRecord> {
        let holders = root_corporate_holders(edges);

        if let Some(record) = self.listed_exemption(&holders) {
            tracing::debug!("fallback: listed holder exemption");
            return vec![record];
        }

        let corporate = self.corporate_holders(&holders);
        if !corporate.is_empty() {
            tracing::debug!(count = corporate.len(), "fallback: corporate holders above threshold");
            return corporate;
        }

        let senior = self.senior_management(edges);
        tracing::debug!(count = senior.len(), "fallback: senior management");
        senior
    }

    fn listed_exemption(&self, holders: &[RootHolder<'_>]) -> Option<BeneficialOwnerRecord> {
        holders.iter().find_map(|h| {
            let ratio = h.ratio.filter(|r| *r > self.listed_exemption_ratio)?;
            if !self.provider.is_listed(h.entity_id.unwrap_or_default(), h.entity) {
                return None;
            }
            Some(BeneficialOwnerRecord::ListedExemption {
                entity: h.entity.to_string(),
                entity_id: h.entity_id.map(str::to_string),
                ratio,
            })
        })
    }

    fn corporate_holders(&self, holders: &[RootHolder<'_>]) -> Vec<BeneficialOwnerRecord> {
        holders
            .iter()
            .filter_map(|h| {
                let ratio = h.ratio.filter(|r| *r > self.threshold)?;
                Some(BeneficialOwnerRecord::CorporateHolderFallback {
                    entity: h.entity.to_string(),
                    entity_id: h.entity_id.map(str::to_string),
                    ratio,
                    representative: self.representative_of(h),
                })
            })
            .collect()
    }

    fn senior_management(&self, edges: &[OwnershipEdge]) -> Vec<BeneficialOwnerRecord> {
        edges
            .iter()
            .filter(|e| e.depth == 0 && !e.is_terminal() && self.titles.is_senior(&e.title))
            .map(|e| BeneficialOwnerRecord::SeniorManagementFallback {
                name: e.person_name.clone(),
                title: e.title.clone(),
            })
            .collect()
    }

    /// Chairman of the holder's own board, else its registered representative.
    fn representative_of(&self, holder: &RootHolder<'_>) -> Option<String> {
        let id = match holder.entity_id {
            Some(id) => id.to_string(),
            None => self.provider.resolve_identifier(holder.entity).ok()??,
        };

        let rows = match self.provider.fetch_holders(&id) {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(holder = holder.entity, "representative lookup failed: {}", e);
                return None;
            }
        };

        rows.iter()
            .find(|r| self.titles.is_chairman(r.title.trim()))
            .or_else(|| rows.iter().find(|r| self.titles.is_representative(r.title.trim())))
            .map(|r| r.person_name.trim().to_string())
            .filter(|name| !name.is_empty())
    }
}

/// Distinct corporate holders on the seed's own rows, first appearance
/// order. All seats of one holder carry the same de-duplicated ratio.
fn root_corporate_holders(edges: &[OwnershipEdge]) -> Vec<RootHolder<'_>> {
    let mut holders: Vec<RootHolder<'_>> = Vec::new();
    for edge in edges.iter().filter(|e| e.depth == 0 && e.is_corporate_representative) {
        let Some(entity) = edge.represented() else { continue };
        if holders.iter().any(|h| h.entity == entity) {
            continue;
        }
        holders.push(RootHolder {
            entity,
            entity_id: edge.target_id.as_deref(),
            ratio: edge.ratio,
        });
    }
    holders
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{HolderRow, RatioBasis};
    use crate::provider::FixtureProvider;

    fn root_edge(title: &str, person: &str, represented: &str, ratio: Option<Decimal>, target: Option<&str>) -> OwnershipEdge {
        OwnershipEdge {
            source_name: "甲公司".to_string(),
            source_id: Some("10000001".to_string()),
            depth: 0,
            title: title.to_string(),
            person_name: person.to_string(),
            represented_entity: represented.to_string(),
            held_shares: None,
            invested_amount: None,
            target_id: target.map(str::to_string),
            is_corporate_representative: !represented.is_empty(),
            ratio,
            basis: Some(RatioBasis::Shares),
            note: None,
            source_class: None,
        }
    }

    fn ratio(pct: i64) -> Option<Decimal> {
        Some(Decimal::new(pct, 2))
    }

    fn provider() -> FixtureProvider {
        FixtureProvider::new()
            .company(
                "20000001",
                "乙投資股份有限公司",
                None,
                vec![
                    HolderRow::individual("董事", "李四", None),
                    HolderRow::individual("董事長", "陳小美", None),
                ],
            )
            .company(
                "20000002",
                "丙投資股份有限公司",
                None,
                vec![HolderRow::individual("代表人", "林大山", None)],
            )
            .listed_company("30000001", "上市股份有限公司")
    }

    #[test]
    fn test_listed_exemption_stops_other_tiers() {
        let edges = vec![
            root_edge("董事", "王一", "乙投資股份有限公司", ratio(30), Some("20000001")),
            root_edge("董事", "王二", "上市股份有限公司", ratio(55), Some("30000001")),
            root_edge("董事長", "王三", "", ratio(5), None),
        ];
        let titles = TitleRules::default();
        let provider = provider();

        let records = FallbackEngine::new(&provider, &titles, Decimal::new(25, 2)).determine(&edges);

        assert_eq!(
            records,
            vec![BeneficialOwnerRecord::ListedExemption {
                entity: "上市股份有限公司".to_string(),
                entity_id: Some("30000001".to_string()),
                ratio: Decimal::new(55, 2),
            }]
        );
    }

    #[test]
    fn test_corporate_holders_with_representatives() {
        let edges = vec![
            root_edge("董事", "王一", "乙投資股份有限公司", ratio(40), Some("20000001")),
            root_edge("監察人", "王二", "乙投資股份有限公司", ratio(40), Some("20000001")),
            root_edge("董事", "王三", "丙投資股份有限公司", ratio(30), None),
            root_edge("董事", "王四", "丁投資股份有限公司", ratio(10), None),
        ];
        let titles = TitleRules::default();
        let provider = provider();

        let records = FallbackEngine::new(&provider, &titles, Decimal::new(25, 2)).determine(&edges);

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            BeneficialOwnerRecord::CorporateHolderFallback {
                entity: "乙投資股份有限公司".to_string(),
                entity_id: Some("20000001".to_string()),
                ratio: Decimal::new(4, 1),
                representative: Some("陳小美".to_string()),
            }
        );
        // no chairman: falls back to the representative title; id resolved by name
        match &records[1] {
            BeneficialOwnerRecord::CorporateHolderFallback { representative, .. } => {
                assert_eq!(representative.as_deref(), Some("林大山"));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_senior_management_only_when_no_corporate_qualifies() {
        let edges = vec![
            root_edge("董事", "王一", "乙投資股份有限公司", ratio(20), Some("20000001")),
            root_edge("董事長", "王三", "", ratio(5), None),
            root_edge("總經理", "王四", "", None, None),
            root_edge("董事", "王五", "", ratio(5), None),
        ];
        let titles = TitleRules::default();
        let provider = provider();

        let records = FallbackEngine::new(&provider, &titles, Decimal::new(25, 2)).determine(&edges);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.kind() == "SeniorManagementFallback"));
    }
}
