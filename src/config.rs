// ⚙️ Resolver Configuration - thresholds and policies as data
//
// Every field has a default, so a config file only needs the keys it
// overrides:
//
//   { "max_depth": 3, "natural_person_threshold": "0.10" }

use crate::entities::DEFAULT_PAR_VALUE;
use crate::rules::{default_entity_markers, ClassificationRules, TitleRules};
use crate::walker::TraversalOrder;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Registration status a seed must carry to be resolved.
pub const APPROVED_STATUS: &str = "核准設立";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub max_depth: usize,

    /// A person is a beneficial owner above this aggregate ratio
    pub natural_person_threshold: Decimal,

    /// Corporate holders above this ratio are cited by the fallback
    pub fallback_threshold: Decimal,

    /// Warn when disclosed ratios sum below this
    pub disclosure_threshold: Decimal,

    /// Listed holders above this ratio are exempt and not traversed
    pub listed_exemption_ratio: Decimal,

    /// Par value assumed when the registry leaves it blank
    pub default_par_value: Decimal,

    pub traversal_order: TraversalOrder,

    /// None disables the registration-status gate
    pub approved_status: Option<String>,

    /// Listed seeds are exempt without walking
    pub exempt_listed_seed: bool,

    pub classification: ClassificationRules,
    pub titles: TitleRules,

    /// Legal-entity markers for the default natural-person detector
    pub entity_markers: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            max_depth: 5,
            natural_person_threshold: Decimal::new(25, 2),
            fallback_threshold: Decimal::new(25, 2),
            disclosure_threshold: Decimal::new(75, 2),
            listed_exemption_ratio: Decimal::new(5, 1),
            default_par_value: DEFAULT_PAR_VALUE,
            traversal_order: TraversalOrder::default(),
            approved_status: Some(APPROVED_STATUS.to_string()),
            exempt_listed_seed: true,
            classification: ClassificationRules::default(),
            titles: TitleRules::default(),
            entity_markers: default_entity_markers(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: ResolverConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Natural-person, fallback and disclosure thresholds, in that order.
    pub fn with_thresholds(mut self, natural_person: Decimal, fallback: Decimal, disclosure: Decimal) -> Self {
        self.natural_person_threshold = natural_person;
        self.fallback_threshold = fallback;
        self.disclosure_threshold = disclosure;
        self
    }

    pub fn with_traversal_order(mut self, order: TraversalOrder) -> Self {
        self.traversal_order = order;
        self
    }

    pub fn with_approved_status(mut self, status: Option<&str>) -> Self {
        self.approved_status = status.map(str::to_string);
        self
    }

    pub fn with_exempt_listed_seed(mut self, exempt: bool) -> Self {
        self.exempt_listed_seed = exempt;
        self
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.max_depth, 5);
        assert_eq!(config.natural_person_threshold, Decimal::new(25, 2));
        assert_eq!(config.disclosure_threshold, Decimal::new(75, 2));
        assert_eq!(config.approved_status.as_deref(), Some("核准設立"));
        assert_eq!(config.traversal_order, TraversalOrder::LastPushedFirst);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "max_depth": 3, "natural_person_threshold": "0.10", "traversal_order": "FirstPushedFirst", "approved_status": null }}"#
        )
        .unwrap();

        let config = ResolverConfig::from_file(file.path()).unwrap();

        assert_eq!(config.max_depth, 3);
        assert_eq!(config.natural_person_threshold, Decimal::new(1, 1));
        assert_eq!(config.fallback_threshold, Decimal::new(25, 2));
        assert_eq!(config.traversal_order, TraversalOrder::FirstPushedFirst);
        assert_eq!(config.approved_status, None);
        assert_eq!(config.titles.chairman, "董事長");
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = ResolverConfig::from_file("/nonexistent/resolver.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
