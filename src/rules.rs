// 🏷️ Classification Rules - Rules as Data
// Entity classification by business activity, seat-title matching and the
// natural-person test used to pick path leaves.

use crate::entities::{BusinessActivity, EntityClass};
use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// ENTITY CLASSIFICATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationRules {
    /// Matched against activity descriptions
    pub government_keywords: Vec<String>,

    /// Securities, futures, trust, insurance brokerage...
    pub financial_codes: Vec<String>,

    /// General investment / holding activities
    pub passive_codes: Vec<String>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        ClassificationRules {
            government_keywords: strings(&["公所", "部", "局", "院", "委員會", "國營", "行政院"]),
            financial_codes: strings(&[
                "H301011", "H304011", "H305011", "H401011", "H403011", "H105011",
            ]),
            passive_codes: strings(&["H201010", "H202010"]),
        }
    }
}

impl ClassificationRules {
    /// First match wins: government → financial → passive → active.
    pub fn classify(&self, activities: &[BusinessActivity]) -> EntityClass {
        let is_government = activities.iter().any(|a| {
            self.government_keywords
                .iter()
                .any(|k| a.description.contains(k.as_str()))
        });
        if is_government {
            return EntityClass::Government;
        }

        if activities.iter().any(|a| self.financial_codes.contains(&a.code)) {
            return EntityClass::FinancialInstitution;
        }

        if activities.iter().any(|a| self.passive_codes.contains(&a.code)) {
            return EntityClass::PassiveNonFinancial;
        }

        EntityClass::ActiveNonFinancial
    }
}

// ============================================================================
// SEAT TITLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleRules {
    pub chairman: String,
    pub representative: String,

    /// Titles eligible for the senior-management fallback
    pub senior: Vec<String>,
}

impl Default for TitleRules {
    fn default() -> Self {
        TitleRules {
            chairman: "董事長".to_string(),
            representative: "代表人".to_string(),
            senior: strings(&["董事長", "總經理", "監察人"]),
        }
    }
}

impl TitleRules {
    pub fn is_chairman(&self, title: &str) -> bool {
        title.contains(self.chairman.as_str())
    }

    pub fn is_representative(&self, title: &str) -> bool {
        title.contains(self.representative.as_str())
    }

    pub fn is_senior(&self, title: &str) -> bool {
        self.senior.iter().any(|t| title.contains(t.as_str()))
    }
}

// ============================================================================
// NATURAL-PERSON DETECTION
// ============================================================================

/// Decides whether a holder name denotes a natural person.
///
/// Any `Fn(&str) -> bool` closure works as a detector.
pub trait PersonDetector: Send + Sync {
    fn is_natural_person(&self, name: &str) -> bool;
}

impl<F> PersonDetector for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_natural_person(&self, name: &str) -> bool {
        self(name)
    }
}

/// Legal-entity suffix heuristic: a name containing any marker is not a
/// person. Vacancy rows ("缺額") are caught the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordPersonDetector {
    markers: Vec<String>,
}

pub fn default_entity_markers() -> Vec<String> {
    strings(&["有限公司", "股份有限公司", "公司", "缺額"])
}

impl KeywordPersonDetector {
    pub fn new(markers: Vec<String>) -> Self {
        KeywordPersonDetector { markers }
    }
}

impl Default for KeywordPersonDetector {
    fn default() -> Self {
        Self::new(default_entity_markers())
    }
}

impl PersonDetector for KeywordPersonDetector {
    fn is_natural_person(&self, name: &str) -> bool {
        let name = name.trim();
        !name.is_empty() && !self.markers.iter().any(|m| name.contains(m.as_str()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_order() {
        let rules = ClassificationRules::default();

        // government wins even when a financial code is present
        let gov = vec![
            BusinessActivity::new("H301011", "證券商"),
            BusinessActivity::new("Z099999", "行政院國家發展基金管理會"),
        ];
        assert_eq!(rules.classify(&gov), EntityClass::Government);

        let fin = vec![
            BusinessActivity::new("H201010", "一般投資業"),
            BusinessActivity::new("H301011", "證券商"),
        ];
        assert_eq!(rules.classify(&fin), EntityClass::FinancialInstitution);

        let passive = vec![BusinessActivity::new("H201010", "一般投資業")];
        assert_eq!(rules.classify(&passive), EntityClass::PassiveNonFinancial);

        assert_eq!(rules.classify(&[]), EntityClass::ActiveNonFinancial);
        let active = vec![BusinessActivity::new("I103060", "管理顧問業")];
        assert_eq!(rules.classify(&active), EntityClass::ActiveNonFinancial);
    }

    #[test]
    fn test_title_rules() {
        let titles = TitleRules::default();
        assert!(titles.is_chairman("董事長"));
        assert!(titles.is_representative("法人代表人"));
        assert!(titles.is_senior("總經理"));
        assert!(!titles.is_senior("董事"));
    }

    #[test]
    fn test_keyword_person_detector() {
        let detector = KeywordPersonDetector::default();
        assert!(detector.is_natural_person("王大明"));
        assert!(!detector.is_natural_person("乙投資股份有限公司"));
        assert!(!detector.is_natural_person("缺額"));
        assert!(!detector.is_natural_person("  "));
    }

    #[test]
    fn test_closure_as_detector() {
        let detector = |name: &str| !name.ends_with("Ltd");
        assert!(detector.is_natural_person("Jane Doe"));
        assert!(!PersonDetector::is_natural_person(&detector, "Acme Holdings Ltd"));
    }
}
