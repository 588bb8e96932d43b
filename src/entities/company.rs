// 🏢 Company Entity - Registry profile + normalisation
//
// Registry pages hand us display strings ("10,000,000", "NT$ 10",
// "H201010一般投資業 I103060管理顧問業"). RawProfile holds them as-is;
// EntityProfile is the normalised value the engine computes with.

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::OnceLock;

/// Par value assumed when the registry leaves it blank.
pub const DEFAULT_PAR_VALUE: Decimal = Decimal::TEN;

// ============================================================================
// ENTITY CLASS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityClass {
    /// Government body or state-owned enterprise
    Government,

    /// Securities, futures, trust and similar regulated businesses
    FinancialInstitution,

    /// Holding / investment vehicles
    PassiveNonFinancial,

    /// Everything else
    ActiveNonFinancial,
}

impl EntityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityClass::Government => "Government",
            EntityClass::FinancialInstitution => "Financial Institution",
            EntityClass::PassiveNonFinancial => "Passive Non-Financial Entity",
            EntityClass::ActiveNonFinancial => "Active Non-Financial Entity",
        }
    }
}

// ============================================================================
// BUSINESS ACTIVITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessActivity {
    /// Registry activity code, e.g. "H201010"
    pub code: String,

    /// Activity description as registered
    pub description: String,
}

impl BusinessActivity {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        BusinessActivity {
            code: code.into(),
            description: description.into(),
        }
    }
}

fn activity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"([A-Z]\d{6})\s*([^\dA-Z]+)").expect("static activity pattern is valid")
    })
}

fn amount_noise() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^\d.\-]").expect("static amount pattern is valid"))
}

/// Parse a registry activity listing into (code, description) pairs.
///
/// Example: "H201010一般投資業 I103060管理顧問業" → two activities.
pub fn parse_business_items(text: &str) -> Vec<BusinessActivity> {
    activity_pattern()
        .captures_iter(text)
        .map(|cap| BusinessActivity::new(&cap[1], cap[2].trim()))
        .collect()
}

/// Parse a display amount, dropping separators, currency marks and units.
///
/// Returns None for empty or unparseable input.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let clean = amount_noise().replace_all(raw.trim(), "");
    if clean.is_empty() {
        return None;
    }
    Decimal::from_str(&clean).ok()
}

// ============================================================================
// RAW PROFILE (as scraped)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProfile {
    pub name: Option<String>,
    pub status: Option<String>,
    pub representative: Option<String>,
    pub address: Option<String>,
    pub total_capital: Option<String>,
    pub paid_in_capital: Option<String>,
    pub par_value: Option<String>,
    pub issued_shares: Option<String>,

    /// Free-text activity listing
    #[serde(default)]
    pub business_activities: Option<String>,
}

impl RawProfile {
    /// Normalise into an EntityProfile.
    ///
    /// Blank par value falls back to `default_par`; a missing issued-share
    /// count is derived from paid-in capital / par value.
    pub fn normalize(&self, default_par: Decimal) -> EntityProfile {
        let parse = |v: &Option<String>| v.as_deref().and_then(parse_amount);

        let total_capital = parse(&self.total_capital);
        let paid_in_capital = parse(&self.paid_in_capital);
        let par_value = parse(&self.par_value)
            .filter(|p| !p.is_zero())
            .unwrap_or(default_par);

        let issued_shares = parse(&self.issued_shares).or_else(|| match paid_in_capital {
            Some(paid) if paid > Decimal::ZERO && par_value > Decimal::ZERO => {
                paid.checked_div(par_value)
            }
            _ => None,
        });

        EntityProfile {
            name: self.name.as_deref().map(str::trim).unwrap_or_default().to_string(),
            status: self.status.as_deref().map(str::trim).unwrap_or_default().to_string(),
            representative: self.representative.clone(),
            total_capital,
            paid_in_capital,
            par_value,
            issued_shares,
            business_activities: self
                .business_activities
                .as_deref()
                .map(parse_business_items)
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// ENTITY PROFILE (normalised)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub name: String,

    /// Registration status, e.g. "核准設立"
    pub status: String,

    pub representative: Option<String>,
    pub total_capital: Option<Decimal>,
    pub paid_in_capital: Option<Decimal>,
    pub par_value: Decimal,
    pub issued_shares: Option<Decimal>,
    pub business_activities: Vec<BusinessActivity>,
}

impl EntityProfile {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        EntityProfile {
            name: name.into(),
            status: status.into(),
            representative: None,
            total_capital: None,
            paid_in_capital: None,
            par_value: DEFAULT_PAR_VALUE,
            issued_shares: None,
            business_activities: Vec::new(),
        }
    }

    pub fn with_issued_shares(mut self, shares: Decimal) -> Self {
        self.issued_shares = Some(shares);
        self
    }

    pub fn with_total_capital(mut self, capital: Decimal) -> Self {
        self.total_capital = Some(capital);
        self
    }

    pub fn with_par_value(mut self, par: Decimal) -> Self {
        self.par_value = par;
        self
    }

    pub fn with_activity(mut self, activity: BusinessActivity) -> Self {
        self.business_activities.push(activity);
        self
    }
}

// ============================================================================
// ENTITY
// ============================================================================

/// A resolved registry entity: canonical id + profile + derived class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub profile: EntityProfile,
    pub classification: EntityClass,
    pub listed: bool,
}

impl Entity {
    pub fn name(&self) -> &str {
        &self.profile.name
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_strips_separators() {
        assert_eq!(parse_amount("10,000,000"), Some(Decimal::from(10_000_000)));
        assert_eq!(parse_amount("NT$ 10 元"), Some(Decimal::TEN));
        assert_eq!(parse_amount("12.5"), Some(Decimal::new(125, 1)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("查無資料"), None);
    }

    #[test]
    fn test_parse_business_items() {
        let items = parse_business_items("H201010一般投資業 I103060管理顧問業");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], BusinessActivity::new("H201010", "一般投資業"));
        assert_eq!(items[1].code, "I103060");
        assert_eq!(items[1].description, "管理顧問業");
    }

    #[test]
    fn test_normalize_derives_issued_shares() {
        let raw = RawProfile {
            name: Some(" 甲投資股份有限公司 ".to_string()),
            status: Some("核准設立".to_string()),
            paid_in_capital: Some("5,000,000".to_string()),
            par_value: None,
            ..Default::default()
        };

        let profile = raw.normalize(DEFAULT_PAR_VALUE);

        assert_eq!(profile.name, "甲投資股份有限公司");
        assert_eq!(profile.par_value, Decimal::TEN);
        assert_eq!(profile.issued_shares, Some(Decimal::from(500_000)));
    }

    #[test]
    fn test_normalize_keeps_explicit_issued_shares() {
        let raw = RawProfile {
            issued_shares: Some("1,000".to_string()),
            paid_in_capital: Some("99,990".to_string()),
            par_value: Some("0".to_string()),
            ..Default::default()
        };

        let profile = raw.normalize(DEFAULT_PAR_VALUE);

        assert_eq!(profile.issued_shares, Some(Decimal::from(1000)));
        // zero par is treated as blank
        assert_eq!(profile.par_value, DEFAULT_PAR_VALUE);
    }
}
