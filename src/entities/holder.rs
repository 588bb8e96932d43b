// 👥 Holder Row - one director / supervisor / shareholder seat
//
// A seat held on behalf of a corporate shareholder carries the represented
// entity's name; a plain individual seat leaves it empty.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolderRow {
    /// Seat title, e.g. "董事長", "董事", "監察人"
    #[serde(default)]
    pub title: String,

    /// Person sitting in the seat
    #[serde(default)]
    pub person_name: String,

    /// Corporate shareholder this seat represents (empty for individuals)
    #[serde(default)]
    pub represented_entity: String,

    #[serde(default)]
    pub held_shares: Option<Decimal>,

    #[serde(default)]
    pub invested_amount: Option<Decimal>,
}

impl HolderRow {
    /// Individual seat holding `shares`.
    pub fn individual(title: &str, person_name: &str, shares: Option<Decimal>) -> Self {
        HolderRow {
            title: title.to_string(),
            person_name: person_name.to_string(),
            represented_entity: String::new(),
            held_shares: shares,
            invested_amount: None,
        }
    }

    /// Seat held by `person_name` on behalf of `entity`.
    pub fn representing(
        title: &str,
        person_name: &str,
        entity: &str,
        shares: Option<Decimal>,
    ) -> Self {
        HolderRow {
            title: title.to_string(),
            person_name: person_name.to_string(),
            represented_entity: entity.to_string(),
            held_shares: shares,
            invested_amount: None,
        }
    }

    pub fn with_invested_amount(mut self, amount: Decimal) -> Self {
        self.invested_amount = Some(amount);
        self
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

    pub fn is_corporate_representative(&self) -> bool {
        self.represented().is_some()
    }
}
