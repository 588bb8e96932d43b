// 👤 Beneficial Owner Record - one line of the final answer
//
// Which variant comes back depends on the branch the resolver took:
// identified persons, a listed-holder exemption, or one of the two
// fallback tiers.

use crate::aggregation::percent;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum BeneficialOwnerRecord {
    /// Natural person above the threshold after chain aggregation
    NaturalPerson { name: String, ratio: Decimal },

    /// Listed holder above the exemption ratio; identification waived
    ListedExemption {
        entity: String,
        entity_id: Option<String>,
        ratio: Decimal,
    },

    /// Corporate holder above the threshold, cited with its representative
    CorporateHolderFallback {
        entity: String,
        entity_id: Option<String>,
        ratio: Decimal,
        representative: Option<String>,
    },

    /// Senior officer of the seed entity
    SeniorManagementFallback { name: String, title: String },
}

impl BeneficialOwnerRecord {
    pub fn kind(&self) -> &'static str {
        match self {
            BeneficialOwnerRecord::NaturalPerson { .. } => "NaturalPerson",
            BeneficialOwnerRecord::ListedExemption { .. } => "ListedExemption",
            BeneficialOwnerRecord::CorporateHolderFallback { .. } => "CorporateHolderFallback",
            BeneficialOwnerRecord::SeniorManagementFallback { .. } => "SeniorManagementFallback",
        }
    }

    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            BeneficialOwnerRecord::NaturalPerson { ratio, .. }
            | BeneficialOwnerRecord::ListedExemption { ratio, .. }
            | BeneficialOwnerRecord::CorporateHolderFallback { ratio, .. } => Some(*ratio),
            BeneficialOwnerRecord::SeniorManagementFallback { .. } => None,
        }
    }
}

impl fmt::Display for BeneficialOwnerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BeneficialOwnerRecord::NaturalPerson { name, ratio } => {
                write!(f, "{} ({})", name, percent(*ratio))
            }
            BeneficialOwnerRecord::ListedExemption {
                entity,
                entity_id,
                ratio,
            } => write!(
                f,
                "{} [{}] listed, holds {}: identification exempt",
                entity,
                entity_id.as_deref().unwrap_or("-"),
                percent(*ratio)
            ),
            BeneficialOwnerRecord::CorporateHolderFallback {
                entity,
                entity_id,
                ratio,
                representative,
            } => write!(
                f,
                "{} [{}] holds {}, representative: {}",
                entity,
                entity_id.as_deref().unwrap_or("-"),
                percent(*ratio),
                representative.as_deref().unwrap_or("not found")
            ),
            BeneficialOwnerRecord::SeniorManagementFallback { name, title } => {
                write!(f, "{} ({})", name, title)
            }
        }
    }
}
