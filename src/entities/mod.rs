// Entity Models
//
// - company: registry profile of a legal entity, raw and normalised
// - holder: one director/shareholder seat from a holder list
// - edge: a holder seat as recorded by the walker, with its ratio
// - owner: beneficial-owner records returned to callers

pub mod company;
pub mod edge;
pub mod holder;
pub mod owner;

pub use company::{
    parse_amount, parse_business_items, BusinessActivity, Entity, EntityClass, EntityProfile,
    RawProfile, DEFAULT_PAR_VALUE,
};
pub use edge::{EdgeNote, OwnershipEdge, RatioBasis};
pub use holder::HolderRow;
pub use owner::BeneficialOwnerRecord;
