// ➗ Ratio Calculator - holding fraction per holder row
//
// One calculator per source entity: the basis (issued shares or total
// capital) is fixed by the entity's profile, so every edge under the same
// source shares it.

use crate::entities::{EntityProfile, HolderRow, RatioBasis};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct RatioCalculator {
    basis: Option<RatioBasis>,
    denominator: Option<Decimal>,
    par_value: Decimal,
}

impl RatioCalculator {
    /// Pick the basis from a profile: issued shares when positive, else
    /// total capital when positive, else none.
    pub fn for_profile(profile: &EntityProfile) -> Self {
        let positive = |v: Option<Decimal>| v.filter(|d| *d > Decimal::ZERO);

        let (basis, denominator) = if let Some(shares) = positive(profile.issued_shares) {
            (Some(RatioBasis::Shares), Some(shares))
        } else if let Some(capital) = positive(profile.total_capital) {
            (Some(RatioBasis::Capital), Some(capital))
        } else {
            (None, None)
        };

        RatioCalculator {
            basis,
            denominator,
            par_value: profile.par_value,
        }
    }

    pub fn basis(&self) -> Option<RatioBasis> {
        self.basis
    }

    pub fn denominator(&self) -> Option<Decimal> {
        self.denominator
    }

    /// Holding of a single row measured in the calculator's basis.
    ///
    /// Capital basis uses the invested amount, or shares × par value when
    /// the registry does not report one. Zero or negative holdings count
    /// as missing.
    pub fn holding(&self, row: &HolderRow) -> Option<Decimal> {
        let raw = match self.basis? {
            RatioBasis::Shares => row.held_shares,
            RatioBasis::Capital => row
                .invested_amount
                .or_else(|| row.held_shares.and_then(|s| s.checked_mul(self.par_value))),
        };
        raw.filter(|h| *h > Decimal::ZERO)
    }

    /// Ratio for every row, in row order.
    ///
    /// Rows representing the same corporate holder all take the largest
    /// holding seen for that holder, never the sum of their seats.
    pub fn ratios(&self, rows: &[HolderRow]) -> Vec<Option<Decimal>> {
        let mut corporate_max: HashMap<&str, Decimal> = HashMap::new();
        for row in rows {
            if let (Some(entity), Some(held)) = (row.represented(), self.holding(row)) {
                corporate_max
                    .entry(entity)
                    .and_modify(|max| {
                        if held > *max {
                            *max = held;
                        }
                    })
                    .or_insert(held);
            }
        }

        rows.iter()
            .map(|row| {
                let numerator = match row.represented() {
                    Some(entity) => corporate_max.get(entity).copied(),
                    None => self.holding(row),
                };
                self.ratio_of(numerator)
            })
            .collect()
    }

    fn ratio_of(&self, numerator: Option<Decimal>) -> Option<Decimal> {
        let denominator = self.denominator.filter(|d| *d > Decimal::ZERO)?;
        numerator?.checked_div(denominator)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shares_profile(issued: i64) -> EntityProfile {
        EntityProfile::new("甲公司", "核准設立").with_issued_shares(Decimal::from(issued))
    }

    #[test]
    fn test_basis_prefers_issued_shares() {
        let profile = shares_profile(1000).with_total_capital(Decimal::from(10_000));
        let calc = RatioCalculator::for_profile(&profile);
        assert_eq!(calc.basis(), Some(RatioBasis::Shares));
        assert_eq!(calc.denominator(), Some(Decimal::from(1000)));

        let capital_only = EntityProfile::new("乙公司", "核准設立")
            .with_issued_shares(Decimal::ZERO)
            .with_total_capital(Decimal::from(10_000));
        let calc = RatioCalculator::for_profile(&capital_only);
        assert_eq!(calc.basis(), Some(RatioBasis::Capital));

        let nothing = EntityProfile::new("丙公司", "核准設立");
        let calc = RatioCalculator::for_profile(&nothing);
        assert_eq!(calc.basis(), None);
        assert_eq!(
            calc.ratios(&[HolderRow::individual("董事", "王大明", Some(Decimal::from(5)))]),
            vec![None]
        );
    }

    #[test]
    fn test_individual_ratio() {
        let calc = RatioCalculator::for_profile(&shares_profile(1000));
        let rows = vec![HolderRow::individual("董事長", "王大明", Some(Decimal::from(600)))];

        assert_eq!(calc.ratios(&rows), vec![Some(Decimal::new(6, 1))]);
    }

    #[test]
    fn test_corporate_holder_takes_max_not_sum() {
        let calc = RatioCalculator::for_profile(&shares_profile(1000));
        let rows = vec![
            HolderRow::representing("董事", "甲", "乙投資股份有限公司", Some(Decimal::from(100))),
            HolderRow::representing("董事", "乙", "乙投資股份有限公司", Some(Decimal::from(400))),
            HolderRow::representing("監察人", "丙", "乙投資股份有限公司", Some(Decimal::from(250))),
        ];

        let expected = Some(Decimal::new(4, 1));
        assert_eq!(calc.ratios(&rows), vec![expected, expected, expected]);
    }

    #[test]
    fn test_capital_basis_falls_back_to_shares_times_par() {
        let profile = EntityProfile::new("乙公司", "核准設立")
            .with_total_capital(Decimal::from(100_000))
            .with_par_value(Decimal::from(10));
        let calc = RatioCalculator::for_profile(&profile);

        let rows = vec![
            HolderRow::individual("董事", "王大明", None).with_invested_amount(Decimal::from(30_000)),
            HolderRow::individual("董事", "李小華", Some(Decimal::from(2_000))),
        ];

        assert_eq!(
            calc.ratios(&rows),
            vec![Some(Decimal::new(3, 1)), Some(Decimal::new(2, 1))]
        );
    }

    #[test]
    fn test_missing_or_zero_numerator_is_undefined() {
        let calc = RatioCalculator::for_profile(&shares_profile(1000));
        let rows = vec![
            HolderRow::individual("董事", "王大明", None),
            HolderRow::individual("董事", "李小華", Some(Decimal::ZERO)),
        ];

        assert_eq!(calc.ratios(&rows), vec![None, None]);
    }
}
