//! Progressive tax brackets and the cumulative-deduction tax formula.
//!
//! A bracket table is data supplied by the caller for a given tax year. It is
//! validated on construction (and on deserialization), so every
//! [`BracketTable`] in hand is non-empty, strictly ascending and ends with
//! exactly one unbounded bracket.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FinCalcError;
use crate::types::{round_currency, Money, Percent};
use crate::FinCalcResult;

/// Largest formula disagreement at a boundary still treated as rounding.
const CONTINUITY_TOLERANCE: Money = dec!(1);

/// One band of a progressive schedule.
///
/// Tax for income `x` in this band is `x × marginal_rate_pct / 100 −
/// cumulative_deduction`, which equals the layered sum over all lower bands
/// when the table is consistent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaxBracket {
    /// Inclusive upper bound of net taxable income; `None` for the top band.
    #[serde(default)]
    pub upper_bound: Option<Money>,
    pub marginal_rate_pct: Percent,
    pub cumulative_deduction: Money,
}

impl TaxBracket {
    /// Tax for `net_income` under this band's formula, before rounding.
    fn raw_tax(&self, net_income: Money) -> Money {
        net_income * self.marginal_rate_pct / dec!(100) - self.cumulative_deduction
    }
}

/// Validated, ascending bracket table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaxBracket>", into = "Vec<TaxBracket>")]
pub struct BracketTable {
    brackets: Vec<TaxBracket>,
}

impl BracketTable {
    pub fn new(brackets: Vec<TaxBracket>) -> FinCalcResult<Self> {
        if brackets.is_empty() {
            return Err(FinCalcError::invalid("brackets", "Bracket table is empty"));
        }

        let last = brackets.len() - 1;
        let mut previous: Option<Money> = None;
        for (i, bracket) in brackets.iter().enumerate() {
            let field = format!("brackets[{i}]");
            if bracket.marginal_rate_pct < Decimal::ZERO || bracket.marginal_rate_pct > dec!(100) {
                return Err(FinCalcError::invalid(
                    field,
                    "Marginal rate must be between 0 and 100 percent",
                ));
            }
            if bracket.cumulative_deduction < Decimal::ZERO {
                return Err(FinCalcError::invalid(field, "Cumulative deduction cannot be negative"));
            }
            match (bracket.upper_bound, i == last) {
                (None, true) => {}
                (None, false) => {
                    return Err(FinCalcError::invalid(
                        field,
                        "Only the last bracket may be unbounded",
                    ));
                }
                (Some(_), true) => {
                    return Err(FinCalcError::invalid(
                        field,
                        "The last bracket must be unbounded",
                    ));
                }
                (Some(bound), false) => {
                    if bound <= Decimal::ZERO {
                        return Err(FinCalcError::invalid(field, "Upper bound must be positive"));
                    }
                    if previous.is_some_and(|p| bound <= p) {
                        return Err(FinCalcError::invalid(
                            field,
                            "Upper bounds must be strictly ascending",
                        ));
                    }
                    previous = Some(bound);
                }
            }
        }

        Ok(Self { brackets })
    }

    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    /// Index of the first bracket whose upper bound is at or above
    /// `net_income`. Income exactly on a bound belongs to the lower bracket.
    pub fn bracket_index(&self, net_income: Money) -> usize {
        self.brackets
            .iter()
            .position(|b| b.upper_bound.map_or(true, |bound| net_income <= bound))
            .unwrap_or(self.brackets.len() - 1)
    }

    pub fn bracket_for(&self, net_income: Money) -> &TaxBracket {
        &self.brackets[self.bracket_index(net_income)]
    }

    /// Boundaries where the two adjacent formulas disagree by more than one
    /// currency unit. Such a table is still usable, but tax is no longer
    /// guaranteed to rise with income around these points.
    pub fn continuity_gaps(&self) -> Vec<String> {
        self.brackets
            .windows(2)
            .filter_map(|pair| {
                let bound = pair[0].upper_bound?;
                let gap = pair[1].raw_tax(bound) - pair[0].raw_tax(bound);
                (gap.abs() > CONTINUITY_TOLERANCE).then(|| {
                    format!(
                        "Brackets are discontinuous at {bound}: the {}% formula differs from the {}% formula by {gap}",
                        pair[1].marginal_rate_pct, pair[0].marginal_rate_pct
                    )
                })
            })
            .collect()
    }
}

impl TryFrom<Vec<TaxBracket>> for BracketTable {
    type Error = FinCalcError;

    fn try_from(brackets: Vec<TaxBracket>) -> Result<Self, Self::Error> {
        BracketTable::new(brackets)
    }
}

impl From<BracketTable> for Vec<TaxBracket> {
    fn from(table: BracketTable) -> Self {
        table.brackets
    }
}

/// Tax on `gross_income` after `deductions`.
///
/// Net taxable income is floored at zero, the bracket is looked up with
/// [`BracketTable::bracket_index`], and the result is rounded to whole units
/// and never negative.
pub fn compute_tax(gross_income: Money, deductions: Money, table: &BracketTable) -> Money {
    let net = net_taxable_income(gross_income, deductions);
    tax_on_net_income(net, table)
}

pub fn net_taxable_income(gross_income: Money, deductions: Money) -> Money {
    (gross_income - deductions).max(Decimal::ZERO)
}

pub(crate) fn tax_on_net_income(net: Money, table: &BracketTable) -> Money {
    round_currency(table.bracket_for(net).raw_tax(net)).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bracket(upper: Option<Decimal>, rate: Decimal, deduction: Decimal) -> TaxBracket {
        TaxBracket {
            upper_bound: upper,
            marginal_rate_pct: rate,
            cumulative_deduction: deduction,
        }
    }

    fn consistent_table() -> BracketTable {
        BracketTable::new(vec![
            bracket(Some(dec!(590_000)), dec!(5), dec!(0)),
            bracket(Some(dec!(1_330_000)), dec!(12), dec!(41_300)),
            bracket(Some(dec!(2_660_000)), dec!(20), dec!(147_700)),
            bracket(Some(dec!(4_980_000)), dec!(30), dec!(413_700)),
            bracket(None, dec!(40), dec!(911_700)),
        ])
        .unwrap()
    }

    #[test]
    fn test_bracket_lookup_is_inclusive_at_boundary() {
        let table = consistent_table();
        assert_eq!(table.bracket_index(dec!(590_000)), 0);
        assert_eq!(table.bracket_index(dec!(590_001)), 1);
        assert_eq!(table.bracket_index(dec!(1_500_000)), 2);
        assert_eq!(table.bracket_index(dec!(99_999_999)), 4);
        assert_eq!(table.bracket_index(Decimal::ZERO), 0);
    }

    #[test]
    fn test_compute_tax_layers() {
        let table = consistent_table();
        assert_eq!(compute_tax(dec!(500_000), Decimal::ZERO, &table), dec!(25_000));
        assert_eq!(compute_tax(dec!(1_500_000), Decimal::ZERO, &table), dec!(152_300));
        assert_eq!(compute_tax(dec!(6_000_000), Decimal::ZERO, &table), dec!(1_488_300));
    }

    #[test]
    fn test_negative_net_income_is_clamped() {
        let table = consistent_table();
        assert_eq!(compute_tax(dec!(100_000), dec!(400_000), &table), Decimal::ZERO);
        assert_eq!(net_taxable_income(dec!(100_000), dec!(400_000)), Decimal::ZERO);
    }

    #[test]
    fn test_continuous_table_has_no_gaps() {
        assert!(consistent_table().continuity_gaps().is_empty());
    }

    #[test]
    fn test_gap_is_reported() {
        let table = BracketTable::new(vec![
            bracket(Some(dec!(590_000)), dec!(5), dec!(0)),
            bracket(Some(dec!(1_330_000)), dec!(12), dec!(41_300)),
            bracket(Some(dec!(2_660_000)), dec!(20), dec!(147_700)),
            bracket(Some(dec!(4_980_000)), dec!(30), dec!(414_700)),
            bracket(None, dec!(40), dec!(912_700)),
        ])
        .unwrap();
        let gaps = table.continuity_gaps();
        assert_eq!(gaps.len(), 1);
        assert!(gaps[0].contains("2660000"));
    }

    #[test]
    fn test_rejects_malformed_tables() {
        assert!(BracketTable::new(vec![]).is_err());
        // Missing unbounded top bracket.
        assert!(BracketTable::new(vec![bracket(Some(dec!(100)), dec!(5), dec!(0))]).is_err());
        // Unbounded bracket not last.
        assert!(BracketTable::new(vec![
            bracket(None, dec!(5), dec!(0)),
            bracket(Some(dec!(100)), dec!(10), dec!(5)),
        ])
        .is_err());
        // Non-ascending bounds.
        assert!(BracketTable::new(vec![
            bracket(Some(dec!(200)), dec!(5), dec!(0)),
            bracket(Some(dec!(100)), dec!(10), dec!(10)),
            bracket(None, dec!(20), dec!(20)),
        ])
        .is_err());
        // Rate out of range.
        assert!(BracketTable::new(vec![bracket(None, dec!(120), dec!(0))]).is_err());
    }

    #[test]
    fn test_deserialization_validates() {
        let ok: BracketTable = serde_json::from_str(
            r#"[{"upper_bound": 100, "marginal_rate_pct": 5, "cumulative_deduction": 0},
                {"marginal_rate_pct": 10, "cumulative_deduction": 5}]"#,
        )
        .unwrap();
        assert_eq!(ok.brackets().len(), 2);

        let bad = serde_json::from_str::<BracketTable>(
            r#"[{"upper_bound": 100, "marginal_rate_pct": 5, "cumulative_deduction": 0}]"#,
        );
        assert!(bad.is_err());
    }
}
