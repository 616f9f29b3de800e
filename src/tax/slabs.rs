use crate::core::{TaxError, TaxResult};
use crate::money::{Money, Rate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of a progressive table. The lower bound is the previous slab's
/// `upto` (zero for the first slab).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slab {
    /// Upper bound, `None` for the final unbounded slab
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upto: Option<Decimal>,
    pub rate: Rate,
}

/// Progressive slab table, sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlabTable(Vec<Slab>);

/// Tax charged within a single slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlabLine {
    pub from: Decimal,
    pub upto: Option<Decimal>,
    pub rate: Rate,
    pub taxed_amount: Money,
    pub tax: Money,
}

/// Result of walking the table for one income figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlabTax {
    pub lines: Vec<SlabLine>,
    pub tax: Money,
}

impl SlabTable {
    pub fn new(slabs: Vec<Slab>) -> Self {
        SlabTable(slabs)
    }

    /// Build from `(upto, rate)` bands followed by the rate above the last band.
    pub fn from_bands(bands: &[(Decimal, Rate)], top_rate: Rate) -> Self {
        let mut slabs: Vec<Slab> = bands
            .iter()
            .map(|(upto, rate)| Slab {
                upto: Some(*upto),
                rate: *rate,
            })
            .collect();
        slabs.push(Slab {
            upto: None,
            rate: top_rate,
        });
        SlabTable(slabs)
    }

    pub fn slabs(&self) -> &[Slab] {
        &self.0
    }

    /// Thresholds strictly increasing, rates within 0..=1 and exactly one
    /// unbounded slab, in last position.
    pub fn validate(&self, name: &str) -> TaxResult<()> {
        let defect = |reason: String| Err(TaxError::Computation(format!("slab table {name}: {reason}")));

        let Some(last) = self.0.last() else {
            return defect("table is empty".to_string());
        };
        if last.upto.is_some() {
            return defect("final slab must be unbounded".to_string());
        }

        let mut previous = Decimal::ZERO;
        for (i, slab) in self.0.iter().enumerate() {
            if slab.rate < Decimal::ZERO || slab.rate > Decimal::ONE {
                return defect(format!("slab {i} has rate {} outside 0..=1", slab.rate));
            }
            match slab.upto {
                Some(upto) if upto <= previous => {
                    return defect(format!(
                        "slab {i} threshold {upto} does not exceed previous threshold {previous}"
                    ));
                }
                Some(upto) => previous = upto,
                None if i + 1 != self.0.len() => {
                    return defect(format!("slab {i} is unbounded but not last"));
                }
                None => {}
            }
        }
        Ok(())
    }

    /// Walk the slabs, taxing `min(remaining, width)` in each, until the
    /// income is consumed.
    pub fn tax_on(&self, income: Money) -> SlabTax {
        let mut remaining = income.floor_zero();
        let mut tax = income.zeroed();
        let mut lines = Vec::new();
        let mut from = Decimal::ZERO;

        for slab in &self.0 {
            if remaining.is_zero() {
                break;
            }
            let taxed_amount = match slab.upto {
                Some(upto) => remaining.min(Money::new(upto - from, income.currency())),
                None => remaining,
            };
            let slab_tax = taxed_amount.percentage(slab.rate);
            log::debug!(
                "slab {}..{:?} @ {}: taxed {} -> {}",
                from,
                slab.upto,
                slab.rate,
                taxed_amount,
                slab_tax
            );
            tax = tax.add(slab_tax);
            remaining = remaining.subtract(taxed_amount);
            lines.push(SlabLine {
                from,
                upto: slab.upto,
                rate: slab.rate,
                taxed_amount,
                tax: slab_tax,
            });
            if let Some(upto) = slab.upto {
                from = upto;
            }
        }

        SlabTax { lines, tax }
    }

    /// Rate applying to the next unit of income above `income`.
    pub fn marginal_rate(&self, income: Money) -> Rate {
        self.0
            .iter()
            .find(|slab| slab.upto.is_none_or(|upto| income.amount() < upto))
            .map(|slab| slab.rate)
            .unwrap_or(Decimal::ZERO)
    }
}
