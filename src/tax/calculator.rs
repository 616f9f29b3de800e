//! Tax liability for one regime.
//!
//! Slab income is walked through the regime's table for the resolved age
//! category, the rebate is applied as a step, flat-rate buckets are taxed
//! at their own rates, then surcharge (with marginal relief) and cess are
//! charged on the combined tax.

use crate::core::{AgeCategory, FinancialYear, TaxError, TaxProfile, TaxRegime, TaxResult, Warning};
use crate::income::{FlatRateIncome, HeadContext, HeadSummary};
use crate::money::{Money, Rate};
use crate::tax::config::{RegimeRules, TaxYearConfig};
use crate::tax::deductions::{DeductionContext, DeductionOutcome};
use crate::tax::slabs::SlabLine;
use rust_decimal::Decimal;
use serde::Serialize;

/// Tax on one flat-rate bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRateTax {
    pub label: String,
    pub income: Money,
    pub rate: Rate,
    pub tax: Money,
    /// Surcharge rate applied to this tax
    pub surcharge_rate: Rate,
}

/// Liability arithmetic, from slab walk to cess.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxLiability {
    pub slab_lines: Vec<SlabLine>,
    /// Slab tax plus flat-rate tax, before rebate
    pub tax_before_rebate: Money,
    pub rebate: Money,
    pub flat_rate_tax: Vec<FlatRateTax>,
    /// Surcharge rate for slab-rate tax
    pub surcharge_rate: Rate,
    /// Surcharge after marginal relief
    pub surcharge: Money,
    pub marginal_relief: Money,
    pub cess: Money,
    pub total_liability: Money,
}

impl TaxLiability {
    fn zero(zero: Money) -> Self {
        TaxLiability {
            slab_lines: Vec::new(),
            tax_before_rebate: zero,
            rebate: zero,
            flat_rate_tax: Vec::new(),
            surcharge_rate: Decimal::ZERO,
            surcharge: zero,
            marginal_relief: zero,
            cess: zero,
            total_liability: zero,
        }
    }

    /// Tax after rebate, before surcharge and cess.
    pub fn tax_after_rebate(&self) -> Money {
        self.tax_before_rebate.subtract(self.rebate)
    }
}

/// Immutable outcome of one calculation under one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxCalculationResult {
    pub employee_id: String,
    pub tax_year: FinancialYear,
    pub regime: TaxRegime,
    pub age_category: AgeCategory,
    pub heads: Vec<HeadSummary>,
    /// Sum of the heads' gross figures
    pub gross_income: Money,
    /// Income after set-off, slab-rate and flat-rate
    pub gross_total_income: Money,
    pub deductions: DeductionOutcome,
    pub total_deductions: Money,
    /// Slab-rate income after deductions
    pub slab_taxable_income: Money,
    /// Slab-rate taxable income plus flat-rate income
    pub taxable_income: Money,
    #[serde(flatten)]
    pub liability: TaxLiability,
    /// Total liability over gross total income, four places
    pub effective_rate: Rate,
    pub warnings: Vec<Warning>,
}

impl TaxCalculationResult {
    pub fn total_liability(&self) -> Money {
        self.liability.total_liability
    }
}

/// Pure calculator over one year's config.
#[derive(Debug, Clone, Copy)]
pub struct TaxCalculator<'a> {
    config: &'a TaxYearConfig,
}

impl<'a> TaxCalculator<'a> {
    pub fn new(config: &'a TaxYearConfig) -> Self {
        TaxCalculator { config }
    }

    pub fn config(&self) -> &'a TaxYearConfig {
        self.config
    }

    /// Full calculation of a validated profile under `regime`.
    pub fn calculate(&self, profile: &TaxProfile, regime: TaxRegime) -> TaxResult<TaxCalculationResult> {
        if profile.tax_year != self.config.financial_year {
            return Err(TaxError::Computation(format!(
                "config for {} cannot compute {}",
                self.config.financial_year, profile.tax_year
            )));
        }

        let head = HeadContext::new(self.config, regime, profile.age);
        let aggregate = profile.income.aggregate(&head);
        let deductions = profile.deductions.apply(&DeductionContext {
            head,
            aggregate: &aggregate,
            incomes: &profile.income,
            parents_senior_citizen: profile.parents_senior_citizen,
        });

        let slab_taxable_income = aggregate.slab_income.subtract(deductions.total);
        let liability = self.liability(slab_taxable_income, &aggregate.flat_rate, regime, profile.age);
        let taxable_income = slab_taxable_income.add(aggregate.flat_rate_total());
        let gross_total_income = aggregate.total_income();
        let effective_rate = liability.total_liability.ratio_of(gross_total_income);

        let mut warnings = aggregate.warnings.clone();
        warnings.extend(deductions.warnings.iter().cloned());

        log::info!(
            "{} {} {}: taxable {}, liability {}",
            profile.employee_id,
            profile.tax_year,
            regime,
            taxable_income,
            liability.total_liability
        );

        Ok(TaxCalculationResult {
            employee_id: profile.employee_id.clone(),
            tax_year: profile.tax_year,
            regime,
            age_category: profile.age,
            heads: aggregate.heads,
            gross_income: aggregate.gross_income,
            gross_total_income,
            total_deductions: deductions.total,
            deductions,
            slab_taxable_income,
            taxable_income,
            liability,
            effective_rate,
            warnings,
        })
    }

    /// Liability on slab-rate taxable income plus flat-rate buckets.
    pub fn liability(
        &self,
        slab_taxable: Money,
        flat_rate: &[FlatRateIncome],
        regime: TaxRegime,
        age: AgeCategory,
    ) -> TaxLiability {
        let rules = self.config.regime(regime);
        let flat_total = Money::sum(self.config.currency, flat_rate.iter().map(|f| f.amount));
        let taxable = slab_taxable.add(flat_total);
        if taxable.is_zero() {
            return TaxLiability::zero(taxable);
        }

        let slab = rules.slabs.for_age(age).tax_on(slab_taxable);
        let rebate = if taxable.amount() <= rules.rebate_threshold {
            log::debug!(
                "taxable {} within {} rebate threshold {}, slab tax {} rebated",
                taxable,
                regime,
                rules.rebate_threshold,
                slab.tax
            );
            slab.tax
        } else {
            taxable.zeroed()
        };
        let slab_tax = slab.tax.subtract(rebate);

        let surcharge_rate = surcharge_rate(rules, taxable);
        let flat_rate_tax: Vec<FlatRateTax> = flat_rate
            .iter()
            .map(|f| FlatRateTax {
                label: f.label.clone(),
                income: f.amount,
                rate: f.rate,
                tax: f.amount.percentage(f.rate),
                surcharge_rate: self.flat_surcharge_rate(f, surcharge_rate),
            })
            .collect();
        let flat_tax = Money::sum(self.config.currency, flat_rate_tax.iter().map(|f| f.tax));

        let surcharge = slab_tax.percentage(surcharge_rate).add(Money::sum(
            self.config.currency,
            flat_rate_tax.iter().map(|f| f.tax.percentage(f.surcharge_rate)),
        ));
        let marginal_relief =
            self.marginal_relief(rules, age, slab_taxable, flat_rate, slab_tax.add(flat_tax).add(surcharge));
        let surcharge = surcharge.subtract(marginal_relief);

        let tax = slab_tax.add(flat_tax).add(surcharge);
        let cess = tax.percentage(self.config.cess_rate);
        let total_liability = tax.add(cess);
        log::debug!(
            "{} liability: slab {} flat {} surcharge {} (relief {}) cess {}",
            regime,
            slab_tax,
            flat_tax,
            surcharge,
            marginal_relief,
            cess
        );

        TaxLiability {
            slab_lines: slab.lines,
            tax_before_rebate: slab.tax.add(flat_tax),
            rebate,
            flat_rate_tax,
            surcharge_rate,
            surcharge,
            marginal_relief,
            cess,
            total_liability,
        }
    }

    fn flat_surcharge_rate(&self, income: &FlatRateIncome, rate: Rate) -> Rate {
        if income.capital_gain {
            rate.min(self.config.capital_gains.surcharge_rate_cap)
        } else {
            rate
        }
    }

    /// Tax plus surcharge at `income`, ignoring relief; used to price the
    /// band boundary.
    fn tax_with_surcharge(
        &self,
        rules: &RegimeRules,
        age: AgeCategory,
        slab_taxable: Money,
        flat_rate: &[FlatRateIncome],
    ) -> Money {
        let flat_total = Money::sum(self.config.currency, flat_rate.iter().map(|f| f.amount));
        let taxable = slab_taxable.add(flat_total);
        let mut slab_tax = rules.slabs.for_age(age).tax_on(slab_taxable).tax;
        if taxable.amount() <= rules.rebate_threshold {
            slab_tax = slab_tax.zeroed();
        }
        let rate = surcharge_rate(rules, taxable);
        let flat = Money::sum(
            self.config.currency,
            flat_rate.iter().map(|f| {
                let tax = f.amount.percentage(f.rate);
                tax.add(tax.percentage(self.flat_surcharge_rate(f, rate)))
            }),
        );
        slab_tax.add(slab_tax.percentage(rate)).add(flat)
    }

    /// Relief so that tax plus surcharge never exceeds the tax at the band
    /// boundary plus the income above it.
    fn marginal_relief(
        &self,
        rules: &RegimeRules,
        age: AgeCategory,
        slab_taxable: Money,
        flat_rate: &[FlatRateIncome],
        charged: Money,
    ) -> Money {
        let flat_total = Money::sum(self.config.currency, flat_rate.iter().map(|f| f.amount));
        let taxable = slab_taxable.add(flat_total);
        let Some(band) = rules
            .surcharge
            .iter()
            .rev()
            .find(|band| taxable.amount() > band.above)
        else {
            return taxable.zeroed();
        };

        let boundary = Money::new(band.above, self.config.currency);
        let excess = taxable.subtract(boundary);
        // income above the boundary is taken off slab-rate income first,
        // then off the flat-rate buckets in order
        let mut remaining = excess.subtract(slab_taxable);
        let boundary_flat: Vec<FlatRateIncome> = flat_rate
            .iter()
            .map(|f| {
                let taken = f.amount.min(remaining);
                remaining = remaining.subtract(taken);
                FlatRateIncome {
                    amount: f.amount.subtract(taken),
                    ..f.clone()
                }
            })
            .collect();
        let at_boundary =
            self.tax_with_surcharge(rules, age, slab_taxable.subtract(excess), &boundary_flat);
        let ceiling = at_boundary.add(excess);
        let relief = charged.subtract(ceiling);
        if relief.is_positive() {
            log::debug!(
                "marginal relief {} above surcharge boundary {}",
                relief,
                boundary
            );
        }
        relief
    }
}

/// Rate of the highest band `total_income` exceeds.
fn surcharge_rate(rules: &RegimeRules, total_income: Money) -> Rate {
    rules
        .surcharge
        .iter()
        .rev()
        .find(|band| total_income.amount() > band.above)
        .map_or(Decimal::ZERO, |band| band.rate)
}
