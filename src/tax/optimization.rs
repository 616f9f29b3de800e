//! Greedy allocation of unused deduction headroom under the OLD regime.
//!
//! Each round prices every candidate section by the liability it would
//! remove if its remaining headroom were claimed, and takes the best one.
//! A section is allocated at most once, so the search ends after at most
//! one round per candidate. Ties go to the earlier candidate.

use crate::core::{TaxProfile, TaxRegime, TaxResult};
use crate::income::HeadContext;
use crate::money::Money;
use crate::tax::calculator::TaxCalculator;
use crate::tax::deductions::{DeductionContext, Section, TaxDeductions};
use serde::Serialize;

/// Sections the optimizer may suggest, in tie-break order. Interest
/// deductions only have headroom up to the interest declared, and only one
/// of them is open to any age category.
pub const CANDIDATES: [Section; 6] = [
    Section::Sec80C,
    Section::Sec80CCD1B,
    Section::Sec80D,
    Section::Sec80DParents,
    Section::Sec80TTA,
    Section::Sec80TTB,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub section: Section,
    pub additional_claim: Money,
    pub tax_saving: Money,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptimizationResult {
    pub current_liability: Money,
    pub optimized_liability: Money,
    pub total_savings: Money,
    pub suggestions: Vec<Suggestion>,
    /// NEW regime liability, for judging whether the effort pays
    pub new_regime_liability: Money,
    /// Cheaper regime once every suggestion is taken up
    pub recommended: TaxRegime,
}

/// Best claim found in one round.
struct Allocation {
    index: usize,
    headroom: Money,
    saving: Money,
    deductions: TaxDeductions,
    total_deductions: Money,
}

#[derive(Debug, Clone, Copy)]
pub struct TaxOptimizationService<'a> {
    calculator: TaxCalculator<'a>,
}

impl<'a> TaxOptimizationService<'a> {
    pub fn new(calculator: TaxCalculator<'a>) -> Self {
        TaxOptimizationService { calculator }
    }

    pub fn optimize(&self, profile: &TaxProfile) -> TaxResult<OptimizationResult> {
        let config = self.calculator.config();
        let head = HeadContext::new(config, TaxRegime::Old, profile.age);
        let aggregate = profile.income.aggregate(&head);

        let current = self.calculator.calculate(profile, TaxRegime::Old)?;
        let new_regime_liability = self.calculator.calculate(profile, TaxRegime::New)?.total_liability();

        let mut deductions = profile.deductions.clone();
        let mut liability = current.total_liability();
        let mut deducted = current.total_deductions;
        let mut remaining: Vec<Section> = CANDIDATES.to_vec();
        let mut suggestions = Vec::new();

        while !remaining.is_empty() {
            let ctx = DeductionContext {
                head,
                aggregate: &aggregate,
                incomes: &profile.income,
                parents_senior_citizen: profile.parents_senior_citizen,
            };
            // no income left to absorb a further claim
            let income_room = aggregate.slab_income.subtract(deducted);
            if income_room.is_zero() {
                break;
            }

            let mut best: Option<Allocation> = None;
            for (index, section) in remaining.iter().enumerate() {
                let headroom = deductions.headroom(*section, &ctx).min(income_room);
                if headroom.is_zero() {
                    continue;
                }
                let trial = deductions
                    .clone()
                    .with_claim(*section, deductions.claim(*section) + headroom.amount());
                let result = self
                    .calculator
                    .calculate(&profile.with_deductions(trial.clone()), TaxRegime::Old)?;
                let saving = liability.subtract(result.total_liability());
                log::debug!("{} headroom {} saves {}", section, headroom, saving);
                if best.as_ref().is_none_or(|b| saving > b.saving) {
                    best = Some(Allocation {
                        index,
                        headroom,
                        saving,
                        deductions: trial,
                        total_deductions: result.total_deductions,
                    });
                }
            }

            let Some(best) = best else {
                break;
            };
            if best.saving.is_zero() {
                break;
            }
            let section = remaining.remove(best.index);
            suggestions.push(Suggestion {
                section,
                additional_claim: best.headroom,
                tax_saving: best.saving,
                description: format!(
                    "Claim remaining {} headroom of {} ({})",
                    section.code(),
                    best.headroom,
                    section.description()
                ),
            });
            liability = liability.subtract(best.saving);
            deducted = best.total_deductions;
            deductions = best.deductions;
        }

        let total_savings = current.total_liability().subtract(liability);
        let recommended = if new_regime_liability < liability {
            TaxRegime::New
        } else {
            TaxRegime::Old
        };
        log::info!(
            "{}: {} suggestion(s) save {} under OLD, {} recommended",
            profile.employee_id,
            suggestions.len(),
            total_savings,
            recommended
        );

        Ok(OptimizationResult {
            current_liability: current.total_liability(),
            optimized_liability: liability,
            total_savings,
            suggestions,
            new_regime_liability,
            recommended,
        })
    }
}
