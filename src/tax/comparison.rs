//! Side-by-side OLD and NEW regime calculation on the same income.

use crate::core::{TaxProfile, TaxRegime, TaxResult};
use crate::money::{Money, Rate};
use crate::tax::calculator::{TaxCalculationResult, TaxCalculator};
use crate::tax::deductions::Section;
use rust_decimal::Decimal;
use serde::Serialize;

/// One item explaining part of the gap between the regimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavingsItem {
    pub item: String,
    pub old_regime: Money,
    pub new_regime: Money,
    /// OLD regime liability without this item less the actual OLD liability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_effect: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub old: TaxCalculationResult,
    pub new: TaxCalculationResult,
    pub recommended: TaxRegime,
    /// OLD liability less NEW liability; positive when NEW is cheaper
    pub difference: Money,
    /// Absolute saving of the recommended regime
    pub savings: Money,
    /// Saving as a fraction of the higher liability
    pub savings_rate: Rate,
    pub breakdown: Vec<SavingsItem>,
}

impl ComparisonResult {
    pub fn result(&self, regime: TaxRegime) -> &TaxCalculationResult {
        match regime {
            TaxRegime::Old => &self.old,
            TaxRegime::New => &self.new,
        }
    }

    pub fn recommended_result(&self) -> &TaxCalculationResult {
        self.result(self.recommended)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RegimeComparisonService<'a> {
    calculator: TaxCalculator<'a>,
}

impl<'a> RegimeComparisonService<'a> {
    pub fn new(calculator: TaxCalculator<'a>) -> Self {
        RegimeComparisonService { calculator }
    }

    /// Run both regimes on the same profile and recommend the cheaper one.
    /// Equal liabilities favour OLD.
    pub fn compare(&self, profile: &TaxProfile) -> TaxResult<ComparisonResult> {
        let old = self.calculator.calculate(profile, TaxRegime::Old)?;
        let new = self.calculator.calculate(profile, TaxRegime::New)?;

        let old_tax = old.total_liability();
        let new_tax = new.total_liability();
        let recommended = if new_tax < old_tax {
            TaxRegime::New
        } else {
            TaxRegime::Old
        };
        let difference = old_tax.difference(new_tax);
        let savings = old_tax.max(new_tax).subtract(old_tax.min(new_tax));
        let savings_rate = savings.ratio_of(old_tax.max(new_tax));
        let breakdown = self.breakdown(profile, &old, &new)?;

        log::info!(
            "{}: OLD {} vs NEW {}, recommending {} (saves {})",
            profile.employee_id,
            old_tax,
            new_tax,
            recommended,
            savings
        );

        Ok(ComparisonResult {
            old,
            new,
            recommended,
            difference,
            savings,
            savings_rate,
            breakdown,
        })
    }

    /// Items behind the differential: the standard deduction, every head
    /// whose net income differs, and each Chapter VI-A section only OLD
    /// allows, with the tax it saves under OLD.
    fn breakdown(
        &self,
        profile: &TaxProfile,
        old: &TaxCalculationResult,
        new: &TaxCalculationResult,
    ) -> TaxResult<Vec<SavingsItem>> {
        let mut items = vec![SavingsItem {
            item: "Standard deduction".to_string(),
            old_regime: old.deductions.standard_deduction,
            new_regime: new.deductions.standard_deduction,
            tax_effect: None,
        }];

        for head in &old.heads {
            let new_net = new
                .heads
                .iter()
                .find(|h| h.head == head.head)
                .map_or(head.net.zeroed(), |h| h.net);
            if head.net != new_net {
                items.push(SavingsItem {
                    item: format!("{} net income", head.head.display()),
                    old_regime: head.net,
                    new_regime: new_net,
                    tax_effect: None,
                });
            }
        }

        if old.slab_taxable_income.add(old.total_deductions) != new.slab_taxable_income.add(new.total_deductions) {
            items.push(SavingsItem {
                item: "Income after set-off".to_string(),
                old_regime: old.slab_taxable_income.add(old.total_deductions),
                new_regime: new.slab_taxable_income.add(new.total_deductions),
                tax_effect: None,
            });
        }

        for applied in old.deductions.sections.iter().filter(|d| d.allowed.is_positive()) {
            let without = profile.with_deductions(
                profile
                    .deductions
                    .clone()
                    .with_claim(applied.section, Decimal::ZERO),
            );
            let liability = self.calculator.calculate(&without, TaxRegime::Old)?.total_liability();
            items.push(SavingsItem {
                item: section_label(applied.section),
                old_regime: applied.allowed,
                new_regime: new
                    .deductions
                    .allowed(applied.section)
                    .unwrap_or_else(|| applied.allowed.zeroed()),
                tax_effect: Some(liability.subtract(old.total_liability())),
            });
        }
        Ok(items)
    }
}

fn section_label(section: Section) -> String {
    format!("Section {} ({})", section.code(), section.description())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AgeCategory, FinancialYear, RegimeSelection};
    use crate::income::{HouseProperty, HousePropertyIncome, IncomeHeads, Occupancy, SalaryIncome};
    use crate::tax::config::TaxYearConfig;
    use crate::tax::deductions::TaxDeductions;
    use rust_decimal_macros::dec;

    fn profile(salary: SalaryIncome, deductions: TaxDeductions) -> TaxProfile {
        TaxProfile {
            employee_id: "E-7".to_string(),
            tax_year: FinancialYear(2024),
            regime: RegimeSelection::CompareBoth,
            age: AgeCategory::General,
            income: IncomeHeads {
                salary: Some(salary),
                ..IncomeHeads::default()
            },
            deductions,
            parents_senior_citizen: false,
            optimize: false,
        }
    }

    fn basic(amount: Decimal) -> SalaryIncome {
        SalaryIncome {
            basic: amount,
            ..SalaryIncome::default()
        }
    }

    #[test]
    fn zero_deduction_income_favours_new() {
        let config = TaxYearConfig::fy_2024_25();
        let service = RegimeComparisonService::new(TaxCalculator::new(&config));
        for amount in [dec!(800000), dec!(1500000), dec!(3000000), dec!(7500000)] {
            let result = service.compare(&profile(basic(amount), TaxDeductions::new())).unwrap();
            assert_eq!(result.recommended, TaxRegime::New, "at {amount}");
            assert!(result.difference.is_positive());
        }
    }

    #[test]
    fn difference_and_percentage() {
        let config = TaxYearConfig::fy_2024_25();
        let service = RegimeComparisonService::new(TaxCalculator::new(&config));
        let result = service.compare(&profile(basic(dec!(1500000)), TaxDeductions::new())).unwrap();
        // OLD: 1,450,000 taxable -> 247,500 + cess; NEW: 1,425,000 -> 125,000 + cess
        assert_eq!(result.old.total_liability().amount(), dec!(257400));
        assert_eq!(result.new.total_liability().amount(), dec!(130000));
        assert_eq!(result.savings.amount(), dec!(127400));
        assert_eq!(result.savings_rate, dec!(0.4949));
        assert_eq!(result.recommended_result().regime, TaxRegime::New);
    }

    #[test]
    fn ties_favour_old() {
        let config = TaxYearConfig::fy_2024_25();
        let service = RegimeComparisonService::new(TaxCalculator::new(&config));
        // both within their rebate thresholds
        let result = service.compare(&profile(basic(dec!(400000)), TaxDeductions::new())).unwrap();
        assert!(result.old.total_liability().is_zero());
        assert!(result.new.total_liability().is_zero());
        assert_eq!(result.recommended, TaxRegime::Old);
        assert!(result.savings.is_zero());
    }

    #[test]
    fn heavy_deductions_favour_old_and_are_itemised() {
        let config = TaxYearConfig::fy_2024_25();
        let service = RegimeComparisonService::new(TaxCalculator::new(&config));
        let salary = SalaryIncome {
            basic: dec!(1000000),
            hra_received: dec!(400000),
            rent_paid: dec!(480000),
            metro_city: true,
            ..SalaryIncome::default()
        };
        let deductions = TaxDeductions::new()
            .with_claim(Section::Sec80C, dec!(150000))
            .with_claim(Section::Sec80CCD1B, dec!(50000))
            .with_claim(Section::Sec80D, dec!(25000));
        let mut p = profile(salary, deductions);
        p.income.house_property = HousePropertyIncome {
            properties: vec![HouseProperty {
                name: "Home".to_string(),
                occupancy: Occupancy::SelfOccupied,
                home_loan_interest: dec!(200000),
                ..HouseProperty::default()
            }],
        };

        let result = service.compare(&p).unwrap();
        assert_eq!(result.recommended, TaxRegime::Old);
        assert!(result.difference.is_negative());

        let sec_80c = result
            .breakdown
            .iter()
            .find(|i| i.item.starts_with("Section 80C "))
            .unwrap();
        assert_eq!(sec_80c.old_regime.amount(), dec!(150000));
        assert!(sec_80c.new_regime.is_zero());
        assert!(sec_80c.tax_effect.unwrap().is_positive());
        assert!(result.breakdown.iter().any(|i| i.item == "Salary net income"));
        assert!(result.breakdown.iter().any(|i| i.item == "Income after set-off"));
    }

    #[test]
    fn comparison_matches_single_regime_runs() {
        let config = TaxYearConfig::fy_2025_26();
        let calculator = TaxCalculator::new(&config);
        let mut p = profile(basic(dec!(1800000)), TaxDeductions::new());
        p.tax_year = FinancialYear(2025);
        let result = RegimeComparisonService::new(calculator).compare(&p).unwrap();
        assert_eq!(result.old, calculator.calculate(&p, TaxRegime::Old).unwrap());
        assert_eq!(result.new, calculator.calculate(&p, TaxRegime::New).unwrap());
    }
}
