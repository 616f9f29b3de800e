//! Individual income tax under the OLD and NEW regimes.
//!
//! A [`TaxCalculationRequest`] is validated into a [`TaxProfile`], whose
//! income heads are aggregated and taxed against one year's
//! [`TaxYearConfig`]. [`evaluate`] runs the whole pipeline for a request.

pub mod core;
pub mod income;
pub mod money;
pub mod tax;

pub use crate::core::{
    read_request_json, AgeCategory, FinancialYear, RegimeSelection, TaxCalculationRequest,
    TaxError, TaxProfile, TaxRegime, TaxResult, Warning,
};
pub use crate::money::{Currency, Money, Rate};
pub use crate::tax::{
    ComparisonResult, OptimizationResult, RegimeComparisonService, TaxCalculationResult,
    TaxCalculator, TaxOptimizationService, TaxYearConfig,
};

use serde::Serialize;

/// Everything computed for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxOutcome {
    /// Result under the requested regime, or the recommended one when both
    /// were compared
    pub result: TaxCalculationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ComparisonResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimization: Option<OptimizationResult>,
}

/// Validate `request` and compute it under `config`.
pub fn evaluate(request: &TaxCalculationRequest, config: &TaxYearConfig) -> TaxResult<TaxOutcome> {
    let profile = request.validate()?;
    let calculator = TaxCalculator::new(config);

    let (result, comparison) = match profile.regime.single() {
        Some(regime) => (calculator.calculate(&profile, regime)?, None),
        None => {
            let comparison = RegimeComparisonService::new(calculator).compare(&profile)?;
            (comparison.recommended_result().clone(), Some(comparison))
        }
    };
    for warning in &result.warnings {
        log::warn!("{}: {}", profile.employee_id, warning);
    }

    let optimization = if profile.optimize {
        Some(TaxOptimizationService::new(calculator).optimize(&profile)?)
    } else {
        None
    };

    Ok(TaxOutcome {
        result,
        comparison,
        optimization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::income::{IncomeHeads, SalaryIncome};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn request(regime: RegimeSelection, optimize: bool) -> TaxCalculationRequest {
        TaxCalculationRequest {
            employee_id: "E-42".to_string(),
            tax_year: FinancialYear(2024),
            regime,
            age_category: None,
            date_of_birth: None,
            income: IncomeHeads {
                salary: Some(SalaryIncome {
                    basic: dec!(1250000),
                    ..SalaryIncome::default()
                }),
                ..IncomeHeads::default()
            },
            deductions: BTreeMap::new(),
            parents_senior_citizen: false,
            optimize,
        }
    }

    #[test]
    fn single_regime_has_no_comparison() {
        let config = TaxYearConfig::fy_2024_25();
        let outcome = evaluate(&request(RegimeSelection::Old, false), &config).unwrap();
        assert_eq!(outcome.result.regime, TaxRegime::Old);
        assert_eq!(outcome.result.total_liability().amount(), dec!(179400));
        assert!(outcome.comparison.is_none());
        assert!(outcome.optimization.is_none());
    }

    #[test]
    fn compare_both_reports_recommended_result() {
        let config = TaxYearConfig::fy_2024_25();
        let outcome = evaluate(&request(RegimeSelection::CompareBoth, true), &config).unwrap();
        let comparison = outcome.comparison.unwrap();
        assert_eq!(outcome.result.regime, comparison.recommended);
        assert!(outcome.optimization.is_some());
    }

    #[test]
    fn invalid_request_computes_nothing() {
        let config = TaxYearConfig::fy_2024_25();
        let mut request = request(RegimeSelection::New, false);
        request.employee_id = String::new();
        assert!(matches!(
            evaluate(&request, &config),
            Err(TaxError::Validation(_))
        ));
    }

    #[test]
    fn oversized_amounts_are_rejected_not_computed() {
        let config = TaxYearConfig::fy_2024_25();
        let mut request = request(RegimeSelection::CompareBoth, true);
        request.income.salary = Some(SalaryIncome {
            basic: rust_decimal::Decimal::MAX,
            bonus: rust_decimal::Decimal::MAX,
            ..SalaryIncome::default()
        });
        request.deductions.insert("80C".to_string(), rust_decimal::Decimal::MAX);

        let err = match evaluate(&request, &config) {
            Err(TaxError::Validation(err)) => err,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(err.contains("income.salary.basic"));
        assert!(err.contains("income.salary.bonus"));
        assert!(err.contains("deductions.80C"));
    }
}
