//! Input contract of a calculation.

use crate::core::{
    AgeCategory, FieldError, FinancialYear, RegimeSelection, TaxError, TaxResult, ValidationError,
    Validator,
};
use crate::income::IncomeHeads;
use crate::tax::deductions::TaxDeductions;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;

/// A calculation request as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxCalculationRequest {
    pub employee_id: String,
    pub tax_year: FinancialYear,
    #[serde(default)]
    pub regime: RegimeSelection,
    /// Explicit age category; derived from `date_of_birth` when absent
    #[serde(default)]
    pub age_category: Option<AgeCategory>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub income: IncomeHeads,
    /// Claimed amount per section code, e.g. `"80C": 150000`
    #[serde(default)]
    #[schemars(with = "BTreeMap<String, f64>")]
    pub deductions: BTreeMap<String, Decimal>,
    /// Parents covered under 80D are senior citizens
    #[serde(default)]
    pub parents_senior_citizen: bool,
    /// Also propose deduction allocations
    #[serde(default)]
    pub optimize: bool,
}

/// A request that passed validation, with its age category resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxProfile {
    pub employee_id: String,
    pub tax_year: FinancialYear,
    pub regime: RegimeSelection,
    pub age: AgeCategory,
    pub income: IncomeHeads,
    pub deductions: TaxDeductions,
    pub parents_senior_citizen: bool,
    pub optimize: bool,
}

impl TaxProfile {
    pub fn with_deductions(&self, deductions: TaxDeductions) -> Self {
        TaxProfile {
            deductions,
            ..self.clone()
        }
    }
}

/// Read a JSON request. Malformed JSON is reported as a validation error on
/// the whole request.
pub fn read_request_json<R: Read>(reader: R) -> TaxResult<TaxCalculationRequest> {
    serde_json::from_reader(reader).map_err(|e| {
        TaxError::Validation(ValidationError {
            errors: vec![FieldError {
                field: "request".to_string(),
                reason: e.to_string(),
            }],
        })
    })
}

impl TaxCalculationRequest {
    /// Check every field and resolve the age category.
    ///
    /// Every malformed field is reported together; nothing is computed for
    /// an invalid request.
    pub fn validate(&self) -> TaxResult<TaxProfile> {
        let mut v = Validator::new();
        if self.employee_id.trim().is_empty() {
            v.reject("employee_id", "must not be empty");
        }
        if !self.tax_year.is_supported() {
            v.reject(
                "tax_year",
                format!(
                    "{} is outside {}..={}",
                    self.tax_year.0,
                    FinancialYear::MIN,
                    FinancialYear::MAX
                ),
            );
        }
        let derived = match self.date_of_birth {
            Some(dob) if self.tax_year.is_supported() => {
                let age = self.tax_year.age_category(dob);
                if age.is_none() {
                    v.reject(
                        "date_of_birth",
                        format!("{dob} is after the end of {}", self.tax_year),
                    );
                }
                age
            }
            _ => None,
        };
        self.income.validate(&mut v);
        let deductions = TaxDeductions::from_raw(&self.deductions, "deductions", &mut v);
        v.finish()?;

        let age = match (self.age_category, derived) {
            (Some(explicit), Some(derived)) if explicit != derived => {
                return Err(TaxError::BusinessRule {
                    rule: "age category".to_string(),
                    detail: format!(
                        "declared {explicit} but date of birth gives {derived} for {}",
                        self.tax_year
                    ),
                });
            }
            (Some(age), _) | (None, Some(age)) => age,
            (None, None) => {
                log::debug!("no age information for {}, assuming general", self.employee_id);
                AgeCategory::General
            }
        };

        Ok(TaxProfile {
            employee_id: self.employee_id.clone(),
            tax_year: self.tax_year,
            regime: self.regime,
            age,
            income: self.income.clone(),
            deductions,
            parents_senior_citizen: self.parents_senior_citizen,
            optimize: self.optimize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::income::SalaryIncome;
    use crate::tax::deductions::Section;
    use rust_decimal_macros::dec;

    fn request() -> TaxCalculationRequest {
        TaxCalculationRequest {
            employee_id: "E-1001".to_string(),
            tax_year: FinancialYear(2024),
            regime: RegimeSelection::CompareBoth,
            age_category: None,
            date_of_birth: None,
            income: IncomeHeads {
                salary: Some(SalaryIncome {
                    basic: dec!(900000),
                    ..SalaryIncome::default()
                }),
                ..IncomeHeads::default()
            },
            deductions: BTreeMap::from([("80C".to_string(), dec!(150000))]),
            parents_senior_citizen: false,
            optimize: false,
        }
    }

    #[test]
    fn parses_json_request() {
        let json = r#"{
            "employee_id": "E-1",
            "tax_year": "2025-26",
            "regime": "COMPARE_BOTH",
            "date_of_birth": "1960-04-01",
            "income": {
                "salary": { "basic": 1000000, "hra_received": 200000 },
                "house_property": [{ "name": "Home", "occupancy": "SELF_OCCUPIED", "home_loan_interest": 150000 }]
            },
            "deductions": { "80C": 150000, "80D": "25000.50" }
        }"#;
        let request = read_request_json(json.as_bytes()).unwrap();
        assert_eq!(request.tax_year, FinancialYear(2025));
        assert_eq!(request.income.house_property.properties.len(), 1);

        let profile = request.validate().unwrap();
        // 66 on 1 April 2026
        assert_eq!(profile.age, AgeCategory::Senior);
        assert_eq!(profile.deductions.claim(Section::Sec80D), dec!(25000.50));
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let mut request = request();
        request.employee_id = " ".to_string();
        request.deductions.insert("80X".to_string(), dec!(1));
        request.deductions.insert("80D".to_string(), dec!(-1));
        if let Some(salary) = request.income.salary.as_mut() {
            salary.bonus = dec!(-100);
        }

        let err = match request.validate() {
            Err(TaxError::Validation(err)) => err,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(err.errors.len(), 4);
        assert!(err.contains("employee_id"));
        assert!(err.contains("deductions.80X"));
        assert!(err.contains("deductions.80D"));
        assert!(err.contains("income.salary.bonus"));
    }

    #[test]
    fn date_of_birth_after_year_end_is_invalid() {
        let mut request = request();
        request.date_of_birth = NaiveDate::from_ymd_opt(2025, 6, 1);
        let err = request.validate().unwrap_err();
        assert!(matches!(err, TaxError::Validation(e) if e.contains("date_of_birth")));
    }

    #[test]
    fn tax_year_out_of_range_is_invalid() {
        let mut request = request();
        request.tax_year = FinancialYear(300000);
        request.date_of_birth = NaiveDate::from_ymd_opt(1960, 1, 1);
        let err = match request.validate() {
            Err(TaxError::Validation(err)) => err,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert!(err.contains("tax_year"));
        assert!(!err.contains("date_of_birth"));

        let json = r#"{ "employee_id": "E-1", "tax_year": "300000-01", "date_of_birth": "1960-01-01" }"#;
        let err = read_request_json(json.as_bytes()).unwrap_err();
        assert!(matches!(err, TaxError::Validation(e) if e.contains("request")));
    }

    #[test]
    fn conflicting_age_is_a_business_rule_error() {
        let mut request = request();
        request.age_category = Some(AgeCategory::General);
        request.date_of_birth = NaiveDate::from_ymd_opt(1940, 1, 1);
        let err = request.validate().unwrap_err();
        assert!(matches!(err, TaxError::BusinessRule { .. }));

        request.age_category = Some(AgeCategory::SuperSenior);
        assert_eq!(request.validate().unwrap().age, AgeCategory::SuperSenior);
    }

    #[test]
    fn missing_age_defaults_to_general() {
        assert_eq!(request().validate().unwrap().age, AgeCategory::General);
    }
}
