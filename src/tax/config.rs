//! Statutory constants for one financial year.
//!
//! Every threshold, cap and rate the engine uses comes from a
//! [`TaxYearConfig`]. The built-in years are defined here; callers may load
//! an alternate config from JSON and inject it instead.

use crate::core::{AgeCategory, FinancialYear, TaxError, TaxRegime, TaxResult};
use crate::money::{Currency, Rate};
use crate::tax::slabs::SlabTable;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::io::Read;

/// Complete rule-set for one financial year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConfig {
    pub financial_year: FinancialYear,
    #[serde(default)]
    pub currency: Currency,
    pub old_regime: RegimeRules,
    pub new_regime: RegimeRules,
    /// Health and education cess on (tax + surcharge)
    pub cess_rate: Rate,
    pub salary: SalaryRules,
    pub perquisites: PerquisiteRules,
    pub house_property: HousePropertyRules,
    pub capital_gains: CapitalGainsRules,
    pub other_income: OtherIncomeRules,
    pub retirement: RetirementRules,
    pub deductions: DeductionLimits,
}

/// Slabs and policy of one regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeRules {
    pub slabs: AgeSlabs,
    /// Slab tax is rebated in full when total taxable income, slab-rate plus
    /// flat-rate, does not exceed this
    pub rebate_threshold: Decimal,
    pub standard_deduction: Decimal,
    /// Surcharge bands on total income, ascending
    pub surcharge: Vec<SurchargeBand>,
    /// Chapter VI-A sections may be claimed
    pub allows_chapter_via: bool,
    /// HRA, LTA and professional tax relief on salary
    pub allows_salary_exemptions: bool,
    /// House property loss that may be set off against other heads
    pub house_property_setoff_limit: Decimal,
    /// Cap on the family pension standard deduction
    pub family_pension_deduction_cap: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeSlabs {
    pub general: SlabTable,
    pub senior: SlabTable,
    pub super_senior: SlabTable,
}

impl AgeSlabs {
    /// Same table for every age category.
    pub fn uniform(table: SlabTable) -> Self {
        AgeSlabs {
            general: table.clone(),
            senior: table.clone(),
            super_senior: table,
        }
    }

    pub fn for_age(&self, age: AgeCategory) -> &SlabTable {
        match age {
            AgeCategory::General => &self.general,
            AgeCategory::Senior => &self.senior,
            AgeCategory::SuperSenior => &self.super_senior,
        }
    }
}

/// Surcharge applies when total income exceeds `above`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeBand {
    pub above: Decimal,
    pub rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRules {
    pub hra_metro_rate: Rate,
    pub hra_non_metro_rate: Rate,
    /// Rent paid in excess of this share of basic + DA is exempt
    pub hra_rent_excess_rate: Rate,
    pub professional_tax_cap: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerquisiteRules {
    pub car_small_monthly: Decimal,
    pub car_large_monthly: Decimal,
    pub car_driver_monthly: Decimal,
    /// Concessional loans are not a perquisite up to this aggregate principal
    pub loan_exemption_limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousePropertyRules {
    pub standard_deduction_rate: Rate,
    pub self_occupied_interest_cap: Decimal,
    /// Pre-construction interest is claimed in this many equal installments
    pub pre_construction_installments: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsRules {
    pub stcg_111a_rate: Rate,
    pub ltcg_112a_rate: Rate,
    pub ltcg_112a_exemption: Decimal,
    pub ltcg_indexed_rate: Rate,
    pub ltcg_non_indexed_rate: Rate,
    pub sec_54ec_cap: Decimal,
    /// Highest surcharge rate on tax from these flat-rate buckets
    pub surcharge_rate_cap: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherIncomeRules {
    /// Gifts from non-relatives are fully taxable above this aggregate
    pub gift_exemption_limit: Decimal,
    pub lottery_rate: Rate,
    pub presumptive_44ad_rate: Rate,
    pub presumptive_44ad_digital_rate: Rate,
    pub presumptive_44ada_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirementRules {
    pub gratuity_exemption_cap: Decimal,
    pub leave_encashment_exemption_cap: Decimal,
    pub vrs_exemption_cap: Decimal,
    pub pf_min_service_years: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLimits {
    /// 80CCE aggregate of 80C, 80CCC and 80CCD(1)
    pub sec_80c_aggregate: Decimal,
    pub sec_80ccd_1_salary_rate: Rate,
    pub sec_80ccd_1b: Decimal,
    pub sec_80ccd_2_salary_rate: Rate,
    pub sec_80d_general: Decimal,
    pub sec_80d_senior: Decimal,
    pub sec_80d_parents: Decimal,
    pub sec_80d_parents_senior: Decimal,
    pub sec_80dd: Decimal,
    pub sec_80ddb_general: Decimal,
    pub sec_80ddb_senior: Decimal,
    pub sec_80ee: Decimal,
    pub sec_80eea: Decimal,
    pub sec_80eeb: Decimal,
    pub sec_80g_income_rate: Rate,
    pub sec_80gg_monthly: Decimal,
    pub sec_80gg_income_rate: Rate,
    pub sec_80gg_rent_excess_rate: Rate,
    pub sec_80tta: Decimal,
    pub sec_80ttb: Decimal,
    pub sec_80u: Decimal,
}

impl TaxYearConfig {
    /// Built-in config for a financial year.
    pub fn builtin(year: FinancialYear) -> TaxResult<Self> {
        match year.0 {
            2024 => Ok(Self::fy_2024_25()),
            2025 => Ok(Self::fy_2025_26()),
            _ => Err(TaxError::Computation(format!(
                "no statutory configuration for financial year {year}"
            ))),
        }
    }

    /// Financial years with a built-in config.
    pub fn builtin_years() -> Vec<FinancialYear> {
        vec![FinancialYear(2024), FinancialYear(2025)]
    }

    /// Load and validate a config from JSON.
    pub fn from_json_reader<R: Read>(reader: R) -> TaxResult<Self> {
        let config: TaxYearConfig = serde_json::from_reader(reader)
            .map_err(|e| TaxError::Computation(format!("invalid tax year config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn regime(&self, regime: TaxRegime) -> &RegimeRules {
        match regime {
            TaxRegime::Old => &self.old_regime,
            TaxRegime::New => &self.new_regime,
        }
    }

    /// Check the invariants the calculator relies on.
    pub fn validate(&self) -> TaxResult<()> {
        for regime in TaxRegime::ALL {
            let rules = self.regime(regime);
            for age in [
                AgeCategory::General,
                AgeCategory::Senior,
                AgeCategory::SuperSenior,
            ] {
                rules
                    .slabs
                    .for_age(age)
                    .validate(&format!("{}/{}/{}", self.financial_year, regime, age))?;
            }

            let mut previous: Option<Decimal> = None;
            for band in &rules.surcharge {
                if previous.is_some_and(|p| band.above <= p) {
                    return Err(TaxError::Computation(format!(
                        "{regime} surcharge bands are not strictly increasing at {}",
                        band.above
                    )));
                }
                check_rate(&format!("{regime} surcharge"), band.rate)?;
                previous = Some(band.above);
            }
        }

        check_rate("cess", self.cess_rate)?;
        check_rate("house property standard deduction", self.house_property.standard_deduction_rate)?;
        check_rate("capital gains surcharge cap", self.capital_gains.surcharge_rate_cap)?;
        if self.house_property.pre_construction_installments == 0 {
            return Err(TaxError::Computation(
                "pre-construction installments must be at least one".to_string(),
            ));
        }
        Ok(())
    }

    /// FY 2024-25 (assessment year 2025-26), capital gains rates as amended
    /// from 23 July 2024.
    pub fn fy_2024_25() -> Self {
        TaxYearConfig {
            financial_year: FinancialYear(2024),
            currency: Currency::INR,
            old_regime: old_regime_rules(),
            new_regime: RegimeRules {
                slabs: AgeSlabs::uniform(SlabTable::from_bands(
                    &[
                        (dec!(300000), dec!(0)),
                        (dec!(700000), dec!(0.05)),
                        (dec!(1000000), dec!(0.10)),
                        (dec!(1200000), dec!(0.15)),
                        (dec!(1500000), dec!(0.20)),
                    ],
                    dec!(0.30),
                )),
                rebate_threshold: dec!(700000),
                standard_deduction: dec!(75000),
                surcharge: new_regime_surcharge(),
                allows_chapter_via: false,
                allows_salary_exemptions: false,
                house_property_setoff_limit: dec!(0),
                family_pension_deduction_cap: dec!(25000),
            },
            cess_rate: dec!(0.04),
            salary: SalaryRules {
                hra_metro_rate: dec!(0.50),
                hra_non_metro_rate: dec!(0.40),
                hra_rent_excess_rate: dec!(0.10),
                professional_tax_cap: dec!(2500),
            },
            perquisites: PerquisiteRules {
                car_small_monthly: dec!(1800),
                car_large_monthly: dec!(2400),
                car_driver_monthly: dec!(900),
                loan_exemption_limit: dec!(20000),
            },
            house_property: HousePropertyRules {
                standard_deduction_rate: dec!(0.30),
                self_occupied_interest_cap: dec!(200000),
                pre_construction_installments: 5,
            },
            capital_gains: CapitalGainsRules {
                stcg_111a_rate: dec!(0.20),
                ltcg_112a_rate: dec!(0.125),
                ltcg_112a_exemption: dec!(125000),
                ltcg_indexed_rate: dec!(0.20),
                ltcg_non_indexed_rate: dec!(0.125),
                sec_54ec_cap: dec!(5000000),
                surcharge_rate_cap: dec!(0.15),
            },
            other_income: OtherIncomeRules {
                gift_exemption_limit: dec!(50000),
                lottery_rate: dec!(0.30),
                presumptive_44ad_rate: dec!(0.08),
                presumptive_44ad_digital_rate: dec!(0.06),
                presumptive_44ada_rate: dec!(0.50),
            },
            retirement: RetirementRules {
                gratuity_exemption_cap: dec!(2000000),
                leave_encashment_exemption_cap: dec!(2500000),
                vrs_exemption_cap: dec!(500000),
                pf_min_service_years: 5,
            },
            deductions: DeductionLimits {
                sec_80c_aggregate: dec!(150000),
                sec_80ccd_1_salary_rate: dec!(0.10),
                sec_80ccd_1b: dec!(50000),
                sec_80ccd_2_salary_rate: dec!(0.10),
                sec_80d_general: dec!(25000),
                sec_80d_senior: dec!(50000),
                sec_80d_parents: dec!(25000),
                sec_80d_parents_senior: dec!(50000),
                sec_80dd: dec!(125000),
                sec_80ddb_general: dec!(40000),
                sec_80ddb_senior: dec!(100000),
                sec_80ee: dec!(50000),
                sec_80eea: dec!(150000),
                sec_80eeb: dec!(150000),
                sec_80g_income_rate: dec!(0.10),
                sec_80gg_monthly: dec!(5000),
                sec_80gg_income_rate: dec!(0.25),
                sec_80gg_rent_excess_rate: dec!(0.10),
                sec_80tta: dec!(10000),
                sec_80ttb: dec!(50000),
                sec_80u: dec!(125000),
            },
        }
    }

    /// FY 2025-26: revised NEW regime slabs and rebate, everything else as
    /// FY 2024-25.
    pub fn fy_2025_26() -> Self {
        let base = Self::fy_2024_25();
        TaxYearConfig {
            financial_year: FinancialYear(2025),
            new_regime: RegimeRules {
                slabs: AgeSlabs::uniform(SlabTable::from_bands(
                    &[
                        (dec!(400000), dec!(0)),
                        (dec!(800000), dec!(0.05)),
                        (dec!(1200000), dec!(0.10)),
                        (dec!(1600000), dec!(0.15)),
                        (dec!(2000000), dec!(0.20)),
                        (dec!(2400000), dec!(0.25)),
                    ],
                    dec!(0.30),
                )),
                rebate_threshold: dec!(1200000),
                ..base.new_regime.clone()
            },
            ..base
        }
    }
}

fn check_rate(name: &str, rate: Rate) -> TaxResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(TaxError::Computation(format!(
            "{name} rate {rate} outside 0..=1"
        )));
    }
    Ok(())
}

fn old_regime_rules() -> RegimeRules {
    RegimeRules {
        slabs: AgeSlabs {
            general: SlabTable::from_bands(
                &[
                    (dec!(250000), dec!(0)),
                    (dec!(500000), dec!(0.05)),
                    (dec!(1000000), dec!(0.20)),
                ],
                dec!(0.30),
            ),
            senior: SlabTable::from_bands(
                &[
                    (dec!(300000), dec!(0)),
                    (dec!(500000), dec!(0.05)),
                    (dec!(1000000), dec!(0.20)),
                ],
                dec!(0.30),
            ),
            super_senior: SlabTable::from_bands(
                &[(dec!(500000), dec!(0)), (dec!(1000000), dec!(0.20))],
                dec!(0.30),
            ),
        },
        rebate_threshold: dec!(500000),
        standard_deduction: dec!(50000),
        surcharge: vec![
            SurchargeBand {
                above: dec!(5000000),
                rate: dec!(0.10),
            },
            SurchargeBand {
                above: dec!(10000000),
                rate: dec!(0.15),
            },
            SurchargeBand {
                above: dec!(20000000),
                rate: dec!(0.25),
            },
            SurchargeBand {
                above: dec!(50000000),
                rate: dec!(0.37),
            },
        ],
        allows_chapter_via: true,
        allows_salary_exemptions: true,
        house_property_setoff_limit: dec!(200000),
        family_pension_deduction_cap: dec!(15000),
    }
}

/// NEW regime surcharge tops out at 25%.
fn new_regime_surcharge() -> Vec<SurchargeBand> {
    vec![
        SurchargeBand {
            above: dec!(5000000),
            rate: dec!(0.10),
        },
        SurchargeBand {
            above: dec!(10000000),
            rate: dec!(0.15),
        },
        SurchargeBand {
            above: dec!(20000000),
            rate: dec!(0.25),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn builtin_configs_are_valid() {
        for year in TaxYearConfig::builtin_years() {
            let config = TaxYearConfig::builtin(year).unwrap();
            assert_eq!(config.financial_year, year);
            config.validate().unwrap();
        }
    }

    #[test]
    fn unknown_year_is_a_configuration_defect() {
        let err = TaxYearConfig::builtin(FinancialYear(1999)).unwrap_err();
        assert!(matches!(err, TaxError::Computation(_)));
    }

    #[test]
    fn new_regime_slabs_ignore_age() {
        let config = TaxYearConfig::fy_2024_25();
        let slabs = &config.new_regime.slabs;
        assert_eq!(slabs.general, slabs.senior);
        assert_eq!(slabs.general, slabs.super_senior);
    }

    #[test]
    fn old_regime_basic_exemption_by_age() {
        let config = TaxYearConfig::fy_2024_25();
        let income = Money::inr(dec!(500000));
        let tax = |age| config.old_regime.slabs.for_age(age).tax_on(income).tax.amount();
        assert_eq!(tax(AgeCategory::General), dec!(12500));
        assert_eq!(tax(AgeCategory::Senior), dec!(10000));
        assert_eq!(tax(AgeCategory::SuperSenior), dec!(0));
    }

    #[test]
    fn fy_2025_26_changes_only_new_regime() {
        let a = TaxYearConfig::fy_2024_25();
        let b = TaxYearConfig::fy_2025_26();
        assert_eq!(a.old_regime, b.old_regime);
        assert_ne!(a.new_regime.slabs, b.new_regime.slabs);
        assert_eq!(b.new_regime.rebate_threshold, dec!(1200000));
        assert_eq!(a.deductions, b.deductions);
    }

    #[test]
    fn json_round_trip_through_reader() {
        let config = TaxYearConfig::fy_2025_26();
        let json = serde_json::to_vec(&config).unwrap();
        let loaded = TaxYearConfig::from_json_reader(json.as_slice()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn loading_rejects_malformed_slabs() {
        let mut config = TaxYearConfig::fy_2024_25();
        config.old_regime.slabs.senior = SlabTable::from_bands(
            &[(dec!(500000), dec!(0)), (dec!(300000), dec!(0.05))],
            dec!(0.3),
        );
        let json = serde_json::to_vec(&config).unwrap();
        let err = TaxYearConfig::from_json_reader(json.as_slice()).unwrap_err();
        assert!(err.to_string().contains("2024-25/OLD/Senior"));
    }

    #[test]
    fn surcharge_bands_must_increase() {
        let mut config = TaxYearConfig::fy_2024_25();
        config.new_regime.surcharge.reverse();
        assert!(config.validate().is_err());
    }
}
