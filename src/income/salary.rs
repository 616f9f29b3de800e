use super::{Breakdown, HeadContext, HeadKind, IncomeHead};
use crate::core::{Validator, Warning};
use crate::money::Money;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annual salary and its components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SalaryIncome {
    #[schemars(with = "f64")]
    pub basic: Decimal,
    #[schemars(with = "f64")]
    pub dearness_allowance: Decimal,
    /// House rent allowance received
    #[schemars(with = "f64")]
    pub hra_received: Decimal,
    #[schemars(with = "f64")]
    pub special_allowance: Decimal,
    /// Leave travel allowance received
    #[schemars(with = "f64")]
    pub lta_received: Decimal,
    #[schemars(with = "f64")]
    pub bonus: Decimal,
    #[schemars(with = "f64")]
    pub commission: Decimal,
    #[schemars(with = "f64")]
    pub other_allowances: Decimal,
    /// Professional tax paid to the state
    #[schemars(with = "f64")]
    pub professional_tax: Decimal,
    /// Annual rent paid for accommodation
    #[schemars(with = "f64")]
    pub rent_paid: Decimal,
    /// Rented accommodation is in a metro city
    pub metro_city: bool,
    /// Travel cost claimed against the LTA received
    #[schemars(with = "f64")]
    pub lta_exemption_claimed: Decimal,
}

impl SalaryIncome {
    pub fn gross(&self) -> Decimal {
        self.basic
            + self.dearness_allowance
            + self.hra_received
            + self.special_allowance
            + self.lta_received
            + self.bonus
            + self.commission
            + self.other_allowances
    }

    /// min(HRA received, rent paid less 10% of salary, 50%/40% of salary),
    /// salary being basic plus dearness allowance.
    pub fn hra_exemption(&self, ctx: &HeadContext) -> Money {
        let rules = &ctx.config.salary;
        let salary = ctx.money(self.basic + self.dearness_allowance);
        let hra = ctx.money(self.hra_received);
        let rent = ctx.money(self.rent_paid);
        if hra.is_zero() || rent.is_zero() {
            return ctx.zero();
        }

        let rent_excess = rent.subtract(salary.percentage(rules.hra_rent_excess_rate));
        let city_rate = if self.metro_city {
            rules.hra_metro_rate
        } else {
            rules.hra_non_metro_rate
        };
        hra.min(rent_excess).min(salary.percentage(city_rate))
    }
}

impl IncomeHead for SalaryIncome {
    fn kind(&self) -> HeadKind {
        HeadKind::Salary
    }

    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let gross = ctx.money(self.gross());
        let mut b = Breakdown::new(HeadKind::Salary, gross);
        b.line("Gross salary", gross);

        if !ctx.allows_salary_exemptions() {
            return b;
        }

        let hra = self.hra_exemption(ctx);
        b.line("HRA exemption", hra);

        let lta_claimed = ctx.money(self.lta_exemption_claimed);
        let lta = lta_claimed.min(ctx.money(self.lta_received));
        if lta < lta_claimed {
            b.warnings.push(Warning::ExemptionLimited {
                exemption: "LTA".to_string(),
                claimed: lta_claimed.amount(),
                allowed: lta.amount(),
            });
        }
        b.line("LTA exemption", lta);

        let pt_paid = ctx.money(self.professional_tax);
        let pt = pt_paid.min(ctx.money(ctx.config.salary.professional_tax_cap));
        if pt < pt_paid {
            b.warnings.push(Warning::ExemptionLimited {
                exemption: "Professional tax".to_string(),
                claimed: pt_paid.amount(),
                allowed: pt.amount(),
            });
        }
        b.line("Professional tax", pt);

        b.net = gross.subtract(hra).subtract(lta).subtract(pt);
        b
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        v.amounts(
            scope,
            &[
                ("basic", self.basic),
                ("dearness_allowance", self.dearness_allowance),
                ("hra_received", self.hra_received),
                ("special_allowance", self.special_allowance),
                ("lta_received", self.lta_received),
                ("bonus", self.bonus),
                ("commission", self.commission),
                ("other_allowances", self.other_allowances),
                ("professional_tax", self.professional_tax),
                ("rent_paid", self.rent_paid),
                ("lta_exemption_claimed", self.lta_exemption_claimed),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AgeCategory, TaxRegime};
    use crate::tax::config::TaxYearConfig;
    use rust_decimal_macros::dec;

    fn salary() -> SalaryIncome {
        SalaryIncome {
            basic: dec!(600000),
            hra_received: dec!(240000),
            special_allowance: dec!(160000),
            rent_paid: dec!(180000),
            professional_tax: dec!(2500),
            ..SalaryIncome::default()
        }
    }

    #[test]
    fn hra_exemption_is_least_of_three() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        // rent 180,000 - 60,000 = 120,000 < 240,000 received < 240,000 (40%)
        assert_eq!(salary().hra_exemption(&ctx).amount(), dec!(120000));

        let metro = SalaryIncome {
            rent_paid: dec!(600000),
            metro_city: true,
            ..salary()
        };
        assert_eq!(metro.hra_exemption(&ctx).amount(), dec!(240000));
    }

    #[test]
    fn old_regime_applies_salary_exemptions() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let b = salary().get_breakdown(&ctx);
        assert_eq!(b.gross.amount(), dec!(1000000));
        assert_eq!(b.net.amount(), dec!(877500));
        assert_eq!(b.get("HRA exemption").unwrap().amount(), dec!(120000));
    }

    #[test]
    fn new_regime_taxes_gross_salary() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::New, AgeCategory::General);
        assert_eq!(salary().compute_net_income(&ctx).amount(), dec!(1000000));
        assert!(salary().get_breakdown(&ctx).get("HRA exemption").is_none());
    }

    #[test]
    fn lta_and_professional_tax_are_limited() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let income = SalaryIncome {
            basic: dec!(500000),
            lta_received: dec!(30000),
            lta_exemption_claimed: dec!(45000),
            professional_tax: dec!(3000),
            ..SalaryIncome::default()
        };
        let b = income.get_breakdown(&ctx);
        assert_eq!(b.net.amount(), dec!(530000) - dec!(30000) - dec!(2500));
        assert_eq!(b.warnings.len(), 2);
    }

    #[test]
    fn negative_components_are_reported() {
        let mut v = Validator::new();
        SalaryIncome {
            basic: dec!(-1),
            bonus: dec!(-5),
            ..SalaryIncome::default()
        }
        .validate("income.salary", &mut v);
        let err = v.finish().unwrap_err();
        assert!(err.contains("income.salary.basic"));
        assert!(err.contains("income.salary.bonus"));
    }
}
