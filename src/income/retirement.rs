use super::{Breakdown, HeadContext, HeadKind, IncomeHead};
use crate::core::Validator;
use crate::money::{Money, Rate};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lump sums received on retirement or separation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetirementBenefits {
    /// Central or state government employee
    pub government_employee: bool,
    #[schemars(with = "f64")]
    pub gratuity: Decimal,
    #[schemars(with = "f64")]
    pub leave_encashment: Decimal,
    /// Lump sum received for commuting part of the pension
    #[schemars(with = "f64")]
    pub commuted_pension: Decimal,
    /// Fraction of the pension that was commuted
    #[schemars(with = "f64")]
    pub commuted_fraction: Rate,
    /// Voluntary retirement compensation
    #[schemars(with = "f64")]
    pub vrs_compensation: Decimal,
    #[schemars(with = "f64")]
    pub pf_withdrawal: Decimal,
    /// Years of continuous service behind the PF withdrawal
    pub pf_service_years: u32,
}

impl RetirementBenefits {
    fn capped(&self, ctx: &HeadContext, amount: Decimal, cap: Decimal) -> Money {
        let received = ctx.money(amount);
        if self.government_employee {
            received
        } else {
            received.min(ctx.money(cap))
        }
    }

    /// Exempt share of the commuted pension: a third of the full commuted
    /// value when gratuity is also received, half otherwise.
    fn commuted_pension_exemption(&self, ctx: &HeadContext) -> Money {
        let received = ctx.money(self.commuted_pension);
        if self.government_employee {
            return received;
        }
        if received.is_zero() || self.commuted_fraction <= Decimal::ZERO {
            return ctx.zero();
        }
        // a full value too large to represent exempts the whole lump sum
        let Some(full_value) = self.commuted_pension.checked_div(self.commuted_fraction) else {
            return received;
        };
        let full_value = ctx.money(full_value);
        let share = if self.gratuity > Decimal::ZERO {
            full_value.divide(3)
        } else {
            full_value.divide(2)
        };
        share.min(received)
    }

    fn pf_exemption(&self, ctx: &HeadContext) -> Money {
        if self.pf_service_years >= ctx.config.retirement.pf_min_service_years {
            ctx.money(self.pf_withdrawal)
        } else {
            ctx.zero()
        }
    }
}

impl IncomeHead for RetirementBenefits {
    fn kind(&self) -> HeadKind {
        HeadKind::RetirementBenefits
    }

    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let rules = &ctx.config.retirement;
        let gross = ctx.money(
            self.gratuity
                + self.leave_encashment
                + self.commuted_pension
                + self.vrs_compensation
                + self.pf_withdrawal,
        );
        let mut b = Breakdown::new(HeadKind::RetirementBenefits, gross);

        let gratuity = self.capped(ctx, self.gratuity, rules.gratuity_exemption_cap);
        let leave = self.capped(ctx, self.leave_encashment, rules.leave_encashment_exemption_cap);
        let pension = self.commuted_pension_exemption(ctx);
        let vrs = ctx
            .money(self.vrs_compensation)
            .min(ctx.money(rules.vrs_exemption_cap));
        let pf = self.pf_exemption(ctx);

        b.line("Gratuity exemption", gratuity);
        b.line("Leave encashment exemption", leave);
        b.line("Commuted pension exemption", pension);
        b.line("VRS exemption", vrs);
        b.line("PF withdrawal exemption", pf);

        let exempt = Money::sum(ctx.config.currency, [gratuity, leave, pension, vrs, pf]);
        b.net = gross.subtract(exempt);
        b
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        v.amounts(
            scope,
            &[
                ("gratuity", self.gratuity),
                ("leave_encashment", self.leave_encashment),
                ("commuted_pension", self.commuted_pension),
                ("vrs_compensation", self.vrs_compensation),
                ("pf_withdrawal", self.pf_withdrawal),
            ],
        );
        if self.commuted_pension > Decimal::ZERO
            && (self.commuted_fraction <= Decimal::ZERO || self.commuted_fraction > Decimal::ONE)
        {
            v.reject(
                format!("{scope}.commuted_fraction"),
                "must be within (0, 1] when a commuted pension is declared",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AgeCategory, TaxRegime};
    use crate::tax::config::TaxYearConfig;
    use rust_decimal_macros::dec;

    fn benefits() -> RetirementBenefits {
        RetirementBenefits {
            gratuity: dec!(2500000),
            leave_encashment: dec!(300000),
            commuted_pension: dec!(600000),
            commuted_fraction: dec!(0.5),
            vrs_compensation: dec!(700000),
            pf_withdrawal: dec!(400000),
            pf_service_years: 3,
            ..RetirementBenefits::default()
        }
    }

    #[test]
    fn private_sector_exemptions_are_capped() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::Senior);
        let b = benefits().get_breakdown(&ctx);
        assert_eq!(b.get("Gratuity exemption").unwrap().amount(), dec!(2000000));
        // full value 1,200,000, a third exempt since gratuity was received
        assert_eq!(b.get("Commuted pension exemption").unwrap().amount(), dec!(400000));
        assert_eq!(b.get("VRS exemption").unwrap().amount(), dec!(500000));
        assert!(b.get("PF withdrawal exemption").unwrap().is_zero());
        // 500,000 + 200,000 + 200,000 + 400,000
        assert_eq!(b.net.amount(), dec!(1300000));
    }

    #[test]
    fn government_employees_fully_exempt() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::New, AgeCategory::Senior);
        let gov = RetirementBenefits {
            government_employee: true,
            pf_service_years: 30,
            ..benefits()
        };
        // VRS cap still applies
        assert_eq!(gov.compute_net_income(&ctx).amount(), dec!(200000));
    }

    #[test]
    fn commuted_fraction_required() {
        let mut v = Validator::new();
        RetirementBenefits {
            commuted_pension: dec!(1000),
            ..RetirementBenefits::default()
        }
        .validate("income.retirement", &mut v);
        assert!(v
            .finish()
            .unwrap_err()
            .contains("income.retirement.commuted_fraction"));
    }

    #[test]
    fn tiny_commuted_fraction_exempts_whole_lump_sum() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::Senior);
        let benefits = RetirementBenefits {
            commuted_pension: dec!(900000000000000),
            commuted_fraction: dec!(0.0000000000000000000000000001),
            ..RetirementBenefits::default()
        };
        let b = benefits.get_breakdown(&ctx);
        assert_eq!(
            b.get("Commuted pension exemption").unwrap().amount(),
            dec!(900000000000000)
        );
        assert!(b.net.is_zero());
    }
}
