use super::{Breakdown, HeadContext, HeadKind, IncomeHead};
use crate::core::Validator;
use crate::money::{Money, Rate};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Employer-provided car used for both official and private purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompanyCar {
    /// Engine capacity above 1.6 litres
    pub large_engine: bool,
    pub with_driver: bool,
    /// Months of the year the car was provided
    pub months: u32,
}

/// Loan from the employer at less than the benchmark rate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ConcessionalLoan {
    /// Average outstanding principal over the year
    #[schemars(with = "f64")]
    pub principal: Decimal,
    #[schemars(with = "f64")]
    pub benchmark_rate: Rate,
    #[schemars(with = "f64")]
    pub charged_rate: Rate,
}

/// Taxable value of benefits in kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Perquisites {
    #[schemars(with = "f64")]
    pub accommodation: Decimal,
    /// Fair market value less price paid on allotted shares
    #[schemars(with = "f64")]
    pub esop: Decimal,
    #[schemars(with = "f64")]
    pub other: Decimal,
    pub car: Option<CompanyCar>,
    pub loans: Vec<ConcessionalLoan>,
}

impl Perquisites {
    fn car_value(&self, ctx: &HeadContext) -> Money {
        let Some(car) = &self.car else {
            return ctx.zero();
        };
        let rules = &ctx.config.perquisites;
        let mut monthly = if car.large_engine {
            rules.car_large_monthly
        } else {
            rules.car_small_monthly
        };
        if car.with_driver {
            monthly += rules.car_driver_monthly;
        }
        ctx.money(monthly).times(Decimal::from(car.months))
    }

    fn loan_value(&self, ctx: &HeadContext) -> Money {
        let principal: Decimal = self.loans.iter().map(|l| l.principal).sum();
        if principal <= ctx.config.perquisites.loan_exemption_limit {
            return ctx.zero();
        }
        Money::sum(
            ctx.config.currency,
            self.loans.iter().map(|loan| {
                let concession = (loan.benchmark_rate - loan.charged_rate).max(Decimal::ZERO);
                ctx.money(loan.principal).percentage(concession)
            }),
        )
    }
}

impl IncomeHead for Perquisites {
    fn kind(&self) -> HeadKind {
        HeadKind::Perquisites
    }

    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let accommodation = ctx.money(self.accommodation);
        let esop = ctx.money(self.esop);
        let other = ctx.money(self.other);
        let car = self.car_value(ctx);
        let loans = self.loan_value(ctx);

        let total = Money::sum(ctx.config.currency, [accommodation, esop, other, car, loans]);
        let mut b = Breakdown::new(HeadKind::Perquisites, total);
        b.line("Accommodation", accommodation);
        b.line("ESOP", esop);
        b.line("Motor car", car);
        b.line("Concessional loans", loans);
        b.line("Other perquisites", other);
        b
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        v.amounts(
            scope,
            &[
                ("accommodation", self.accommodation),
                ("esop", self.esop),
                ("other", self.other),
            ],
        );
        if let Some(car) = &self.car {
            if car.months > 12 {
                v.reject(format!("{scope}.car.months"), "cannot exceed 12");
            }
        }
        for (i, loan) in self.loans.iter().enumerate() {
            let scope = format!("{scope}.loans[{i}]");
            v.amount(format!("{scope}.principal"), loan.principal);
            v.rate(format!("{scope}.benchmark_rate"), loan.benchmark_rate);
            v.rate(format!("{scope}.charged_rate"), loan.charged_rate);
        }
    }
}
