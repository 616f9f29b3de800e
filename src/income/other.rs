use super::{Breakdown, FlatRateIncome, HeadContext, HeadKind, IncomeHead};
use crate::core::Validator;
use crate::money::Money;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BusinessScheme {
    /// Profit from books of account
    #[default]
    Actual,
    /// Presumptive income of a small business
    #[serde(rename = "PRESUMPTIVE_44AD")]
    Presumptive44AD,
    /// Presumptive income of a profession
    #[serde(rename = "PRESUMPTIVE_44ADA")]
    Presumptive44ADA,
}

/// Business or professional income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BusinessIncome {
    pub scheme: BusinessScheme,
    /// Turnover or gross receipts
    #[schemars(with = "f64")]
    pub gross_receipts: Decimal,
    /// Part of the receipts received through banking or digital channels
    #[schemars(with = "f64")]
    pub digital_receipts: Decimal,
    /// Profit declared; under a presumptive scheme, taxed when higher than
    /// the presumed income
    #[schemars(with = "f64")]
    pub net_profit: Decimal,
}

impl BusinessIncome {
    pub fn taxable_profit(&self, ctx: &HeadContext) -> Money {
        let rules = &ctx.config.other_income;
        let declared = ctx.money(self.net_profit);
        let presumed = match self.scheme {
            BusinessScheme::Actual => return declared,
            BusinessScheme::Presumptive44AD => {
                let cash = ctx.money(self.gross_receipts - self.digital_receipts);
                cash.percentage(rules.presumptive_44ad_rate).add(
                    ctx.money(self.digital_receipts)
                        .percentage(rules.presumptive_44ad_digital_rate),
                )
            }
            BusinessScheme::Presumptive44ADA => ctx
                .money(self.gross_receipts)
                .percentage(rules.presumptive_44ada_rate),
        };
        presumed.max(declared)
    }
}

/// Income from other sources, plus business income.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OtherIncome {
    /// Interest on savings bank accounts
    #[schemars(with = "f64")]
    pub savings_interest: Decimal,
    /// Interest on fixed and recurring deposits
    #[schemars(with = "f64")]
    pub deposit_interest: Decimal,
    #[schemars(with = "f64")]
    pub dividends: Decimal,
    #[schemars(with = "f64")]
    pub family_pension: Decimal,
    /// Aggregate value of gifts received from non-relatives
    #[schemars(with = "f64")]
    pub gifts_from_non_relatives: Decimal,
    /// Lottery, puzzle and game show winnings
    #[schemars(with = "f64")]
    pub lottery_winnings: Decimal,
    #[schemars(with = "f64")]
    pub other: Decimal,
    pub business: Option<BusinessIncome>,
}

impl OtherIncome {
    /// One third of the pension, capped per regime.
    pub fn family_pension_deduction(&self, ctx: &HeadContext) -> Money {
        let cap = ctx.config.regime(ctx.regime).family_pension_deduction_cap;
        ctx.money(self.family_pension)
            .divide(3)
            .min(ctx.money(cap))
    }

    /// Gifts are taxed in full once their aggregate crosses the limit.
    pub fn taxable_gifts(&self, ctx: &HeadContext) -> Money {
        if self.gifts_from_non_relatives > ctx.config.other_income.gift_exemption_limit {
            ctx.money(self.gifts_from_non_relatives)
        } else {
            ctx.zero()
        }
    }
}

impl IncomeHead for OtherIncome {
    fn kind(&self) -> HeadKind {
        HeadKind::OtherSources
    }

    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let savings = ctx.money(self.savings_interest);
        let deposits = ctx.money(self.deposit_interest);
        let dividends = ctx.money(self.dividends);
        let pension = ctx.money(self.family_pension);
        let pension_deduction = self.family_pension_deduction(ctx);
        let gifts = self.taxable_gifts(ctx);
        let lottery = ctx.money(self.lottery_winnings);
        let other = ctx.money(self.other);
        let business = self
            .business
            .as_ref()
            .map_or(ctx.zero(), |b| b.taxable_profit(ctx));

        let gross = Money::sum(
            ctx.config.currency,
            [
                savings,
                deposits,
                dividends,
                pension,
                ctx.money(self.gifts_from_non_relatives),
                lottery,
                other,
                business,
            ],
        );
        let mut b = Breakdown::new(HeadKind::OtherSources, gross);
        b.line("Savings interest", savings);
        b.line("Deposit interest", deposits);
        b.line("Dividends", dividends);
        b.line("Family pension", pension);
        b.line("Family pension deduction", pension_deduction);
        b.line("Taxable gifts", gifts);
        b.line("Lottery winnings", lottery);
        b.line("Business income", business);
        b.line("Other", other);

        b.net = Money::sum(
            ctx.config.currency,
            [
                savings,
                deposits,
                dividends,
                pension.subtract(pension_deduction),
                gifts,
                lottery,
                other,
                business,
            ],
        );
        b
    }

    fn flat_rate_income(&self, ctx: &HeadContext) -> Vec<FlatRateIncome> {
        let lottery = ctx.money(self.lottery_winnings);
        if lottery.is_zero() {
            return Vec::new();
        }
        vec![FlatRateIncome {
            label: "Lottery winnings".to_string(),
            amount: lottery,
            rate: ctx.config.other_income.lottery_rate,
            capital_gain: false,
        }]
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        v.amounts(
            scope,
            &[
                ("savings_interest", self.savings_interest),
                ("deposit_interest", self.deposit_interest),
                ("dividends", self.dividends),
                ("family_pension", self.family_pension),
                ("gifts_from_non_relatives", self.gifts_from_non_relatives),
                ("lottery_winnings", self.lottery_winnings),
                ("other", self.other),
            ],
        );
        if let Some(business) = &self.business {
            let scope = format!("{scope}.business");
            v.amounts(
                &scope,
                &[
                    ("gross_receipts", business.gross_receipts),
                    ("digital_receipts", business.digital_receipts),
                    ("net_profit", business.net_profit),
                ],
            );
            if business.digital_receipts > business.gross_receipts {
                v.reject(
                    format!("{scope}.digital_receipts"),
                    "cannot exceed gross receipts",
                );
            }
        }
    }
}
