//! Income heads and their aggregation.
//!
//! Each head computes its own taxable contribution from the figures declared
//! for it. [`IncomeHeads`] composes the closed set of heads and produces the
//! gross total income the deductions and slabs are applied to.

pub mod capital_gains;
pub mod house_property;
pub mod other;
pub mod perquisites;
pub mod retirement;
pub mod salary;

pub use capital_gains::{CapitalGainExemption, CapitalGainsIncome, ExemptionSection, GainBucket};
pub use house_property::{HouseProperty, HousePropertyIncome, Occupancy};
pub use other::{BusinessIncome, BusinessScheme, OtherIncome};
pub use perquisites::{CompanyCar, ConcessionalLoan, Perquisites};
pub use retirement::RetirementBenefits;
pub use salary::SalaryIncome;

use crate::core::{AgeCategory, TaxRegime, Validator, Warning};
use crate::money::{Money, Rate};
use crate::tax::config::TaxYearConfig;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything a head needs to compute its contribution, resolved once per
/// calculation.
#[derive(Debug, Clone, Copy)]
pub struct HeadContext<'a> {
    pub config: &'a TaxYearConfig,
    pub regime: TaxRegime,
    pub age: AgeCategory,
}

impl<'a> HeadContext<'a> {
    pub fn new(config: &'a TaxYearConfig, regime: TaxRegime, age: AgeCategory) -> Self {
        HeadContext {
            config,
            regime,
            age,
        }
    }

    pub fn money(&self, amount: Decimal) -> Money {
        Money::new(amount, self.config.currency)
    }

    pub fn zero(&self) -> Money {
        Money::zero(self.config.currency)
    }

    pub fn allows_salary_exemptions(&self) -> bool {
        self.config.regime(self.regime).allows_salary_exemptions
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeadKind {
    Salary,
    Perquisites,
    RetirementBenefits,
    HouseProperty,
    CapitalGains,
    OtherSources,
}

impl HeadKind {
    pub fn display(&self) -> &'static str {
        match self {
            HeadKind::Salary => "Salary",
            HeadKind::Perquisites => "Perquisites",
            HeadKind::RetirementBenefits => "Retirement benefits",
            HeadKind::HouseProperty => "House property",
            HeadKind::CapitalGains => "Capital gains",
            HeadKind::OtherSources => "Other sources",
        }
    }

    /// Heads chargeable under "Salaries", which the standard deduction is
    /// limited to.
    pub fn is_salary(&self) -> bool {
        matches!(
            self,
            HeadKind::Salary | HeadKind::Perquisites | HeadKind::RetirementBenefits
        )
    }
}

/// One labelled figure in a head's computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: Money,
}

/// Auditable computation of one head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub head: HeadKind,
    pub gross: Money,
    pub lines: Vec<BreakdownLine>,
    /// Net contribution; negative only for a house property loss
    pub net: Money,
    pub warnings: Vec<Warning>,
}

impl Breakdown {
    pub fn new(head: HeadKind, gross: Money) -> Self {
        Breakdown {
            head,
            gross,
            lines: Vec::new(),
            net: gross,
            warnings: Vec::new(),
        }
    }

    pub fn line(&mut self, label: impl Into<String>, amount: Money) {
        self.lines.push(BreakdownLine {
            label: label.into(),
            amount,
        });
    }

    pub fn get(&self, label: &str) -> Option<Money> {
        self.lines
            .iter()
            .find(|line| line.label == label)
            .map(|line| line.amount)
    }
}

/// Income taxed at its own statutory rate, outside the slab table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRateIncome {
    pub label: String,
    pub amount: Money,
    pub rate: Rate,
    /// Surcharge on this tax is capped at the capital gains cap
    pub capital_gain: bool,
}

/// Shared capability of every income head.
pub trait IncomeHead {
    fn kind(&self) -> HeadKind;

    /// Step-by-step computation of the head.
    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown;

    /// Net taxable contribution of the head.
    fn compute_net_income(&self, ctx: &HeadContext) -> Money {
        self.get_breakdown(ctx).net.floor_zero()
    }

    /// Part of the net income taxed at flat rates.
    fn flat_rate_income(&self, _ctx: &HeadContext) -> Vec<FlatRateIncome> {
        Vec::new()
    }

    /// Record every invalid field under `scope`.
    fn validate(&self, scope: &str, v: &mut Validator);
}

/// The declared income heads of one taxpayer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IncomeHeads {
    pub salary: Option<SalaryIncome>,
    pub perquisites: Option<Perquisites>,
    pub retirement: Option<RetirementBenefits>,
    pub house_property: HousePropertyIncome,
    pub capital_gains: Option<CapitalGainsIncome>,
    pub other: Option<OtherIncome>,
}

/// Contribution of one head to the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadSummary {
    pub head: HeadKind,
    pub gross: Money,
    pub net: Money,
    pub breakdown: Breakdown,
}

/// Income after intra- and inter-head set-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateIncome {
    pub heads: Vec<HeadSummary>,
    /// Sum of the heads' gross figures
    pub gross_income: Money,
    /// Gross total income taxed at slab rates, never negative
    pub slab_income: Money,
    pub flat_rate: Vec<FlatRateIncome>,
    /// Net income chargeable under "Salaries"
    pub salary_income: Money,
    pub warnings: Vec<Warning>,
}

impl AggregateIncome {
    pub fn flat_rate_total(&self) -> Money {
        Money::sum(
            self.slab_income.currency(),
            self.flat_rate.iter().map(|f| f.amount),
        )
    }

    /// Slab-rate plus flat-rate income.
    pub fn total_income(&self) -> Money {
        self.slab_income.add(self.flat_rate_total())
    }

    pub fn head(&self, kind: HeadKind) -> Option<&HeadSummary> {
        self.heads.iter().find(|h| h.head == kind)
    }
}

impl IncomeHeads {
    fn each(&self) -> Vec<&dyn IncomeHead> {
        let mut heads: Vec<&dyn IncomeHead> = Vec::new();
        if let Some(salary) = &self.salary {
            heads.push(salary);
        }
        if let Some(perquisites) = &self.perquisites {
            heads.push(perquisites);
        }
        if let Some(retirement) = &self.retirement {
            heads.push(retirement);
        }
        if !self.house_property.properties.is_empty() {
            heads.push(&self.house_property);
        }
        if let Some(capital_gains) = &self.capital_gains {
            heads.push(capital_gains);
        }
        if let Some(other) = &self.other {
            heads.push(other);
        }
        heads
    }

    pub fn validate(&self, v: &mut Validator) {
        if let Some(salary) = &self.salary {
            salary.validate("income.salary", v);
        }
        if let Some(perquisites) = &self.perquisites {
            perquisites.validate("income.perquisites", v);
        }
        if let Some(retirement) = &self.retirement {
            retirement.validate("income.retirement", v);
        }
        self.house_property.validate("income.house_property", v);
        if let Some(capital_gains) = &self.capital_gains {
            capital_gains.validate("income.capital_gains", v);
        }
        if let Some(other) = &self.other {
            other.validate("income.other", v);
        }
    }

    /// Interest eligible for 80TTA (savings accounts only).
    pub fn savings_interest(&self) -> Decimal {
        self.other
            .as_ref()
            .map_or(Decimal::ZERO, |o| o.savings_interest)
    }

    /// Interest eligible for 80TTB (savings and deposits).
    pub fn deposit_interest(&self) -> Decimal {
        self.other
            .as_ref()
            .map_or(Decimal::ZERO, |o| o.savings_interest + o.deposit_interest)
    }

    /// Basic plus dearness allowance, the base of percentage-of-salary caps.
    pub fn basic_salary(&self) -> Decimal {
        self.salary
            .as_ref()
            .map_or(Decimal::ZERO, |s| s.basic + s.dearness_allowance)
    }

    pub fn receives_hra(&self) -> bool {
        self.salary
            .as_ref()
            .is_some_and(|s| s.hra_received > Decimal::ZERO)
    }

    /// Compute every head and set losses off.
    ///
    /// Property results are netted against each other first, unclamped. A
    /// remaining house property loss is set off against the other heads only
    /// up to the regime's limit. The floor at zero is applied to the
    /// aggregate, never to a single property.
    pub fn aggregate(&self, ctx: &HeadContext) -> AggregateIncome {
        let mut summaries = Vec::new();
        let mut flat_rate = Vec::new();
        let mut warnings = Vec::new();
        let mut other_heads = ctx.zero();
        let mut salary_income = ctx.zero();
        let mut house_property = ctx.zero();

        for head in self.each() {
            let breakdown = head.get_breakdown(ctx);
            let flat = head.flat_rate_income(ctx);
            let flat_total = Money::sum(ctx.config.currency, flat.iter().map(|f| f.amount));
            let net = breakdown.net;

            match head.kind() {
                HeadKind::HouseProperty => house_property = net,
                kind => {
                    let slab_part = net.floor_zero().subtract(flat_total);
                    other_heads = other_heads.add(slab_part);
                    if kind.is_salary() {
                        salary_income = salary_income.add(slab_part);
                    }
                }
            }

            warnings.extend(breakdown.warnings.iter().cloned());
            flat_rate.extend(flat);
            summaries.push(HeadSummary {
                head: head.kind(),
                gross: breakdown.gross,
                net,
                breakdown,
            });
        }

        let slab_income = if house_property.is_negative() {
            let loss = house_property.zeroed().difference(house_property);
            let limit = ctx.money(ctx.config.regime(ctx.regime).house_property_setoff_limit);
            let set_off = loss.min(limit).min(other_heads);
            if set_off < loss {
                log::warn!(
                    "house property loss {} limited to set-off of {} under {} regime",
                    loss,
                    set_off,
                    ctx.regime
                );
                warnings.push(Warning::HousePropertyLossLimited {
                    loss: loss.amount(),
                    set_off: set_off.amount(),
                });
            }
            other_heads.subtract(set_off)
        } else {
            other_heads.add(house_property)
        };

        let gross_income = Money::sum(ctx.config.currency, summaries.iter().map(|s| s.gross));
        log::debug!(
            "aggregate income under {}: gross {}, slab-rate {}, flat-rate items {}",
            ctx.regime,
            gross_income,
            slab_income,
            flat_rate.len()
        );

        AggregateIncome {
            heads: summaries,
            gross_income,
            slab_income,
            flat_rate,
            salary_income,
            warnings,
        }
    }
}
