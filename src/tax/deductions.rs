//! Chapter VI-A deductions and the standard deduction.
//!
//! Claims are clamped to their section caps, never rejected; each clamp is
//! recorded as a [`Warning`]. Percentage-of-income caps are resolved against
//! the aggregate income, so heads must be aggregated before deductions apply.

use crate::core::{AgeCategory, Validator, Warning};
use crate::income::{AggregateIncome, HeadContext, IncomeHeads};
use crate::money::Money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Statutory deduction section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Section {
    #[serde(rename = "80C")]
    Sec80C,
    #[serde(rename = "80CCC")]
    Sec80CCC,
    #[serde(rename = "80CCD(1)")]
    Sec80CCD1,
    #[serde(rename = "80CCD(1B)")]
    Sec80CCD1B,
    #[serde(rename = "80CCD(2)")]
    Sec80CCD2,
    #[serde(rename = "80D")]
    Sec80D,
    #[serde(rename = "80D(PARENTS)")]
    Sec80DParents,
    #[serde(rename = "80DD")]
    Sec80DD,
    #[serde(rename = "80DDB")]
    Sec80DDB,
    #[serde(rename = "80E")]
    Sec80E,
    #[serde(rename = "80EE")]
    Sec80EE,
    #[serde(rename = "80EEA")]
    Sec80EEA,
    #[serde(rename = "80EEB")]
    Sec80EEB,
    #[serde(rename = "80G")]
    Sec80G,
    #[serde(rename = "80GG")]
    Sec80GG,
    #[serde(rename = "80TTA")]
    Sec80TTA,
    #[serde(rename = "80TTB")]
    Sec80TTB,
    #[serde(rename = "80U")]
    Sec80U,
}

impl Section {
    pub const ALL: [Section; 18] = [
        Section::Sec80C,
        Section::Sec80CCC,
        Section::Sec80CCD1,
        Section::Sec80CCD1B,
        Section::Sec80CCD2,
        Section::Sec80D,
        Section::Sec80DParents,
        Section::Sec80DD,
        Section::Sec80DDB,
        Section::Sec80E,
        Section::Sec80EE,
        Section::Sec80EEA,
        Section::Sec80EEB,
        Section::Sec80G,
        Section::Sec80GG,
        Section::Sec80TTA,
        Section::Sec80TTB,
        Section::Sec80U,
    ];

    /// Sections sharing the 80CCE aggregate, in the order they absorb it.
    pub const SEC_80CCE: [Section; 3] = [Section::Sec80C, Section::Sec80CCC, Section::Sec80CCD1];

    pub fn code(&self) -> &'static str {
        match self {
            Section::Sec80C => "80C",
            Section::Sec80CCC => "80CCC",
            Section::Sec80CCD1 => "80CCD(1)",
            Section::Sec80CCD1B => "80CCD(1B)",
            Section::Sec80CCD2 => "80CCD(2)",
            Section::Sec80D => "80D",
            Section::Sec80DParents => "80D(PARENTS)",
            Section::Sec80DD => "80DD",
            Section::Sec80DDB => "80DDB",
            Section::Sec80E => "80E",
            Section::Sec80EE => "80EE",
            Section::Sec80EEA => "80EEA",
            Section::Sec80EEB => "80EEB",
            Section::Sec80G => "80G",
            Section::Sec80GG => "80GG",
            Section::Sec80TTA => "80TTA",
            Section::Sec80TTB => "80TTB",
            Section::Sec80U => "80U",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Section::Sec80C => "Life insurance, PPF, ELSS, principal repayment",
            Section::Sec80CCC => "Pension fund contribution",
            Section::Sec80CCD1 => "Employee NPS contribution",
            Section::Sec80CCD1B => "Additional NPS contribution",
            Section::Sec80CCD2 => "Employer NPS contribution",
            Section::Sec80D => "Health insurance, self and family",
            Section::Sec80DParents => "Health insurance, parents",
            Section::Sec80DD => "Maintenance of disabled dependant",
            Section::Sec80DDB => "Treatment of specified diseases",
            Section::Sec80E => "Education loan interest",
            Section::Sec80EE => "First home loan interest",
            Section::Sec80EEA => "Affordable housing loan interest",
            Section::Sec80EEB => "Electric vehicle loan interest",
            Section::Sec80G => "Donations",
            Section::Sec80GG => "Rent paid without HRA",
            Section::Sec80TTA => "Savings account interest",
            Section::Sec80TTB => "Deposit interest, senior citizens",
            Section::Sec80U => "Person with disability",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(' ', "");
        Section::ALL
            .into_iter()
            .find(|section| section.code() == normalized)
            .ok_or_else(|| format!("unknown section code '{s}'"))
    }
}

/// Everything a deduction rule may depend on.
#[derive(Debug, Clone, Copy)]
pub struct DeductionContext<'a> {
    pub head: HeadContext<'a>,
    pub aggregate: &'a AggregateIncome,
    pub incomes: &'a IncomeHeads,
    pub parents_senior_citizen: bool,
}

impl<'a> DeductionContext<'a> {
    fn age(&self) -> AgeCategory {
        self.head.age
    }

    fn money(&self, amount: Decimal) -> Money {
        self.head.money(amount)
    }

    /// Basic plus dearness allowance.
    fn salary(&self) -> Money {
        self.money(self.incomes.basic_salary())
    }

    fn gross_total_income(&self) -> Money {
        self.aggregate.slab_income
    }
}

/// A claim after caps and eligibility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedDeduction {
    pub section: Section,
    pub claimed: Money,
    pub allowed: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionOutcome {
    pub standard_deduction: Money,
    pub sections: Vec<AppliedDeduction>,
    /// Sum of allowed Chapter VI-A sections
    pub chapter_via: Money,
    /// Standard deduction plus Chapter VI-A
    pub total: Money,
    pub warnings: Vec<Warning>,
}

impl DeductionOutcome {
    pub fn allowed(&self, section: Section) -> Option<Money> {
        self.sections
            .iter()
            .find(|d| d.section == section)
            .map(|d| d.allowed)
    }
}

/// Claimed amount per section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxDeductions {
    claims: BTreeMap<Section, Decimal>,
}

impl TaxDeductions {
    pub fn new() -> Self {
        TaxDeductions::default()
    }

    /// Parse raw section codes, recording unknown codes and negative amounts
    /// under `scope`.
    pub fn from_raw(raw: &BTreeMap<String, Decimal>, scope: &str, v: &mut Validator) -> Self {
        let mut deductions = TaxDeductions::new();
        for (code, amount) in raw {
            let field = format!("{scope}.{code}");
            match code.parse::<Section>() {
                Ok(section) => {
                    v.amount(field, *amount);
                    let claim = deductions.claims.entry(section).or_default();
                    *claim = claim.saturating_add(*amount);
                }
                Err(reason) => v.reject(field, reason),
            }
        }
        deductions
    }

    pub fn with_claim(mut self, section: Section, amount: Decimal) -> Self {
        self.claims.insert(section, amount);
        self
    }

    pub fn claim(&self, section: Section) -> Decimal {
        self.claims.get(&section).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, Decimal)> + '_ {
        self.claims.iter().map(|(s, a)| (*s, *a))
    }

    pub fn is_empty(&self) -> bool {
        self.claims.values().all(|a| a.is_zero())
    }

    /// Standard deduction of the regime, limited to income under "Salaries".
    fn standard_deduction(&self, ctx: &DeductionContext, warnings: &mut Vec<Warning>) -> Money {
        let available = ctx.money(ctx.head.config.regime(ctx.head.regime).standard_deduction);
        let salary = ctx.aggregate.salary_income;
        let allowed = available.min(salary);
        if allowed < available && salary.is_positive() {
            warnings.push(Warning::StandardDeductionLimited {
                available: available.amount(),
                allowed: allowed.amount(),
            });
        }
        allowed
    }

    /// Why this taxpayer may not claim the section at all.
    pub fn ineligibility(section: Section, ctx: &DeductionContext) -> Option<&'static str> {
        match section {
            Section::Sec80TTA if ctx.age().is_senior() => {
                Some("senior citizens claim deposit interest under 80TTB")
            }
            Section::Sec80TTB if !ctx.age().is_senior() => Some("available to senior citizens only"),
            Section::Sec80GG if ctx.incomes.receives_hra() => {
                Some("not available while receiving HRA")
            }
            _ => None,
        }
    }

    /// Cap of a single section, `None` when unlimited. The 80CCE aggregate is
    /// applied separately.
    pub fn cap(section: Section, ctx: &DeductionContext) -> Option<Money> {
        let limits = &ctx.head.config.deductions;
        let senior = ctx.age().is_senior();
        let gti = ctx.gross_total_income();
        let cap = match section {
            Section::Sec80C | Section::Sec80CCC => ctx.money(limits.sec_80c_aggregate),
            Section::Sec80CCD1 => ctx
                .salary()
                .percentage(limits.sec_80ccd_1_salary_rate)
                .min(ctx.money(limits.sec_80c_aggregate)),
            Section::Sec80CCD1B => ctx.money(limits.sec_80ccd_1b),
            Section::Sec80CCD2 => ctx.salary().percentage(limits.sec_80ccd_2_salary_rate),
            Section::Sec80D if senior => ctx.money(limits.sec_80d_senior),
            Section::Sec80D => ctx.money(limits.sec_80d_general),
            Section::Sec80DParents if ctx.parents_senior_citizen => {
                ctx.money(limits.sec_80d_parents_senior)
            }
            Section::Sec80DParents => ctx.money(limits.sec_80d_parents),
            Section::Sec80DD => ctx.money(limits.sec_80dd),
            Section::Sec80DDB if senior => ctx.money(limits.sec_80ddb_senior),
            Section::Sec80DDB => ctx.money(limits.sec_80ddb_general),
            Section::Sec80E => return None,
            Section::Sec80EE => ctx.money(limits.sec_80ee),
            Section::Sec80EEA => ctx.money(limits.sec_80eea),
            Section::Sec80EEB => ctx.money(limits.sec_80eeb),
            Section::Sec80G => gti.percentage(limits.sec_80g_income_rate),
            Section::Sec80GG => {
                let rent = ctx
                    .money(ctx.incomes.salary.as_ref().map_or(Decimal::ZERO, |s| s.rent_paid))
                    .subtract(gti.percentage(limits.sec_80gg_rent_excess_rate));
                ctx.money(limits.sec_80gg_monthly * Decimal::from(12))
                    .min(gti.percentage(limits.sec_80gg_income_rate))
                    .min(rent)
            }
            Section::Sec80TTA => ctx
                .money(limits.sec_80tta)
                .min(ctx.money(ctx.incomes.savings_interest())),
            Section::Sec80TTB => ctx
                .money(limits.sec_80ttb)
                .min(ctx.money(ctx.incomes.deposit_interest())),
            Section::Sec80U => ctx.money(limits.sec_80u),
        };
        Some(cap)
    }

    /// How much more could be claimed under `section` before any cap bites.
    pub fn headroom(&self, section: Section, ctx: &DeductionContext) -> Money {
        if Self::ineligibility(section, ctx).is_some() {
            return ctx.head.zero();
        }
        let Some(cap) = Self::cap(section, ctx) else {
            return ctx.head.zero();
        };
        let mut room = cap.subtract(ctx.money(self.claim(section)));
        if Section::SEC_80CCE.contains(&section) {
            let pooled: Decimal = Section::SEC_80CCE.iter().map(|s| self.claim(*s)).sum();
            let aggregate = ctx.money(ctx.head.config.deductions.sec_80c_aggregate);
            room = room.min(aggregate.subtract(ctx.money(pooled)));
        }
        room
    }

    /// Apply every claim under the context's regime.
    pub fn apply(&self, ctx: &DeductionContext) -> DeductionOutcome {
        let rules = ctx.head.config.regime(ctx.head.regime);
        let mut warnings = Vec::new();
        let standard_deduction = self.standard_deduction(ctx, &mut warnings);

        let mut sections = Vec::new();
        for (section, amount) in self.iter() {
            let claimed = ctx.money(amount);
            if claimed.is_zero() {
                continue;
            }
            let allowed = if !rules.allows_chapter_via {
                warnings.push(Warning::DeductionNotInRegime {
                    section: section.code().to_string(),
                    regime: ctx.head.regime.to_string(),
                    claimed: claimed.amount(),
                });
                ctx.head.zero()
            } else if let Some(reason) = Self::ineligibility(section, ctx) {
                log::warn!("{} claim of {} disallowed: {}", section, claimed, reason);
                warnings.push(Warning::DeductionIneligible {
                    section: section.code().to_string(),
                    claimed: claimed.amount(),
                    reason: reason.to_string(),
                });
                ctx.head.zero()
            } else {
                let allowed = Self::cap(section, ctx).map_or(claimed, |cap| claimed.min(cap));
                if allowed < claimed {
                    log::debug!("{} claim of {} capped at {}", section, claimed, allowed);
                    warnings.push(Warning::DeductionClamped {
                        section: section.code().to_string(),
                        claimed: claimed.amount(),
                        allowed: allowed.amount(),
                    });
                }
                allowed
            };
            sections.push(AppliedDeduction {
                section,
                claimed,
                allowed,
            });
        }

        self.apply_80cce(ctx, &mut sections, &mut warnings);

        // Chapter VI-A never exceeds gross total income after the standard
        // deduction; the excess is taken off the last sections first.
        let limit = ctx.gross_total_income().subtract(standard_deduction);
        let claimed_total = Money::sum(ctx.head.config.currency, sections.iter().map(|d| d.allowed));
        if claimed_total > limit {
            warnings.push(Warning::DeductionsExceedIncome {
                claimed: claimed_total.amount(),
                allowed: limit.amount(),
            });
            let mut excess = claimed_total.subtract(limit);
            for applied in sections.iter_mut().rev() {
                let cut = applied.allowed.min(excess);
                applied.allowed = applied.allowed.subtract(cut);
                excess = excess.subtract(cut);
            }
        }

        let chapter_via = Money::sum(ctx.head.config.currency, sections.iter().map(|d| d.allowed));
        let total = standard_deduction.add(chapter_via);
        log::debug!(
            "deductions under {}: standard {}, chapter VI-A {}",
            ctx.head.regime,
            standard_deduction,
            chapter_via
        );
        DeductionOutcome {
            standard_deduction,
            sections,
            chapter_via,
            total,
            warnings,
        }
    }

    /// 80C, 80CCC and 80CCD(1) together never exceed the 80CCE aggregate.
    fn apply_80cce(
        &self,
        ctx: &DeductionContext,
        sections: &mut [AppliedDeduction],
        warnings: &mut Vec<Warning>,
    ) {
        let mut remaining = ctx.money(ctx.head.config.deductions.sec_80c_aggregate);
        for section in Section::SEC_80CCE {
            let Some(applied) = sections.iter_mut().find(|d| d.section == section) else {
                continue;
            };
            let allowed = applied.allowed.min(remaining);
            if allowed < applied.allowed {
                warnings.push(Warning::DeductionClamped {
                    section: format!("{} (80CCE)", section.code()),
                    claimed: applied.allowed.amount(),
                    allowed: allowed.amount(),
                });
                applied.allowed = allowed;
            }
            remaining = remaining.subtract(allowed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TaxRegime;
    use crate::income::{OtherIncome, SalaryIncome};
    use crate::tax::config::TaxYearConfig;
    use rust_decimal_macros::dec;

    struct Fixture {
        config: TaxYearConfig,
        incomes: IncomeHeads,
    }

    impl Fixture {
        fn new(incomes: IncomeHeads) -> Self {
            Fixture {
                config: TaxYearConfig::fy_2024_25(),
                incomes,
            }
        }

        fn apply(
            &self,
            deductions: &TaxDeductions,
            regime: TaxRegime,
            age: AgeCategory,
        ) -> DeductionOutcome {
            let head = HeadContext::new(&self.config, regime, age);
            let aggregate = self.incomes.aggregate(&head);
            let ctx = DeductionContext {
                head,
                aggregate: &aggregate,
                incomes: &self.incomes,
                parents_senior_citizen: false,
            };
            deductions.apply(&ctx)
        }
    }

    fn salaried(basic: Decimal) -> IncomeHeads {
        IncomeHeads {
            salary: Some(SalaryIncome {
                basic,
                ..SalaryIncome::default()
            }),
            ..IncomeHeads::default()
        }
    }

    #[test]
    fn section_codes_parse() {
        assert_eq!("80c".parse::<Section>().unwrap(), Section::Sec80C);
        assert_eq!("80CCD(1B)".parse::<Section>().unwrap(), Section::Sec80CCD1B);
        assert_eq!("80D(PARENTS)".parse::<Section>().unwrap(), Section::Sec80DParents);
        assert!("80Z".parse::<Section>().is_err());
    }

    #[test]
    fn unknown_codes_and_negative_amounts_reported() {
        let raw = BTreeMap::from([
            ("80C".to_string(), dec!(-10)),
            ("80Q".to_string(), dec!(10)),
            ("80D".to_string(), dec!(10)),
        ]);
        let mut v = Validator::new();
        let deductions = TaxDeductions::from_raw(&raw, "deductions", &mut v);
        let err = v.finish().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert!(err.contains("deductions.80C"));
        assert!(err.contains("deductions.80Q"));
        assert_eq!(deductions.claim(Section::Sec80D), dec!(10));
    }

    #[test]
    fn claim_above_cap_is_clamped_and_recorded() {
        let fixture = Fixture::new(salaried(dec!(1200000)));
        let deductions = TaxDeductions::new().with_claim(Section::Sec80C, dec!(300000));
        let outcome = fixture.apply(&deductions, TaxRegime::Old, AgeCategory::General);
        assert_eq!(outcome.allowed(Section::Sec80C).unwrap().amount(), dec!(150000));
        assert!(outcome.warnings.contains(&Warning::DeductionClamped {
            section: "80C".to_string(),
            claimed: dec!(300000),
            allowed: dec!(150000),
        }));
        assert_eq!(outcome.total.amount(), dec!(200000));
    }

    #[test]
    fn new_regime_allows_only_standard_deduction() {
        let fixture = Fixture::new(salaried(dec!(1200000)));
        let deductions = TaxDeductions::new()
            .with_claim(Section::Sec80C, dec!(150000))
            .with_claim(Section::Sec80D, dec!(25000));
        let outcome = fixture.apply(&deductions, TaxRegime::New, AgeCategory::General);
        assert_eq!(outcome.standard_deduction.amount(), dec!(75000));
        assert!(outcome.chapter_via.is_zero());
        assert_eq!(outcome.total.amount(), dec!(75000));
        assert_eq!(outcome.warnings.len(), 2);
    }

    #[test]
    fn sections_share_80cce_aggregate() {
        let fixture = Fixture::new(salaried(dec!(1000000)));
        let deductions = TaxDeductions::new()
            .with_claim(Section::Sec80C, dec!(120000))
            .with_claim(Section::Sec80CCD1, dec!(60000))
            .with_claim(Section::Sec80CCD1B, dec!(50000));
        let outcome = fixture.apply(&deductions, TaxRegime::Old, AgeCategory::General);
        assert_eq!(outcome.allowed(Section::Sec80CCD1).unwrap().amount(), dec!(30000));
        assert_eq!(outcome.allowed(Section::Sec80CCD1B).unwrap().amount(), dec!(50000));
        assert_eq!(outcome.chapter_via.amount(), dec!(200000));
    }

    #[test]
    fn interest_deductions_follow_age() {
        let incomes = IncomeHeads {
            other: Some(OtherIncome {
                savings_interest: dec!(8000),
                deposit_interest: dec!(70000),
                ..OtherIncome::default()
            }),
            ..salaried(dec!(600000))
        };
        let fixture = Fixture::new(incomes);
        let deductions = TaxDeductions::new()
            .with_claim(Section::Sec80TTA, dec!(10000))
            .with_claim(Section::Sec80TTB, dec!(50000));

        let general = fixture.apply(&deductions, TaxRegime::Old, AgeCategory::General);
        // limited to the savings interest actually earned
        assert_eq!(general.allowed(Section::Sec80TTA).unwrap().amount(), dec!(8000));
        assert!(general.allowed(Section::Sec80TTB).unwrap().is_zero());

        let senior = fixture.apply(&deductions, TaxRegime::Old, AgeCategory::Senior);
        assert!(senior.allowed(Section::Sec80TTA).unwrap().is_zero());
        assert_eq!(senior.allowed(Section::Sec80TTB).unwrap().amount(), dec!(50000));
    }

    #[test]
    fn rent_deduction_without_hra() {
        let incomes = IncomeHeads {
            salary: Some(SalaryIncome {
                basic: dec!(600000),
                rent_paid: dec!(120000),
                ..SalaryIncome::default()
            }),
            ..IncomeHeads::default()
        };
        let fixture = Fixture::new(incomes);
        let deductions = TaxDeductions::new().with_claim(Section::Sec80GG, dec!(100000));
        let outcome = fixture.apply(&deductions, TaxRegime::Old, AgeCategory::General);
        // min(60,000, 25% of 600,000, 120,000 - 60,000)
        assert_eq!(outcome.allowed(Section::Sec80GG).unwrap().amount(), dec!(60000));
    }

    #[test]
    fn deductions_never_exceed_income() {
        let fixture = Fixture::new(salaried(dec!(150000)));
        let deductions = TaxDeductions::new()
            .with_claim(Section::Sec80C, dec!(150000))
            .with_claim(Section::Sec80E, dec!(90000));
        let outcome = fixture.apply(&deductions, TaxRegime::Old, AgeCategory::General);
        assert_eq!(outcome.total.amount(), dec!(150000));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::DeductionsExceedIncome { .. })));
    }

    #[test]
    fn standard_deduction_limited_to_salary() {
        let fixture = Fixture::new(salaried(dec!(30000)));
        let outcome = fixture.apply(&TaxDeductions::new(), TaxRegime::Old, AgeCategory::General);
        assert_eq!(outcome.standard_deduction.amount(), dec!(30000));

        let no_salary = Fixture::new(IncomeHeads::default());
        let outcome = no_salary.apply(&TaxDeductions::new(), TaxRegime::New, AgeCategory::General);
        assert!(outcome.total.is_zero());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn headroom_respects_shared_aggregate() {
        let fixture = Fixture::new(salaried(dec!(1000000)));
        let head = HeadContext::new(&fixture.config, TaxRegime::Old, AgeCategory::General);
        let aggregate = fixture.incomes.aggregate(&head);
        let ctx = DeductionContext {
            head,
            aggregate: &aggregate,
            incomes: &fixture.incomes,
            parents_senior_citizen: true,
        };
        let deductions = TaxDeductions::new()
            .with_claim(Section::Sec80C, dec!(100000))
            .with_claim(Section::Sec80CCC, dec!(20000));
        assert_eq!(deductions.headroom(Section::Sec80C, &ctx).amount(), dec!(30000));
        assert_eq!(deductions.headroom(Section::Sec80DParents, &ctx).amount(), dec!(50000));
        assert!(deductions.headroom(Section::Sec80TTB, &ctx).is_zero());
    }
}
