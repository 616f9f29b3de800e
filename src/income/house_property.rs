use super::{Breakdown, HeadContext, HeadKind, IncomeHead};
use crate::core::{Validator, Warning};
use crate::money::Money;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Occupancy {
    #[default]
    SelfOccupied,
    LetOut,
}

/// A single house property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HouseProperty {
    pub name: String,
    pub occupancy: Occupancy,
    /// Gross annual rent receivable
    #[schemars(with = "f64")]
    pub annual_rent: Decimal,
    /// Municipal taxes paid during the year
    #[schemars(with = "f64")]
    pub municipal_taxes: Decimal,
    /// Interest on borrowed capital for the year
    #[schemars(with = "f64")]
    pub home_loan_interest: Decimal,
    /// Total interest paid before construction was completed
    #[schemars(with = "f64")]
    pub pre_construction_interest: Decimal,
    /// Which installment of the pre-construction interest falls in this
    /// year, starting at 1; 0 when none
    pub pre_construction_installment: u32,
}

impl HouseProperty {
    fn label(&self) -> &str {
        if self.name.is_empty() {
            "property"
        } else {
            &self.name
        }
    }

    /// Rent less municipal taxes, forced to zero when self-occupied.
    pub fn net_annual_value(&self, ctx: &HeadContext) -> Money {
        match self.occupancy {
            Occupancy::SelfOccupied => ctx.zero(),
            Occupancy::LetOut => ctx
                .money(self.annual_rent)
                .subtract(ctx.money(self.municipal_taxes)),
        }
    }

    /// This year's share of the pre-construction interest.
    pub fn pre_construction_share(&self, ctx: &HeadContext) -> Money {
        let installments = ctx.config.house_property.pre_construction_installments;
        if (1..=installments).contains(&self.pre_construction_installment) {
            ctx.money(self.pre_construction_interest).divide(installments)
        } else {
            ctx.zero()
        }
    }

    /// Signed income from the property, before any clamp.
    pub fn income(&self, ctx: &HeadContext) -> Money {
        self.get_breakdown(ctx).net
    }

    /// Deficit of the property, zero when it shows income.
    pub fn get_loss(&self, ctx: &HeadContext) -> Money {
        let income = self.income(ctx);
        income.zeroed().difference(income).floor_zero()
    }

    /// Computation of the property with `interest_cap` left of the
    /// self-occupied interest cap. Returns the interest allowed.
    fn breakdown(&self, ctx: &HeadContext, interest_cap: Money) -> (Breakdown, Money) {
        let rules = &ctx.config.house_property;
        let gross = match self.occupancy {
            Occupancy::SelfOccupied => ctx.zero(),
            Occupancy::LetOut => ctx.money(self.annual_rent),
        };
        let mut b = Breakdown::new(HeadKind::HouseProperty, gross);
        b.line(format!("{}: annual value", self.label()), gross);

        let nav = self.net_annual_value(ctx);
        b.line(format!("{}: net annual value", self.label()), nav);

        let standard = nav.percentage(rules.standard_deduction_rate);
        b.line(format!("{}: standard deduction", self.label()), standard);

        let claimed = ctx
            .money(self.home_loan_interest)
            .add(self.pre_construction_share(ctx));
        let interest = match self.occupancy {
            Occupancy::SelfOccupied => {
                let capped = claimed.min(interest_cap);
                if capped < claimed {
                    b.warnings.push(Warning::HomeLoanInterestCapped {
                        property: self.label().to_string(),
                        claimed: claimed.amount(),
                        allowed: capped.amount(),
                    });
                }
                capped
            }
            Occupancy::LetOut => claimed,
        };
        b.line(format!("{}: interest on borrowed capital", self.label()), interest);

        b.net = nav.subtract(standard).difference(interest);
        (b, interest)
    }
}

impl IncomeHead for HouseProperty {
    fn kind(&self) -> HeadKind {
        HeadKind::HouseProperty
    }

    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let cap = ctx.money(ctx.config.house_property.self_occupied_interest_cap);
        self.breakdown(ctx, cap).0
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        v.amounts(
            scope,
            &[
                ("annual_rent", self.annual_rent),
                ("municipal_taxes", self.municipal_taxes),
                ("home_loan_interest", self.home_loan_interest),
                ("pre_construction_interest", self.pre_construction_interest),
            ],
        );
        if self.pre_construction_interest > Decimal::ZERO && self.pre_construction_installment == 0 {
            v.reject(
                format!("{scope}.pre_construction_installment"),
                "required when pre-construction interest is declared",
            );
        }
    }
}

/// All house properties of the taxpayer, netted against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct HousePropertyIncome {
    pub properties: Vec<HouseProperty>,
}

impl HousePropertyIncome {
    /// Unclamped sum over all properties.
    pub fn income(&self, ctx: &HeadContext) -> Money {
        self.get_breakdown(ctx).net
    }

    /// Aggregate deficit across properties, zero when they net to income.
    pub fn get_loss(&self, ctx: &HeadContext) -> Money {
        let income = self.income(ctx);
        income.zeroed().difference(income).floor_zero()
    }
}

impl IncomeHead for HousePropertyIncome {
    fn kind(&self) -> HeadKind {
        HeadKind::HouseProperty
    }

    /// The self-occupied interest cap is shared by all self-occupied
    /// properties, in the order they are declared.
    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let mut interest_cap = ctx.money(ctx.config.house_property.self_occupied_interest_cap);
        let parts: Vec<Breakdown> = self
            .properties
            .iter()
            .map(|p| {
                let (part, interest) = p.breakdown(ctx, interest_cap);
                if p.occupancy == Occupancy::SelfOccupied {
                    interest_cap = interest_cap.subtract(interest);
                }
                part
            })
            .collect();
        let gross = Money::sum(ctx.config.currency, parts.iter().map(|p| p.gross));
        let mut b = Breakdown::new(HeadKind::HouseProperty, gross);
        let mut net = ctx.zero();
        for part in parts {
            net = net.add(part.net);
            b.lines.extend(part.lines);
            b.warnings.extend(part.warnings);
        }
        b.net = net;
        b
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        for (i, property) in self.properties.iter().enumerate() {
            property.validate(&format!("{scope}[{i}]"), v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AgeCategory, TaxRegime};
    use crate::tax::config::TaxYearConfig;
    use rust_decimal_macros::dec;

    fn let_out() -> HouseProperty {
        HouseProperty {
            name: "Rented flat".to_string(),
            occupancy: Occupancy::LetOut,
            annual_rent: dec!(360000),
            municipal_taxes: dec!(10000),
            home_loan_interest: dec!(300000),
            ..HouseProperty::default()
        }
    }

    #[test]
    fn let_out_interest_is_uncapped() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        // NAV 350,000, standard 105,000, interest 300,000
        assert_eq!(let_out().income(&ctx).amount(), dec!(-55000));
        assert!(let_out().compute_net_income(&ctx).is_zero());
        assert_eq!(let_out().get_loss(&ctx).amount(), dec!(55000));
    }

    #[test]
    fn self_occupied_ignores_rent_and_caps_interest() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let home = HouseProperty {
            occupancy: Occupancy::SelfOccupied,
            ..let_out()
        };
        let b = home.get_breakdown(&ctx);
        assert!(b.get("Rented flat: net annual value").unwrap().is_zero());
        assert_eq!(b.net.amount(), dec!(-200000));
        assert_eq!(b.warnings.len(), 1);
    }

    #[test]
    fn pre_construction_interest_amortised_over_five_years() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let property = HouseProperty {
            occupancy: Occupancy::LetOut,
            annual_rent: dec!(500000),
            pre_construction_interest: dec!(250000),
            pre_construction_installment: 2,
            ..HouseProperty::default()
        };
        assert_eq!(property.pre_construction_share(&ctx).amount(), dec!(50000));
        // 500,000 - 150,000 - 50,000
        assert_eq!(property.income(&ctx).amount(), dec!(300000));

        let finished = HouseProperty {
            pre_construction_installment: 6,
            ..property
        };
        assert!(finished.pre_construction_share(&ctx).is_zero());
    }

    #[test]
    fn same_result_under_either_regime() {
        let config = TaxYearConfig::fy_2024_25();
        let old = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let new = HeadContext::new(&config, TaxRegime::New, AgeCategory::General);
        let income = HousePropertyIncome {
            properties: vec![let_out()],
        };
        assert_eq!(income.get_breakdown(&old), income.get_breakdown(&new));
    }

    #[test]
    fn multi_property_nets_before_clamp() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let profitable = HouseProperty {
            name: "Shop".to_string(),
            occupancy: Occupancy::LetOut,
            annual_rent: dec!(100000),
            ..HouseProperty::default()
        };
        let income = HousePropertyIncome {
            properties: vec![let_out(), profitable],
        };
        // -55,000 + 70,000
        assert_eq!(income.income(&ctx).amount(), dec!(15000));
        assert!(income.get_loss(&ctx).is_zero());
    }

    #[test]
    fn interest_cap_is_shared_by_self_occupied_properties() {
        let config = TaxYearConfig::fy_2024_25();
        let ctx = HeadContext::new(&config, TaxRegime::Old, AgeCategory::General);
        let home = |name: &str, interest| HouseProperty {
            name: name.to_string(),
            occupancy: Occupancy::SelfOccupied,
            home_loan_interest: interest,
            ..HouseProperty::default()
        };
        let shop = HouseProperty {
            name: "Shop".to_string(),
            occupancy: Occupancy::LetOut,
            annual_rent: dec!(100000),
            ..HouseProperty::default()
        };
        let income = HousePropertyIncome {
            properties: vec![home("City flat", dec!(150000)), shop, home("Hill cottage", dec!(300000))],
        };

        let b = income.get_breakdown(&ctx);
        assert_eq!(
            b.get("City flat: interest on borrowed capital").unwrap().amount(),
            dec!(150000)
        );
        assert_eq!(
            b.get("Hill cottage: interest on borrowed capital").unwrap().amount(),
            dec!(50000)
        );
        // 70,000 from the shop less 200,000 of shared interest
        assert_eq!(b.net.amount(), dec!(-130000));
        assert_eq!(
            b.warnings,
            vec![Warning::HomeLoanInterestCapped {
                property: "Hill cottage".to_string(),
                claimed: dec!(300000),
                allowed: dec!(50000),
            }]
        );
    }

    #[test]
    fn installment_required_with_pre_construction_interest() {
        let mut v = Validator::new();
        HousePropertyIncome {
            properties: vec![HouseProperty {
                pre_construction_interest: dec!(100),
                municipal_taxes: dec!(-1),
                ..HouseProperty::default()
            }],
        }
        .validate("income.house_property", &mut v);
        let err = v.finish().unwrap_err();
        assert!(err.contains("income.house_property[0].pre_construction_installment"));
        assert!(err.contains("income.house_property[0].municipal_taxes"));
    }
}
