use super::{Breakdown, FlatRateIncome, HeadContext, HeadKind, IncomeHead};
use crate::core::{Validator, Warning};
use crate::money::{Money, Rate};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mutually exclusive statutory buckets a gain falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GainBucket {
    /// Short-term, listed equity with STT paid (111A)
    StcgEquity,
    /// Short-term, taxed at slab rates
    StcgOther,
    /// Long-term, listed equity with STT paid (112A)
    LtcgEquity,
    /// Long-term with indexation (112)
    LtcgIndexed,
    /// Long-term without indexation (112)
    LtcgNonIndexed,
}

impl GainBucket {
    pub const ALL: [GainBucket; 5] = [
        GainBucket::StcgEquity,
        GainBucket::StcgOther,
        GainBucket::LtcgEquity,
        GainBucket::LtcgIndexed,
        GainBucket::LtcgNonIndexed,
    ];

    pub fn display(&self) -> &'static str {
        match self {
            GainBucket::StcgEquity => "STCG 111A",
            GainBucket::StcgOther => "STCG (slab)",
            GainBucket::LtcgEquity => "LTCG 112A",
            GainBucket::LtcgIndexed => "LTCG 112 (indexed)",
            GainBucket::LtcgNonIndexed => "LTCG 112",
        }
    }

    /// Reinvestment exemptions only reduce these buckets.
    pub fn accepts_exemptions(&self) -> bool {
        matches!(self, GainBucket::LtcgIndexed | GainBucket::LtcgNonIndexed)
    }

    /// Flat statutory rate, `None` for gains taxed at slab rates.
    pub fn flat_rate(&self, ctx: &HeadContext) -> Option<Rate> {
        let rules = &ctx.config.capital_gains;
        match self {
            GainBucket::StcgEquity => Some(rules.stcg_111a_rate),
            GainBucket::StcgOther => None,
            GainBucket::LtcgEquity => Some(rules.ltcg_112a_rate),
            GainBucket::LtcgIndexed => Some(rules.ltcg_indexed_rate),
            GainBucket::LtcgNonIndexed => Some(rules.ltcg_non_indexed_rate),
        }
    }
}

impl fmt::Display for GainBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ExemptionSection {
    #[serde(rename = "54")]
    Sec54,
    #[serde(rename = "54B")]
    Sec54B,
    #[serde(rename = "54EC")]
    Sec54EC,
    #[serde(rename = "54F")]
    Sec54F,
}

impl ExemptionSection {
    pub fn code(&self) -> &'static str {
        match self {
            ExemptionSection::Sec54 => "54",
            ExemptionSection::Sec54B => "54B",
            ExemptionSection::Sec54EC => "54EC",
            ExemptionSection::Sec54F => "54F",
        }
    }
}

/// Reinvestment exemption claimed against one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CapitalGainExemption {
    pub section: ExemptionSection,
    pub bucket: GainBucket,
    #[schemars(with = "f64")]
    pub amount: Decimal,
}

/// Gains of the year, already split by bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CapitalGainsIncome {
    #[schemars(with = "f64")]
    pub stcg_equity: Decimal,
    #[schemars(with = "f64")]
    pub stcg_other: Decimal,
    #[schemars(with = "f64")]
    pub ltcg_equity: Decimal,
    #[schemars(with = "f64")]
    pub ltcg_indexed: Decimal,
    #[schemars(with = "f64")]
    pub ltcg_non_indexed: Decimal,
    pub exemptions: Vec<CapitalGainExemption>,
}

/// Result of one bucket after exemptions.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BucketGain {
    bucket: GainBucket,
    gain: Money,
    exempt: Money,
}

impl BucketGain {
    fn taxable(&self) -> Money {
        self.gain.subtract(self.exempt)
    }
}

impl CapitalGainsIncome {
    pub fn gain(&self, bucket: GainBucket) -> Decimal {
        match bucket {
            GainBucket::StcgEquity => self.stcg_equity,
            GainBucket::StcgOther => self.stcg_other,
            GainBucket::LtcgEquity => self.ltcg_equity,
            GainBucket::LtcgIndexed => self.ltcg_indexed,
            GainBucket::LtcgNonIndexed => self.ltcg_non_indexed,
        }
    }

    fn buckets(&self, ctx: &HeadContext, warnings: &mut Vec<Warning>) -> Vec<BucketGain> {
        let rules = &ctx.config.capital_gains;
        GainBucket::ALL
            .iter()
            .map(|&bucket| {
                let gain = ctx.money(self.gain(bucket));
                let exempt = match bucket {
                    GainBucket::LtcgEquity => gain.min(ctx.money(rules.ltcg_112a_exemption)),
                    b if b.accepts_exemptions() => {
                        self.reinvestment_exemption(ctx, bucket, gain, warnings)
                    }
                    _ => ctx.zero(),
                };
                BucketGain {
                    bucket,
                    gain,
                    exempt,
                }
            })
            .collect()
    }

    /// Claims against one bucket, 54EC held to its cap first, then the total
    /// held to the bucket's gain.
    fn reinvestment_exemption(
        &self,
        ctx: &HeadContext,
        bucket: GainBucket,
        gain: Money,
        warnings: &mut Vec<Warning>,
    ) -> Money {
        let mut remaining = gain;
        let mut total = ctx.zero();
        for claim in self.exemptions.iter().filter(|e| e.bucket == bucket) {
            let claimed = ctx.money(claim.amount);
            let mut allowed = claimed;
            if claim.section == ExemptionSection::Sec54EC {
                allowed = allowed.min(ctx.money(ctx.config.capital_gains.sec_54ec_cap));
            }
            allowed = allowed.min(remaining);
            if allowed < claimed {
                log::warn!(
                    "section {} exemption on {} clamped from {} to {}",
                    claim.section.code(),
                    bucket,
                    claimed,
                    allowed
                );
                warnings.push(Warning::ExemptionClamped {
                    section: claim.section.code().to_string(),
                    bucket: bucket.display().to_string(),
                    claimed: claimed.amount(),
                    allowed: allowed.amount(),
                });
            }
            remaining = remaining.subtract(allowed);
            total = total.add(allowed);
        }
        total
    }
}

impl IncomeHead for CapitalGainsIncome {
    fn kind(&self) -> HeadKind {
        HeadKind::CapitalGains
    }

    fn get_breakdown(&self, ctx: &HeadContext) -> Breakdown {
        let mut warnings = Vec::new();
        let buckets = self.buckets(ctx, &mut warnings);
        let gross = Money::sum(ctx.config.currency, buckets.iter().map(|b| b.gain));

        let mut b = Breakdown::new(HeadKind::CapitalGains, gross);
        for bucket in &buckets {
            if bucket.gain.is_zero() {
                continue;
            }
            b.line(bucket.bucket.display(), bucket.gain);
            if !bucket.exempt.is_zero() {
                b.line(format!("{} exemption", bucket.bucket.display()), bucket.exempt);
            }
        }
        b.net = Money::sum(ctx.config.currency, buckets.iter().map(BucketGain::taxable));
        b.warnings = warnings;
        b
    }

    fn flat_rate_income(&self, ctx: &HeadContext) -> Vec<FlatRateIncome> {
        let mut ignored = Vec::new();
        self.buckets(ctx, &mut ignored)
            .into_iter()
            .filter_map(|b| {
                let rate = b.bucket.flat_rate(ctx)?;
                let amount = b.taxable();
                (!amount.is_zero()).then(|| FlatRateIncome {
                    label: b.bucket.display().to_string(),
                    amount,
                    rate,
                    capital_gain: true,
                })
            })
            .collect()
    }

    fn validate(&self, scope: &str, v: &mut Validator) {
        v.amounts(
            scope,
            &[
                ("stcg_equity", self.stcg_equity),
                ("stcg_other", self.stcg_other),
                ("ltcg_equity", self.ltcg_equity),
                ("ltcg_indexed", self.ltcg_indexed),
                ("ltcg_non_indexed", self.ltcg_non_indexed),
            ],
        );
        for (i, exemption) in self.exemptions.iter().enumerate() {
            let field = format!("{scope}.exemptions[{i}]");
            v.amount(format!("{field}.amount"), exemption.amount);
            if !exemption.bucket.accepts_exemptions() {
                v.reject(
                    format!("{field}.bucket"),
                    format!(
                        "section {} cannot reduce {}",
                        exemption.section.code(),
                        exemption.bucket
                    ),
                );
            }
        }
    }
}
