use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Business-rule clamps recorded on a calculation so nothing is dropped
/// silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Claim exceeded the section cap and was reduced to it.
    DeductionClamped {
        section: String,
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        allowed: Decimal,
    },
    /// Claim not available to this taxpayer, allowed as zero.
    DeductionIneligible {
        section: String,
        #[schemars(with = "f64")]
        claimed: Decimal,
        reason: String,
    },
    /// Section not available under the selected regime.
    DeductionNotInRegime {
        section: String,
        regime: String,
        #[schemars(with = "f64")]
        claimed: Decimal,
    },
    /// Chapter VI-A deductions limited to gross income taxable at slab rates.
    DeductionsExceedIncome {
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        allowed: Decimal,
    },
    /// Standard deduction limited to salary actually received.
    StandardDeductionLimited {
        #[schemars(with = "f64")]
        available: Decimal,
        #[schemars(with = "f64")]
        allowed: Decimal,
    },
    /// Home loan interest above the self-occupied cap.
    HomeLoanInterestCapped {
        property: String,
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        allowed: Decimal,
    },
    /// House property loss that could not be set off against other heads.
    HousePropertyLossLimited {
        #[schemars(with = "f64")]
        loss: Decimal,
        #[schemars(with = "f64")]
        set_off: Decimal,
    },
    /// Capital gains exemption larger than the bucket or its cap.
    ExemptionClamped {
        section: String,
        bucket: String,
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        allowed: Decimal,
    },
    /// Claimed salary exemption above what the statute allows.
    ExemptionLimited {
        exemption: String,
        #[schemars(with = "f64")]
        claimed: Decimal,
        #[schemars(with = "f64")]
        allowed: Decimal,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DeductionClamped {
                section,
                claimed,
                allowed,
            } => write!(f, "{section}: claimed {claimed} capped at {allowed}"),
            Warning::DeductionIneligible {
                section,
                claimed,
                reason,
            } => write!(f, "{section}: claim of {claimed} not allowed ({reason})"),
            Warning::DeductionNotInRegime {
                section,
                regime,
                claimed,
            } => write!(f, "{section}: claim of {claimed} not available under {regime} regime"),
            Warning::DeductionsExceedIncome { claimed, allowed } => write!(
                f,
                "deductions of {claimed} exceed slab-rate income, limited to {allowed}"
            ),
            Warning::StandardDeductionLimited { available, allowed } => write!(
                f,
                "standard deduction of {available} limited to salary income {allowed}"
            ),
            Warning::HomeLoanInterestCapped {
                property,
                claimed,
                allowed,
            } => write!(
                f,
                "{property}: home loan interest {claimed} capped at {allowed}"
            ),
            Warning::HousePropertyLossLimited { loss, set_off } => write!(
                f,
                "house property loss {loss}, only {set_off} set off against other income"
            ),
            Warning::ExemptionClamped {
                section,
                bucket,
                claimed,
                allowed,
            } => write!(
                f,
                "{section} exemption on {bucket}: claimed {claimed}, allowed {allowed}"
            ),
            Warning::ExemptionLimited {
                exemption,
                claimed,
                allowed,
            } => write!(f, "{exemption}: claimed {claimed}, allowed {allowed}"),
        }
    }
}
