use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two mutually exclusive rule-sets tax can be computed under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxRegime {
    Old,
    New,
}

impl TaxRegime {
    pub const ALL: [TaxRegime; 2] = [TaxRegime::Old, TaxRegime::New];

    pub fn other(&self) -> TaxRegime {
        match self {
            TaxRegime::Old => TaxRegime::New,
            TaxRegime::New => TaxRegime::Old,
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            TaxRegime::Old => "OLD",
            TaxRegime::New => "NEW",
        }
    }
}

impl fmt::Display for TaxRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for TaxRegime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "old" => Ok(TaxRegime::Old),
            "new" => Ok(TaxRegime::New),
            other => Err(format!("unknown regime '{other}'")),
        }
    }
}

/// Regime requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegimeSelection {
    Old,
    #[default]
    New,
    CompareBoth,
}

impl RegimeSelection {
    /// The single regime requested, `None` for a comparison.
    pub fn single(&self) -> Option<TaxRegime> {
        match self {
            RegimeSelection::Old => Some(TaxRegime::Old),
            RegimeSelection::New => Some(TaxRegime::New),
            RegimeSelection::CompareBoth => None,
        }
    }
}

impl From<TaxRegime> for RegimeSelection {
    fn from(regime: TaxRegime) -> Self {
        match regime {
            TaxRegime::Old => RegimeSelection::Old,
            TaxRegime::New => RegimeSelection::New,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_serde_uses_upper_case() {
        assert_eq!(serde_json::to_string(&TaxRegime::Old).unwrap(), "\"OLD\"");
        let sel: RegimeSelection = serde_json::from_str("\"COMPARE_BOTH\"").unwrap();
        assert_eq!(sel, RegimeSelection::CompareBoth);
        assert_eq!(sel.single(), None);
    }

    #[test]
    fn other_regime() {
        assert_eq!(TaxRegime::Old.other(), TaxRegime::New);
        assert_eq!(TaxRegime::New.other(), TaxRegime::Old);
    }

    #[test]
    fn regime_from_str() {
        assert_eq!("Old".parse::<TaxRegime>(), Ok(TaxRegime::Old));
        assert!("both".parse::<TaxRegime>().is_err());
    }
}
