use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Age category used to pick the OLD regime slab table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgeCategory {
    /// Below 60
    #[default]
    General,
    /// 60 to 79
    Senior,
    /// 80 and above
    SuperSenior,
}

impl AgeCategory {
    pub fn from_age(age: u32) -> Self {
        match age {
            80.. => AgeCategory::SuperSenior,
            60.. => AgeCategory::Senior,
            _ => AgeCategory::General,
        }
    }

    /// Senior and super-senior citizens.
    pub fn is_senior(&self) -> bool {
        matches!(self, AgeCategory::Senior | AgeCategory::SuperSenior)
    }

    pub fn display(&self) -> &'static str {
        match self {
            AgeCategory::General => "General",
            AgeCategory::Senior => "Senior",
            AgeCategory::SuperSenior => "Super senior",
        }
    }
}

impl fmt::Display for AgeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for AgeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "general" => Ok(AgeCategory::General),
            "senior" => Ok(AgeCategory::Senior),
            "supersenior" => Ok(AgeCategory::SuperSenior),
            other => Err(format!("unknown age category '{other}'")),
        }
    }
}

/// Financial year, running 1 April to 31 March.
/// The value is the starting calendar year (2024 = FY 2024-25).
/// Parsed years are limited to [`FinancialYear::MIN`]..=[`FinancialYear::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialYear(pub i32);

impl JsonSchema for FinancialYear {
    fn schema_name() -> String {
        "FinancialYear".to_string()
    }

    fn json_schema(gen: &mut schemars::gen::SchemaGenerator) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

impl FinancialYear {
    /// Range of years accepted from input.
    pub const MIN: i32 = 1900;
    pub const MAX: i32 = 9999;

    pub fn is_supported(&self) -> bool {
        (FinancialYear::MIN..=FinancialYear::MAX).contains(&self.0)
    }

    /// Financial year a date falls in.
    pub fn from_date(date: NaiveDate) -> Self {
        if date.month() >= 4 {
            FinancialYear(date.year())
        } else {
            FinancialYear(date.year() - 1)
        }
    }

    /// 1 April of the starting year, `None` outside the calendar chrono
    /// supports.
    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 4, 1)
    }

    /// 31 March of the following year
    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0.checked_add(1)?, 3, 31)
    }

    /// Display as "2024-25"
    pub fn display(&self) -> String {
        format!("{}-{:02}", self.0, (i64::from(self.0) + 1).rem_euclid(100))
    }

    /// Age attained by the last day of the year.
    ///
    /// A person attains an age on the day before the birthday, so someone
    /// born on 1 April has completed that year of age on 31 March.
    pub fn age_at_year_end(&self, date_of_birth: NaiveDate) -> Option<u32> {
        let reference = self.end_date()?.succ_opt()?;
        if date_of_birth > reference {
            return None;
        }
        let mut age = reference.year() - date_of_birth.year();
        if (reference.month(), reference.day()) < (date_of_birth.month(), date_of_birth.day()) {
            age -= 1;
        }
        u32::try_from(age).ok()
    }

    /// Age category for a date of birth, evaluated at the end of the year.
    pub fn age_category(&self, date_of_birth: NaiveDate) -> Option<AgeCategory> {
        self.age_at_year_end(date_of_birth).map(AgeCategory::from_age)
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl FromStr for FinancialYear {
    type Err = String;

    /// Accepts "2024-25", "2024-2025" or "2024".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (start, end) = match s.split_once('-') {
            Some((start, end)) => (start, Some(end)),
            None => (s, None),
        };
        let start: i32 = start
            .parse()
            .map_err(|_| format!("invalid financial year '{s}'"))?;
        if !FinancialYear(start).is_supported() {
            return Err(format!(
                "financial year '{s}' is outside {}..={}",
                FinancialYear::MIN,
                FinancialYear::MAX
            ));
        }
        if let Some(end) = end {
            let end: i32 = end
                .parse()
                .map_err(|_| format!("invalid financial year '{s}'"))?;
            let expected = match end {
                0..=99 => (start + 1) % 100,
                _ => start + 1,
            };
            if end != expected {
                return Err(format!("financial year '{s}' does not span consecutive years"));
            }
        }
        Ok(FinancialYear(start))
    }
}

impl TryFrom<String> for FinancialYear {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FinancialYear> for String {
    fn from(year: FinancialYear) -> Self {
        year.display()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn financial_year_from_date_before_april() {
        // 31 March 2025 is in 2024-25
        assert_eq!(FinancialYear::from_date(date(2025, 3, 31)), FinancialYear(2024));
    }

    #[test]
    fn financial_year_from_date_on_april_1() {
        assert_eq!(FinancialYear::from_date(date(2024, 4, 1)), FinancialYear(2024));
    }

    #[test]
    fn financial_year_display() {
        assert_eq!(FinancialYear(2024).display(), "2024-25");
        assert_eq!(FinancialYear(2099).display(), "2099-00");
    }

    #[test]
    fn financial_year_start_end_dates() {
        let fy = FinancialYear(2024);
        assert_eq!(fy.start_date(), Some(date(2024, 4, 1)));
        assert_eq!(fy.end_date(), Some(date(2025, 3, 31)));
    }

    #[test]
    fn out_of_range_years_are_rejected() {
        assert!("300000-01".parse::<FinancialYear>().is_err());
        assert!("1899-00".parse::<FinancialYear>().is_err());
        assert!("10000".parse::<FinancialYear>().is_err());
        assert_eq!("9999-00".parse::<FinancialYear>(), Ok(FinancialYear(9999)));
        assert!(serde_json::from_str::<FinancialYear>("\"2147483647\"").is_err());
    }

    #[test]
    fn extreme_years_do_not_panic() {
        let fy = FinancialYear(i32::MAX);
        assert_eq!(fy.end_date(), None);
        assert_eq!(fy.age_at_year_end(date(1960, 1, 1)), None);
        assert_eq!(fy.display(), "2147483647-48");
        assert_eq!(FinancialYear(300000).age_category(date(1960, 1, 1)), None);
    }

    #[test]
    fn financial_year_parse() {
        assert_eq!("2024-25".parse::<FinancialYear>(), Ok(FinancialYear(2024)));
        assert_eq!("2024-2025".parse::<FinancialYear>(), Ok(FinancialYear(2024)));
        assert_eq!("2025".parse::<FinancialYear>(), Ok(FinancialYear(2025)));
        assert!("2024-26".parse::<FinancialYear>().is_err());
        assert!("twenty".parse::<FinancialYear>().is_err());
    }

    #[test]
    fn financial_year_serde_as_string() {
        let json = serde_json::to_string(&FinancialYear(2025)).unwrap();
        assert_eq!(json, "\"2025-26\"");
        let parsed: FinancialYear = serde_json::from_str("\"2024-25\"").unwrap();
        assert_eq!(parsed, FinancialYear(2024));
    }

    #[test]
    fn age_category_boundaries() {
        assert_eq!(AgeCategory::from_age(59), AgeCategory::General);
        assert_eq!(AgeCategory::from_age(60), AgeCategory::Senior);
        assert_eq!(AgeCategory::from_age(79), AgeCategory::Senior);
        assert_eq!(AgeCategory::from_age(80), AgeCategory::SuperSenior);
    }

    #[test]
    fn birthday_on_april_first_counts_for_year_just_ended() {
        let fy = FinancialYear(2024);
        // turns 60 on 1 April 2025, attained on 31 March 2025
        assert_eq!(fy.age_category(date(1965, 4, 1)), Some(AgeCategory::Senior));
        // turns 60 on 2 April 2025
        assert_eq!(fy.age_category(date(1965, 4, 2)), Some(AgeCategory::General));
    }

    #[test]
    fn super_senior_from_date_of_birth() {
        let fy = FinancialYear(2024);
        assert_eq!(fy.age_category(date(1944, 12, 1)), Some(AgeCategory::SuperSenior));
    }

    #[test]
    fn unborn_has_no_age() {
        assert_eq!(FinancialYear(2024).age_at_year_end(date(2030, 1, 1)), None);
    }

    #[test]
    fn age_category_from_str() {
        assert_eq!("general".parse::<AgeCategory>(), Ok(AgeCategory::General));
        assert_eq!("SUPER_SENIOR".parse::<AgeCategory>(), Ok(AgeCategory::SuperSenior));
        assert_eq!("super-senior".parse::<AgeCategory>(), Ok(AgeCategory::SuperSenior));
        assert!("child".parse::<AgeCategory>().is_err());
    }
}
