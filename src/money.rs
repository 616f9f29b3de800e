use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rates expressed as fractions (0.30 = 30%), never as percentages.
pub type Rate = Decimal;

/// Number of decimal places every monetary amount is stored with.
pub const MONEY_DP: u32 = 2;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize, JsonSchema,
)]
pub enum Currency {
    #[default]
    INR,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "\u{20B9}",
        }
    }
}

/// Immutable fixed-point monetary value.
///
/// Every constructor and every operation rounds its result to two decimal
/// places with round-half-up (midpoints move away from zero), so two values
/// that compare equal are equal to the paisa. Ordering compares the amount
/// first; amounts of different currencies are never mixed by the engine.
///
/// Amounts are normally non-negative. [`Money::difference`] is the single
/// operation that can produce a negative value, used where a loss has to be
/// carried to a later set-off step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct Money {
    #[schemars(with = "String")]
    amount: Decimal,
    #[serde(default)]
    currency: Currency,
}

fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Money {
            amount: round(amount),
            currency,
        }
    }

    pub fn inr(amount: Decimal) -> Self {
        Money::new(amount, Currency::INR)
    }

    pub fn zero(currency: Currency) -> Self {
        Money {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    /// A zero of the same currency.
    pub fn zeroed(&self) -> Self {
        Money::zero(self.currency)
    }

    pub fn add(self, other: Money) -> Money {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch");
        Money::new(self.amount + other.amount, self.currency)
    }

    /// Subtraction floored at zero.
    pub fn subtract(self, other: Money) -> Money {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch");
        Money::new((self.amount - other.amount).max(Decimal::ZERO), self.currency)
    }

    /// Signed subtraction, the result may be negative.
    pub fn difference(self, other: Money) -> Money {
        debug_assert_eq!(self.currency, other.currency, "currency mismatch");
        Money::new(self.amount - other.amount, self.currency)
    }

    /// `self * rate`, where `rate` is a fraction.
    pub fn percentage(self, rate: Rate) -> Money {
        Money::new(self.amount * rate, self.currency)
    }

    /// Multiply by a plain scalar (months, counts).
    pub fn times(self, factor: Decimal) -> Money {
        Money::new(self.amount * factor, self.currency)
    }

    /// Divide into `n` equal parts. Dividing by zero yields zero.
    pub fn divide(self, n: u32) -> Money {
        if n == 0 {
            return self.zeroed();
        }
        Money::new(self.amount / Decimal::from(n), self.currency)
    }

    pub fn min(self, other: Money) -> Money {
        if other.amount < self.amount {
            other
        } else {
            self
        }
    }

    pub fn max(self, other: Money) -> Money {
        if other.amount > self.amount {
            other
        } else {
            self
        }
    }

    /// Negative values become zero.
    pub fn floor_zero(self) -> Money {
        self.max(self.zeroed())
    }

    /// `self / whole` as a fraction rounded to four places, zero when `whole`
    /// is zero.
    pub fn ratio_of(self, whole: Money) -> Rate {
        if whole.amount.is_zero() {
            return Decimal::ZERO;
        }
        (self.amount / whole.amount).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn sum<I>(currency: Currency, items: I) -> Money
    where
        I: IntoIterator<Item = Money>,
    {
        items
            .into_iter()
            .fold(Money::zero(currency), |acc, m| acc.add(m))
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::add(self, rhs)
    }
}

/// Display a rate as a percentage, e.g. `0.3` -> `30%`.
pub fn display_rate(rate: Rate) -> String {
    format!("{}%", (rate * dec!(100)).normalize())
}

/// Display an amount with Indian digit grouping, e.g. `₹12,34,567.50`.
pub fn display_amount(money: &Money) -> String {
    money.to_string()
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.amount.abs();
        let formatted = format!("{:.2}", abs);
        let (whole, frac) = formatted.split_once('.').unwrap_or((&formatted, "00"));

        // last three digits, then groups of two
        let mut groups: Vec<&str> = Vec::new();
        let (mut head, tail) = if whole.len() > 3 {
            whole.split_at(whole.len() - 3)
        } else {
            ("", whole)
        };
        while head.len() > 2 {
            let (rest, group) = head.split_at(head.len() - 2);
            groups.push(group);
            head = rest;
        }
        if !head.is_empty() {
            groups.push(head);
        }
        groups.reverse();
        groups.push(tail);

        let sign = if self.is_negative() { "-" } else { "" };
        write!(
            f,
            "{}{}{}.{}",
            sign,
            self.currency.symbol(),
            groups.join(","),
            frac
        )
    }
}
