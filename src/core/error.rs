use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::fmt;

/// Largest amount accepted for any monetary field. Sums of such amounts,
/// and their products with rates, stay well within `Decimal`.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// One offending input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub reason: String,
}

/// Every offending field of a request, collected before any computation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|e| e.field.as_str())
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} invalid field(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {}: {}", error.field, error.reason)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaxError {
    /// Malformed or out-of-range input, reported per field.
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    /// A statutory rule that cannot be satisfied by clamping.
    #[error("business rule '{rule}' violated: {detail}")]
    BusinessRule { rule: String, detail: String },
    /// Internal invariant violation, e.g. a malformed slab table.
    #[error("computation error: {0}")]
    Computation(String),
}

pub type TaxResult<T> = Result<T, TaxError>;

/// Accumulates field errors so that a request is rejected with all of them.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    pub fn reject(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            reason: reason.into(),
        });
    }

    /// A monetary amount: non-negative and at most [`MAX_AMOUNT`].
    pub fn amount(&mut self, field: impl Into<String>, value: Decimal) {
        if value.is_sign_negative() && !value.is_zero() {
            self.reject(field, format!("must not be negative (got {value})"));
        } else if value > MAX_AMOUNT {
            self.reject(field, format!("must not exceed {MAX_AMOUNT} (got {value})"));
        }
    }

    /// A rate expressed as a fraction, within [0, 1].
    pub fn rate(&mut self, field: impl Into<String>, value: Decimal) {
        if (value.is_sign_negative() && !value.is_zero()) || value > Decimal::ONE {
            self.reject(field, format!("must be within 0 and 1 (got {value})"));
        }
    }

    /// Checks every `(field, value)` pair, prefixing field names with `scope`.
    pub fn amounts(&mut self, scope: &str, values: &[(&str, Decimal)]) {
        for (field, value) in values {
            self.amount(format!("{scope}.{field}"), *value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}
