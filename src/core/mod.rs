pub mod error;
pub mod regime;
pub mod request;
pub mod warnings;
pub mod year;

// Flat public surface for domain types and functions.
pub use error::{FieldError, TaxError, TaxResult, ValidationError, Validator, MAX_AMOUNT};
pub use regime::{RegimeSelection, TaxRegime};
pub use request::{read_request_json, TaxCalculationRequest, TaxProfile};
pub use warnings::Warning;
pub use year::{AgeCategory, FinancialYear};
