pub mod calculator;
pub mod comparison;
pub mod config;
pub mod deductions;
pub mod optimization;
pub mod slabs;

pub use calculator::{FlatRateTax, TaxCalculationResult, TaxCalculator, TaxLiability};
pub use comparison::{ComparisonResult, RegimeComparisonService, SavingsItem};
pub use config::TaxYearConfig;
pub use deductions::{AppliedDeduction, DeductionOutcome, Section, TaxDeductions};
pub use optimization::{OptimizationResult, Suggestion, TaxOptimizationService};
pub use slabs::{Slab, SlabLine, SlabTable};
