//! Config command - print the built-in statutory config for a year

use clap::Args;
use taxregime::{FinancialYear, TaxYearConfig};

#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Financial year (e.g., 2024-25); lists the available years when omitted
    #[arg(short, long)]
    year: Option<FinancialYear>,
}

impl ConfigCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let Some(year) = self.year else {
            for year in TaxYearConfig::builtin_years() {
                println!("{}", year);
            }
            return Ok(());
        };
        let config = TaxYearConfig::builtin(year)?;
        println!("{}", serde_json::to_string_pretty(&config)?);
        Ok(())
    }
}
