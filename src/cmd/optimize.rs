//! Optimize command - unused deduction headroom under the OLD regime

use crate::cmd::{print_table, RequestArgs};
use clap::Args;
use tabled::Tabled;
use taxregime::{OptimizationResult, TaxCalculator, TaxOptimizationService};

#[derive(Args, Debug)]
pub struct OptimizeCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl OptimizeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (request, config) = self.request.load()?;
        let profile = request.validate()?;
        let result = TaxOptimizationService::new(TaxCalculator::new(&config)).optimize(&profile)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_optimization(&result);
        }
        Ok(())
    }
}

#[derive(Tabled)]
struct SuggestionRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Additional Claim")]
    additional_claim: String,
    #[tabled(rename = "Tax Saving")]
    tax_saving: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub(crate) fn print_optimization(result: &OptimizationResult) {
    println!();
    println!("DEDUCTION SUGGESTIONS (OLD regime)");
    println!();

    if result.suggestions.is_empty() {
        println!("No further deduction would reduce the OLD regime liability");
    } else {
        let rows: Vec<SuggestionRow> = result
            .suggestions
            .iter()
            .map(|s| SuggestionRow {
                section: s.section.code().to_string(),
                additional_claim: s.additional_claim.to_string(),
                tax_saving: s.tax_saving.to_string(),
                description: s.section.description().to_string(),
            })
            .collect();
        print_table(rows);
    }

    println!();
    println!("  Current OLD liability:    {}", result.current_liability);
    println!("  Optimized OLD liability:  {}", result.optimized_liability);
    println!("  NEW regime liability:     {}", result.new_regime_liability);
    println!("  Recommended after optimizing: {} regime", result.recommended);
}
