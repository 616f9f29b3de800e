//! Compare command - OLD against NEW on the same income

use crate::cmd::{calculate, print_table, RequestArgs};
use clap::Args;
use tabled::Tabled;
use taxregime::money::display_rate;
use taxregime::{ComparisonResult, RegimeComparisonService, TaxCalculator};

#[derive(Args, Debug)]
pub struct CompareCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Also print both full calculations
    #[arg(short, long)]
    detailed: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

impl CompareCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (request, config) = self.request.load()?;
        // the request's own regime selection is irrelevant here
        let profile = request.validate()?;
        let comparison = RegimeComparisonService::new(TaxCalculator::new(&config)).compare(&profile)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
            return Ok(());
        }
        if self.detailed {
            calculate::print_result(&comparison.old, true);
            calculate::print_result(&comparison.new, true);
        }
        print_comparison(&comparison);
        Ok(())
    }
}

#[derive(Tabled)]
struct ComparisonRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Old Regime")]
    old: String,
    #[tabled(rename = "New Regime")]
    new: String,
    #[tabled(rename = "Tax Effect")]
    tax_effect: String,
}

pub(crate) fn print_comparison(comparison: &ComparisonResult) {
    let (old, new) = (&comparison.old, &comparison.new);
    println!();
    println!(
        "REGIME COMPARISON ({}, {}, {})",
        old.employee_id, old.tax_year, old.age_category
    );
    println!();

    let mut rows: Vec<ComparisonRow> = comparison
        .breakdown
        .iter()
        .map(|item| ComparisonRow {
            item: item.item.clone(),
            old: item.old_regime.to_string(),
            new: item.new_regime.to_string(),
            tax_effect: item
                .tax_effect
                .map_or_else(|| "-".to_string(), |m| m.to_string()),
        })
        .collect();
    let summary = [
        ("Taxable income", old.taxable_income, new.taxable_income),
        (
            "Tax after rebate",
            old.liability.tax_after_rebate(),
            new.liability.tax_after_rebate(),
        ),
        ("Surcharge", old.liability.surcharge, new.liability.surcharge),
        ("Cess", old.liability.cess, new.liability.cess),
        ("Total liability", old.total_liability(), new.total_liability()),
    ];
    rows.extend(summary.into_iter().map(|(item, o, n)| ComparisonRow {
        item: item.to_string(),
        old: o.to_string(),
        new: n.to_string(),
        tax_effect: "-".to_string(),
    }));
    rows.push(ComparisonRow {
        item: "Effective rate".to_string(),
        old: display_rate(old.effective_rate),
        new: display_rate(new.effective_rate),
        tax_effect: "-".to_string(),
    });
    print_table(rows);

    println!();
    println!(
        "Recommended: {} regime (saves {}, {} of the higher liability)",
        comparison.recommended,
        comparison.savings,
        display_rate(comparison.savings_rate)
    );
}
