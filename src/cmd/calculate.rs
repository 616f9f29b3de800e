//! Calculate command - tax liability for one request

use crate::cmd::{print_table, RequestArgs};
use clap::Args;
use serde::Serialize;
use std::io;
use tabled::Tabled;
use taxregime::money::display_rate;
use taxregime::{evaluate, Money, TaxCalculationResult, TaxOutcome};

#[derive(Args, Debug)]
pub struct CalculateCommand {
    #[command(flatten)]
    request: RequestArgs,

    /// Show each head's computation line by line
    #[arg(short, long)]
    detailed: bool,

    /// Output as JSON
    #[arg(long, conflicts_with = "csv")]
    json: bool,

    /// Output breakdown rows as CSV
    #[arg(long)]
    csv: bool,
}

impl CalculateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let (request, config) = self.request.load()?;
        let outcome = evaluate(&request, &config)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else if self.csv {
            let results = match &outcome.comparison {
                Some(comparison) => vec![&comparison.old, &comparison.new],
                None => vec![&outcome.result],
            };
            write_csv(&results)?;
        } else {
            self.print_outcome(&outcome);
        }
        Ok(())
    }

    fn print_outcome(&self, outcome: &TaxOutcome) {
        match &outcome.comparison {
            Some(comparison) => crate::cmd::compare::print_comparison(comparison),
            None => print_result(&outcome.result, self.detailed),
        }
        if let Some(optimization) = &outcome.optimization {
            crate::cmd::optimize::print_optimization(optimization);
        }
    }
}

#[derive(Tabled)]
struct HeadRow {
    #[tabled(rename = "Head")]
    head: String,
    #[tabled(rename = "Gross")]
    gross: String,
    #[tabled(rename = "Net")]
    net: String,
}

#[derive(Tabled)]
struct LineRow {
    #[tabled(rename = "Item")]
    item: String,
    #[tabled(rename = "Amount")]
    amount: String,
}

#[derive(Tabled)]
struct DeductionRow {
    #[tabled(rename = "Section")]
    section: String,
    #[tabled(rename = "Claimed")]
    claimed: String,
    #[tabled(rename = "Allowed")]
    allowed: String,
}

fn line(item: impl Into<String>, amount: Money) -> LineRow {
    LineRow {
        item: item.into(),
        amount: amount.to_string(),
    }
}

pub(crate) fn print_result(result: &TaxCalculationResult, detailed: bool) {
    println!();
    println!(
        "TAX CALCULATION ({}, {}, {} regime, {})",
        result.employee_id, result.tax_year, result.regime, result.age_category
    );
    println!();

    if result.heads.is_empty() {
        println!("No income declared");
    } else {
        let rows: Vec<HeadRow> = result
            .heads
            .iter()
            .map(|h| HeadRow {
                head: h.head.display().to_string(),
                gross: h.gross.to_string(),
                net: h.net.to_string(),
            })
            .collect();
        print_table(rows);
    }

    if detailed {
        for head in &result.heads {
            if head.breakdown.lines.is_empty() {
                continue;
            }
            println!();
            println!("{}", head.head.display());
            print_table(
                head.breakdown
                    .lines
                    .iter()
                    .map(|l| line(l.label.clone(), l.amount))
                    .collect(),
            );
        }
    }

    let deductions = &result.deductions;
    let mut rows = vec![DeductionRow {
        section: "Standard deduction".to_string(),
        claimed: "-".to_string(),
        allowed: deductions.standard_deduction.to_string(),
    }];
    rows.extend(deductions.sections.iter().map(|d| DeductionRow {
        section: d.section.code().to_string(),
        claimed: d.claimed.to_string(),
        allowed: d.allowed.to_string(),
    }));
    println!();
    print_table(rows);

    let liability = &result.liability;
    let mut rows = vec![
        line("Gross total income", result.gross_total_income),
        line("Total deductions", result.total_deductions),
        line("Taxable income", result.taxable_income),
        line("Tax before rebate", liability.tax_before_rebate),
        line("Rebate", liability.rebate),
    ];
    for flat in &liability.flat_rate_tax {
        rows.push(line(
            format!("{} @ {}", flat.label, display_rate(flat.rate)),
            flat.tax,
        ));
    }
    rows.push(line(
        format!("Surcharge @ {}", display_rate(liability.surcharge_rate)),
        liability.surcharge,
    ));
    if liability.marginal_relief.is_positive() {
        rows.push(line("Marginal relief", liability.marginal_relief));
    }
    rows.push(line("Cess", liability.cess));
    rows.push(line("Total liability", liability.total_liability));
    rows.push(LineRow {
        item: "Effective rate".to_string(),
        amount: display_rate(result.effective_rate),
    });
    println!();
    print_table(rows);

    if !result.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &result.warnings {
            println!("  - {}", warning);
        }
    }
}

/// One figure of a calculation, flattened for CSV output.
#[derive(Debug, Serialize)]
struct BreakdownRecord {
    employee_id: String,
    tax_year: String,
    regime: String,
    section: &'static str,
    item: String,
    amount: String,
}

pub(crate) fn write_csv(results: &[&TaxCalculationResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(io::stdout());
    for result in results {
        for record in breakdown_records(result) {
            wtr.serialize(record)?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn breakdown_records(result: &TaxCalculationResult) -> Vec<BreakdownRecord> {
    let record = |section: &'static str, item: String, amount: Money| BreakdownRecord {
        employee_id: result.employee_id.clone(),
        tax_year: result.tax_year.to_string(),
        regime: result.regime.to_string(),
        section,
        item,
        amount: amount.amount().to_string(),
    };

    let mut records = Vec::new();
    for head in &result.heads {
        for l in &head.breakdown.lines {
            records.push(record("income", format!("{}: {}", head.head.display(), l.label), l.amount));
        }
        records.push(record("income", format!("{} net", head.head.display()), head.net));
    }
    records.push(record(
        "deduction",
        "Standard deduction".to_string(),
        result.deductions.standard_deduction,
    ));
    for d in &result.deductions.sections {
        records.push(record("deduction", d.section.code().to_string(), d.allowed));
    }

    let liability = &result.liability;
    for (item, amount) in [
        ("Gross total income", result.gross_total_income),
        ("Taxable income", result.taxable_income),
        ("Tax before rebate", liability.tax_before_rebate),
        ("Rebate", liability.rebate),
        ("Surcharge", liability.surcharge),
        ("Marginal relief", liability.marginal_relief),
        ("Cess", liability.cess),
        ("Total liability", liability.total_liability),
    ] {
        records.push(record("tax", item.to_string(), amount));
    }
    for flat in &liability.flat_rate_tax {
        records.push(record("flat_rate", flat.label.clone(), flat.tax));
    }
    records
}
