//! Schema command - print the expected request format

use clap::Args;
use schemars::schema_for;
use taxregime::tax::Section;
use taxregime::TaxCalculationRequest;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// Output format: json-schema or sections
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the request
    JsonSchema,
    /// Deduction section codes accepted in `deductions`
    Sections,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => self.print_json_schema(),
            SchemaFormat::Sections => self.print_sections(),
        }
    }

    fn print_json_schema(&self) -> anyhow::Result<()> {
        let schema = schema_for!(TaxCalculationRequest);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        Ok(())
    }

    fn print_sections(&self) -> anyhow::Result<()> {
        println!("Deduction Sections");
        println!("==================");
        println!();
        for section in Section::ALL {
            println!("{:12}  {}", section.code(), section.description());
        }
        println!();
        println!("Chapter VI-A sections apply under the OLD regime only.");
        Ok(())
    }
}
