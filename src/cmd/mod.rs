pub mod calculate;
pub mod compare;
pub mod config;
pub mod optimize;
pub mod schema;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use taxregime::{read_request_json, FinancialYear, TaxCalculationRequest, TaxYearConfig};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

/// Options shared by every command that computes tax.
#[derive(clap::Args, Debug)]
pub struct RequestArgs {
    /// JSON request file (or "-" for stdin)
    #[arg(default_value = "-")]
    pub file: PathBuf,

    /// Statutory config JSON to use instead of the built-in one for the
    /// request's tax year
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl RequestArgs {
    /// Read the request and resolve the config it is computed under.
    pub fn load(&self) -> anyhow::Result<(TaxCalculationRequest, TaxYearConfig)> {
        let request = read_request(&self.file)?;
        let config = load_config(self.config.as_deref(), request.tax_year)?;
        Ok((request, config))
    }
}

/// Read a JSON request from a file (or stdin with "-")
pub fn read_request(path: &Path) -> anyhow::Result<TaxCalculationRequest> {
    if path.as_os_str() == "-" {
        read_from_stdin()
    } else {
        read_from_file(path)
    }
}

fn read_from_file(path: &Path) -> anyhow::Result<TaxCalculationRequest> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(read_request_json(reader)?)
}

fn read_from_stdin() -> anyhow::Result<TaxCalculationRequest> {
    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin.lock());

    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    if buffer.is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }

    Ok(read_request_json(io::Cursor::new(buffer))?)
}

/// The override file if given, otherwise the built-in config for `year`.
pub fn load_config(path: Option<&Path>, year: FinancialYear) -> anyhow::Result<TaxYearConfig> {
    let Some(path) = path else {
        return Ok(TaxYearConfig::builtin(year)?);
    };
    let config = TaxYearConfig::from_json_reader(BufReader::new(File::open(path)?))?;
    if config.financial_year != year {
        anyhow::bail!(
            "config {} is for {}, request is for {}",
            path.display(),
            config.financial_year,
            year
        );
    }
    log::info!("using config {} for {}", path.display(), year);
    Ok(config)
}

pub(crate) fn print_table<T: Tabled>(rows: Vec<T>) {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
        .to_string();
    println!("{}", table);
}
