mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "taxregime", version, about = "Income tax under the OLD and NEW regimes")]
struct Opts {
    /// Log each computation step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate tax for a request under its selected regime
    Calculate(cmd::calculate::CalculateCommand),
    /// Compare OLD and NEW regimes and recommend one
    Compare(cmd::compare::CompareCommand),
    /// Suggest deductions that lower the OLD regime liability
    Optimize(cmd::optimize::OptimizeCommand),
    /// Print the request format
    Schema(cmd::schema::SchemaCommand),
    /// Print the built-in statutory config
    Config(cmd::config::ConfigCommand),
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let mut logger = pretty_env_logger::formatted_builder();
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    } else if opts.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    } else {
        logger.filter_level(log::LevelFilter::Warn);
    }
    logger.init();

    match opts.cmd {
        Command::Calculate(cmd) => cmd.exec(),
        Command::Compare(cmd) => cmd.exec(),
        Command::Optimize(cmd) => cmd.exec(),
        Command::Schema(cmd) => cmd.exec(),
        Command::Config(cmd) => cmd.exec(),
    }
}
