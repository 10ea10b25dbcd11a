//! Subagent dispatch CLI binary.

use anyhow::Context;
use clap::Parser;
use subagent_dispatch::logging::{init_logging, LoggingConfig};
use subagent_dispatch::tooling::cli::{Cli, CliContext};

fn logging_config(cli: &Cli, base: LoggingConfig) -> anyhow::Result<LoggingConfig> {
    let mut config = base;
    if let Some(level) = &cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.format = format.parse()?;
    }
    if let Some(output) = &cli.log_output {
        config.output = output.parse()?;
    }
    if cli.log_file.is_some() {
        config.file = cli.log_file.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<String> {
    let workspace = dunce::canonicalize(&cli.workspace)
        .with_context(|| format!("Workspace not found: {}", cli.workspace.display()))?;
    let config = CliContext::load_config(&workspace, cli.config.as_deref())
        .context("Failed to load configuration")?;

    let logging = logging_config(&cli, config.logging.clone())?;
    init_logging(Some(&logging)).context("Failed to initialise logging")?;

    let context = CliContext::with_config(workspace, config);
    Ok(context.execute(&cli.command)?)
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
