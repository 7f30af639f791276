use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tripwire::cli::commands::{
    eval::EvalCommand, list::ListCommand, validate::ValidateCommand, CommandHandler,
};
use tripwire::cli::{Cli, Commands, LogLevel};

/// Initialize tracing from the --log-level flag; RUST_LOG directives are added on top
fn initialize_tracing(log_level: LogLevel) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());
    if let Ok(extra) = std::env::var("RUST_LOG") {
        for directive in extra.split(',').filter(|d| !d.is_empty()) {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(cli.log_level);

    let name = cli.command.name();
    let handler: Box<dyn CommandHandler> = match cli.command {
        Commands::Validate { config, json } => Box::new(ValidateCommand::new(config, json)),
        Commands::List { config, json } => Box::new(ListCommand::new(config, json)),
        Commands::Eval { expression, vars } => Box::new(EvalCommand::new(expression, vars)),
    };

    tracing::debug!(command = handler.name(), "Running command");
    handler
        .execute()
        .with_context(|| format!("tripwire {} failed", name))
}
