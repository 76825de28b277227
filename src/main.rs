use anyhow::Result;
use clap::Parser;
use pairview::{
    app,
    cli::{
        handle_document_command, handle_interviews_command, handle_languages_command, Cli,
        CliCommand,
    },
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Some(CliCommand::Version) => {
            println!("pairview {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some(CliCommand::Languages) => {
            handle_languages_command()?;
            return Ok(());
        }
        Some(CliCommand::Document(args)) => {
            handle_document_command(args)?;
            return Ok(());
        }
        Some(CliCommand::Interviews) => {
            handle_interviews_command()?;
            return Ok(());
        }
        None => {}
    }

    app::run_service().await
}
