use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    bookblurb::logging::init().context("init logging")?;

    let cli = bookblurb::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        bookblurb::cli::Command::Run(args) => {
            bookblurb::run::run(args).await.context("run")?;
        }
        bookblurb::cli::Command::Classify(args) => {
            bookblurb::inspect::classify(args).context("classify")?;
        }
        bookblurb::cli::Command::Extract(args) => {
            bookblurb::inspect::extract(args).await.context("extract")?;
        }
        bookblurb::cli::Command::Templates => {
            bookblurb::inspect::templates();
        }
    }

    Ok(())
}
