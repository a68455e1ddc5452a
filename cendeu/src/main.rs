use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::{
    consume::ConsumeArgs, dev::DevArgs, error::Result, import::ImportArgs,
    observability::init_observability,
};

mod consume;
mod dev;
mod error;
mod import;
mod observability;

#[derive(Parser)]
#[command(name = "cendeu")]
#[command(about = "Central de Deudores import pipeline CLI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the whole import pipeline in development mode
    Dev {
        #[clap(flatten)]
        inner: DevArgs,
    },
    /// Ingest a local ledger file and print the run report
    Import {
        #[clap(flatten)]
        inner: ImportArgs,
    },
    /// Run only the queue consumer workers
    Consume {
        #[clap(flatten)]
        inner: ConsumeArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_observability();

    let cli = Cli::parse();

    let ct = CancellationToken::new();

    let ct_clone = ct.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ct_clone.cancel();
    });

    match cli.command {
        Commands::Dev { inner } => inner.run(ct).await,
        Commands::Import { inner } => inner.run(ct).await,
        Commands::Consume { inner } => inner.run(ct).await,
    }
}
