use std::sync::Arc;

use clap::Parser;
use kbase_server::{Cli, Command, StoreKind, build_pipeline, loader::load_knowledge_base, run_server};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let pipeline = Arc::new(build_pipeline(&cli.settings)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if let Err(e) = pipeline.initialize().await {
                warn!(error = %e, "collection setup failed; health checks will report it");
            }
            run_server(cli.settings.server_config(), pipeline).await
        }
        Command::Load { file } => {
            if cli.settings.store == StoreKind::Memory {
                warn!("loading into the in-memory store; documents are discarded on exit");
            }
            let count = load_knowledge_base(&pipeline, &file).await?;
            info!(count, "knowledge base loaded");
            Ok(())
        }
    }
}
