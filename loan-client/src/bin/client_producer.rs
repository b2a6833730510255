use std::path::PathBuf;

use clap::Parser;
use loan_config::{CommonArgs, Endpoints, Timeouts};
use loan_client::run_client_producer;
use tracing::info;

#[derive(Parser)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,
    /// Request file: one `OPERATION;BOOK_CODE;USER_ID;YYYY-MM-DD` per line.
    #[arg(long)]
    requests: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let endpoints = Endpoints::from_env();
    let timeouts = Timeouts::default();

    let lg_addr = endpoints.cp_lg(args.common.site);
    info!(site = args.common.site.as_u8(), %lg_addr, requests = %args.requests.display(), "client producer starting");

    run_client_producer(&args.requests, lg_addr, timeouts.cp_request, timeouts.client_producer_pace).await
}
