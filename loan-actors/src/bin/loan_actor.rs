use clap::Parser;
use loan_actors::LoanActor;
use loan_config::{CommonArgs, Endpoints, Timeouts};
use loan_net::reqrep::serve_reqrep;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = CommonArgs::parse();
    let endpoints = Endpoints::from_env();
    let timeouts = Timeouts::default();

    let actor = Arc::new(LoanActor::new(
        endpoints.se_reqrep(args.site),
        endpoints.se_reqrep(args.site.other()),
        timeouts.la_to_se,
    ));

    let addr = endpoints.lg_la(args.site);
    info!(site = args.site.as_u8(), %addr, "loan actor listening");

    serve_reqrep(addr, move |envelope| {
        let actor = actor.clone();
        async move { actor.handle(envelope).await }
    })
    .await
}
