//! The Load Gateway role binary: `gestor_carga/gc.py`'s CP-facing endpoint
//! plus `gestor_carga/heartbeat_monitor.py`'s liveness tracking.

use std::sync::Arc;

use clap::Parser;
use loan_config::{CommonArgs, Endpoints, Timeouts};
use loan_gateway::Gateway;
use loan_net::{reqrep::serve_reqrep, topic::Publisher};
use loan_storage::LivenessMonitor;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = CommonArgs::parse();
    let endpoints = Endpoints::from_env();
    let timeouts = Timeouts::default();

    // Event-topic publisher: must never silently drop DEVOLUCION/RENOVACION
    // events, so overflow is disabled (spec §4.4).
    let publisher = Publisher::bind(endpoints.lg_pub(args.site), false).await?;
    let liveness = LivenessMonitor::spawn(endpoints.se_heartbeat(args.site), timeouts.heartbeat_dead_after);

    let gateway = Arc::new(Gateway::new(
        args.site.as_u8(),
        endpoints.lg_la(args.site),
        publisher,
        liveness,
        timeouts.lg_to_la,
    ));

    info!(site = args.site.as_u8(), addr = %endpoints.cp_lg(args.site), "load gateway listening");

    serve_reqrep(endpoints.cp_lg(args.site), move |envelope| {
        let gateway = gateway.clone();
        async move { gateway.handle(envelope).await }
    })
    .await
}
