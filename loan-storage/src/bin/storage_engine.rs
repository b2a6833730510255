//! The Storage Engine role binary: `gestor_almacenamiento/ga.py`'s request
//! handling, heartbeat emission, and startup recovery, plus the peer
//! catch-up watcher this system adds (spec §9).

use clap::Parser;
use loan_config::{snapshot_paths, CommonArgs, Endpoints, Timeouts};
use loan_net::envelope::{Envelope, OP_SYNC_PULL};
use loan_net::{reqrep::serve_reqrep, topic::Publisher, Reply};
use loan_storage::{persistence, spawn_engine};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = CommonArgs::parse();
    let endpoints = Endpoints::from_env();
    let timeouts = Timeouts::default();

    let (primary_path, backup_path) = snapshot_paths(&args.data_dir, args.site);
    let (initial_catalog, source) = persistence::recover(&primary_path, &backup_path).await;
    info!(site = args.site.as_u8(), ?source, "storage engine starting");

    let engine = spawn_engine(initial_catalog, primary_path, backup_path);

    // Heartbeats are fire-and-forget: a missed tick is harmless since the
    // next one supersedes it, so overflow is enabled.
    let publisher = Publisher::bind(endpoints.se_heartbeat(args.site), true).await?;
    loan_storage::heartbeat_emitter::spawn_heartbeat_emitter(
        publisher,
        engine.clone(),
        args.site.as_u8(),
        timeouts.heartbeat_interval,
    );

    loan_storage::catchup::spawn_peer_catchup(
        engine.clone(),
        endpoints.se_heartbeat(args.site.other()),
        endpoints.se_sync(args.site.other()),
        timeouts.la_to_se,
    );

    let reqrep_addr = endpoints.se_reqrep(args.site);
    let sync_addr = endpoints.se_sync(args.site);

    let reqrep_engine = engine.clone();
    let reqrep_task = tokio::spawn(async move {
        serve_reqrep(reqrep_addr, move |envelope: Envelope| {
            let engine = reqrep_engine.clone();
            async move {
                let Some(payload) = envelope.payload else {
                    return Reply::err("UNKNOWN_OP");
                };
                engine.mutate(&envelope.operation, payload).await
            }
        })
        .await
    });

    let sync_engine = engine.clone();
    let sync_task = tokio::spawn(async move {
        serve_reqrep(sync_addr, move |envelope: Envelope| {
            let engine = sync_engine.clone();
            async move {
                if envelope.operation != OP_SYNC_PULL {
                    return Reply::err("UNKNOWN_OP");
                }
                match engine.snapshot().await {
                    Some(snapshot) => Reply {
                        ok: true,
                        version: Some(snapshot.version),
                        snapshot: Some(snapshot),
                        ..Default::default()
                    },
                    None => Reply::err("ENGINE_UNAVAILABLE"),
                }
            }
        })
        .await
    });

    tokio::try_join!(flatten(reqrep_task), flatten(sync_task))?;
    Ok(())
}

async fn flatten(task: tokio::task::JoinHandle<anyhow::Result<()>>) -> anyhow::Result<()> {
    task.await?
}
