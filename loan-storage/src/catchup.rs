//! Peer version-gossip catch-up (spec §9's resolved Open Question: there is
//! no shared filesystem between sites, so convergence has to travel over the
//! network). Each site's Storage Engine watches the other's heartbeat
//! stream; whenever the peer announces a version ahead of ours, we pull its
//! full snapshot over `sync_pull` and adopt it.
//!
//! Grounded on `sequencer/src/catchup.rs`'s peer-polling shape, simplified
//! to this system's single always-known peer (no peer discovery/scoring is
//! needed with exactly two sites).

use std::net::SocketAddr;
use std::time::Duration;

use loan_net::envelope::Envelope;
use loan_net::{HeartbeatMsg, ReqClient, Subscriber};
use tracing::{info, warn};

use crate::engine::EngineHandle;
use crate::liveness::PeerLiveness;

/// Start watching `peer_heartbeat_addr` and pulling from `peer_sync_addr`
/// whenever the peer is ahead of `engine`. Runs until the process exits;
/// returns a [`PeerLiveness`] handle the caller can use to report peer
/// status (e.g. for diagnostics).
pub fn spawn_peer_catchup(
    engine: EngineHandle,
    peer_heartbeat_addr: SocketAddr,
    peer_sync_addr: SocketAddr,
    sync_timeout: Duration,
) -> PeerLiveness {
    let liveness = PeerLiveness::new();
    tokio::spawn(watch_peer(
        engine,
        peer_heartbeat_addr,
        peer_sync_addr,
        sync_timeout,
        liveness.clone(),
    ));
    liveness
}

async fn watch_peer(
    engine: EngineHandle,
    peer_heartbeat_addr: SocketAddr,
    peer_sync_addr: SocketAddr,
    sync_timeout: Duration,
    liveness: PeerLiveness,
) {
    let topics = vec![loan_config::TOPIC_HEARTBEAT.to_string()];
    let mut subscriber = loop {
        match Subscriber::connect(peer_heartbeat_addr, topics.clone()).await {
            Ok(s) => break s,
            Err(e) => {
                warn!(%peer_heartbeat_addr, error = %e, "catch-up watcher failed to connect, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    };
    let mut sync_client = ReqClient::new(peer_sync_addr);

    loop {
        let msg = match subscriber.recv_payload::<HeartbeatMsg>().await {
            Ok((_, msg)) => msg,
            Err(e) => {
                warn!(%peer_heartbeat_addr, error = %e, "peer heartbeat subscriber faulted, reconnecting");
                loop {
                    match subscriber.reconnect().await {
                        Ok(()) => break,
                        Err(_) => tokio::time::sleep(Duration::from_secs(1)).await,
                    }
                }
                continue;
            }
        };

        liveness.alive.store(true, std::sync::atomic::Ordering::Release);
        liveness
            .last_observed_version
            .store(msg.version, std::sync::atomic::Ordering::Release);

        let local_version = engine.version();
        if msg.version <= local_version {
            continue;
        }

        info!(
            peer_version = msg.version,
            local_version, "peer is ahead, pulling snapshot for catch-up"
        );

        match sync_client.call(&Envelope::sync_pull(), sync_timeout).await {
            Ok(reply) if reply.ok => {
                let Some(snapshot) = reply.snapshot else {
                    warn!("peer accepted sync_pull but sent no snapshot");
                    continue;
                };
                if snapshot.version < msg.version {
                    // Peer moved on mid-pull; our next heartbeat observation
                    // will retrigger a pull for whatever its latest version is.
                    continue;
                }
                let catalog = loan_model::Catalog::from(snapshot);
                engine.adopt_snapshot(catalog).await;
            }
            Ok(reply) => {
                warn!(reason = ?reply.reason, "peer rejected sync_pull");
            }
            Err(e) => {
                warn!(%peer_sync_addr, error = %e, "sync_pull failed, will retry on next heartbeat");
            }
        }
    }
}
