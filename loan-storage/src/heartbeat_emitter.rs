//! Periodic heartbeat publication (spec §5): every `interval`, publish
//! `{site, version, status, timestamp}` on the `HEARTBEAT` topic so the
//! local Load Gateway and the peer Storage Engine can observe liveness and
//! version without ever talking to this engine's request/reply port.

use std::time::Duration;

use loan_net::{HeartbeatMsg, Publisher};
use tracing::debug;

use crate::engine::EngineHandle;

pub fn spawn_heartbeat_emitter(publisher: Publisher, engine: EngineHandle, site: u8, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let msg = HeartbeatMsg {
                site,
                version: engine.version(),
                status: "OK".to_string(),
                timestamp: unix_epoch_seconds(),
            };
            debug!(version = msg.version, "publishing heartbeat");
            publisher.publish(loan_config::TOPIC_HEARTBEAT, &msg).await;
        }
    });
}

fn unix_epoch_seconds() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
