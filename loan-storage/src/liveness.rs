//! Heartbeat-derived liveness tracking (spec §5): "If now - lastHeartbeatAt
//! > deadAfter, treat the site as dead."
//!
//! Two flavors are needed: the Load Gateway only cares whether its local
//! Storage Engine is alive, while the catch-up watcher additionally needs
//! the last version a peer announced, so it can decide whether to pull.
//! Both are built on the same atomics-plus-background-task shape so a
//! reader never blocks on the heartbeat stream.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use loan_net::{HeartbeatMsg, Subscriber};
use tokio::time::{interval, Instant};
use tracing::{debug, warn};

static PROCESS_EPOCH: OnceLock<Instant> = OnceLock::new();

fn now_millis() -> u64 {
    // Monotonic, process-local clock measured from first use; only ever
    // compared against values produced by this same process, so wall-clock
    // skew across sites never enters into it.
    let epoch = PROCESS_EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_millis() as u64
}

/// Tracks whether a single remote site is alive, based on its heartbeat
/// stream. Used by the Load Gateway to decide `use_backup` for PRESTAMO.
#[derive(Clone)]
pub struct LivenessMonitor {
    alive: Arc<AtomicBool>,
    last_heartbeat_millis: Arc<AtomicU64>,
}

impl LivenessMonitor {
    /// Connect to `addr`'s heartbeat topic and track liveness in the
    /// background. Starts pessimistic (`alive = false`) until the first
    /// heartbeat arrives, matching the source system's behavior on startup
    /// before any heartbeat has been observed.
    pub fn spawn(addr: std::net::SocketAddr, dead_after: Duration) -> Self {
        let alive = Arc::new(AtomicBool::new(false));
        let last_heartbeat_millis = Arc::new(AtomicU64::new(0));

        tokio::spawn(watch_heartbeats(addr, alive.clone(), last_heartbeat_millis.clone()));
        tokio::spawn(expire_on_silence(
            alive.clone(),
            last_heartbeat_millis.clone(),
            dead_after,
        ));

        Self {
            alive,
            last_heartbeat_millis,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }
}

async fn watch_heartbeats(
    addr: std::net::SocketAddr,
    alive: Arc<AtomicBool>,
    last_heartbeat_millis: Arc<AtomicU64>,
) {
    let topics = vec![loan_config::TOPIC_HEARTBEAT.to_string()];
    let mut subscriber = loop {
        match Subscriber::connect(addr, topics.clone()).await {
            Ok(s) => break s,
            Err(e) => {
                warn!(%addr, error = %e, "liveness monitor failed to connect, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    };

    loop {
        match subscriber.recv_payload::<HeartbeatMsg>().await {
            Ok((_, _msg)) => {
                last_heartbeat_millis.store(now_millis(), Ordering::Release);
                alive.store(true, Ordering::Release);
            }
            Err(e) => {
                debug!(%addr, error = %e, "heartbeat subscriber faulted, reconnecting");
                loop {
                    match subscriber.reconnect().await {
                        Ok(()) => break,
                        Err(_) => tokio::time::sleep(Duration::from_secs(1)).await,
                    }
                }
            }
        }
    }
}

async fn expire_on_silence(alive: Arc<AtomicBool>, last_heartbeat_millis: Arc<AtomicU64>, dead_after: Duration) {
    let mut ticker = interval(Duration::from_millis(250));
    loop {
        ticker.tick().await;
        let last = last_heartbeat_millis.load(Ordering::Acquire);
        if last == 0 {
            continue;
        }
        let elapsed = now_millis().saturating_sub(last);
        if elapsed > dead_after.as_millis() as u64 {
            alive.store(false, Ordering::Release);
        }
    }
}

/// Like [`LivenessMonitor`] but also remembers the last version a peer
/// announced, for the catch-up watcher's "peer is ahead" decision.
#[derive(Clone)]
pub struct PeerLiveness {
    pub alive: Arc<AtomicBool>,
    pub last_observed_version: Arc<AtomicU64>,
}

impl PeerLiveness {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(false)),
            last_observed_version: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    pub fn last_observed_version(&self) -> u64 {
        self.last_observed_version.load(Ordering::Acquire)
    }
}

impl Default for PeerLiveness {
    fn default() -> Self {
        Self::new()
    }
}
