use serde::{Deserialize, Serialize};

/// The `HEARTBEAT` topic payload (spec §6): `{site, version, status, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatMsg {
    pub site: u8,
    pub version: u64,
    pub status: String,
    /// Seconds since the Unix epoch, matching the source system's
    /// `time.time()` heartbeat timestamp.
    pub timestamp: f64,
}
