//! Per-site configuration: endpoints, timeouts, storage paths.
//!
//! Every endpoint has a loopback default and an environment-variable
//! override, reproducing `comun/config.py`'s `os.getenv(NAME, default)`
//! pattern from the system this crate replaces. CLI parsing (`--site`) is
//! layered on top via `clap`, matching the `argparse --sede` entry point
//! every role binary in the source system used.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// One of the two peered deployments (spec GLOSSARY: Sede / Site).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteId {
    One,
    Two,
}

impl SiteId {
    pub fn other(self) -> SiteId {
        match self {
            SiteId::One => SiteId::Two,
            SiteId::Two => SiteId::One,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            SiteId::One => 1,
            SiteId::Two => 2,
        }
    }
}

impl std::str::FromStr for SiteId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(SiteId::One),
            "2" => Ok(SiteId::Two),
            other => Err(format!("site must be 1 or 2, got {other}")),
        }
    }
}

/// Shared CLI arguments every role binary accepts.
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Site this process instance belongs to (1 or 2).
    #[arg(long)]
    pub site: SiteId,

    /// Directory holding primary/backup snapshot files.
    #[arg(long, env = "LOAN_DATA_DIR", default_value = "./data")]
    pub data_dir: PathBuf,
}

fn env_addr(var: &str, default: &str) -> SocketAddr {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| default.parse().expect("built-in default must parse"))
}

/// All TCP endpoints for both sites, resolved from environment overrides or
/// loopback defaults.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// CP <-> LG request/reply.
    pub cp_lg: [SocketAddr; 2],
    /// LG event publisher (DEVOLUCION/RENOVACION topics), subscribed by EAs.
    pub lg_pub: [SocketAddr; 2],
    /// LG <-> Loan Actor request/reply.
    pub lg_la: [SocketAddr; 2],
    /// Loan Actor / Event Actor <-> Storage Engine request/reply.
    pub se_reqrep: [SocketAddr; 2],
    /// Storage Engine heartbeat publisher.
    pub se_heartbeat: [SocketAddr; 2],
    /// Storage Engine catch-up (bulk snapshot pull) request/reply.
    pub se_sync: [SocketAddr; 2],
}

impl Endpoints {
    pub fn from_env() -> Self {
        Self {
            cp_lg: [
                env_addr("LOAN_CP_LG_SEDE1", "127.0.0.1:5551"),
                env_addr("LOAN_CP_LG_SEDE2", "127.0.0.1:5552"),
            ],
            lg_pub: [
                env_addr("LOAN_LG_PUB_SEDE1", "127.0.0.1:6001"),
                env_addr("LOAN_LG_PUB_SEDE2", "127.0.0.1:6002"),
            ],
            lg_la: [
                env_addr("LOAN_LG_LA_SEDE1", "127.0.0.1:6101"),
                env_addr("LOAN_LG_LA_SEDE2", "127.0.0.1:6102"),
            ],
            se_reqrep: [
                env_addr("LOAN_SE_SEDE1", "127.0.0.1:7001"),
                env_addr("LOAN_SE_SEDE2", "127.0.0.1:7002"),
            ],
            se_heartbeat: [
                env_addr("LOAN_SE_HEARTBEAT_SEDE1", "127.0.0.1:8001"),
                env_addr("LOAN_SE_HEARTBEAT_SEDE2", "127.0.0.1:8002"),
            ],
            se_sync: [
                env_addr("LOAN_SE_SYNC_SEDE1", "127.0.0.1:9001"),
                env_addr("LOAN_SE_SYNC_SEDE2", "127.0.0.1:9002"),
            ],
        }
    }

    fn idx(site: SiteId) -> usize {
        match site {
            SiteId::One => 0,
            SiteId::Two => 1,
        }
    }

    pub fn cp_lg(&self, site: SiteId) -> SocketAddr {
        self.cp_lg[Self::idx(site)]
    }
    pub fn lg_pub(&self, site: SiteId) -> SocketAddr {
        self.lg_pub[Self::idx(site)]
    }
    pub fn lg_la(&self, site: SiteId) -> SocketAddr {
        self.lg_la[Self::idx(site)]
    }
    pub fn se_reqrep(&self, site: SiteId) -> SocketAddr {
        self.se_reqrep[Self::idx(site)]
    }
    pub fn se_heartbeat(&self, site: SiteId) -> SocketAddr {
        self.se_heartbeat[Self::idx(site)]
    }
    pub fn se_sync(&self, site: SiteId) -> SocketAddr {
        self.se_sync[Self::idx(site)]
    }
}

/// Timeouts and intervals named throughout spec §5.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub cp_request: Duration,
    pub lg_to_la: Duration,
    pub la_to_se: Duration,
    pub heartbeat_interval: Duration,
    pub heartbeat_dead_after: Duration,
    pub event_actor_retry_sleep: Duration,
    pub client_producer_pace: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            cp_request: Duration::from_secs(3),
            lg_to_la: Duration::from_secs(3),
            la_to_se: Duration::from_secs(3),
            heartbeat_interval: Duration::from_secs(1),
            heartbeat_dead_after: Duration::from_secs(5),
            event_actor_retry_sleep: Duration::from_secs(2),
            client_producer_pace: Duration::from_millis(500),
        }
    }
}

/// Primary/backup snapshot file paths for a given site under `data_dir`.
pub fn snapshot_paths(data_dir: &std::path::Path, site: SiteId) -> (PathBuf, PathBuf) {
    let n = site.as_u8();
    (
        data_dir.join(format!("bd_primaria_sede{n}.json")),
        data_dir.join(format!("bd_replica_sede{n}.json")),
    )
}

pub const TOPIC_DEVOLUCION: &str = "DEVOLUCION";
pub const TOPIC_RENOVACION: &str = "RENOVACION";
pub const TOPIC_HEARTBEAT: &str = "HEARTBEAT";
