//! The Storage Engine: the single authoritative writer of a site's
//! [`loan_model::Catalog`], reachable over request/reply for domain
//! operations and catch-up pulls, and observable over a heartbeat topic.
//!
//! `sequencer/src/catchup.rs` and `sequencer/src/persistence.rs` in the
//! teacher corpus are the model for this crate's shape: a persistence layer
//! that reconciles on-disk state at startup, and a catch-up module that
//! watches peers and pulls state when they're ahead. Mutable access to the
//! catalog itself is funneled through a single actor task (spec §9's
//! redesign away from an explicit mutex), mirroring the corpus's general
//! preference for actor-owned state over shared locks.

pub mod catchup;
pub mod engine;
pub mod heartbeat_emitter;
pub mod liveness;
pub mod persistence;

pub use engine::{EngineHandle, spawn_engine};
pub use liveness::{LivenessMonitor, PeerLiveness};
pub use persistence::RecoverySource;
