//! The Load Gateway: the CP-facing request/reply endpoint that classifies
//! each request as a synchronous loan (routed through the Loan Actor) or an
//! asynchronous return/renewal (acknowledged immediately and published to
//! topic subscribers).
//!
//! Grounded on `sequencer/src/request_response/mod.rs`'s role-boundary shape
//! — a single endpoint fanning requests out to the right downstream
//! collaborator — adapted to this system's classify-then-dispatch policy
//! (spec §4.2).

pub mod gateway;

pub use gateway::Gateway;
