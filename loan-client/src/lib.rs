//! The Client Producer: reads a line-oriented request stream and submits
//! each request to the local Load Gateway, one at a time, with per-request
//! timeout and connection reset on stall (spec §4.1).
//!
//! The request-file *parser itself* is named as an external collaborator in
//! the distillation's non-goals, but the producer that drives it — pacing,
//! timeout, reconnect-on-fault — is squarely in scope, so [`parser`] is kept
//! minimal: just enough line parsing to feed [`producer`].

pub mod parser;
pub mod producer;

pub use parser::{parse_line, ParsedRequest};
pub use producer::run_client_producer;
