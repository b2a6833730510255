//! The wire protocol and transport this system's roles talk over.
//!
//! The source system (`examples/original_source/`) used ZeroMQ REQ/REP,
//! PUB/SUB and PUSH/PULL sockets. There is no ZeroMQ crate in the teacher
//! corpus's dependency stack, so the same semantics — strict request/reply
//! alternation with reconnect-on-fault, and topic-filtered publish/subscribe
//! — are built directly on `tokio` TCP streams, length-delimited framing
//! (`tokio_util::codec`), and `async_broadcast` for in-process fan-out.

pub mod envelope;
pub mod framing;
pub mod heartbeat;
pub mod reqrep;
pub mod topic;

pub use envelope::{Envelope, Payload, Reply};
pub use heartbeat::HeartbeatMsg;
pub use reqrep::{ReqClient, ReqError};
pub use topic::{Publisher, Subscriber, TopicMessage};
