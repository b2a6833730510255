use std::net::SocketAddr;
use std::time::Duration;

use loan_net::envelope::{Envelope, OP_DEVOLUCION, OP_PRESTAMO, OP_RENOVACION};
use loan_net::{Payload, ReqClient, Reply};
use loan_storage::LivenessMonitor;
use tokio::sync::Mutex;
use tracing::warn;

/// Per-site gateway state shared across every concurrent CP connection: the
/// LG<->LA channel (a single logical conversation at a time, guarded by a
/// mutex to preserve strict request/reply alternation on that hop), the
/// event publisher, and the local-SE liveness monitor used to derive
/// `useBackup`.
pub struct Gateway {
    site: u8,
    la_client: Mutex<ReqClient>,
    publisher: loan_net::Publisher,
    liveness: LivenessMonitor,
    la_timeout: Duration,
}

impl Gateway {
    pub fn new(
        site: u8,
        la_addr: SocketAddr,
        publisher: loan_net::Publisher,
        liveness: LivenessMonitor,
        la_timeout: Duration,
    ) -> Self {
        Self {
            site,
            la_client: Mutex::new(ReqClient::new(la_addr)),
            publisher,
            liveness,
            la_timeout,
        }
    }

    /// Classify and dispatch one CP request, producing the single reply the
    /// request/reply socket contract requires (spec §4.2).
    pub async fn handle(&self, envelope: Envelope) -> Reply {
        match envelope.operation.as_str() {
            OP_PRESTAMO => self.handle_loan(envelope.payload).await,
            OP_DEVOLUCION => {
                self.handle_async(
                    loan_config::TOPIC_DEVOLUCION,
                    OP_DEVOLUCION,
                    "devolucion",
                    envelope.payload,
                )
                .await
            }
            OP_RENOVACION => {
                self.handle_async(
                    loan_config::TOPIC_RENOVACION,
                    OP_RENOVACION,
                    "renovacion",
                    envelope.payload,
                )
                .await
            }
            _ => Reply::err("UNKNOWN_OP"),
        }
    }

    async fn handle_loan(&self, payload: Option<Payload>) -> Reply {
        let Some(payload) = payload else {
            return Reply::err("UNKNOWN_OP");
        };
        let use_backup = !self.liveness.is_alive();
        let envelope = Envelope::loan(payload, use_backup);

        let mut la_client = self.la_client.lock().await;
        match la_client.call(&envelope, self.la_timeout).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "loan actor unreachable");
                Reply::err("ACTOR_UNREACHABLE")
            }
        }
    }

    /// DEVOLUCION/RENOVACION: ack the CP immediately, then publish for the
    /// matching Event Actor to apply at its own pace (spec §4.2/§4.4). The
    /// ack never waits on storage, so it is always cheap and always `ok`.
    async fn handle_async(&self, topic: &str, operation: &str, kind: &str, payload: Option<Payload>) -> Reply {
        let Some(payload) = payload else {
            return Reply::err("UNKNOWN_OP");
        };
        let event = Envelope {
            operation: operation.to_string(),
            payload: Some(payload),
            use_backup: None,
            site: Some(self.site),
        };
        self.publisher.publish(topic, &event).await;
        Reply::queued(kind)
    }
}
