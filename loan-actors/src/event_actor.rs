//! Event Actors: asynchronous topic subscribers with indefinite lazy retry
//! against the local Storage Engine (spec §4.4). Grounded on
//! `actores/actor_devolucion.py` / `actores/actor_renovacion.py`, which
//! differ only in which topic they subscribe to and which operation they
//! apply — so both are instances of one generic actor here rather than two
//! near-duplicate modules.

use std::net::SocketAddr;
use std::time::Duration;

use loan_net::{Envelope, ReqClient, Subscriber};
use tracing::{info, warn};

pub struct EventActor {
    topic: String,
    operation: String,
}

impl EventActor {
    pub fn new(topic: impl Into<String>, operation: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            operation: operation.into(),
        }
    }

    /// Subscribe to `subscriber_addr` and apply every matching event to the
    /// local Storage Engine at `se_addr`, indefinitely. The loop has no exit
    /// condition; callers run it inside a spawned task.
    pub async fn run(
        &self,
        subscriber_addr: SocketAddr,
        se_addr: SocketAddr,
        se_timeout: Duration,
        retry_sleep: Duration,
    ) {
        let mut subscriber = loop {
            match Subscriber::connect(subscriber_addr, vec![self.topic.clone()]).await {
                Ok(s) => break s,
                Err(e) => {
                    warn!(%subscriber_addr, error = %e, "event actor failed to subscribe, retrying");
                    tokio::time::sleep(retry_sleep).await;
                }
            }
        };
        let mut se_client = ReqClient::new(se_addr);

        loop {
            let envelope: Envelope = match subscriber.recv_payload().await {
                Ok((_, envelope)) => envelope,
                Err(e) => {
                    warn!(error = %e, "event subscriber faulted, reconnecting");
                    loop {
                        match subscriber.reconnect().await {
                            Ok(()) => break,
                            Err(_) => tokio::time::sleep(retry_sleep).await,
                        }
                    }
                    continue;
                }
            };

            if envelope.operation != self.operation {
                warn!(
                    expected = %self.operation,
                    got = %envelope.operation,
                    "dropping event: operation does not match subscribed topic"
                );
                continue;
            }
            let Some(payload) = envelope.payload else {
                warn!(operation = %self.operation, "dropping event: missing payload");
                continue;
            };

            let domain_request = Envelope::domain(&self.operation, payload);
            loop {
                match se_client.call(&domain_request, se_timeout).await {
                    Ok(reply) if reply.ok => {
                        info!(operation = %self.operation, "event applied");
                        break;
                    }
                    Ok(reply) => {
                        warn!(operation = %self.operation, reason = ?reply.reason, "storage engine rejected event");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "storage engine unreachable, retrying event");
                        tokio::time::sleep(retry_sleep).await;
                    }
                }
            }
        }
    }
}
