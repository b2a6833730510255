//! The Loan Actor: synchronous PRESTAMO worker with an immediate, one-shot
//! failover policy (spec §4.3). Grounded on `actores/actor_prestamo.py`'s
//! local-then-peer attempt sequence, with the reconnect-on-fault discipline
//! pushed into [`loan_net::ReqClient`] itself.

use std::net::SocketAddr;
use std::time::Duration;

use loan_net::envelope::OP_PRESTAMO;
use loan_net::{Envelope, ReqClient, Reply};
use tokio::sync::Mutex;
use tracing::warn;

pub struct LoanActor {
    local: Mutex<ReqClient>,
    peer: Mutex<ReqClient>,
    se_timeout: Duration,
}

impl LoanActor {
    pub fn new(local_se_addr: SocketAddr, peer_se_addr: SocketAddr, se_timeout: Duration) -> Self {
        Self {
            local: Mutex::new(ReqClient::new(local_se_addr)),
            peer: Mutex::new(ReqClient::new(peer_se_addr)),
            se_timeout,
        }
    }

    /// Handle one `{operation:"loan", payload, useBackup}` request from the
    /// Load Gateway (spec §4.2's `OP_LOAN` hop).
    pub async fn handle(&self, envelope: Envelope) -> Reply {
        let Some(payload) = envelope.payload else {
            return Reply::err("UNKNOWN_OP");
        };
        let use_backup = envelope.use_backup.unwrap_or(false);
        let domain_request = Envelope::domain(OP_PRESTAMO, payload);

        if !use_backup {
            let mut local = self.local.lock().await;
            match local.call(&domain_request, self.se_timeout).await {
                Ok(reply) => return reply,
                Err(e) => warn!(error = %e, "local storage engine unreachable, failing over to peer"),
            }
        } else {
            // The LG already observed the local SE as down; still tear down
            // any stale local connection so it starts fresh next time we
            // aren't told to skip it (mirrors the source's channel-recreate
            // step even on the skip path).
            self.local.lock().await.reset();
        }

        let mut peer = self.peer.lock().await;
        match peer.call(&domain_request, self.se_timeout).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "peer storage engine unreachable after local failover");
                Reply::err("STORAGE_UNAVAILABLE")
            }
        }
    }
}
