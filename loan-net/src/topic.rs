//! Topic publish/subscribe, used for the DEVOLUCION/RENOVACION event topics
//! and for the Storage Engine's heartbeat stream (spec §6's "Topics" and
//! "Heartbeat frame").
//!
//! There's no shared-memory pub/sub between processes here, so publish is a
//! TCP accept loop: each subscriber connects, sends a one-time `Subscribe`
//! handshake naming the topics it wants, and then receives every published
//! message matching those topics for the life of the connection.

use std::net::SocketAddr;

use async_broadcast::{Receiver, Sender};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, warn};

use crate::framing::{self, FramedJson};
use crate::ReqError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicMessage {
    pub topic: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Subscribe {
    topics: Vec<String>,
}

/// The publishing side of a topic endpoint.
pub struct Publisher {
    tx: Sender<TopicMessage>,
    /// Whether a full ring buffer drops the oldest unread message instead of
    /// making `publish` wait for room. Heartbeats want this (a missed
    /// heartbeat is harmless, the next one supersedes it); the DEVOLUCION/
    /// RENOVACION event topics must not, since a dropped event is never
    /// retried by anyone (spec §4.4: "EAs never drop events").
    overflow: bool,
}

impl Publisher {
    /// Bind `addr` and start accepting subscriber connections in the
    /// background. Returns once bound; the accept loop runs detached.
    ///
    /// `overflow`: if `true`, a full channel evicts its oldest unread
    /// message rather than blocking the publisher; if `false`, `publish`
    /// waits for a lagging subscriber to catch up rather than lose the
    /// message. Pass `true` for heartbeats, `false` for event topics.
    pub async fn bind(addr: SocketAddr, overflow: bool) -> anyhow::Result<Self> {
        let (mut tx, _rx) = async_broadcast::broadcast(1024);
        tx.set_overflow(overflow);
        let listener = TcpListener::bind(addr).await?;
        debug!(%addr, overflow, "topic publisher listening");

        let rx_template = tx.new_receiver();
        tokio::spawn(async move {
            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "topic publisher accept failed");
                        continue;
                    }
                };
                let rx = rx_template.clone();
                tokio::spawn(serve_subscriber(stream, peer, rx));
            }
        });

        Ok(Self { tx, overflow })
    }

    pub async fn publish(&self, topic: &str, payload: impl Serialize) {
        let payload = serde_json::to_value(payload).expect("payload must serialize");
        let msg = TopicMessage {
            topic: topic.to_string(),
            payload,
        };
        if self.overflow {
            // Fire-and-forget: a slow/gone subscriber drops the oldest
            // buffered message instead of blocking the publisher.
            let _ = self.tx.try_broadcast(msg);
        } else {
            // Apply backpressure instead of dropping: wait for a lagging
            // subscriber to free up room in the ring buffer.
            if let Err(e) = self.tx.broadcast(msg).await {
                warn!(%topic, error = %e, "topic channel closed, message not delivered");
            }
        }
    }
}

async fn serve_subscriber(stream: TcpStream, peer: SocketAddr, mut rx: Receiver<TopicMessage>) {
    let mut framed = framing::wrap(stream);
    let subscribe: Subscribe = match framing::recv_json(&mut framed).await {
        Ok(s) => s,
        Err(e) => {
            warn!(%peer, error = %e, "subscriber handshake failed");
            return;
        }
    };

    loop {
        let msg = match rx.recv().await {
            Ok(m) => m,
            Err(async_broadcast::RecvError::Overflowed(_)) => continue,
            Err(async_broadcast::RecvError::Closed) => return,
        };
        if !subscribe.topics.iter().any(|t| t == &msg.topic) {
            continue;
        }
        if framing::send_json(&mut framed, &msg).await.is_err() {
            debug!(%peer, "subscriber disconnected");
            return;
        }
    }
}

/// The subscribing side of a topic endpoint. Each instance is a single TCP
/// connection subscribed to a fixed set of topics; on any I/O fault the
/// caller must `reconnect` before calling `recv` again (same reconnect-on-
/// fault discipline as [`crate::ReqClient`]).
pub struct Subscriber {
    addr: SocketAddr,
    topics: Vec<String>,
    conn: FramedJson,
}

impl Subscriber {
    pub async fn connect(addr: SocketAddr, topics: Vec<String>) -> Result<Self, ReqError> {
        let stream = TcpStream::connect(addr).await.map_err(ReqError::Io)?;
        let mut conn = framing::wrap(stream);
        framing::send_json(&mut conn, &Subscribe { topics: topics.clone() }).await?;
        Ok(Self { addr, topics, conn })
    }

    pub async fn reconnect(&mut self) -> Result<(), ReqError> {
        let stream = TcpStream::connect(self.addr).await.map_err(ReqError::Io)?;
        let mut conn = framing::wrap(stream);
        framing::send_json(&mut conn, &Subscribe {
            topics: self.topics.clone(),
        })
        .await?;
        self.conn = conn;
        Ok(())
    }

    pub async fn recv(&mut self) -> Result<TopicMessage, ReqError> {
        framing::recv_json(&mut self.conn).await
    }

    pub async fn recv_payload<T: DeserializeOwned>(&mut self) -> Result<(String, T), ReqError> {
        let msg = self.recv().await?;
        let payload = serde_json::from_value(msg.payload).map_err(ReqError::Decode)?;
        Ok((msg.topic, payload))
    }
}
