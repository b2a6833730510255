//! The single-writer catalog actor.
//!
//! Every mutation — a domain operation or a catch-up snapshot adoption —
//! passes through one task that owns the [`Catalog`] outright, so there is
//! never a lock to take or a torn read to worry about (spec §9: "a single
//! task owning the catalog, reached only through a channel, replaces the
//! explicit mutex"). A cheap [`std::sync::atomic::AtomicU64`] mirror of the
//! version is kept alongside for the heartbeat emitter and the catch-up
//! watcher, which only need to compare versions and must never wait on the
//! write path to do it.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use loan_model::error::DomainError;
use loan_model::snapshot::Snapshot;
use loan_model::Catalog;
use loan_net::envelope::{OP_DEVOLUCION, OP_PRESTAMO, OP_RENOVACION};
use loan_net::{Payload, Reply};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

enum Command {
    Mutate {
        operation: String,
        payload: Payload,
        reply: oneshot::Sender<Reply>,
    },
    AdoptSnapshot {
        catalog: Box<Catalog>,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
}

/// A cloneable handle to the running engine task.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    version: Arc<AtomicU64>,
}

impl EngineHandle {
    /// The engine's current version, read without going through the actor.
    /// Safe to call from the heartbeat emitter and catch-up watcher: it can
    /// lag the true value by at most one in-flight mutation, which is the
    /// same staleness spec §5 already tolerates for heartbeat reads.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Dispatch a domain operation (`prestamo` / `devolucion` / `renovacion`)
    /// and await its reply. Unknown operations are rejected by the engine
    /// itself, not by the caller, so the `UNKNOWN_OP` reason always reflects
    /// what the authoritative catalog actually received.
    pub async fn mutate(&self, operation: &str, payload: Payload) -> Reply {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::Mutate {
                operation: operation.to_string(),
                payload,
                reply: tx,
            })
            .await
            .is_err()
        {
            return Reply::err("ENGINE_UNAVAILABLE");
        }
        rx.await.unwrap_or_else(|_| Reply::err("ENGINE_UNAVAILABLE"))
    }

    /// Replace the catalog wholesale with one pulled from a peer during
    /// catch-up. The replacement and its persistence are sequenced through
    /// the same actor as every other mutation.
    pub async fn adopt_snapshot(&self, catalog: Catalog) {
        let (tx, rx) = oneshot::channel();
        if self
            .commands
            .send(Command::AdoptSnapshot {
                catalog: Box::new(catalog),
                reply: tx,
            })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// A full snapshot of the current catalog, for `sync_pull` replies.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(Command::Snapshot { reply: tx }).await.ok()?;
        rx.await.ok()
    }
}

/// Start the engine actor with `initial` as its starting catalog, persisting
/// to `primary_path` synchronously on every mutation and to `backup_path` on
/// a detached task. Returns immediately; the actor runs until every
/// [`EngineHandle`] clone is dropped.
pub fn spawn_engine(initial: Catalog, primary_path: PathBuf, backup_path: PathBuf) -> EngineHandle {
    let version = Arc::new(AtomicU64::new(initial.version));
    let (tx, rx) = mpsc::channel(256);
    let handle = EngineHandle {
        commands: tx,
        version: version.clone(),
    };
    tokio::spawn(run(initial, primary_path, backup_path, rx, version));
    handle
}

async fn run(
    mut catalog: Catalog,
    primary_path: PathBuf,
    backup_path: PathBuf,
    mut commands: mpsc::Receiver<Command>,
    version: Arc<AtomicU64>,
) {
    while let Some(cmd) = commands.recv().await {
        match cmd {
            Command::Mutate {
                operation,
                payload,
                reply,
            } => {
                let outcome = apply(&mut catalog, &operation, &payload);
                if outcome.is_ok() {
                    version.store(catalog.version, Ordering::Release);
                    persist(&catalog, &primary_path, &backup_path).await;
                }
                let _ = reply.send(outcome_to_reply(outcome));
            }
            Command::AdoptSnapshot { catalog: new, reply } => {
                catalog = *new;
                version.store(catalog.version, Ordering::Release);
                persist(&catalog, &primary_path, &backup_path).await;
                info!(version = catalog.version, "adopted peer snapshot via catch-up");
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Snapshot::from(&catalog));
            }
        }
    }
}

type OperationOutcome = Result<loan_net::Reply, DomainError>;

fn apply(catalog: &mut Catalog, operation: &str, payload: &Payload) -> OperationOutcome {
    tracing::debug!(operation, book_code = %payload.book_code, user_id = %payload.user_id, "dispatching request");
    let book_code = payload.book_code.as_str().into();
    let user_id = payload.user_id.as_str().into();

    match operation {
        OP_PRESTAMO => {
            let granted = catalog.prestamo(&book_code, &user_id, payload.as_of_date)?;
            Ok(Reply {
                ok: true,
                due_date: Some(granted.due_date),
                version: Some(catalog.version),
                ..Default::default()
            })
        }
        OP_DEVOLUCION => {
            catalog.devolucion(&book_code, &user_id)?;
            Ok(Reply {
                ok: true,
                version: Some(catalog.version),
                ..Default::default()
            })
        }
        OP_RENOVACION => {
            let renewed = catalog.renovacion(&book_code, &user_id, payload.as_of_date)?;
            Ok(Reply {
                ok: true,
                due_date: Some(renewed.due_date),
                renewals: Some(renewed.renewal_count),
                version: Some(catalog.version),
                ..Default::default()
            })
        }
        _ => Err(DomainError::UnknownOp),
    }
}

fn outcome_to_reply(outcome: OperationOutcome) -> Reply {
    match outcome {
        Ok(reply) => reply,
        Err(e) => Reply::err(e.reason()),
    }
}

/// Write the primary snapshot synchronously (the reply does not go out
/// until this completes) and hand the backup write to a detached task, per
/// spec §5's "the backup write never blocks the client-visible reply".
async fn persist(catalog: &Catalog, primary_path: &std::path::Path, backup_path: &std::path::Path) {
    if let Err(e) = crate::persistence::save_snapshot(primary_path, catalog).await {
        error!(error = %e, path = %primary_path.display(), "failed to write primary snapshot");
    }
    let catalog = catalog.clone();
    let backup_path = backup_path.to_path_buf();
    tokio::spawn(async move {
        if let Err(e) = crate::persistence::save_snapshot(&backup_path, &catalog).await {
            error!(error = %e, path = %backup_path.display(), "failed to write backup snapshot");
        }
    });
}
