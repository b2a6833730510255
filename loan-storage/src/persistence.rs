//! Snapshot persistence and startup recovery.
//!
//! Grounded on `sequencer/src/persistence.rs`'s load-then-reconcile shape,
//! adapted to the source system's concrete recovery cascade
//! (`gestor_almacenamiento/ga.py`'s `cargar_datos`): try the primary file,
//! fall back to the backup, and only if neither exists fall back to a fresh
//! seed catalog.

use std::path::Path;

use loan_model::snapshot::Snapshot;
use loan_model::Catalog;
use tokio::fs;
use tracing::{info, warn};

/// Where a site's starting catalog came from, for startup logging (an
/// ambient-stack addition; the source system logged this cascade on stdout,
/// this crate logs it structured instead).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySource {
    Primary,
    Backup,
    Bootstrap,
}

impl RecoverySource {
    fn label(self) -> &'static str {
        match self {
            RecoverySource::Primary => "primary snapshot",
            RecoverySource::Backup => "backup snapshot (primary was missing or unreadable)",
            RecoverySource::Bootstrap => "synthetic bootstrap catalog (no snapshot found)",
        }
    }
}

/// Atomically write `catalog` as JSON to `path`: write to a sibling temp
/// file, then rename over the destination. The rename is the durability
/// boundary a reader can rely on — a crash mid-write never leaves a
/// truncated or partially-written snapshot in place.
pub async fn save_snapshot(path: &Path, catalog: &Catalog) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let snapshot = Snapshot::from(catalog);
    let json = serde_json::to_vec_pretty(&snapshot)?;

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

async fn load_snapshot(path: &Path) -> anyhow::Result<Catalog> {
    let bytes = fs::read(path).await?;
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    Ok(Catalog::from(snapshot))
}

/// Recover a site's starting catalog: primary snapshot, then backup
/// snapshot, then a synthetic bootstrap. Every step that fails is logged and
/// falls through to the next rather than aborting startup.
pub async fn recover(primary_path: &Path, backup_path: &Path) -> (Catalog, RecoverySource) {
    match load_snapshot(primary_path).await {
        Ok(catalog) => {
            log_recovered(RecoverySource::Primary, &catalog);
            return (catalog, RecoverySource::Primary);
        }
        Err(e) => warn!(
            path = %primary_path.display(),
            error = %e,
            "primary snapshot unavailable, falling back to backup"
        ),
    }

    match load_snapshot(backup_path).await {
        Ok(catalog) => {
            log_recovered(RecoverySource::Backup, &catalog);
            // Adopt the backup and immediately re-establish it as the
            // primary (spec §4.5 startup step 2), so a second consecutive
            // failure of the primary disk doesn't lose it again.
            if let Err(e) = save_snapshot(primary_path, &catalog).await {
                warn!(
                    path = %primary_path.display(),
                    error = %e,
                    "failed to re-persist recovered backup snapshot as primary"
                );
            }
            return (catalog, RecoverySource::Backup);
        }
        Err(e) => warn!(
            path = %backup_path.display(),
            error = %e,
            "backup snapshot unavailable, falling back to bootstrap catalog"
        ),
    }

    let catalog = loan_model::bootstrap::synthetic_catalog();
    log_recovered(RecoverySource::Bootstrap, &catalog);
    (catalog, RecoverySource::Bootstrap)
}

fn log_recovered(source: RecoverySource, catalog: &Catalog) {
    info!(
        source = source.label(),
        version = catalog.version,
        books = catalog.books.len(),
        "recovered starting catalog"
    );
}
