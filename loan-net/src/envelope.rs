use chrono::NaiveDate;
use loan_model::snapshot::Snapshot;
use serde::{Deserialize, Serialize};

pub const OP_PRESTAMO: &str = "prestamo";
pub const OP_DEVOLUCION: &str = "devolucion";
pub const OP_RENOVACION: &str = "renovacion";
/// Operation name used on the LG -> Loan Actor hop (spec §4.2: "LG composes
/// `{operation:"loan", ...}`").
pub const OP_LOAN: &str = "loan";
/// Bulk catch-up read (spec §9's design-level "engine-to-engine read"); not
/// part of the source system, added for peer convergence.
pub const OP_SYNC_PULL: &str = "sync_pull";

/// The `payload` of a domain operation request (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub book_code: String,
    pub user_id: String,
    pub as_of_date: NaiveDate,
}

/// The common wire envelope (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<u8>,
}

impl Envelope {
    pub fn domain(operation: &str, payload: Payload) -> Self {
        Self {
            operation: operation.to_string(),
            payload: Some(payload),
            use_backup: None,
            site: None,
        }
    }

    pub fn loan(payload: Payload, use_backup: bool) -> Self {
        Self {
            operation: OP_LOAN.to_string(),
            payload: Some(payload),
            use_backup: Some(use_backup),
            site: None,
        }
    }

    pub fn sync_pull() -> Self {
        Self {
            operation: OP_SYNC_PULL.to_string(),
            payload: None,
            use_backup: None,
            site: None,
        }
    }
}

/// The reply envelope (spec §6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Reply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renewals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Default::default()
        }
    }

    pub fn err(reason: &str) -> Self {
        Self {
            ok: false,
            reason: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn queued(kind: &str) -> Self {
        Self {
            ok: true,
            r#type: Some(kind.to_string()),
            message: Some("queued".to_string()),
            ..Default::default()
        }
    }
}
