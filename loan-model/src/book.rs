use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// An active loan of one copy of a [`Book`] to one patron.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub user_id: UserId,
    pub loan_date: NaiveDate,
    pub due_date: NaiveDate,
    /// 0 ≤ renewal_count ≤ 2 (invariant I2).
    pub renewal_count: u8,
}

/// A catalog entry. `loans` is indexed by `user_id` (spec §9: per-(book,user)
/// indexing is a SHOULD for large catalogs; we do it from the start since the
/// index is free to carry and keeps PRESTAMO/DEVOLUCION/RENOVACION O(1)
/// instead of a linear scan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub code: crate::ids::BookCode,
    pub title: String,
    pub author: String,
    pub total_copies: u32,
    pub available_copies: u32,
    pub loans: IndexMap<UserId, Loan>,
}

impl Book {
    pub fn new(
        code: impl Into<crate::ids::BookCode>,
        title: impl Into<String>,
        author: impl Into<String>,
        total_copies: u32,
    ) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            author: author.into(),
            total_copies,
            available_copies: total_copies,
            loans: IndexMap::new(),
        }
    }

    /// Invariant I1: available_copies = total_copies - |loans|.
    pub fn check_invariants(&self) -> bool {
        self.available_copies as usize + self.loans.len() == self.total_copies as usize
            && self.loans.values().all(|l| l.renewal_count <= 2)
    }
}
