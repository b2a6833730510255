use chrono::{Duration, NaiveDate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::book::{Book, Loan};
use crate::error::DomainError;
use crate::ids::{BookCode, UserId};

const LOAN_PERIOD_DAYS: i64 = 14;
const RENEWAL_PERIOD_DAYS: i64 = 7;
const MAX_RENEWALS: u8 = 2;

/// The versioned set of books a site's storage engine owns.
///
/// `version` increments by exactly 1 on every accepted mutation (I3); reads
/// never bump it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub version: u64,
    pub books: IndexMap<BookCode, Book>,
}

/// Result of a successful PRESTAMO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanGranted {
    pub due_date: NaiveDate,
}

/// Result of a successful RENOVACION.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewalGranted {
    pub due_date: NaiveDate,
    pub renewal_count: u8,
}

impl Catalog {
    pub fn empty() -> Self {
        Self {
            version: 0,
            books: IndexMap::new(),
        }
    }

    pub fn find(&self, code: &BookCode) -> Option<&Book> {
        self.books.get(code)
    }

    /// PRESTAMO: grant a loan of `book_code` to `user_id` as of `as_of_date`.
    ///
    /// Fails with `LibroNoExiste`, `SinEjemplares`, or `YaTienePrestamo`
    /// without mutating state or incrementing version (P5).
    pub fn prestamo(
        &mut self,
        book_code: &BookCode,
        user_id: &UserId,
        as_of_date: NaiveDate,
    ) -> Result<LoanGranted, DomainError> {
        let book = self
            .books
            .get_mut(book_code)
            .ok_or(DomainError::LibroNoExiste)?;

        if book.available_copies == 0 {
            return Err(DomainError::SinEjemplares);
        }
        if book.loans.contains_key(user_id) {
            return Err(DomainError::YaTienePrestamo);
        }

        let due_date = as_of_date + Duration::days(LOAN_PERIOD_DAYS);
        book.loans.insert(
            user_id.clone(),
            Loan {
                user_id: user_id.clone(),
                loan_date: as_of_date,
                due_date,
                renewal_count: 0,
            },
        );
        book.available_copies -= 1;
        self.version += 1;

        Ok(LoanGranted { due_date })
    }

    /// DEVOLUCION: release `user_id`'s loan on `book_code`.
    pub fn devolucion(
        &mut self,
        book_code: &BookCode,
        user_id: &UserId,
    ) -> Result<(), DomainError> {
        let book = self
            .books
            .get_mut(book_code)
            .ok_or(DomainError::LibroNoExiste)?;

        if book.loans.shift_remove(user_id).is_none() {
            return Err(DomainError::NoTienePrestamo);
        }
        book.available_copies += 1;
        self.version += 1;
        Ok(())
    }

    /// RENOVACION: extend `user_id`'s loan on `book_code` by one week.
    ///
    /// Fails with `MaxRenovaciones` once `renewal_count` has reached 2,
    /// without mutating state (invariant I2 caps renewal_count at 2).
    pub fn renovacion(
        &mut self,
        book_code: &BookCode,
        user_id: &UserId,
        as_of_date: NaiveDate,
    ) -> Result<RenewalGranted, DomainError> {
        let book = self
            .books
            .get_mut(book_code)
            .ok_or(DomainError::LibroNoExiste)?;

        let loan = book
            .loans
            .get_mut(user_id)
            .ok_or(DomainError::NoTienePrestamo)?;

        if loan.renewal_count >= MAX_RENEWALS {
            return Err(DomainError::MaxRenovaciones);
        }

        loan.due_date = as_of_date + Duration::days(RENEWAL_PERIOD_DAYS);
        loan.renewal_count += 1;
        self.version += 1;

        Ok(RenewalGranted {
            due_date: loan.due_date,
            renewal_count: loan.renewal_count,
        })
    }

    /// All per-book invariants hold (used by tests and by the catch-up path
    /// to sanity-check an adopted peer snapshot).
    pub fn check_invariants(&self) -> bool {
        self.books.values().all(Book::check_invariants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn catalog_with_book(total: u32) -> Catalog {
        let mut c = Catalog::empty();
        c.books
            .insert(BookCode::from("L0001"), Book::new("L0001", "T", "A", total));
        c
    }

    #[test]
    fn happy_loan() {
        let mut c = catalog_with_book(2);
        let granted = c
            .prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        assert_eq!(granted.due_date, date("2025-12-04"));
        assert_eq!(c.version, 1);
        assert_eq!(c.find(&"L0001".into()).unwrap().available_copies, 1);
    }

    #[test]
    fn double_loan_rejected_without_mutation() {
        let mut c = catalog_with_book(2);
        c.prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        let before = c.clone();
        let err = c
            .prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-21"))
            .unwrap_err();
        assert_eq!(err, DomainError::YaTienePrestamo);
        assert_eq!(c, before);
    }

    #[test]
    fn sin_ejemplares() {
        let mut c = catalog_with_book(1);
        c.prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        let err = c
            .prestamo(&"L0001".into(), &"U0002".into(), date("2025-11-20"))
            .unwrap_err();
        assert_eq!(err, DomainError::SinEjemplares);
    }

    #[test]
    fn renewal_cap_at_two() {
        let mut c = catalog_with_book(2);
        c.prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        c.renovacion(&"L0001".into(), &"U0001".into(), date("2025-12-01"))
            .unwrap();
        c.renovacion(&"L0001".into(), &"U0001".into(), date("2025-12-08"))
            .unwrap();
        let err = c
            .renovacion(&"L0001".into(), &"U0001".into(), date("2025-12-15"))
            .unwrap_err();
        assert_eq!(err, DomainError::MaxRenovaciones);
        let loan = &c.find(&"L0001".into()).unwrap().loans[&UserId::from("U0001")];
        assert_eq!(loan.renewal_count, 2);
    }

    #[test]
    fn renewal_extends_by_seven_days() {
        let mut c = catalog_with_book(2);
        c.prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        let r = c
            .renovacion(&"L0001".into(), &"U0001".into(), date("2025-12-04"))
            .unwrap();
        assert_eq!(r.due_date, date("2025-12-11"));
        assert_eq!(r.renewal_count, 1);
    }

    #[test]
    fn round_trip_loan_then_return_restores_availability() {
        let mut c = catalog_with_book(2);
        let before_available = c.find(&"L0001".into()).unwrap().available_copies;
        c.prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        c.devolucion(&"L0001".into(), &"U0001".into()).unwrap();
        let book = c.find(&"L0001".into()).unwrap();
        assert_eq!(book.available_copies, before_available);
        assert!(!book.loans.contains_key(&UserId::from("U0001")));
    }

    #[test]
    fn missing_book_and_missing_loan_errors() {
        let mut c = catalog_with_book(2);
        assert_eq!(
            c.prestamo(&"L9999".into(), &"U0001".into(), date("2025-11-20"))
                .unwrap_err(),
            DomainError::LibroNoExiste
        );
        assert_eq!(
            c.devolucion(&"L0001".into(), &"U0001".into()).unwrap_err(),
            DomainError::NoTienePrestamo
        );
        assert_eq!(
            c.renovacion(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
                .unwrap_err(),
            DomainError::NoTienePrestamo
        );
    }

    #[test]
    fn every_mutation_increments_version_by_exactly_one() {
        let mut c = catalog_with_book(3);
        let v0 = c.version;
        c.prestamo(&"L0001".into(), &"U0001".into(), date("2025-11-20"))
            .unwrap();
        assert_eq!(c.version, v0 + 1);
        c.renovacion(&"L0001".into(), &"U0001".into(), date("2025-11-21"))
            .unwrap();
        assert_eq!(c.version, v0 + 2);
        c.devolucion(&"L0001".into(), &"U0001".into()).unwrap();
        assert_eq!(c.version, v0 + 3);
    }
}
