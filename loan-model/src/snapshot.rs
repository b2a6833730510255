//! The on-disk / over-the-wire snapshot format (spec §6): `{version, libros}`
//! with Spanish field names carried over unchanged from the source system so
//! existing snapshot files and the catch-up wire format stay compatible.

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::book::{Book, Loan};
use crate::catalog::Catalog;
use crate::ids::{BookCode, UserId};

#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u64,
    pub libros: Vec<LibroSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LibroSnapshot {
    pub codigo: String,
    pub titulo: String,
    pub autor: String,
    pub ejemplares_totales: u32,
    pub ejemplares_disponibles: u32,
    pub prestamos: Vec<PrestamoSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrestamoSnapshot {
    pub usuario_id: String,
    pub fecha_prestamo: NaiveDate,
    pub fecha_entrega: NaiveDate,
    pub renovaciones: u8,
}

impl From<&Catalog> for Snapshot {
    fn from(catalog: &Catalog) -> Self {
        Snapshot {
            version: catalog.version,
            libros: catalog
                .books
                .values()
                .map(|b| LibroSnapshot {
                    codigo: b.code.as_str().to_string(),
                    titulo: b.title.clone(),
                    autor: b.author.clone(),
                    ejemplares_totales: b.total_copies,
                    ejemplares_disponibles: b.available_copies,
                    prestamos: b
                        .loans
                        .values()
                        .map(|l| PrestamoSnapshot {
                            usuario_id: l.user_id.as_str().to_string(),
                            fecha_prestamo: l.loan_date,
                            fecha_entrega: l.due_date,
                            renovaciones: l.renewal_count,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl From<Snapshot> for Catalog {
    fn from(snap: Snapshot) -> Self {
        let mut books = IndexMap::new();
        for lib in snap.libros {
            let mut loans = IndexMap::new();
            for p in lib.prestamos {
                let user_id = UserId(p.usuario_id);
                loans.insert(
                    user_id.clone(),
                    Loan {
                        user_id,
                        loan_date: p.fecha_prestamo,
                        due_date: p.fecha_entrega,
                        renewal_count: p.renovaciones,
                    },
                );
            }
            let code = BookCode(lib.codigo);
            books.insert(
                code.clone(),
                Book {
                    code,
                    title: lib.titulo,
                    author: lib.autor,
                    total_copies: lib.ejemplares_totales,
                    available_copies: lib.ejemplares_disponibles,
                    loans,
                },
            );
        }
        Catalog {
            version: snap.version,
            books,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_snapshot_round_trip_is_lossless() {
        let mut c = Catalog::empty();
        c.books
            .insert(BookCode::from("L0001"), Book::new("L0001", "Dune", "Herbert", 3));
        c.prestamo(
            &"L0001".into(),
            &"U0001".into(),
            NaiveDate::parse_from_str("2025-11-20", "%Y-%m-%d").unwrap(),
        )
        .unwrap();

        let snap = Snapshot::from(&c);
        let json = serde_json::to_string(&snap).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        let round_tripped: Catalog = parsed.into();

        assert_eq!(round_tripped, c);
    }
}
