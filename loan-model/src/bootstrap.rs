//! The synthetic-catalog generator is an explicit Non-goal (spec §1): it is
//! treated as an external collaborator and is not reimplemented here. This
//! module provides only the minimal seed a fresh site needs to start serving
//! requests when neither a primary nor a backup snapshot exists on disk.

use crate::book::Book;
use crate::catalog::Catalog;
use crate::ids::BookCode;

/// A small fixed seed catalog at version 0, used only when a site has never
/// persisted anything (spec §4.5 startup step 3).
pub fn synthetic_catalog() -> Catalog {
    let mut catalog = Catalog::empty();
    let seed: &[(&str, &str, &str, u32)] = &[
        ("L0001", "Cien años de soledad", "Gabriel García Márquez", 3),
        ("L0002", "Ficciones", "Jorge Luis Borges", 2),
        ("L0003", "Rayuela", "Julio Cortázar", 2),
        ("L0004", "Pedro Páramo", "Juan Rulfo", 1),
        ("L0005", "La casa de los espíritus", "Isabel Allende", 4),
    ];
    for (code, title, author, copies) in seed {
        catalog
            .books
            .insert(BookCode::from(*code), Book::new(*code, *title, *author, *copies));
    }
    catalog
}
