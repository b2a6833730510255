use thiserror::Error;

/// Deterministic, recoverable-by-caller rejections from the storage engine.
///
/// Each variant's `reason` string is exactly what travels in the wire
/// `Reply.reason` field (spec's error kinds, §7), so `Display` is the wire
/// encoding, not just a debugging aid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("LIBRO_NO_EXISTE")]
    LibroNoExiste,
    #[error("SIN_EJEMPLARES")]
    SinEjemplares,
    #[error("YA_TIENE_PRESTAMO")]
    YaTienePrestamo,
    #[error("NO_TIENE_PRESTAMO")]
    NoTienePrestamo,
    #[error("MAX_RENOVACIONES")]
    MaxRenovaciones,
    #[error("UNKNOWN_OP")]
    UnknownOp,
}

impl DomainError {
    /// The stable wire token for this rejection (see spec §7).
    pub fn reason(&self) -> &'static str {
        match self {
            Self::LibroNoExiste => "LIBRO_NO_EXISTE",
            Self::SinEjemplares => "SIN_EJEMPLARES",
            Self::YaTienePrestamo => "YA_TIENE_PRESTAMO",
            Self::NoTienePrestamo => "NO_TIENE_PRESTAMO",
            Self::MaxRenovaciones => "MAX_RENOVACIONES",
            Self::UnknownOp => "UNKNOWN_OP",
        }
    }
}
