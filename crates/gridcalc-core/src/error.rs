//! Error types for Gridcalc core.

use thiserror::Error;

use gridcalc_engine::EngineError;
use gridcalc_engine::engine::CellRef;

/// Errors that can occur in the Gridcalc application
#[derive(Error, Debug)]
pub enum GridcalcError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("circular ref involving {0}")]
    CircularRef(CellRef),

    #[error("no formula for cell {0}")]
    NotFound(CellRef),

    #[error("invalid spreadsheet name: {0:?}")]
    InvalidSheetName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl GridcalcError {
    /// Protocol-neutral error code; transports map these onto their own
    /// status values.
    pub fn code(&self) -> &'static str {
        match self {
            GridcalcError::Engine(e) => e.code(),
            GridcalcError::CircularRef(_) => "CIRCULAR_REF",
            GridcalcError::NotFound(_) => "NOT_FOUND",
            GridcalcError::InvalidSheetName(_) => "BAD_REQ",
            GridcalcError::Io(_) | GridcalcError::Parse { .. } => "DB",
        }
    }
}

pub type Result<T> = std::result::Result<T, GridcalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let a1 = CellRef::new(0, 0);
        assert_eq!(GridcalcError::CircularRef(a1.clone()).code(), "CIRCULAR_REF");
        assert_eq!(GridcalcError::NotFound(a1).code(), "NOT_FOUND");
        let invalid: GridcalcError = "A0".parse::<CellRef>().unwrap_err().into();
        assert_eq!(invalid.code(), "BAD_REQ");
        let io: GridcalcError = std::io::Error::other("disk").into();
        assert_eq!(io.code(), "DB");
    }

    #[test]
    fn test_circular_ref_message_names_cell() {
        let err = GridcalcError::CircularRef(CellRef::new(1, 0));
        assert_eq!(err.to_string(), "circular ref involving B1");
    }
}
