//! Error types for the Gridcalc engine.

use thiserror::Error;

/// Errors produced while reading formulas and cell ids.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("syntax error at position {position}: {message}")]
    Syntax { message: String, position: usize },

    #[error("invalid cell reference: {0}")]
    InvalidCell(String),
}

impl EngineError {
    pub(crate) fn syntax(message: impl Into<String>, position: usize) -> Self {
        EngineError::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Protocol-neutral error code, e.g. `SYNTAX`.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Syntax { .. } => "SYNTAX",
            EngineError::InvalidCell(_) => "BAD_REQ",
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
