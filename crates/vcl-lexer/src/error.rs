//! Error types for the VCL lexer.
//!
//! The lexer itself never fails: unrecognized or unterminated input becomes
//! an error token the parser turns into a diagnostic. These types classify
//! what went wrong inside such a token.

use thiserror::Error;

/// Lexical problems carried by error tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerError {
    /// Unterminated string literal
    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    /// Unterminated block comment
    #[error("unterminated block comment starting at offset {offset}")]
    UnterminatedComment { offset: usize },

    /// Unterminated inline source block
    #[error("unterminated inline source block starting at offset {offset}")]
    UnterminatedInlineSource { offset: usize },

    /// Unexpected character
    #[error("unrecognized character '{ch}' at offset {offset}")]
    UnrecognizedChar { ch: char, offset: usize },
}

impl LexerError {
    /// Byte offset where the problem starts.
    pub fn offset(&self) -> usize {
        match self {
            LexerError::UnterminatedString { offset }
            | LexerError::UnterminatedComment { offset }
            | LexerError::UnterminatedInlineSource { offset }
            | LexerError::UnrecognizedChar { offset, .. } => *offset,
        }
    }
}
