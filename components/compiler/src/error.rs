//! Compile error helpers

use crate::token::{Token, TokenKind};
use core_types::Diagnostic;

/// Build a diagnostic reported at `token`
pub fn diagnostic_at(token: &Token<'_>, message: impl Into<String>) -> Diagnostic {
    let location = match token.kind {
        TokenKind::Eof => " at end".to_string(),
        // Scanner errors carry the message as lexeme; there is nothing to quote.
        TokenKind::Error => String::new(),
        _ => format!(" at '{}'", token.lexeme),
    };
    Diagnostic {
        line: token.line,
        location,
        message: message.into(),
    }
}
