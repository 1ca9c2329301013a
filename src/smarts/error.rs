use thiserror::Error;

/// Errors produced when parsing a SMARTS pattern string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmartsError {
    #[error("empty SMARTS string")]
    EmptyInput,
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    /// A bracket atom `[` was opened but never closed with `]`.
    #[error("unclosed bracket starting at position {pos}")]
    UnclosedBracket { pos: usize },
    #[error("unclosed ring {digit}")]
    UnclosedRing { digit: u16 },
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    /// An `#n` atomic number specifier could not be parsed.
    #[error("invalid atomic number at position {pos}")]
    InvalidAtomicNum { pos: usize },
    /// A recursive SMARTS `$( ... )` was opened but never closed.
    #[error("unclosed recursive SMARTS at position {pos}")]
    UnclosedRecursive { pos: usize },
    #[error("invalid SMARTS at position {pos}: {msg}")]
    InvalidSmarts { pos: usize, msg: String },
}
