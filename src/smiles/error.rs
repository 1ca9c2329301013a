use thiserror::Error;

/// Errors produced when parsing a SMILES string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmilesError {
    /// The input string was empty or contained only whitespace.
    #[error("empty SMILES string")]
    EmptyInput,
    /// An unexpected character was encountered at the given position.
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    /// An unrecognized element symbol was found.
    #[error("invalid element '{text}' at position {pos}")]
    InvalidElement { pos: usize, text: String },
    /// A bracket atom `[` was opened but never closed with `]`.
    #[error("unclosed bracket atom starting at position {pos}")]
    UnclosedBracket { pos: usize },
    /// A ring-opening digit was never matched by a ring-closing digit.
    #[error("unclosed ring {digit}")]
    UnclosedRing { digit: u16 },
    /// A parenthesis was opened without a matching close, or vice versa.
    #[error("unmatched parenthesis at position {pos}")]
    UnmatchedParen { pos: usize },
    /// A charge specifier inside a bracket atom could not be parsed.
    #[error("invalid charge at position {pos}")]
    InvalidCharge { pos: usize },
    /// A ring-closure digit appeared before any atom.
    #[error("ring closure {digit} at position {pos} has no preceding atom")]
    InvalidRingBond { digit: u16, pos: usize },
    /// Two ring-closure bonds on the same digit specify conflicting bond types.
    #[error("conflicting bond types on ring closure {digit}")]
    RingBondConflict { digit: u16 },
    /// A ring closure would bond an atom to itself or duplicate an existing bond.
    #[error("ring closure {digit} duplicates an existing bond")]
    DuplicateBond { digit: u16 },
    /// A bond symbol with no atom after it.
    #[error("bond at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },
    /// Valid SMILES syntax this reader does not model (e.g. quadruple bonds).
    #[error("unsupported SMILES feature '{feature}' at position {pos}")]
    Unsupported { pos: usize, feature: &'static str },
}
