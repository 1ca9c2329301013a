use thiserror::Error;

use crate::formula::FormulaError;
use crate::smarts::SmartsError;

/// Raised while building a [`Catalog`](super::Catalog) from its table.
///
/// Every variant is a defect in the packaged or caller-supplied data, so a
/// catalog that loads once will never produce one of these again.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("malformed catalog table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("group '{group}' has malformed SMARTS '{smarts}': {source}")]
    Smarts {
        group: String,
        smarts: String,
        #[source]
        source: SmartsError,
    },
    #[error("group '{group}' has a malformed formula: {source}")]
    Formula {
        group: String,
        #[source]
        source: FormulaError,
    },
    #[error("group '{0}' has no SMARTS pattern")]
    NoPatterns(String),
    #[error("group '{0}' is declared more than once")]
    DuplicateGroup(String),
    #[error("main group '{0}' is declared more than once")]
    DuplicateMainGroup(String),
    #[error("{context} refers to unknown group '{name}'")]
    UnknownGroup { context: String, name: String },
    #[error("{context} refers to unknown main group '{name}'")]
    UnknownMainGroup { context: String, name: String },
    #[error("composed group '{group}' has formula {expected} but its constituents add up to {found}")]
    ComposedFormula {
        group: String,
        expected: String,
        found: String,
    },
    #[error("table is for model '{found}', expected '{expected}'")]
    ModelMismatch { expected: String, found: String },
}
