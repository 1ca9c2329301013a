use std::collections::BTreeMap;

use thiserror::Error;

use crate::smiles::SmilesError;

/// Per-molecule failures. Each carries the identifier it was raised for.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FragmentError {
    #[error("cannot parse SMILES '{smiles}': {source}")]
    Smiles {
        smiles: String,
        #[source]
        source: SmilesError,
    },
    #[error("'{name}' is a name but no name resolver is configured")]
    NoResolver { name: String },
    #[error("name '{name}' could not be resolved")]
    UnknownName { name: String },
    #[error("{identifier}: no group covers atoms {uncovered:?}")]
    Incomplete {
        identifier: String,
        uncovered: Vec<usize>,
        partial: BTreeMap<String, u32>,
    },
    #[error("{identifier}: groups {groups:?} match the same atoms {atoms:?}")]
    Ambiguous {
        identifier: String,
        atoms: Vec<usize>,
        groups: Vec<String>,
    },
}
