//! Group-contribution fragmentation of molecules for UNIFAC, PSRK,
//! Constantinou-Gani and Joback.
//!
//! A molecule is read from SMILES into a petgraph-backed [`Mol`], matched
//! against a [`Catalog`] of SMARTS-defined groups, and resolved into an
//! exact cover of its heavy atoms. The resulting group counts feed the
//! estimators in [`properties`].

pub mod aromaticity;
pub mod atom;
pub mod bond;
pub mod catalog;
pub mod element;
pub mod formula;
pub mod fragment;
pub mod mol;
pub mod properties;
pub mod rings;
pub mod smarts;
pub mod smiles;
pub mod substruct;
pub mod traits;

pub use atom::Atom;
pub use bond::{Bond, BondOrder};
pub use catalog::{Catalog, CatalogError, GroupDefinition, Model};
pub use element::Element;
pub use formula::{average_mol_weight, mol_formula, FormulaError};
pub use fragment::{
    FragmentError, FragmentOptions, Fragmentation, Fragmenter, Identifier, Matcher, NameResolver,
    NameTable, SmartsMatcher, ValidationWarning,
};
pub use mol::Mol;
pub use properties::{Joback, JobackOptions, JobackProperties, PropertyError, UnifacParameters};
pub use rings::RingInfo;
pub use smarts::{from_smarts, SmartsError, Target};
pub use smiles::{from_smiles, parse_smiles, SmilesError};
pub use traits::{HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

/// Result of fragmenting one identifier.
pub type Result<T, E = FragmentError> = std::result::Result<T, E>;
