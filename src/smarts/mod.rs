mod error;
mod parser;
pub mod query;

pub use error::SmartsError;
pub use query::{AtomExpr, BondExpr};

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
use crate::rings::RingInfo;
use crate::substruct::{get_substruct_match_with, get_substruct_matches_with, AtomMapping};

pub type QueryMol = Mol<AtomExpr, BondExpr>;

/// A molecule prepared for repeated SMARTS queries: ring perception runs
/// once here instead of once per pattern.
#[derive(Debug, Clone)]
pub struct Target {
    mol: Mol<Atom, Bond>,
    ring_info: RingInfo,
}

impl Target {
    pub fn new(mol: Mol<Atom, Bond>) -> Self {
        let ring_info = RingInfo::sssr(&mol);
        Self { mol, ring_info }
    }

    pub fn mol(&self) -> &Mol<Atom, Bond> {
        &self.mol
    }

    pub fn ring_info(&self) -> &RingInfo {
        &self.ring_info
    }

    pub fn into_mol(self) -> Mol<Atom, Bond> {
        self.mol
    }
}

impl From<Mol<Atom, Bond>> for Target {
    fn from(mol: Mol<Atom, Bond>) -> Self {
        Self::new(mol)
    }
}

pub fn from_smarts(s: &str) -> Result<QueryMol, SmartsError> {
    parser::parse(s)
}

pub fn has_smarts_match(target: &Target, query: &QueryMol) -> bool {
    get_substruct_match_with(
        target.mol(),
        query,
        |t, q| query.atom(q).matches(target, t),
        |t, q| query.bond(q).matches(target, t),
    )
    .is_some()
}

/// Every embedding, including those that differ only by a symmetry of
/// the query.
pub fn get_smarts_matches(target: &Target, query: &QueryMol) -> Vec<AtomMapping> {
    get_substruct_matches_with(
        target.mol(),
        query,
        |t, q| query.atom(q).matches(target, t),
        |t, q| query.bond(q).matches(target, t),
    )
}

/// Distinct matched atom sets, each sorted, in ascending order.
pub fn get_unique_smarts_matches(target: &Target, query: &QueryMol) -> Vec<Vec<NodeIndex>> {
    let sets: BTreeSet<Vec<NodeIndex>> = get_smarts_matches(target, query)
        .into_iter()
        .map(|mapping| {
            let mut atoms: Vec<NodeIndex> = mapping.into_iter().map(|(_, t)| t).collect();
            atoms.sort_unstable();
            atoms
        })
        .collect();
    sets.into_iter().collect()
}
