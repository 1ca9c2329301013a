use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::bond::BondOrder;
use crate::mol::Mol;
use crate::substruct::get_anchored_match_with;

use super::Target;

/// AST node for a SMARTS atom query expression.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomExpr {
    /// Wildcard `*`.
    True,
    /// Matches by element. `aromatic` is `None` for `#n` (either), `Some(true)`
    /// for lowercase (`c`), `Some(false)` for uppercase (`C`).
    Element {
        atomic_num: u8,
        aromatic: Option<bool>,
    },
    /// `a`
    Aromatic,
    /// `A`
    Aliphatic,
    Isotope(u16),
    /// Heavy-atom neighbour count (`D`).
    Degree(u8),
    /// Degree plus hydrogens (`X`).
    Connectivity(u8),
    /// Hydrogens, implicit and explicit (`H`).
    TotalHCount(u8),
    /// Hydrogens carried on the atom itself (`h`).
    ImplicitHCount(u8),
    /// Number of SSSR rings containing the atom (`Rn`).
    RingMembership(u8),
    /// Size of the smallest SSSR ring containing the atom (`rn`).
    SmallestRingSize(u8),
    /// Number of ring bonds on the atom (`xn`).
    RingBondCount(u8),
    Charge(i8),
    /// `R` or `r` without a count.
    InRing,
    /// `R0`
    NotInRing,
    /// `$(...)`: the atom is the first atom of an embedding of the inner query.
    Recursive(Mol<AtomExpr, BondExpr>),
    /// Atom class (`:n`); always matches.
    AtomMapClass(u16),
    And(Vec<AtomExpr>),
    Or(Vec<AtomExpr>),
    Not(Box<AtomExpr>),
}

/// AST node for a SMARTS bond query expression.
///
/// Implicit bonds default to [`BondExpr::SingleOrAromatic`]. Aromaticity is
/// read from the bond's own flag, so a Kekulé double bond inside a perceived
/// aromatic ring does not match `=`.
#[derive(Debug, Clone, PartialEq)]
pub enum BondExpr {
    /// `~`
    True,
    Single,
    Double,
    Triple,
    Aromatic,
    /// `@`
    Ring,
    SingleOrAromatic,
    And(Vec<BondExpr>),
    Or(Vec<BondExpr>),
    Not(Box<BondExpr>),
}

fn explicit_h_count(target: &Target, idx: NodeIndex) -> u8 {
    let mol = target.mol();
    mol.neighbors(idx)
        .filter(|&nb| mol.atom(nb).atomic_num == 1)
        .count() as u8
}

fn ring_bond_count(target: &Target, idx: NodeIndex) -> u8 {
    target
        .mol()
        .neighbors(idx)
        .filter(|&nb| target.ring_info().is_ring_bond(idx, nb))
        .count() as u8
}

impl AtomExpr {
    pub fn matches(&self, target: &Target, idx: NodeIndex) -> bool {
        let mol = target.mol();
        let atom = mol.atom(idx);
        match self {
            AtomExpr::True => true,
            AtomExpr::Element {
                atomic_num,
                aromatic,
            } => atom.atomic_num == *atomic_num && aromatic.is_none_or(|a| atom.is_aromatic == a),
            AtomExpr::Aromatic => atom.is_aromatic,
            AtomExpr::Aliphatic => !atom.is_aromatic,
            AtomExpr::Isotope(iso) => atom.isotope == *iso,
            AtomExpr::Degree(d) => mol.degree(idx) == usize::from(*d),
            AtomExpr::Connectivity(x) => {
                mol.degree(idx) + usize::from(atom.hydrogen_count) == usize::from(*x)
            }
            AtomExpr::TotalHCount(h) => atom.hydrogen_count + explicit_h_count(target, idx) == *h,
            AtomExpr::ImplicitHCount(h) => atom.hydrogen_count == *h,
            AtomExpr::RingMembership(n) => target.ring_info().ring_count(idx) == *n,
            AtomExpr::SmallestRingSize(r) => match target.ring_info().smallest_ring_size(idx) {
                Some(size) => size == usize::from(*r),
                None => *r == 0,
            },
            AtomExpr::RingBondCount(x) => ring_bond_count(target, idx) == *x,
            AtomExpr::Charge(c) => atom.formal_charge == *c,
            AtomExpr::InRing => target.ring_info().is_ring_atom(idx),
            AtomExpr::NotInRing => !target.ring_info().is_ring_atom(idx),
            AtomExpr::Recursive(inner) => matches_recursive(inner, target, idx),
            AtomExpr::AtomMapClass(_) => true,
            AtomExpr::And(exprs) => exprs.iter().all(|e| e.matches(target, idx)),
            AtomExpr::Or(exprs) => exprs.iter().any(|e| e.matches(target, idx)),
            AtomExpr::Not(expr) => !expr.matches(target, idx),
        }
    }
}

impl BondExpr {
    pub fn matches(&self, target: &Target, edge: EdgeIndex) -> bool {
        let mol = target.mol();
        let bond = mol.bond(edge);
        match self {
            BondExpr::True => true,
            BondExpr::Single => bond.order == BondOrder::Single && !bond.is_aromatic,
            BondExpr::Double => bond.order == BondOrder::Double && !bond.is_aromatic,
            BondExpr::Triple => bond.order == BondOrder::Triple,
            BondExpr::Aromatic => bond.is_aromatic,
            BondExpr::SingleOrAromatic => bond.is_aromatic || bond.order == BondOrder::Single,
            BondExpr::Ring => mol
                .bond_endpoints(edge)
                .is_some_and(|(a, b)| target.ring_info().is_ring_bond(a, b)),
            BondExpr::And(exprs) => exprs.iter().all(|e| e.matches(target, edge)),
            BondExpr::Or(exprs) => exprs.iter().any(|e| e.matches(target, edge)),
            BondExpr::Not(expr) => !expr.matches(target, edge),
        }
    }
}

fn matches_recursive(inner: &Mol<AtomExpr, BondExpr>, target: &Target, idx: NodeIndex) -> bool {
    if inner.atom_count() == 0 {
        return false;
    }
    get_anchored_match_with(
        target.mol(),
        inner,
        idx,
        |t, q| inner.atom(q).matches(target, t),
        |t, q| inner.bond(q).matches(target, t),
    )
    .is_some()
}
