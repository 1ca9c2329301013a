//! Read-only views of atom and bond payloads. Perception and formula code
//! is written against these so it works for any `Mol<A, B>`.

use crate::bond::BondOrder;

pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

pub trait HasFormalCharge {
    fn formal_charge(&self) -> i8;
}

/// Hydrogens folded into a heavy atom (implicit plus bracket `H`).
pub trait HasHydrogenCount {
    fn hydrogen_count(&self) -> u8;
}

/// Shared by atoms and bonds.
pub trait HasAromaticity {
    fn is_aromatic(&self) -> bool;
}

pub trait HasBondOrder {
    fn bond_order(&self) -> BondOrder;
}
