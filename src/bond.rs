#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondOrder {
    pub fn valence(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

/// Bond of a molecular graph.
///
/// Aromatic bonds keep the Kekulé order they were written with (single for
/// lowercase SMILES input) and carry `is_aromatic = true`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    pub is_aromatic: bool,
}

impl Bond {
    pub fn new(order: BondOrder) -> Self {
        Self {
            order,
            is_aromatic: false,
        }
    }

    pub fn aromatic() -> Self {
        Self {
            order: BondOrder::Single,
            is_aromatic: true,
        }
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}

impl crate::traits::HasAromaticity for Bond {
    fn is_aromatic(&self) -> bool {
        self.is_aromatic
    }
}
