use crate::element::Element;

/// Heavy atom of a molecular graph.
///
/// Hydrogens are never graph nodes: the SMILES reader folds them into
/// [`hydrogen_count`](Atom::hydrogen_count), so node indices address heavy
/// atoms only. Group atom sets are expressed in these indices.
///
/// # Examples
///
/// ```
/// use groupfrag::Atom;
///
/// let methyl = Atom {
///     atomic_num: 6,
///     hydrogen_count: 3,
///     ..Atom::default()
/// };
/// assert_eq!(methyl.symbol(), "C");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (6 = C, 7 = N, 8 = O, ...).
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Mass number. `0` means natural abundance.
    pub isotope: u16,
    /// Number of attached hydrogens.
    pub hydrogen_count: u8,
    /// Set by aromaticity perception or by lowercase SMILES input.
    pub is_aromatic: bool,
}

impl Atom {
    pub fn element(&self) -> Option<Element> {
        Element::from_atomic_num(self.atomic_num)
    }

    /// Element symbol, `"*"` for wildcard or unknown atoms.
    pub fn symbol(&self) -> &'static str {
        self.element().map(Element::symbol).unwrap_or("*")
    }
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.hydrogen_count
    }
}

impl crate::traits::HasAromaticity for Atom {
    fn is_aromatic(&self) -> bool {
        self.is_aromatic
    }
}
