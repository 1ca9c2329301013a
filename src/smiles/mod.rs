mod builder;
pub mod error;
mod parse_tree;
mod tokenizer;

use crate::aromaticity;
use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
pub use error::SmilesError;

/// Parses SMILES into a heavy-atom graph exactly as written: no aromaticity
/// perception, hydrogens folded into counts.
pub fn parse_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    if tokens.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tree = parse_tree::build_parse_tree(&tokens)?;
    Ok(builder::build_mol(&tree))
}

/// Parses SMILES and perceives aromaticity, so Kekulé and lowercase
/// spellings of the same compound produce the same atom flags.
///
/// ```
/// use groupfrag::from_smiles;
///
/// let kekule = from_smiles("CC1=CC=CC=C1").unwrap();
/// let aromatic = from_smiles("Cc1ccccc1").unwrap();
/// let flags = |m: &groupfrag::Mol<groupfrag::Atom, groupfrag::Bond>| {
///     m.atoms().map(|i| m.atom(i).is_aromatic).collect::<Vec<_>>()
/// };
/// assert_eq!(flags(&kekule), flags(&aromatic));
/// ```
pub fn from_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let mut mol = parse_smiles(s)?;
    aromaticity::perceive(&mut mol);
    Ok(mol)
}
