use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{AtomToken, BondToken, Token};

#[derive(Debug, Clone)]
pub struct ParseAtom {
    pub token: AtomToken,
    pub neighbors: Vec<Neighbor>,
}

impl ParseAtom {
    /// A plain `[H]` attached to exactly one atom; folded into that atom's
    /// hydrogen count by the builder.
    pub fn is_foldable_hydrogen(&self) -> bool {
        let t = &self.token;
        t.element == Some(crate::element::Element::H)
            && t.isotope == 0
            && t.charge == 0
            && t.hcount.unwrap_or(0) == 0
            && self.neighbors.len() == 1
    }
}

#[derive(Debug, Clone)]
pub struct Neighbor {
    pub bond: Option<BondToken>,
    pub atom_idx: usize,
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    pub atoms: Vec<ParseAtom>,
}

struct OpenRing {
    atom: usize,
    bond: Option<BondToken>,
}

pub fn build_parse_tree(tokens: &[Token]) -> Result<ParseTree, SmilesError> {
    let mut atoms: Vec<ParseAtom> = Vec::new();
    let mut branches: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut pending_bond: Option<(BondToken, usize)> = None;
    let mut open_rings: Vec<Option<OpenRing>> = (0..100).map(|_| None).collect();

    for token in tokens {
        match token {
            Token::Atom(atom_tok) => {
                let idx = atoms.len();
                atoms.push(ParseAtom {
                    token: atom_tok.clone(),
                    neighbors: Vec::new(),
                });
                let bond = pending_bond.take().map(|(b, _)| b);
                if let Some(cur) = current {
                    connect(&mut atoms, cur, idx, bond);
                }
                current = Some(idx);
            }
            Token::Bond { bond, pos } => {
                if pending_bond.is_some() || current.is_none() {
                    return Err(SmilesError::DanglingBond { pos: *pos });
                }
                pending_bond = Some((*bond, *pos));
            }
            Token::RingClosure { bond, digit, pos } => {
                let cur = current.ok_or(SmilesError::InvalidRingBond {
                    digit: *digit,
                    pos: *pos,
                })?;
                let slot = &mut open_rings[*digit as usize];
                match slot.take() {
                    Some(open) => {
                        let ring_bond = match (*bond, open.bond) {
                            (Some(b1), Some(b2)) if b1 != b2 => {
                                return Err(SmilesError::RingBondConflict { digit: *digit })
                            }
                            (b1, b2) => b1.or(b2),
                        };
                        let already_bonded = open.atom == cur
                            || atoms[cur].neighbors.iter().any(|n| n.atom_idx == open.atom);
                        if already_bonded {
                            return Err(SmilesError::DuplicateBond { digit: *digit });
                        }
                        connect(&mut atoms, open.atom, cur, ring_bond);
                    }
                    None => {
                        *slot = Some(OpenRing {
                            atom: cur,
                            bond: *bond,
                        });
                    }
                }
            }
            Token::OpenParen(pos) => {
                let cur = current.ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                branches.push((cur, *pos));
            }
            Token::CloseParen(pos) => {
                if let Some((_, bond_pos)) = pending_bond {
                    return Err(SmilesError::DanglingBond { pos: bond_pos });
                }
                let (anchor, _) = branches
                    .pop()
                    .ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                current = Some(anchor);
            }
            Token::Dot(_) => {
                current = None;
                pending_bond = None;
            }
        }
    }

    if let Some((_, pos)) = pending_bond {
        return Err(SmilesError::DanglingBond { pos });
    }
    if let Some(&(_, pos)) = branches.last() {
        return Err(SmilesError::UnmatchedParen { pos });
    }
    if let Some(digit) = open_rings.iter().position(Option::is_some) {
        return Err(SmilesError::UnclosedRing {
            digit: digit as u16,
        });
    }

    Ok(ParseTree { atoms })
}

fn connect(atoms: &mut [ParseAtom], a: usize, b: usize, bond: Option<BondToken>) {
    atoms[a].neighbors.push(Neighbor { bond, atom_idx: b });
    atoms[b].neighbors.push(Neighbor { bond, atom_idx: a });
}
