use std::collections::HashSet;

use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::mol::Mol;
use crate::rings::{ring_edges, RingInfo};
use crate::traits::{HasAromaticity, HasAtomicNum, HasBondOrder, HasFormalCharge, HasHydrogenCount};

type EdgeSet = HashSet<(NodeIndex, NodeIndex)>;

/// Marks atoms and bonds of Hückel-aromatic cycles.
///
/// Each SSSR ring is tested on its own; pairs of fused rings that fail
/// individually are then tested as one envelope (azulene-like systems).
/// Flags already present from lowercase input are kept. Afterwards, bonds
/// flagged aromatic but lying outside every ring (an implicit bond between
/// two lowercase atoms, as in `c1ccccc1c1ccccc1`) are demoted to single.
pub fn perceive(mol: &mut Mol<Atom, Bond>) {
    let ring_info = RingInfo::sssr(mol);
    let cycles = find_aromatic_cycles(mol, &ring_info);

    for cycle in &cycles {
        for &(a, b) in cycle {
            mol.atom_mut(a).is_aromatic = true;
            mol.atom_mut(b).is_aromatic = true;
            if let Some(e) = mol.bond_between(a, b) {
                mol.bond_mut(e).is_aromatic = true;
            }
        }
    }

    let bonds: Vec<_> = mol.bonds().collect();
    for e in bonds {
        let Some((a, b)) = mol.bond_endpoints(e) else {
            continue;
        };
        if mol.bond(e).is_aromatic && !ring_info.is_ring_bond(a, b) {
            let bond = mol.bond_mut(e);
            bond.is_aromatic = false;
            bond.order = BondOrder::Single;
        }
    }
}

/// Edge sets of every cycle judged aromatic.
pub fn find_aromatic_cycles<A, B>(mol: &Mol<A, B>, ring_info: &RingInfo) -> Vec<EdgeSet>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount + HasAromaticity,
    B: HasBondOrder + HasAromaticity,
{
    let rings = ring_info.rings();
    let edges: Vec<EdgeSet> = rings.iter().map(|r| ring_edges(r)).collect();
    let mut aromatic: Vec<bool> = edges.iter().map(|e| is_aromatic_cycle(mol, e)).collect();

    let mut envelopes = Vec::new();
    for system in ring_info.fused_systems() {
        for (k, &i) in system.iter().enumerate() {
            for &j in &system[k + 1..] {
                if aromatic[i] || aromatic[j] || edges[i].is_disjoint(&edges[j]) {
                    continue;
                }
                let outer: EdgeSet = edges[i].symmetric_difference(&edges[j]).copied().collect();
                if is_aromatic_cycle(mol, &outer) {
                    aromatic[i] = true;
                    aromatic[j] = true;
                    envelopes.push(edges[i].union(&edges[j]).copied().collect());
                }
            }
        }
    }

    edges
        .into_iter()
        .zip(aromatic)
        .filter_map(|(e, a)| a.then_some(e))
        .chain(envelopes)
        .collect()
}

fn is_aromatic_cycle<A, B>(mol: &Mol<A, B>, cycle: &EdgeSet) -> bool
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount + HasAromaticity,
    B: HasBondOrder + HasAromaticity,
{
    let atoms: HashSet<NodeIndex> = cycle.iter().flat_map(|&(a, b)| [a, b]).collect();
    if atoms.len() < 3 {
        return false;
    }

    let already_flagged = atoms.iter().all(|&a| mol.atom(a).is_aromatic())
        && cycle.iter().all(|&(a, b)| {
            mol.bond_between(a, b)
                .is_some_and(|e| mol.bond(e).is_aromatic())
        });
    if already_flagged {
        return true;
    }

    let mut total: u32 = 0;
    for &atom in &atoms {
        match pi_electrons(mol, atom, cycle) {
            Some(e) => total += u32::from(e),
            None => return false,
        }
    }
    is_huckel(total)
}

/// Electrons an atom donates to the cycle given by `cycle`, or `None` when
/// the atom cannot be part of an aromatic system.
fn pi_electrons<A, B>(mol: &Mol<A, B>, atom_idx: NodeIndex, cycle: &EdgeSet) -> Option<u8>
where
    A: HasAtomicNum + HasFormalCharge + HasHydrogenCount + HasAromaticity,
    B: HasBondOrder + HasAromaticity,
{
    let atom = mol.atom(atom_idx);
    let mut double_in_cycle = false;
    let mut double_exo_carbon = false;
    let mut double_exo_hetero = false;

    for nb in mol.neighbors(atom_idx) {
        let e = mol.bond_between(atom_idx, nb)?;
        let bond = mol.bond(e);
        match bond.bond_order() {
            BondOrder::Triple => return None,
            BondOrder::Double if !bond.is_aromatic() || !atom.is_aromatic() => {
                let key = if atom_idx < nb { (atom_idx, nb) } else { (nb, atom_idx) };
                if cycle.contains(&key) {
                    double_in_cycle = true;
                } else if mol.atom(nb).atomic_num() == 6 {
                    double_exo_carbon = true;
                } else {
                    double_exo_hetero = true;
                }
            }
            _ => {}
        }
    }

    let connections = mol.degree(atom_idx) + usize::from(atom.hydrogen_count());
    let flagged = atom.is_aromatic();

    match (atom.atomic_num(), atom.formal_charge()) {
        (6, 0) => {
            if double_in_cycle || double_exo_carbon {
                Some(1)
            } else if double_exo_hetero {
                Some(0)
            } else if flagged {
                Some(1)
            } else {
                None
            }
        }
        (6, -1) if !double_in_cycle => Some(2),
        (6, 1) => Some(if double_in_cycle { 1 } else { 0 }),
        (7, 0) | (15, 0) => {
            if double_in_cycle {
                Some(1)
            } else if double_exo_hetero || double_exo_carbon {
                None
            } else if connections == 3 {
                Some(2)
            } else if flagged && connections == 2 {
                Some(1)
            } else {
                None
            }
        }
        (7, 1) if double_in_cycle || (flagged && connections == 3) => Some(1),
        (8, 0) | (16, 0) | (34, 0) => {
            if double_in_cycle || double_exo_hetero {
                None
            } else if connections == 2 {
                Some(2)
            } else {
                None
            }
        }
        (8, 1) if double_in_cycle || flagged => Some(1),
        (5, 0) if !double_in_cycle => Some(0),
        _ => None,
    }
}

fn is_huckel(pi_electrons: u32) -> bool {
    pi_electrons >= 2 && (pi_electrons - 2) % 4 == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    fn aromatic_flags(smiles: &str) -> Vec<bool> {
        let mol = from_smiles(smiles).unwrap();
        mol.atoms().map(|i| mol.atom(i).is_aromatic).collect()
    }

    #[test]
    fn kekule_benzene() {
        assert!(aromatic_flags("C1=CC=CC=C1").iter().all(|&a| a));
    }

    #[test]
    fn cyclohexane_not_aromatic() {
        assert!(aromatic_flags("C1CCCCC1").iter().all(|&a| !a));
    }

    #[test]
    fn kekule_heteroaromatics() {
        assert!(aromatic_flags("C1=CC=NC=C1").iter().all(|&a| a), "pyridine");
        assert!(aromatic_flags("C1=CNC=C1").iter().all(|&a| a), "pyrrole");
        assert!(aromatic_flags("C1=COC=C1").iter().all(|&a| a), "furan");
        assert!(aromatic_flags("C1=CSC=C1").iter().all(|&a| a), "thiophene");
    }

    #[test]
    fn fused_kekule_systems() {
        assert!(aromatic_flags("C1=CC=C2C=CC=CC2=C1").iter().all(|&a| a));
        let anthracene = aromatic_flags("CC1=C2C=CC=CC2=CC3=CC=CC=C13");
        assert!(!anthracene[0]);
        assert!(anthracene[1..].iter().all(|&a| a));
    }

    #[test]
    fn azulene_envelope() {
        assert!(aromatic_flags("C1=CC2=CC=CC=CC2=C1").iter().all(|&a| a));
    }

    #[test]
    fn substituents_stay_aliphatic() {
        let phenol = aromatic_flags("OC1=CC=CC=C1");
        assert!(!phenol[0]);
        assert!(phenol[1..].iter().all(|&a| a));
    }

    #[test]
    fn non_huckel_rings() {
        assert!(aromatic_flags("C1=CCC=C1").iter().all(|&a| !a));
        assert!(aromatic_flags("C1=CC=CC=CC=C1").iter().all(|&a| !a));
        assert!(aromatic_flags("O=C1C=CC(=O)C=C1").iter().all(|&a| !a), "quinone");
    }

    #[test]
    fn pyridone_is_aromatic() {
        let flags = aromatic_flags("O=C1C=CC=CN1");
        assert!(!flags[0]);
        assert!(flags[1..].iter().all(|&a| a));
    }

    #[test]
    fn biphenyl_link_is_single() {
        let mol = from_smiles("c1ccccc1c1ccccc1").unwrap();
        let link = mol
            .bond_between(NodeIndex::new(5), NodeIndex::new(6))
            .unwrap();
        assert!(!mol.bond(link).is_aromatic);
        assert_eq!(mol.bonds().filter(|&e| mol.bond(e).is_aromatic).count(), 12);
    }

    #[test]
    fn huckel_rule() {
        assert!(!is_huckel(0));
        assert!(is_huckel(2));
        assert!(!is_huckel(4));
        assert!(is_huckel(6));
        assert!(!is_huckel(8));
        assert!(is_huckel(10));
        assert!(is_huckel(14));
    }
}
