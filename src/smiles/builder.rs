use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::mol::Mol;
use crate::smiles::parse_tree::{ParseAtom, ParseTree};
use crate::smiles::tokenizer::BondToken;

pub fn build_mol(tree: &ParseTree) -> Mol<Atom, Bond> {
    let folded: Vec<bool> = tree
        .atoms
        .iter()
        .map(|a| a.is_foldable_hydrogen() && !is_hydrogen(&tree.atoms[a.neighbors[0].atom_idx]))
        .collect();

    let mut mol = Mol::new();
    let mut node_of: Vec<Option<NodeIndex>> = vec![None; tree.atoms.len()];

    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        if folded[i] {
            continue;
        }
        let tok = &parse_atom.token;
        node_of[i] = Some(mol.add_atom(Atom {
            atomic_num: tok.element.map(Element::atomic_num).unwrap_or(0),
            formal_charge: tok.charge,
            isotope: tok.isotope,
            hydrogen_count: 0,
            is_aromatic: tok.is_aromatic,
        }));
    }

    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        for neighbor in &parse_atom.neighbors {
            let j = neighbor.atom_idx;
            // each bond is stored on both ends; add it once
            if j < i {
                continue;
            }
            if let (Some(a), Some(b)) = (node_of[i], node_of[j]) {
                let bond = resolve_bond(
                    neighbor.bond,
                    parse_atom.token.is_aromatic,
                    tree.atoms[j].token.is_aromatic,
                );
                mol.add_bond(a, b, bond);
            }
        }
    }

    for (i, parse_atom) in tree.atoms.iter().enumerate() {
        let Some(node) = node_of[i] else { continue };
        let explicit = parse_atom
            .neighbors
            .iter()
            .filter(|n| folded[n.atom_idx])
            .count() as u8;
        let own = if parse_atom.token.is_bracket {
            parse_atom.token.hcount.unwrap_or(0)
        } else {
            implicit_hydrogens(&mol, node, parse_atom, explicit)
        };
        mol.atom_mut(node).hydrogen_count = own.saturating_add(explicit);
    }

    mol
}

fn is_hydrogen(atom: &ParseAtom) -> bool {
    atom.token.element == Some(Element::H)
}

fn resolve_bond(token: Option<BondToken>, from_aromatic: bool, to_aromatic: bool) -> Bond {
    match token {
        Some(BondToken::Single) | Some(BondToken::Directional) => Bond::new(BondOrder::Single),
        Some(BondToken::Double) => Bond::new(BondOrder::Double),
        Some(BondToken::Triple) => Bond::new(BondOrder::Triple),
        Some(BondToken::Aromatic) => Bond::aromatic(),
        None if from_aromatic && to_aromatic => Bond::aromatic(),
        None => Bond::new(BondOrder::Single),
    }
}

/// Hydrogens implied by the lowest default valence that accommodates the
/// written bonds. An aromatic atom gives one valence to the pi system.
fn implicit_hydrogens(
    mol: &Mol<Atom, Bond>,
    node: NodeIndex,
    parse_atom: &ParseAtom,
    explicit_h: u8,
) -> u8 {
    let Some(element) = parse_atom.token.element else {
        return 0;
    };
    let used: u8 = mol
        .bonds_of(node)
        .map(|e| mol.bond(e).order.valence())
        .fold(explicit_h, u8::saturating_add);

    let Some(&target) = element.default_valences().iter().find(|&&v| v >= used) else {
        return 0;
    };

    let h = target - used;
    if parse_atom.token.is_aromatic && h > 0 {
        h - 1
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_tree::build_parse_tree;
    use crate::smiles::tokenizer::tokenize;

    fn parse(s: &str) -> Mol<Atom, Bond> {
        let tokens = tokenize(s).unwrap();
        let tree = build_parse_tree(&tokens).unwrap();
        build_mol(&tree)
    }

    fn h(mol: &Mol<Atom, Bond>, i: usize) -> u8 {
        mol.atom(NodeIndex::new(i)).hydrogen_count
    }

    #[test]
    fn methane_h_count() {
        let mol = parse("C");
        assert_eq!(mol.atom_count(), 1);
        assert_eq!(h(&mol, 0), 4);
    }

    #[test]
    fn ethene_h_counts() {
        let mol = parse("C=C");
        assert_eq!(h(&mol, 0), 2);
        assert_eq!(h(&mol, 1), 2);
    }

    #[test]
    fn bracket_atom_h_is_literal() {
        assert_eq!(h(&parse("[CH4]"), 0), 4);
        assert_eq!(h(&parse("[C]"), 0), 0);
        assert_eq!(h(&parse("C[SiH3]"), 1), 3);
    }

    #[test]
    fn aromatic_hydrogens() {
        let benzene = parse("c1ccccc1");
        assert!((0..6).all(|i| h(&benzene, i) == 1));

        let pyridine = parse("n1ccccc1");
        assert_eq!(h(&pyridine, 0), 0);

        let thiophene = parse("s1cccc1");
        assert_eq!(h(&thiophene, 0), 0);

        let toluene = parse("Cc1ccccc1");
        assert_eq!(h(&toluene, 1), 0);
    }

    #[test]
    fn hypervalent_sulfur_and_nitrogen() {
        let dmso = parse("CS(=O)C");
        assert_eq!(h(&dmso, 1), 0);
        let nitro = parse("CN(=O)=O");
        assert_eq!(h(&nitro, 1), 0);
    }

    #[test]
    fn explicit_hydrogens_are_folded() {
        let mol = parse("[H]C([H])([H])O[H]");
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(h(&mol, 0), 3);
        assert_eq!(h(&mol, 1), 1);
    }

    #[test]
    fn molecular_hydrogen_kept() {
        let mol = parse("[H][H]");
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(mol.bond_count(), 1);
    }

    #[test]
    fn aromatic_bonds_between_lowercase_atoms() {
        let mol = parse("c1ccccc1C");
        let aromatic = mol.bonds().filter(|&e| mol.bond(e).is_aromatic).count();
        assert_eq!(aromatic, 6);
    }
}
