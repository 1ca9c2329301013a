//! Greedy overlap resolution.
//!
//! Candidates claim atoms in a fixed priority order: larger matches first,
//! indivisible groups before composed ones of the same size, then catalog
//! declaration order, then the lexicographically smallest atom set. A
//! candidate that loses some of its atoms keeps the remainder only when the
//! remainder is itself a valid size for its group. There is no
//! backtracking; a catalog that needs it shows up as an ambiguity or an
//! incomplete cover.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::catalog::{Catalog, GroupId};

use super::detect::Candidate;
use super::matcher::AtomSet;

/// Occurrence count per group.
pub type GroupCounts = BTreeMap<GroupId, u32>;

/// Disjoint candidates that survived resolution, in claim order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub parts: Vec<Candidate>,
}

impl Assignment {
    pub fn counts(&self) -> GroupCounts {
        let mut counts = GroupCounts::new();
        for part in &self.parts {
            *counts.entry(part.group).or_default() += 1;
        }
        counts
    }

    pub fn covered_atoms(&self) -> usize {
        self.parts.iter().map(|p| p.atoms.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// Some atoms are not covered by any surviving candidate.
    Incomplete {
        uncovered: Vec<usize>,
        partial: Assignment,
    },
    /// Different groups match exactly the same atoms with equal priority.
    Ambiguous { atoms: AtomSet, groups: Vec<GroupId> },
}

fn compare(a: &Candidate, b: &Candidate, catalog: &Catalog) -> Ordering {
    b.atoms
        .len()
        .cmp(&a.atoms.len())
        .then_with(|| catalog.is_composed(a.group).cmp(&catalog.is_composed(b.group)))
        .then_with(|| a.group.cmp(&b.group))
        .then_with(|| a.atoms.cmp(&b.atoms))
}

/// Indices of `candidates` in claim order.
pub(crate) fn priority_order(candidates: &[Candidate], catalog: &Catalog) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| compare(&candidates[a], &candidates[b], catalog));
    order
}

/// Claims atoms in priority order. The result is indexed like `candidates`:
/// `Some(atoms)` for a kept (possibly reduced) candidate, `None` for a
/// dropped one.
pub(crate) fn claim(candidates: &[Candidate], catalog: &Catalog) -> Vec<Option<AtomSet>> {
    let mut claimed = BTreeSet::new();
    let mut outcome = vec![None; candidates.len()];
    for i in priority_order(candidates, catalog) {
        let c = &candidates[i];
        let group = catalog.group(c.group);
        let rest: AtomSet = c.atoms.iter().copied().filter(|a| !claimed.contains(a)).collect();
        if rest.is_empty() {
            trace!(group = %group.name, atoms = ?c.atoms, "dropped, every atom already claimed");
            continue;
        }
        if rest.len() != c.atoms.len() && !group.is_valid_size(rest.len()) {
            trace!(group = %group.name, atoms = ?c.atoms, remainder = ?rest, "dropped, remainder is not a valid size");
            continue;
        }
        claimed.extend(rest.iter().copied());
        outcome[i] = Some(rest);
    }
    outcome
}

/// A kept candidate is ambiguous when another group of the same
/// composed-ness matched exactly its atoms: whichever is declared first
/// wins the claim, so the choice is arbitrary. Twins of candidates that a
/// larger match already displaced never compete and are ignored.
fn find_ambiguity(
    candidates: &[Candidate],
    outcome: &[Option<AtomSet>],
    order: &[usize],
    catalog: &Catalog,
) -> Option<(AtomSet, Vec<GroupId>)> {
    let mut by_atoms: BTreeMap<(&AtomSet, bool), BTreeSet<GroupId>> = BTreeMap::new();
    for c in candidates {
        by_atoms
            .entry((&c.atoms, catalog.is_composed(c.group)))
            .or_default()
            .insert(c.group);
    }
    order
        .iter()
        .filter(|&&i| outcome[i].is_some())
        .map(|&i| &candidates[i])
        .find_map(|c| {
            let groups = &by_atoms[&(&c.atoms, catalog.is_composed(c.group))];
            (groups.len() > 1).then(|| (c.atoms.clone(), groups.iter().copied().collect()))
        })
}

/// Resolves candidates of a molecule with `atom_count` heavy atoms into an
/// exact cover.
pub fn resolve(
    candidates: &[Candidate],
    catalog: &Catalog,
    atom_count: usize,
) -> Result<Assignment, ResolveError> {
    let outcome = claim(candidates, catalog);
    let order = priority_order(candidates, catalog);
    if let Some((atoms, groups)) = find_ambiguity(candidates, &outcome, &order, catalog) {
        return Err(ResolveError::Ambiguous { atoms, groups });
    }

    let parts: Vec<Candidate> = order
        .into_iter()
        .filter_map(|i| {
            outcome[i].clone().map(|atoms| Candidate {
                group: candidates[i].group,
                atoms,
            })
        })
        .collect();

    let mut owner: Vec<Option<usize>> = vec![None; atom_count];
    for (p, part) in parts.iter().enumerate() {
        for &atom in &part.atoms {
            match owner.get_mut(atom) {
                Some(Some(_)) => {
                    return Err(ResolveError::Ambiguous {
                        atoms: vec![atom],
                        groups: parts
                            .iter()
                            .filter(|q| q.atoms.contains(&atom))
                            .map(|q| q.group)
                            .collect(),
                    })
                }
                Some(slot) => *slot = Some(p),
                None => trace!(atom, "match refers to an atom outside the molecule"),
            }
        }
    }

    let assignment = Assignment { parts };
    let uncovered: Vec<usize> = owner
        .iter()
        .enumerate()
        .filter_map(|(atom, o)| o.is_none().then_some(atom))
        .collect();
    debug!(
        parts = assignment.parts.len(),
        uncovered = uncovered.len(),
        "resolution finished"
    );
    if uncovered.is_empty() {
        Ok(assignment)
    } else {
        Err(ResolveError::Incomplete {
            uncovered,
            partial: assignment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Model;
    use crate::fragment::{detect, SmartsMatcher};
    use crate::smarts::Target;
    use crate::smiles::from_smiles;

    fn unifac() -> Catalog {
        Catalog::load(Model::Unifac).unwrap()
    }

    fn cand(catalog: &Catalog, name: &str, atoms: &[usize]) -> Candidate {
        Candidate {
            group: catalog.id_of(name).unwrap(),
            atoms: atoms.to_vec(),
        }
    }

    fn named(catalog: &Catalog, counts: &GroupCounts) -> BTreeMap<String, u32> {
        counts
            .iter()
            .map(|(&id, &n)| (catalog.group(id).name.clone(), n))
            .collect()
    }

    #[test]
    fn larger_match_wins() {
        let catalog = unifac();
        // acetaldehyde: CH3 (0), C (1), O (2)
        let cands = vec![
            cand(&catalog, "CH3", &[0]),
            cand(&catalog, "CHO", &[1, 2]),
            cand(&catalog, "CH3CO", &[0, 1, 2]),
        ];
        let a = resolve(&cands, &catalog, 3).unwrap();
        assert_eq!(a.parts.len(), 1);
        assert_eq!(catalog.group(a.parts[0].group).name, "CH3CO");
    }

    #[test]
    fn invalid_remainder_is_dropped() {
        let catalog = unifac();
        let cands = vec![
            cand(&catalog, "CH2CO", &[3, 4, 5]),
            cand(&catalog, "CH2CO", &[4, 5, 6]),
            cand(&catalog, "CH2", &[6]),
        ];
        let err = resolve(&cands, &catalog, 7).unwrap_err();
        let ResolveError::Incomplete { uncovered, partial } = err else {
            panic!("expected incomplete");
        };
        assert_eq!(uncovered, vec![0, 1, 2]);
        assert_eq!(partial.parts[0].atoms, vec![3, 4, 5]);
        assert_eq!(partial.parts[1].atoms, vec![6]);
    }

    #[test]
    fn indivisible_before_composed_at_equal_size() {
        let catalog = unifac();
        let cands = vec![
            cand(&catalog, "ACCH2", &[0, 1]),
            cand(&catalog, "CH2CL", &[1, 2]),
        ];
        let order = priority_order(&cands, &catalog);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn identical_atoms_in_two_groups_is_ambiguous() {
        let catalog = unifac();
        let cands = vec![cand(&catalog, "CH2", &[0]), cand(&catalog, "CH", &[0])];
        match resolve(&cands, &catalog, 1) {
            Err(ResolveError::Ambiguous { atoms, groups }) => {
                assert_eq!(atoms, vec![0]);
                assert_eq!(groups.len(), 2);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn displaced_twins_are_not_ambiguous() {
        let catalog = unifac();
        let cands = vec![
            cand(&catalog, "CH2", &[0]),
            cand(&catalog, "CH", &[0]),
            cand(&catalog, "CHO", &[1, 2]),
            cand(&catalog, "CH3CO", &[0, 1, 2]),
        ];
        let a = resolve(&cands, &catalog, 3).unwrap();
        assert_eq!(a.parts, vec![cand(&catalog, "CH3CO", &[0, 1, 2])]);
    }

    #[test]
    fn empty_molecule_resolves_to_nothing() {
        let catalog = unifac();
        assert_eq!(resolve(&[], &catalog, 0), Ok(Assignment::default()));
    }

    #[test]
    fn resolved_hexane() {
        let catalog = unifac();
        let target = Target::new(from_smiles("CCCCCC").unwrap());
        let d = detect(&target, &catalog, &SmartsMatcher);
        let a = resolve(&d.active, &catalog, 6).unwrap();
        let counts = named(&catalog, &a.counts());
        assert_eq!(counts, BTreeMap::from([("CH2".into(), 4), ("CH3".into(), 2)]));
        assert_eq!(a.covered_atoms(), 6);
    }

    #[test]
    fn claim_order_is_deterministic() {
        let catalog = unifac();
        let forward = vec![cand(&catalog, "CH2N", &[1, 2]), cand(&catalog, "CH2N", &[2, 3])];
        let mut backward = forward.clone();
        backward.reverse();
        let a = resolve(&forward, &catalog, 4).unwrap_err();
        let b = resolve(&backward, &catalog, 4).unwrap_err();
        assert_eq!(a, b);
    }
}
