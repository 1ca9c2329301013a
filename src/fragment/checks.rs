//! Post-resolution validators. None of them changes an assignment; each
//! reports a [`ValidationWarning`] the caller may act on.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::catalog::Catalog;
use crate::element::Element;
use crate::smarts::Target;

use super::detect::Candidate;
use super::fit::fit_atoms;
use super::matcher::Matcher;
use super::resolve::GroupCounts;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationWarning {
    #[error("no group in the catalog contains element(s) {0:?}")]
    HiddenElements(Vec<Element>),
    #[error("group weights add up to {found:.3} g/mol but the molecule weighs {expected:.3} g/mol")]
    WeightMismatch { expected: f64, found: f64 },
    #[error("group '{0}' is not in the catalog")]
    UnknownGroup(String),
    #[error("atoms {0:?} are claimed by more than one group")]
    ComposedOverlap(Vec<usize>),
    #[error("the group counts cannot be laid out over the molecule's atoms")]
    Unfittable,
}

/// Elements of the molecule that no group formula contains.
pub fn check_has_hidden(target: &Target, catalog: &Catalog) -> Option<ValidationWarning> {
    let mol = target.mol();
    let hidden: BTreeSet<Element> = mol
        .atoms()
        .filter_map(|idx| mol.atom(idx).element())
        .filter(|&e| !catalog.covers_element(e))
        .collect();
    (!hidden.is_empty()).then(|| ValidationWarning::HiddenElements(hidden.into_iter().collect()))
}

/// Weight of the group multiset.
pub fn groups_weight(counts: &GroupCounts, catalog: &Catalog) -> f64 {
    counts
        .iter()
        .map(|(&id, &n)| catalog.group(id).weight * f64::from(n))
        .sum()
}

pub fn check_has_molecular_weight_right(
    expected: f64,
    counts: &GroupCounts,
    catalog: &Catalog,
    tolerance: f64,
) -> Option<ValidationWarning> {
    let found = groups_weight(counts, catalog);
    ((expected - found).abs() > tolerance)
        .then_some(ValidationWarning::WeightMismatch { expected, found })
}

/// Confirms that `counts` can be realized as an exact cover of the atoms.
pub fn check_can_fit_atoms<M: Matcher + ?Sized>(
    target: &Target,
    counts: &GroupCounts,
    catalog: &Catalog,
    matcher: &M,
) -> Option<ValidationWarning> {
    fit_atoms(target, counts, catalog, matcher)
        .is_none()
        .then_some(ValidationWarning::Unfittable)
}

/// Whether any counted group is a composed group.
pub fn check_has_composed(counts: &GroupCounts, catalog: &Catalog) -> bool {
    counts
        .iter()
        .any(|(&id, &n)| n > 0 && catalog.is_composed(id))
}

/// Atoms that appear in more than one part of a final partition.
///
/// Resolution never hands one atom to two parts, so on its own output this
/// is a post-condition assert. It can fire on a partition that problematic
/// corrections were laid onto afterwards, or on one built by the caller.
pub fn check_has_composed_overlapping(parts: &[Candidate]) -> Option<ValidationWarning> {
    let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
    for part in parts {
        for &a in &part.atoms {
            *seen.entry(a).or_default() += 1;
        }
    }
    let shared: Vec<usize> = seen
        .into_iter()
        .filter_map(|(a, n)| (n > 1).then_some(a))
        .collect();
    (!shared.is_empty()).then_some(ValidationWarning::ComposedOverlap(shared))
}

/// Names in a caller-supplied group mapping that the catalog lacks.
pub fn check_unknown_groups<'a>(
    names: impl IntoIterator<Item = &'a String>,
    catalog: &Catalog,
) -> Vec<ValidationWarning> {
    names
        .into_iter()
        .filter(|name| catalog.id_of(name).is_none())
        .map(|name| ValidationWarning::UnknownGroup(name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Model;
    use crate::formula::average_mol_weight;
    use crate::fragment::SmartsMatcher;
    use crate::smiles::from_smiles;

    fn target(smiles: &str) -> Target {
        Target::new(from_smiles(smiles).unwrap())
    }

    #[test]
    fn hidden_elements() {
        let joback = Catalog::load(Model::Joback).unwrap();
        assert_eq!(
            check_has_hidden(&target("C[SiH3]"), &joback),
            Some(ValidationWarning::HiddenElements(vec![Element::Si]))
        );
        let unifac = Catalog::load(Model::Unifac).unwrap();
        assert_eq!(check_has_hidden(&target("C[SiH3]"), &unifac), None);
    }

    #[test]
    fn weight_check() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let hexane = target("CCCCCC");
        let expected = average_mol_weight(hexane.mol());
        let ch3 = catalog.id_of("CH3").unwrap();
        let ch2 = catalog.id_of("CH2").unwrap();
        let right = GroupCounts::from([(ch3, 2), (ch2, 4)]);
        assert_eq!(check_has_molecular_weight_right(expected, &right, &catalog, 0.01), None);

        let wrong = GroupCounts::from([(ch3, 2), (ch2, 3)]);
        match check_has_molecular_weight_right(expected, &wrong, &catalog, 0.01) {
            Some(ValidationWarning::WeightMismatch { expected: e, found }) => {
                assert!((e - found - 14.027).abs() < 0.01);
            }
            other => panic!("expected a weight mismatch, got {other:?}"),
        }
    }

    #[test]
    fn fit_check() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let ch3 = catalog.id_of("CH3").unwrap();
        let t = target("CC");
        assert_eq!(check_can_fit_atoms(&t, &GroupCounts::from([(ch3, 2)]), &catalog, &SmartsMatcher), None);
        assert_eq!(
            check_can_fit_atoms(&t, &GroupCounts::from([(ch3, 1)]), &catalog, &SmartsMatcher),
            Some(ValidationWarning::Unfittable)
        );
    }

    #[test]
    fn composed_checks() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let acch3 = catalog.id_of("ACCH3").unwrap();
        let ach = catalog.id_of("ACH").unwrap();
        assert!(check_has_composed(&GroupCounts::from([(acch3, 1), (ach, 5)]), &catalog));
        assert!(!check_has_composed(&GroupCounts::from([(ach, 6)]), &catalog));

        let disjoint = [
            Candidate { group: acch3, atoms: vec![0, 1] },
            Candidate { group: ach, atoms: vec![2] },
        ];
        assert_eq!(check_has_composed_overlapping(&disjoint), None);
        let overlapping = [
            Candidate { group: acch3, atoms: vec![0, 1] },
            Candidate { group: ach, atoms: vec![1] },
        ];
        assert_eq!(
            check_has_composed_overlapping(&overlapping),
            Some(ValidationWarning::ComposedOverlap(vec![1]))
        );
    }

    #[test]
    fn unknown_group_names() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let names = ["CH3".to_string(), "XYZ".to_string()];
        assert_eq!(
            check_unknown_groups(&names, &catalog),
            vec![ValidationWarning::UnknownGroup("XYZ".into())]
        );
    }
}
