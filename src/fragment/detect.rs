use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::catalog::{Catalog, GroupId};
use crate::smarts::Target;

use super::matcher::{is_subset, AtomSet, Matcher};

/// One match of one group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Candidate {
    pub group: GroupId,
    pub atoms: AtomSet,
}

/// Raw candidates of one molecule.
///
/// `shadowed` holds constituent matches hidden inside a composed-group
/// match; they only come back if composed correction displaces that match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub active: Vec<Candidate>,
    pub shadowed: Vec<Candidate>,
}

/// Runs every catalog pattern against `target`.
pub fn detect<M: Matcher + ?Sized>(target: &Target, catalog: &Catalog, matcher: &M) -> Detection {
    let mut found = Vec::new();
    for (id, group) in catalog.groups().iter().enumerate() {
        let sets: BTreeSet<AtomSet> = group
            .patterns
            .iter()
            .flat_map(|p| matcher.find(target, p))
            .collect();
        if !sets.is_empty() {
            trace!(group = %group.name, matches = sets.len(), "group matched");
        }
        found.extend(sets.into_iter().map(|atoms| Candidate { group: id, atoms }));
    }

    for rule in catalog.composed() {
        if let Some(trigger) = &rule.trigger {
            if matcher.find(target, trigger).is_empty() {
                found.retain(|c| c.group != rule.group);
            }
        }
    }

    let found = exclude_families(found, catalog);
    let detection = shadow_constituents(found, catalog);
    debug!(
        active = detection.active.len(),
        shadowed = detection.shadowed.len(),
        "detection finished"
    );
    detection
}

fn excludes(catalog: &Catalog, outer: GroupId, inner: GroupId) -> bool {
    let inner_family = &catalog.group(inner).main_group;
    catalog
        .main_group(&catalog.group(outer).main_group)
        .is_some_and(|mg| mg.excludes.iter().any(|f| f == inner_family))
}

fn exclude_families(found: Vec<Candidate>, catalog: &Catalog) -> Vec<Candidate> {
    let keep: Vec<bool> = found
        .iter()
        .map(|c| {
            !found.iter().any(|outer| {
                outer.group != c.group
                    && excludes(catalog, outer.group, c.group)
                    && is_subset(&c.atoms, &outer.atoms)
            })
        })
        .collect();
    found
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| {
            if !k {
                trace!(group = %catalog.group(c.group).name, atoms = ?c.atoms, "excluded by family");
            }
            k.then_some(c)
        })
        .collect()
}

fn shadow_constituents(found: Vec<Candidate>, catalog: &Catalog) -> Detection {
    let mut detection = Detection::default();
    for c in &found {
        let hidden = catalog.composed().iter().any(|rule| {
            rule.constituents.iter().any(|&(id, _)| id == c.group)
                && found
                    .iter()
                    .any(|outer| outer.group == rule.group && is_subset(&c.atoms, &outer.atoms))
        });
        if hidden {
            detection.shadowed.push(c.clone());
        } else {
            detection.active.push(c.clone());
        }
    }
    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Model;
    use crate::fragment::SmartsMatcher;
    use crate::smiles::from_smiles;

    fn run(model: Model, smiles: &str) -> (Catalog, Detection) {
        let catalog = Catalog::load(model).unwrap();
        let target = Target::new(from_smiles(smiles).unwrap());
        let detection = detect(&target, &catalog, &SmartsMatcher);
        (catalog, detection)
    }

    fn names(catalog: &Catalog, cands: &[Candidate]) -> Vec<String> {
        cands.iter().map(|c| catalog.group(c.group).name.clone()).collect()
    }

    #[test]
    fn hexane_candidates() {
        let (catalog, d) = run(Model::Unifac, "CCCCCC");
        let names = names(&catalog, &d.active);
        assert_eq!(names.iter().filter(|n| *n == "CH3").count(), 2);
        assert_eq!(names.iter().filter(|n| *n == "CH2").count(), 4);
        assert!(d.shadowed.is_empty());
    }

    #[test]
    fn toluene_shadows_constituents() {
        let (catalog, d) = run(Model::Unifac, "Cc1ccccc1");
        let shadowed = names(&catalog, &d.shadowed);
        assert_eq!(shadowed, ["CH3", "AC"]);
        let active = names(&catalog, &d.active);
        assert_eq!(active.iter().filter(|n| *n == "ACH").count(), 5);
        assert!(active.contains(&"ACCH3".to_string()));
        assert!(!active.contains(&"AC".to_string()));
    }

    #[test]
    fn pyridine_excludes_aromatic_ch() {
        let (catalog, d) = run(Model::Unifac, "c1ccncc1");
        assert_eq!(names(&catalog, &d.active), ["C5H5N"]);
    }

    #[test]
    fn candidates_follow_catalog_order() {
        let (_, d) = run(Model::Unifac, "CCO");
        let mut sorted = d.active.clone();
        sorted.sort();
        assert_eq!(sorted, d.active);
    }

    #[test]
    fn joback_ring_heteroatoms_match_aromatic_atoms() {
        let (catalog, d) = run(Model::Joback, "c1ccncc1");
        let nitrogen: Vec<&Candidate> = d
            .active
            .iter()
            .filter(|c| catalog.group(c.group).name == "-N= (ring)")
            .collect();
        assert_eq!(nitrogen.len(), 1);
        assert_eq!(nitrogen[0].atoms, vec![3]);
    }
}
