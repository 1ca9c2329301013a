use tracing::debug;

use crate::catalog::Catalog;

use super::detect::{Candidate, Detection};
use super::matcher::is_subset;
use super::resolve::claim;
use super::Correction;

/// Undoes shadowing for composed candidates that would lose their atoms.
///
/// A dry run of the resolver's claim order over the active candidates finds
/// every composed candidate that a higher-priority match displaces. That
/// candidate is removed, and the constituent candidates hidden inside its
/// atoms become active again so they can cover what the displaced match
/// leaves behind. Applying this twice gives the same result as applying it
/// once.
pub fn correct_composed(detection: Detection, catalog: &Catalog) -> (Detection, Vec<Correction>) {
    let outcome = claim(&detection.active, catalog);
    let mut displaced = Vec::new();
    let mut active = Vec::with_capacity(detection.active.len());
    for (c, kept) in detection.active.into_iter().zip(outcome) {
        if kept.is_none() && catalog.is_composed(c.group) {
            displaced.push(c);
        } else {
            active.push(c);
        }
    }

    if displaced.is_empty() {
        return (
            Detection {
                active,
                shadowed: detection.shadowed,
            },
            Vec::new(),
        );
    }

    let mut corrections = Vec::with_capacity(displaced.len());
    let mut shadowed = detection.shadowed;
    for composed in &displaced {
        let constituents: Vec<_> = catalog
            .composed_rule(composed.group)
            .map(|rule| rule.constituents.iter().map(|&(id, _)| id).collect())
            .unwrap_or_default();
        let (back, still): (Vec<Candidate>, Vec<Candidate>) = shadowed
            .into_iter()
            .partition(|s| constituents.contains(&s.group) && is_subset(&s.atoms, &composed.atoms));
        shadowed = still;

        let name = &catalog.group(composed.group).name;
        debug!(group = %name, atoms = ?composed.atoms, readmitted = back.len(), "composed match displaced");
        corrections.push(Correction::Composed {
            group: name.clone(),
            atoms: composed.atoms.clone(),
            readmitted: back.iter().map(|c| catalog.group(c.group).name.clone()).collect(),
        });
        active.extend(back);
    }
    active.sort();

    (Detection { active, shadowed }, corrections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Model;
    use crate::fragment::{detect, SmartsMatcher};
    use crate::smarts::Target;
    use crate::smiles::from_smiles;

    fn detection(catalog: &Catalog, smiles: &str) -> Detection {
        let target = Target::new(from_smiles(smiles).unwrap());
        detect(&target, catalog, &SmartsMatcher)
    }

    #[test]
    fn kept_composed_match_needs_no_correction() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let d = detection(&catalog, "Cc1ccccc1");
        let (after, corrections) = correct_composed(d.clone(), &catalog);
        assert_eq!(after, d);
        assert!(corrections.is_empty());
    }

    #[test]
    fn diphenylmethane_readmits_one_side() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let d = detection(&catalog, "c1ccccc1Cc1ccccc1");
        let (after, corrections) = correct_composed(d, &catalog);
        assert_eq!(corrections.len(), 1);
        let Correction::Composed {
            group, readmitted, ..
        } = &corrections[0]
        else {
            panic!("expected a composed correction");
        };
        assert_eq!(group, "ACCH2");
        assert!(readmitted.contains(&"AC".to_string()));
        assert!(readmitted.contains(&"CH2".to_string()));
        let acch2 = catalog.id_of("ACCH2").unwrap();
        assert_eq!(after.active.iter().filter(|c| c.group == acch2).count(), 1);
    }

    #[test]
    fn thiophene_ring_displaces_methyl_composed() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        let d = detection(&catalog, "CC1=CC=CS1");
        let (after, corrections) = correct_composed(d, &catalog);
        assert_eq!(corrections.len(), 1);
        let ch3 = catalog.id_of("CH3").unwrap();
        assert!(after.active.iter().any(|c| c.group == ch3));
        assert!(after.shadowed.is_empty());
    }

    #[test]
    fn idempotent() {
        let catalog = Catalog::load(Model::Unifac).unwrap();
        for smiles in ["c1ccccc1Cc1ccccc1", "OC1=CSC=C1", "NCc1ccccc1", "CCc1ccccc1"] {
            let once = correct_composed(detection(&catalog, smiles), &catalog).0;
            let twice = correct_composed(once.clone(), &catalog).0;
            assert_eq!(once, twice, "{smiles}");
        }
    }
}
