//! The fragmentation pipeline.
//!
//! ```text
//! molecule ─ detect ─ correct_composed ─ resolve ─ correct_problematics ─ checks
//! ```
//!
//! Each stage is a plain function over an explicitly passed [`Catalog`];
//! [`Fragmenter`] wires them together for one molecule at a time.
//!
//! ```
//! use groupfrag::{Catalog, Fragmenter, Identifier, Model};
//!
//! let catalog = Catalog::load(Model::Unifac).unwrap();
//! let result = Fragmenter::new(&catalog)
//!     .fragment(Identifier::smiles("Cc1ccccc1"))
//!     .unwrap();
//! assert_eq!(result.groups["ACH"], 5);
//! assert_eq!(result.groups["ACCH3"], 1);
//! ```

mod checks;
mod composed;
mod detect;
mod error;
mod fit;
mod matcher;
mod names;
mod options;
mod problematics;
mod resolve;

pub use checks::{
    check_can_fit_atoms, check_has_composed, check_has_composed_overlapping, check_has_hidden,
    check_has_molecular_weight_right, check_unknown_groups, groups_weight, ValidationWarning,
};
pub use composed::correct_composed;
pub use detect::{detect, Candidate, Detection};
pub use error::FragmentError;
pub use fit::fit_atoms;
pub use matcher::{AtomSet, Matcher, SmartsMatcher};
pub use names::{NameResolver, NameTable};
pub use options::FragmentOptions;
pub use problematics::correct_problematics;
use problematics::place_corrections;
pub use resolve::{resolve, Assignment, GroupCounts, ResolveError};

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, debug_span, warn};

use crate::aromaticity;
use crate::atom::Atom;
use crate::bond::Bond;
use crate::catalog::Catalog;
use crate::formula::average_mol_weight;
use crate::mol::Mol;
use crate::smarts::Target;
use crate::smiles::from_smiles;

/// What to fragment.
#[derive(Debug, Clone)]
pub enum Identifier {
    /// Compound name, looked up through the configured [`NameResolver`].
    Name(String),
    Smiles(String),
    Mol(Mol<Atom, Bond>),
    /// Group counts supplied by the caller; detection is skipped.
    Groups(BTreeMap<String, u32>),
}

impl Identifier {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn smiles(smiles: impl Into<String>) -> Self {
        Self::Smiles(smiles.into())
    }

    fn label(&self) -> String {
        match self {
            Identifier::Name(name) => name.clone(),
            Identifier::Smiles(smiles) => smiles.clone(),
            Identifier::Mol(mol) => format!("<molecule with {} atoms>", mol.atom_count()),
            Identifier::Groups(groups) => format!("<{} group counts>", groups.len()),
        }
    }
}

impl From<Mol<Atom, Bond>> for Identifier {
    fn from(mol: Mol<Atom, Bond>) -> Self {
        Self::Mol(mol)
    }
}

impl From<BTreeMap<String, u32>> for Identifier {
    fn from(groups: BTreeMap<String, u32>) -> Self {
        Self::Groups(groups)
    }
}

/// A change a corrector made on the way to the final counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// A composed match lost its atoms to a more specific match; the
    /// listed constituents were restored in its place.
    Composed {
        group: String,
        atoms: Vec<usize>,
        readmitted: Vec<String>,
    },
    Problematic {
        rule: String,
        matches: usize,
        delta: BTreeMap<String, i32>,
    },
}

/// One atom set of the final partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Part {
    pub group: String,
    pub atoms: Vec<usize>,
}

/// Result of fragmenting one identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragmentation {
    pub identifier: String,
    pub groups: BTreeMap<String, u32>,
    /// Atom sets realizing `groups`. Absent for caller-supplied counts, and
    /// when problematic corrections leave counts no atom layout matches.
    pub partition: Option<Vec<Part>>,
    pub corrections: Vec<Correction>,
    pub warnings: Vec<ValidationWarning>,
    /// Weight of the molecule, or of the groups when no molecule was given.
    pub molecular_weight: f64,
}

impl Fragmentation {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runs the pipeline against one catalog.
pub struct Fragmenter<'a, M = SmartsMatcher> {
    catalog: &'a Catalog,
    matcher: M,
    names: Option<&'a dyn NameResolver>,
    options: FragmentOptions,
}

impl<'a> Fragmenter<'a, SmartsMatcher> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            matcher: SmartsMatcher,
            names: None,
            options: FragmentOptions::default(),
        }
    }
}

impl<'a, M: Matcher> Fragmenter<'a, M> {
    pub fn with_matcher<N: Matcher>(self, matcher: N) -> Fragmenter<'a, N> {
        Fragmenter {
            catalog: self.catalog,
            matcher,
            names: self.names,
            options: self.options,
        }
    }

    pub fn with_names(mut self, names: &'a dyn NameResolver) -> Self {
        self.names = Some(names);
        self
    }

    pub fn with_options(mut self, options: FragmentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    pub fn options(&self) -> &FragmentOptions {
        &self.options
    }

    pub fn fragment(&self, identifier: Identifier) -> Result<Fragmentation, FragmentError> {
        let label = identifier.label();
        let _span = debug_span!("fragment", model = %self.catalog.model(), identifier = %label).entered();
        let mol = match identifier {
            Identifier::Groups(groups) => return Ok(self.from_groups(label, groups)),
            Identifier::Name(name) => {
                let names = self
                    .names
                    .ok_or_else(|| FragmentError::NoResolver { name: name.clone() })?;
                let smiles = names
                    .resolve(&name)
                    .ok_or_else(|| FragmentError::UnknownName { name: name.clone() })?;
                debug!(%name, %smiles, "name resolved");
                parse(&smiles)?
            }
            Identifier::Smiles(smiles) => parse(&smiles)?,
            Identifier::Mol(mut mol) => {
                aromaticity::perceive(&mut mol);
                mol
            }
        };
        self.run(label, Target::new(mol))
    }

    /// Group counts, or an empty map when fragmentation fails.
    pub fn groups_or_empty(&self, identifier: Identifier) -> BTreeMap<String, u32> {
        match self.fragment(identifier) {
            Ok(result) => result.groups,
            Err(err) => {
                debug!(%err, "fragmentation failed");
                BTreeMap::new()
            }
        }
    }

    fn from_groups(&self, label: String, groups: BTreeMap<String, u32>) -> Fragmentation {
        let warnings = check_unknown_groups(groups.keys(), self.catalog);
        for w in &warnings {
            warn!(identifier = %label, "{w}");
        }
        let molecular_weight = groups
            .iter()
            .filter_map(|(name, &n)| self.catalog.group_by_name(name).map(|g| g.weight * f64::from(n)))
            .sum();
        Fragmentation {
            identifier: label,
            groups,
            partition: None,
            corrections: Vec::new(),
            warnings,
            molecular_weight,
        }
    }

    fn run(&self, label: String, target: Target) -> Result<Fragmentation, FragmentError> {
        let catalog = self.catalog;
        let atom_count = target.mol().atom_count();
        let molecular_weight = average_mol_weight(target.mol());

        let detection = detect(&target, catalog, &self.matcher);
        let (detection, mut corrections) = correct_composed(detection, catalog);

        let (counts, parts, repaired) = match resolve(&detection.active, catalog, atom_count) {
            Ok(assignment) => {
                let mut counts = assignment.counts();
                let fixes = correct_problematics(&target, catalog, &self.matcher, &mut counts);
                let parts = if fixes.is_empty() {
                    Some(assignment.parts)
                } else {
                    place_corrections(&target, catalog, assignment.parts, &[], &counts)
                };
                let repaired = !fixes.is_empty();
                corrections.extend(fixes);
                (counts, parts, repaired)
            }
            Err(ResolveError::Incomplete { uncovered, partial }) => {
                let mut counts = partial.counts();
                let repaired = self.options.repair_incomplete && {
                    let fixes = correct_problematics(&target, catalog, &self.matcher, &mut counts);
                    let weight_ok = check_has_molecular_weight_right(
                        molecular_weight,
                        &counts,
                        catalog,
                        self.options.weight_tolerance,
                    )
                    .is_none();
                    let ok = !fixes.is_empty() && weight_ok;
                    if ok {
                        corrections.extend(fixes);
                    }
                    ok
                };
                if !repaired {
                    debug!(?uncovered, "incomplete assignment");
                    return Err(FragmentError::Incomplete {
                        identifier: label,
                        uncovered,
                        partial: self.named(&partial.counts()),
                    });
                }
                debug!("incomplete assignment repaired by problematic rules");
                let parts = place_corrections(&target, catalog, partial.parts, &uncovered, &counts);
                (counts, parts, true)
            }
            Err(ResolveError::Ambiguous { atoms, groups }) => {
                return Err(FragmentError::Ambiguous {
                    identifier: label,
                    atoms,
                    groups: groups.iter().map(|&id| catalog.group(id).name.clone()).collect(),
                });
            }
        };
        if parts.is_none() {
            debug!("corrected counts have no atom layout");
        }

        let mut warnings = Vec::new();
        warnings.extend(check_has_hidden(&target, catalog));
        warnings.extend(check_has_molecular_weight_right(
            molecular_weight,
            &counts,
            catalog,
            self.options.weight_tolerance,
        ));
        if let Some(parts) = &parts {
            warnings.extend(check_has_composed_overlapping(parts));
        }
        if self.options.verify_fit {
            // problematic groups are not matchable on their own atoms
            if repaired {
                warnings.extend(parts.is_none().then_some(ValidationWarning::Unfittable));
            } else {
                warnings.extend(check_can_fit_atoms(&target, &counts, catalog, &self.matcher));
            }
        }
        for w in &warnings {
            warn!(identifier = %label, "{w}");
        }

        let groups = self.named(&counts);
        debug!(?groups, "fragmentation finished");
        Ok(Fragmentation {
            identifier: label,
            groups,
            partition: parts.map(|parts| {
                parts
                    .into_iter()
                    .map(|p| Part {
                        group: catalog.group(p.group).name.clone(),
                        atoms: p.atoms,
                    })
                    .collect()
            }),
            corrections,
            warnings,
            molecular_weight,
        })
    }

    fn named(&self, counts: &GroupCounts) -> BTreeMap<String, u32> {
        counts
            .iter()
            .filter(|(_, &n)| n > 0)
            .map(|(&id, &n)| (self.catalog.group(id).name.clone(), n))
            .collect()
    }
}

fn parse(smiles: &str) -> Result<Mol<Atom, Bond>, FragmentError> {
    from_smiles(smiles).map_err(|source| FragmentError::Smiles {
        smiles: smiles.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Model, Pattern};
    use std::cell::Cell;

    fn groups(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    fn unifac() -> Catalog {
        Catalog::load(Model::Unifac).unwrap()
    }

    #[test]
    fn hexane() {
        let catalog = unifac();
        let result = Fragmenter::new(&catalog)
            .fragment(Identifier::smiles("CCCCCC"))
            .unwrap();
        assert_eq!(result.groups, groups(&[("CH3", 2), ("CH2", 4)]));
        assert!(result.is_clean());
        assert_eq!(result.partition.as_ref().map(Vec::len), Some(6));
    }

    #[test]
    fn methylanthracene_uses_composed_group() {
        let catalog = unifac();
        let result = Fragmenter::new(&catalog)
            .fragment(Identifier::smiles("CC1=C2C=CC=CC2=CC3=CC=CC=C13"))
            .unwrap();
        assert_eq!(result.groups, groups(&[("ACH", 9), ("ACCH3", 1), ("AC", 4)]));
    }

    #[test]
    fn diphenylmethane_records_correction() {
        let catalog = unifac();
        let result = Fragmenter::new(&catalog)
            .fragment(Identifier::smiles("c1ccccc1Cc1ccccc1"))
            .unwrap();
        assert_eq!(result.groups, groups(&[("ACH", 10), ("ACCH2", 1), ("AC", 1)]));
        assert!(matches!(result.corrections[0], Correction::Composed { .. }));
    }

    #[test]
    fn chloropyridine_is_repaired() {
        let catalog = unifac();
        let fragmenter = Fragmenter::new(&catalog);
        let result = fragmenter.fragment(Identifier::smiles("Clc1ccccn1")).unwrap();
        assert_eq!(result.groups, groups(&[("C5H4N", 1), ("CL-(C=C)", 1)]));
        assert!(result.is_clean());

        let strict = Fragmenter::new(&catalog).with_options(FragmentOptions {
            repair_incomplete: false,
            ..FragmentOptions::default()
        });
        match strict.fragment(Identifier::smiles("Clc1ccccn1")) {
            Err(FragmentError::Incomplete { uncovered, partial, .. }) => {
                assert_eq!(uncovered, vec![0]);
                assert_eq!(partial, groups(&[("C5H4N", 1)]));
            }
            other => panic!("expected incomplete, got {other:?}"),
        }
    }

    fn partition_counts(result: &Fragmentation) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for part in result.partition.as_deref().unwrap_or_default() {
            *counts.entry(part.group.clone()).or_default() += 1;
        }
        counts
    }

    #[test]
    fn repaired_partition_realizes_groups() {
        let catalog = unifac();
        let fragmenter = Fragmenter::new(&catalog).with_options(FragmentOptions {
            verify_fit: true,
            ..FragmentOptions::default()
        });
        for smiles in ["Clc1ccccn1", "Clc1ccsc1", "Clc1ccc(Cl)s1"] {
            let result = fragmenter.fragment(Identifier::smiles(smiles)).unwrap();
            assert_eq!(partition_counts(&result), result.groups, "{smiles}");
            let mut atoms: Vec<usize> = result
                .partition
                .iter()
                .flatten()
                .flat_map(|p| p.atoms.iter().copied())
                .collect();
            atoms.sort_unstable();
            let n = from_smiles(smiles).unwrap().atom_count();
            assert_eq!(atoms, (0..n).collect::<Vec<_>>(), "{smiles}");
            assert!(result.is_clean(), "{smiles}: {:?}", result.warnings);
        }
    }

    #[test]
    fn thiophene_has_no_constantinou_gani_cover() {
        let catalog = Catalog::load(Model::ConstantinouGani).unwrap();
        let fragmenter = Fragmenter::new(&catalog);
        assert!(matches!(
            fragmenter.fragment(Identifier::smiles("C1=CSC=C1")),
            Err(FragmentError::Incomplete { .. })
        ));
        assert!(fragmenter.groups_or_empty(Identifier::smiles("C1=CSC=C1")).is_empty());
    }

    #[test]
    fn names_need_a_resolver() {
        let catalog = unifac();
        let plain = Fragmenter::new(&catalog);
        assert_eq!(
            plain.fragment(Identifier::name("toluene")).unwrap_err(),
            FragmentError::NoResolver { name: "toluene".into() }
        );

        let table: NameTable = [("toluene", "Cc1ccccc1")].into_iter().collect();
        let named = Fragmenter::new(&catalog).with_names(&table);
        let result = named.fragment(Identifier::name("Toluene")).unwrap();
        assert_eq!(result.groups, groups(&[("ACH", 5), ("ACCH3", 1)]));
        assert!(matches!(
            named.fragment(Identifier::name("unobtainium")),
            Err(FragmentError::UnknownName { .. })
        ));
    }

    #[test]
    fn bad_smiles_is_reported() {
        let catalog = unifac();
        let err = Fragmenter::new(&catalog)
            .fragment(Identifier::smiles("C1CC"))
            .unwrap_err();
        assert!(matches!(err, FragmentError::Smiles { ref smiles, .. } if smiles == "C1CC"));
    }

    #[test]
    fn kekule_mol_input_is_perceived() {
        let catalog = unifac();
        let mol = crate::smiles::parse_smiles("CC1=CC=CC=C1").unwrap();
        let result = Fragmenter::new(&catalog).fragment(Identifier::from(mol)).unwrap();
        assert_eq!(result.groups, groups(&[("ACH", 5), ("ACCH3", 1)]));
    }

    #[test]
    fn supplied_groups_skip_detection() {
        let catalog = unifac();
        let supplied = groups(&[("CH3", 2), ("CH2", 4), ("NOPE", 1)]);
        let result = Fragmenter::new(&catalog)
            .fragment(Identifier::from(supplied.clone()))
            .unwrap();
        assert_eq!(result.groups, supplied);
        assert!(result.partition.is_none());
        assert_eq!(result.warnings, vec![ValidationWarning::UnknownGroup("NOPE".into())]);
        assert!((result.molecular_weight - 86.178).abs() < 0.01);
    }

    #[test]
    fn verify_fit_option() {
        let catalog = unifac();
        let result = Fragmenter::new(&catalog)
            .with_options(FragmentOptions {
                verify_fit: true,
                ..FragmentOptions::default()
            })
            .fragment(Identifier::smiles("CCc1ccccc1"))
            .unwrap();
        assert!(result.is_clean(), "{:?}", result.warnings);
    }

    #[test]
    fn hidden_elements_are_flagged() {
        let catalog = Catalog::load(Model::Joback).unwrap();
        let err = Fragmenter::new(&catalog)
            .fragment(Identifier::smiles("C[SiH3]"))
            .unwrap_err();
        assert!(matches!(err, FragmentError::Incomplete { ref uncovered, .. } if uncovered == &vec![1]));
    }

    #[test]
    fn joback_heteroaromatics() {
        let catalog = Catalog::load(Model::Joback).unwrap();
        let fragmenter = Fragmenter::new(&catalog);
        for (smiles, hetero) in [
            ("c1ccncc1", "-N= (ring)"),
            ("c1ccsc1", "-S- (ring)"),
            ("c1ccoc1", "-O- (ring)"),
            ("c1cc[nH]c1", ">NH (ring)"),
        ] {
            let result = fragmenter.fragment(Identifier::smiles(smiles)).unwrap();
            let ring_ch = smiles.matches('c').count() as u32;
            assert_eq!(
                result.groups,
                groups(&[("=CH- (ring)", ring_ch), (hetero, 1)]),
                "{smiles}"
            );
        }
        let picoline = fragmenter.fragment(Identifier::smiles("Cc1ccncc1")).unwrap();
        assert_eq!(
            picoline.groups,
            groups(&[("-CH3", 1), ("=CH- (ring)", 4), ("=C< (ring)", 1), ("-N= (ring)", 1)])
        );
    }

    struct CountingMatcher {
        calls: Cell<usize>,
    }

    impl Matcher for CountingMatcher {
        fn find(&self, target: &Target, pattern: &Pattern) -> Vec<AtomSet> {
            self.calls.set(self.calls.get() + 1);
            SmartsMatcher.find(target, pattern)
        }
    }

    #[test]
    fn custom_matcher_is_used() {
        let catalog = unifac();
        let counting = CountingMatcher { calls: Cell::new(0) };
        let fragmenter = Fragmenter::new(&catalog).with_matcher(&counting);
        fragmenter.fragment(Identifier::smiles("CCO")).unwrap();
        let patterns: usize = catalog.groups().iter().map(|g| g.patterns.len()).sum();
        assert!(counting.calls.get() >= patterns);
    }
}
