use std::collections::BTreeMap;
use std::sync::OnceLock;

use groupfrag::fragment::{correct_composed, detect, SmartsMatcher};
use groupfrag::{Catalog, Fragmenter, Identifier, Joback, JobackOptions, Model, Target};
use proptest::prelude::*;

fn catalog(model: Model) -> &'static Catalog {
    static CATALOGS: OnceLock<Vec<Catalog>> = OnceLock::new();
    let all = CATALOGS.get_or_init(|| {
        Model::ALL
            .iter()
            .map(|&m| Catalog::load(m).unwrap())
            .collect()
    });
    all.iter().find(|c| c.model() == model).unwrap()
}

/// Acyclic saturated hydrocarbons assembled from backbone carbons with
/// zero to two methyl branches.
fn alkane() -> impl Strategy<Value = String> {
    let unit = prop_oneof![
        4 => Just("C"),
        2 => Just("C(C)"),
        1 => Just("C(C)(C)"),
    ];
    proptest::collection::vec(unit, 1..=12).prop_map(|units| format!("C{}", units.concat()))
}

/// Aromatic rings linked by short alkyl bridges, with optional methyl and
/// hydroxyl substituents. Composed groups compete for the bridge atoms.
fn bridged_aromatic() -> impl Strategy<Value = String> {
    let ring = prop_oneof![
        Just("c1ccccc1"),
        Just("c1ccc(C)cc1"),
        Just("c1ccc(O)cc1"),
        Just("c1ccsc1"),
    ];
    let bridge = prop_oneof![Just("C"), Just("CC"), Just("C(C)"), Just("")];
    (ring.clone(), bridge, ring).prop_map(|(a, b, c)| format!("{a}{b}{c}"))
}

/// Alkyl chains carrying one functional end group.
fn substituted_chain() -> impl Strategy<Value = String> {
    let head = prop_oneof![
        Just("c1ccccc1"),
        Just("OC"),
        Just("ClC"),
        Just("NC"),
        Just("N#CC"),
        Just("O=CC"),
    ];
    (head, 1usize..8).prop_map(|(head, n)| format!("{head}{}", "C".repeat(n)))
}

fn model() -> impl Strategy<Value = Model> {
    prop::sample::select(vec![Model::Unifac, Model::Psrk, Model::ConstantinouGani])
}

proptest! {
    #[test]
    fn fragment_does_not_panic(s in "\\PC{0,40}") {
        let fragmenter = Fragmenter::new(catalog(Model::Unifac));
        let _ = fragmenter.fragment(Identifier::smiles(s));
    }

    #[test]
    fn alkanes_split_into_carbon_groups(smiles in alkane(), model in model()) {
        let mol = groupfrag::from_smiles(&smiles).unwrap();
        let result = Fragmenter::new(catalog(model))
            .fragment(Identifier::smiles(&smiles))
            .unwrap();

        prop_assert!(result.is_clean(), "{smiles}: {:?}", result.warnings);
        let total: u32 = result.groups.values().sum();
        prop_assert_eq!(total as usize, mol.atom_count());
        for name in result.groups.keys() {
            prop_assert!(["CH3", "CH2", "CH", "C"].contains(&name.as_str()), "{smiles}: {name}");
        }
    }

    #[test]
    fn partitions_are_exact_covers(smiles in substituted_chain(), model in model()) {
        let mol = groupfrag::from_smiles(&smiles).unwrap();
        let result = Fragmenter::new(catalog(model))
            .fragment(Identifier::smiles(&smiles))
            .unwrap();

        let mut atoms: Vec<usize> = result
            .partition
            .unwrap_or_default()
            .into_iter()
            .flat_map(|p| p.atoms)
            .collect();
        atoms.sort_unstable();
        prop_assert_eq!(atoms, (0..mol.atom_count()).collect::<Vec<_>>());
        prop_assert!(result.warnings.is_empty(), "{smiles}: {:?}", result.warnings);
    }

    #[test]
    fn fragmentation_is_deterministic(smiles in substituted_chain(), model in model()) {
        let fragmenter = Fragmenter::new(catalog(model));
        let first = fragmenter.fragment(Identifier::smiles(&smiles)).unwrap();
        let second = fragmenter.fragment(Identifier::smiles(&smiles)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn supplied_counts_round_trip(smiles in substituted_chain()) {
        let fragmenter = Fragmenter::new(catalog(Model::Unifac));
        let detected = fragmenter.fragment(Identifier::smiles(&smiles)).unwrap();
        let supplied = fragmenter
            .fragment(Identifier::Groups(detected.groups.clone()))
            .unwrap();
        prop_assert_eq!(&supplied.groups, &detected.groups);
        prop_assert!((supplied.molecular_weight - detected.molecular_weight).abs() < 0.01);
    }

    #[test]
    fn composed_correction_is_idempotent(smiles in bridged_aromatic(), model in model()) {
        let catalog = catalog(model);
        let target = Target::new(groupfrag::from_smiles(&smiles).unwrap());
        let detection = detect(&target, catalog, &SmartsMatcher);
        let (once, _) = correct_composed(detection, catalog);
        let (twice, again) = correct_composed(once.clone(), catalog);
        prop_assert_eq!(once, twice);
        prop_assert!(again.is_empty(), "{smiles}: {again:?}");
    }

    #[test]
    fn joback_boiling_point_grows_with_chain_length(n in 1u32..20) {
        let joback = Joback::new(catalog(Model::Joback)).unwrap();
        let chain = |ch2: u32| -> BTreeMap<String, u32> {
            [("-CH3".to_string(), 2), ("-CH2-".to_string(), ch2)].into_iter().collect()
        };
        let options = JobackOptions::default();
        let shorter = joback.estimate(&chain(n), &options).unwrap();
        let longer = joback.estimate(&chain(n + 1), &options).unwrap();
        let step = longer.normal_boiling_point.unwrap() - shorter.normal_boiling_point.unwrap();
        prop_assert!((step - 22.88).abs() < 1e-9);
    }
}
