use crate::catalog::Pattern;
use crate::smarts::{get_unique_smarts_matches, Target};

/// Sorted heavy-atom indices of one match.
pub type AtomSet = Vec<usize>;

/// Substructure search capability the pipeline is built on.
///
/// Implementations must return each distinct atom set once, sorted, so
/// that automorphic embeddings of a pattern collapse to a single candidate.
pub trait Matcher {
    fn find(&self, target: &Target, pattern: &Pattern) -> Vec<AtomSet>;
}

impl<M: Matcher + ?Sized> Matcher for &M {
    fn find(&self, target: &Target, pattern: &Pattern) -> Vec<AtomSet> {
        (**self).find(target, pattern)
    }
}

/// The in-crate SMARTS matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartsMatcher;

impl Matcher for SmartsMatcher {
    fn find(&self, target: &Target, pattern: &Pattern) -> Vec<AtomSet> {
        get_unique_smarts_matches(target, pattern.query())
            .into_iter()
            .map(|atoms| atoms.into_iter().map(|idx| idx.index()).collect())
            .collect()
    }
}

/// `a ⊆ b` for sorted sets.
pub(crate) fn is_subset(a: &[usize], b: &[usize]) -> bool {
    let mut rest = b.iter();
    a.iter().all(|x| rest.any(|y| y == x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::from_smiles;

    #[test]
    fn subset_of_sorted_sets() {
        assert!(is_subset(&[1, 3], &[0, 1, 2, 3]));
        assert!(is_subset(&[], &[4]));
        assert!(!is_subset(&[1, 5], &[0, 1, 2, 3]));
        assert!(!is_subset(&[2, 1], &[1, 2]));
    }

    #[test]
    fn symmetric_matches_collapse() {
        let target = Target::new(from_smiles("c1ccccc1").unwrap());
        let ring = Pattern::parse("c1ccccc1").unwrap();
        assert_eq!(SmartsMatcher.find(&target, &ring), vec![vec![0, 1, 2, 3, 4, 5]]);

        let ch = Pattern::parse("[cH1]").unwrap();
        assert_eq!(SmartsMatcher.find(&target, &ch).len(), 6);
    }

    #[test]
    fn matcher_by_reference() {
        fn count<M: Matcher>(m: M, target: &Target, p: &Pattern) -> usize {
            m.find(target, p).len()
        }
        let target = Target::new(from_smiles("CCO").unwrap());
        let p = Pattern::parse("[CX4]").unwrap();
        assert_eq!(count(&SmartsMatcher, &target, &p), 2);
    }
}
