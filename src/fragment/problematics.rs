use std::collections::BTreeMap;

use tracing::{debug, warn};

use petgraph::graph::NodeIndex;

use crate::catalog::Catalog;
use crate::element::Element;
use crate::smarts::Target;

use super::detect::Candidate;
use super::matcher::Matcher;
use super::resolve::GroupCounts;
use super::Correction;

/// Applies every problematic rule whose trigger occurs in `target`.
///
/// Each rule's delta is added once per distinct trigger match. Counts never
/// go below zero; groups that reach zero are removed.
pub fn correct_problematics<M: Matcher + ?Sized>(
    target: &Target,
    catalog: &Catalog,
    matcher: &M,
    counts: &mut GroupCounts,
) -> Vec<Correction> {
    let mut corrections = Vec::new();
    for rule in catalog.problematics() {
        let hits = matcher.find(target, &rule.trigger).len();
        if hits == 0 {
            continue;
        }
        let times = i64::try_from(hits).unwrap_or(i64::MAX);
        let mut applied = BTreeMap::new();
        for &(id, delta) in &rule.delta {
            let entry = counts.entry(id).or_default();
            let value = i64::from(*entry).saturating_add(i64::from(delta).saturating_mul(times));
            if value < 0 {
                warn!(rule = %rule.name, group = %catalog.group(id).name, "correction would make a count negative");
            }
            *entry = u32::try_from(value.max(0)).unwrap_or(u32::MAX);
            applied.insert(
                catalog.group(id).name.clone(),
                i32::try_from(i64::from(delta).saturating_mul(times)).unwrap_or(i32::MAX),
            );
        }
        debug!(rule = %rule.name, hits, "problematic structure corrected");
        corrections.push(Correction::Problematic {
            rule: rule.name.clone(),
            matches: hits,
            delta: applied,
        });
    }
    counts.retain(|_, n| *n > 0);
    corrections
}

/// Extends `parts` so that it realizes `counts` after problematic
/// corrections. Each group a correction added takes atoms from `uncovered`
/// matching the heavy elements of its formula.
///
/// Returns `None` when a correction removed a placed group, or when the
/// uncovered atoms cannot be shared out exactly.
pub(crate) fn place_corrections(
    target: &Target,
    catalog: &Catalog,
    mut parts: Vec<Candidate>,
    uncovered: &[usize],
    counts: &GroupCounts,
) -> Option<Vec<Candidate>> {
    let mut placed = GroupCounts::new();
    for part in &parts {
        *placed.entry(part.group).or_default() += 1;
    }
    if placed
        .iter()
        .any(|(id, &n)| counts.get(id).copied().unwrap_or(0) < n)
    {
        return None;
    }

    let mol = target.mol();
    let mut free = uncovered.to_vec();
    for (&id, &wanted) in counts {
        let have = placed.get(&id).copied().unwrap_or(0);
        for _ in have..wanted {
            let mut atoms = Vec::new();
            for (&element, &n) in catalog.group(id).formula.iter().filter(|(e, _)| **e != Element::H) {
                for _ in 0..n {
                    let pos = free
                        .iter()
                        .position(|&a| mol.atom(NodeIndex::new(a)).element() == Some(element))?;
                    atoms.push(free.remove(pos));
                }
            }
            if atoms.is_empty() {
                return None;
            }
            atoms.sort_unstable();
            parts.push(Candidate { group: id, atoms });
        }
    }
    free.is_empty().then_some(parts)
}
