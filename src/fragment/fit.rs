use std::collections::BTreeSet;

use tracing::trace;

use crate::catalog::Catalog;
use crate::smarts::Target;

use super::detect::Candidate;
use super::matcher::{AtomSet, Matcher};
use super::resolve::GroupCounts;

/// Search nodes visited before giving up on a partition.
const MAX_STEPS: usize = 200_000;

/// Finds a partition of the molecule's heavy atoms into raw matches of the
/// groups in `counts`, using each group exactly as often as counted.
///
/// This is an exact-cover search independent of the resolver, so it can
/// confirm that a set of counts is realizable on the structure at all.
pub fn fit_atoms<M: Matcher + ?Sized>(
    target: &Target,
    counts: &GroupCounts,
    catalog: &Catalog,
    matcher: &M,
) -> Option<Vec<Candidate>> {
    let atom_count = target.mol().atom_count();
    let mut pool = Vec::new();
    for (&id, &n) in counts {
        if n == 0 || id >= catalog.groups().len() {
            continue;
        }
        let sets: BTreeSet<AtomSet> = catalog
            .group(id)
            .patterns
            .iter()
            .flat_map(|p| matcher.find(target, p))
            .filter(|atoms| atoms.iter().all(|&a| a < atom_count))
            .collect();
        pool.extend(sets.into_iter().map(|atoms| Candidate { group: id, atoms }));
    }

    let mut by_atom = vec![Vec::new(); atom_count];
    for (i, c) in pool.iter().enumerate() {
        for &a in &c.atoms {
            by_atom[a].push(i);
        }
    }

    let mut search = FitSearch {
        pool: &pool,
        by_atom: &by_atom,
        remaining: counts.clone(),
        covered: vec![false; atom_count],
        chosen: Vec::new(),
        steps: 0,
    };
    if search.run() {
        Some(search.chosen.iter().map(|&i| pool[i].clone()).collect())
    } else {
        trace!(steps = search.steps, "no partition fits the counts");
        None
    }
}

struct FitSearch<'a> {
    pool: &'a [Candidate],
    by_atom: &'a [Vec<usize>],
    remaining: GroupCounts,
    covered: Vec<bool>,
    chosen: Vec<usize>,
    steps: usize,
}

impl FitSearch<'_> {
    fn run(&mut self) -> bool {
        self.steps += 1;
        if self.steps > MAX_STEPS {
            return false;
        }
        let Some(atom) = self.covered.iter().position(|c| !c) else {
            return self.remaining.values().all(|&n| n == 0);
        };

        for &i in &self.by_atom[atom] {
            let c = &self.pool[i];
            if self.remaining.get(&c.group).copied().unwrap_or(0) == 0
                || c.atoms.iter().any(|&a| self.covered[a])
            {
                continue;
            }
            self.take(i, true);
            if self.run() {
                return true;
            }
            self.take(i, false);
        }
        false
    }

    fn take(&mut self, i: usize, on: bool) {
        let c = &self.pool[i];
        for &a in &c.atoms {
            self.covered[a] = on;
        }
        if let Some(n) = self.remaining.get_mut(&c.group) {
            if on {
                *n -= 1;
            } else {
                *n += 1;
            }
        }
        if on {
            self.chosen.push(i);
        } else {
            self.chosen.pop();
        }
    }
}
