use std::collections::VecDeque;

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::Mol;

/// Query-to-target atom pairs, ordered by query atom index.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

/// First embedding of `query` in `target`.
///
/// `atom_match(target_atom, query_atom)` and `bond_match(target_bond,
/// query_bond)` receive graph indices so predicates can consult
/// per-molecule data (ring membership, neighbours) beyond the payload.
pub fn get_substruct_match_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Option<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match, None).find_first()
}

/// Every embedding of `query` in `target`, automorphic ones included.
pub fn get_substruct_matches_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Vec<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match, None).find_all()
}

/// Like [`get_substruct_match_with`], with query atom 0 pinned to `anchor`.
/// Used for recursive SMARTS, whose first atom is the one being tested.
pub fn get_anchored_match_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    anchor: NodeIndex,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Option<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match, Some(anchor)).find_first()
}

struct Vf2<'a, A1, B1, A2, B2, FA, FB> {
    target: &'a Mol<A1, B1>,
    query: &'a Mol<A2, B2>,
    atom_match: FA,
    bond_match: FB,
    anchor: Option<NodeIndex>,
    /// Query atoms in visiting order with the already-visited neighbour
    /// they hang off, if any.
    order: Vec<(NodeIndex, Option<NodeIndex>)>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a, A1, B1, A2, B2, FA, FB> Vf2<'a, A1, B1, A2, B2, FA, FB>
where
    FA: Fn(NodeIndex, NodeIndex) -> bool,
    FB: Fn(EdgeIndex, EdgeIndex) -> bool,
{
    fn new(
        target: &'a Mol<A1, B1>,
        query: &'a Mol<A2, B2>,
        atom_match: FA,
        bond_match: FB,
        anchor: Option<NodeIndex>,
    ) -> Self {
        let first = anchor.map(|_| NodeIndex::new(0));
        Self {
            target,
            query,
            atom_match,
            bond_match,
            anchor,
            order: connected_order(query, first),
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    fn find_first(&mut self) -> Option<AtomMapping> {
        let mut results = Vec::new();
        self.recurse(0, &mut results, true);
        results.pop()
    }

    fn find_all(&mut self) -> Vec<AtomMapping> {
        let mut results = Vec::new();
        self.recurse(0, &mut results, false);
        results
    }

    /// Returns true once the search should stop.
    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>, first_only: bool) -> bool {
        if self.order.is_empty() {
            return true;
        }
        if depth == self.order.len() {
            let mapping = self
                .query_map
                .iter()
                .enumerate()
                .filter_map(|(q, t)| t.map(|t| (NodeIndex::new(q), t)))
                .collect();
            results.push(mapping);
            return first_only;
        }

        let (query_node, parent) = self.order[depth];
        let target = self.target;
        let candidates: Vec<NodeIndex> = match (depth, self.anchor, parent) {
            (0, Some(anchor), _) => vec![anchor],
            (_, _, Some(p)) => match self.query_map[p.index()] {
                Some(tp) => target.neighbors(tp).collect(),
                None => Vec::new(),
            },
            _ => target.atoms().collect(),
        };

        for target_node in candidates {
            if self.target_used[target_node.index()] || !self.is_feasible(query_node, target_node) {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[target_node.index()] = true;

            let stop = self.recurse(depth + 1, results, first_only);

            self.query_map[query_node.index()] = None;
            self.target_used[target_node.index()] = false;

            if stop {
                return true;
            }
        }
        false
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if target_node.index() >= self.target_used.len() {
            return false;
        }
        if self.query.degree(query_node) > self.target.degree(target_node) {
            return false;
        }
        if !(self.atom_match)(target_node, query_node) {
            return false;
        }

        for q_neighbor in self.query.neighbors(query_node) {
            let Some(t_mapped) = self.query_map[q_neighbor.index()] else {
                continue;
            };
            let (Some(q_bond), Some(t_bond)) = (
                self.query.bond_between(query_node, q_neighbor),
                self.target.bond_between(target_node, t_mapped),
            ) else {
                return false;
            };
            if !(self.bond_match)(t_bond, q_bond) {
                return false;
            }
        }

        true
    }
}

/// Breadth-first visiting order over every query component so that each
/// atom after a component's first has a mapped neighbour to extend from.
/// Components start at `first` if given, otherwise at their highest-degree
/// atom.
fn connected_order<A, B>(query: &Mol<A, B>, first: Option<NodeIndex>) -> Vec<(NodeIndex, Option<NodeIndex>)> {
    let n = query.atom_count();
    let mut seen = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut starts: Vec<NodeIndex> = query.atoms().collect();
    starts.sort_by(|&a, &b| query.degree(b).cmp(&query.degree(a)).then(a.cmp(&b)));
    if let Some(f) = first.filter(|f| f.index() < n) {
        starts.insert(0, f);
    }

    for start in starts {
        if seen[start.index()] {
            continue;
        }
        seen[start.index()] = true;
        order.push((start, None));
        let mut queue = VecDeque::from([start]);
        while let Some(cur) = queue.pop_front() {
            for nb in query.neighbors(cur) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    order.push((nb, Some(cur)));
                    queue.push_back(nb);
                }
            }
        }
    }
    order
}
