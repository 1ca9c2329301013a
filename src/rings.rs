use std::collections::{HashSet, VecDeque};

use petgraph::algo::connected_components;
use petgraph::graph::NodeIndex;

use crate::mol::Mol;

/// Smallest set of smallest rings plus per-atom and per-bond ring lookups.
///
/// Rings are found from Horton candidate cycles (two shortest paths from a
/// root joined by an edge), sorted by size and kept when their edge set is
/// linearly independent over GF(2) from the rings already kept.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Vec<NodeIndex>>,
    atom_membership: Vec<u8>,
    ring_bonds: HashSet<(NodeIndex, NodeIndex)>,
}

impl RingInfo {
    pub fn sssr<A, B>(mol: &Mol<A, B>) -> Self {
        let needed = Self::expected_ring_count(mol);
        let rings = if needed == 0 {
            Vec::new()
        } else {
            select_independent_rings(mol, horton_candidates(mol), needed)
        };

        let mut atom_membership = vec![0u8; mol.atom_count()];
        let mut ring_bonds = HashSet::new();
        for ring in &rings {
            for (i, &atom) in ring.iter().enumerate() {
                atom_membership[atom.index()] = atom_membership[atom.index()].saturating_add(1);
                ring_bonds.insert(bond_key(atom, ring[(i + 1) % ring.len()]));
            }
        }

        Self {
            rings,
            atom_membership,
            ring_bonds,
        }
    }

    /// Cyclomatic number: bonds - atoms + connected components.
    pub fn expected_ring_count<A, B>(mol: &Mol<A, B>) -> usize {
        let c = connected_components(mol.graph());
        (mol.bond_count() + c).saturating_sub(mol.atom_count())
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    /// Rings as closed atom walks, smallest first.
    pub fn rings(&self) -> &[Vec<NodeIndex>] {
        &self.rings
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.ring_count(atom) > 0
    }

    /// Number of SSSR rings containing the atom.
    pub fn ring_count(&self, atom: NodeIndex) -> u8 {
        self.atom_membership.get(atom.index()).copied().unwrap_or(0)
    }

    pub fn is_ring_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.ring_bonds.contains(&bond_key(a, b))
    }

    pub fn smallest_ring_size(&self, atom: NodeIndex) -> Option<usize> {
        self.rings
            .iter()
            .filter(|ring| ring.contains(&atom))
            .map(Vec::len)
            .min()
    }

    /// Groups ring indices into fused systems (rings sharing a bond,
    /// transitively). Spiro rings, which share only an atom, stay apart.
    pub fn fused_systems(&self) -> Vec<Vec<usize>> {
        let edge_sets: Vec<HashSet<(NodeIndex, NodeIndex)>> =
            self.rings.iter().map(|r| ring_edges(r)).collect();

        let mut system_of: Vec<Option<usize>> = vec![None; self.rings.len()];
        let mut systems: Vec<Vec<usize>> = Vec::new();
        for start in 0..self.rings.len() {
            if system_of[start].is_some() {
                continue;
            }
            let id = systems.len();
            let mut members = vec![start];
            system_of[start] = Some(id);
            let mut queue = VecDeque::from([start]);
            while let Some(r) = queue.pop_front() {
                for other in 0..self.rings.len() {
                    if system_of[other].is_none() && !edge_sets[r].is_disjoint(&edge_sets[other]) {
                        system_of[other] = Some(id);
                        members.push(other);
                        queue.push_back(other);
                    }
                }
            }
            members.sort_unstable();
            systems.push(members);
        }
        systems
    }
}

fn bond_key(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

pub(crate) fn ring_edges(ring: &[NodeIndex]) -> HashSet<(NodeIndex, NodeIndex)> {
    (0..ring.len())
        .map(|i| bond_key(ring[i], ring[(i + 1) % ring.len()]))
        .collect()
}

/// Breadth-first parent pointers from every root.
fn bfs_parents<A, B>(mol: &Mol<A, B>) -> Vec<Vec<Option<NodeIndex>>> {
    let n = mol.atom_count();
    let mut parents = vec![vec![None; n]; n];
    for (root, row) in parents.iter_mut().enumerate() {
        let mut seen = vec![false; n];
        seen[root] = true;
        let mut queue = VecDeque::from([NodeIndex::new(root)]);
        while let Some(cur) = queue.pop_front() {
            for nb in mol.neighbors(cur) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    row[nb.index()] = Some(cur);
                    queue.push_back(nb);
                }
            }
        }
    }
    parents
}

fn path_to_root(parents: &[Option<NodeIndex>], root: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
    let mut path = vec![to];
    let mut cur = to;
    while cur != root {
        cur = parents[cur.index()]?;
        path.push(cur);
    }
    path.reverse();
    Some(path)
}

fn horton_candidates<A, B>(mol: &Mol<A, B>) -> Vec<Vec<NodeIndex>> {
    let parents = bfs_parents(mol);
    let mut candidates: Vec<Vec<NodeIndex>> = Vec::new();

    for edge in mol.bonds() {
        let Some((u, v)) = mol.bond_endpoints(edge) else {
            continue;
        };
        for root in mol.atoms() {
            let row = &parents[root.index()];
            let (Some(to_u), Some(to_v)) = (path_to_root(row, root, u), path_to_root(row, root, v))
            else {
                continue;
            };
            if to_u.len() + to_v.len() < 4 {
                continue;
            }
            // the two paths may meet only at the root
            if to_u[1..].iter().any(|a| to_v[1..].contains(a)) {
                continue;
            }
            let mut ring = to_u;
            ring.extend(to_v[1..].iter().rev());
            candidates.push(normalize_ring(&ring));
        }
    }

    candidates.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    candidates.dedup();
    candidates
}

fn select_independent_rings<A, B>(
    mol: &Mol<A, B>,
    candidates: Vec<Vec<NodeIndex>>,
    needed: usize,
) -> Vec<Vec<NodeIndex>> {
    let words = mol.bond_count().div_ceil(64);
    let mut basis: Vec<(usize, Vec<u64>)> = Vec::with_capacity(needed);
    let mut rings = Vec::with_capacity(needed);

    for ring in candidates {
        if rings.len() == needed {
            break;
        }
        let mut bits = vec![0u64; words];
        for i in 0..ring.len() {
            if let Some(e) = mol.bond_between(ring[i], ring[(i + 1) % ring.len()]) {
                bits[e.index() / 64] |= 1u64 << (e.index() % 64);
            }
        }
        for (pivot, row) in &basis {
            if bits[pivot / 64] & (1u64 << (pivot % 64)) != 0 {
                for (w, r) in bits.iter_mut().zip(row) {
                    *w ^= *r;
                }
            }
        }
        if let Some(pivot) = lowest_bit(&bits) {
            basis.push((pivot, bits));
            rings.push(ring);
        }
    }

    rings
}

fn lowest_bit(bits: &[u64]) -> Option<usize> {
    bits.iter()
        .enumerate()
        .find(|(_, w)| **w != 0)
        .map(|(i, w)| i * 64 + w.trailing_zeros() as usize)
}

/// Rotates the ring to start at its lowest index and walks toward the
/// smaller neighbour, so equal cycles compare equal.
fn normalize_ring(ring: &[NodeIndex]) -> Vec<NodeIndex> {
    let len = ring.len();
    let Some(start) = (0..len).min_by_key(|&i| ring[i]) else {
        return Vec::new();
    };
    let mut out: Vec<NodeIndex> = (0..len).map(|i| ring[(start + i) % len]).collect();
    if len > 2 && out[1] > out[len - 1] {
        out[1..].reverse();
    }
    out
}
