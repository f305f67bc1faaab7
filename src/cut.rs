//! Bottom-up enumeration of irredundant k-feasible cuts.
//!
//! A cut of node `n` is a set of leaves such that every path from `n` back to
//! a primary input passes through a leaf. The cut set of an AND gate is the
//! set of minimal unions of one fanin cut each, bounded by `k`, plus the
//! trivial cut `{n}`. Since every union of fanin cuts is a valid cut,
//! keeping only minimal sets yields exactly the irredundant cuts.
//!
//! The constant node has the empty cut, so a gate fed by a constant inherits
//! the cuts of its other fanin.

use std::fmt::{Display, Formatter};

use log::{debug, info};
use rayon::prelude::*;

use crate::aig::{Aig, Node, NodeId};
use crate::error::{Error, Result};

/// Sorted, duplicate-free set of leaves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cut {
    leaves: Vec<NodeId>,
    signature: u64,
}

fn signature_of(leaves: &[NodeId]) -> u64 {
    leaves.iter().fold(0, |acc, &id| acc | 1 << (id % 64))
}

impl Cut {
    pub fn new(mut leaves: Vec<NodeId>) -> Self {
        leaves.sort_unstable();
        leaves.dedup();
        let signature = signature_of(&leaves);
        Self { leaves, signature }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn trivial(node: NodeId) -> Self {
        Self::new(vec![node])
    }

    pub fn leaves(&self) -> &[NodeId] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.leaves.binary_search(&node).is_ok()
    }

    pub fn is_trivial_for(&self, node: NodeId) -> bool {
        self.leaves == [node]
    }

    /// Whether every leaf of `self` is also a leaf of `other`.
    pub fn is_subset_of(&self, other: &Cut) -> bool {
        if self.len() > other.len() || self.signature & !other.signature != 0 {
            return false;
        }
        let mut j = 0;
        for &leaf in &self.leaves {
            while j < other.leaves.len() && other.leaves[j] < leaf {
                j += 1;
            }
            if j == other.leaves.len() || other.leaves[j] != leaf {
                return false;
            }
            j += 1;
        }
        true
    }

    /// Union of two cuts, or `None` if it has more than `k` leaves.
    pub fn merge(&self, other: &Cut, k: usize) -> Option<Cut> {
        if (self.signature | other.signature).count_ones() as usize > k {
            return None;
        }
        let mut leaves = Vec::with_capacity(self.len() + other.len());
        let (mut i, mut j) = (0, 0);
        while i < self.len() || j < other.len() {
            let next = match (self.leaves.get(i), other.leaves.get(j)) {
                (Some(&a), Some(&b)) if a == b => {
                    i += 1;
                    j += 1;
                    a
                }
                (Some(&a), Some(&b)) if a < b => {
                    i += 1;
                    a
                }
                (Some(&a), None) => {
                    i += 1;
                    a
                }
                (_, Some(&b)) => {
                    j += 1;
                    b
                }
                (None, None) => unreachable!(),
            };
            if leaves.len() == k {
                return None;
            }
            leaves.push(next);
        }
        let signature = self.signature | other.signature;
        Some(Cut { leaves, signature })
    }
}

impl Display for Cut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, leaf) in self.leaves.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", leaf)?;
        }
        Ok(())
    }
}

/// Cuts of a single node, none of which contains another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutSet {
    cuts: Vec<Cut>,
}

impl CutSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cut unless a kept cut is a subset of it, dropping the kept cuts
    /// it is a subset of. Returns whether the cut was added.
    pub fn insert(&mut self, cut: Cut) -> bool {
        if self.cuts.iter().any(|c| c.is_subset_of(&cut)) {
            return false;
        }
        self.cuts.retain(|c| !cut.is_subset_of(c));
        self.cuts.push(cut);
        true
    }

    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    pub fn contains(&self, cut: &Cut) -> bool {
        self.cuts.contains(cut)
    }

    fn sort(&mut self) {
        self.cuts.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerateOptions {
    /// Process all nodes of a logic level concurrently.
    pub parallel: bool,
}

/// Cut sets of every node, indexed by node id. Primary outputs have no cuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutTable {
    k: usize,
    sets: Vec<CutSet>,
}

impl CutTable {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn cuts(&self, node: NodeId) -> &[Cut] {
        self.sets[node].cuts()
    }

    pub fn num_cuts(&self) -> usize {
        self.sets.iter().map(|s| s.len()).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[Cut])> {
        self.sets.iter().enumerate().map(|(id, s)| (id, s.cuts()))
    }
}

fn fanin_cuts(sets: &[CutSet], node: NodeId, fanin: NodeId) -> &CutSet {
    let set = &sets[fanin];
    assert!(
        !set.is_empty(),
        "cut set of fanin {} is missing while processing node {}",
        fanin,
        node
    );
    set
}

fn node_cuts(aig: &Aig, sets: &[CutSet], id: NodeId, k: usize) -> CutSet {
    let mut set = CutSet::new();
    match *aig.node(id) {
        Node::Constant => {
            set.insert(Cut::empty());
        }
        Node::Input { .. } => {
            set.insert(Cut::trivial(id));
        }
        Node::And { fanin0, fanin1 } => {
            let left = fanin_cuts(sets, id, fanin0.node());
            let right = fanin_cuts(sets, id, fanin1.node());
            for a in left.cuts() {
                for b in right.cuts() {
                    if let Some(cut) = a.merge(b, k) {
                        set.insert(cut);
                    }
                }
            }
            set.insert(Cut::trivial(id));
        }
        Node::Output { .. } => {}
    }
    set.sort();
    set
}

/// Enumerate the irredundant cuts with at most `k` leaves of every node.
pub fn enumerate_cuts(aig: &Aig, k: usize, options: EnumerateOptions) -> Result<CutTable> {
    if k == 0 {
        return Err(Error::InvalidCutBounds {
            k,
            l: 0,
            expected: "k >= 1",
        });
    }

    let sets = if options.parallel {
        enumerate_by_levels(aig, k)
    } else {
        let mut sets: Vec<CutSet> = Vec::with_capacity(aig.num_nodes());
        for id in 0..aig.num_nodes() {
            let set = node_cuts(aig, &sets, id, k);
            sets.push(set);
        }
        sets
    };

    let table = CutTable { k, sets };
    info!(
        "enumerated {} cuts for {} nodes (k = {})",
        table.num_cuts(),
        aig.num_nodes(),
        k
    );
    Ok(table)
}

// Nodes of one level only depend on lower levels, so a whole level is
// computed against the committed table and committed at once.
fn enumerate_by_levels(aig: &Aig, k: usize) -> Vec<CutSet> {
    let levels = aig.levels();
    let depth = levels.iter().copied().max().unwrap_or(0);
    let mut by_level: Vec<Vec<NodeId>> = vec![Vec::new(); depth + 1];
    for (id, node) in aig.nodes().iter().enumerate() {
        if !node.is_output() {
            by_level[levels[id]].push(id);
        }
    }

    let mut sets = vec![CutSet::new(); aig.num_nodes()];
    for (level, nodes) in by_level.iter().enumerate() {
        let computed: Vec<(NodeId, CutSet)> = nodes
            .par_iter()
            .map(|&id| (id, node_cuts(aig, &sets, id, k)))
            .collect();
        debug!("level {}: {} nodes", level, computed.len());
        for (id, set) in computed {
            sets[id] = set;
        }
    }
    sets
}

/// Whether every path from `node` back to a primary input meets a leaf.
pub fn is_valid_cut(aig: &Aig, node: NodeId, leaves: &[NodeId]) -> bool {
    let mut visited = vec![false; aig.num_nodes()];
    let mut stack = vec![node];
    while let Some(id) = stack.pop() {
        if visited[id] {
            continue;
        }
        visited[id] = true;
        if leaves.contains(&id) {
            continue;
        }
        match aig.node(id) {
            Node::Input { .. } => return false,
            n => stack.extend(n.fanins().map(|e| e.node())),
        }
    }
    true
}

/// Valid, and no longer valid once any single leaf is removed.
pub fn is_irredundant_cut(aig: &Aig, node: NodeId, leaves: &[NodeId]) -> bool {
    if !is_valid_cut(aig, node, leaves) {
        return false;
    }
    (0..leaves.len()).all(|i| {
        let rest: Vec<NodeId> = leaves
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &leaf)| leaf)
            .collect();
        !is_valid_cut(aig, node, &rest)
    })
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::aig::Edge;

    #[test]
    fn test_cut_basics() {
        let cut = Cut::new(vec![5, 2, 5, 3]);
        assert_eq!(cut.leaves(), &[2, 3, 5]);
        assert!(cut.contains(3));
        assert!(!cut.contains(4));
        assert_eq!(cut.to_string(), "2 3 5");
        assert!(Cut::trivial(7).is_trivial_for(7));
        assert!(Cut::empty().is_empty());
    }

    #[test]
    fn test_cut_subset() {
        let a = Cut::new(vec![1, 3]);
        let b = Cut::new(vec![1, 2, 3]);
        let c = Cut::new(vec![1, 65]);
        assert!(a.is_subset_of(&b));
        assert!(!b.is_subset_of(&a));
        assert!(a.is_subset_of(&a));
        assert!(Cut::empty().is_subset_of(&a));
        // 65 shares a signature bit with 1.
        assert!(!c.is_subset_of(&b));
        assert!(!Cut::new(vec![65]).is_subset_of(&Cut::new(vec![1])));
    }

    #[test]
    fn test_cut_merge() {
        let a = Cut::new(vec![1, 4]);
        let b = Cut::new(vec![2, 4, 6]);
        assert_eq!(a.merge(&b, 4), Some(Cut::new(vec![1, 2, 4, 6])));
        assert_eq!(a.merge(&b, 3), None);
        assert_eq!(a.merge(&Cut::empty(), 2), Some(a.clone()));
        // Signatures collide, but the union still fits.
        let c = Cut::new(vec![0, 64]);
        assert_eq!(c.merge(&Cut::new(vec![128]), 3), Some(Cut::new(vec![0, 64, 128])));
        assert_eq!(c.merge(&Cut::new(vec![128]), 2), None);
    }

    #[test]
    fn test_cut_set_dominance() {
        let mut set = CutSet::new();
        assert!(set.insert(Cut::new(vec![1, 2, 3])));
        assert!(set.insert(Cut::new(vec![2, 4])));
        assert!(!set.insert(Cut::new(vec![1, 2, 3])));
        assert!(!set.insert(Cut::new(vec![2, 3, 4])));
        assert!(set.insert(Cut::new(vec![1, 2])));
        assert_eq!(set.len(), 2);
        assert!(!set.contains(&Cut::new(vec![1, 2, 3])));
    }

    #[test]
    fn test_single_and() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let x = aig.and(a, b);
        aig.add_output(x);

        let table = enumerate_cuts(&aig, 2, EnumerateOptions::default()).unwrap();
        assert_eq!(table.cuts(a.node()), &[Cut::trivial(a.node())]);
        assert_eq!(
            table.cuts(x.node()),
            &[Cut::trivial(x.node()), Cut::new(vec![a.node(), b.node()])]
        );

        let table = enumerate_cuts(&aig, 1, EnumerateOptions::default()).unwrap();
        assert_eq!(table.cuts(x.node()), &[Cut::trivial(x.node())]);
    }

    #[test]
    fn test_reconvergence() {
        // p = a & b, q = p & c, t = p & q
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let c = aig.add_input();
        let p = aig.and(a, b);
        let q = aig.and(p, c);
        let t = aig.and(p, !q);
        aig.add_output(t);

        let table = enumerate_cuts(&aig, 3, EnumerateOptions::default()).unwrap();
        let cuts = table.cuts(t.node());
        let (a, b, c, p, q) = (a.node(), b.node(), c.node(), p.node(), q.node());
        for expected in [
            vec![t.node()],
            vec![p, q],
            vec![p, c],
            vec![a, b, c],
            vec![a, b, q],
        ] {
            assert!(cuts.contains(&Cut::new(expected.clone())), "missing {:?}", expected);
        }
        assert_eq!(cuts.len(), 5);
        for cut in cuts {
            assert!(is_irredundant_cut(&aig, t.node(), cut.leaves()));
        }
    }

    #[test]
    fn test_constant_fanin() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let x = aig.and_unhashed(a, Edge::constant(true));
        let y = aig.and_unhashed(Edge::constant(true), Edge::constant(true));
        aig.add_output(x);
        aig.add_output(y);

        let table = enumerate_cuts(&aig, 2, EnumerateOptions::default()).unwrap();
        assert_eq!(table.cuts(0), &[Cut::empty()]);
        assert_eq!(
            table.cuts(x.node()),
            &[Cut::trivial(a.node()), Cut::trivial(x.node())]
        );
        // A gate of constants depends on no input at all.
        assert_eq!(table.cuts(y.node()), &[Cut::empty()]);
        assert!(is_irredundant_cut(&aig, y.node(), &[]));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut aig = Aig::new();
        let inputs: Vec<Edge> = (0..5).map(|_| aig.add_input()).collect();
        let mut layer = inputs.clone();
        for round in 0..3 {
            let mut next = Vec::new();
            for i in 0..layer.len() {
                let j = (i + round + 1) % layer.len();
                next.push(aig.and(layer[i], !layer[j]));
            }
            layer = next;
        }
        for &e in &layer {
            aig.add_output(e);
        }

        let seq = enumerate_cuts(&aig, 4, EnumerateOptions { parallel: false }).unwrap();
        let par = enumerate_cuts(&aig, 4, EnumerateOptions { parallel: true }).unwrap();
        assert_eq!(seq, par);
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let aig = Aig::new();
        let err = enumerate_cuts(&aig, 0, EnumerateOptions::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidCutBounds { k: 0, .. }));
    }

    #[test]
    fn test_ground_truth() {
        let mut aig = Aig::new();
        let a = aig.add_input();
        let b = aig.add_input();
        let x = aig.and(a, b);
        let (a, b, x) = (a.node(), b.node(), x.node());

        assert!(is_valid_cut(&aig, x, &[a, b]));
        assert!(!is_valid_cut(&aig, x, &[a]));
        assert!(is_valid_cut(&aig, x, &[a, b, x]));
        assert!(!is_irredundant_cut(&aig, x, &[a, b, x]));
        assert!(is_irredundant_cut(&aig, x, &[x]));
    }
}
