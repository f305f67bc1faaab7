//! Multi-output cuts: leaf-sets shared by several AND gates.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use log::info;

use crate::aig::{Aig, NodeId};
use crate::cut::{enumerate_cuts, Cut, CutTable, EnumerateOptions};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutParams {
    /// Maximum number of leaves.
    pub k: usize,
    /// Minimum number of nodes sharing a leaf-set.
    pub l: usize,
    /// Also count a node's own singleton cut.
    pub include_trivial: bool,
}

impl CutParams {
    pub fn new(k: usize, l: usize) -> Result<Self> {
        if k == 0 || l == 0 {
            return Err(Error::InvalidCutBounds {
                k,
                l,
                expected: "k >= 1 and l >= 1",
            });
        }
        Ok(Self {
            k,
            l,
            include_trivial: false,
        })
    }

    /// Bounds in the range accepted by the command-line front end.
    pub fn conventional(k: usize, l: usize) -> Result<Self> {
        if !(3..=6).contains(&k) || !(1..=4).contains(&l) {
            return Err(Error::InvalidCutBounds {
                k,
                l,
                expected: "3 <= k <= 6 and 1 <= l <= 4",
            });
        }
        Self::new(k, l)
    }

    pub fn with_trivial(self, include_trivial: bool) -> Self {
        Self {
            include_trivial,
            ..self
        }
    }
}

/// A leaf-set together with every AND gate it is a cut of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiOutputCut {
    pub leaves: Cut,
    pub nodes: Vec<NodeId>,
}

impl Display for MultiOutputCut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} :", self.leaves)?;
        for node in &self.nodes {
            write!(f, " {}", node)?;
        }
        Ok(())
    }
}

/// Invert a cut table into leaf-set groups of at least `params.l` AND gates,
/// ordered by leaf-set.
pub fn group_cuts(aig: &Aig, table: &CutTable, params: &CutParams) -> Vec<MultiOutputCut> {
    let mut groups: BTreeMap<&Cut, BTreeSet<NodeId>> = BTreeMap::new();
    for id in aig.and_nodes() {
        for cut in table.cuts(id) {
            if cut.is_empty() || (!params.include_trivial && cut.is_trivial_for(id)) {
                continue;
            }
            groups.entry(cut).or_default().insert(id);
        }
    }

    let total = groups.len();
    let result: Vec<MultiOutputCut> = groups
        .into_iter()
        .filter(|(_, nodes)| nodes.len() >= params.l)
        .map(|(leaves, nodes)| MultiOutputCut {
            leaves: leaves.clone(),
            nodes: nodes.into_iter().collect(),
        })
        .collect();
    info!(
        "{} of {} leaf-sets are shared by at least {} nodes",
        result.len(),
        total,
        params.l
    );
    result
}

pub fn multi_output_cuts(
    aig: &Aig,
    params: &CutParams,
    options: EnumerateOptions,
) -> Result<Vec<MultiOutputCut>> {
    let table = enumerate_cuts(aig, params.k, options)?;
    Ok(group_cuts(aig, &table, params))
}

/// One line per group: `<leaves> : <nodes>`.
pub fn format_groups(groups: &[MultiOutputCut]) -> String {
    groups.iter().map(|g| format!("{}\n", g)).collect()
}
