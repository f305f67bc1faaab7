//! Tseitin encoding of an output cone.
//!
//! A [`ConeCnf`] numbers its variables locally from zero. It is loaded into a
//! solver once per copy, each copy at its own [`VarRange`], so several copies
//! of the same cone can live in one solver.

use std::collections::HashMap;

use log::debug;
use varisat::{ExtendFormula, Lit, Var};

use crate::aig::{Aig, Edge, Node, NodeId};

/// Contiguous block of solver variables holding one copy of a local encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarRange {
    pub base: usize,
    pub count: usize,
}

impl VarRange {
    /// Allocate `count` fresh variables in `solver`.
    pub fn allocate(solver: &mut impl ExtendFormula, count: usize) -> Self {
        let vars: Vec<Var> = (0..count).map(|_| solver.new_var()).collect();
        let base = vars.first().map_or(0, |v| v.index());
        debug_assert!(vars.iter().enumerate().all(|(i, v)| v.index() == base + i));
        Self { base, count }
    }

    /// The range of the same size directly after this one.
    pub fn next(&self) -> Self {
        Self {
            base: self.base + self.count,
            count: self.count,
        }
    }

    pub fn var(&self, local: usize) -> Var {
        assert!(
            local < self.count,
            "local variable {} is outside a range of {}",
            local,
            self.count
        );
        Var::from_index(self.base + local)
    }

    /// Move a local literal into this range.
    pub fn lit(&self, local: Lit) -> Lit {
        Lit::from_var(self.var(local.var().index()), local.is_positive())
    }
}

/// Clauses of the cone driving one primary output.
#[derive(Debug, Clone)]
pub struct ConeCnf {
    num_vars: usize,
    clauses: Vec<Vec<Lit>>,
    node_vars: HashMap<NodeId, Var>,
    /// `(input index, local variable)`, by ascending input index.
    inputs: Vec<(usize, Var)>,
    /// Local literal of the output, inversion included. `None` for a
    /// constant output.
    output: Option<Lit>,
    constant: Option<bool>,
}

impl ConeCnf {
    /// Encode the cone of primary output `index`.
    pub fn build(aig: &Aig, index: usize) -> Self {
        let driver = aig.output_fanin(index);
        if driver.is_constant() {
            debug!("output {} is the constant {}", index, driver.is_complemented());
            return Self {
                num_vars: 0,
                clauses: Vec::new(),
                node_vars: HashMap::new(),
                inputs: Vec::new(),
                output: None,
                constant: Some(driver.is_complemented()),
            };
        }

        let cone = aig.cone(driver.node());
        let mut node_vars = HashMap::new();
        for (i, &id) in cone.nodes.iter().enumerate() {
            node_vars.insert(id, Var::from_index(i));
        }
        let lit_of = |e: Edge| -> Lit {
            let var = *node_vars
                .get(&e.node())
                .unwrap_or_else(|| panic!("node {} of the cone has no variable", e.node()));
            Lit::from_var(var, !e.is_complemented())
        };

        let mut clauses = Vec::new();
        for &id in &cone.nodes {
            let x = lit_of(Edge::from(id));
            match *aig.node(id) {
                Node::Constant => clauses.push(vec![!x]),
                Node::Input { .. } => {}
                Node::And { fanin0, fanin1 } => {
                    let a = lit_of(fanin0);
                    let b = lit_of(fanin1);
                    clauses.push(vec![x, !a, !b]);
                    clauses.push(vec![!x, a]);
                    clauses.push(vec![!x, b]);
                }
                Node::Output { .. } => unreachable!("outputs have no fanout"),
            }
        }

        let inputs = cone
            .inputs
            .iter()
            .map(|&id| {
                let index = aig
                    .input_index(id)
                    .unwrap_or_else(|| panic!("cone input {} is not a primary input", id));
                (index, node_vars[&id])
            })
            .collect();
        let output = Some(lit_of(driver));

        debug!(
            "CNF of output {}: {} variables, {} clauses",
            index,
            cone.nodes.len(),
            clauses.len()
        );
        Self {
            num_vars: cone.nodes.len(),
            clauses,
            node_vars,
            inputs,
            output,
            constant: None,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn clauses(&self) -> &[Vec<Lit>] {
        &self.clauses
    }

    pub fn inputs(&self) -> &[(usize, Var)] {
        &self.inputs
    }

    /// Local variable of primary input `index`, if it is in the cone.
    pub fn input_var(&self, index: usize) -> Option<Var> {
        self.inputs
            .binary_search_by_key(&index, |&(i, _)| i)
            .ok()
            .map(|pos| self.inputs[pos].1)
    }

    pub fn node_var(&self, node: NodeId) -> Option<Var> {
        self.node_vars.get(&node).copied()
    }

    pub fn output(&self) -> Option<Lit> {
        self.output
    }

    /// Value of a constant output.
    pub fn constant(&self) -> Option<bool> {
        self.constant
    }

    /// Add a copy of the clauses at `range`.
    pub fn load(&self, solver: &mut impl ExtendFormula, range: VarRange) {
        assert_eq!(range.count, self.num_vars, "range does not fit the encoding");
        for clause in &self.clauses {
            let shifted: Vec<Lit> = clause.iter().map(|&l| range.lit(l)).collect();
            solver.add_clause(&shifted);
        }
    }
}
