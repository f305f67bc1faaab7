//! And-Inverter Graph.
//!
//! Nodes live in an arena indexed by [`NodeId`]. A node is only ever created
//! after its fanins, so ascending ids are a topological order, which every
//! algorithm in this crate relies on. Node `0` is the constant false.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::ops::Not;

use log::debug;

pub type NodeId = usize;

/// Reference to a node, possibly complemented.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    node: NodeId,
    complement: bool,
}

impl Edge {
    pub const fn new(node: NodeId, complement: bool) -> Self {
        Self { node, complement }
    }

    pub const fn constant(value: bool) -> Self {
        // Node 0 is false, so `true` is its complement.
        Self::new(0, value)
    }

    pub const fn node(self) -> NodeId {
        self.node
    }

    pub const fn is_complemented(self) -> bool {
        self.complement
    }

    pub const fn is_constant(self) -> bool {
        self.node == 0
    }

    pub const fn regular(self) -> Self {
        Self::new(self.node, false)
    }

    pub fn not_if(self, cond: bool) -> Self {
        if cond {
            !self
        } else {
            self
        }
    }
}

impl Not for Edge {
    type Output = Edge;

    fn not(self) -> Self::Output {
        Self::new(self.node, !self.complement)
    }
}

impl From<NodeId> for Edge {
    fn from(node: NodeId) -> Self {
        Self::new(node, false)
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.complement {
            write!(f, "!{}", self.node)
        } else {
            write!(f, "{}", self.node)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Constant,
    Input { index: usize },
    And { fanin0: Edge, fanin1: Edge },
    Output { index: usize, fanin: Edge },
}

impl Node {
    pub fn is_and(&self) -> bool {
        matches!(self, Node::And { .. })
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Node::Input { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Node::Output { .. })
    }

    pub fn fanins(&self) -> impl Iterator<Item = Edge> {
        let (a, b) = match *self {
            Node::And { fanin0, fanin1 } => (Some(fanin0), Some(fanin1)),
            Node::Output { fanin, .. } => (Some(fanin), None),
            Node::Constant | Node::Input { .. } => (None, None),
        };
        a.into_iter().chain(b)
    }
}

/// The transitive fan-in of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cone {
    pub root: NodeId,
    /// Every node of the cone (root, AND gates, inputs, constant), ascending.
    pub nodes: Vec<NodeId>,
    /// Primary inputs of the cone, by ascending input index.
    pub inputs: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Aig {
    nodes: Vec<Node>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    input_names: Vec<String>,
    output_names: Vec<String>,
    strash: HashMap<(Edge, Edge), NodeId>,
}

impl Default for Aig {
    fn default() -> Self {
        Self::new()
    }
}

impl Aig {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Constant],
            inputs: Vec::new(),
            outputs: Vec::new(),
            input_names: Vec::new(),
            output_names: Vec::new(),
            strash: HashMap::new(),
        }
    }

    fn push(&mut self, node: Node) -> NodeId {
        for fanin in node.fanins() {
            assert!(
                fanin.node() < self.nodes.len(),
                "fanin {} of a new node does not exist",
                fanin
            );
            assert!(
                !self.nodes[fanin.node()].is_output(),
                "fanin {} of a new node is a primary output",
                fanin
            );
        }
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    pub fn add_input(&mut self) -> Edge {
        let name = format!("pi{}", self.inputs.len());
        self.add_named_input(name)
    }

    pub fn add_named_input(&mut self, name: impl Into<String>) -> Edge {
        let index = self.inputs.len();
        let id = self.push(Node::Input { index });
        self.inputs.push(id);
        self.input_names.push(name.into());
        Edge::from(id)
    }

    pub fn add_output(&mut self, fanin: Edge) -> usize {
        let name = format!("po{}", self.outputs.len());
        self.add_named_output(fanin, name)
    }

    pub fn add_named_output(&mut self, fanin: Edge, name: impl Into<String>) -> usize {
        let index = self.outputs.len();
        let id = self.push(Node::Output { index, fanin });
        self.outputs.push(id);
        self.output_names.push(name.into());
        index
    }

    /// Structurally hashed AND with constant propagation.
    pub fn and(&mut self, a: Edge, b: Edge) -> Edge {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };

        if a == Edge::constant(false) || a == !b {
            return Edge::constant(false);
        }
        if a == Edge::constant(true) {
            return b;
        }
        if a == b {
            return a;
        }

        if let Some(&id) = self.strash.get(&(a, b)) {
            return Edge::from(id);
        }
        let id = self.push(Node::And {
            fanin0: a,
            fanin1: b,
        });
        self.strash.insert((a, b), id);
        Edge::from(id)
    }

    /// AND gate appended as is, without hashing or simplification.
    pub fn and_unhashed(&mut self, a: Edge, b: Edge) -> Edge {
        let id = self.push(Node::And {
            fanin0: a,
            fanin1: b,
        });
        Edge::from(id)
    }

    pub fn or(&mut self, a: Edge, b: Edge) -> Edge {
        !self.and(!a, !b)
    }

    pub fn xor(&mut self, a: Edge, b: Edge) -> Edge {
        let x = self.and(a, !b);
        let y = self.and(!a, b);
        self.or(x, y)
    }

    /// `if s then t else e`.
    pub fn mux(&mut self, s: Edge, t: Edge, e: Edge) -> Edge {
        let x = self.and(s, t);
        let y = self.and(!s, e);
        self.or(x, y)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn num_ands(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_and()).count()
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> NodeId {
        self.inputs[index]
    }

    pub fn output(&self, index: usize) -> NodeId {
        self.outputs[index]
    }

    pub fn input_name(&self, index: usize) -> &str {
        &self.input_names[index]
    }

    pub fn output_name(&self, index: usize) -> &str {
        &self.output_names[index]
    }

    pub fn set_input_name(&mut self, index: usize, name: impl Into<String>) {
        self.input_names[index] = name.into();
    }

    pub fn set_output_name(&mut self, index: usize, name: impl Into<String>) {
        self.output_names[index] = name.into();
    }

    /// The edge driving primary output `index`.
    pub fn output_fanin(&self, index: usize) -> Edge {
        match self.nodes[self.outputs[index]] {
            Node::Output { fanin, .. } => fanin,
            ref node => panic!("output {} is bound to {:?}", index, node),
        }
    }

    /// Input index of a node, if it is a primary input.
    pub fn input_index(&self, id: NodeId) -> Option<usize> {
        match self.nodes[id] {
            Node::Input { index } => Some(index),
            _ => None,
        }
    }

    pub fn and_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.is_and())
            .map(|(id, _)| id)
    }

    /// Fanout lists of every node.
    pub fn fanouts(&self) -> Vec<Vec<NodeId>> {
        let mut fanouts = vec![Vec::new(); self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate() {
            for fanin in node.fanins() {
                fanouts[fanin.node()].push(id);
            }
        }
        fanouts
    }

    /// Logic level of every node: 0 for constant and inputs, the longest
    /// fan-in path otherwise. An output has the level of its driver.
    pub fn levels(&self) -> Vec<usize> {
        let mut levels = vec![0; self.nodes.len()];
        for (id, node) in self.nodes.iter().enumerate() {
            levels[id] = match *node {
                Node::Constant | Node::Input { .. } => 0,
                Node::And { fanin0, fanin1 } => {
                    1 + levels[fanin0.node()].max(levels[fanin1.node()])
                }
                Node::Output { fanin, .. } => levels[fanin.node()],
            };
        }
        levels
    }

    /// Transitive fan-in of `root`.
    pub fn cone(&self, root: NodeId) -> Cone {
        let mut mark = vec![false; self.nodes.len()];
        let mut stack = vec![root];
        mark[root] = true;
        while let Some(id) = stack.pop() {
            for fanin in self.nodes[id].fanins() {
                if !mark[fanin.node()] {
                    mark[fanin.node()] = true;
                    stack.push(fanin.node());
                }
            }
        }

        let nodes: Vec<NodeId> = (0..self.nodes.len()).filter(|&id| mark[id]).collect();
        let mut inputs: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|&id| self.nodes[id].is_input())
            .collect();
        inputs.sort_by_key(|&id| self.input_index(id));
        debug!(
            "cone of {}: {} nodes, {} inputs",
            root,
            nodes.len(),
            inputs.len()
        );

        Cone {
            root,
            nodes,
            inputs,
        }
    }

    /// Structural support of primary output `index`, as ascending input indices.
    pub fn support(&self, index: usize) -> Vec<usize> {
        let root = self.output_fanin(index).node();
        self.cone(root)
            .inputs
            .iter()
            .filter_map(|&id| self.input_index(id))
            .collect()
    }

    /// Simulate the network on one input assignment, returning all node values.
    pub fn simulate(&self, assignment: &[bool]) -> Vec<bool> {
        assert_eq!(
            assignment.len(),
            self.inputs.len(),
            "assignment must cover every primary input"
        );
        let mut values = vec![false; self.nodes.len()];
        let value = |values: &[bool], e: Edge| values[e.node()] ^ e.is_complemented();
        for (id, node) in self.nodes.iter().enumerate() {
            values[id] = match *node {
                Node::Constant => false,
                Node::Input { index } => assignment[index],
                Node::And { fanin0, fanin1 } => value(&values, fanin0) && value(&values, fanin1),
                Node::Output { fanin, .. } => value(&values, fanin),
            };
        }
        values
    }

    /// Output values for one input assignment.
    pub fn eval(&self, assignment: &[bool]) -> Vec<bool> {
        let values = self.simulate(assignment);
        self.outputs.iter().map(|&id| values[id]).collect()
    }

    /// Whether the network is in structurally hashed form: no AND gate has a
    /// constant fanin or two fanins on the same node, and no two AND gates
    /// share the same pair of fanins.
    pub fn is_strashed(&self) -> bool {
        let mut seen = HashMap::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::And { fanin0, fanin1 } = *node {
                if fanin0.is_constant() || fanin1.is_constant() || fanin0.node() == fanin1.node() {
                    debug!("node {} is not hashed: trivial fanins", id);
                    return false;
                }
                let key = if fanin0 <= fanin1 {
                    (fanin0, fanin1)
                } else {
                    (fanin1, fanin0)
                };
                if let Some(other) = seen.insert(key, id) {
                    debug!("node {} duplicates node {}", id, other);
                    return false;
                }
            }
        }
        true
    }

    /// Structurally hashed copy. Inputs and outputs keep their order and names;
    /// AND gates not reachable from any output are dropped.
    pub fn strash(&self) -> Aig {
        let mut res = Aig::new();
        let mut map: Vec<Option<Edge>> = vec![None; self.nodes.len()];
        map[0] = Some(Edge::constant(false));

        for (index, &id) in self.inputs.iter().enumerate() {
            map[id] = Some(res.add_named_input(self.input_names[index].clone()));
        }

        let mut live = vec![false; self.nodes.len()];
        for &o in &self.outputs {
            live[o] = true;
        }
        for id in (0..self.nodes.len()).rev() {
            if live[id] {
                for fanin in self.nodes[id].fanins() {
                    live[fanin.node()] = true;
                }
            }
        }

        let lookup = |map: &[Option<Edge>], e: Edge| {
            map[e.node()]
                .unwrap_or_else(|| panic!("fanin {} is not mapped yet", e))
                .not_if(e.is_complemented())
        };

        for (id, node) in self.nodes.iter().enumerate() {
            if let Node::And { fanin0, fanin1 } = *node {
                if live[id] {
                    let a = lookup(&map, fanin0);
                    let b = lookup(&map, fanin1);
                    map[id] = Some(res.and(a, b));
                }
            }
        }

        for (index, &id) in self.outputs.iter().enumerate() {
            if let Node::Output { fanin, .. } = self.nodes[id] {
                let driver = lookup(&map, fanin);
                res.add_named_output(driver, self.output_names[index].clone());
            }
        }

        debug!(
            "strash: {} -> {} AND gates",
            self.num_ands(),
            res.num_ands()
        );
        res
    }
}
