//! Unateness by BDD cofactoring.
//!
//! With `f0` and `f1` the cofactors of an output on an input, the output is
//! independent of the input if `f0 = f1`, positive unate if `f0 → f1`,
//! negative unate if `f1 → f0`, and binate otherwise. Binate witnesses are
//! cubes of `f1 ∧ ¬f0` (rising) and `f0 ∧ ¬f1` (falling).
//!
//! Two representations are supported: [`GlobalBdds`] holds every output in
//! one manager with variable `j + 1` for primary input `j`, and [`ConeBdd`]
//! builds a single output in a fresh manager with one variable per input of
//! its cone.

use log::{debug, info};
use num_bigint::BigUint;

use crate::aig::{Aig, Edge, Node};
use crate::bdd::Bdd;
use crate::error::{Error, Result};
use crate::reference::Ref;
use crate::unate::{BinateWitness, Pattern, UnateResult, Unateness};

#[derive(Debug, Clone, Copy)]
pub struct BddOptions {
    /// The unique table holds `2^storage_bits` nodes.
    pub storage_bits: usize,
}

impl Default for BddOptions {
    fn default() -> Self {
        Self { storage_bits: 20 }
    }
}

impl BddOptions {
    fn manager(&self) -> Result<Bdd> {
        if !(1..=31).contains(&self.storage_bits) {
            return Err(Error::InvalidStorageBits {
                bits: self.storage_bits,
            });
        }
        Ok(Bdd::new(self.storage_bits))
    }
}

fn edge_ref(refs: &[Option<Ref>], e: Edge) -> Ref {
    let r = refs[e.node()].unwrap_or_else(|| panic!("node {} has no BDD yet", e.node()));
    if e.is_complemented() {
        -r
    } else {
        r
    }
}

/// Build BDDs for the nodes selected by `wanted`, in topological order.
/// `input_var` gives the BDD variable of each primary input index.
fn build_nodes(
    bdd: &Bdd,
    aig: &Aig,
    wanted: impl Iterator<Item = usize>,
    input_var: impl Fn(usize) -> u32,
) -> Result<Vec<Option<Ref>>> {
    let mut refs = vec![None; aig.num_nodes()];
    for id in wanted {
        let r = match *aig.node(id) {
            Node::Constant => bdd.zero(),
            Node::Input { index } => bdd
                .mk_var(input_var(index))
                .map_err(|e| Error::bdd_limit(format!("creating the variable of input {}", index), e))?,
            Node::And { fanin0, fanin1 } => bdd
                .apply_and(edge_ref(&refs, fanin0), edge_ref(&refs, fanin1))
                .map_err(|e| Error::bdd_limit(format!("building node {}", id), e))?,
            Node::Output { fanin, .. } => edge_ref(&refs, fanin),
        };
        refs[id] = Some(r);
    }
    Ok(refs)
}

/// Cofactor `f` on `var` and classify, reading witnesses back through
/// `var_input`, which maps BDD variables to primary input indices.
#[allow(clippy::too_many_arguments)]
fn classify_function(
    bdd: &Bdd,
    f: Ref,
    var: u32,
    num_inputs: usize,
    var_input: impl Fn(u32) -> usize,
    num_vars: usize,
    output: usize,
    input: usize,
) -> Result<UnateResult> {
    let stage = |what: &str| format!("{} for output {}, input {}", what, output, input);

    let f0 = bdd
        .cofactor(f, var, false)
        .map_err(|e| Error::bdd_limit(stage("cofactoring"), e))?;
    let f1 = bdd
        .cofactor(f, var, true)
        .map_err(|e| Error::bdd_limit(stage("cofactoring"), e))?;

    let unateness = if f0 == f1 {
        Unateness::Independent
    } else if bdd.is_implies(f0, f1) {
        Unateness::PositiveUnate
    } else if bdd.is_implies(f1, f0) {
        Unateness::NegativeUnate
    } else {
        Unateness::Binate
    };
    debug!("output {}, input {}: {}", output, input, unateness);
    if unateness != Unateness::Binate {
        return Ok(UnateResult::new(output, input, unateness));
    }

    let rising = bdd
        .apply_and(f1, -f0)
        .map_err(|e| Error::bdd_limit(stage("extracting the rising witness"), e))?;
    let falling = bdd
        .apply_and(f0, -f1)
        .map_err(|e| Error::bdd_limit(stage("extracting the falling witness"), e))?;

    let pattern = |g: Ref| -> Pattern {
        let mut values = vec![Some(false); num_inputs];
        for lit in bdd.one_sat(g).unwrap_or_default() {
            values[var_input(lit.var().id())] = Some(lit.is_positive());
        }
        values[input] = None;
        Pattern(values)
    };

    // Count over the support of `f` without the queried variable.
    let support = bdd.support(f).len();
    let count = |g: Ref| -> BigUint { bdd.sat_count(g, num_vars) >> (num_vars - support + 1) };

    Ok(UnateResult::binate(
        output,
        input,
        BinateWitness {
            rising: pattern(rising),
            falling: pattern(falling),
            rising_count: Some(count(rising)),
            falling_count: Some(count(falling)),
        },
    ))
}

fn check_output(aig: &Aig, output: usize) -> Result<()> {
    if output >= aig.num_outputs() {
        return Err(Error::OutputOutOfRange {
            index: output,
            count: aig.num_outputs(),
        });
    }
    Ok(())
}

fn check_input(aig: &Aig, input: usize) -> Result<()> {
    if input >= aig.num_inputs() {
        return Err(Error::InputOutOfRange {
            index: input,
            count: aig.num_inputs(),
        });
    }
    Ok(())
}

/// BDDs of all primary outputs in one manager.
#[derive(Debug)]
pub struct GlobalBdds {
    bdd: Bdd,
    outputs: Vec<Ref>,
    num_inputs: usize,
}

impl GlobalBdds {
    /// Collapse every primary output. Input `j` becomes BDD variable `j + 1`.
    pub fn collapse(aig: &Aig, options: BddOptions) -> Result<Self> {
        let bdd = options.manager()?;
        let refs = build_nodes(&bdd, aig, 0..aig.num_nodes(), |index| index as u32 + 1)?;
        let outputs: Vec<Ref> = aig
            .outputs()
            .iter()
            .map(|&id| refs[id].unwrap_or_else(|| panic!("output node {} was not built", id)))
            .collect();
        info!(
            "collapsed {} outputs into {} BDD nodes",
            outputs.len(),
            bdd.num_nodes()
        );
        Ok(Self {
            bdd,
            outputs,
            num_inputs: aig.num_inputs(),
        })
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Function of primary output `index`, inversion included.
    pub fn output(&self, index: usize) -> Ref {
        self.outputs[index]
    }

    pub fn classify(&self, aig: &Aig, output: usize, input: usize) -> Result<UnateResult> {
        check_output(aig, output)?;
        check_input(aig, input)?;
        assert_eq!(
            (self.outputs.len(), self.num_inputs),
            (aig.num_outputs(), aig.num_inputs()),
            "BDDs were collapsed from a different network"
        );
        classify_function(
            &self.bdd,
            self.outputs[output],
            input as u32 + 1,
            self.num_inputs,
            |var| var as usize - 1,
            self.num_inputs,
            output,
            input,
        )
    }
}

/// BDD of one output over the inputs of its cone.
#[derive(Debug)]
pub struct ConeBdd {
    bdd: Bdd,
    output: usize,
    function: Ref,
    /// Primary input index of BDD variable `j + 1`.
    inputs: Vec<usize>,
}

impl ConeBdd {
    pub fn build(aig: &Aig, output: usize, options: BddOptions) -> Result<Self> {
        check_output(aig, output)?;
        let root = aig.output(output);
        let cone = aig.cone(root);
        let inputs: Vec<usize> = cone
            .inputs
            .iter()
            .filter_map(|&id| aig.input_index(id))
            .collect();

        let mut var_of = vec![0; aig.num_inputs()];
        for (j, &index) in inputs.iter().enumerate() {
            var_of[index] = j as u32 + 1;
        }

        let bdd = options.manager()?;
        let refs = build_nodes(&bdd, aig, cone.nodes.iter().copied(), |index| var_of[index])?;
        let function = refs[root].unwrap_or_else(|| panic!("output node {} was not built", root));
        debug!(
            "cone BDD of output {}: {} inputs, {} nodes",
            output,
            inputs.len(),
            bdd.size(function)
        );
        Ok(Self {
            bdd,
            output,
            function,
            inputs,
        })
    }

    pub fn bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn function(&self) -> Ref {
        self.function
    }

    pub fn classify(&self, aig: &Aig, input: usize) -> Result<UnateResult> {
        check_input(aig, input)?;
        let Some(position) = self.inputs.iter().position(|&i| i == input) else {
            return Ok(UnateResult::new(self.output, input, Unateness::Independent));
        };
        classify_function(
            &self.bdd,
            self.function,
            position as u32 + 1,
            aig.num_inputs(),
            |var| self.inputs[var as usize - 1],
            self.inputs.len(),
            self.output,
            input,
        )
    }
}
