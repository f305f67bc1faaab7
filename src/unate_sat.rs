//! Unateness by SAT on two copies of an output cone.
//!
//! Copies A and B of the cone are loaded into one solver. Each cone input `j`
//! gets an enable variable `e_j` with `e_j → (a_j ↔ b_j)`. A query for input
//! `i` assumes every `e_j` except `e_i`, sets `a_i = 0` and `b_i = 1`, then
//! asks for an output falling from A to B (refuting positive unateness) and
//! for an output rising from A to B (refuting negative unateness). The same
//! solver answers any number of input queries.

use std::collections::HashSet;

use log::{debug, warn};
use varisat::{ExtendFormula, Lit, Solver, Var};

use crate::aig::Aig;
use crate::cnf::{ConeCnf, VarRange};
use crate::error::{Error, Result};
use crate::unate::{BinateWitness, Pattern, UnateResult, Unateness};

pub struct UnateSolver<'a> {
    aig: &'a Aig,
    output: usize,
    cnf: ConeCnf,
    solver: Solver<'static>,
    copy_a: VarRange,
    copy_b: VarRange,
    /// Enable variable of each cone input, in the order of `cnf.inputs()`.
    enables: Vec<Var>,
}

impl<'a> UnateSolver<'a> {
    /// Encode the cone of primary output `output`.
    pub fn new(aig: &'a Aig, output: usize) -> Result<Self> {
        if output >= aig.num_outputs() {
            return Err(Error::OutputOutOfRange {
                index: output,
                count: aig.num_outputs(),
            });
        }

        let cnf = ConeCnf::build(aig, output);
        let mut solver = Solver::new();
        let copy_a = VarRange::allocate(&mut solver, cnf.num_vars());
        let copy_b = VarRange::allocate(&mut solver, cnf.num_vars());
        assert_eq!(copy_b, copy_a.next(), "copies must be adjacent");
        cnf.load(&mut solver, copy_a);
        cnf.load(&mut solver, copy_b);

        let mut enables = Vec::with_capacity(cnf.inputs().len());
        for &(_, local) in cnf.inputs() {
            let enable = solver.new_var();
            let a = Lit::from_var(copy_a.var(local.index()), true);
            let b = Lit::from_var(copy_b.var(local.index()), true);
            let e = Lit::from_var(enable, true);
            solver.add_clause(&[!e, !a, b]);
            solver.add_clause(&[!e, a, !b]);
            enables.push(enable);
        }

        debug!(
            "SAT unateness for output {}: 2 x {} variables, {} enable variables",
            output,
            cnf.num_vars(),
            enables.len()
        );
        Ok(Self {
            aig,
            output,
            cnf,
            solver,
            copy_a,
            copy_b,
            enables,
        })
    }

    pub fn output(&self) -> usize {
        self.output
    }

    /// Classify the output against primary input `input`.
    pub fn classify(&mut self, input: usize) -> Result<UnateResult> {
        let num_inputs = self.aig.num_inputs();
        if input >= num_inputs {
            return Err(Error::InputOutOfRange {
                index: input,
                count: num_inputs,
            });
        }

        let (Some(out), Some(position)) = (
            self.cnf.output(),
            self.cnf.inputs().iter().position(|&(i, _)| i == input),
        ) else {
            debug!("input {} is outside the support of output {}", input, self.output);
            return Ok(UnateResult::new(self.output, input, Unateness::Independent));
        };

        let local = self.cnf.inputs()[position].1;
        let mut assumptions: Vec<Lit> = self
            .enables
            .iter()
            .enumerate()
            .map(|(j, &e)| Lit::from_var(e, j != position))
            .collect();
        assumptions.push(Lit::from_var(self.copy_a.var(local.index()), false));
        assumptions.push(Lit::from_var(self.copy_b.var(local.index()), true));

        let y_a = self.copy_a.lit(out);
        let y_b = self.copy_b.lit(out);

        // Raising the input lowers the output.
        let falling = self.solve_with(&assumptions, [y_a, !y_b], input)?;
        // Raising the input raises the output.
        let rising = self.solve_with(&assumptions, [!y_a, y_b], input)?;

        let result = match (rising, falling) {
            (None, None) => UnateResult::new(self.output, input, Unateness::Independent),
            (Some(_), None) => UnateResult::new(self.output, input, Unateness::PositiveUnate),
            (None, Some(_)) => UnateResult::new(self.output, input, Unateness::NegativeUnate),
            (Some(rising), Some(falling)) => UnateResult::binate(
                self.output,
                input,
                BinateWitness {
                    rising,
                    falling,
                    rising_count: None,
                    falling_count: None,
                },
            ),
        };
        debug!("output {}, input {}: {}", self.output, input, result.unateness);
        Ok(result)
    }

    /// Classify the output against every primary input, in order.
    pub fn classify_all(&mut self) -> Result<Vec<UnateResult>> {
        (0..self.aig.num_inputs()).map(|i| self.classify(i)).collect()
    }

    fn solve_with(
        &mut self,
        assumptions: &[Lit],
        outputs: [Lit; 2],
        input: usize,
    ) -> Result<Option<Pattern>> {
        let mut all = assumptions.to_vec();
        all.extend(outputs);
        self.solver.assume(&all);

        let inconclusive = |reason: String| {
            warn!(
                "SAT query for output {}, input {} is inconclusive: {}",
                self.output, input, reason
            );
            Error::Inconclusive {
                output: self.output,
                input,
                reason,
            }
        };

        match self.solver.solve() {
            Ok(false) => Ok(None),
            Ok(true) => {
                let model = self
                    .solver
                    .model()
                    .ok_or_else(|| inconclusive("solver reported SAT without a model".to_string()))?;
                Ok(Some(self.pattern(&model, input)))
            }
            Err(e) => Err(inconclusive(format!("{:?}", e))),
        }
    }

    /// Input values of copy A; inputs outside the cone are 0.
    fn pattern(&self, model: &[Lit], input: usize) -> Pattern {
        let positive: HashSet<Var> = model
            .iter()
            .filter(|l| l.is_positive())
            .map(|l| l.var())
            .collect();
        let mut values = vec![Some(false); self.aig.num_inputs()];
        for &(index, local) in self.cnf.inputs() {
            values[index] = Some(positive.contains(&self.copy_a.var(local.index())));
        }
        values[input] = None;
        Pattern(values)
    }
}
