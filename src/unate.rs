//! Unateness results and their textual form.

use std::fmt::{Display, Formatter};

use num_bigint::BigUint;

use crate::aig::Aig;

/// Dependence of an output on one input, after the output's inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unateness {
    /// Both cofactors are equal.
    Independent,
    /// `f(x=0) ≤ f(x=1)`.
    PositiveUnate,
    /// `f(x=0) ≥ f(x=1)`.
    NegativeUnate,
    Binate,
}

impl Display for Unateness {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Unateness::Independent => "independent",
            Unateness::PositiveUnate => "positive unate",
            Unateness::NegativeUnate => "negative unate",
            Unateness::Binate => "binate",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Sat,
    Bdd,
}

/// Assignment to all primary inputs; `None` is a don't-care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(pub Vec<Option<bool>>);

impl Pattern {
    /// Replace every don't-care with `fill`.
    pub fn assignment(&self, fill: bool) -> Vec<bool> {
        self.0.iter().map(|v| v.unwrap_or(fill)).collect()
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for value in &self.0 {
            let c = match value {
                Some(false) => '0',
                Some(true) => '1',
                None => '-',
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// Evidence of a binate dependence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinateWitness {
    /// The output follows the input under this pattern.
    pub rising: Pattern,
    /// The output follows the negated input under this pattern.
    pub falling: Pattern,
    /// Assignments of the other support inputs under which the output
    /// follows the input (BDD engine only).
    pub rising_count: Option<BigUint>,
    pub falling_count: Option<BigUint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnateResult {
    pub output: usize,
    pub input: usize,
    pub unateness: Unateness,
    pub witness: Option<BinateWitness>,
}

impl UnateResult {
    pub fn new(output: usize, input: usize, unateness: Unateness) -> Self {
        Self {
            output,
            input,
            unateness,
            witness: None,
        }
    }

    pub fn binate(output: usize, input: usize, witness: BinateWitness) -> Self {
        Self {
            output,
            input,
            unateness: Unateness::Binate,
            witness: Some(witness),
        }
    }

    /// Whether the witness patterns exhibit the claimed transitions on `aig`.
    pub fn check_witness(&self, aig: &Aig) -> bool {
        let Some(witness) = &self.witness else {
            return self.unateness != Unateness::Binate;
        };
        let follows = |pattern: &Pattern, rising: bool| {
            if pattern.0.get(self.input) != Some(&None) {
                return false;
            }
            let low = aig.eval(&pattern.assignment(false))[self.output];
            let high = aig.eval(&pattern.assignment(true))[self.output];
            low != high && high == rising
        };
        follows(&witness.rising, true) && follows(&witness.falling, false)
    }
}

impl Display for UnateResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.unateness)?;
        if let Some(witness) = &self.witness {
            write!(f, "\n{}\n{}", witness.rising, witness.falling)?;
        }
        Ok(())
    }
}

/// Classification of one output against every primary input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnateReport {
    pub output_name: String,
    pub positive: Vec<String>,
    pub negative: Vec<String>,
    pub binate: Vec<String>,
}

impl UnateReport {
    /// Sort per-input results of one output into the report lists.
    /// Independent inputs are both positive and negative unate.
    pub fn from_results(aig: &Aig, output: usize, results: &[UnateResult]) -> Self {
        let mut report = Self {
            output_name: aig.output_name(output).to_string(),
            positive: Vec::new(),
            negative: Vec::new(),
            binate: Vec::new(),
        };
        for result in results {
            let name = aig.input_name(result.input).to_string();
            match result.unateness {
                Unateness::Independent => {
                    report.positive.push(name.clone());
                    report.negative.push(name);
                }
                Unateness::PositiveUnate => report.positive.push(name),
                Unateness::NegativeUnate => report.negative.push(name),
                Unateness::Binate => report.binate.push(name),
            }
        }
        report
    }
}

impl Display for UnateReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node {}:", self.output_name)?;
        for (label, names) in [
            ("+unate", &self.positive),
            ("-unate", &self.negative),
            ("binate", &self.binate),
        ] {
            if !names.is_empty() {
                write!(f, "\n{} inputs: {}", label, names.join(","))?;
            }
        }
        Ok(())
    }
}
