//! Query boundary: a network together with its optional BDD representation.

use log::info;

use crate::aig::Aig;
use crate::aiger::parse_aiger;
use crate::cut::EnumerateOptions;
use crate::error::{Error, Result};
use crate::mocut::{multi_output_cuts, CutParams, MultiOutputCut};
use crate::unate::{Method, UnateReport, UnateResult};
use crate::unate_bdd::{BddOptions, ConeBdd, GlobalBdds};
use crate::unate_sat::UnateSolver;

#[derive(Debug)]
pub struct Network {
    aig: Aig,
    bdds: Option<GlobalBdds>,
}

impl Network {
    pub fn new(aig: Aig) -> Self {
        Self { aig, bdds: None }
    }

    pub fn from_aiger(text: &str) -> Result<Self> {
        Ok(Self::new(parse_aiger(text)?))
    }

    pub fn aig(&self) -> &Aig {
        &self.aig
    }

    pub fn is_strashed(&self) -> bool {
        self.aig.is_strashed()
    }

    /// Replace the AIG by its structurally hashed form. Collapsed BDDs stay
    /// valid, since inputs, outputs and functions are unchanged.
    pub fn strash(&mut self) {
        self.aig = self.aig.strash();
    }

    pub fn bdds(&self) -> Option<&GlobalBdds> {
        self.bdds.as_ref()
    }

    /// Build and attach the BDDs of all outputs.
    pub fn collapse(&mut self, options: BddOptions) -> Result<()> {
        self.bdds = Some(GlobalBdds::collapse(&self.aig, options)?);
        Ok(())
    }

    fn check_output(&self, output: usize) -> Result<()> {
        if output >= self.aig.num_outputs() {
            return Err(Error::OutputOutOfRange {
                index: output,
                count: self.aig.num_outputs(),
            });
        }
        Ok(())
    }

    fn check_input(&self, input: usize) -> Result<()> {
        if input >= self.aig.num_inputs() {
            return Err(Error::InputOutOfRange {
                index: input,
                count: self.aig.num_inputs(),
            });
        }
        Ok(())
    }

    fn check_method(&self, method: Method) -> Result<()> {
        match method {
            Method::Sat if !self.aig.is_strashed() => Err(Error::NotStrashed),
            Method::Bdd if self.bdds.is_none() => Err(Error::MissingBdd),
            _ => Ok(()),
        }
    }

    pub fn enumerate_multi_output_cuts(&self, k: usize, l: usize) -> Result<Vec<MultiOutputCut>> {
        let params = CutParams::new(k, l)?;
        self.multi_output_cuts(&params, EnumerateOptions::default())
    }

    pub fn multi_output_cuts(
        &self,
        params: &CutParams,
        options: EnumerateOptions,
    ) -> Result<Vec<MultiOutputCut>> {
        multi_output_cuts(&self.aig, params, options)
    }

    /// Classify primary output `output` against primary input `input`.
    ///
    /// The SAT method needs a structurally hashed network, the BDD method a
    /// collapsed one.
    pub fn classify_unateness(
        &self,
        output: usize,
        input: usize,
        method: Method,
    ) -> Result<UnateResult> {
        self.check_output(output)?;
        self.check_input(input)?;
        self.check_method(method)?;
        match (method, &self.bdds) {
            (Method::Bdd, Some(bdds)) => bdds.classify(&self.aig, output, input),
            _ => UnateSolver::new(&self.aig, output)?.classify(input),
        }
    }

    /// Classify with a BDD of the output cone alone, built for this query.
    pub fn classify_unateness_local(
        &self,
        output: usize,
        input: usize,
        options: BddOptions,
    ) -> Result<UnateResult> {
        self.check_output(output)?;
        self.check_input(input)?;
        ConeBdd::build(&self.aig, output, options)?.classify(&self.aig, input)
    }

    /// Classify every output against every input.
    pub fn unate_report(&self, method: Method) -> Result<Vec<UnateReport>> {
        self.check_method(method)?;
        let mut reports = Vec::with_capacity(self.aig.num_outputs());
        for output in 0..self.aig.num_outputs() {
            let results = match (method, &self.bdds) {
                (Method::Bdd, Some(bdds)) => (0..self.aig.num_inputs())
                    .map(|input| bdds.classify(&self.aig, output, input))
                    .collect::<Result<Vec<_>>>()?,
                _ => UnateSolver::new(&self.aig, output)?.classify_all()?,
            };
            reports.push(UnateReport::from_results(&self.aig, output, &results));
        }
        info!(
            "unateness of {} outputs against {} inputs",
            self.aig.num_outputs(),
            self.aig.num_inputs()
        );
        Ok(reports)
    }
}

impl From<Aig> for Network {
    fn from(aig: Aig) -> Self {
        Self::new(aig)
    }
}

pub fn enumerate_multi_output_cuts(
    network: &Network,
    k: usize,
    l: usize,
) -> Result<Vec<MultiOutputCut>> {
    network.enumerate_multi_output_cuts(k, l)
}

pub fn classify_unateness(
    network: &Network,
    output: usize,
    input: usize,
    method: Method,
) -> Result<UnateResult> {
    network.classify_unateness(output, input, method)
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::aig::Edge;
    use crate::error::ErrorKind;
    use crate::unate::Unateness;

    fn raw_network() -> Network {
        let mut aig = Aig::new();
        let a = aig.add_named_input("a");
        let b = aig.add_named_input("b");
        let x = aig.and_unhashed(a, b);
        let y = aig.and_unhashed(a, b);
        let z = aig.and_unhashed(x, !y);
        aig.add_named_output(x, "f");
        aig.add_named_output(!z, "g");
        Network::new(aig)
    }

    #[test]
    fn test_preconditions() {
        let mut network = raw_network();
        assert!(!network.is_strashed());

        let err = network.classify_unateness(0, 0, Method::Sat).unwrap_err();
        assert!(matches!(err, Error::NotStrashed));
        assert_eq!(err.kind(), ErrorKind::Precondition);
        let err = network.classify_unateness(0, 0, Method::Bdd).unwrap_err();
        assert!(matches!(err, Error::MissingBdd));

        // Usage errors come first.
        let err = network.classify_unateness(5, 0, Method::Sat).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);

        network.strash();
        assert!(network.is_strashed());
        let r = classify_unateness(&network, 0, 0, Method::Sat).unwrap();
        assert_eq!(r.unateness, Unateness::PositiveUnate);

        network.collapse(BddOptions::default()).unwrap();
        let r = classify_unateness(&network, 0, 1, Method::Bdd).unwrap();
        assert_eq!(r.unateness, Unateness::PositiveUnate);
    }

    #[test]
    fn test_constant_after_strash() {
        // g = !(x & !x) is the constant 1.
        let mut network = raw_network();
        network.strash();
        assert_eq!(network.aig().output_fanin(1), Edge::constant(true));
        network.collapse(BddOptions::default()).unwrap();
        for method in [Method::Sat, Method::Bdd] {
            for input in 0..2 {
                let r = network.classify_unateness(1, input, method).unwrap();
                assert_eq!(r.unateness, Unateness::Independent);
            }
        }
    }

    #[test]
    fn test_local_bdd() {
        let network = raw_network();
        let r = network
            .classify_unateness_local(0, 1, BddOptions::default())
            .unwrap();
        assert_eq!(r.unateness, Unateness::PositiveUnate);
        let r = network
            .classify_unateness_local(1, 1, BddOptions::default())
            .unwrap();
        assert_eq!(r.unateness, Unateness::Independent);
    }

    #[test]
    fn test_report() {
        let mut network = raw_network();
        network.strash();
        network.collapse(BddOptions::default()).unwrap();

        let sat = network.unate_report(Method::Sat).unwrap();
        let bdd = network.unate_report(Method::Bdd).unwrap();
        assert_eq!(sat, bdd);
        let text: Vec<String> = sat.iter().map(|r| r.to_string()).collect();
        assert_eq!(
            text,
            vec![
                "node f:\n+unate inputs: a,b",
                "node g:\n+unate inputs: a,b\n-unate inputs: a,b",
            ]
        );
    }

    #[test]
    fn test_cut_bounds() {
        let network = raw_network();
        let err = enumerate_multi_output_cuts(&network, 0, 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);

        // x and y are distinct gates over {a, b} before strashing.
        let groups = network.enumerate_multi_output_cuts(3, 2).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].to_string(), "1 2 : 3 4 5");
    }
}
