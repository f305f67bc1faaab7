use test_log::test;

use lsv_rs::aig::Aig;
use lsv_rs::cut::{enumerate_cuts, Cut, EnumerateOptions};
use lsv_rs::error::ErrorKind;
use lsv_rs::mocut::format_groups;
use lsv_rs::network::{classify_unateness, enumerate_multi_output_cuts, Network};
use lsv_rs::unate::{Method, Unateness};
use lsv_rs::unate_bdd::BddOptions;

fn ready(aig: Aig) -> Network {
    let mut network = Network::new(aig);
    network.strash();
    network.collapse(BddOptions::default()).unwrap();
    network
}

fn both(network: &Network, output: usize, input: usize) -> Unateness {
    let sat = classify_unateness(network, output, input, Method::Sat).unwrap();
    let bdd = classify_unateness(network, output, input, Method::Bdd).unwrap();
    assert_eq!(sat, bdd.clone().without_counts());
    sat.unateness
}

trait WithoutCounts {
    fn without_counts(self) -> Self;
}

impl WithoutCounts for lsv_rs::unate::UnateResult {
    fn without_counts(mut self) -> Self {
        if let Some(w) = self.witness.as_mut() {
            w.rising_count = None;
            w.falling_count = None;
        }
        self
    }
}

#[test]
fn test_two_input_and() {
    let mut aig = Aig::new();
    let a = aig.add_input();
    let b = aig.add_input();
    let x = aig.and(a, b);
    aig.add_output(x);

    let table = enumerate_cuts(&aig, 2, EnumerateOptions::default()).unwrap();
    let cuts: Vec<&Cut> = table.cuts(x.node()).iter().collect();
    assert_eq!(cuts.len(), 2);
    assert!(cuts.contains(&&Cut::new(vec![a.node(), b.node()])));
    assert!(cuts.contains(&&Cut::trivial(x.node())));

    let network = ready(aig);
    assert_eq!(both(&network, 0, 0), Unateness::PositiveUnate);
    assert_eq!(both(&network, 0, 1), Unateness::PositiveUnate);
}

#[test]
fn test_not() {
    let mut aig = Aig::new();
    let a = aig.add_input();
    aig.add_output(!a);

    let network = ready(aig);
    assert_eq!(both(&network, 0, 0), Unateness::NegativeUnate);
    let r = classify_unateness(&network, 0, 0, Method::Sat).unwrap();
    assert_eq!(r.to_string(), "negative unate");
}

#[test]
fn test_xor() {
    let mut aig = Aig::new();
    let a = aig.add_input();
    let b = aig.add_input();
    let x = aig.xor(a, b);
    aig.add_output(x);

    let network = ready(aig);
    for input in 0..2 {
        assert_eq!(both(&network, 0, input), Unateness::Binate);
        let r = classify_unateness(&network, 0, input, Method::Bdd).unwrap();
        let w = r.witness.as_ref().unwrap();
        let other = 1 - input;
        // The two cubes differ in the other input only.
        assert_eq!(w.rising.0[input], None);
        assert_eq!(w.falling.0[input], None);
        assert_ne!(w.rising.0[other], w.falling.0[other]);
        assert!(r.check_witness(network.aig()));
    }
    let r = classify_unateness(&network, 0, 0, Method::Sat).unwrap();
    assert_eq!(r.to_string(), "binate\n-0\n-1");
}

#[test]
fn test_shared_leaf_set() {
    let mut aig = Aig::new();
    let x = aig.add_input();
    let y = aig.add_input();
    let g1 = aig.and(x, y);
    let g2 = aig.and(!x, y);
    aig.add_output(g1);
    aig.add_output(g2);

    let network = Network::new(aig);
    let groups = enumerate_multi_output_cuts(&network, 3, 2).unwrap();
    let shared = groups
        .iter()
        .find(|g| g.leaves == Cut::new(vec![x.node(), y.node()]))
        .unwrap();
    assert!(shared.nodes.contains(&g1.node()));
    assert!(shared.nodes.contains(&g2.node()));
    assert_eq!(format_groups(&groups), "1 2 : 3 4\n");
}

#[test]
fn test_aiger_end_to_end() {
    // f = a & !b, g = a | c, named through the symbol table.
    let src = "\
aag 6 3 0 2 2
2
4
6
8
11
8 2 5
10 3 7
i0 a
i1 b
i2 c
o0 f
o1 g
";
    let mut network = Network::from_aiger(src).unwrap();
    network.strash();
    network.collapse(BddOptions::default()).unwrap();

    for method in [Method::Sat, Method::Bdd] {
        let text: Vec<String> = network
            .unate_report(method)
            .unwrap()
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(
            text,
            vec![
                "node f:\n+unate inputs: a,c\n-unate inputs: b,c",
                "node g:\n+unate inputs: a,b,c\n-unate inputs: b",
            ]
        );
    }
}

#[test]
fn test_error_taxonomy() {
    let mut aig = Aig::new();
    let a = aig.add_input();
    let b = aig.add_input();
    let x = aig.and_unhashed(a, b);
    let y = aig.and_unhashed(a, b);
    let z = aig.and_unhashed(x, y);
    aig.add_output(z);
    let network = Network::new(aig);

    let err = classify_unateness(&network, 0, 0, Method::Sat).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let err = classify_unateness(&network, 0, 0, Method::Bdd).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Precondition);
    let err = classify_unateness(&network, 0, 2, Method::Sat).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);
    let err = enumerate_multi_output_cuts(&network, 2, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Usage);

    let mut small = Network::new(network.aig().clone());
    let err = small.collapse(BddOptions { storage_bits: 2 }).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceExhausted);
}
