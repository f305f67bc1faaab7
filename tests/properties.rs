use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_log::test;

use lsv_rs::aig::{Aig, Edge, Node, NodeId};
use lsv_rs::cut::{enumerate_cuts, is_irredundant_cut, is_valid_cut, Cut, EnumerateOptions};
use lsv_rs::mocut::{group_cuts, CutParams};
use lsv_rs::network::Network;
use lsv_rs::unate::{Method, Unateness};
use lsv_rs::unate_bdd::{BddOptions, ConeBdd};

fn random_aig(rng: &mut StdRng, num_inputs: usize, num_gates: usize, num_outputs: usize) -> Aig {
    let mut aig = Aig::new();
    let mut pool: Vec<Edge> = (0..num_inputs).map(|_| aig.add_input()).collect();
    for _ in 0..num_gates {
        let i = rng.gen_range(0..pool.len());
        let mut j = rng.gen_range(0..pool.len());
        while pool[j].node() == pool[i].node() {
            j = rng.gen_range(0..pool.len());
        }
        let a = pool[i].not_if(rng.gen_bool(0.5));
        let b = pool[j].not_if(rng.gen_bool(0.5));
        let g = aig.and(a, b);
        pool.push(g);
    }
    for _ in 0..num_outputs {
        // Favour recent gates so outputs have deep cones.
        let lo = pool.len().saturating_sub(4);
        let e = pool[rng.gen_range(lo..pool.len())];
        aig.add_output(e.not_if(rng.gen_bool(0.5)));
    }
    aig
}

/// Unateness from the truth table.
fn brute_force(aig: &Aig, output: usize, input: usize) -> Unateness {
    let n = aig.num_inputs();
    let (mut rises, mut falls) = (false, false);
    for bits in 0..(1u32 << n) {
        if bits & (1 << input) != 0 {
            continue;
        }
        let mut values: Vec<bool> = (0..n).map(|j| bits & (1 << j) != 0).collect();
        let low = aig.eval(&values)[output];
        values[input] = true;
        let high = aig.eval(&values)[output];
        rises |= !low && high;
        falls |= low && !high;
    }
    match (rises, falls) {
        (false, false) => Unateness::Independent,
        (true, false) => Unateness::PositiveUnate,
        (false, true) => Unateness::NegativeUnate,
        (true, true) => Unateness::Binate,
    }
}

/// All irredundant cuts of `node` with at most `k` leaves, by exhaustive search.
fn brute_force_cuts(aig: &Aig, node: NodeId, k: usize) -> BTreeSet<Vec<NodeId>> {
    let candidates: Vec<NodeId> = aig
        .cone(node)
        .nodes
        .into_iter()
        .filter(|&id| !matches!(aig.node(id), Node::Constant))
        .collect();
    let mut result = BTreeSet::new();
    let mut stack: Vec<(usize, Vec<NodeId>)> = vec![(0, Vec::new())];
    while let Some((start, leaves)) = stack.pop() {
        if !leaves.is_empty() && is_irredundant_cut(aig, node, &leaves) {
            result.insert(leaves.clone());
        }
        if leaves.len() == k {
            continue;
        }
        for (i, &c) in candidates.iter().enumerate().skip(start) {
            let mut next = leaves.clone();
            next.push(c);
            stack.push((i + 1, next));
        }
    }
    result
}

#[test]
fn test_cuts_are_valid_and_irredundant() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..20 {
        let aig = random_aig(&mut rng, 5, 12, 2);
        for k in 1..=4 {
            let table = enumerate_cuts(&aig, k, EnumerateOptions::default()).unwrap();
            for (id, cuts) in table.iter() {
                for cut in cuts {
                    assert!(cut.len() <= k);
                    assert!(is_valid_cut(&aig, id, cut.leaves()), "{} is not a cut of {}", cut, id);
                    assert!(
                        is_irredundant_cut(&aig, id, cut.leaves()),
                        "{} is a redundant cut of {}",
                        cut,
                        id
                    );
                }
            }
        }
    }
}

#[test]
fn test_cuts_are_complete() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..10 {
        let aig = random_aig(&mut rng, 4, 8, 1);
        for k in 1..=3 {
            let table = enumerate_cuts(&aig, k, EnumerateOptions::default()).unwrap();
            for id in aig.and_nodes() {
                let enumerated: BTreeSet<Vec<NodeId>> =
                    table.cuts(id).iter().map(|c| c.leaves().to_vec()).collect();
                assert_eq!(enumerated, brute_force_cuts(&aig, id, k), "node {}, k = {}", id, k);
            }
        }
    }
}

#[test]
fn test_parallel_enumeration() {
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..5 {
        let aig = random_aig(&mut rng, 8, 60, 4);
        let seq = enumerate_cuts(&aig, 5, EnumerateOptions { parallel: false }).unwrap();
        let par = enumerate_cuts(&aig, 5, EnumerateOptions { parallel: true }).unwrap();
        assert_eq!(seq, par);
    }
}

#[test]
fn test_aggregation_soundness() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..10 {
        let aig = random_aig(&mut rng, 5, 15, 3);
        let params = CutParams::new(3, 2).unwrap();
        let table = enumerate_cuts(&aig, params.k, EnumerateOptions::default()).unwrap();
        let groups = group_cuts(&aig, &table, &params);

        let mut expected: BTreeMap<Cut, Vec<NodeId>> = BTreeMap::new();
        for id in aig.and_nodes() {
            for cut in table.cuts(id) {
                if !cut.is_trivial_for(id) {
                    expected.entry(cut.clone()).or_default().push(id);
                }
            }
        }
        expected.retain(|_, nodes| nodes.len() >= params.l);

        let actual: BTreeMap<Cut, Vec<NodeId>> = groups
            .into_iter()
            .map(|g| (g.leaves, g.nodes))
            .collect();
        assert_eq!(actual, expected);
    }
}

#[test]
fn test_engines_agree() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..25 {
        let aig = random_aig(&mut rng, 5, 14, 3);
        let mut network = Network::new(aig);
        network.collapse(BddOptions::default()).unwrap();
        let aig = network.aig();

        for output in 0..aig.num_outputs() {
            let cone = ConeBdd::build(aig, output, BddOptions::default()).unwrap();
            for input in 0..aig.num_inputs() {
                let expected = brute_force(aig, output, input);
                let sat = network.classify_unateness(output, input, Method::Sat).unwrap();
                let bdd = network.classify_unateness(output, input, Method::Bdd).unwrap();
                let local = cone.classify(aig, input).unwrap();

                assert_eq!(sat.unateness, expected, "SAT, output {}, input {}", output, input);
                assert_eq!(bdd.unateness, expected, "BDD, output {}, input {}", output, input);
                assert_eq!(local.unateness, expected);
                for r in [&sat, &bdd, &local] {
                    assert!(r.check_witness(aig), "bad witness for {:?}", r);
                }
            }
        }
    }
}

#[test]
fn test_report_engines_agree() {
    let mut rng = StdRng::seed_from_u64(5);
    let aig = random_aig(&mut rng, 6, 20, 4);
    let mut network = Network::new(aig);
    network.collapse(BddOptions::default()).unwrap();
    assert_eq!(
        network.unate_report(Method::Sat).unwrap(),
        network.unate_report(Method::Bdd).unwrap()
    );
}
