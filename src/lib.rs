//! # lsv-rs: multi-output cuts and unateness for And-Inverter Graphs
//!
//! **`lsv-rs`** answers two structural and functional questions about a combinational
//! network given as an **And-Inverter Graph (AIG)**:
//!
//! - **Multi-output cuts**: which leaf-sets of at most `k` nodes are irredundant cuts of at
//!   least `l` AND gates at once.
//! - **Unateness**: whether an output is positive unate, negative unate, binate, or
//!   independent in an input, decided either by **SAT** (two copies of the output cone in
//!   one incremental solver) or by **BDD** cofactoring.
//!
//! ## Quick Start
//!
//! ```rust
//! use lsv_rs::aig::Aig;
//! use lsv_rs::network::Network;
//! use lsv_rs::unate::{Method, Unateness};
//! use lsv_rs::unate_bdd::BddOptions;
//!
//! // f = a & !b
//! let mut aig = Aig::new();
//! let a = aig.add_named_input("a");
//! let b = aig.add_named_input("b");
//! let f = aig.and(a, !b);
//! aig.add_named_output(f, "f");
//!
//! let mut network = Network::new(aig);
//! let r = network.classify_unateness(0, 1, Method::Sat).unwrap();
//! assert_eq!(r.unateness, Unateness::NegativeUnate);
//!
//! // The BDD method works on collapsed networks.
//! network.collapse(BddOptions::default()).unwrap();
//! let r = network.classify_unateness(0, 0, Method::Bdd).unwrap();
//! assert_eq!(r.to_string(), "positive unate");
//! ```
//!
//! ## Core Components
//!
//! - **[`aig`]**: The AIG arena, structural hashing, cones and simulation.
//! - **[`cut`]** and **[`mocut`]**: Cut enumeration and multi-output cut groups.
//! - **[`cnf`]** and **[`unate_sat`]**: Tseitin encoding and the SAT engine.
//! - **[`bdd`]** and **[`unate_bdd`]**: The BDD manager and the BDD engine.
//! - **[`network`]**: The query entry points, with their preconditions.

pub mod aig;
pub mod aiger;
pub mod bdd;
pub mod cache;
pub mod cnf;
pub mod cut;
pub mod error;
pub mod mocut;
pub mod network;
pub mod reference;
pub mod sat;
pub mod table;
pub mod types;
pub mod unate;
pub mod unate_bdd;
pub mod unate_sat;
pub mod utils;
