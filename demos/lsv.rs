//! Command-line front end: multi-output cuts and unateness of an ASCII AIGER file.
//!
//! Run with: `cargo run --example lsv -- circuit.aag mocut 4 2`
//! Other commands: `unate-sat <output> <input>`, `unate-bdd <output> <input>`, `pounate`.

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::info;

use lsv_rs::cut::EnumerateOptions;
use lsv_rs::mocut::{format_groups, CutParams};
use lsv_rs::network::Network;
use lsv_rs::unate::Method;
use lsv_rs::unate_bdd::BddOptions;

#[derive(Parser, Debug)]
#[command(name = "lsv")]
#[command(about = "Multi-output cuts and unateness checking for AIGs")]
struct Args {
    /// ASCII AIGER file
    path: PathBuf,

    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,

    /// Unique table size of the BDD manager, as a power of two
    #[arg(long, default_value_t = 20)]
    storage_bits: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print leaf-sets of at most K nodes that are cuts of at least L AND gates
    Mocut {
        k: usize,
        l: usize,
        /// Enumerate the nodes of each level in parallel
        #[arg(long)]
        parallel: bool,
        /// Count a gate's own singleton cut
        #[arg(long)]
        trivial: bool,
    },
    /// Unateness of one output in one input, by SAT
    UnateSat { output: usize, input: usize },
    /// Unateness of one output in one input, by BDD
    UnateBdd {
        output: usize,
        input: usize,
        /// Build only the BDD of the output cone
        #[arg(long)]
        local: bool,
    },
    /// Unateness of every output in every input
    Pounate {
        /// Use BDDs instead of SAT
        #[arg(long)]
        bdd: bool,
    },
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let level = if args.verbose {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };
    simplelog::TermLogger::init(
        level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = Instant::now();

    let text = std::fs::read_to_string(&args.path)?;
    let mut network = Network::from_aiger(&text)?;
    info!(
        "{}: {} inputs, {} outputs, {} AND gates",
        args.path.display(),
        network.aig().num_inputs(),
        network.aig().num_outputs(),
        network.aig().num_ands()
    );
    let bdd_options = BddOptions {
        storage_bits: args.storage_bits,
    };

    match args.command {
        Command::Mocut {
            k,
            l,
            parallel,
            trivial,
        } => {
            let params = CutParams::conventional(k, l)?.with_trivial(trivial);
            network.strash();
            let groups = network.multi_output_cuts(&params, EnumerateOptions { parallel })?;
            print!("{}", format_groups(&groups));
        }
        Command::UnateSat { output, input } => {
            network.strash();
            let result = network.classify_unateness(output, input, Method::Sat)?;
            println!("{}", result);
        }
        Command::UnateBdd {
            output,
            input,
            local,
        } => {
            let result = if local {
                network.classify_unateness_local(output, input, bdd_options)?
            } else {
                network.collapse(bdd_options)?;
                network.classify_unateness(output, input, Method::Bdd)?
            };
            println!("{}", result);
            if let Some(witness) = &result.witness {
                info!(
                    "rising assignments: {}, falling assignments: {}",
                    witness.rising_count.as_ref().map_or("-".to_string(), |c| c.to_string()),
                    witness.falling_count.as_ref().map_or("-".to_string(), |c| c.to_string())
                );
            }
        }
        Command::Pounate { bdd } => {
            let method = if bdd {
                network.collapse(bdd_options)?;
                Method::Bdd
            } else {
                network.strash();
                Method::Sat
            };
            for report in network.unate_report(method)? {
                println!("{}", report);
            }
        }
    }

    let time_total = time_total.elapsed();
    info!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
