//! Runs a memory reference trace through the simulator and prints the
//! counters.
//!
//! ```text
//! cargo run --example simulate -- <trace> [memsize] [clock|s2q] [swapsize]
//! ```

use std::{fs::File, io::BufReader};

use vmsim::{ReplacementAlgorithm, SimConfig, Simulator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: simulate <trace> [memsize] [clock|s2q] [swapsize]");
        std::process::exit(1);
    };

    let mut config = SimConfig::default();
    if let Some(memsize) = args.next() {
        config = config.with_memsize(memsize.parse()?);
    }
    if let Some(algorithm) = args.next() {
        config = config.with_algorithm(algorithm.parse::<ReplacementAlgorithm>()?);
    }
    if let Some(swapsize) = args.next() {
        config = config.with_swapsize(swapsize.parse()?);
    }

    let mut sim = Simulator::new(config)?;
    sim.run_trace(BufReader::new(File::open(path)?))?;

    println!("{}", sim.finish()?);
    Ok(())
}
