use hermes_runner::{AuctionSimulation, SimulationConfig};
use std::path::PathBuf;
use std::time::Duration;

fn print_help() {
    eprintln!(
        r#"Hermes - concurrent auction simulator

USAGE:
    hermes-runner [OPTIONS]

OPTIONS:
    --auctions <N>        Number of concurrent auctions (default: 40)
    --bidders <N>         Number of simulated bidders (default: 100)
    --timeout-secs <N>    Auction timeout in seconds (default: 5)
    --workers <N>         Bid worker tasks (default: number of CPUs)
    --queue-capacity <N>  Bid queue capacity (default: auctions x 100)
    --out <PATH>          Output directory (default: outputs)
    --seed <N>            Random seed (default: derived from the clock)
    --help                Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG              Log level filter

EXAMPLES:
    # Run with defaults
    hermes-runner

    # Short deterministic run
    hermes-runner --auctions 10 --bidders 20 --timeout-secs 2 --seed 7
"#
    );
}

fn parse_value<T: std::str::FromStr>(args: &[String], i: &mut usize, flag: &str) -> T {
    *i += 1;
    let Some(raw) = args.get(*i) else {
        eprintln!("Error: {flag} requires a value");
        std::process::exit(1);
    };
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            eprintln!("Error: invalid value '{raw}' for {flag}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let mut config = SimulationConfig {
        seed: chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) as u64,
        ..SimulationConfig::default()
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--auctions" => config.auctions = parse_value(&args, &mut i, "--auctions"),
            "--bidders" => config.bidders = parse_value(&args, &mut i, "--bidders"),
            "--timeout-secs" => {
                config.timeout = Duration::from_secs(parse_value(&args, &mut i, "--timeout-secs"));
            }
            "--workers" => config.workers = parse_value(&args, &mut i, "--workers"),
            "--queue-capacity" => {
                config.queue_capacity = Some(parse_value(&args, &mut i, "--queue-capacity"));
            }
            "--out" => {
                config.output_dir = PathBuf::from(parse_value::<String>(&args, &mut i, "--out"));
            }
            "--seed" => config.seed = parse_value(&args, &mut i, "--seed"),
            arg => {
                eprintln!("Unknown argument: {arg}");
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    log::info!(
        "starting simulation: {} auctions, {} bidders, {:?} timeout, seed {}",
        config.auctions,
        config.bidders,
        config.timeout,
        config.seed
    );

    let results = AuctionSimulation::new(config).run().await?;
    log::info!(
        "report written: {} records, {} bids submitted, {} dropped",
        results.summary.auctions.len(),
        results.submitted,
        results.dropped
    );
    Ok(())
}
