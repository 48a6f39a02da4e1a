//! Circuit Sim CLI
//!
//! Run the two-car circuit headless through deterministic scenarios.

use circuit_core::CircuitConfig;
use circuit_env::{CircuitContext, DataSource, EnvError, TokioContext};
use circuit_sim::scenarios::ScenarioId;
use circuit_sim::{RerunLogger, ScenarioResult, ScenarioRunner, SimConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Circuit headless simulation CLI
#[derive(Parser, Debug)]
#[command(name = "circuit-sim")]
#[command(about = "Run the racing circuit headless through deterministic scenarios", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,
    
    /// Scenario to run (free_drive, race, manual_scrub, jittery_frames, all)
    #[arg(short = 'S', long, default_value = "all")]
    scenario: String,
    
    /// Number of consecutive seeds to test (for CI mode)
    #[arg(long, default_value = "1")]
    seeds: usize,
    
    /// Simulation duration in seconds
    #[arg(short, long, default_value = "10")]
    duration: f64,
    
    /// Frames per simulated second
    #[arg(short = 'r', long, default_value = "60")]
    tick_rate: u32,
    
    /// Circuit configuration (JSON, partial files allowed)
    #[arg(short, long)]
    config: Option<PathBuf>,
    
    /// Directory path data files are read from (enables on-disk paths)
    #[arg(long)]
    data_root: Option<PathBuf>,
    
    /// Data file of path 1, relative to the data root
    #[arg(long)]
    path1: Option<String>,
    
    /// Data file of path 2, relative to the data root
    #[arg(long)]
    path2: Option<String>,
    
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
    
    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,
    
    /// Export frames of a single scenario to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,
    
    /// Replay runs in the Rerun viewer (needs the `visualization` feature)
    #[arg(long)]
    visualize: bool,
    
    /// Print the effective circuit configuration and exit
    #[arg(long)]
    print_config: bool,
}

/// Loads the circuit configuration and applies path overrides.
fn load_config(args: &Args) -> Result<CircuitConfig, String> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            CircuitConfig::from_json(&json)
                .map_err(|e| format!("Invalid config {}: {}", path.display(), e))?
        }
        None => CircuitConfig::default(),
    };
    
    if let Some(path1) = &args.path1 {
        config.path1.data_file = DataSource::from(path1.as_str());
    }
    if let Some(path2) = &args.path2 {
        config.path2.data_file = DataSource::from(path2.as_str());
    }
    
    Ok(config)
}

/// Reads on-disk path data through the production context.
///
/// With `--data-root` both paths come from disk; otherwise only the ones
/// overridden on the command line do.
async fn load_disk_sources(args: &Args, config: &CircuitConfig) -> Result<Vec<(DataSource, Vec<u8>)>, EnvError> {
    let root = args.data_root.clone().unwrap_or_else(|| PathBuf::from("."));
    let ctx = TokioContext::with_root(root);
    
    let wanted = [
        (&config.path1.data_file, args.data_root.is_some() || args.path1.is_some()),
        (&config.path2.data_file, args.data_root.is_some() || args.path2.is_some()),
    ];
    
    let mut sources = Vec::new();
    for (source, from_disk) in wanted {
        if from_disk {
            let bytes = ctx.fetch(source).await?;
            info!("Loaded {} ({} bytes) from {}", source, bytes.len(), ctx.resolve(source).display());
            sources.push((source.clone(), bytes));
        }
    }
    
    Ok(sources)
}

fn print_result(result: &ScenarioResult) {
    if result.passed {
        match &result.winner {
            Some(winner) => info!(
                "✓ {} (seed={}) PASSED - winner {} | laps={:?}",
                result.scenario.name(),
                result.seed,
                winner,
                result.laps
            ),
            None => info!(
                "✓ {} (seed={}) PASSED | laps={:?}",
                result.scenario.name(),
                result.seed,
                result.laps
            ),
        }
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    
    // Initialize logging (RUST_LOG wins over --verbose)
    let level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
    
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };
    
    if args.print_config {
        match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize config: {}", e);
                std::process::exit(2);
            }
        }
        return;
    }
    
    if !args.json {
        info!("Circuit Sim v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }
    
    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        match args.scenario.parse() {
            Ok(scenario) => vec![scenario],
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Available scenarios: free_drive, race, manual_scrub, jittery_frames, all");
                std::process::exit(1);
            }
        }
    };
    
    if args.export.is_some() && (scenarios.len() > 1 || args.seeds > 1) {
        eprintln!("Error: --export only supports a single scenario and seed");
        std::process::exit(1);
    }
    
    let sources = if args.data_root.is_some() || args.path1.is_some() || args.path2.is_some() {
        match load_disk_sources(&args, &config).await {
            Ok(sources) => sources,
            Err(e) => {
                error!("Failed to load path data: {}", e);
                std::process::exit(2);
            }
        }
    } else {
        Vec::new()
    };
    
    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42)
    } else {
        args.seed
    };
    
    let logger = if args.visualize {
        RerunLogger::new("circuit-sim")
    } else {
        RerunLogger::disabled()
    };
    
    // Track results
    let mut all_results: Vec<ScenarioResult> = Vec::new();
    let mut failed_count = 0;
    
    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        
        let runner = sources.iter().fold(
            ScenarioRunner::from_config(SimConfig {
                seed,
                tick_rate_hz: args.tick_rate.max(1),
                max_duration_secs: args.duration,
            })
            .with_circuit(config.clone()),
            |runner, (source, bytes)| runner.with_source(source.clone(), bytes.clone()),
        );
        
        for scenario in &scenarios {
            if !args.json {
                info!("▶ {} - {}", scenario.name(), scenario.description());
            }
            
            let result = if args.export.is_some() || logger.is_enabled() {
                let (result, export) = runner.run_with_export(*scenario).await;
                
                if let Some(path) = &args.export {
                    match export.write_to_file(path) {
                        Ok(()) => info!("Exported {} frames to {}", export.frames.len(), path.display()),
                        Err(e) => error!("Failed to write export: {:?}", e),
                    }
                }
                logger.replay(&export);
                result
            } else {
                runner.run(*scenario).await
            };
            
            if !args.json {
                print_result(&result);
            }
            
            if !result.passed {
                failed_count += 1;
            }
            
            all_results.push(result);
        }
    }
    
    // Summary
    let total = all_results.len();
    let passed = total - failed_count;
    
    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": passed,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "ticks": r.total_ticks,
                    "time_secs": r.final_time_secs,
                    "laps": r.laps,
                    "winner": r.winner,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to serialize summary: {}", e),
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        
        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
            
            // List failed seeds
            for result in &all_results {
                if !result.passed {
                    error!("  - {} seed={}: {}",
                        result.scenario.name(),
                        result.seed,
                        result.failure_reason.as_deref().unwrap_or("unknown")
                    );
                }
            }
        }
    }
    
    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
}
