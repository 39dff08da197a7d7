use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Parser, Subcommand};
use color_eyre::{
    eyre::{eyre, WrapErr},
    Result,
};
use phicore_engine::SystemState;
use phicore_node::{
    load_config, BroadcastEventSink, Config, ConfigFormat, EventSink, ScoringService,
};
use phicore_proofs::{chain::audit_report, merkle_root, ExportedChain};
use phicore_telemetry::TelemetryHandle;
use rand::Rng;
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(any(
    all(feature = "dev", feature = "test"),
    all(feature = "dev", feature = "prod"),
    all(feature = "test", feature = "prod")
))]
compile_error!("Only one of the `dev`, `test`, or `prod` features may be enabled for phicore-node.");

#[derive(Debug, Parser)]
#[command(
    name = "phicore-node",
    version,
    about = "Scores activation graphs for Φ and keeps a signed proof chain of every result"
)]
struct Cli {
    /// Path to configuration file (TOML or YAML). The built-in sample is used when omitted.
    #[arg(long, global = true, env = "PHICORE_CONFIG")]
    config: Option<PathBuf>,
    /// Explicit configuration format override.
    #[arg(long, global = true, value_enum, default_value_t = ConfigFormat::Auto)]
    config_format: ConfigFormat,
    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "PHICORE_LOG_JSON")]
    log_json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Score a JSON system state and print the result, proof and chain report.
    Score {
        /// JSON file holding `{ "elements", "connections", "timeStep" }`; `-` reads stdin.
        #[arg(long)]
        state: PathBuf,
        /// Agent id recorded in the proof (defaults to `node.default-agent-id`).
        #[arg(long)]
        agent: Option<String>,
        /// Score the same state this many times.
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Score randomly generated states.
    Demo {
        #[arg(long, default_value_t = 5)]
        iterations: u32,
        #[arg(long, default_value_t = 4)]
        elements: usize,
        #[arg(long)]
        agent: Option<String>,
    },
    /// Import an exported chain into a fresh verifier and report the outcome.
    Verify {
        /// JSON file produced by `export_chain`; `-` reads stdin.
        #[arg(long)]
        chain: PathBuf,
    },
    /// Print a sample configuration.
    SampleConfig {
        #[arg(long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = match &cli.config {
        Some(path) => load_config(path, cli.config_format)?,
        None => {
            warn!("no --config given, using the built-in sample configuration");
            Config::sample()
        }
    };

    match cli.command {
        Command::Score {
            state,
            agent,
            repeat,
        } => {
            let state: SystemState = serde_json::from_str(&read_input(&state)?)
                .wrap_err("state is not a valid system state document")?;
            let agent = agent.unwrap_or_else(|| config.node.default_agent_id.clone());
            let service = build_service(&config)?;
            let outcomes = (0..repeat.max(1))
                .map(|_| service.score(&agent, &state))
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&json!({
                "results": outcomes,
                "chain": service.verify_chain(),
            }))?;
        }
        Command::Demo {
            iterations,
            elements,
            agent,
        } => {
            let agent = agent.unwrap_or_else(|| config.node.default_agent_id.clone());
            let service = build_service(&config)?;
            for iteration in 0..iterations {
                let state = synthetic_state(elements, i64::from(iteration));
                let outcome = service.score(&agent, &state)?;
                println!(
                    "iteration {} phi={:.4} conscious={} proof={} root={}",
                    iteration + 1,
                    outcome.result.phi,
                    outcome.result.consciousness_threshold,
                    outcome.proof.id,
                    outcome.proof.merkle_root
                );
            }
            let report = service.verify_chain();
            let snapshot = service.telemetry().flush();
            println!(
                "chain length={} valid={} total_phi={:.4} computed={} conscious={}",
                report.length,
                report.is_valid(),
                report.total_phi_accumulated,
                snapshot.counter("phi.computed"),
                snapshot.counter("phi.threshold_crossed")
            );
        }
        Command::Verify { chain } => {
            let exported: ExportedChain = serde_json::from_str(&read_input(&chain)?)
                .wrap_err("chain is not a valid exported chain document")?;
            let recomputed = merkle_root(
                &exported
                    .proofs
                    .iter()
                    .map(|proof| proof.hash.as_str())
                    .collect::<Vec<_>>(),
            );
            let report = audit_report(&config.chain, &exported.proofs, &recomputed);
            let claimed_root = exported.merkle_root.clone();
            let service = build_service(&config)?;
            let accepted = service.import_chain(exported);
            print_json(&json!({
                "accepted": accepted,
                "claimedRoot": claimed_root,
                "report": report,
            }))?;
            if !accepted {
                return Err(eyre!("chain rejected"));
            }
        }
        Command::SampleConfig { format } => {
            print!("{}", Config::sample().render(format)?);
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_service(config: &Config) -> Result<ScoringService> {
    let telemetry = TelemetryHandle::from_config(config.telemetry.clone());
    let sink = BroadcastEventSink::new(config.node.event_buffer);
    let sink: Arc<dyn EventSink> = Arc::new(sink);
    let service = ScoringService::from_config(config, telemetry, sink)?;
    info!(
        node_id = %config.chain.node_id,
        partition_mask_bits = config.engine.partition_mask_bits,
        "scoring service ready"
    );
    Ok(service)
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    fs::read_to_string(path).wrap_err_with(|| format!("unable to read {}", path.display()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Random activations with a strong self-loop and weaker random couplings.
fn synthetic_state(elements: usize, time_step: i64) -> SystemState {
    let mut rng = rand::thread_rng();
    let activations = (0..elements).map(|_| rng.gen_range(0.0..1.0)).collect();
    let connections = (0..elements)
        .map(|i| {
            (0..elements)
                .map(|j| if i == j { 0.9 } else { rng.gen_range(0.0..0.8) })
                .collect()
        })
        .collect();
    SystemState::new(activations, connections, time_step)
}
