use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use distributed_matmul::config::{
    ClusterConfig, ConfigOverrides, DEFAULT_WORKER_HOST, DEFAULT_WORKER_PORT,
};
use distributed_matmul::coordinator::Coordinator;
use distributed_matmul::coordinator::types::WorkerAddress;
use distributed_matmul::error::MatmulError;
use distributed_matmul::matrix::loader::load_matrix_pair;
use distributed_matmul::matrix::reference::multiply_serial;
use distributed_matmul::matrix::writer::export_pretty;
use distributed_matmul::worker::service::WorkerService;
use std::path::PathBuf;

const DEFAULT_INPUT: &str = "matrix-1.txt";
const DEFAULT_PARALLEL_OUTPUT: &str = "result_parallel.txt";
const DEFAULT_SERIAL_OUTPUT: &str = "result_serial.txt";

#[derive(Parser)]
#[command(name = "matmul", about = "Distributed integer matrix multiplication")]
struct Cli {
    /// Enable debug logging (per-cell and per-dot-product lines).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a dot-product worker until killed.
    Server {
        #[arg(long, default_value = DEFAULT_WORKER_HOST)]
        host: String,
        #[arg(long, default_value_t = DEFAULT_WORKER_PORT)]
        port: u16,
    },
    /// Multiply the matrices in the input file using the worker cluster (default).
    Client(ClientArgs),
    /// Multiply locally on a single thread.
    Serial {
        #[arg(long, default_value = DEFAULT_INPUT)]
        input: PathBuf,
        #[arg(long, default_value = DEFAULT_SERIAL_OUTPUT)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct ClientArgs {
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,
    #[arg(long, default_value = DEFAULT_PARALLEL_OUTPUT)]
    output: PathBuf,
    /// TOML cluster configuration; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Worker address (host:port). Repeat to list several; replaces the configured list.
    #[arg(long = "worker")]
    workers: Vec<WorkerAddress>,
    #[arg(long)]
    max_in_flight: Option<usize>,
    #[arg(long)]
    per_worker_limit: Option<usize>,
    #[arg(long)]
    timeout_ms: Option<u64>,
}

impl Default for ClientArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output: PathBuf::from(DEFAULT_PARALLEL_OUTPUT),
            config: None,
            workers: Vec::new(),
            max_in_flight: None,
            per_worker_limit: None,
            timeout_ms: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Command::Server { host, port }) => run_server(&host, port).await,
        Some(Command::Client(args)) => run_client(args).await,
        Some(Command::Serial { input, output }) => run_serial(input, output),
        None => run_client(ClientArgs::default()).await,
    }
}

async fn run_server(host: &str, port: u16) -> anyhow::Result<()> {
    let service = WorkerService::bind(host, port)
        .await
        .with_context(|| format!("failed to bind worker on {}:{}", host, port))?;
    tracing::info!("Press Ctrl+C to shutdown");
    service.serve().await;
    Ok(())
}

async fn run_client(args: ClientArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ClusterConfig::load(path)?,
        None => ClusterConfig::default(),
    }
    .with_overrides(ConfigOverrides {
        workers: args.workers,
        max_in_flight: args.max_in_flight,
        per_worker_limit: args.per_worker_limit,
        task_timeout_ms: args.timeout_ms,
    })?;

    let (left, right) = load_matrix_pair(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    tracing::info!(
        "Workers: {}",
        config
            .workers
            .iter()
            .map(|w| w.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let coordinator = Coordinator::new(config);
    match coordinator.multiply(&left, &right).await {
        Ok(result) => {
            export_pretty(&result, &args.output)?;
            println!("Parallel result exported to {}", args.output.display());
            Ok(())
        }
        Err(MatmulError::TaskFailure { failures }) => {
            eprintln!("{} cell(s) failed, no result written:", failures.len());
            for failure in &failures {
                eprintln!("  {}", failure);
            }
            tracing::debug!("Failure report: {}", serde_json::to_string(&failures)?);
            anyhow::bail!("distributed multiplication failed")
        }
        Err(e) => Err(e.into()),
    }
}

fn run_serial(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    let (left, right) = load_matrix_pair(&input)
        .with_context(|| format!("failed to load {}", input.display()))?;
    let result = multiply_serial(&left, &right)?;
    export_pretty(&result, &output)?;
    println!("Serial result exported to {}", output.display());
    Ok(())
}
