use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use udiscovery_runner::config::WorkerConfig;
use udiscovery_runner::job::{JobRequest, JobStatus};
use udiscovery_runner::runner::JobRunner;
use udiscovery_runner::server::{install_shutdown_handler, run_server, AppState};

#[derive(Parser, Debug)]
#[command(name = "udiscovery-runner")]
#[command(version)]
#[command(about = "Runs the UDiscovery candidate-discovery pipeline worker")]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run one job to completion and print its result
    Run(RunArgs),

    /// Serve the runner over HTTP
    Serve(ServeArgs),
}

// =============================================================================
// Run Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct RunArgs {
    /// The goal to hand to the pipeline; read from stdin when omitted
    goal: Option<String>,

    #[command(flatten)]
    worker: WorkerArgs,

    /// Output format
    #[arg(long, short = 'o', default_value = "json")]
    output: OutputFormat,
}

// =============================================================================
// Serve Arguments
// =============================================================================

#[derive(Parser, Debug)]
struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "8080")]
    port: u16,

    #[command(flatten)]
    worker: WorkerArgs,
}

// =============================================================================
// Worker Arguments (shared by run and serve)
// =============================================================================

#[derive(Parser, Debug)]
struct WorkerArgs {
    /// Worker directory: cwd for the worker, holds the script and virtualenv
    #[arg(long, default_value = "backend")]
    worker_dir: PathBuf,

    /// Worker script, relative to the worker directory
    #[arg(long, default_value = "run_demo_cli.py")]
    script: PathBuf,

    /// Kill the worker after this many seconds (unbounded when omitted)
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl WorkerArgs {
    fn to_config(&self) -> WorkerConfig {
        let mut config = WorkerConfig::new(&self.worker_dir).with_script(&self.script);
        if let Some(secs) = self.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

// =============================================================================
// JSON Output Types
// =============================================================================

#[derive(Serialize)]
struct RunFailureOutput {
    success: bool,
    job_id: Uuid,
    status: JobStatus,
    error: String,
}

// =============================================================================
// Command Handlers
// =============================================================================

async fn run_job(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let goal = match args.goal {
        Some(goal) => goal,
        None => {
            // Mirrors the worker's own CLI: no argument means the goal
            // arrives on stdin.
            let mut input = String::new();
            tokio::io::stdin().read_to_string(&mut input).await?;
            input.trim().to_string()
        }
    };

    let request = match JobRequest::new(goal) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let runner = JobRunner::new(args.worker.to_config());
    let started = Instant::now();

    match runner.run_request(&request).await {
        Ok(payload) => match args.output {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            OutputFormat::Table => {
                println!("Job ID:   {}", request.id);
                println!("Status:   {}", JobStatus::Completed);
                println!("Started:  {}", request.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
                println!("Duration: {:.1}s", started.elapsed().as_secs_f64());
                println!("Result:");
                for line in serde_json::to_string_pretty(&payload)?.lines() {
                    println!("  {}", line);
                }
            }
        },
        Err(e) => {
            match args.output {
                OutputFormat::Json => {
                    let output = RunFailureOutput {
                        success: false,
                        job_id: request.id,
                        status: JobStatus::Failed,
                        error: e.to_string(),
                    };
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Table => {
                    eprintln!("Error: {}", e);
                }
            }
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    let config = args.worker.to_config();

    tracing::info!(
        addr = %addr,
        worker_dir = %config.worker_dir.display(),
        script = %config.script.display(),
        timeout_secs = ?config.timeout.map(|t| t.as_secs()),
        "Starting udiscovery-runner"
    );

    let state = AppState {
        runner: Arc::new(JobRunner::new(config)),
    };
    let shutdown = install_shutdown_handler();
    run_server(addr, state, shutdown).await?;

    Ok(())
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays clean for JSON results
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run(run_args) => {
            run_job(run_args).await?;
        }
        Commands::Serve(serve_args) => {
            run_serve(serve_args).await?;
        }
    }

    Ok(())
}
