//! taskpool demo daemon
//!
//! Runs a batch of simulated tasks through a bounded worker pool backed by
//! the in-memory store, then prints what the store ended up with.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use taskpool_core::Task;
use taskpool_worker::metrics::collect_metrics;
use taskpool_worker::{
    Config, InMemoryTaskStore, MetricsSnapshot, Pool, TaskService, TaskStore, WorkerDeps,
};

/// taskpool - run simulated tasks through a bounded worker pool
#[derive(Parser)]
#[command(name = "taskpool")]
#[command(about = "Run simulated tasks through a bounded worker pool", long_about = None)]
struct Cli {
    /// Number of concurrent workers
    #[arg(short, long, default_value_t = Config::default().worker_count)]
    workers: usize,

    /// Maximum number of queued tasks
    #[arg(short, long, default_value_t = Config::default().queue_capacity)]
    capacity: usize,

    /// Number of tasks to submit
    #[arg(short, long, default_value_t = 5)]
    tasks: usize,

    /// Simulated work time per task, in milliseconds
    #[arg(short, long, default_value_t = 100)]
    duration_ms: u64,

    /// Shut down after this many milliseconds instead of waiting for every task
    #[arg(long)]
    shutdown_after_ms: Option<u64>,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

/// Final state printed on exit.
#[derive(Serialize)]
struct Report {
    tasks: Vec<Task>,
    metrics: MetricsSnapshot,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = Config {
        worker_count: cli.workers,
        queue_capacity: cli.capacity,
    };

    let lifetime = CancellationToken::new();
    let store = Arc::new(InMemoryTaskStore::new());
    let pool = Arc::new(Pool::from_config(&lifetime, &config)?);
    pool.start(WorkerDeps::new(store.clone()))?;

    let service = TaskService::new(store.clone(), pool.clone());
    let duration = Duration::from_millis(cli.duration_ms);

    for i in 1..=cli.tasks {
        let title = format!("task-{i}");
        match service.create(&title, "simulated work", duration).await {
            Ok(task) => info!(task_id = %task.id, title = %title, "Task accepted"),
            Err(e) => warn!(title = %title, error = %e, "Task not accepted"),
        }
    }

    match cli.shutdown_after_ms {
        Some(ms) => {
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_millis(ms)) => {
                    info!(after_ms = ms, "Shutdown deadline reached");
                }
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }
        }
        None => {
            tokio::select! {
                result = wait_for_terminal(&*store) => result?,
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }
        }
    }

    pool.shutdown().await;

    let report = Report {
        tasks: store.list().await?,
        metrics: pool.metrics().snapshot(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Tasks:");
        for task in &report.tasks {
            print_task(task);
        }
        println!();
        print!("{}", collect_metrics(&pool));
    }

    Ok(())
}

/// Poll the store until every stored task reached a terminal status.
async fn wait_for_terminal(store: &dyn TaskStore) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let tasks = store.list().await?;
        if tasks.iter().all(Task::is_terminal) {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn print_task(task: &Task) {
    println!("  - ID:       {}", task.id);
    println!("    Title:    {}", task.title);
    println!("    Status:   {}", task.status);
    println!("    Duration: {}ms", task.duration.as_millis());
    println!("    Updated:  {}", task.updated_at.to_rfc3339());
}
