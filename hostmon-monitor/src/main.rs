use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use hostmon_monitor::monitor::{StatusMonitor, DEFAULT_MONITOR_INTERVAL_SECS};
use hostmon_monitor::pidfile::write_pid_file;
use hostmon_monitor::provider_manager::ProviderManager;
use hostmon_monitor::{provision, reporter};
use hostmon_providers::ServerRequest;

#[derive(Parser)]
#[command(name = "hostmon")]
#[command(about = "Provisions compute hosts and monitors their statuses", long_about = None)]
struct Cli {
    /// Provider region name
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the provider and report host states to the configured sink
    Monitor {
        /// The interval in seconds to wait between each probe
        #[arg(long, default_value_t = DEFAULT_MONITOR_INTERVAL_SECS)]
        monitor_interval: u64,

        /// Path to a filename that should contain the monitor process id
        #[arg(long)]
        pid_file: Option<PathBuf>,
    },
    /// Create a server correlated to an orchestration node
    Create {
        /// Node identifier written into the server metadata
        #[arg(long)]
        node_id: String,

        /// Path to a JSON server request
        #[arg(long)]
        server_spec: PathBuf,
    },
    /// Start a server (no-op while it is building)
    Start {
        #[arg(long)]
        server_id: String,
    },
    /// Delete a server
    Delete {
        #[arg(long)]
        server_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let provider_name = ProviderManager::current_provider_name();
    let provider = ProviderManager::get_provider(&provider_name, cli.region.as_deref())
        .ok_or_else(|| anyhow::anyhow!("provider '{}' is not configured", provider_name))?;

    match cli.command {
        Command::Monitor {
            monitor_interval,
            pid_file,
        } => {
            anyhow::ensure!(monitor_interval > 0, "monitor interval must be positive");

            if let Some(path) = &pid_file {
                write_pid_file(path)
                    .with_context(|| format!("Failed to write pid file {}", path.display()))?;
            }

            let reporter = reporter::from_env()?;
            let monitor = StatusMonitor::new(
                provider,
                reporter,
                Duration::from_secs(monitor_interval),
            );

            let shutdown = CancellationToken::new();
            spawn_signal_listener(shutdown.clone());

            monitor.run(shutdown).await;
        }
        Command::Create {
            node_id,
            server_spec,
        } => {
            let raw = std::fs::read_to_string(&server_spec)
                .with_context(|| format!("Failed to read {}", server_spec.display()))?;
            let request: ServerRequest = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid server request in {}", server_spec.display()))?;

            let server_id = provision::create(provider.as_ref(), &node_id, request).await?;
            println!("{}", server_id);
        }
        Command::Start { server_id } => {
            provision::start(provider.as_ref(), &server_id).await?;
        }
        Command::Delete { server_id } => {
            provision::delete(provider.as_ref(), &server_id).await?;
        }
    }

    Ok(())
}

/// Cancels the token on the first terminate, interrupt or quit signal; the
/// monitor then finishes its in-flight pass and exits cleanly.
fn spawn_signal_listener(shutdown: CancellationToken) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut interrupt = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut quit = signal(SignalKind::quit()).expect("install SIGQUIT handler");

        tokio::select! {
            _ = terminate.recv() => {}
            _ = interrupt.recv() => {}
            _ = quit.recv() => {}
        }

        println!("📡 received shutdown signal, stopping monitor");
        shutdown.cancel();
    });
}
