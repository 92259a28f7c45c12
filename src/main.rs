mod assembler;
mod config;
mod http;
mod metrics;
mod probes;
mod rate;
mod scheduler;
mod snapshot;
mod store;

use assembler::Assembler;
use axum::serve;
use clap::Parser;
use config::Config;
use metrics::Metrics;
use probes::system::SystemProbes;
use rate::RateTracker;
use scheduler::Scheduler;
use std::net::SocketAddr;
use std::path::PathBuf;
use store::SnapshotStore;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hoststat")]
#[command(version)]
struct Cli {
    /// YAML config file; built-in defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Overrides `listen` from the config file.
    #[arg(long)]
    listen: Option<String>,
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if cli.print_default_config {
        println!("{}", Config::example_yaml());
        return;
    }

    let mut cfg = match &cli.config {
        Some(path) => match Config::load_from_file(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                error!(error = %err, "failed to load configuration");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };
    if let Some(listen) = cli.listen {
        cfg.listen = listen;
        if let Err(err) = cfg.validate() {
            error!(error = %err, "invalid --listen");
            std::process::exit(1);
        }
    }

    info!(
        listen = %cfg.listen,
        interval_secs = cfg.interval_secs,
        "starting hoststat"
    );

    let metrics = match Metrics::new() {
        Ok(m) => m,
        Err(err) => {
            error!(error = %err, "failed to initialise metrics");
            std::process::exit(1);
        }
    };
    let store = SnapshotStore::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let collector_task = {
        let probes = SystemProbes::new(
            cfg.sensors.clone(),
            cfg.cpu_sample_window(),
            cfg.collector.all_partitions,
        );
        let assembler = Assembler::new(
            probes,
            RateTracker::new(cfg.collector.on_network_failure),
            store.clone(),
            metrics.clone(),
            cfg.collector.root_path.clone(),
        );
        Scheduler::new(assembler, cfg.interval()).spawn(shutdown_rx.clone())
    };

    let mut http_task = {
        let listen = cfg.listen.clone();
        let app = http::build_router(metrics.clone(), store.clone());
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let addr: SocketAddr = match listen.parse() {
                Ok(addr) => addr,
                Err(err) => {
                    error!(error = %err, listen = %listen, "invalid listen address");
                    return;
                }
            };

            let listener = match TcpListener::bind(addr).await {
                Ok(l) => l,
                Err(err) => {
                    error!(error = %err, listen = %addr, "failed to bind HTTP listener");
                    return;
                }
            };
            info!(listen = %addr, "serving GET /stats");

            let server = serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            });

            if let Err(err) = server.await {
                error!(error = %err, "HTTP server error");
            }
        })
    };

    let http_exited_early = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(err) = res {
                error!(error = %err, "failed to listen for Ctrl+C");
            }
            info!("Ctrl+C received, shutting down");
            false
        }
        _ = &mut http_task => true,
    };

    let _ = shutdown_tx.send(true);

    let _ = collector_task.await;
    if http_exited_early {
        std::process::exit(1);
    }
    let _ = http_task.await;
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
