mod config;
mod infrastructure;
mod session;

use std::ops::ControlFlow;

use anyhow::Context;
use colored::Colorize;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

use self::config::{build_config, MonitorConfig};
use self::session::{Request, Session};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = build_config().with_context(|| "Failed to build config".red())?;
    let monitor_config: MonitorConfig =
        config.try_deserialize().with_context(|| "Invalid config".red())?;

    init_logging().with_context(|| "Failed to initialize logger".red())?;

    let session = Session::new(&monitor_config);
    session.open(monitor_config.job()).await;
    tracing::info!(user = %monitor_config.current_user, "Job monitor started");
    println!("{}", Request::USAGE.dimmed());

    let mut lines = read_stdin();
    loop {
        let line = tokio::select! {
            Some(line) = lines.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping job monitor (ctrl-c handling).");
                break;
            }
        };
        let request = match Request::parse(&line, session.current_user()) {
            Ok(request) => request,
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                continue;
            }
        };
        if let ControlFlow::Break(()) = session.handle(request).await {
            break;
        }
    }

    session.close().await;
    Ok(())
}

/// Lines typed on stdin. A pending read must not hold up runtime shutdown,
/// hence the plain thread. Once stdin closes only ctrl-c ends the session.
fn read_stdin() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Logs go to stderr, stdout carries the tailed logs.
fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
