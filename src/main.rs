mod attendance;
mod config;
mod db;
mod error;
mod http;
mod logging;
mod model;
mod roster;
mod store;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use tracing::info;

fn main() {
    let cli = config::Cli::parse();
    logging::init(cli.verbose);

    if let Err(error) = run(cli) {
        eprintln!("attendanced error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: config::Cli) -> anyhow::Result<()> {
    let conn = db::open_db(&cli.workspace)
        .with_context(|| format!("failed to open workspace {}", cli.workspace.display()))?;

    let server = tiny_http::Server::http(cli.listen.as_str())
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {e}", cli.listen))?;
    let addr = server
        .server_addr()
        .to_ip()
        .context("listener has no IP address")?;

    // Supervisors read this line to discover the bound port.
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{}", serde_json::json!({ "listening": addr.to_string() }))?;
    stdout.flush()?;
    info!(%addr, workspace = %cli.workspace.display(), "attendanced listening");

    let mut state = http::AppState {
        workspace: cli.workspace,
        db: conn,
    };
    for request in server.incoming_requests() {
        http::serve(&mut state, request);
    }
    Ok(())
}
