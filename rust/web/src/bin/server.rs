//! Heads-up hold'em game server.
//!
//! Usage: cargo run -p holdem_web --bin holdem-web-server -- [OPTIONS]

use holdem_web::{ServerSettings, WebServer};
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = holdem_web::init_logging() {
        eprintln!("Error: failed to install logger: {err}");
        return ExitCode::FAILURE;
    }

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("Error: {message}");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "server exited with error");
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = ServerSettings::load()?;
    if let Some(path) = &args.config {
        settings.apply_file(path)?;
    }
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    settings.validate()?;

    tracing::info!(
        host = %settings.host,
        port = settings.port,
        small_blind = settings.table.small_blind,
        big_blind = settings.table.big_blind,
        starting_stack = settings.table.starting_stack,
        postflop_first_to_act = ?settings.table.postflop_first_to_act,
        "starting holdem server"
    );

    let handle = WebServer::new(settings).start().await?;
    println!("Server running at http://{}", handle.address());
    println!("WebSocket endpoint: ws://{}/ws", handle.address());
    println!("Press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;

    tracing::info!("shutting down server");
    handle.context().metrics().log_metrics();
    handle.shutdown().await?;
    tracing::info!("server stopped cleanly");
    Ok(())
}

#[derive(Debug, Default)]
struct Args {
    host: Option<String>,
    port: Option<u16>,
    config: Option<PathBuf>,
}

impl Args {
    /// `Ok(None)` means help was requested.
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, String> {
        let mut parsed = Args::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--host" | "-h" => {
                    parsed.host = Some(args.next().ok_or("--host requires a value")?);
                }
                "--port" | "-p" => {
                    let value = args.next().ok_or("--port requires a value")?;
                    parsed.port = Some(
                        value
                            .parse()
                            .map_err(|_| format!("invalid port number `{value}`"))?,
                    );
                }
                "--config" | "-c" => {
                    let value = args.next().ok_or("--config requires a value")?;
                    parsed.config = Some(PathBuf::from(value));
                }
                "--help" => return Ok(None),
                other => return Err(format!("unknown argument `{other}`")),
            }
        }
        Ok(Some(parsed))
    }
}

fn print_help() {
    println!("Heads-up hold'em game server");
    println!();
    println!("Usage: holdem-web-server [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --host, -h <HOST>       Host to bind to (default: 127.0.0.1)");
    println!("  --port, -p <PORT>       Port to bind to (default: 8080)");
    println!("  --config, -c <FILE>     TOML settings file, applied over HOLDEM_CONFIG");
    println!("  --help                  Show this help message");
    println!();
    println!("Environment: HOLDEM_CONFIG, HOLDEM_HOST, HOLDEM_PORT, HOLDEM_EVENT_BUFFER,");
    println!("  HOLDEM_SMALL_BLIND, HOLDEM_BIG_BLIND, HOLDEM_STARTING_STACK,");
    println!("  HOLDEM_POSTFLOP_FIRST_TO_ACT, HOLDEM_LOG_FORMAT, RUST_LOG");
}
