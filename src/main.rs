//! twlog: demo server and format checker for the access log middleware.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use axum::http::Request;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use twlog::config::{load_config, AppConfig};
use twlog::format::{CompiledFormat, FormatSpec};
use twlog::http::{server::shutdown_signal, AccessLogLayer, DemoServer, RequestContext, ResponseView};
use twlog::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "twlog")]
#[command(about = "HTTP access log middleware demo", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the demo server with access logging
    Serve {
        /// Override the bind address
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Compile a format and print a sample line
    Render {
        /// Preset name or template; defaults to the configured format
        format: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match read_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("twlog: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability.log_filter);

    let result = match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Render { format } => render(&config, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "twlog failed");
            eprintln!("twlog: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn read_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(AppConfig::default()),
    }
}

async fn serve(mut config: AppConfig, bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }

    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let access_log = AccessLogLayer::from_config(&config.logger)?;
    let listener = TcpListener::bind(&config.server.bind_address).await?;

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    DemoServer::new(&config, access_log)
        .run(listener, shutdown_rx)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn render(config: &AppConfig, format: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let spec = FormatSpec::resolve(format.as_deref().or(config.logger.format.as_deref()));
    let compiled = CompiledFormat::from_spec(&spec)?;

    let sample = Request::get("/index.html?lang=en")
        .header("user-agent", "twlog-render/1.0")
        .header("referer", "http://localhost/")
        .extension(SocketAddr::from(([127, 0, 0, 1], 0)))
        .body(())?;
    let request = RequestContext::from_request(&sample);
    let response = ResponseView::completed(
        axum::http::StatusCode::OK,
        axum::http::HeaderMap::new(),
        request.started(),
    );

    println!("{}", compiled.render(&request, &response));
    Ok(())
}
