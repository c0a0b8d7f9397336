//! CLI module for the gateway.
//!
//! Used both by the standalone `twinproxy-gateway` binary and as the
//! `serve` subcommand of the unified `twinproxy` CLI.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use twinproxy_config::{
    CliOverrides, Config, LoggingConfig, apply_overrides, load_config, validate_config,
};

use crate::error::GatewayError;
use crate::gateway::Gateway;

/// Gateway CLI arguments.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "twinproxy-gateway",
    version,
    about = "SOCKS5 and HTTP proxy gateway"
)]
pub struct ServeArgs {
    /// Config file path (json/jsonc/yaml/toml). Defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: CliOverrides,
}

/// Build the effective configuration: file (or defaults), then overrides,
/// then validation.
pub fn resolve_config(args: &ServeArgs) -> Result<Config, GatewayError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_overrides(&mut config, &args.overrides);
    validate_config(&config)?;
    Ok(config)
}

/// Run the gateway until SIGINT/SIGTERM.
pub async fn run(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args)?;
    init_tracing(&config.logging);

    let shutdown = CancellationToken::new();
    let shutdown_signal = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal_handler().await;
        info!("shutdown signal received");
        shutdown_signal.cancel();
    });

    Gateway::new(config).run(shutdown).await?;
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Build the `EnvFilter` directive string from the base level and the
/// per-module filters.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut directives = config.level.as_deref().unwrap_or("info").to_string();
    let mut filters: Vec<_> = config.filters.iter().collect();
    filters.sort();
    for (module, level) in filters {
        directives.push(',');
        directives.push_str(module);
        directives.push('=');
        directives.push_str(level);
    }
    directives
}

/// Initialize the diagnostic tracing subscriber.
///
/// - `format`: json, pretty or compact. Default: pretty
/// - `output`: stdout or stderr. Default: stderr
///
/// Audit lines go to stdout through the connection logger regardless.
fn init_tracing(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_new(filter_directives(config)).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match config.output.as_deref() {
        Some("stdout") => BoxMakeWriter::new(io::stdout),
        _ => BoxMakeWriter::new(io::stderr),
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format.as_deref() {
        Some("json") => registry
            .with(fmt::layer().json().with_writer(writer))
            .try_init(),
        Some("compact") => registry
            .with(fmt::layer().compact().with_writer(writer))
            .try_init(),
        _ => registry.with(fmt::layer().with_writer(writer)).try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> ServeArgs {
        ServeArgs::parse_from(std::iter::once("twinproxy-gateway").chain(argv.iter().copied()))
    }

    #[test]
    fn defaults_plus_overrides_without_file() {
        let args = parse(&["--socks", "true", "--socks-port", "0", "--socks-address", "127.0.0.1"]);
        let config = resolve_config(&args).unwrap();
        let socks = config.socks_frontend().unwrap();
        assert_eq!(socks.port, 0);
        assert_eq!(socks.address, "127.0.0.1");
        assert!(config.http_frontend().is_none());
    }

    #[test]
    fn nothing_enabled_fails_validation() {
        let args = parse(&[]);
        assert!(matches!(resolve_config(&args), Err(GatewayError::Config(_))));
    }

    #[test]
    fn config_file_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(&path, "http = true\nhttpPort = 3128\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--http-port", "3129"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.http_frontend().unwrap().port, 3129);
    }

    #[test]
    fn filter_directives_are_ordered() {
        let mut logging = LoggingConfig {
            level: Some("warn".into()),
            ..LoggingConfig::default()
        };
        logging.filters.insert("twinproxy_socks".into(), "trace".into());
        logging.filters.insert("twinproxy_auth".into(), "debug".into());
        assert_eq!(
            filter_directives(&logging),
            "warn,twinproxy_auth=debug,twinproxy_socks=trace"
        );
    }
}
