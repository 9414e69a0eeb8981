//! Reef development server.
//!
//! Serves the operation router over HTTP. Run with `--environment development`
//! (or `REEF_ENV=development`) to get the operations explorer at `/explorer`.

use std::time::Duration;

use clap::Parser;
use reef_server::devtools::DEFAULT_EXPLORER_PATH;
use reef_server::network::DEFAULT_PORT;
use reef_server::telemetry::{init_tracing, LogFormat};
use reef_server::{
    handler_fn, Environment, ExplorerConfig, NetworkConfig, NetworkModule, OperationRouter,
    ServerConfig,
};
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "dev-server", version, about = "Reef operation router over HTTP")]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "REEF_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on (0 picks a free port).
    #[arg(long, env = "REEF_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Deployment environment. The explorer is only served in development.
    #[arg(long, env = "REEF_ENV", value_enum, default_value_t = Environment::Production)]
    environment: Environment,

    /// Path the operations explorer is served from.
    #[arg(long, env = "REEF_EXPLORER_PATH", default_value = DEFAULT_EXPLORER_PATH)]
    explorer_path: String,

    /// Never install the operations explorer, even in development.
    #[arg(long)]
    no_explorer: bool,

    /// Per-request timeout for the HTTP layer, in seconds.
    #[arg(long, env = "REEF_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    /// Default per-operation timeout, in milliseconds (0 disables it).
    #[arg(long, env = "REEF_OPERATION_TIMEOUT_MS", default_value_t = 30_000)]
    operation_timeout_ms: u64,

    /// Concurrent operations allowed before new calls are shed.
    #[arg(long, env = "REEF_MAX_CONCURRENT_OPERATIONS", default_value_t = 1000)]
    max_concurrent_operations: u32,

    /// Allowed CORS origin; repeat for several. Defaults to any origin.
    #[arg(long = "cors-origin", default_value = "*")]
    cors_origins: Vec<String>,

    /// Log output format.
    #[arg(long, env = "REEF_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Cli {
    fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            cors_origins: self.cors_origins.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..NetworkConfig::default()
        }
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            environment: self.environment,
            default_operation_timeout_ms: self.operation_timeout_ms,
            max_concurrent_operations: self.max_concurrent_operations,
            explorer: ExplorerConfig {
                enabled: !self.no_explorer,
                path: self.explorer_path.clone(),
            },
        }
    }
}

/// Built-in operations so a fresh server has something to call.
fn builtin_operations() -> OperationRouter {
    let router = OperationRouter::new();
    router.register(
        "Echo",
        handler_fn(|_ctx, payload| async move { Ok(payload) }),
    );
    router.register(
        "Ping",
        handler_fn(|ctx, _payload| async move {
            Ok(json!({ "pong": true, "call_id": ctx.call_id }))
        }),
    );
    router
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c; shutting down");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format)?;

    let server_config = cli.server_config();
    if server_config.explorer.enabled && !server_config.environment.is_development() {
        info!(
            environment = %server_config.environment,
            "operations explorer disabled outside development"
        );
    }

    let mut module = NetworkModule::new(cli.network_config(), server_config, builtin_operations());
    let port = module.start().await?;
    info!(port, "reef dev server listening");

    module.serve(shutdown_signal()).await
}
