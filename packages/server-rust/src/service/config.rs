use std::fmt;

use crate::devtools::ExplorerConfig;

/// Deployment environment the server was started in.
///
/// Development-only surfaces (the operations explorer) are wired in only
/// when this is `Development`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Returns the lowercase name used on the command line and in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Human-readable label shown in development tooling.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Production => "Production",
        }
    }

    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-level configuration for operation dispatch and development tooling.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Environment the server runs in.
    pub environment: Environment,
    /// Default timeout for operations in milliseconds.
    pub default_operation_timeout_ms: u64,
    /// Maximum number of concurrent operations before load shedding.
    pub max_concurrent_operations: u32,
    /// Operations explorer settings. Only consulted in development.
    pub explorer: ExplorerConfig,
}

impl ServerConfig {
    /// Whether the operations explorer should be wired into the HTTP pipeline.
    #[must_use]
    pub fn explorer_active(&self) -> bool {
        self.environment.is_development() && self.explorer.enabled
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            default_operation_timeout_ms: 30_000,
            max_concurrent_operations: 1000,
            explorer: ExplorerConfig::default(),
        }
    }
}
