/// Default log filter when `TOOLBUS_LOG` is unset.
const DEFAULT_LOG_LEVEL: &str = "info";

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub log_level: String,
}

impl ServerConfig {
    /// Load configuration from environment.
    ///
    /// - `TOOLBUS_LOG` (optional, default `info`) — tracing filter directive
    pub fn from_env() -> Self {
        let log_level =
            std::env::var("TOOLBUS_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());
        Self { log_level }
    }
}
