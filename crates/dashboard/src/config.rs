use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub sessions: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub request_timeout_secs: u64,
    /// Upper bound for uploaded log files (request body limit).
    pub max_upload_bytes: usize,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SessionConfig {
    /// Bounded in-memory session store; inserting past the cap evicts the
    /// oldest upload.
    pub max_sessions: usize,
    /// Row cap for the log preview panel.
    pub preview_rows: usize,
    /// Default variant coverage percentage when the client sends none.
    pub default_coverage_percent: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    Stdout,
    File { path: String },
}

impl DashboardConfig {
    /// Load configuration from dashboard.toml and environment variables
    pub fn load() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        // Start with compile-time defaults as the foundation
        // This ensures that if a key is missing in files/env, we use the default
        let defaults = config::Config::try_from(&DashboardConfig::default())
            .context("Failed to serialize default configuration")?;

        let mut builder = config::Config::builder().add_source(defaults);

        // Layer config files (overrides defaults)
        // Try these locations in order:
        // 1. /etc/tracedeck/dashboard.toml (production)
        // 2. config/dashboard.toml (local development)
        // 3. crates/dashboard/config/dashboard.toml (workspace root)
        let config_paths = vec![
            "/etc/tracedeck/dashboard",
            "config/dashboard",
            "crates/dashboard/config/dashboard",
        ];

        for path in config_paths {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Layer environment variables (overrides everything)
        // Use double underscore for nested keys: DASHBOARD_SERVER__BIND_ADDRESS
        builder = builder.add_source(
            config::Environment::with_prefix("DASHBOARD")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.server
            .bind_address
            .parse::<std::net::SocketAddr>()
            .context("Invalid bind_address")?;

        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("server.max_upload_bytes must be positive");
        }
        if self.sessions.max_sessions == 0 {
            anyhow::bail!("sessions.max_sessions must be positive");
        }
        if self.sessions.preview_rows == 0 {
            anyhow::bail!("sessions.preview_rows must be positive");
        }
        if !(1..=100).contains(&self.sessions.default_coverage_percent) {
            anyhow::bail!("sessions.default_coverage_percent must be within 1..=100");
        }

        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "0.0.0.0:8080".to_string(),
                request_timeout_secs: 30,
                max_upload_bytes: 32 * 1024 * 1024,
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            sessions: SessionConfig {
                max_sessions: 32,
                preview_rows: 200,
                default_coverage_percent: 10,
            },
            logging: LoggingConfig {
                level: "info,dashboard=debug,engine=debug".to_string(),
                format: LogFormat::Pretty,
                output: LogOutput::Stdout,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        DashboardConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_bad_bind_address() {
        let mut config = DashboardConfig::default();
        config.server.bind_address = "not-an-address".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_out_of_range_coverage() {
        let mut config = DashboardConfig::default();
        config.sessions.default_coverage_percent = 0;
        assert!(config.validate().is_err());
    }
}
