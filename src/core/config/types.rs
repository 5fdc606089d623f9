use std::time::Duration;

use thiserror::Error;

/// Parse caps `limit` on class queries at this value.
pub(crate) const MAX_FETCH_LIMIT: u32 = 1000;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) runtime: RuntimeSettings,
    pub(super) database: DatabaseSettings,
    pub(super) baas: BaasSettings,
    pub(super) harness: HarnessSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) postgres_server: String,
    pub(crate) postgres_port: u16,
    pub(crate) postgres_user: String,
    pub(crate) postgres_password: String,
    pub(crate) postgres_db: String,
    pub(crate) database_url: Option<String>,
    pub(crate) statement_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct BaasSettings {
    pub(crate) server_url: String,
    pub(crate) mount_path: String,
    pub(crate) app_id: String,
    pub(crate) rest_api_key: String,
    pub(crate) master_key: String,
    pub(crate) request_timeout_seconds: u64,
    pub(crate) fetch_limit: u32,
}

#[derive(Debug, Clone)]
pub(crate) struct HarnessSettings {
    pub(crate) min_missing: i64,
    pub(crate) query_timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }

    pub(super) fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl DatabaseSettings {
    pub(crate) fn statement_timeout(&self) -> Duration {
        Duration::from_secs(self.statement_timeout_seconds)
    }
}

impl BaasSettings {
    /// Base for every Parse endpoint, e.g. `https://parseapi.back4app.com/parse`.
    pub(crate) fn api_base(&self) -> String {
        let server = self.server_url.trim_end_matches('/');
        let mount = self.mount_path.trim_matches('/');
        if mount.is_empty() {
            server.to_string()
        } else {
            format!("{server}/{mount}")
        }
    }

    pub(crate) fn is_configured(&self) -> bool {
        !self.app_id.is_empty() && !(self.rest_api_key.is_empty() && self.master_key.is_empty())
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl HarnessSettings {
    pub(crate) fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_seconds)
    }
}
