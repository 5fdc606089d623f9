use super::parsing::{
    env_optional, env_or_default, normalize_mount_path, parse_bool, parse_environment, parse_i64,
    parse_u16, parse_u32, parse_u64,
};
use super::types::{
    BaasSettings, ConfigError, DatabaseSettings, HarnessSettings, RuntimeSettings, Settings,
    TelemetrySettings, MAX_FETCH_LIMIT,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_optional("REPORTS_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("REPORTS_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "postgres");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "education_platform");
        let database_url = env_optional("DATABASE_URL");
        let statement_timeout_seconds = parse_u64(
            "POSTGRES_STATEMENT_TIMEOUT_SECONDS",
            env_or_default("POSTGRES_STATEMENT_TIMEOUT_SECONDS", "30"),
        )?;

        let server_url = env_or_default("BACK4APP_SERVER_URL", "https://parseapi.back4app.com");
        let mount_path = normalize_mount_path(&env_or_default("BACK4APP_MOUNT_PATH", "/parse"));
        let app_id = env_or_default("BACK4APP_APP_ID", "");
        let rest_api_key = env_or_default("BACK4APP_REST_API_KEY", "");
        let master_key = env_or_default("BACK4APP_MASTER_KEY", "");
        let request_timeout_seconds = parse_u64(
            "BACK4APP_REQUEST_TIMEOUT_SECONDS",
            env_or_default("BACK4APP_REQUEST_TIMEOUT_SECONDS", "30"),
        )?;
        let fetch_limit =
            parse_u32("BACK4APP_FETCH_LIMIT", env_or_default("BACK4APP_FETCH_LIMIT", "1000"))?;

        let min_missing =
            parse_i64("REPORTS_MIN_MISSING", env_or_default("REPORTS_MIN_MISSING", "2"))?;
        let query_timeout_seconds = parse_u64(
            "REPORTS_QUERY_TIMEOUT_SECONDS",
            env_or_default("REPORTS_QUERY_TIMEOUT_SECONDS", "60"),
        )?;

        let log_level = env_or_default("REPORTS_LOG_LEVEL", "info");
        let json = env_optional("REPORTS_LOG_JSON").is_some_and(|value| parse_bool(&value));
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").is_some_and(|value| parse_bool(&value));

        let settings = Self {
            runtime: RuntimeSettings { environment, strict_config },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                statement_timeout_seconds,
            },
            baas: BaasSettings {
                server_url,
                mount_path,
                app_id,
                rest_api_key,
                master_key,
                request_timeout_seconds,
                fetch_limit,
            },
            harness: HarnessSettings { min_missing, query_timeout_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn baas(&self) -> &BaasSettings {
        &self.baas
    }

    pub(crate) fn harness(&self) -> &HarnessSettings {
        &self.harness
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.baas.fetch_limit == 0 || self.baas.fetch_limit > MAX_FETCH_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "BACK4APP_FETCH_LIMIT",
                value: self.baas.fetch_limit.to_string(),
            });
        }

        if !self.baas.server_url.starts_with("http://")
            && !self.baas.server_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "BACK4APP_SERVER_URL",
                value: self.baas.server_url.clone(),
            });
        }

        if self.baas.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "BACK4APP_REQUEST_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.harness.query_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "REPORTS_QUERY_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.harness.min_missing < 0 {
            return Err(ConfigError::InvalidValue {
                field: "REPORTS_MIN_MISSING",
                value: self.harness.min_missing.to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.baas.app_id.is_empty() {
            return Err(ConfigError::MissingSecret("BACK4APP_APP_ID"));
        }
        if self.baas.rest_api_key.is_empty() && self.baas.master_key.is_empty() {
            return Err(ConfigError::MissingSecret("BACK4APP_REST_API_KEY/BACK4APP_MASTER_KEY"));
        }

        Ok(())
    }
}
