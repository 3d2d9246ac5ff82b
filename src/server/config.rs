use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    /// Shared secret gating the batch-trigger endpoints.
    pub cron_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_seconds: u64,

    #[serde(default = "default_check_interval")]
    pub monitor_check_interval_seconds: u64,

    #[serde(default = "default_notify_timeout")]
    pub notify_timeout_seconds: u64,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    cron_secret: Option<String>,
    listen_addr: Option<String>,
    evaluation_interval_seconds: Option<u64>,
    monitor_check_interval_seconds: Option<u64>,
    notify_timeout_seconds: Option<u64>,
    log_dir: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_evaluation_interval() -> u64 {
    60
}

fn default_check_interval() -> u64 {
    60
}

fn default_notify_timeout() -> u64 {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        let final_config = ServerConfig {
            cron_secret: env_config
                .cron_secret
                .or(file_config.cron_secret)
                .ok_or("CRON_SECRET is required")?,
            listen_addr: env_config
                .listen_addr
                .or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            evaluation_interval_seconds: env_config
                .evaluation_interval_seconds
                .or(file_config.evaluation_interval_seconds)
                .unwrap_or_else(default_evaluation_interval),
            monitor_check_interval_seconds: env_config
                .monitor_check_interval_seconds
                .or(file_config.monitor_check_interval_seconds)
                .unwrap_or_else(default_check_interval),
            notify_timeout_seconds: env_config
                .notify_timeout_seconds
                .or(file_config.notify_timeout_seconds)
                .unwrap_or_else(default_notify_timeout),
            log_dir: env_config
                .log_dir
                .or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
        };

        Ok(final_config)
    }
}
