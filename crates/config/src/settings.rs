use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub notifications: NotificationSettings,
    pub dashboard: DashboardSettings,
    pub tables: TableSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    /// Unset means the HTTP client's platform default.
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// Path of the key/value file holding `auth_token`. Falls back to the
    /// platform data directory when unset.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardSettings {
    pub stale_after_secs: u64,
    pub focus_debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TableSettings {
    pub page_size: u64,
}

impl ApiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl NotificationSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl DashboardSettings {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn focus_debounce(&self) -> Duration {
        Duration::from_millis(self.focus_debounce_ms)
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("SERVICEHUB"),
            )
            .set_default("api.base_url", "http://localhost:8000/api")?
            .set_default("api.timeout_secs", None::<u64>)?
            .set_default("storage.path", None::<String>)?
            .set_default("notifications.poll_interval_secs", 10)?
            .set_default("dashboard.stale_after_secs", 300)?
            .set_default("dashboard.focus_debounce_ms", 250)?
            .set_default("tables.page_size", 10)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api: ApiSettings {
                base_url: "http://localhost:8000/api".to_string(),
                timeout_secs: None,
            },
            storage: StorageSettings { path: None },
            notifications: NotificationSettings {
                poll_interval_secs: 10,
            },
            dashboard: DashboardSettings {
                stale_after_secs: 300,
                focus_debounce_ms: 250,
            },
            tables: TableSettings { page_size: 10 },
        }
    }
}
