use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::acquisition::AcquisitionSettings;
use crate::provider::{DEFAULT_BASE_URL, DEFAULT_MANIFEST_URL, HttpConfig, WindLevel};
use crate::retention::RetentionPolicy;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub acquisition: AcquisitionConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server and on-disk locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            ledger_path: default_ledger_path(),
            artifact_dir: default_artifact_dir(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/ledger")
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("data/storage")
}

/// Weather provider endpoints and HTTP client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub wind_level: WindLevel,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            manifest_url: default_manifest_url(),
            user_agent: default_user_agent(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            wind_level: WindLevel::default(),
        }
    }
}

impl ProviderConfig {
    pub fn http_config(&self) -> HttpConfig {
        HttpConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_manifest_url() -> String {
    DEFAULT_MANIFEST_URL.to_string()
}

fn default_user_agent() -> String {
    HttpConfig::default().user_agent
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

/// Cadences of the acquisition walks
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AcquisitionConfig {
    #[serde(default = "default_five")]
    pub radar_cadence_minutes: u32,
    #[serde(default = "default_five")]
    pub rain_cadence_minutes: u32,
    #[serde(default = "default_wind_cadence_minutes")]
    pub wind_cadence_minutes: u32,
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            radar_cadence_minutes: default_five(),
            rain_cadence_minutes: default_five(),
            wind_cadence_minutes: default_wind_cadence_minutes(),
            horizon_hours: default_horizon_hours(),
        }
    }
}

impl AcquisitionConfig {
    pub fn settings(&self) -> AcquisitionSettings {
        AcquisitionSettings {
            radar_cadence: TimeDelta::minutes(i64::from(self.radar_cadence_minutes)),
            rain_cadence: TimeDelta::minutes(i64::from(self.rain_cadence_minutes)),
            wind_cadence: TimeDelta::minutes(i64::from(self.wind_cadence_minutes)),
            horizon: TimeDelta::hours(i64::from(self.horizon_hours)),
        }
    }
}

fn default_five() -> u32 {
    5
}

fn default_wind_cadence_minutes() -> u32 {
    60
}

fn default_horizon_hours() -> u32 {
    48
}

/// Pipeline loop timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            prune_interval_secs: default_prune_interval_secs(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn prune_interval(&self) -> TimeDelta {
        let secs = u32::try_from(self.prune_interval_secs).unwrap_or(u32::MAX);
        TimeDelta::seconds(i64::from(secs))
    }
}

fn default_interval_secs() -> u64 {
    300
}

fn default_prune_interval_secs() -> u64 {
    3600
}

/// Retention configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetentionConfig {
    #[serde(default = "default_max_age_hours")]
    pub radar_max_age_hours: u32,
    #[serde(default = "default_max_age_hours")]
    pub wind_max_age_hours: u32,
    #[serde(default = "default_max_age_hours")]
    pub danger_max_age_hours: u32,
    #[serde(default = "default_true")]
    pub prune_superseded_wind: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            radar_max_age_hours: default_max_age_hours(),
            wind_max_age_hours: default_max_age_hours(),
            danger_max_age_hours: default_max_age_hours(),
            prune_superseded_wind: default_true(),
        }
    }
}

impl RetentionConfig {
    pub fn policy(&self) -> RetentionPolicy {
        RetentionPolicy {
            radar_max_age: TimeDelta::hours(i64::from(self.radar_max_age_hours)),
            wind_max_age: TimeDelta::hours(i64::from(self.wind_max_age_hours)),
            danger_max_age: TimeDelta::hours(i64::from(self.danger_max_age_hours)),
            prune_superseded_wind: self.prune_superseded_wind,
        }
    }
}

fn default_max_age_hours() -> u32 {
    24
}

fn default_true() -> bool {
    true
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
