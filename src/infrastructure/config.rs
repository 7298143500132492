// Configuration loading and startup validation
use crate::domain::dashboard::DashboardSpec;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("dashboard list is empty")]
    NoDashboards,
    #[error("dashboard entry has a blank {0}")]
    BlankDashboardField(&'static str),
    #[error("portal {0} is blank")]
    BlankCredential(&'static str),
    #[error("{0} must be a positive number of minutes")]
    NonPositiveInterval(&'static str),
}

#[derive(Debug, Deserialize, Clone)]
pub struct KioskConfig {
    pub portal: PortalSettings,
    pub dashboards: Vec<DashboardEntry>,
    #[serde(default)]
    pub rotation: RotationSettings,
    #[serde(default)]
    pub surface: SurfaceSettings,
    #[serde(default = "default_event_log")]
    pub event_log: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PortalSettings {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardEntry {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RotationSettings {
    pub refresh_interval_minutes: u32,
    pub switch_interval_minutes: u32,
    pub cleanup_interval_minutes: u32,
    pub check_interval_seconds: u64,
    pub max_retries: u32,
    pub stale_tolerance_minutes: u32,
    pub backoff_seconds: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            refresh_interval_minutes: 5,
            switch_interval_minutes: 15,
            cleanup_interval_minutes: 30,
            check_interval_seconds: 60,
            max_retries: 1,
            stale_tolerance_minutes: 1,
            backoff_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SurfaceSettings {
    pub webdriver_url: String,
    pub browser_binaries: Vec<String>,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            browser_binaries: vec![
                "/usr/bin/chromium-browser".to_string(),
                "/usr/bin/chromium".to_string(),
            ],
        }
    }
}

fn default_event_log() -> String {
    "kiosk_events.jsonl".to_string()
}

impl KioskConfig {
    /// Startup precondition checks. The rotation loop never re-validates.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboards.is_empty() {
            return Err(ConfigError::NoDashboards);
        }
        for entry in &self.dashboards {
            if entry.title.trim().is_empty() {
                return Err(ConfigError::BlankDashboardField("title"));
            }
            if entry.url.trim().is_empty() {
                return Err(ConfigError::BlankDashboardField("url"));
            }
        }
        if self.portal.base_url.trim().is_empty() {
            return Err(ConfigError::BlankCredential("base_url"));
        }
        if self.portal.username.trim().is_empty() {
            return Err(ConfigError::BlankCredential("username"));
        }
        if self.portal.password.trim().is_empty() {
            return Err(ConfigError::BlankCredential("password"));
        }
        if self.rotation.switch_interval_minutes == 0 {
            return Err(ConfigError::NonPositiveInterval("switch_interval_minutes"));
        }
        if self.rotation.refresh_interval_minutes == 0 {
            return Err(ConfigError::NonPositiveInterval("refresh_interval_minutes"));
        }
        if self.rotation.stale_tolerance_minutes == 0 {
            return Err(ConfigError::NonPositiveInterval("stale_tolerance_minutes"));
        }
        Ok(())
    }

    /// The immutable rotation order, in configured sequence.
    pub fn dashboard_specs(&self) -> Vec<DashboardSpec> {
        self.dashboards
            .iter()
            .map(|d| DashboardSpec::new(d.title.clone(), d.url.clone()))
            .collect()
    }
}

pub fn load_kiosk_config() -> anyhow::Result<KioskConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/kiosk"))
        .build()?;

    let kiosk_config: KioskConfig = settings.try_deserialize()?;
    kiosk_config.validate()?;
    Ok(kiosk_config)
}
