use grid_client::{source::HttpSourceSettings, BottleneckPolicy};
use serde::Deserialize;
use std::{fs, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Http,
    Fixture,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_origin")]
    pub origin: Option<String>,
    #[serde(default = "default_referer")]
    pub referer: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_office_code")]
    pub default_office_code: String,
}

impl SourceConfig {
    pub fn http_settings(&self) -> HttpSourceSettings {
        HttpSourceSettings {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            origin: self.origin.clone(),
            referer: self.referer.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            default_office_code: self.default_office_code.clone(),
        }
    }
}

fn default_base_url() -> String {
    HttpSourceSettings::default().base_url
}

fn default_user_agent() -> String {
    HttpSourceSettings::default().user_agent
}

fn default_origin() -> Option<String> {
    HttpSourceSettings::default().origin
}

fn default_referer() -> Option<String> {
    HttpSourceSettings::default().referer
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_office_code() -> String {
    "4830".to_string()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NormalizerConfig {
    #[serde(default)]
    pub bottleneck_policy: BottleneckPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind_addr: String,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

fn default_history_capacity() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub source: SourceConfig,
    #[serde(default)]
    pub normalizer: NormalizerConfig,
    pub api: ApiConfig,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("CAPACITY_CONFIG").unwrap_or_else(|_| "capacity-config.toml".to_string());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }
}
