use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub provider_host: String,

    /// Poll cadence for the fetch pass.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Directory holding the per-instrument CSV logs.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// How often the grouped dashboard summary is logged. 0 disables.
    #[serde(default = "default_dashboard_log_secs")]
    pub dashboard_log_secs: u64,

    // Stats
    #[serde(default = "default_stats_log_sec")]
    pub stats_log_sec: u64,
    pub stats_jsonl_path: Option<String>,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_data_dir() -> String {
    "csvfiles".to_string()
}

fn default_dashboard_log_secs() -> u64 {
    60
}

fn default_stats_log_sec() -> u64 {
    300
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let c = config::Config::builder()
            .add_source(config::Environment::default())
            .build()?;
        Ok(c.try_deserialize()?)
    }
}
