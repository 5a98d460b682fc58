use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub surrealdb_address: String,
    pub surrealdb_username: String,
    pub surrealdb_password: String,
    pub surrealdb_namespace: String,
    pub surrealdb_database: String,
    #[serde(default = "default_adapter_name")]
    pub adapter_name: String,
    #[serde(default = "default_medium")]
    pub medium: String,
    #[serde(default = "default_index_collection")]
    pub index_collection: String,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            surrealdb_address: "mem://".to_string(),
            surrealdb_username: "root".to_string(),
            surrealdb_password: "root".to_string(),
            surrealdb_namespace: "ingestion".to_string(),
            surrealdb_database: "ingestion".to_string(),
            adapter_name: default_adapter_name(),
            medium: default_medium(),
            index_collection: default_index_collection(),
            sweep_interval_ms: default_sweep_interval_ms(),
            result_limit: default_result_limit(),
        }
    }
}

fn default_adapter_name() -> String {
    "Flickr ingestion adapter".to_string()
}

fn default_medium() -> String {
    "flickr".to_string()
}

fn default_index_collection() -> String {
    "flickr".to_string()
}

fn default_sweep_interval_ms() -> u64 {
    10
}

fn default_result_limit() -> u32 {
    100
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
