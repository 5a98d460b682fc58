use std::time::Duration;

use common::{
    error::AppError, storage::index_sink::validate_collection_name, utils::config::AppConfig,
};

#[derive(Debug, Clone)]
pub struct SupervisorTuning {
    pub sweep_interval: Duration,
    pub result_limit: u32,
    pub shutdown_grace: Duration,
    pub collection: String,
}

impl Default for SupervisorTuning {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_millis(10),
            result_limit: 100,
            shutdown_grace: Duration::from_secs(5),
            collection: "flickr".to_string(),
        }
    }
}

impl SupervisorTuning {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        if config.sweep_interval_ms == 0 {
            return Err(AppError::Validation(
                "sweep_interval_ms must be greater than zero".into(),
            ));
        }
        if config.result_limit == 0 {
            return Err(AppError::Validation(
                "result_limit must be greater than zero".into(),
            ));
        }
        validate_collection_name(&config.index_collection)?;

        Ok(Self {
            sweep_interval: Duration::from_millis(config.sweep_interval_ms),
            result_limit: config.result_limit,
            collection: config.index_collection.clone(),
            ..Self::default()
        })
    }
}
