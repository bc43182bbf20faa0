//! Configuration model loaded from external sources.

use std::env;
use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

/// YAML file read when `APP_CONFIG` is not set.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Clone, Debug, Deserialize)]
/// Settings for the catalog, the embedding model and ranking defaults.
pub struct AppConfig {
    pub catalog_path: PathBuf,
    pub zmq_address: String,
    pub embedding_model: String,
    pub model_cache_dir: Option<PathBuf>,
    /// Results per request when the request does not say.
    pub num_of_rec: usize,
    pub min_similarity: f32,
    pub level: String,
    pub currency_symbol: String,
    pub free_label: String,
    pub preview_rows: usize,
}

impl AppConfig {
    /// Defaults, overridden by the YAML file, overridden by `APP_*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        with_defaults()?
            .add_source(File::new(&path, FileFormat::Yaml).required(false))
            .add_source(Environment::with_prefix("APP"))
            .build()?
            .try_deserialize()
    }
}

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("catalog_path", "data/courses.csv")?
        .set_default("zmq_address", "tcp://127.0.0.1:5555")?
        .set_default("embedding_model", "paraphrase-multilingual-mpnet-base-v2")?
        .set_default("num_of_rec", 7_i64)?
        .set_default("min_similarity", 0.4)?
        .set_default("level", "all")?
        .set_default("currency_symbol", "₺")?
        .set_default("free_label", "Free")?
        .set_default("preview_rows", 10_i64)
}
