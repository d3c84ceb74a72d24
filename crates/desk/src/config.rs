use std::path::{Path, PathBuf};

use forms::PipelineConfig;
use paths::PathContext;
use serde::Deserialize;
use tracing::debug;

pub const ENV_PREFIX: &str = "DESK";

/// Runtime configuration.
///
/// Sources, later ones win:
/// 1. defaults (directories from [`PathContext`], timings from
///    [`PipelineConfig::default`])
/// 2. `config.json5` / `config.toml` in the config directory, both optional
/// 3. `DESK_*` environment variables, e.g. `DESK_LOG_LEVEL=debug`
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub log_level: String,
    pub submit_latency_ms: u64,
    pub reset_delay_ms: u64,
    pub toast_ttl_ms: u64,
    pub max_images: usize,
}

impl Config {
    pub fn new(paths: &PathContext) -> Result<Self, config::ConfigError> {
        Self::load(paths, Some(config::Environment::with_prefix(ENV_PREFIX)))
    }

    fn load(
        paths: &PathContext,
        env: Option<config::Environment>,
    ) -> Result<Self, config::ConfigError> {
        let config_dir = paths.config_dir();
        let defaults = PipelineConfig::default();

        let mut builder = config::Config::builder()
            .set_default("data_dir", path_str(&paths.data_dir()))?
            .set_default("config_dir", path_str(&config_dir))?
            .set_default("logs_dir", path_str(&paths.logs_dir()))?
            .set_default("log_level", "info")?
            .set_default("submit_latency_ms", defaults.submit_latency_ms as i64)?
            .set_default("reset_delay_ms", defaults.reset_delay_ms as i64)?
            .set_default("toast_ttl_ms", defaults.toast_ttl_ms as i64)?
            .set_default("max_images", defaults.max_images as i64)?;

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.toml", config::FileFormat::Toml),
        ];
        for (file, format) in &config_files {
            let path = config_dir.join(file);
            if path.exists() {
                debug!(path = %path.display(), "loading config file");
            }
            builder = builder.add_source(config::File::from(path).format(*format).required(false));
        }

        if let Some(env) = env {
            builder = builder.add_source(env.try_parsing(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Pipeline timings and limits carried by this config.
    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            submit_latency_ms: self.submit_latency_ms,
            reset_delay_ms: self.reset_delay_ms,
            toast_ttl_ms: self.toast_ttl_ms,
            max_images: self.max_images,
        }
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for dir in [&self.data_dir, &self.config_dir, &self.logs_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
