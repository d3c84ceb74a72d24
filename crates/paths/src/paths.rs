//! Path context for runtime environment detection and desk data locations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifies the runtime environment where the application is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnvironment {
    /// Running via `cargo run` or in development mode
    Development,
    /// Running as an installed binary in production
    Production,
}

/// Context for managing application paths.
///
/// Layout below the base path:
/// - `config/`  optional config files
/// - `data/`    store files (`buyers.json`, `propertyDraft.json`, ...)
/// - `logs/`    log files
#[derive(Debug, Clone)]
pub struct PathContext {
    environment: RuntimeEnvironment,
    base_path: Arc<Path>,
}

impl PathContext {
    /// Creates a new PathContext with automatic environment detection.
    pub fn new(app_id: &str) -> Self {
        let environment = Self::detect_environment();
        let base_path = Self::determine_base_path(environment, app_id);

        Self {
            environment,
            base_path: base_path.into(),
        }
    }

    /// Creates a PathContext with an explicit base path (useful for testing).
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            environment: Self::detect_environment(),
            base_path: base_path.into(),
        }
    }

    /// Detects the runtime environment based on executable location.
    fn detect_environment() -> RuntimeEnvironment {
        if let Ok(exe_path) = std::env::current_exe() {
            if exe_path.components().any(|c| c.as_os_str() == "target") {
                return RuntimeEnvironment::Development;
            }
        }

        if std::env::var("CARGO").is_ok() || std::env::var("CARGO_MANIFEST_DIR").is_ok() {
            return RuntimeEnvironment::Development;
        }

        RuntimeEnvironment::Production
    }

    /// Determines the base path based on the runtime environment.
    fn determine_base_path(environment: RuntimeEnvironment, app_id: &str) -> PathBuf {
        match environment {
            RuntimeEnvironment::Development => std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(format!(".{app_id}")),
            // XDG_DATA_HOME / Application Support / LocalAppData
            RuntimeEnvironment::Production => dirs::data_local_dir()
                .map(|dir| dir.join(app_id))
                .unwrap_or_else(|| PathBuf::from(".").join(format!(".{app_id}"))),
        }
    }

    /// Returns the runtime environment.
    pub fn environment(&self) -> RuntimeEnvironment {
        self.environment
    }

    /// Returns the config directory path: `<base>/config/`
    pub fn config_dir(&self) -> PathBuf {
        self.base_path.join("config")
    }

    /// Returns the data directory path: `<base>/data/`
    pub fn data_dir(&self) -> PathBuf {
        self.base_path.join("data")
    }

    /// Returns the logs directory path: `<base>/logs/`
    pub fn logs_dir(&self) -> PathBuf {
        self.base_path.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_context_structure() {
        let ctx = PathContext::with_base_path(PathBuf::from("/test/base"));

        assert_eq!(ctx.config_dir(), PathBuf::from("/test/base/config"));
        assert_eq!(ctx.data_dir(), PathBuf::from("/test/base/data"));
        assert_eq!(ctx.logs_dir(), PathBuf::from("/test/base/logs"));
    }
}
