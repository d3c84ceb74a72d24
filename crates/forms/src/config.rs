use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SUBMIT_LATENCY_MS: u64 = 3000;
pub const DEFAULT_RESET_DELAY_MS: u64 = 2000;
pub const DEFAULT_TOAST_TTL_MS: u64 = 3000;
pub const DEFAULT_MAX_IMAGES: usize = 10;

/// Timings and limits of the draft/submit pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Simulated submission latency.
    pub submit_latency_ms: u64,
    /// Delay between a successful submit and the form reset.
    pub reset_delay_ms: u64,
    /// How long a notification stays visible.
    pub toast_ttl_ms: u64,
    pub max_images: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            submit_latency_ms: DEFAULT_SUBMIT_LATENCY_MS,
            reset_delay_ms: DEFAULT_RESET_DELAY_MS,
            toast_ttl_ms: DEFAULT_TOAST_TTL_MS,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}

impl PipelineConfig {
    pub fn submit_latency(&self) -> Duration {
        Duration::from_millis(self.submit_latency_ms)
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.toast_ttl_ms)
    }

    /// No waiting at all; used by tests and `--no-delay`.
    pub fn immediate() -> Self {
        Self {
            submit_latency_ms: 0,
            reset_delay_ms: 0,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"max_images": 4}"#).unwrap();
        assert_eq!(config.max_images, 4);
        assert_eq!(config.submit_latency(), Duration::from_secs(3));
        assert_eq!(config.reset_delay(), Duration::from_secs(2));
    }
}
