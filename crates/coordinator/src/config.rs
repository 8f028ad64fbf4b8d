use std::time::Duration;

use fabric_core::error::CoreError;

/// Coordinator timing configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct FabricConfig {
    /// Interval at which workers are expected to heartbeat
    /// (default: 2s).
    pub heartbeat_interval: Duration,
    /// Maximum heartbeat silence tolerated before a worker is evicted
    /// (default: 8s, i.e. 4x the heartbeat interval).
    pub liveness_timeout: Duration,
    /// Deadline for a dispatched request to produce a result
    /// (default: 30s).
    pub request_timeout: Duration,
    /// Interval of the background eviction and deadline sweeps
    /// (default: 1s).
    pub sweep_interval: Duration,
}

impl FabricConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default |
    /// |--------------------------------|---------|
    /// | `FABRIC_HEARTBEAT_INTERVAL_MS` | `2000`  |
    /// | `FABRIC_LIVENESS_TIMEOUT_MS`   | `8000`  |
    /// | `FABRIC_REQUEST_TIMEOUT_MS`    | `30000` |
    /// | `FABRIC_SWEEP_INTERVAL_MS`     | `1000`  |
    pub fn from_env() -> Result<Self, CoreError> {
        let config = Self {
            heartbeat_interval: env_duration_ms("FABRIC_HEARTBEAT_INTERVAL_MS", 2_000)?,
            liveness_timeout: env_duration_ms("FABRIC_LIVENESS_TIMEOUT_MS", 8_000)?,
            request_timeout: env_duration_ms("FABRIC_REQUEST_TIMEOUT_MS", 30_000)?,
            sweep_interval: env_duration_ms("FABRIC_SWEEP_INTERVAL_MS", 1_000)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the timing relationships.
    ///
    /// Rules:
    /// - All durations must be non-zero.
    /// - The liveness timeout must be at least 2x the heartbeat interval;
    ///   3-5x is the recommended range, below 2x a single delayed heartbeat
    ///   falsely evicts the worker.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("heartbeat_interval", self.heartbeat_interval),
            ("liveness_timeout", self.liveness_timeout),
            ("request_timeout", self.request_timeout),
            ("sweep_interval", self.sweep_interval),
        ] {
            if value.is_zero() {
                return Err(CoreError::Validation(format!(
                    "{name} must be non-zero"
                )));
            }
        }

        if self.liveness_timeout < self.heartbeat_interval * 2 {
            return Err(CoreError::Validation(format!(
                "liveness_timeout ({:?}) must be at least 2x heartbeat_interval ({:?})",
                self.liveness_timeout, self.heartbeat_interval
            )));
        }

        Ok(())
    }
}

impl Default for FabricConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(2),
            liveness_timeout: Duration::from_secs(8),
            request_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(1),
        }
    }
}

fn env_duration_ms(var: &str, default_ms: u64) -> Result<Duration, CoreError> {
    match std::env::var(var) {
        Ok(raw) => {
            let ms: u64 = raw.parse().map_err(|_| {
                CoreError::Validation(format!("{var} must be a valid u64, got \"{raw}\""))
            })?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(Duration::from_millis(default_ms)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(FabricConfig::default().validate().is_ok());
    }

    #[test]
    fn liveness_timeout_below_twice_heartbeat_rejected() {
        let config = FabricConfig {
            heartbeat_interval: Duration::from_secs(2),
            liveness_timeout: Duration::from_secs(3),
            ..FabricConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_duration_rejected() {
        let config = FabricConfig {
            sweep_interval: Duration::ZERO,
            ..FabricConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
