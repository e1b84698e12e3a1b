//! Liveness monitor configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Liveness monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LivenessConfig {
    /// Seconds between registry sweeps
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,

    /// Idle seconds after which a connection is reclaimed
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl LivenessConfig {
    /// Sweep period as a Duration
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    /// Eviction threshold as a Duration
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Validate liveness configuration
    ///
    /// A timeout shorter than the scan interval would evict connections
    /// that simply have not been scanned yet.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.scan_interval_secs == 0 {
            return Err(ValidationError::InvalidScanInterval);
        }
        if self.idle_timeout_secs < self.scan_interval_secs {
            return Err(ValidationError::IdleTimeoutTooShort);
        }
        Ok(())
    }
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

fn default_scan_interval_secs() -> u64 {
    30
}

fn default_idle_timeout_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_defaults() {
        let config = LivenessConfig::default();
        assert_eq!(config.scan_interval(), Duration::from_secs(30));
        assert_eq!(config.idle_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_scan_interval_is_rejected() {
        let config = LivenessConfig {
            scan_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_below_scan_interval_is_rejected() {
        let config = LivenessConfig {
            scan_interval_secs: 30,
            idle_timeout_secs: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_equal_to_scan_interval_is_allowed() {
        let config = LivenessConfig {
            scan_interval_secs: 30,
            idle_timeout_secs: 30,
        };
        assert!(config.validate().is_ok());
    }
}
