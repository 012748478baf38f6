//! Validated poll interval

use crate::{
    constants::{DEFAULT_REFRESH_SECS, MAX_REFRESH_SECS, MIN_REFRESH_SECS, REFRESH_STEP_SECS},
    error::ConfigError,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds between poll cycles, always within `[30, 600]` and on a 30s step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct RefreshInterval(u64);

impl RefreshInterval {
    pub const MIN: RefreshInterval = RefreshInterval(MIN_REFRESH_SECS);
    pub const MAX: RefreshInterval = RefreshInterval(MAX_REFRESH_SECS);

    pub fn from_secs(secs: u64) -> Result<Self, ConfigError> {
        if !(MIN_REFRESH_SECS..=MAX_REFRESH_SECS).contains(&secs) {
            return Err(ConfigError::IntervalOutOfRange {
                secs,
                min: MIN_REFRESH_SECS,
                max: MAX_REFRESH_SECS,
            });
        }
        if secs % REFRESH_STEP_SECS != 0 {
            return Err(ConfigError::IntervalOffStep {
                secs,
                step: REFRESH_STEP_SECS,
            });
        }
        Ok(Self(secs))
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(DEFAULT_REFRESH_SECS)
    }
}

impl TryFrom<u64> for RefreshInterval {
    type Error = ConfigError;

    fn try_from(secs: u64) -> Result<Self, Self::Error> {
        Self::from_secs(secs)
    }
}

impl From<RefreshInterval> for u64 {
    fn from(interval: RefreshInterval) -> Self {
        interval.0
    }
}

impl std::fmt::Display for RefreshInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert_eq!(RefreshInterval::from_secs(30).unwrap(), RefreshInterval::MIN);
        assert_eq!(RefreshInterval::from_secs(600).unwrap(), RefreshInterval::MAX);
        assert_eq!(RefreshInterval::default().as_secs(), 300);

        assert!(matches!(
            RefreshInterval::from_secs(0),
            Err(ConfigError::IntervalOutOfRange { .. })
        ));
        assert!(matches!(
            RefreshInterval::from_secs(630),
            Err(ConfigError::IntervalOutOfRange { .. })
        ));
        assert_eq!(
            RefreshInterval::from_secs(45),
            Err(ConfigError::IntervalOffStep { secs: 45, step: 30 })
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: RefreshInterval = serde_json::from_str("120").unwrap();
        assert_eq!(ok.as_duration(), Duration::from_secs(120));
        assert!(serde_json::from_str::<RefreshInterval>("10").is_err());
    }
}
