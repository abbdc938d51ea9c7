//! Engine settings.

use chrono_tz::Tz;

use crate::models::types::{Result, TransitError};

/// Civil zone of the São Paulo bus network
pub const DEFAULT_TIME_ZONE: Tz = chrono_tz::America::Sao_Paulo;

/// Durations at or above this many minutes are treated as GPS gaps or
/// vehicles re-entering the route
pub const DEFAULT_MAX_DURATION_MINUTES: f64 = 10.0;

/// Which stop's crossings count as the predecessor of a stop
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PredecessorPolicy {
    /// The stop at `stop_sequence - 1`
    #[default]
    Adjacent,
    /// The nearest lower `stop_sequence` among the selected stops, so that
    /// non-adjacent stop pairs still produce samples
    PreviousSelected,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Zone every timestamp is normalized to before hour/weekday bucketing
    pub time_zone: Tz,
    /// Exclusive upper bound of kept durations; the lower bound is always
    /// an exclusive zero
    pub max_duration_minutes: f64,
    pub predecessor: PredecessorPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: DEFAULT_TIME_ZONE,
            max_duration_minutes: DEFAULT_MAX_DURATION_MINUTES,
            predecessor: PredecessorPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Default settings in the zone named `name` (e.g. `"America/Sao_Paulo"`)
    pub fn with_time_zone_name(name: &str) -> Result<Self> {
        let time_zone: Tz = name
            .parse()
            .map_err(|_| TransitError::UnknownTimeZone(name.to_string()))?;
        Ok(Self {
            time_zone,
            ..Self::default()
        })
    }

    pub fn with_max_duration(mut self, minutes: f64) -> Self {
        self.max_duration_minutes = minutes;
        self
    }

    pub fn with_predecessor(mut self, policy: PredecessorPolicy) -> Self {
        self.predecessor = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.time_zone, chrono_tz::America::Sao_Paulo);
        assert_eq!(config.max_duration_minutes, 10.0);
        assert_eq!(config.predecessor, PredecessorPolicy::Adjacent);
    }

    #[test]
    fn test_time_zone_by_name() {
        let config = EngineConfig::with_time_zone_name("America/Los_Angeles").unwrap();
        assert_eq!(config.time_zone, chrono_tz::America::Los_Angeles);

        let err = EngineConfig::with_time_zone_name("Mars/Olympus_Mons").unwrap_err();
        assert!(matches!(err, TransitError::UnknownTimeZone(name) if name == "Mars/Olympus_Mons"));
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_max_duration(15.0)
            .with_predecessor(PredecessorPolicy::PreviousSelected);
        assert_eq!(config.max_duration_minutes, 15.0);
        assert_eq!(config.predecessor, PredecessorPolicy::PreviousSelected);
    }
}
