//! Reconciliation and runtime configuration.
use std::env;
use std::time::Duration;

use stat_core::{CategorySet, StatConfig};

use crate::api::{Result, RuntimeError};

/// Parameters of the reconciliation protocol.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Scale factor, privileged max, host ceiling and tolerance.
    pub stat: StatConfig,
    /// Version of the scale configuration. Owners migrated under another epoch
    /// are migrated again on their next pass.
    pub scale_epoch: u32,
    /// Categories whose custom max is `stat.privileged_max_health` rather than
    /// the scaled host baseline.
    pub privileged: CategorySet,
    /// Minimum physical defense difference that triggers an armor refresh.
    pub armor_tolerance: f64,
}

impl SyncConfig {
    pub const DEFAULT_ARMOR_TOLERANCE: f64 = 0.01;

    pub fn scale_factor(&self) -> f64 {
        self.stat.scale_factor
    }

    pub fn epsilon(&self) -> f64 {
        self.stat.epsilon
    }

    pub fn host_ceiling(&self) -> f64 {
        self.stat.host_ceiling
    }

    /// Value written to the host for a custom value `x`.
    pub fn host_safe(&self, value: f64) -> f64 {
        self.stat.host_safe(value)
    }

    pub fn validate(&self) -> Result<()> {
        let positive_finite = |field: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(RuntimeError::InvalidConfig {
                    field,
                    reason: format!("must be positive and finite, got {value}"),
                })
            }
        };

        positive_finite("scale_factor", self.stat.scale_factor)?;
        positive_finite("privileged_max_health", self.stat.privileged_max_health)?;
        positive_finite("host_ceiling", self.stat.host_ceiling)?;
        positive_finite("epsilon", self.stat.epsilon)?;
        positive_finite("armor_tolerance", self.armor_tolerance)?;
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            stat: StatConfig::default(),
            scale_epoch: 1,
            privileged: CategorySet::PLAYER,
            armor_tolerance: Self::DEFAULT_ARMOR_TOLERANCE,
        }
    }
}

/// Runtime configuration shared across the orchestrator and the sync worker.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    pub sync: SyncConfig,
    /// Period of the background full pass. `None` disables periodic passes;
    /// on-demand requests still run.
    pub sync_interval: Option<Duration>,
    pub command_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            // 10 host ticks at 20 ticks per second
            sync_interval: Some(Duration::from_millis(500)),
            command_buffer_size: 32,
            event_buffer_size: 100,
        }
    }
}

impl RuntimeConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Missing or unparsable values keep their defaults.
    ///
    /// Environment variables:
    /// - `STAT_SCALE_FACTOR` - Host to custom scale factor (default: 5.0)
    /// - `STAT_SCALE_EPOCH` - Scale configuration version (default: 1)
    /// - `STAT_HOST_CEILING` - Largest value written to the host (default: 1024)
    /// - `STAT_SYNC_EPSILON` - Reconciliation tolerance (default: 0.001)
    /// - `STAT_SYNC_INTERVAL_MS` - Periodic pass interval, 0 disables (default: 500)
    /// - `STAT_COMMAND_BUFFER` - Worker command queue size (default: 32)
    /// - `STAT_EVENT_BUFFER` - Event broadcast capacity (default: 100)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through `lookup`.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(scale) = parse_var::<f64>(lookup("STAT_SCALE_FACTOR")) {
            config.sync.stat.scale_factor = scale;
        }
        if let Some(epoch) = parse_var::<u32>(lookup("STAT_SCALE_EPOCH")) {
            config.sync.scale_epoch = epoch;
        }
        if let Some(ceiling) = parse_var::<f64>(lookup("STAT_HOST_CEILING")) {
            config.sync.stat.host_ceiling = ceiling;
        }
        if let Some(epsilon) = parse_var::<f64>(lookup("STAT_SYNC_EPSILON")) {
            config.sync.stat.epsilon = epsilon;
        }
        if let Some(millis) = parse_var::<u64>(lookup("STAT_SYNC_INTERVAL_MS")) {
            config.sync_interval = (millis > 0).then(|| Duration::from_millis(millis));
        }
        if let Some(capacity) = parse_var::<usize>(lookup("STAT_COMMAND_BUFFER")) {
            config.command_buffer_size = capacity.max(1);
        }
        if let Some(capacity) = parse_var::<usize>(lookup("STAT_EVENT_BUFFER")) {
            config.event_buffer_size = capacity.max(1);
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        self.sync.validate()?;
        if self.sync_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(RuntimeError::InvalidConfig {
                field: "sync_interval",
                reason: "must be non-zero when set".to_owned(),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(raw: Option<String>) -> Option<T>
where
    T: std::str::FromStr,
{
    raw?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RuntimeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.scale_factor(), 5.0);
        assert_eq!(config.sync.host_ceiling(), 1024.0);
        assert!(config.sync.privileged.contains_category(stat_core::EntityCategory::Player));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = SyncConfig::default();
        config.stat.scale_factor = 0.0;
        assert!(matches!(
            config.validate(),
            Err(RuntimeError::InvalidConfig {
                field: "scale_factor",
                ..
            })
        ));

        let mut config = SyncConfig::default();
        config.stat.epsilon = f64::NAN;
        assert!(config.validate().is_err());

        let config = RuntimeConfig {
            sync_interval: Some(Duration::ZERO),
            ..RuntimeConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("STAT_SCALE_FACTOR", " 10 "),
            ("STAT_SCALE_EPOCH", "3"),
            ("STAT_HOST_CEILING", "lots"),
            ("STAT_SYNC_INTERVAL_MS", "0"),
            ("STAT_COMMAND_BUFFER", "0"),
        ]
        .into_iter()
        .collect();

        let config =
            RuntimeConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.sync.scale_factor(), 10.0);
        assert_eq!(config.sync.scale_epoch, 3);
        assert_eq!(config.sync.host_ceiling(), 1024.0);
        assert_eq!(config.sync_interval, None);
        assert_eq!(config.command_buffer_size, 1);
        assert_eq!(config.event_buffer_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_environment_is_default() {
        assert_eq!(RuntimeConfig::from_lookup(|_| None), RuntimeConfig::default());
    }
}
