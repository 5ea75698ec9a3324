use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

pub const DEFAULT_START_SECONDS: u64 = 5 * 60;
pub const DEFAULT_MAX_MINUTES: u64 = 20;
pub const DEFAULT_EXTENSION_SECONDS: u64 = 5 * 60;
pub const DEFAULT_COOLDOWN_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_WARNING_THRESHOLD_SECONDS: u64 = 60;

/// Tunable limits for a single call's time budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetConfig {
    /// Seconds on the clock when the call starts.
    pub start_seconds: u64,

    /// Hard ceiling on the remaining time, in whole minutes.
    pub max_minutes: u64,

    /// Seconds granted per accepted extension.
    pub extension_seconds: u64,

    /// Minimum wall-clock gap between two accepted extension requests.
    pub cooldown_ms: u64,

    /// Remaining time at or below which the call counts as almost out of time.
    pub warning_threshold_seconds: u64,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            start_seconds: DEFAULT_START_SECONDS,
            max_minutes: DEFAULT_MAX_MINUTES,
            extension_seconds: DEFAULT_EXTENSION_SECONDS,
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            warning_threshold_seconds: DEFAULT_WARNING_THRESHOLD_SECONDS,
        }
    }
}

impl BudgetConfig {
    pub fn max_seconds(&self) -> u64 {
        self.max_minutes.saturating_mul(60)
    }

    pub fn validate(&self) -> Result<(), BudgetError> {
        if self.max_minutes == 0 {
            return Err(BudgetError::InvalidConfiguration(
                "max_minutes must be greater than zero".into(),
            ));
        }
        if self.extension_seconds == 0 {
            return Err(BudgetError::InvalidConfiguration(
                "extension_seconds must be greater than zero".into(),
            ));
        }
        if self.start_seconds > self.max_seconds() {
            return Err(BudgetError::InvalidConfiguration(format!(
                "start_seconds {} exceeds the {} minute maximum ({} seconds)",
                self.start_seconds,
                self.max_minutes,
                self.max_seconds()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_meeting_screen() {
        let config = BudgetConfig::default();
        assert_eq!(config.start_seconds, 300);
        assert_eq!(config.max_seconds(), 1200);
        assert_eq!(config.extension_seconds, 300);
        assert_eq!(config.cooldown_ms, 300_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn start_above_maximum_is_rejected() {
        let config = BudgetConfig {
            start_seconds: 1201,
            ..BudgetConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(BudgetError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn start_equal_to_maximum_is_allowed() {
        let config = BudgetConfig {
            start_seconds: 1200,
            ..BudgetConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_maximum_or_increment_is_rejected() {
        let no_max = BudgetConfig {
            start_seconds: 0,
            max_minutes: 0,
            ..BudgetConfig::default()
        };
        assert!(no_max.validate().is_err());

        let no_increment = BudgetConfig {
            extension_seconds: 0,
            ..BudgetConfig::default()
        };
        assert!(no_increment.validate().is_err());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: BudgetConfig =
            serde_json::from_str(r#"{"maxMinutes": 30, "cooldownMs": 1000}"#).unwrap();
        assert_eq!(config.max_minutes, 30);
        assert_eq!(config.cooldown_ms, 1000);
        assert_eq!(config.start_seconds, DEFAULT_START_SECONDS);
        assert_eq!(config.warning_threshold_seconds, 60);
    }
}
