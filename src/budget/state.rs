use serde::{Deserialize, Serialize};

use super::config::BudgetConfig;
use crate::error::BudgetError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CallPhase {
    Running,
    Expired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    Cooldown,
    AtMaximum,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Cooldown => "cooldown",
            RejectReason::AtMaximum => "at-maximum",
        }
    }
}

/// Outcome of [`CallTimeBudget::request_extension`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "result")]
pub enum ExtensionResult {
    #[serde(rename_all = "camelCase")]
    Accepted { new_remaining_seconds: u64 },
    Rejected { reason: RejectReason },
}

impl ExtensionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ExtensionResult::Accepted { .. })
    }
}

/// Remaining-time bookkeeping for one call.
///
/// Holds no timers of its own: a scheduler calls [`tick`](Self::tick) once per
/// second and callers pass the wall-clock instant (milliseconds since the Unix
/// epoch) into the extension checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTimeBudget {
    remaining_seconds: u64,
    elapsed_seconds: u64,
    max_seconds: u64,
    max_minutes: u64,
    extension_seconds: u64,
    cooldown_ms: u64,
    warning_threshold_seconds: u64,
    last_request_at_ms: Option<i64>,
}

impl CallTimeBudget {
    pub fn new(config: &BudgetConfig) -> Result<Self, BudgetError> {
        config.validate()?;

        Ok(Self {
            remaining_seconds: config.start_seconds,
            elapsed_seconds: 0,
            max_seconds: config.max_seconds(),
            max_minutes: config.max_minutes,
            extension_seconds: config.extension_seconds,
            cooldown_ms: config.cooldown_ms,
            warning_threshold_seconds: config.warning_threshold_seconds,
            last_request_at_ms: None,
        })
    }

    pub fn initialize(
        start_seconds: u64,
        max_minutes: u64,
        extension_seconds: u64,
        cooldown_ms: u64,
    ) -> Result<Self, BudgetError> {
        Self::new(&BudgetConfig {
            start_seconds,
            max_minutes,
            extension_seconds,
            cooldown_ms,
            ..BudgetConfig::default()
        })
    }

    pub fn tick(&mut self) {
        if self.remaining_seconds > 0 {
            self.remaining_seconds -= 1;
            self.elapsed_seconds += 1;
        }
    }

    pub fn can_request_extension(&self, now_ms: i64) -> bool {
        self.cooldown_remaining_ms(now_ms) == 0
    }

    /// Milliseconds until another request would pass the cooldown check.
    pub fn cooldown_remaining_ms(&self, now_ms: i64) -> u64 {
        let Some(last) = self.last_request_at_ms else {
            return 0;
        };
        let since = now_ms.saturating_sub(last);
        if since < 0 {
            // Clock moved backwards; the full cooldown still applies.
            return self.cooldown_ms;
        }
        self.cooldown_ms.saturating_sub(since as u64)
    }

    /// Grants one extension if the ceiling and cooldown allow it.
    ///
    /// The ceiling is checked first, so a budget at its maximum reports
    /// [`RejectReason::AtMaximum`] even while the cooldown is running.
    pub fn request_extension(&mut self, now_ms: i64) -> ExtensionResult {
        if self.remaining_minutes() >= self.max_minutes {
            return ExtensionResult::Rejected {
                reason: RejectReason::AtMaximum,
            };
        }
        if !self.can_request_extension(now_ms) {
            return ExtensionResult::Rejected {
                reason: RejectReason::Cooldown,
            };
        }

        self.remaining_seconds = self
            .remaining_seconds
            .saturating_add(self.extension_seconds)
            .min(self.max_seconds);
        self.last_request_at_ms = Some(now_ms);

        ExtensionResult::Accepted {
            new_remaining_seconds: self.remaining_seconds,
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    /// Remaining time rounded up to whole minutes.
    pub fn remaining_minutes(&self) -> u64 {
        self.remaining_seconds.div_ceil(60)
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn max_seconds(&self) -> u64 {
        self.max_seconds
    }

    pub fn extension_seconds(&self) -> u64 {
        self.extension_seconds
    }

    pub fn cooldown_ms(&self) -> u64 {
        self.cooldown_ms
    }

    pub fn last_request_at_ms(&self) -> Option<i64> {
        self.last_request_at_ms
    }

    pub fn phase(&self) -> CallPhase {
        if self.remaining_seconds == 0 {
            CallPhase::Expired
        } else {
            CallPhase::Running
        }
    }

    pub fn is_almost_out_of_time(&self) -> bool {
        self.is_almost_out_of_time_within(self.warning_threshold_seconds)
    }

    pub fn is_almost_out_of_time_within(&self, threshold_seconds: u64) -> bool {
        self.remaining_seconds > 0 && self.remaining_seconds <= threshold_seconds
    }
}
