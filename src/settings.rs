use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::budget::BudgetConfig;

pub const DEBUG_ENV_VAR: &str = "CALLTIME_DEBUG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CallSettings {
    pub budget: BudgetConfig,
    pub tick_interval_ms: u64,
    /// Ticks between heartbeat events; forced to 1 in debug mode.
    pub heartbeat_every_ticks: u32,
    pub event_capacity: usize,
}

impl Default for CallSettings {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            tick_interval_ms: 1000,
            heartbeat_every_ticks: 10,
            event_capacity: 64,
        }
    }
}

impl CallSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn heartbeat_every(&self) -> u32 {
        self.heartbeat_every_with(debug_mode())
    }

    pub fn heartbeat_every_with(&self, debug: bool) -> u32 {
        if debug {
            1
        } else {
            self.heartbeat_every_ticks.max(1)
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.budget.validate()?;
        if self.event_capacity == 0 {
            anyhow::bail!("event_capacity must be greater than zero");
        }
        Ok(())
    }
}

pub fn debug_mode() -> bool {
    debug_flag(std::env::var(DEBUG_ENV_VAR).ok().as_deref())
}

/// Interprets a `CALLTIME_DEBUG` value: `1` or `true` in any case.
pub fn debug_flag(value: Option<&str>) -> bool {
    value.is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
}

/// JSON-backed settings file shared by every call started from this process.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<CallSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            match serde_json::from_str::<CallSettings>(&contents) {
                Ok(settings) if settings.validate().is_ok() => settings,
                Ok(_) => {
                    warn!(
                        "Settings in {} are inconsistent; using defaults",
                        path.display()
                    );
                    CallSettings::default()
                }
                Err(err) => {
                    warn!(
                        "Settings in {} are malformed ({err}); using defaults",
                        path.display()
                    );
                    CallSettings::default()
                }
            }
        } else {
            CallSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn settings(&self) -> CallSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: CallSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: CallSettings = serde_json::from_str(&contents)?;
        data.validate()?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &CallSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, CallSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, CallSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_settings_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("calltime-{}", Uuid::new_v4()))
            .join("settings.json")
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = SettingsStore::new(temp_settings_path()).unwrap();
        assert_eq!(store.settings(), CallSettings::default());
    }

    #[test]
    fn update_persists_and_reloads() {
        let path = temp_settings_path();
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.budget.max_minutes = 30;
        settings.heartbeat_every_ticks = 5;
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.settings(), settings);
        reopened.reload().unwrap();
        assert_eq!(reopened.settings().budget.max_minutes, 30);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn update_rejects_invalid_budget() {
        let path = temp_settings_path();
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.budget.start_seconds = 10_000;
        assert!(store.update(settings).is_err());
        assert_eq!(store.settings(), CallSettings::default());
        assert!(!path.exists());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_settings_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.settings(), CallSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn inconsistent_budget_in_file_falls_back_to_defaults() {
        let path = temp_settings_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"budget":{"startSeconds":99999}}"#).unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(store.settings(), CallSettings::default());
        assert!(store.reload().is_err());
        assert_eq!(store.settings(), CallSettings::default());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn debug_flag_accepts_one_or_true() {
        assert!(debug_flag(Some("1")));
        assert!(debug_flag(Some("true")));
        assert!(debug_flag(Some("TRUE")));
        assert!(!debug_flag(Some("0")));
        assert!(!debug_flag(Some("yes")));
        assert!(!debug_flag(Some("")));
        assert!(!debug_flag(None));
    }

    #[test]
    fn debug_forces_heartbeat_on_every_tick() {
        let settings = CallSettings {
            heartbeat_every_ticks: 10,
            ..CallSettings::default()
        };
        assert_eq!(settings.heartbeat_every_with(true), 1);
        assert_eq!(settings.heartbeat_every_with(false), 10);

        let zero = CallSettings {
            heartbeat_every_ticks: 0,
            ..CallSettings::default()
        };
        assert_eq!(zero.heartbeat_every_with(false), 1);
    }

    #[test]
    fn tick_interval_never_zero() {
        let settings = CallSettings {
            tick_interval_ms: 0,
            ..CallSettings::default()
        };
        assert_eq!(settings.tick_interval(), Duration::from_millis(1));
    }
}
