//! Time budget for short one-on-one calls.
//!
//! [`CallTimeBudget`] is the synchronous bookkeeping: remaining seconds, the
//! ceiling, fixed-size extensions and the request cooldown. [`CallController`]
//! wraps it with a tokio ticker and an event stream for callers that want the
//! countdown driven for them.

pub mod budget;
pub mod call;
pub mod clock;
pub mod error;
pub mod models;
pub mod settings;

pub use budget::{BudgetConfig, CallPhase, CallTimeBudget, ExtensionResult, RejectReason};
pub use call::{BudgetSnapshot, CallController, CallEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::BudgetError;
pub use models::{CallSession, CallStatus, CallSummary, ExtensionRequest, RequestStatus};
pub use settings::{CallSettings, SettingsStore};

/// Installs `env_logger`, reading `RUST_LOG` and defaulting to info.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}
