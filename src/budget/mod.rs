pub mod config;
pub mod format;
pub mod state;

pub use config::BudgetConfig;
pub use format::format_time;
pub use state::{CallPhase, CallTimeBudget, ExtensionResult, RejectReason};
