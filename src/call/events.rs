use serde::{Deserialize, Serialize};

use crate::budget::{format_time, CallPhase, CallTimeBudget, RejectReason};
use crate::models::{CallSummary, ExtensionRequest};

/// Read-only view of a budget, shaped for rendering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSnapshot {
    pub remaining_seconds: u64,
    pub elapsed_seconds: u64,
    pub max_seconds: u64,
    pub phase: CallPhase,
    pub almost_out_of_time: bool,
    pub can_request_extension: bool,
    pub cooldown_remaining_ms: u64,
    pub display: String,
}

impl BudgetSnapshot {
    pub fn capture(budget: &CallTimeBudget, now_ms: i64) -> Self {
        Self {
            remaining_seconds: budget.remaining_seconds(),
            elapsed_seconds: budget.elapsed_seconds(),
            max_seconds: budget.max_seconds(),
            phase: budget.phase(),
            almost_out_of_time: budget.is_almost_out_of_time(),
            can_request_extension: budget.can_request_extension(now_ms),
            cooldown_remaining_ms: budget.cooldown_remaining_ms(now_ms),
            display: format_time(budget.remaining_seconds()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "payload")]
pub enum CallEvent {
    StateChanged(BudgetSnapshot),
    Tick(BudgetSnapshot),
    Heartbeat(BudgetSnapshot),
    AlmostOutOfTime(BudgetSnapshot),
    Expired(BudgetSnapshot),
    ExtensionGranted {
        request: ExtensionRequest,
        message: String,
        snapshot: BudgetSnapshot,
    },
    ExtensionRejected {
        request: ExtensionRequest,
        reason: RejectReason,
        message: String,
    },
    Ended(CallSummary),
}

impl CallEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CallEvent::StateChanged(_) => "call-state-changed",
            CallEvent::Tick(_) => "call-tick",
            CallEvent::Heartbeat(_) => "call-heartbeat",
            CallEvent::AlmostOutOfTime(_) => "call-almost-out-of-time",
            CallEvent::Expired(_) => "call-expired",
            CallEvent::ExtensionGranted { .. } => "extension-granted",
            CallEvent::ExtensionRejected { .. } => "extension-rejected",
            CallEvent::Ended(_) => "call-ended",
        }
    }
}
