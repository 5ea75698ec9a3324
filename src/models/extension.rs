use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::budget::{ExtensionResult, RejectReason};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum RequestStatus {
    #[serde(rename_all = "camelCase")]
    Accepted {
        granted_seconds: u64,
        remaining_seconds: u64,
    },
    Rejected { reason: RejectReason },
}

impl RequestStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RequestStatus::Accepted { .. })
    }
}

/// One attempt to extend a call, kept for the call summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionRequest {
    pub id: String,
    pub requester: String,
    pub requested_at: DateTime<Utc>,
    pub status: RequestStatus,
}

impl ExtensionRequest {
    /// `previous_remaining` is the budget before the request; the grant is
    /// the difference, which is smaller than the increment when clamped.
    pub fn record(
        requester: &str,
        requested_at: DateTime<Utc>,
        result: ExtensionResult,
        previous_remaining: u64,
    ) -> Self {
        let status = match result {
            ExtensionResult::Accepted {
                new_remaining_seconds,
            } => RequestStatus::Accepted {
                granted_seconds: new_remaining_seconds.saturating_sub(previous_remaining),
                remaining_seconds: new_remaining_seconds,
            },
            ExtensionResult::Rejected { reason } => RequestStatus::Rejected { reason },
        };

        Self {
            id: Uuid::new_v4().to_string(),
            requester: requester.to_string(),
            requested_at,
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_grant_records_actual_seconds_added() {
        let request = ExtensionRequest::record(
            "You",
            Utc::now(),
            ExtensionResult::Accepted {
                new_remaining_seconds: 1200,
            },
            1140,
        );
        assert_eq!(
            request.status,
            RequestStatus::Accepted {
                granted_seconds: 60,
                remaining_seconds: 1200
            }
        );
        assert_eq!(request.requester, "You");
        assert!(Uuid::parse_str(&request.id).is_ok());
    }

    #[test]
    fn rejection_serializes_reason() {
        let request = ExtensionRequest::record(
            "John Doe",
            Utc::now(),
            ExtensionResult::Rejected {
                reason: RejectReason::Cooldown,
            },
            600,
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["status"]["status"], "rejected");
        assert_eq!(json["status"]["reason"], "cooldown");
        assert!(json.get("requestedAt").is_some());
    }
}
