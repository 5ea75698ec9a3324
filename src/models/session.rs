use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::extension::ExtensionRequest;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CallStatus {
    Pending,
    Running,
    Expired,
    Ended,
}

impl CallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallStatus::Pending => "Pending",
            CallStatus::Running => "Running",
            CallStatus::Expired => "Expired",
            CallStatus::Ended => "Ended",
        }
    }
}

impl Default for CallStatus {
    fn default() -> Self {
        CallStatus::Pending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSession {
    pub id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: CallStatus,
}

impl CallSession {
    pub fn new(id: String) -> Self {
        Self {
            id,
            started_at: None,
            ended_at: None,
            status: CallStatus::Pending,
        }
    }
}

/// What the caller gets back once a call is over.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSummary {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub remaining_seconds: u64,
    pub extensions: Vec<ExtensionRequest>,
}

impl CallSummary {
    pub fn accepted_extensions(&self) -> usize {
        self.extensions
            .iter()
            .filter(|request| request.status.is_accepted())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_match_variants() {
        assert_eq!(CallStatus::default().as_str(), "Pending");
        assert_eq!(CallStatus::Expired.as_str(), "Expired");
        assert_eq!(CallStatus::Ended.as_str(), "Ended");
    }
}
