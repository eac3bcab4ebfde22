//! Lifecycle states of a collector result and the rules for moving between them.
//!
//! The database layer owns the compare-and-swap; this module decides what a
//! requested transition should turn into before any write happens.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Key inside a collector result's `metadata` object that holds the
/// append-only transition log.
pub const STATUS_HISTORY_KEY: &str = "status_history";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorResultStatus {
    Pending,
    Processing,
    Running,
    FailedRetry,
    Completed,
    Failed,
}

impl CollectorResultStatus {
    pub const TERMINAL: [CollectorResultStatus; 2] = [Self::Completed, Self::Failed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Running => "running",
            Self::FailedRetry => "failed_retry",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }
}

impl std::fmt::Display for CollectorResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorResultStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "running" => Ok(Self::Running),
            "failed_retry" => Ok(Self::FailedRetry),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// What a requested transition resolves to, given the current row state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// The record is already terminal; nothing is written.
    SkipTerminal { current: CollectorResultStatus },
    /// Write `to`, conditioned on the row still being at `from`.
    Apply {
        from: CollectorResultStatus,
        to: CollectorResultStatus,
        /// `true` when a `completed` request was downgraded for lack of payload.
        coerced: bool,
    },
}

/// Decide how a transition request should be applied.
///
/// A terminal record is never moved. A `completed` request without a
/// non-empty payload (in the update or already stored) becomes `processing`.
#[must_use]
pub fn plan_transition(
    current: CollectorResultStatus,
    requested: CollectorResultStatus,
    has_payload: bool,
) -> TransitionPlan {
    if current.is_terminal() {
        return TransitionPlan::SkipTerminal { current };
    }

    if requested == CollectorResultStatus::Completed && !has_payload {
        return TransitionPlan::Apply {
            from: current,
            to: CollectorResultStatus::Processing,
            coerced: true,
        };
    }

    TransitionPlan::Apply {
        from: current,
        to: requested,
        coerced: false,
    }
}

/// One entry of the append-only status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub from: CollectorResultStatus,
    pub to: CollectorResultStatus,
    pub at: DateTime<Utc>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TransitionEntry {
    #[must_use]
    pub fn new(
        from: CollectorResultStatus,
        to: CollectorResultStatus,
        source: &str,
        reason: Option<&str>,
    ) -> Self {
        Self {
            from,
            to,
            at: Utc::now(),
            source: source.to_string(),
            reason: reason.map(str::to_string),
        }
    }
}

/// Read the transition log out of a metadata object.
///
/// Entries that fail to deserialize are skipped.
#[must_use]
pub fn status_history(metadata: &serde_json::Value) -> Vec<TransitionEntry> {
    metadata
        .get(STATUS_HISTORY_KEY)
        .and_then(serde_json::Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| serde_json::from_value(e.clone()).ok())
                .collect()
        })
        .unwrap_or_default()
}

/// `true` when a payload value carries real content.
#[must_use]
pub fn has_payload(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.trim().is_empty())
}
