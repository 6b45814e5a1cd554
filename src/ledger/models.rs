/*!
 * Ledger records.
 *
 * These structures are the on-disk JSON layout of the completion ledger.
 */

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Current ledger format version
pub const LEDGER_VERSION: u32 = 1;

/// Completion state of one media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    /// Processing started but did not finish
    Pending,
    /// Subtitle written and in place
    Done,
    /// Last attempt raised a per-file error
    Failed,
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerStatus::Pending => write!(f, "pending"),
            LedgerStatus::Done => write!(f, "done"),
            LedgerStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for LedgerStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(LedgerStatus::Pending),
            "done" => Ok(LedgerStatus::Done),
            "failed" => Ok(LedgerStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid ledger status: {}", s)),
        }
    }
}

/// One ledger record, keyed by media path relative to the run root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub status: LedgerStatus,

    /// Subtitle path relative to the run root
    pub subtitle: String,

    /// Number of times processing was started
    #[serde(default)]
    pub attempts: u32,

    /// Message of the last failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// RFC 3339 time of the last transition
    pub updated_at: String,
}

impl LedgerEntry {
    pub fn new(status: LedgerStatus, subtitle: String) -> Self {
        Self {
            status,
            subtitle,
            attempts: 0,
            error: None,
            updated_at: now_rfc3339(),
        }
    }

    /// Move to `status`, stamping the update time
    pub fn transition(&mut self, status: LedgerStatus) {
        self.status = status;
        self.updated_at = now_rfc3339();
    }
}

/// Whole ledger file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerDocument {
    pub version: u32,

    #[serde(default)]
    pub entries: BTreeMap<String, LedgerEntry>,
}

impl Default for LedgerDocument {
    fn default() -> Self {
        Self {
            version: LEDGER_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Entry counts per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerCounts {
    pub pending: usize,
    pub done: usize,
    pub failed: usize,
}

impl fmt::Display for LedgerCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} done, {} failed, {} pending",
            self.done, self.failed, self.pending
        )
    }
}

pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}
