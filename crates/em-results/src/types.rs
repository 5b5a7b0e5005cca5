//! Result data types.

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub timestamp: String,
    pub engine: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
    pub solver_version: String,
    pub limits: RunLimits,
    pub outcome: RunOutcomeRecord,
    #[serde(default)]
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunLimits {
    pub max_timesteps: u64,
    pub end_criterion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum RunOutcomeRecord {
    Success {
        termination: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timesteps: Option<u64>,
    },
    Failure {
        message: String,
    },
}

impl RunOutcomeRecord {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcomeRecord::Success { .. })
    }
}

/// RFC 3339 timestamp for "now", UTC.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
