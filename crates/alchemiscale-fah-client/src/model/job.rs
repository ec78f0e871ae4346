// Job (RUN/CLONE/GEN) model types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{timestamp, timestamp_opt};

/// Lifecycle state of a job on the work server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    New,
    Ready,
    Assigned,
    Finished,
    Failed,
    Stopped,
    Held,
    Processing,
}

impl JobState {
    /// Whether the work server will not advance this job any further
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Finished | JobState::Failed | JobState::Stopped)
    }
}

/// State of a single job as reported by the work server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobData {
    /// ID of the work server that executed this job
    pub server: u64,
    /// ID of the core that executed this job
    pub core: u32,
    pub project: u64,
    pub run: u64,
    pub clone: u64,
    /// The latest job generation
    #[serde(rename = "gen")]
    pub generation: u64,
    pub state: JobState,
    /// Last time the job state changed
    #[serde(default, with = "timestamp_opt", skip_serializing_if = "Option::is_none")]
    pub last: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retries: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
}

/// Jobs of a project, as of `ts`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobResults {
    pub jobs: Vec<JobData>,
    #[serde(with = "timestamp")]
    pub ts: DateTime<Utc>,
}

/// Action requested of the work server for a job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobActionKind {
    Create,
    Fail,
    Reset,
    Stop,
    Restart,
}

impl fmt::Display for JobActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobActionKind::Create => "create",
            JobActionKind::Fail => "fail",
            JobActionKind::Reset => "reset",
            JobActionKind::Stop => "stop",
            JobActionKind::Restart => "restart",
        };
        f.write_str(s)
    }
}

impl FromStr for JobActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "create" => Ok(JobActionKind::Create),
            "fail" => Ok(JobActionKind::Fail),
            "reset" => Ok(JobActionKind::Reset),
            "stop" => Ok(JobActionKind::Stop),
            "restart" => Ok(JobActionKind::Restart),
            other => Err(format!("unknown job action: {other}")),
        }
    }
}

/// Request body for clone endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAction {
    pub action: JobActionKind,
}

impl From<JobActionKind> for JobAction {
    fn from(action: JobActionKind) -> Self {
        Self { action }
    }
}
