use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::analysis::AnalysisResult;

/// One monitored meeting, from start signal to end signal. Exactly one
/// session is active at a time; it is persisted after every mutation so it
/// survives process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub analyses: Vec<AnalysisResult>,
    #[serde(default)]
    pub no_key_warning_shown: bool,
}

impl Session {
    pub fn begin(start_time: DateTime<Utc>) -> Self {
        Self {
            id: format!("session_{}", start_time.timestamp_millis()),
            start_time,
            end_time: None,
            analyses: Vec::new(),
            no_key_warning_shown: false,
        }
    }

    pub fn has_data(&self) -> bool {
        !self.analyses.is_empty()
    }

    /// Whole minutes monitored, never reported as zero.
    pub fn duration_minutes(&self) -> i64 {
        let end = match self.end_time {
            Some(end) => end,
            None => return 0,
        };
        let minutes = ((end - self.start_time).num_seconds() as f64 / 60.0).round() as i64;
        minutes.max(1)
    }
}
