use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

/// Outcome of a single step, as reported by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Failed,
    FailedSkippable,
    Skipped,
    SkippedWithRunIf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown result code {0}")]
pub struct UnknownStatusCode(pub i32);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown step status {0:?}")]
pub struct UnknownStatusName(pub String);

impl StepStatus {
    pub const ALL: [StepStatus; 5] = [
        StepStatus::Success,
        StepStatus::Failed,
        StepStatus::FailedSkippable,
        StepStatus::Skipped,
        StepStatus::SkippedWithRunIf,
    ];

    pub fn code(self) -> i32 {
        match self {
            StepStatus::Success => 0,
            StepStatus::Failed => 1,
            StepStatus::FailedSkippable => 2,
            StepStatus::Skipped => 3,
            StepStatus::SkippedWithRunIf => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Success => "success",
            StepStatus::Failed => "failed",
            StepStatus::FailedSkippable => "failed_skippable",
            StepStatus::Skipped => "skipped",
            StepStatus::SkippedWithRunIf => "skipped_with_run_if",
        }
    }

    /// Failed and FailedSkippable carry a meaningful exit code.
    pub fn has_exit_code(self) -> bool {
        matches!(self, StepStatus::Failed | StepStatus::FailedSkippable)
    }
}

impl TryFrom<i32> for StepStatus {
    type Error = UnknownStatusCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        StepStatus::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or(UnknownStatusCode(code))
    }
}

impl FromStr for StepStatus {
    type Err = UnknownStatusName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        StepStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| UnknownStatusName(s.to_string()))
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub exit_code: i32,
    #[serde(rename = "duration_ms", with = "duration_ms", default)]
    pub duration: Duration,
}

impl StepResult {
    pub fn new(step_name: impl Into<String>, status: StepStatus) -> Self {
        Self {
            step_name: step_name.into(),
            status,
            error: None,
            exit_code: 0,
            duration: Duration::ZERO,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}

/// Snapshot of a build run, with steps grouped by outcome in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRunResults {
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(default)]
    pub success_steps: Vec<StepResult>,
    #[serde(default)]
    pub failed_steps: Vec<StepResult>,
    #[serde(default)]
    pub failed_skippable_steps: Vec<StepResult>,
    #[serde(default)]
    pub skipped_steps: Vec<StepResult>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read results {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse results json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("parse results yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("step {step:?} has status {status} but is listed under {bucket}")]
    Misplaced {
        step: String,
        status: StepStatus,
        bucket: &'static str,
    },
}

impl BuildRunResults {
    pub fn new(start_time: OffsetDateTime) -> Self {
        Self {
            start_time,
            success_steps: Vec::new(),
            failed_steps: Vec::new(),
            failed_skippable_steps: Vec::new(),
            skipped_steps: Vec::new(),
        }
    }

    /// Appends a step to the bucket its status belongs to.
    pub fn record(&mut self, step: StepResult) {
        match step.status {
            StepStatus::Success => self.success_steps.push(step),
            StepStatus::Failed => self.failed_steps.push(step),
            StepStatus::FailedSkippable => self.failed_skippable_steps.push(step),
            StepStatus::Skipped | StepStatus::SkippedWithRunIf => self.skipped_steps.push(step),
        }
    }

    pub fn success_count(&self) -> usize {
        self.success_steps.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed_steps.len()
    }

    pub fn failed_skippable_count(&self) -> usize {
        self.failed_skippable_steps.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped_steps.len()
    }

    pub fn total(&self) -> usize {
        self.success_count()
            + self.failed_count()
            + self.failed_skippable_count()
            + self.skipped_count()
    }

    pub fn check_buckets(&self) -> Result<(), LoadError> {
        let buckets: [(&'static str, &[StepResult], &[StepStatus]); 4] = [
            (
                "success_steps",
                self.success_steps.as_slice(),
                &[StepStatus::Success][..],
            ),
            (
                "failed_steps",
                self.failed_steps.as_slice(),
                &[StepStatus::Failed][..],
            ),
            (
                "failed_skippable_steps",
                self.failed_skippable_steps.as_slice(),
                &[StepStatus::FailedSkippable][..],
            ),
            (
                "skipped_steps",
                self.skipped_steps.as_slice(),
                &[StepStatus::Skipped, StepStatus::SkippedWithRunIf][..],
            ),
        ];

        for (bucket, steps, allowed) in buckets {
            if let Some(step) = steps.iter().find(|s| !allowed.contains(&s.status)) {
                return Err(LoadError::Misplaced {
                    step: step.step_name.clone(),
                    status: step.status,
                    bucket,
                });
            }
        }

        Ok(())
    }

    /// Reads a results file; `.yml`/`.yaml` are parsed as YAML, anything else as JSON.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yml") || ext.eq_ignore_ascii_case("yaml"));

        let results: BuildRunResults = if is_yaml {
            serde_yaml::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };

        results.check_buckets()?;
        Ok(results)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
