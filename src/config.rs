use crate::output::{DEFAULT_MAX_WIDTH, RenderOptions};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const CURRENT_VERSION: i32 = 1;
pub const MIN_WIDTH: usize = 10;

const VALID_COLOR: &[&str] = &["auto", "always", "never"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub version: i32,
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    pub max_width: Option<usize>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationErrors {
    pub issues: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        self.issues.push(ValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(first) = self.issues.first() {
            write!(
                f,
                "configuration validation failed: {}: {}",
                first.field, first.message
            )
        } else {
            write!(f, "configuration validation failed")
        }
    }
}

impl std::error::Error for ValidationErrors {}

pub fn load(path: &Path) -> Result<Config, String> {
    let cfg = parse(path)?;
    validate(&cfg).map_err(|e| e.to_string())?;
    Ok(cfg)
}

pub fn parse(path: &Path) -> Result<Config, String> {
    let text = fs::read_to_string(path).map_err(|e| format!("read config: {e}"))?;
    let cfg: Config = serde_yaml::from_str(&text).map_err(|e| format!("parse config yaml: {e}"))?;
    Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<(), ValidationErrors> {
    let mut issues = ValidationErrors::new();

    if cfg.version != CURRENT_VERSION {
        issues.add("version", format!("must be {CURRENT_VERSION}"));
    }

    validate_report(&mut issues, &cfg.report);

    if issues.has_issues() {
        Err(issues)
    } else {
        Ok(())
    }
}

impl Config {
    /// `color_default` applies when the file leaves `color` unset or `auto`.
    pub fn resolve_render_options(&self, color_default: bool) -> RenderOptions {
        let color = match self.report.color.as_str() {
            "always" => true,
            "never" => false,
            _ => color_default,
        };

        RenderOptions {
            max_width: self.report.max_width.unwrap_or(DEFAULT_MAX_WIDTH),
            color,
        }
    }
}

fn validate_report(issues: &mut ValidationErrors, r: &ReportSettings) {
    if let Some(width) = r.max_width
        && width < MIN_WIDTH
    {
        issues.add(
            "report.max_width",
            format!("must be at least {MIN_WIDTH}"),
        );
    }

    if !r.color.is_empty() && !VALID_COLOR.contains(&r.color.as_str()) {
        issues.add("report.color", "must be one of auto, always, never");
    }
}
