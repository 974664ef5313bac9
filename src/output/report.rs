use crate::model::{BuildRunResults, StepResult, StepStatus};
use crate::output::sink::{Line, Sink};
use crate::output::style::{Color, visible_width};
use std::fmt;
use std::io;
use std::time::Duration;
use time::OffsetDateTime;

pub const DEFAULT_MAX_WIDTH: usize = 50;
pub const ELLIPSIS: &str = "...";

// Same width as "| ✅ |" and the other icon cells.
const MEASURE_LEAD: &str = "|...|";

/// Whether the caller should keep going or stop the process after a report.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Terminate,
}

impl Verdict {
    pub fn exit_code(self) -> i32 {
        match self {
            Verdict::Continue => 0,
            Verdict::Terminate => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Box width in chars; escape sequences never count.
    pub max_width: usize,
    pub color: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            color: true,
        }
    }
}

pub struct Renderer<S> {
    sink: S,
    options: RenderOptions,
    clock: fn() -> OffsetDateTime,
}

impl<S: Sink> Renderer<S> {
    pub fn new(sink: S, options: RenderOptions) -> Self {
        Self {
            sink,
            options,
            clock: OffsetDateTime::now_utc,
        }
    }

    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn render_workflow_header(&self, title: &str) -> io::Result<()> {
        self.sink.emit(&[
            Line::blank(),
            Line::info(self.paint(Color::Blue, &format!("Running workflow ({title})"))),
            Line::blank(),
        ])
    }

    pub fn render_step_header(&self, title: &str, index: usize) -> io::Result<()> {
        let header = |title: &str| format!("| ({index}) {title} |");

        let mut content = header(title);
        let width = visible_width(&content);
        if width > self.options.max_width {
            let title = truncate_title(title, width - self.options.max_width);
            content = header(title.as_str());
        }

        let sep = separator(&content);
        self.sink.emit(&[Line::info(&sep), Line::info(content), Line::info(sep)])
    }

    /// Renders the finish banner of one step.
    ///
    /// The box is measured on an uncolored line with `|...|` standing in for
    /// the icon cell, so color sequences never push it past `max_width`.
    pub fn render_step_summary(
        &self,
        title: &str,
        status: StepStatus,
        duration: Duration,
        exit_code: i32,
    ) -> io::Result<()> {
        let run_time = format_seconds(duration, " sec");
        let line = |lead: &str, title: &str| {
            if status.has_exit_code() {
                format!("{lead} {title} | {run_time} | exit code: {exit_code} |")
            } else {
                format!("{lead} {title} | {run_time} |")
            }
        };

        let mut title = title.to_string();
        let mut measured = line(MEASURE_LEAD, title.as_str());
        let width = visible_width(&measured);
        if width > self.options.max_width {
            title = truncate_title(&title, width - self.options.max_width);
            measured = line(MEASURE_LEAD, title.as_str());
        }
        let sep = separator(&measured);

        let (icon, color) = match status {
            StepStatus::Success => ("✅", Color::Green),
            StepStatus::Failed => ("❌", Color::Red),
            StepStatus::FailedSkippable => ("❌", Color::Yellow),
            StepStatus::Skipped | StepStatus::SkippedWithRunIf => ("➡", Color::Blue),
        };
        let lead = format!("| {icon} |");
        let content = line(lead.as_str(), self.paint(color, &title).as_str());

        self.sink.emit(&[
            Line::info(&sep),
            Line::info(content),
            Line::info(sep),
            Line::blank(),
        ])
    }

    /// Like [`Renderer::render_step_summary`], for a raw executor result code.
    /// Unknown codes are reported and nothing else is rendered.
    pub fn render_step_summary_code(
        &self,
        title: &str,
        code: i32,
        duration: Duration,
        exit_code: i32,
    ) -> io::Result<()> {
        match StepStatus::try_from(code) {
            Ok(status) => self.render_step_summary(title, status, duration, exit_code),
            Err(err) => self.sink.emit(&[Line::error(format!("Unknown result code: {}", err.0))]),
        }
    }

    /// Takes the status as text: a name such as `failed_skippable` or a
    /// numeric result code. Unrecognised text is reported like an unknown code.
    pub fn render_step_summary_named(
        &self,
        title: &str,
        status: &str,
        duration: Duration,
        exit_code: i32,
    ) -> io::Result<()> {
        if let Ok(code) = status.trim().parse::<i32>() {
            return self.render_step_summary_code(title, code, duration, exit_code);
        }

        match status.parse::<StepStatus>() {
            Ok(status) => self.render_step_summary(title, status, duration, exit_code),
            Err(err) => self.sink.emit(&[Line::error(format!("Unknown step status: {}", err.0))]),
        }
    }

    pub fn render_fatal_failure(
        &self,
        start_time: OffsetDateTime,
        err: &dyn fmt::Display,
    ) -> io::Result<Verdict> {
        let elapsed = self.elapsed_since(start_time);
        let elapsed = Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));

        self.sink.emit(&[
            Line::error(format!("Build failed: {err}")),
            Line::fatal(format!(
                "Total run time: {}",
                humantime::format_duration(elapsed)
            )),
        ])?;

        Ok(Verdict::Terminate)
    }

    pub fn render_summary(&self, results: &BuildRunResults) -> io::Result<Verdict> {
        let success = results.success_count();
        let failed = results.failed_count();
        let failed_skippable = results.failed_skippable_count();
        let skipped = results.skipped_count();
        let total = results.total();

        let run_time = self.elapsed_since(results.start_time);
        let mut lines = vec![
            Line::blank(),
            Line::info("==> Summary:"),
            Line::info(format!(
                "Total run time: {}",
                format_seconds(run_time, " seconds")
            )),
        ];

        if total == 0 {
            self.sink.emit(&lines)?;
            return Ok(Verdict::Continue);
        }

        lines.push(Line::info(format!("Out of {total} steps:")));

        let buckets = [
            (success, Color::Green, "was successful"),
            (failed, Color::Red, "failed"),
            (
                failed_skippable,
                Color::Yellow,
                "failed but was marked as skippable",
            ),
            (skipped, Color::Blue, "was skipped"),
        ];
        for (count, color, label) in buckets {
            if count > 0 {
                lines.push(Line::info(self.paint(color, &format!(" * {count} {label}"))));
            }
        }
        lines.push(Line::blank());

        let verdict = if failed > 0 {
            lines.push(Line::fatal("FINISHED but a couple of steps failed - Ouch"));
            Verdict::Terminate
        } else {
            lines.push(Line::info("DONE - Congrats!!"));
            if failed_skippable > 0 {
                lines.push(Line::warn("P.S.: a couple of non important steps failed"));
            }
            Verdict::Continue
        };

        self.sink.emit(&lines)?;
        Ok(verdict)
    }

    pub fn render_step_status(&self, results: &BuildRunResults) -> io::Result<()> {
        let mut lines = vec![Line::info(format!(
            "Out of {} steps, {} was successful, {} failed, {} failed but was marked as skippable and {} was skipped",
            results.total(),
            results.success_count(),
            results.failed_count(),
            results.failed_skippable_count(),
            results.skipped_count(),
        ))];

        lines.extend(status_list_lines("Failed steps:", &results.failed_steps));
        lines.extend(status_list_lines(
            "Failed but skippable steps:",
            &results.failed_skippable_steps,
        ));
        lines.extend(status_list_lines("Skipped steps:", &results.skipped_steps));

        self.sink.emit(&lines)
    }

    pub fn render_step_status_list(&self, header: &str, steps: &[StepResult]) -> io::Result<()> {
        let lines = status_list_lines(header, steps);
        if lines.is_empty() {
            return Ok(());
        }
        self.sink.emit(&lines)
    }

    fn paint(&self, color: Color, text: &str) -> String {
        color.paint(text, self.options.color)
    }

    fn elapsed_since(&self, start: OffsetDateTime) -> Duration {
        Duration::try_from((self.clock)() - start).unwrap_or_default()
    }
}

/// Shortens `title` so its line loses `overflow` chars, keeping room for [`ELLIPSIS`].
///
/// Counts chars. If the title is too short to absorb the overflow, only the
/// ellipsis is left.
pub fn truncate_title(title: &str, overflow: usize) -> String {
    let keep = title
        .chars()
        .count()
        .saturating_sub(overflow)
        .saturating_sub(ELLIPSIS.len());

    let mut out: String = title.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Seconds with precision that shrinks as the value grows: `0.25`, `3.4`, `42`.
pub fn format_seconds(duration: Duration, suffix: &str) -> String {
    let secs = duration.as_secs_f64();
    if secs > 10.0 {
        format!("{secs:.0}{suffix}")
    } else if secs > 1.0 {
        format!("{secs:.1}{suffix}")
    } else {
        format!("{secs:.2}{suffix}")
    }
}

fn status_list_lines(header: &str, steps: &[StepResult]) -> Vec<Line> {
    if steps.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::with_capacity(steps.len() + 1);
    lines.push(Line::info(header));
    for step in steps {
        match step.error.as_deref().filter(|detail| !detail.is_empty()) {
            Some(detail) => lines.push(Line::info(format!(
                " * Step: ({}) | error: ({detail})",
                step.step_name
            ))),
            None => lines.push(Line::info(format!(" * Step: ({})", step.step_name))),
        }
    }
    lines
}

fn separator(content: &str) -> String {
    "-".repeat(visible_width(content))
}
