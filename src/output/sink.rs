use crate::output::style::{bold, failure, warning};
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
    /// Written like any other line; the caller decides whether to exit.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub level: Level,
    pub text: String,
}

impl Line {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }

    pub fn fatal(text: impl Into<String>) -> Self {
        Self {
            level: Level::Fatal,
            text: text.into(),
        }
    }

    pub fn blank() -> Self {
        Self::info(String::new())
    }
}

/// Destination for rendered report lines.
///
/// One `emit` call carries every line of a single render call; implementations
/// must write them contiguously.
pub trait Sink {
    fn emit(&self, lines: &[Line]) -> io::Result<()>;
}

impl<T: Sink + ?Sized> Sink for &T {
    fn emit(&self, lines: &[Line]) -> io::Result<()> {
        (**self).emit(lines)
    }
}

/// Writes lines to the terminal or any writer, tagging non-info levels.
///
/// Every `stdout()` sink takes the process-wide stdout lock for a whole emit,
/// so separate instances never interleave their lines.
pub struct ConsoleSink {
    target: Target,
}

enum Target {
    Stdout,
    Writer(Mutex<Box<dyn Write + Send>>),
}

impl ConsoleSink {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            target: Target::Writer(Mutex::new(Box::new(out))),
        }
    }

    pub fn stdout() -> Self {
        Self {
            target: Target::Stdout,
        }
    }
}

impl Sink for ConsoleSink {
    fn emit(&self, lines: &[Line]) -> io::Result<()> {
        match &self.target {
            Target::Stdout => write_lines(&mut io::stdout().lock(), lines),
            Target::Writer(out) => write_lines(&mut *lock(out), lines),
        }
    }
}

fn write_lines(out: &mut impl Write, lines: &[Line]) -> io::Result<()> {
    for line in lines {
        match line.level {
            Level::Info => writeln!(out, "{}", line.text)?,
            Level::Warn => writeln!(out, "{} {}", warning("warn"), line.text)?,
            Level::Error => writeln!(out, "{} {}", failure("error"), line.text)?,
            Level::Fatal => writeln!(out, "{} {}", bold(&failure("fatal")), line.text)?,
        }
    }

    out.flush()
}

/// Keeps every emitted line in memory.
#[derive(Debug, Default)]
pub struct CaptureSink {
    lines: Mutex<Vec<Line>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<Line> {
        lock(&self.lines).clone()
    }

    pub fn texts(&self) -> Vec<String> {
        lock(&self.lines)
            .iter()
            .map(|line| line.text.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.lines).clear();
    }
}

impl Sink for CaptureSink {
    fn emit(&self, lines: &[Line]) -> io::Result<()> {
        lock(&self.lines).extend_from_slice(lines);
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
