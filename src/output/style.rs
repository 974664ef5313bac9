use regex::Regex;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

static COLORS_ENABLED: AtomicBool = AtomicBool::new(true);

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid regex"));

pub fn configure(no_color: bool) {
    COLORS_ENABLED.store(detect_colors(no_color), Ordering::Relaxed);
}

pub fn colors_enabled() -> bool {
    COLORS_ENABLED.load(Ordering::Relaxed)
}

fn detect_colors(no_color: bool) -> bool {
    let mut enabled = !no_color;

    if std::env::var_os("NO_COLOR").is_some() {
        enabled = false;
    }

    if let Ok(term) = std::env::var("TERM")
        && term.eq_ignore_ascii_case("dumb")
    {
        enabled = false;
    }

    if std::env::var("CLICOLOR_FORCE").ok().as_deref() == Some("1") {
        enabled = true;
    }

    enabled
}

/// Foreground colors used for step outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Green,
    Red,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Green => "32",
            Color::Red => "31",
            Color::Yellow => "33",
            Color::Blue => "34",
        }
    }

    pub fn paint(self, text: &str, enabled: bool) -> String {
        paint(self.code(), text, enabled)
    }
}

fn paint(code: &str, text: &str, enabled: bool) -> String {
    if text.is_empty() || !enabled {
        return text.to_string();
    }

    format!("\x1b[{code}m{text}\x1b[0m")
}

fn style(code: &str, text: &str) -> String {
    paint(code, text, colors_enabled())
}

/// Removes SGR escape sequences.
pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

/// Width in chars, not counting escape sequences.
pub fn visible_width(text: &str) -> usize {
    if !text.contains('\x1b') {
        return text.chars().count();
    }
    strip_ansi(text).chars().count()
}

pub fn bold(text: &str) -> String {
    style("1", text)
}

pub fn accent(text: &str) -> String {
    style("36", text)
}

pub fn success(text: &str) -> String {
    style("32", text)
}

pub fn failure(text: &str) -> String {
    style("31", text)
}

pub fn warning(text: &str) -> String {
    style("33", text)
}

pub fn command(text: &str) -> String {
    style("96", text)
}
