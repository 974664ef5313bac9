mod report;
mod sink;
mod style;

pub use report::{
    DEFAULT_MAX_WIDTH, ELLIPSIS, RenderOptions, Renderer, Verdict, format_seconds, truncate_title,
};
pub use sink::{CaptureSink, ConsoleSink, Level, Line, Sink};
pub use style::{
    Color, accent, bold, colors_enabled, command, configure, failure, strip_ansi, success,
    visible_width, warning,
};
