//! Logging pipeline.
//!
//! A peripheral collaborator from the runtime's point of view: the core
//! only needs a place to send [`LogMessage`] records. Formatting and
//! subscriber wiring build on a `tracing`/`tracing-subscriber` setup,
//! trimmed of SPDK-specific bridging.
use std::fmt::Write as _;

use ansi_term::{Colour, Style};
use serde::{Deserialize, Serialize};
use tracing_core::Level;
use tracing_subscriber::{
    fmt::{format::FmtSpan, FormatEvent, FormatFields},
    EnvFilter,
};

use crate::reaction::ReactionStatistics;

/// A single log record produced by [`crate::powerplant::PowerPlant::log`].
/// Always delivered under `Inline` scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: LogLevel,
    pub display_level: String,
    pub text: String,
    pub reactor_name: String,
    pub statistics: Option<ReactionStatistics>,
}

/// Log level, ordered the same way `tracing::Level` orders (Trace lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn short(self) -> &'static str {
        match self {
            LogLevel::Trace => "T",
            LogLevel::Debug => "D",
            LogLevel::Info => "I",
            LogLevel::Warn => "W",
            LogLevel::Error => "E",
        }
    }

    fn colour(self, ansi: bool, text: &str) -> String {
        if !ansi {
            return text.to_string();
        }
        match self {
            LogLevel::Trace => Colour::Cyan.dimmed().paint(text).to_string(),
            LogLevel::Debug => Colour::White.dimmed().paint(text).to_string(),
            LogLevel::Info => Style::new().bold().paint(text).to_string(),
            LogLevel::Warn => Colour::Yellow.paint(text).to_string(),
            LogLevel::Error => Colour::Red.bold().paint(text).to_string(),
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::TRACE => LogLevel::Trace,
            Level::DEBUG => LogLevel::Debug,
            Level::INFO => LogLevel::Info,
            Level::WARN => LogLevel::Warn,
            Level::ERROR => LogLevel::Error,
        }
    }
}

/// Compact single-line formatter: `LEVEL reactor_name: text`.
struct CompactFormatter {
    ansi: bool,
}

impl<S, N> FormatEvent<S, N> for CompactFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing_core::Event<'_>,
    ) -> std::fmt::Result {
        let level: LogLevel = (*event.metadata().level()).into();
        let mut fields = String::new();
        ctx.field_format().format_fields(
            tracing_subscriber::fmt::format::Writer::new(&mut fields),
            event,
        )?;
        let line = format!("{} {}: {}", level.short(), event.metadata().target(), fields);
        write!(writer, "{}", level.colour(self.ansi, &line))?;
        writeln!(writer)
    }
}

/// Initialise the global `tracing` subscriber. Idempotent: subsequent calls
/// are no-ops (matches `tracing_subscriber::fmt().try_init()` semantics).
pub fn init(ansi: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::NONE)
        .event_format(CompactFormatter { ansi })
        .try_init();
}

/// Render a [`LogMessage`] for display independent of the `tracing`
/// subscriber, used by consumers that subscribe to `LogMessage` directly.
pub fn render(msg: &LogMessage, ansi: bool) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {}: {}", msg.display_level, msg.reactor_name, msg.text);
    if ansi {
        msg.level.colour(true, &out)
    } else {
        out
    }
}
