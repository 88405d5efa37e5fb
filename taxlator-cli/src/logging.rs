use std::{
    fs::File,
    io::{self, IsTerminal},
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext,
        format::{FormatEvent, FormatFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

/// Local-time timestamp, padded level, source location, then fields.
struct LocalFmt;

impl<S, N> FormatEvent<S, N> for LocalFmt
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();
        let ansi = writer.has_ansi_escapes();

        if ansi {
            write!(writer, "\x1b[2m")?
        }
        write!(writer, "{} ", Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z"))?;
        if ansi {
            write!(writer, "\x1b[0m")?
        }

        let (pre, post) = if ansi {
            match *meta.level() {
                Level::ERROR => ("\x1b[1;31m", "\x1b[0m"),
                Level::WARN => ("\x1b[1;33m", "\x1b[0m"),
                Level::INFO => ("\x1b[1;32m", "\x1b[0m"),
                Level::DEBUG => ("\x1b[1;34m", "\x1b[0m"),
                Level::TRACE => ("\x1b[1;35m", "\x1b[0m"),
            }
        } else {
            ("", "")
        };
        write!(writer, "{}{:>5}{} ", pre, meta.level(), post)?;

        if ansi {
            write!(writer, "\x1b[36m{}\x1b[0m ", meta.target())?;
        } else {
            write!(writer, "{} ", meta.target())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Picks the filter directive: `--log-level`, then `RUST_LOG`, then the
/// configured level.
fn pick_directive<'a>(
    flag: Option<&'a str>,
    env: Option<&'a str>,
    configured: &'a str,
) -> &'a str {
    flag.or(env.filter(|directive| !directive.trim().is_empty()))
        .unwrap_or(configured)
}

pub fn build_filter(
    configured: &str,
    flag: Option<&str>,
) -> Result<EnvFilter> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = pick_directive(flag, env.as_deref(), configured);
    EnvFilter::try_new(directive).with_context(|| format!("invalid log level '{directive}'"))
}

/// Installs the global subscriber. Call once at startup. `level_flag` is
/// the `--log-level` value, which outranks `RUST_LOG`.
///
/// - Stderr: colored when attached to a terminal, plain when piped, so
///   stdout carries only results.
/// - File: appended to when `config.file` is set. The directory must exist.
pub fn init_logging(
    config: &LoggingConfig,
    level_flag: Option<&str>,
) -> Result<()> {
    let filter = build_filter(&config.level, level_flag)?;

    let file_layer = match &config.file {
        Some(path) => Some(
            tracing_subscriber::fmt::layer()
                .event_format(LocalFmt)
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?)),
        ),
        None => None,
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .event_format(LocalFmt)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")
}

fn open_log_file(path: &Path) -> Result<File> {
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("cannot open log file '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_levels_and_directives_are_accepted() {
        // RUST_LOG may be set in the environment; only the fallback is
        // deterministic, so parse directives directly.
        for level in ["error", "info", "debug", "taxlator_core=trace,warn"] {
            assert!(EnvFilter::try_new(level).is_ok(), "{level}");
        }
    }

    #[test]
    fn log_level_flag_outranks_rust_log() {
        assert_eq!(pick_directive(Some("debug"), Some("warn"), "info"), "debug");
    }

    #[test]
    fn rust_log_outranks_configured_level() {
        assert_eq!(pick_directive(None, Some("taxlator_core=trace"), "info"), "taxlator_core=trace");
        assert_eq!(pick_directive(None, Some("  "), "info"), "info");
        assert_eq!(pick_directive(None, None, "error"), "error");
    }

    #[test]
    fn invalid_flag_is_reported() {
        let err = build_filter("info", Some("taxlator_core=loud")).unwrap_err();

        assert!(err.to_string().contains("taxlator_core=loud"));
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        let err = open_log_file(Path::new("/no/such/dir/taxlator.log")).unwrap_err();

        assert!(err.to_string().contains("/no/such/dir/taxlator.log"));
    }
}
