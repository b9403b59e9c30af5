#![warn(missing_docs)]
#![warn(clippy::std_instead_of_core)]
#![warn(clippy::std_instead_of_alloc)]
#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub use schemanode_testhelpers_macros::test;

use std::sync::LazyLock;
use std::time::Instant;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding the log filter, in `Targets` syntax
/// (e.g. `schemanode_core=trace,schemanode_multihash=debug`).
pub const LOG_ENV: &str = "SCHEMANODE_LOG";

static START_TIME: LazyLock<Instant> = LazyLock::new(Instant::now);

struct Uptime;

impl FormatTime for Uptime {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        let elapsed = START_TIME.elapsed();
        write!(w, "{:4}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
    }
}

fn filter_from(value: Option<&str>) -> Targets {
    value
        .and_then(|s| s.parse::<Targets>().ok())
        .unwrap_or_else(|| Targets::new().with_default(tracing::Level::TRACE))
}

static SUBSCRIBER_INIT: LazyLock<()> = LazyLock::new(|| {
    let _ = *START_TIME;

    #[cfg(miri)]
    let verbosity = color_backtrace::Verbosity::Medium;

    #[cfg(not(miri))]
    let verbosity = color_backtrace::Verbosity::Full;

    color_backtrace::BacktracePrinter::new()
        .verbosity(verbosity)
        .add_frame_filter(Box::new(|frames| {
            frames.retain(|frame| {
                let is_harness = |name: &str| {
                    name.starts_with("test::run_test")
                        || name.starts_with("test::__rust_begin_short_backtrace")
                        || name.starts_with("std::panicking::")
                        || name.starts_with("std::panic::")
                        || name.starts_with("core::panicking::")
                        || name.starts_with("std::sys::")
                        || name.starts_with("core::ops::function::FnOnce::call_once")
                        || name.starts_with("__pthread")
                };
                frame.name.as_deref().is_none_or(|name| !is_harness(name))
            })
        }))
        .install(Box::new(termcolor::StandardStream::stderr(
            termcolor::ColorChoice::AlwaysAnsi,
        )));

    let filter = filter_from(std::env::var(LOG_ENV).ok().as_deref());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(true)
                .with_timer(Uptime)
                .with_target(true)
                .with_level(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .ok();
});

/// Installs the test tracing subscriber and a colored panic printer.
///
/// Safe to call from every test: initialization happens once per process.
/// Output is filtered by [`LOG_ENV`], and defaults to everything at `TRACE`.
pub fn setup() {
    #[allow(clippy::let_unit_value)]
    let _ = *SUBSCRIBER_INIT;
}

/// An error type that panics when it's built (such as when you use `?`
/// to coerce to it), reporting where the conversion happened.
#[derive(Debug)]
pub struct IPanic;

impl<E> From<E> for IPanic
where
    E: core::error::Error + Send + Sync,
{
    #[track_caller]
    fn from(value: E) -> Self {
        panic!("from: {}: {value}", core::panic::Location::caller())
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_from, setup};

    #[test]
    fn bad_filter_falls_back_to_trace() {
        let filter = filter_from(Some("schemanode_core=loudest"));
        assert!(filter.would_enable("anything", &tracing::Level::TRACE));
    }

    #[test]
    fn filter_by_target() {
        let filter = filter_from(Some("schemanode_core=debug"));
        assert!(filter.would_enable("schemanode_core", &tracing::Level::DEBUG));
        assert!(!filter.would_enable("schemanode_core", &tracing::Level::TRACE));
        assert!(!filter.would_enable("other", &tracing::Level::ERROR));
    }

    #[test]
    fn setup_is_idempotent() {
        setup();
        setup();
    }
}
