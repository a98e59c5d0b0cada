use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Targets of the workspace crates; `level_directives` raises these only.
pub const APP_TARGETS: [&str; 4] = ["faq_chat_backend", "api", "faq_assistant", "ai_llm_service"];

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // Keep timestamps compact: no fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Build the formatting layer used by the server binary.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format
/// - `file:line` and target (module path)
/// - Span close events (duration of instrumented handlers and generation)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    layer_with_writer(io::stdout, io::stdout().is_terminal())
}

/// Same layer as [`layer`], writing to `make_writer`.
///
/// Timer, target and source location live on the event format; setting them
/// on the outer layer would be discarded by `event_format`.
pub fn layer_with_writer<S, W>(make_writer: W, ansi: bool) -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let format = fmt::format()
        .compact()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_source_location(true);

    fmt::layer()
        .with_writer(make_writer)
        .with_ansi(ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(format)
}

/// Level directives for the workspace crates, e.g. `api=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let level = level.as_str().to_lowercase();
    APP_TARGETS
        .iter()
        .filter_map(|target| Directive::from_str(&format!("{target}={level}")).ok())
        .collect()
}

/// Create an `EnvFilter` from `RUST_LOG` or `default`.
///
/// When `RUST_LOG` is unset, the workspace crates additionally log at
/// `level` while dependencies stay at `default`.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_directives(level)
            .into_iter()
            .fold(EnvFilter::new(default), EnvFilter::add_directive),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    /// In-memory sink for formatted log lines.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn events_use_second_precision_utc_timestamps() {
        let capture = Capture::default();
        let sink = capture.clone();
        let subscriber =
            tracing_subscriber::registry().with(layer_with_writer(move || sink.clone(), false));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(answer = 42, "model ready");
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        let line = output.lines().next().unwrap();
        let stamp = line.split_whitespace().next().unwrap();

        assert!(stamp.ends_with('Z'), "{line}");
        assert!(!stamp.contains('.'), "{line}");
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok(), "{line}");
        assert!(line.contains("INFO"), "{line}");
        assert!(line.contains("telemetry.rs"), "{line}");
        assert!(line.contains("model ready"), "{line}");
    }

    #[test]
    fn directives_cover_every_workspace_crate() {
        let directives = level_directives(Level::DEBUG);
        assert_eq!(directives.len(), APP_TARGETS.len());
        let rendered: Vec<String> = directives.iter().map(ToString::to_string).collect();
        assert!(rendered.iter().any(|d| d.starts_with("faq_assistant=")));
        assert!(
            rendered
                .iter()
                .all(|d| d.to_lowercase().ends_with("=debug"))
        );
    }
}
