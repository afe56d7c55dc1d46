//! Tracing setup.
//!
//! Headless runs log to stderr through the fmt subscriber. The TUI owns the terminal, so
//! there events are flattened into lines and handed to the log panel over a channel.

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_FILTER: &str = "info,stretch_core=info,stretch_cli=info,cue_player=info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log to stderr.
pub(crate) fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Route log lines to the returned receiver instead of the terminal.
pub(crate) fn init_channel() -> Receiver<String> {
    let (tx, rx) = unbounded();
    tracing_subscriber::registry()
        .with(LogLayer::new(tx))
        .with(env_filter())
        .init();
    rx
}

/// Formats each event as a single line and sends it on.
pub(crate) struct LogLayer {
    tx: Sender<String>,
}

impl LogLayer {
    pub(crate) fn new(tx: Sender<String>) -> Self {
        Self { tx }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LogVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        let line = format_line(
            &meta.level().to_string(),
            meta.target(),
            visitor.message.as_deref().unwrap_or("log event"),
            &visitor.fields,
        );
        // Receiver gone means the UI has shut down.
        let _ = self.tx.send(line);
    }
}

fn format_line(level: &str, target: &str, message: &str, fields: &[String]) -> String {
    let mut line = format!("{level:>5} {target}: {message}");
    if !fields.is_empty() {
        line.push(' ');
        line.push_str(&fields.join(" "));
    }
    line
}

#[derive(Default)]
struct LogVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl Visit for LogVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let formatted = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(formatted.trim_matches('"').to_string());
        } else {
            self.fields.push(format!("{}={}", field.name(), formatted));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_line_appends_fields() {
        let line = format_line(
            "INFO",
            "stretch_core::playback",
            "playback started",
            &["position=0".to_string(), "seconds_remaining=60".to_string()],
        );
        assert_eq!(
            line,
            " INFO stretch_core::playback: playback started position=0 seconds_remaining=60"
        );
    }

    #[test]
    fn layer_forwards_events_to_channel() {
        let (tx, rx) = unbounded();
        let subscriber = tracing_subscriber::registry().with(LogLayer::new(tx));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(cue = "countdown", "cue failed");
        });

        let line = rx.try_recv().unwrap();
        assert!(line.starts_with(" WARN"));
        assert!(line.contains("cue failed"));
        assert!(line.contains("cue=countdown"));
    }
}
