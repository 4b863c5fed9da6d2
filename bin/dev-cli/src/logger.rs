use std::io;

use hive_plan_executor_config::log::{LogFormat, LoggingConfig};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, time::UtcTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};
use tracing_tree::{time::Uptime, HierarchicalLayer};

type OutputLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logs go to stderr, stdout carries the command output.
pub fn configure_logging(config: &LoggingConfig) {
    tracing_subscriber::registry()
        .with(output_layer(config.format))
        .with(EnvFilter::new(config.filter_directives()))
        .init();
}

fn output_layer(format: LogFormat) -> OutputLayer {
    match format {
        LogFormat::PrettyTree => plan_tree_layer(),
        LogFormat::PrettyCompact => fmt::layer()
            .compact()
            .with_target(false)
            .with_timer(UtcTime::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_timer(UtcTime::rfc_3339())
            .with_span_events(FmtSpan::CLOSE)
            .with_writer(io::stderr)
            .boxed(),
    }
}

/// Node spans nest like the plan, so a run reads as the plan tree with its service calls.
/// Spans that log nothing are not printed.
fn plan_tree_layer() -> OutputLayer {
    HierarchicalLayer::new(2)
        .with_indent_lines(true)
        .with_bracketed_fields(true)
        .with_deferred_spans(true)
        .with_span_retrace(true)
        .with_targets(false)
        .with_timer(Uptime::default())
        .with_writer(io::stderr)
        .boxed()
}
