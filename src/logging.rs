use std::io;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const STDOUT_FILTER: &str = "info,web_request=info,llm_request=info,analysis=info,hyper=warn";
const FILE_FILTER: &str = "info,web_request=debug,llm_request=debug,analysis=debug,hyper=warn";

/// Installs the process-wide subscriber: stdout plus a daily rolling file.
///
/// `RUST_LOG` overrides the stdout filter. The returned guard must be held for
/// the life of the process so buffered file output is flushed.
pub fn configure_logging(log_dir: &Path) -> WorkerGuard {
    // reqwest/hyper connection pool chatter is never useful at WARN
    let custom_filter = FilterFn::new(|metadata| {
        !(metadata.level() == &Level::WARN && metadata.target().starts_with("hyper_util"))
    });

    let stdout_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(STDOUT_FILTER));
    let stdout_log = fmt::layer()
        .with_writer(io::stdout)
        .with_filter(stdout_filter)
        .with_filter(custom_filter);

    let file_appender = rolling::daily(log_dir, "appstore-insights.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_log = fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::Registry::default()
        .with(stdout_log)
        .with(file_log)
        .init();

    guard
}
