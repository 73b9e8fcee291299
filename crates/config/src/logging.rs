use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::Config;

/// Initializes the global `tracing` subscriber: a stdout layer at
/// `config.log_level`, and, when `log_error_file` is set, an additional
/// non-blocking file layer restricted to `WARN` and above. Returns the
/// file appender's guard, which must be held for the lifetime of the
/// process or buffered log lines are dropped on exit.
pub fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let stdout_filter = EnvFilter::try_new(config.log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_target(false).with_filter(stdout_filter);

    match &config.log_error_file {
        Some(path) => {
            let file_appender = tracing_appender::rolling::never(
                std::path::Path::new(path).parent().unwrap_or_else(|| std::path::Path::new(".")),
                std::path::Path::new(path).file_name().unwrap_or_default(),
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false).with_filter(LevelFilter::WARN);

            tracing_subscriber::registry().with(stdout_layer).with(file_layer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stdout_layer).init();
            None
        }
    }
}
