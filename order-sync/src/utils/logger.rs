//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the service crates log at `level`.

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Default filter directive for a given level
pub fn default_filter(level: &str) -> String {
    format!("order_sync={level},tower_http={level}")
}

/// Initialize the logger with optional daily-rolling file output
pub fn init_logger(log_level: Option<&str>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    // Add file output if log_dir is provided
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists()
            && let Some(dir_str) = log_path.to_str()
        {
            let file_appender = tracing_appender::rolling::daily(dir_str, "order-sync");
            subscriber.with_ansi(false).with_writer(file_appender).init();
            return;
        }
    }

    subscriber.init();
}
