// file: src/utils/logging.rs
// description: tracing subscriber setup and colored console message helpers
// reference: https://docs.rs/tracing-subscriber

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Dependencies that are chatty at debug level.
const QUIET_TARGETS: [&str; 4] = ["sqlx=warn", "hyper=info", "h2=info", "tower_http=info"];

pub fn default_filter(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_TARGETS.iter().map(|target| target.to_string()));
    directives.join(",")
}

pub fn init_logger(colored_output: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .with_ansi(colored_output);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

pub fn format_step(step: usize, total: usize, msg: &str) -> String {
    format!("{} {}", format!("[{}/{}]", step, total).cyan().bold(), msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_levels() {
        assert!(default_filter(true).starts_with("debug,"));
        assert!(default_filter(false).starts_with("info,"));
        assert!(default_filter(false).contains("sqlx=warn"));
    }

    #[test]
    fn test_format_helpers_keep_message() {
        colored::control::set_override(false);
        assert_eq!(format_step(2, 5, "Cloning"), "[2/5] Cloning");
        assert!(format_error("boom").ends_with("boom"));
    }
}
