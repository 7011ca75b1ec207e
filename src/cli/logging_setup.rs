// Logging configuration setup.
use crate::config::LogConfig;

pub fn setup_logging(config: &LogConfig) {
    let builder = tracing_subscriber::fmt()
        .with_max_level(config.level)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file_location)
        .with_line_number(config.show_file_location);

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// CLI flags override the ambient `LogConfig` the same way they override `NodeConfig`.
pub fn log_config_for_flags(verbose: bool, debug: bool) -> LogConfig {
    if debug {
        LogConfig::verbose()
    } else if verbose {
        LogConfig {
            level: tracing::Level::INFO,
            ..LogConfig::default()
        }
    } else {
        LogConfig::default()
    }
}
