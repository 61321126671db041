use log::LevelFilter;
use std::io::Write;

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the application (default: INFO)
    pub level: LevelFilter,
    /// Whether to colorize logs when output is a terminal (default: true)
    pub colorize: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            colorize: true,
        }
    }
}

impl LoggingConfig {
    pub fn from_level_name(level: Option<&str>) -> Self {
        let level = match level.map(|l| l.to_ascii_lowercase()) {
            Some(l) if l == "trace" => LevelFilter::Trace,
            Some(l) if l == "debug" => LevelFilter::Debug,
            Some(l) if l == "warn" => LevelFilter::Warn,
            Some(l) if l == "error" => LevelFilter::Error,
            _ => LevelFilter::Info,
        };
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Initialize the logging system. `RUST_LOG` overrides the configured level.
///
/// Repeated initialization is ignored so tests can call this freely.
pub fn init_logging(config: LoggingConfig) {
    let write_style = if config.colorize {
        env_logger::WriteStyle::Auto
    } else {
        env_logger::WriteStyle::Never
    };

    let _ = env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, config.level)
        .write_style(write_style)
        .parse_default_env()
        .try_init();
}
