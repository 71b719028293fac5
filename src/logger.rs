use chrono::Local;
use fern::Dispatch;
use log::LevelFilter;
use std::fs;
use std::path::PathBuf;

const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "igor.log";

/// Where and how verbosely the scheduler logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub log_dir: PathBuf,
    pub log_file: String,
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { log_dir: PathBuf::from(DEFAULT_LOG_DIR), log_file: DEFAULT_LOG_FILE.to_string(), level: LevelFilter::Info }
    }
}

/// Resolves the effective level: `RUST_LOG` wins over the configured level.
fn effective_level(config: &LogConfig) -> LevelFilter {
    match std::env::var("RUST_LOG") {
        Ok(value) => value.parse::<LevelFilter>().unwrap_or(config.level),
        Err(_) => config.level,
    }
}

/// Initializes the global logger.
///
/// This function should be called once at the very beginning of the binary's `main` function.
///
/// Log level is controlled by the `RUST_LOG` environment variable (`RUST_LOG=debug igor show`),
/// falling back to the configured level. Logs go to stderr and to `<log_dir>/<log_file>`.
/// If the log file cannot be opened, logging continues on the console only.
pub fn init(config: &LogConfig) {
    let log_level_filter = effective_level(config);

    let base_config = Dispatch::new().level(log_level_filter).level_for("serde", LevelFilter::Warn).level_for("tokio", LevelFilter::Warn);

    let console_config = Dispatch::new()
        .format(|out, message, record| {
            let colors = fern::colors::ColoredLevelConfig::new()
                .error(fern::colors::Color::Red)
                .warn(fern::colors::Color::Yellow)
                .info(fern::colors::Color::Green)
                .debug(fern::colors::Color::Blue)
                .trace(fern::colors::Color::BrightBlack);

            out.finish(format_args!(
                "[{} {} {}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut dispatch = base_config.chain(console_config);

    let log_file_path = config.log_dir.join(&config.log_file);
    let file_sink = fs::create_dir_all(&config.log_dir).and_then(|_| fern::log_file(&log_file_path));

    match file_sink {
        Ok(file) => {
            let file_config = Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("[{} {} {}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), record.level(), record.target(), message))
                })
                .chain(file);

            dispatch = dispatch.chain(file_config);
        }
        Err(e) => {
            eprintln!("Failed to open log file '{}': {}. Logging to console only.", log_file_path.display(), e);
        }
    }

    if let Err(e) = dispatch.apply() {
        eprintln!("Failed to apply logger configuration: {}", e);
        return;
    }

    log::debug!("Logger initialized at level {}. Logging to console and '{}'.", log_level_filter, log_file_path.display());
}
