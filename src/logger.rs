use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{LevelFilter, Log, Metadata, Record};

const LEVEL_ENV: &str = "CARSEED_LOG";

/// Appends one line per record to a log file.
struct FileLogger {
    file: Mutex<File>,
    level: LevelFilter,
}

fn level_from(value: &str) -> LevelFilter {
    match value.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" | "warning" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn level_from_env() -> LevelFilter {
    level_from(&std::env::var(LEVEL_ENV).unwrap_or_default())
}

fn now_ts() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    format!("{}.{:03}", now.as_secs(), now.subsec_millis())
}

impl Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(
                f,
                "{} [{}] {}: {}",
                now_ts(),
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        if let Ok(mut f) = self.file.lock() {
            let _ = f.flush();
        }
    }
}

/// Install the file logger as the `log` backend. Level comes from `CARSEED_LOG`.
pub fn init(log_path: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
    let path = log_path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let level = level_from_env();
    log::set_boxed_logger(Box::new(FileLogger {
        file: Mutex::new(file),
        level,
    }))
    .map_err(|e| anyhow::anyhow!("logger already installed: {e}"))?;
    log::set_max_level(level);
    log::info!("logging initialized: {}", path.display());
    Ok(path.to_path_buf())
}
