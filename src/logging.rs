/*
================================================================================
                         doclayout-dataset logging
================================================================================

Two pieces, both installed once from `main`:

## Console + buffer logger

`setup_logger()` installs a `CompositeLogger`:
- an `env_logger` console logger on stderr (stdout stays free for JSONL
  output). `RUST_LOG` wins when set; otherwise this crate logs at DEBUG in
  debug builds and WARN in release builds, other crates are silenced.
- a `BufferLogger` that keeps the last 1000 lines from this crate in memory,
  at DEBUG and above regardless of the console filter.

The library never touches the logger; it only uses the `log` macros.

## Panic hook and log export

`setup_panic_hook()` writes `panic.log` (message, location, backtrace and the
buffered lines) to the log directory and echoes it on stderr.
`export_debug_logs()` dumps the buffer to `debug.log` on request
(`--export-logs`).

Log directory: `<data_dir>/doclayout-dataset/logs`, from the `dirs` crate.

================================================================================
*/

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use chrono::Utc;
use env_logger::fmt::{Color, Formatter};
use log::{Level, LevelFilter, Log, Metadata, Record};

#[allow(unused_imports)]
use log::{debug, error, info, warn};

const MAX_LOG_LINES: usize = 1000;
const LOG_TARGET: &str = "doclayout_dataset";

pub type LogBuffer = Arc<Mutex<VecDeque<String>>>;

struct BufferLogger {
    log_buffer: LogBuffer,
}

impl BufferLogger {
    fn new() -> Self {
        Self {
            log_buffer: Arc::new(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES))),
        }
    }

    fn log_to_buffer(&self, message: &str, target: &str, line: Option<u32>) {
        let Ok(mut buffer) = self.log_buffer.lock() else {
            return;
        };
        if buffer.len() == MAX_LOG_LINES {
            buffer.pop_front();
        }

        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");
        let formatted_message = if let Some(line_num) = line {
            format!("{timestamp} {target}:{line_num} {message}")
        } else {
            format!("{timestamp} {target} {message}")
        };

        buffer.push_back(formatted_message);
    }

    fn get_shared_buffer(&self) -> LogBuffer {
        Arc::clone(&self.log_buffer)
    }
}

impl log::Log for BufferLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.target().starts_with(LOG_TARGET) && metadata.level() <= LevelFilter::Debug
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let message = format!("{:<5} {}", record.level(), record.args());
            self.log_to_buffer(&message, record.target(), record.line());
        }
    }

    fn flush(&self) {}
}

struct CompositeLogger {
    console_logger: env_logger::Logger,
    buffer_logger: BufferLogger,
}

impl log::Log for CompositeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console_logger.enabled(metadata) || self.buffer_logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if self.console_logger.enabled(record.metadata()) {
            self.console_logger.log(record);
        }
        if self.buffer_logger.enabled(record.metadata()) {
            self.buffer_logger.log(record);
        }
    }

    fn flush(&self) {
        self.console_logger.flush();
        self.buffer_logger.flush();
    }
}

fn console_builder() -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    // Filter out all other crates' logs
    builder.filter(None, LevelFilter::Off);

    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_env("RUST_LOG");
    } else if cfg!(debug_assertions) {
        builder.filter(Some(LOG_TARGET), LevelFilter::Debug);
    } else {
        builder.filter(Some(LOG_TARGET), LevelFilter::Warn);
    }

    builder.format(|buf: &mut Formatter, record: &Record| {
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        let module_info = match (record.module_path(), record.line()) {
            (Some(module), Some(line)) => format!("{module}:{line}"),
            (Some(module), None) => module.to_string(),
            (None, Some(line)) => format!("line:{line}"),
            (None, None) => "unknown".to_string(),
        };

        let mut level_style = buf.style();
        let mut meta_style = buf.style();

        match record.level() {
            Level::Error => level_style.set_color(Color::Red).set_bold(true),
            Level::Warn => level_style.set_color(Color::Yellow).set_bold(true),
            Level::Info => level_style.set_color(Color::Green).set_bold(true),
            Level::Debug => level_style.set_color(Color::Blue).set_bold(true),
            Level::Trace => level_style.set_color(Color::White),
        };

        #[cfg(target_os = "macos")]
        {
            // Color::Rgb does not work on macOS terminals
            meta_style.set_color(Color::Blue);
        }

        #[cfg(not(target_os = "macos"))]
        {
            meta_style.set_color(Color::Rgb(120, 120, 120));
        }

        writeln!(
            buf,
            "{} {} {} {}",
            meta_style.value(timestamp),
            level_style.value(record.level()),
            meta_style.value(module_info),
            record.args()
        )
    });

    builder
}

/// Install the global logger and return the shared line buffer.
/// Call once, before anything logs.
pub fn setup_logger() -> LogBuffer {
    let buffer_logger = BufferLogger::new();
    let shared_buffer = buffer_logger.get_shared_buffer();

    let composite_logger = CompositeLogger {
        console_logger: console_builder().build(),
        buffer_logger,
    };

    if log::set_boxed_logger(Box::new(composite_logger)).is_ok() {
        // Filtering happens in the loggers themselves
        log::set_max_level(LevelFilter::Trace);
    } else {
        eprintln!("A logger was already installed, keeping it");
    }

    shared_buffer
}

pub fn get_log_directory(app_name: &str) -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join(app_name).join("logs")
}

/// Write the buffered log lines to `debug.log` in the log directory and
/// return its path.
pub fn export_debug_logs(app_name: &str, log_buffer: &LogBuffer) -> Result<PathBuf, std::io::Error> {
    let log_dir_path = get_log_directory(app_name);
    std::fs::create_dir_all(&log_dir_path)?;
    let debug_log_path = log_dir_path.join("debug.log");

    // Copy out first: logging below would need the same lock
    let log_entries: Vec<String> = match log_buffer.lock() {
        Ok(buffer) => buffer.iter().cloned().collect(),
        Err(poisoned) => poisoned.into_inner().iter().cloned().collect(),
    };

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&debug_log_path)?;

    let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");
    writeln!(file, "{timestamp} [DEBUG EXPORT] {app_name} debug log export")?;
    writeln!(file, "{timestamp} [DEBUG EXPORT] {} entries (last {MAX_LOG_LINES} max)", log_entries.len())?;
    writeln!(file)?;
    for entry in &log_entries {
        writeln!(file, "{entry}")?;
    }
    file.flush()?;

    info!("Debug logs exported to: {}", debug_log_path.display());
    Ok(debug_log_path)
}

/// Write panics to `panic.log` with a backtrace and the buffered log lines.
pub fn setup_panic_hook(app_name: &str, log_buffer: LogBuffer) {
    let log_dir = get_log_directory(app_name);

    panic::set_hook(Box::new(move |info| {
        let backtrace = backtrace::Backtrace::new();
        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ");

        let location = if let Some(location) = info.location() {
            format!("{}:{}", location.file(), location.line())
        } else {
            "unknown location".to_string()
        };

        let header_msg = format!("[PANIC] at {location} - {info}");
        let backtrace_lines: Vec<String> = format!("{backtrace:?}")
            .lines()
            .map(|line| format!("[BACKTRACE] {}", line.trim()))
            .collect();

        eprintln!("\n\n{header_msg}");
        eprintln!("[PANIC] Backtrace:");
        for line in &backtrace_lines {
            eprintln!("{line}");
        }

        let log_file_path = log_dir.join("panic.log");
        let written = std::fs::create_dir_all(&log_dir).and_then(|_| {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&log_file_path)?;

            writeln!(file, "{timestamp} {header_msg}")?;
            writeln!(file, "{timestamp} [PANIC] Backtrace:")?;
            for line in &backtrace_lines {
                writeln!(file, "{timestamp} {line}")?;
            }
            writeln!(file)?;
            writeln!(file, "{timestamp} [PANIC] Last {MAX_LOG_LINES} log entries:")?;

            // The panicking thread may hold the buffer lock
            if let Ok(buffer) = log_buffer.try_lock() {
                for log in buffer.iter() {
                    writeln!(file, "{log}")?;
                }
            }
            Ok(())
        });

        match written {
            Ok(()) => eprintln!("\nA complete crash log has been written to: {}", log_file_path.display()),
            Err(e) => eprintln!("\nFailed to write crash log to {}: {}", log_file_path.display(), e),
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_logger_keeps_last_lines() {
        let logger = BufferLogger::new();
        let buffer = logger.get_shared_buffer();

        for i in 0..(MAX_LOG_LINES + 5) {
            logger.log(
                &Record::builder()
                    .args(format_args!("line {}", i))
                    .level(Level::Info)
                    .target("doclayout_dataset::dataset")
                    .line(Some(7))
                    .build(),
            );
        }
        logger.log(
            &Record::builder()
                .args(format_args!("from another crate"))
                .level(Level::Error)
                .target("image::codecs")
                .build(),
        );

        let buffer = buffer.lock().unwrap();
        assert_eq!(buffer.len(), MAX_LOG_LINES);
        assert!(buffer.front().unwrap().ends_with("doclayout_dataset::dataset:7 INFO  line 5"));
        assert!(buffer.back().unwrap().ends_with("line 1004"));
    }

    #[test]
    fn test_buffer_logger_ignores_trace() {
        let logger = BufferLogger::new();
        let metadata = Metadata::builder()
            .level(Level::Trace)
            .target("doclayout_dataset")
            .build();
        assert!(!logger.enabled(&metadata));
    }
}
