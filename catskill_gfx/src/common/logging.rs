//! Utilities for configuring logging
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::Once;

use colored::*;
use env_logger::Logger;
use log::Level;
use log::Log;
use log::Record;

static ONCE_INIT: Once = Once::new();

static TRACE_CONTEXT_LINES: usize = 20;

/// Logger that uses env_logger for configuring filters and implements a compact colored format.
///
/// Frame-level trace logs are kept in a ring buffer and only printed as context when a record
/// of a higher level is logged, so a failing asset load shows the last few rendered frames.
struct CatskillLogger {
    /// Contains the last `TRACE_CONTEXT_LINES` of trace-level logs.
    trace_logs: Mutex<VecDeque<String>>,
    logger: Logger,
}

impl CatskillLogger {
    pub fn new(logger: Logger) -> Self {
        log::set_max_level(logger.filter());
        Self {
            trace_logs: Mutex::new(VecDeque::new()),
            logger,
        }
    }

    fn format_record(&self, record: &Record) -> String {
        let message = record.args().to_string();
        match record.level() {
            Level::Error => format!("{} {}", "E".red().bold(), message.red()),
            Level::Warn => format!("{} {}", "W".yellow().bold(), message.yellow()),
            Level::Info => format!("{} {}", "I".blue().bold(), message),
            Level::Debug => format!("{} [{}] {}", "D".blue(), short_target(record), message),
            Level::Trace => message.dimmed().to_string(),
        }
    }
}

/// Last path segment of the record target, e.g. `render` for `catskill_gfx::...::ppu::render`.
fn short_target<'a>(record: &'a Record) -> &'a str {
    let target = record.target();
    target.rsplit("::").next().unwrap_or(target)
}

impl Log for CatskillLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.logger.matches(record) {
            return;
        }
        let record_str = self.format_record(record);
        // A poisoned lock only means another thread panicked while logging.
        let mut trace_logs = match self.trace_logs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if record.level() == Level::Trace {
            trace_logs.push_front(record_str);
            trace_logs.truncate(TRACE_CONTEXT_LINES);
        } else {
            if !trace_logs.is_empty() {
                if trace_logs.len() == TRACE_CONTEXT_LINES {
                    println!("{}", "...".dimmed());
                }
                for log in trace_logs.drain(0..).rev() {
                    println!("{}", log);
                }
            }
            println!("{}", record_str);
        }
    }

    fn flush(&self) {}
}

fn install(filter_config: &str) {
    let filter = env_logger::builder().parse_filters(filter_config).build();
    // Another logger may already be installed by the embedding application.
    if log::set_boxed_logger(Box::new(CatskillLogger::new(filter))).is_err() {
        log::warn!("Logger already initialized");
    }
}

pub fn init() {
    ONCE_INIT.call_once(|| {
        let filter_config = std::env::var("CATSKILL_LOG").unwrap_or("error".to_string());
        install(&filter_config);
    });
}

pub fn test_init(verbose: bool) {
    ONCE_INIT.call_once(|| {
        let filter_config = std::env::var("CATSKILL_LOG").unwrap_or(
            if verbose {
                "info,catskill_gfx::components::ppu=trace"
            } else {
                "warn"
            }
            .to_string(),
        );
        install(&filter_config);
    });
}
