//! A minimal `log::Log` implementation. bmt has no need for a full logging
//! framework — everything here is meant to be replaced by `env_logger` or
//! similar if the CLI ever grows that dependency; for now, stderr and a
//! level filter are all it needs.

use log::{Level, Log, Metadata, Record};

struct Logger;

static LOGGER: Logger = Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Error => eprintln!("bmt: error: {}", record.args()),
            Level::Warn => eprintln!("bmt: warning: {}", record.args()),
            _ => eprintln!("bmt: {}: {}", record.level().to_string().to_lowercase(), record.args()),
        }
    }

    fn flush(&self) {}
}

/// Installs the global logger and sets the max level from `-v`/`--verbose`
/// counts: 0 -> warn, 1 -> info, 2+ -> debug.
pub fn init(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    log::set_max_level(level);
    let _ = log::set_logger(&LOGGER);
}
