//! Logging for `cell-config-ctl`.

use log::{LevelFilter, Log, Metadata, Record};

/// The logger sink writing to standard error.
static LOGGER: Logger = Logger;

/// Installs the stderr logger.
///
/// `verbose` raises the level filter from warnings to debug output.
pub fn init_logging(verbose: bool) {
    log::set_logger(&LOGGER).expect("logger installed twice");
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
}

/// A [`Log`] implementation writing records to standard error.
struct Logger;

impl Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        eprintln!("[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}
