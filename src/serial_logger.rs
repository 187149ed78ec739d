use core::fmt::Write as _;
use log::{LevelFilter, Metadata, Record, SetLoggerError};

use crate::console::Console;

/// Level for records coming from the tuner driver.
const DRIVER_LEVEL: LevelFilter = LevelFilter::Debug;
/// Level for everything else, embassy included.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

struct SerialLogger;

impl SerialLogger {
    fn limit(target: &str) -> LevelFilter {
        if target.starts_with("si4703") {
            DRIVER_LEVEL
        } else {
            DEFAULT_LEVEL
        }
    }
}

impl log::Log for SerialLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Self::limit(metadata.target())
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let _ = write!(
                Console,
                "[{:<5} {}] {}\r\n",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

pub fn init() -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(DRIVER_LEVEL.max(DEFAULT_LEVEL)))
}
