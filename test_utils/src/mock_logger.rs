use std::sync::{Arc, Mutex, Once};

use lazy_static::lazy_static;

pub type LogRecords = Arc<Mutex<Vec<(log::Level, String)>>>;

#[derive(Debug, Clone, Default)]
struct MockLogger {
    pub logs: LogRecords,
}

impl log::Log for MockLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }
    fn flush(&self) {}
    fn log(&self, record: &log::Record) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.push((record.level(), record.args().to_string()));
        }
    }
}

/// Installs a process-wide logger that records every message, and returns
/// the shared records. Calling it again returns the same, cleared, records.
/// Tests sharing a binary should not log concurrently while asserting on it.
pub fn mock_logger(max_level: Option<log::LevelFilter>) -> LogRecords {
    lazy_static! {
        static ref MOCK_LOGGER: MockLogger = MockLogger::default();
    }
    static INSTALL: Once = Once::new();

    INSTALL.call_once(|| {
        log::set_logger(&*MOCK_LOGGER as &'static MockLogger).unwrap();
    });
    log::set_max_level(max_level.unwrap_or(log::LevelFilter::Debug));

    MOCK_LOGGER.logs.lock().unwrap().clear();
    MOCK_LOGGER.logs.clone()
}

#[cfg(test)]
mod tests {
    use super::mock_logger;

    #[test]
    fn captures_logs() {
        let logs = mock_logger(None);
        const TEST_MESSAGE: &str = "test";
        log::error!("{}", TEST_MESSAGE);
        assert_eq!(
            *logs.lock().unwrap(),
            [(log::Level::Error, String::from(TEST_MESSAGE))]
        );

        let logs = mock_logger(Some(log::LevelFilter::Warn));
        log::info!("hidden");
        assert!(logs.lock().unwrap().is_empty());
    }
}
