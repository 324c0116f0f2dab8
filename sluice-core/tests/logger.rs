#[cfg(test)]
mod tests {
    use log::{Level, LevelFilter, Log, Metadata, Record};
    use sluice_core::{DefaultLogger, Logger, NoopLogger, Value};
    use std::sync::{Mutex, Once};

    static LINES: Mutex<Vec<(String, Level, String)>> = Mutex::new(Vec::new());

    struct Capture;

    impl Log for Capture {
        fn enabled(&self, _metadata: &Metadata) -> bool {
            true
        }
        fn log(&self, record: &Record) {
            LINES.lock().unwrap().push((
                record.target().to_string(),
                record.level(),
                record.args().to_string(),
            ));
        }
        fn flush(&self) {}
    }

    fn capture() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            log::set_logger(&Capture).expect("Could not install the capture logger");
            log::set_max_level(LevelFilter::Trace);
        });
    }

    #[test]
    fn default_logger_writes_queries() {
        capture();
        let logger = DefaultLogger::new(Level::Info);
        logger.log_query(
            "SELECT * FROM users WHERE id = $1 AND name = $2",
            &[Value::Int32(Some(7)), "o'hara".into()],
        );
        NoopLogger.log_query("SELECT 'ignored'", &[]);
        let lines = LINES.lock().unwrap();
        let (target, level, message) = lines
            .iter()
            .find(|(target, ..)| target == DefaultLogger::TARGET)
            .expect("The query was not logged");
        assert_eq!(target, "sluice::query");
        assert_eq!(*level, Level::Info);
        assert_eq!(
            message,
            "Query: SELECT * FROM users WHERE id = $1 AND name = $2 -- params: [7, 'o''hara']"
        );
        assert!(!lines.iter().any(|(.., message)| message.contains("ignored")));
    }
}
