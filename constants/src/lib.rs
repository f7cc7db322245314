pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Filter for the binary's logger, in `env_logger` syntax.
pub const LOG_FILTER_ENV: &str = "REPORT_IMPORTER_LOG";
pub const REPORT_PATHS_ENV: &str = "REPORT_IMPORTER_REPORT_PATHS";
pub const PROJECT_ROOT_ENV: &str = "REPORT_IMPORTER_PROJECT_ROOT";

/// Separates an enclosing class from a nested one in a logical key, e.g. `Foo$Bar`.
pub const INNER_CLASS_SEPARATOR: char = '$';

/// Message and stack trace text captured from a report is truncated to this many bytes.
pub const MAX_TEXT_FIELD_SIZE: usize = 8_000;
