use std::path::PathBuf;

use reports::{AggregationEngine, FsResolver, ImportOptions, RecordingSink, ReportDialect};
use test_utils::{inputs::get_test_file_path, inputs::touch_files, mock_logger};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(get_test_file_path(&format!("tests/fixtures/{name}")))
}

// Kept as the only test in this binary, the logger is process-wide.
#[test]
fn batch_diagnostics() {
    let logs = mock_logger(None);

    let root = tempfile::tempdir().unwrap();
    touch_files(
        root.path(),
        &[
            "src/test/java/com/acme/FooTest.java",
            "src/test/java/com/acme/ClockTest.java",
        ],
    );
    let options = ImportOptions::new(ReportDialect::Xunit);
    let resolver = FsResolver::new(root.path());
    let mut sink = RecordingSink::new();
    AggregationEngine::new(&options, &resolver, &mut sink)
        .run(&[
            fixture("xunit/TEST-com.acme.FooTest.xml"),
            fixture("truncated.xml"),
            fixture("xunit/TEST-com.acme.ClockTest.xml"),
            fixture("cpptest/report.xml"),
        ])
        .unwrap();

    let logs = logs.lock().unwrap();
    let with_level = |level: log::Level| {
        logs.iter()
            .filter(move |(l, _)| *l == level)
            .map(|(_, message)| message.clone())
            .collect::<Vec<String>>()
    };

    let warnings = with_level(log::Level::Warn);
    assert_eq!(warnings.len(), 3, "{warnings:?}");
    assert!(warnings[0].starts_with("Skipping report: "));
    assert!(warnings[0].contains("truncated.xml"));
    assert!(warnings[1].starts_with("Ignoring report "));
    assert!(warnings[1].contains("<ResultsSession>"));
    assert_eq!(
        warnings[2],
        "1 test(s) reported a negative duration, their time was left out of the execution time"
    );

    let debug = with_level(log::Level::Debug);
    assert!(debug
        .iter()
        .any(|message| message == "Resource not found for com.acme.Missing"));

    let info = with_level(log::Level::Info);
    assert_eq!(
        info.iter()
            .filter(|message| message.starts_with("Parsing report "))
            .count(),
        4
    );
    // Files are folded in as they are parsed, so a broken file is reported
    // before the next one is read.
    let position = |wanted: &dyn Fn(&str) -> bool| {
        logs.iter()
            .position(|(_, message)| wanted(message.as_str()))
            .unwrap()
    };
    let truncated_parsed =
        position(&|m| m.starts_with("Parsing report ") && m.ends_with("truncated.xml"));
    let truncated_skipped = position(&|m| m.starts_with("Skipping report: "));
    let clock_parsed =
        position(&|m| m.starts_with("Parsing report ") && m.contains("ClockTest"));
    assert!(truncated_parsed < truncated_skipped);
    assert!(truncated_skipped < clock_parsed);

    assert_eq!(
        info.last().map(String::as_str),
        Some("Imported 2 report(s): 6 tests, 2 errors, 1 failures, 1 skipped, 2150 ms")
    );
}
