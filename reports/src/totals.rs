use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};

use crate::{
    class_report::TestCounts,
    dialect::ReportDialect,
    duration,
    error::{ReportParseError, ReportParseIssue},
    xml::{parse_attr, tag_name, DocumentReader},
};

const TAG_EXECUTED_TESTS_DETAILS: &[u8] = b"ExecutedTestsDetails";
const TAG_TOTAL: &[u8] = b"Total";

/// Project-wide test totals reported by dotTest / C++test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionTotals {
    pub tests: u64,
    pub failures: u64,
    pub errors: u64,
    pub duration_millis: u64,
}

impl From<ExecutionTotals> for TestCounts {
    fn from(totals: ExecutionTotals) -> Self {
        TestCounts {
            tests: totals.tests,
            failures: totals.failures,
            errors: totals.errors,
            skipped: 0,
            duration_millis: totals.duration_millis,
            negative_duration_count: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionTotalsParser {
    totals: Option<ExecutionTotals>,
    issues: Vec<ReportParseIssue>,
    details_depth: Option<usize>,
}

impl ExecutionTotalsParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn totals(&self) -> Option<&ExecutionTotals> {
        self.totals.as_ref()
    }

    pub fn issues(&self) -> &[ReportParseIssue] {
        &self.issues
    }

    pub fn into_parts(self) -> (Option<ExecutionTotals>, Vec<ReportParseIssue>) {
        (self.totals, self.issues)
    }

    /// Keeps the first `Total` found under an `ExecutedTestsDetails` element.
    pub fn parse<R: BufRead>(&mut self, path: &str, xml: R) -> Result<(), ReportParseError> {
        let mut reader = DocumentReader::new(path, xml);
        while let Some((event, depth)) = reader.next_event()? {
            let handled = match event {
                Event::Start(e) => self.open_element(&e, depth),
                Event::Empty(e) => self.open_element(&e, depth).map(|keep_going| {
                    if keep_going {
                        self.close_element(e.local_name().as_ref(), depth);
                    }
                    keep_going
                }),
                Event::End(e) => {
                    self.close_element(e.local_name().as_ref(), depth);
                    Ok(true)
                }
                _ => Ok(true),
            };
            if !handled.map_err(|source| reader.encoding_error(source))? {
                return Ok(());
            }
        }

        if self.totals.is_none() {
            self.issues.push(ReportParseIssue::TotalsNotFound);
        }
        Ok(())
    }

    fn open_element(&mut self, e: &BytesStart, depth: usize) -> quick_xml::Result<bool> {
        let local_name = e.local_name();
        let tag = local_name.as_ref();
        if depth == 1 {
            let root = tag_name(tag)?;
            if !ReportDialect::ExecutionTotals.accepts_root(&root) {
                self.issues.push(ReportParseIssue::UnexpectedRoot(root));
                return Ok(false);
            }
        }

        match tag {
            TAG_EXECUTED_TESTS_DETAILS if self.details_depth.is_none() => {
                self.details_depth = Some(depth);
            }
            TAG_TOTAL if self.details_depth.is_some() && self.totals.is_none() => {
                self.totals = Some(ExecutionTotals {
                    tests: parse_attr::number(e, "total")?.unwrap_or(0),
                    failures: parse_attr::number(e, "fail")?.unwrap_or(0),
                    errors: parse_attr::number(e, "err")?.unwrap_or(0),
                    duration_millis: u64::try_from(duration::parse_any(
                        parse_attr::string(e, "time")?.as_deref(),
                    ))
                    .unwrap_or(0),
                });
            }
            _ => (),
        }
        Ok(true)
    }

    fn close_element(&mut self, tag: &[u8], depth: usize) {
        if tag == TAG_EXECUTED_TESTS_DETAILS && self.details_depth == Some(depth) {
            self.details_depth = None;
        }
    }
}
