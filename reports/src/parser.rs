use std::io::BufRead;

use constants::MAX_TEXT_FIELD_SIZE;
use quick_xml::events::{BytesStart, BytesText, Event};

use crate::{
    dialect::ReportDialect,
    duration,
    error::{ReportParseError, ReportParseIssue},
    index::ReportIndex,
    result::{FailureDetails, TestResult, TestStatus},
    string_safety::{non_empty_trimmed, safe_truncate_str},
    xml::{parse_attr, tag_name, DocumentReader},
};

const TAG_TEST_SUITE: &[u8] = b"testsuite";
const TAG_TEST_CASE: &[u8] = b"testcase";
const TAG_TEST_CASE_STATUS_FAILURE: &[u8] = b"failure";
const TAG_TEST_CASE_STATUS_ERROR: &[u8] = b"error";
const TAG_TEST_CASE_STATUS_SKIPPED: &[u8] = b"skipped";

mod attrs {
    pub const NAME: &str = "name";
    pub const CLASSNAME: &str = "classname";
    pub const FILE: &str = "file";
    pub const TIME: &str = "time";
    pub const MESSAGE: &str = "message";
}

#[derive(Debug, Clone)]
enum MarkedStatus {
    Failure(Option<String>),
    Error(Option<String>),
    Skipped,
}

#[derive(Debug, Clone)]
struct OpenTestCase {
    depth: usize,
    name: Option<String>,
    classname: Option<String>,
    file: Option<String>,
    duration_millis: i64,
    status: Option<MarkedStatus>,
    status_depth: Option<usize>,
    status_text: String,
}

/// Streams `<testsuite>`/`<testcase>` reports (xUnit and SOAtest) into a [`ReportIndex`].
#[derive(Debug, Clone)]
pub struct TestReportParser {
    dialect: ReportDialect,
    index: ReportIndex,
    issues: Vec<ReportParseIssue>,
    suite_names: Vec<String>,
    current_test_case: Option<OpenTestCase>,
}

impl TestReportParser {
    pub fn new(dialect: ReportDialect) -> Self {
        Self {
            dialect,
            index: ReportIndex::new(),
            issues: Vec::new(),
            suite_names: Vec::new(),
            current_test_case: None,
        }
    }

    pub fn issues(&self) -> &[ReportParseIssue] {
        &self.issues
    }

    pub fn index(&self) -> &ReportIndex {
        &self.index
    }

    pub fn into_parts(self) -> (ReportIndex, Vec<ReportParseIssue>) {
        (self.index, self.issues)
    }

    /// Reads the whole document. A document with the wrong root element is left
    /// unread and recorded as [`ReportParseIssue::UnexpectedRoot`].
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
                Event::Text(e) => self.match_text(&e).map(|_| true),
                Event::CData(e) => e
                    .minimal_escape()
                    .and_then(|e| self.match_text(&e))
                    .map(|_| true),
                _ => Ok(true),
            };
            if !handled.map_err(|source| reader.encoding_error(source))? {
                break;
            }
        }
        Ok(())
    }

    fn open_element(&mut self, e: &BytesStart, depth: usize) -> quick_xml::Result<bool> {
        let local_name = e.local_name();
        let tag = local_name.as_ref();
        if depth == 1 {
            let root = tag_name(tag)?;
            if !self.dialect.accepts_root(&root) {
                self.issues.push(ReportParseIssue::UnexpectedRoot(root));
                return Ok(false);
            }
        }

        match tag {
            TAG_TEST_SUITE if self.current_test_case.is_none() => {
                let name = parse_attr::string(e, attrs::NAME)?.unwrap_or_default();
                self.suite_names.push(name);
            }
            TAG_TEST_CASE if self.current_test_case.is_none() => self.open_test_case(e, depth)?,
            TAG_TEST_CASE_STATUS_FAILURE
            | TAG_TEST_CASE_STATUS_ERROR
            | TAG_TEST_CASE_STATUS_SKIPPED => self.open_test_case_status(e, depth)?,
            _ => (),
        }
        Ok(true)
    }

    fn close_element(&mut self, tag: &[u8], depth: usize) {
        match tag {
            TAG_TEST_SUITE if self.current_test_case.is_none() => {
                self.suite_names.pop();
            }
            TAG_TEST_CASE => {
                if self
                    .current_test_case
                    .as_ref()
                    .is_some_and(|test_case| test_case.depth == depth)
                {
                    self.close_test_case();
                }
            }
            TAG_TEST_CASE_STATUS_FAILURE
            | TAG_TEST_CASE_STATUS_ERROR
            | TAG_TEST_CASE_STATUS_SKIPPED => {
                if let Some(test_case) = self.current_test_case.as_mut() {
                    if test_case.status_depth == Some(depth) {
                        test_case.status_depth = None;
                    }
                }
            }
            _ => (),
        }
    }

    fn open_test_case(&mut self, e: &BytesStart, depth: usize) -> quick_xml::Result<()> {
        let name = parse_attr::string(e, attrs::NAME)?;
        if name.is_none() {
            self.issues.push(ReportParseIssue::TestCaseNameMissing);
        }
        if self.suite_names.is_empty() {
            self.issues.push(ReportParseIssue::TestCaseOutsideSuite);
        }

        self.current_test_case = Some(OpenTestCase {
            depth,
            name,
            classname: parse_attr::string(e, attrs::CLASSNAME)?,
            file: parse_attr::string(e, attrs::FILE)?,
            duration_millis: duration::parse_seconds(
                parse_attr::string(e, attrs::TIME)?.as_deref(),
            ),
            status: None,
            status_depth: None,
            status_text: String::new(),
        });
        Ok(())
    }

    /// Any direct child marker sets the status, wherever it sits among the
    /// other children. Some tools write `system-out` before `failure`.
    fn open_test_case_status(&mut self, e: &BytesStart, depth: usize) -> quick_xml::Result<()> {
        let Some(test_case) = self.current_test_case.as_mut() else {
            return Ok(());
        };
        if depth != test_case.depth + 1 {
            return Ok(());
        }
        if test_case.status.is_some() {
            self.issues.push(ReportParseIssue::DuplicateStatus);
            return Ok(());
        }

        let message = parse_attr::text_field(e, attrs::MESSAGE)?;
        test_case.status = Some(match e.local_name().as_ref() {
            TAG_TEST_CASE_STATUS_FAILURE => MarkedStatus::Failure(message),
            TAG_TEST_CASE_STATUS_ERROR => MarkedStatus::Error(message),
            _ => MarkedStatus::Skipped,
        });
        test_case.status_depth = Some(depth);
        Ok(())
    }

    fn match_text(&mut self, e: &BytesText) -> quick_xml::Result<()> {
        let text = parse_attr::text(e)?;
        let Some(test_case) = self.current_test_case.as_mut() else {
            return Ok(());
        };
        if test_case.status_depth.is_none() || text.is_empty() {
            return Ok(());
        }
        if !test_case.status_text.is_empty() {
            test_case.status_text.push('\n');
        }
        test_case.status_text.push_str(&text);
        Ok(())
    }

    fn close_test_case(&mut self) {
        let Some(test_case) = self.current_test_case.take() else {
            return;
        };

        let stack_trace = non_empty_trimmed(Some(safe_truncate_str::<MAX_TEXT_FIELD_SIZE>(
            &test_case.status_text,
        )));
        let status = match test_case.status {
            None => TestStatus::Ok,
            Some(MarkedStatus::Skipped) => TestStatus::Skipped,
            Some(MarkedStatus::Failure(message)) => TestStatus::Failure(FailureDetails {
                message,
                stack_trace,
            }),
            Some(MarkedStatus::Error(message)) => TestStatus::Error(FailureDetails {
                message,
                stack_trace,
            }),
        };

        let suite_name = self
            .suite_names
            .iter()
            .rev()
            .find(|name| !name.is_empty())
            .cloned();
        let key = match self.dialect {
            ReportDialect::Soatest => test_case
                .file
                .clone()
                .or_else(|| test_case.classname.clone())
                .or_else(|| suite_name.clone()),
            _ => test_case
                .classname
                .clone()
                .or_else(|| suite_name.clone())
                .or_else(|| test_case.file.clone()),
        }
        .unwrap_or_default();

        let result = TestResult::new(
            test_case.name.unwrap_or_default(),
            suite_name
                .or_else(|| test_case.classname.clone())
                .unwrap_or_default(),
        )
        .with_classname(test_case.classname)
        .with_file(test_case.file)
        .with_status(status)
        .with_duration_millis(test_case.duration_millis);

        self.index.index(key).add(result);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::class_report::TestCounts;

    fn parse(dialect: ReportDialect, xml: &str) -> TestReportParser {
        let mut parser = TestReportParser::new(dialect);
        parser.parse("report.xml", xml.as_bytes()).unwrap();
        parser
    }

    #[test]
    fn reads_xunit_test_cases() {
        let parser = parse(
            ReportDialect::Xunit,
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <testsuite name="com.acme.FooTest" tests="4">
              <testcase name="ok" classname="com.acme.FooTest" time="0.5"/>
              <testcase name="fails" classname="com.acme.FooTest" time="0.25">
                <failure message="expected 1">
                  at com.acme.FooTest.fails(FooTest.java:12)
                </failure>
              </testcase>
              <testcase name="errors" classname="com.acme.FooTest" time="abc">
                <error message="NPE"><![CDATA[java.lang.NullPointerException]]></error>
              </testcase>
              <testcase name="skips" classname="com.acme.FooTest">
                <skipped message="not today"/>
              </testcase>
            </testsuite>"#,
        );

        assert!(parser.issues().is_empty());
        let report = parser.index().get("com.acme.FooTest").unwrap();
        assert_eq!(
            *report.counts(),
            TestCounts {
                tests: 4,
                failures: 1,
                errors: 1,
                skipped: 1,
                duration_millis: 750,
                negative_duration_count: 0,
            }
        );

        let results = report.results();
        assert_eq!(
            results[1].status(),
            &TestStatus::Failure(FailureDetails {
                message: Some(String::from("expected 1")),
                stack_trace: Some(String::from("at com.acme.FooTest.fails(FooTest.java:12)")),
            })
        );
        assert_eq!(
            results[2].status(),
            &TestStatus::Error(FailureDetails {
                message: Some(String::from("NPE")),
                stack_trace: Some(String::from("java.lang.NullPointerException")),
            })
        );
        assert_eq!(results[2].duration_millis(), 0);
        assert_eq!(results[3].status(), &TestStatus::Skipped);
        assert_eq!(results[0].suite_name(), "com.acme.FooTest");
    }

    #[test]
    fn first_status_wins() {
        let parser = parse(
            ReportDialect::Xunit,
            r#"<testsuites><testsuite name="S">
              <testcase name="t" classname="C">
                <skipped/>
                <failure message="late"/>
              </testcase>
              <testcase name="after" classname="C"/>
            </testsuite></testsuites>"#,
        );

        assert_eq!(parser.issues(), &[ReportParseIssue::DuplicateStatus]);
        let results = parser.index().get("C").unwrap().results();
        assert_eq!(results[0].status(), &TestStatus::Skipped);
        assert_eq!(results[1].status(), &TestStatus::Ok);
    }

    #[test]
    fn nested_elements_inside_a_test_case_are_consumed() {
        let parser = parse(
            ReportDialect::Xunit,
            r#"<testsuites><testsuite name="S">
              <testcase name="t" classname="C">
                <failure message="m"><detail><line>one</line><line>two</line></detail></failure>
                <system-out>noise</system-out>
                <properties><failure>not a status</failure></properties>
              </testcase>
              <testcase name="u" classname="C"/>
            </testsuite></testsuites>"#,
        );

        let results = parser.index().get("C").unwrap().results();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].status(),
            &TestStatus::Failure(FailureDetails {
                message: Some(String::from("m")),
                stack_trace: Some(String::from("one\ntwo")),
            })
        );
        assert_eq!(results[1].status(), &TestStatus::Ok);
    }

    #[test]
    fn classname_falls_back_to_the_suite() {
        let parser = parse(
            ReportDialect::Xunit,
            r#"<testsuites>
              <testsuite name="Outer"><testsuite name="Inner">
                <testcase name="t"/>
              </testsuite></testsuite>
              <testcase name="loose" classname="Loose"/>
            </testsuites>"#,
        );

        assert_eq!(parser.issues(), &[ReportParseIssue::TestCaseOutsideSuite]);
        assert_eq!(parser.index().keys().collect::<Vec<_>>(), vec!["Inner", "Loose"]);
        assert_eq!(
            parser.index().get("Loose").unwrap().results()[0].suite_name(),
            "Loose"
        );
    }

    #[test]
    fn soatest_reports_are_keyed_by_file() {
        let parser = parse(
            ReportDialect::Soatest,
            r#"<testsuites>
              <testsuite name="math_suite">
                <testcase name="add" classname="math.Adder" file="src/math/add.cpp" time="0.002"/>
                <testcase name="sub" classname="math.Subber" time="0.003"/>
              </testsuite>
            </testsuites>"#,
        );

        assert_eq!(
            parser.index().keys().collect::<Vec<_>>(),
            vec!["math.Subber", "src/math/add.cpp"]
        );
        let add = &parser.index().get("src/math/add.cpp").unwrap().results()[0];
        assert_eq!(add.suite_name(), "math_suite");
        assert_eq!(add.classname(), Some("math.Adder"));
        assert_eq!(add.duration_millis(), 2);
    }

    #[test]
    fn unexpected_root_yields_nothing() {
        let parser = parse(
            ReportDialect::Soatest,
            r#"<testsuite name="S"><testcase name="t" classname="C"/></testsuite>"#,
        );

        assert!(parser.index().is_empty());
        assert_eq!(
            parser.issues(),
            &[ReportParseIssue::UnexpectedRoot(String::from("testsuite"))]
        );
    }

    #[test]
    fn unnamed_test_cases_get_a_name() {
        let parser = parse(
            ReportDialect::Xunit,
            r#"<testsuite name="S"><testcase classname="C"/><testcase name=" " classname="C"/></testsuite>"#,
        );

        let results = parser.index().get("C").unwrap().results();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.name().starts_with("unnamed-")));
        assert_ne!(results[0].name(), results[1].name());
        assert_eq!(
            parser.issues(),
            &[
                ReportParseIssue::TestCaseNameMissing,
                ReportParseIssue::TestCaseNameMissing
            ]
        );
    }

    #[test]
    fn truncated_documents_fail() {
        let mut parser = TestReportParser::new(ReportDialect::Xunit);
        let result = parser.parse(
            "broken.xml",
            r#"<testsuite name="S"><testcase name="t" classname="C">"#.as_bytes(),
        );
        assert_matches!(
            result,
            Err(ReportParseError::UnexpectedEof { ref path, open_elements: 2 }) if path == "broken.xml"
        );

        let mut parser = TestReportParser::new(ReportDialect::Xunit);
        let result = parser.parse(
            "mismatched.xml",
            r#"<testsuite name="S"><testcase name="t"></testsuite>"#.as_bytes(),
        );
        assert_matches!(result, Err(ReportParseError::Xml { .. }));

        let mut parser = TestReportParser::new(ReportDialect::Xunit);
        let result = parser.parse("empty.xml", "".as_bytes());
        assert_matches!(result, Err(ReportParseError::EmptyDocument { .. }));
    }

    #[test]
    fn status_after_output_elements_counts() {
        let parser = parse(
            ReportDialect::Xunit,
            r#"<testsuite name="S">
              <testcase name="t" classname="C">
                <system-out>starting</system-out>
                <system-err>oops</system-err>
                <error message="boom">trace</error>
              </testcase>
            </testsuite>"#,
        );

        assert!(parser.issues().is_empty());
        assert_eq!(
            parser.index().get("C").unwrap().results()[0].status(),
            &TestStatus::Error(FailureDetails {
                message: Some(String::from("boom")),
                stack_trace: Some(String::from("trace")),
            })
        );
    }

    #[test]
    fn undecodable_bytes_fail_the_document() {
        let mut parser = TestReportParser::new(ReportDialect::Xunit);
        let result = parser.parse(
            "latin1.xml",
            &b"<testsuite name=\"S\"><testcase name=\"t\" classname=\"com.acme.\xffFoo\" time=\"1\"/></testsuite>"[..],
        );
        assert_matches!(
            result,
            Err(ReportParseError::Encoding { ref path, .. }) if path == "latin1.xml"
        );
        assert!(parser.index().is_empty());

        let mut parser = TestReportParser::new(ReportDialect::Xunit);
        let result = parser.parse(
            "latin1.xml",
            &b"<testsuite name=\"S\"><testcase name=\"t\" classname=\"C\"><failure message=\"m\">caf\xe9 \xff</failure></testcase></testsuite>"[..],
        );
        assert_matches!(result, Err(ReportParseError::Encoding { .. }));
        assert!(parser.index().is_empty());

        let mut parser = TestReportParser::new(ReportDialect::Xunit);
        let result = parser.parse(
            "entity.xml",
            r#"<testsuite name="S"><testcase name="t" classname="&bogus;"/></testsuite>"#.as_bytes(),
        );
        assert_matches!(result, Err(ReportParseError::Encoding { .. }));
    }
}
