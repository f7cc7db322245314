use std::{fs, io::BufRead, io::BufReader, path::Path};

use crate::{
    dialect::ReportDialect,
    error::{ReportParseError, ReportParseIssue},
    index::ReportIndex,
    parser::TestReportParser,
    totals::{ExecutionTotals, ExecutionTotalsParser},
    violations::{ViolationIndex, ViolationParser},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportContent {
    Tests(ReportIndex),
    Totals(Option<ExecutionTotals>),
    Violations(ViolationIndex),
}

/// Everything read from one report file, independent of any other file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReport {
    pub path: String,
    pub content: ReportContent,
    pub issues: Vec<ReportParseIssue>,
}

impl ParsedReport {
    /// The root element, when the document was rejected because of it.
    pub fn rejected_root(&self) -> Option<&str> {
        self.issues.iter().find_map(|issue| match issue {
            ReportParseIssue::UnexpectedRoot(root) => Some(root.as_str()),
            _ => None,
        })
    }
}

pub fn parse_report<R: BufRead>(
    dialect: ReportDialect,
    path: &str,
    xml: R,
) -> Result<ParsedReport, ReportParseError> {
    let (content, issues) = match dialect {
        ReportDialect::Xunit | ReportDialect::Soatest => {
            let mut parser = TestReportParser::new(dialect);
            parser.parse(path, xml)?;
            let (index, issues) = parser.into_parts();
            (ReportContent::Tests(index), issues)
        }
        ReportDialect::ExecutionTotals => {
            let mut parser = ExecutionTotalsParser::new();
            parser.parse(path, xml)?;
            let (totals, issues) = parser.into_parts();
            (ReportContent::Totals(totals), issues)
        }
        ReportDialect::StaticAnalysis => {
            let mut parser = ViolationParser::new();
            parser.parse(path, xml)?;
            let (index, issues) = parser.into_parts();
            (ReportContent::Violations(index), issues)
        }
    };
    Ok(ParsedReport {
        path: String::from(path),
        content,
        issues,
    })
}

pub fn parse_report_file<T: AsRef<Path>>(
    dialect: ReportDialect,
    path: T,
) -> Result<ParsedReport, ReportParseError> {
    let path = path.as_ref();
    let display_path = path.display().to_string();
    let file = fs::File::open(path).map_err(|source| ReportParseError::Io {
        path: display_path.clone(),
        source,
    })?;
    parse_report(dialect, &display_path, BufReader::new(file))
}
