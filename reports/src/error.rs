use thiserror::Error;

/// A report file that could not be read as a whole. Only the file is lost, never the batch.
#[derive(Error, Debug)]
pub enum ReportParseError {
    #[error("could not read report {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed XML in report {path} at byte {position}: {source}")]
    Xml {
        path: String,
        position: u64,
        source: quick_xml::Error,
    },
    #[error("undecodable content in report {path} before byte {position}: {source}")]
    Encoding {
        path: String,
        position: u64,
        source: quick_xml::Error,
    },
    #[error("report {path} ended with {open_elements} unclosed element(s)")]
    UnexpectedEof { path: String, open_elements: usize },
    #[error("report {path} contains no XML elements")]
    EmptyDocument { path: String },
}

impl ReportParseError {
    pub fn path(&self) -> &str {
        match self {
            ReportParseError::Io { path, .. }
            | ReportParseError::Xml { path, .. }
            | ReportParseError::Encoding { path, .. }
            | ReportParseError::UnexpectedEof { path, .. }
            | ReportParseError::EmptyDocument { path } => path,
        }
    }
}

/// Problems that do not stop a report from being read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReportParseIssue {
    #[error("unexpected root element <{0}>")]
    UnexpectedRoot(String),
    #[error("test case found outside of a test suite")]
    TestCaseOutsideSuite,
    #[error("test case has more than one status element, keeping the first")]
    DuplicateStatus,
    #[error("test case has no name")]
    TestCaseNameMissing,
    #[error("no execution totals found")]
    TotalsNotFound,
    #[error("violation has no file location")]
    ViolationLocationMissing,
}
