pub mod class_report;
pub mod dialect;
pub mod duration;
pub mod engine;
pub mod error;
pub mod index;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod result;
pub mod sink;
pub mod string_safety;
pub mod totals;
pub mod violations;
mod xml;

pub use class_report::{ClassReport, TestCounts};
pub use dialect::{DensityPolicy, PathRule, ReportDialect};
pub use engine::{AggregationEngine, ImportOptions, ProjectTotals, RunSummary};
pub use error::{ReportParseError, ReportParseIssue};
pub use index::ReportIndex;
pub use report::{parse_report, parse_report_file, ParsedReport, ReportContent};
pub use resolver::{FsResolver, Resource, ResourceResolver};
pub use result::{FailureDetails, TestResult, TestStatus};
pub use sink::{Metric, MetricRecord, MetricSink, MetricValue, RecordingSink};
