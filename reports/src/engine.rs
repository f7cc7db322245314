use std::{collections::BTreeMap, path::Path};

use crate::{
    class_report::{ClassReport, TestCounts},
    dialect::{DensityPolicy, PathRule, ReportDialect},
    error::ReportParseError,
    index::ReportIndex,
    report::{parse_report_file, ParsedReport, ReportContent},
    resolver::{Resource, ResourceResolver},
    sink::{Metric, MetricSink, MetricValue},
    violations::ViolationIndex,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    pub dialect: ReportDialect,
    pub path_rule: PathRule,
    pub density: DensityPolicy,
}

impl ImportOptions {
    pub fn new(dialect: ReportDialect) -> Self {
        Self {
            dialect,
            path_rule: dialect.default_path_rule(),
            density: dialect.default_density_policy(),
        }
    }

    pub fn with_path_rule(mut self, path_rule: PathRule) -> Self {
        self.path_rule = path_rule;
        self
    }

    pub fn with_density(mut self, density: DensityPolicy) -> Self {
        self.density = density;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectTotals {
    pub counts: TestCounts,
    pub violations: u64,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub parsed_files: usize,
    pub failed_files: Vec<ReportParseError>,
    pub rejected_files: usize,
    pub resolved_resources: usize,
    pub unresolved_keys: Vec<String>,
    pub project: ProjectTotals,
}

#[derive(Debug, Default)]
struct Batch {
    tests: ReportIndex,
    totals: TestCounts,
    violations: ViolationIndex,
}

impl Batch {
    fn add(&mut self, result: Result<ParsedReport, ReportParseError>, summary: &mut RunSummary) {
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                log::warn!("Skipping report: {}", e);
                summary.failed_files.push(e);
                return;
            }
        };
        if let Some(root) = report.rejected_root() {
            log::warn!(
                "Ignoring report {}: unexpected root element <{}>",
                report.path,
                root
            );
            summary.rejected_files += 1;
            return;
        }
        for issue in &report.issues {
            log::debug!("Report {}: {}", report.path, issue);
        }
        match report.content {
            ReportContent::Tests(index) => self.tests.add_index(index),
            ReportContent::Totals(totals) => {
                if let Some(totals) = totals {
                    self.totals.accumulate(&totals.into());
                }
            }
            ReportContent::Violations(index) => self.violations.add_index(index),
        }
        summary.parsed_files += 1;
    }
}

/// Turns a batch of report files into metrics.
///
/// Files are parsed one by one; a file that cannot be read is logged and
/// skipped. All files are merged before inner classes are folded into their
/// outer class, so splits across files reconcile too.
pub struct AggregationEngine<'a, R: ?Sized, S: ?Sized> {
    options: &'a ImportOptions,
    resolver: &'a R,
    sink: &'a mut S,
}

impl<'a, R, S> AggregationEngine<'a, R, S>
where
    R: ResourceResolver + ?Sized,
    S: MetricSink + ?Sized,
{
    pub fn new(options: &'a ImportOptions, resolver: &'a R, sink: &'a mut S) -> Self {
        Self {
            options,
            resolver,
            sink,
        }
    }

    /// Each file is folded into the batch as soon as it is parsed, so only
    /// the merged indices stay in memory.
    pub fn run<P: AsRef<Path>>(&mut self, files: &[P]) -> anyhow::Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut batch = Batch::default();
        for path in files {
            let path = path.as_ref();
            log::info!("Parsing report {}", path.display());
            batch.add(parse_report_file(self.options.dialect, path), &mut summary);
        }
        self.finish(batch, summary)
    }

    /// Same as [`Self::run`] for reports parsed elsewhere, e.g. on several threads.
    /// Results are merged in the order given.
    pub fn aggregate<I>(&mut self, parsed: I) -> anyhow::Result<RunSummary>
    where
        I: IntoIterator<Item = Result<ParsedReport, ReportParseError>>,
    {
        let mut summary = RunSummary::default();
        let mut batch = Batch::default();
        for result in parsed {
            batch.add(result, &mut summary);
        }
        self.finish(batch, summary)
    }

    fn finish(&mut self, batch: Batch, mut summary: RunSummary) -> anyhow::Result<RunSummary> {
        let Batch {
            mut tests,
            totals,
            violations,
        } = batch;
        tests.normalize_inner_classes();
        self.emit_test_reports(tests, &mut summary)?;
        summary.project.counts.accumulate(&totals);
        self.emit_violations(violations, &mut summary)?;
        self.finalize(&summary)?;

        Ok(summary)
    }

    fn emit_test_reports(
        &mut self,
        index: ReportIndex,
        summary: &mut RunSummary,
    ) -> anyhow::Result<()> {
        let mut resolved: BTreeMap<Resource, TestCounts> = BTreeMap::new();
        for (key, report) in index {
            if report.is_empty() {
                continue;
            }
            summary.project.counts.accumulate(report.counts());
            match self.resolve_test_report(&key, &report) {
                Some(resource) => resolved
                    .entry(resource)
                    .or_default()
                    .accumulate(report.counts()),
                None => {
                    log::debug!("Resource not found for {}", key);
                    summary.unresolved_keys.push(key);
                }
            }
        }

        for (resource, counts) in &resolved {
            self.emit_counts(resource, counts)?;
        }
        summary.resolved_resources += resolved.len();
        Ok(())
    }

    /// Tries the key itself, then the suite name each result was reported
    /// under, which some tool versions write differently from the class name.
    fn resolve_test_report(&self, key: &str, report: &ClassReport) -> Option<Resource> {
        self.resolve_key(key).or_else(|| {
            let mut tried = vec![key];
            report.results().iter().find_map(|result| {
                let suite_name = result.suite_name();
                if suite_name.is_empty() || tried.contains(&suite_name) {
                    return None;
                }
                tried.push(suite_name);
                self.resolve_key(suite_name)
            })
        })
    }

    fn resolve_key(&self, key: &str) -> Option<Resource> {
        self.options
            .path_rule
            .to_relative_path(key)
            .and_then(|path| self.resolver.resolve(&path))
    }

    fn emit_counts(&mut self, resource: &Resource, counts: &TestCounts) -> anyhow::Result<()> {
        let metrics = [
            (Metric::Tests, MetricValue::Count(counts.tests)),
            (Metric::TestFailures, MetricValue::Count(counts.failures)),
            (Metric::TestErrors, MetricValue::Count(counts.errors)),
            (Metric::SkippedTests, MetricValue::Count(counts.skipped)),
            (
                Metric::TestSuccessDensity,
                MetricValue::Percent(counts.success_density(self.options.density)),
            ),
            (
                Metric::TestExecutionTime,
                MetricValue::Millis(counts.duration_millis),
            ),
        ];
        for (metric, value) in metrics {
            self.sink.store(resource, metric, value)?;
        }
        Ok(())
    }

    fn emit_violations(
        &mut self,
        index: ViolationIndex,
        summary: &mut RunSummary,
    ) -> anyhow::Result<()> {
        let mut resolved: BTreeMap<Resource, u64> = BTreeMap::new();
        for (file, violations) in index {
            let count = violations.len() as u64;
            summary.project.violations += count;
            match self.resolver.resolve(&file) {
                Some(resource) => *resolved.entry(resource).or_default() += count,
                None => {
                    log::debug!("Resource not found for {}", file);
                    summary.unresolved_keys.push(file);
                }
            }
        }

        for (resource, count) in &resolved {
            self.sink
                .store(resource, Metric::Violations, MetricValue::Count(*count))?;
        }
        summary.resolved_resources += resolved.len();
        Ok(())
    }

    fn finalize(&mut self, summary: &RunSummary) -> anyhow::Result<()> {
        let ProjectTotals { counts, violations } = summary.project;

        if counts.negative_duration_count > 0 {
            log::warn!(
                "{} test(s) reported a negative duration, their time was left out of the execution time",
                counts.negative_duration_count
            );
        }

        if self.options.dialect.has_test_results() {
            self.emit_counts(&Resource::Project, &counts)?;
            log::info!(
                "Imported {} report(s): {} tests, {} errors, {} failures, {} skipped, {} ms",
                summary.parsed_files,
                counts.tests,
                counts.errors,
                counts.failures,
                counts.skipped,
                counts.duration_millis
            );
        } else {
            self.sink.store(
                &Resource::Project,
                Metric::Violations,
                MetricValue::Count(violations),
            )?;
            log::info!(
                "Imported {} report(s): {} violations",
                summary.parsed_files,
                violations
            );
        }
        Ok(())
    }
}
