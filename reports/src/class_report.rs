use crate::{
    dialect::DensityPolicy,
    result::{TestResult, TestStatus},
};

/// Running test counts. `tests` always equals passed + failures + errors + skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestCounts {
    pub tests: u64,
    pub failures: u64,
    pub errors: u64,
    pub skipped: u64,
    /// Sum of the non-negative durations only.
    pub duration_millis: u64,
    pub negative_duration_count: u64,
}

impl TestCounts {
    pub fn passed(&self) -> u64 {
        self.tests - self.failures - self.errors - self.skipped
    }

    pub fn accumulate(&mut self, other: &TestCounts) {
        self.tests += other.tests;
        self.failures += other.failures;
        self.errors += other.errors;
        self.skipped += other.skipped;
        self.duration_millis += other.duration_millis;
        self.negative_duration_count += other.negative_duration_count;
    }

    /// Percentage of tests that did not fail, rounded to two decimals. 0 without tests.
    pub fn success_density(&self, policy: DensityPolicy) -> f64 {
        if self.tests == 0 {
            return 0.0;
        }
        let counted = match policy {
            DensityPolicy::FailuresAndErrors => self.failures + self.errors,
            DensityPolicy::FailuresOnly => self.failures,
        };
        let density = 100.0 - (counted as f64 * 100.0 / self.tests as f64);
        (density * 100.0).round() / 100.0
    }

    fn record(&mut self, result: &TestResult) {
        self.tests += 1;
        match result.status() {
            TestStatus::Ok => {}
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Failure(_) => self.failures += 1,
            TestStatus::Error(_) => self.errors += 1,
        }
        match u64::try_from(result.duration_millis()) {
            Ok(duration) => self.duration_millis += duration,
            Err(_) => self.negative_duration_count += 1,
        }
    }
}

/// Test outcomes of one class, suite or file.
///
/// Not synchronized: a report is filled by a single thread and handed over whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassReport {
    counts: TestCounts,
    results: Vec<TestResult>,
}

impl ClassReport {
    pub fn new() -> Self {
        Default::default()
    }

    /// Returns whether the result was kept.
    pub fn add(&mut self, result: TestResult) -> bool {
        // Some tool versions report parameterized or repeated tests of nested
        // classes more than once under the same `Outer$Inner` style name. Only
        // those names are deduplicated; other repeated names are real runs.
        if result.has_inner_class_name()
            && self.results.iter().any(|r| r.name() == result.name())
        {
            return false;
        }
        self.counts.record(&result);
        self.results.push(result);
        true
    }

    /// Adds the other report's results one by one, in their original order.
    pub fn add_report(&mut self, other: ClassReport) {
        for result in other.results {
            self.add(result);
        }
    }

    pub fn counts(&self) -> &TestCounts {
        &self.counts
    }

    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.counts.tests == 0
    }
}
