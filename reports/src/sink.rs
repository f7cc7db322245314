use std::fmt;

use serde::Serialize;

use crate::resolver::Resource;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Tests,
    TestFailures,
    TestErrors,
    SkippedTests,
    TestSuccessDensity,
    TestExecutionTime,
    Violations,
}

impl Metric {
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Tests => "tests",
            Metric::TestFailures => "test_failures",
            Metric::TestErrors => "test_errors",
            Metric::SkippedTests => "skipped_tests",
            Metric::TestSuccessDensity => "test_success_density",
            Metric::TestExecutionTime => "test_execution_time",
            Metric::Violations => "violations",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(u64),
    Percent(f64),
    Millis(u64),
}

/// Receives every metric the engine computes. Calls are never concurrent.
pub trait MetricSink {
    fn store(&mut self, resource: &Resource, metric: Metric, value: MetricValue)
        -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub resource: Resource,
    pub metric: Metric,
    pub value: MetricValue,
}

/// Keeps every stored metric in memory, in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Vec<MetricRecord>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn value(&self, resource: &Resource, metric: Metric) -> Option<MetricValue> {
        self.records
            .iter()
            .rev()
            .find(|record| &record.resource == resource && record.metric == metric)
            .map(|record| record.value)
    }

    pub fn resources(&self) -> Vec<&Resource> {
        let mut resources: Vec<&Resource> = Vec::new();
        for record in &self.records {
            if !resources.contains(&&record.resource) {
                resources.push(&record.resource);
            }
        }
        resources
    }
}

impl MetricSink for RecordingSink {
    fn store(
        &mut self,
        resource: &Resource,
        metric: Metric,
        value: MetricValue,
    ) -> anyhow::Result<()> {
        self.records.push(MetricRecord {
            resource: resource.clone(),
            metric,
            value,
        });
        Ok(())
    }
}
