use std::io::Write;

use reports::{Metric, MetricRecord, MetricSink, MetricValue, Resource};

/// Writes every metric as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(mut self) -> anyhow::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> MetricSink for JsonLinesSink<W> {
    fn store(
        &mut self,
        resource: &Resource,
        metric: Metric,
        value: MetricValue,
    ) -> anyhow::Result<()> {
        let record = MetricRecord {
            resource: resource.clone(),
            metric,
            value,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn writes_one_record_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.store(
            &Resource::file("src/com/acme/Foo.java"),
            Metric::Tests,
            MetricValue::Count(3),
        )
        .unwrap();
        sink.store(
            &Resource::Project,
            Metric::TestSuccessDensity,
            MetricValue::Percent(63.33),
        )
        .unwrap();
        assert_eq!(sink.written(), 2);

        let output = String::from_utf8(sink.finish().unwrap()).unwrap();
        assert_eq!(
            output,
            concat!(
                r#"{"resource":{"file":"src/com/acme/Foo.java"},"metric":"tests","value":3}"#,
                "\n",
                r#"{"resource":"project","metric":"test_success_density","value":63.33}"#,
                "\n",
            )
        );
    }
}
