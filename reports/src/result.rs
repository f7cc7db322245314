use constants::INNER_CLASS_SEPARATOR;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureDetails {
    pub message: Option<String>,
    pub stack_trace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TestStatus {
    #[default]
    Ok,
    Failure(FailureDetails),
    Error(FailureDetails),
    Skipped,
}

impl TestStatus {
    pub fn details(&self) -> Option<&FailureDetails> {
        match self {
            TestStatus::Failure(details) | TestStatus::Error(details) => Some(details),
            TestStatus::Ok | TestStatus::Skipped => None,
        }
    }
}

/// One test case as read from a report. Fixed once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    name: String,
    suite_name: String,
    classname: Option<String>,
    file: Option<String>,
    status: TestStatus,
    duration_millis: i64,
}

impl TestResult {
    /// A blank `name` is replaced by a generated one that is unique within the process.
    pub fn new<N: AsRef<str>, S: Into<String>>(name: N, suite_name: S) -> Self {
        let name = name.as_ref().trim();
        let name = if name.is_empty() {
            synthetic_name()
        } else {
            String::from(name)
        };
        Self {
            name,
            suite_name: suite_name.into(),
            classname: None,
            file: None,
            status: TestStatus::Ok,
            duration_millis: 0,
        }
    }

    pub fn with_status(mut self, status: TestStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_duration_millis(mut self, duration_millis: i64) -> Self {
        self.duration_millis = duration_millis;
        self
    }

    pub fn with_classname(mut self, classname: Option<String>) -> Self {
        self.classname = classname;
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The suite or class the report declared this test under.
    pub fn suite_name(&self) -> &str {
        &self.suite_name
    }

    pub fn classname(&self) -> Option<&str> {
        self.classname.as_deref()
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    pub fn status(&self) -> &TestStatus {
        &self.status
    }

    /// Can be negative when the tool that wrote the report got its clock wrong.
    pub fn duration_millis(&self) -> i64 {
        self.duration_millis
    }

    pub fn has_inner_class_name(&self) -> bool {
        self.name.contains(INNER_CLASS_SEPARATOR)
    }
}

fn synthetic_name() -> String {
    format!("unnamed-{}", Uuid::new_v4())
}
