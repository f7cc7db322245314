use std::{fmt, str::FromStr};

use constants::INNER_CLASS_SEPARATOR;
use thiserror::Error;

const TAG_TEST_SUITES: &str = "testsuites";
const TAG_TEST_SUITE: &str = "testsuite";
const TAG_RESULTS_SESSION: &str = "ResultsSession";
const TAG_EXEC: &str = "Exec";
const TAG_EXECUTED_TESTS_DETAILS: &str = "ExecutedTestsDetails";
const TAG_STD_VIOLS: &str = "StdViols";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown value `{0}`")]
pub struct UnknownVariant(String);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ReportDialect {
    /// `<testsuites>` or a bare `<testsuite>`, aggregated by class name.
    Xunit,
    /// Multi-suite `<testsuites>` reports, aggregated by source file.
    Soatest,
    /// dotTest / C++test `ExecutedTestsDetails` totals, project level only.
    ExecutionTotals,
    /// Static-analysis `StdViols` violation reports.
    StaticAnalysis,
}

impl ReportDialect {
    pub fn accepted_roots(&self) -> &'static [&'static str] {
        match self {
            ReportDialect::Xunit => &[TAG_TEST_SUITES, TAG_TEST_SUITE],
            ReportDialect::Soatest => &[TAG_TEST_SUITES],
            ReportDialect::ExecutionTotals => {
                &[TAG_RESULTS_SESSION, TAG_EXEC, TAG_EXECUTED_TESTS_DETAILS]
            }
            ReportDialect::StaticAnalysis => &[TAG_RESULTS_SESSION, TAG_STD_VIOLS],
        }
    }

    pub fn accepts_root(&self, tag: &str) -> bool {
        self.accepted_roots().contains(&tag)
    }

    pub fn default_path_rule(&self) -> PathRule {
        match self {
            ReportDialect::Xunit => PathRule::new(Some("java")),
            ReportDialect::Soatest => PathRule::new(Some("cpp")),
            ReportDialect::ExecutionTotals | ReportDialect::StaticAnalysis => PathRule::new(None),
        }
    }

    /// SOAtest reports do not distinguish errors from failures.
    pub fn default_density_policy(&self) -> DensityPolicy {
        match self {
            ReportDialect::Soatest => DensityPolicy::FailuresOnly,
            _ => DensityPolicy::FailuresAndErrors,
        }
    }

    pub fn has_test_results(&self) -> bool {
        match self {
            ReportDialect::Xunit | ReportDialect::Soatest | ReportDialect::ExecutionTotals => true,
            ReportDialect::StaticAnalysis => false,
        }
    }
}

impl fmt::Display for ReportDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReportDialect::Xunit => "xunit",
            ReportDialect::Soatest => "soatest",
            ReportDialect::ExecutionTotals => "execution-totals",
            ReportDialect::StaticAnalysis => "static-analysis",
        })
    }
}

impl FromStr for ReportDialect {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xunit" | "junit" => Ok(ReportDialect::Xunit),
            "soatest" => Ok(ReportDialect::Soatest),
            "execution-totals" | "dottest" | "cpptest" => Ok(ReportDialect::ExecutionTotals),
            "static-analysis" => Ok(ReportDialect::StaticAnalysis),
            _ => Err(UnknownVariant(String::from(s))),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DensityPolicy {
    #[default]
    FailuresAndErrors,
    FailuresOnly,
}

impl FromStr for DensityPolicy {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "failures-and-errors" => Ok(DensityPolicy::FailuresAndErrors),
            "failures-only" => Ok(DensityPolicy::FailuresOnly),
            _ => Err(UnknownVariant(String::from(s))),
        }
    }
}

/// Turns a logical key into a project-relative path.
///
/// Keys that already look like paths (a `/` or `\`, or ending in the source
/// extension) are used as they are. Class names have everything from the
/// first `$` dropped, then `strip_suffix` removed, then every
/// `package_separator` replaced by `/`, then `.extension` appended:
/// `com.acme.FooIT$Inner` with suffix `IT` and extension `java` becomes
/// `com/acme/Foo.java`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRule {
    pub package_separator: char,
    pub strip_suffix: Option<String>,
    pub extension: Option<String>,
}

impl PathRule {
    pub fn new(extension: Option<&str>) -> Self {
        Self {
            package_separator: '.',
            strip_suffix: None,
            extension: extension.map(String::from),
        }
    }

    pub fn with_strip_suffix(mut self, strip_suffix: Option<String>) -> Self {
        self.strip_suffix = strip_suffix.filter(|s| !s.is_empty());
        self
    }

    pub fn with_extension(mut self, extension: Option<String>) -> Self {
        self.extension = extension
            .map(|e| String::from(e.trim_start_matches('.')))
            .filter(|e| !e.is_empty());
        self
    }

    pub fn to_relative_path(&self, key: &str) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        if self.looks_like_path(key) {
            return Some(key.replace('\\', "/"));
        }

        let class_name = key
            .split(INNER_CLASS_SEPARATOR)
            .next()
            .unwrap_or_default();
        let class_name = match &self.strip_suffix {
            Some(suffix) if class_name.len() > suffix.len() => {
                class_name.strip_suffix(suffix.as_str()).unwrap_or(class_name)
            }
            _ => class_name,
        };
        if class_name.is_empty() {
            return None;
        }

        let path = class_name.replace(self.package_separator, "/");
        Some(match &self.extension {
            Some(extension) => format!("{path}.{extension}"),
            None => path,
        })
    }

    fn looks_like_path(&self, key: &str) -> bool {
        key.contains('/')
            || key.contains('\\')
            || self
                .extension
                .as_ref()
                .is_some_and(|extension| key.ends_with(&format!(".{extension}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_names_become_paths() {
        let rule = ReportDialect::Xunit.default_path_rule();
        assert_eq!(
            rule.to_relative_path("com.acme.FooTest"),
            Some(String::from("com/acme/FooTest.java"))
        );
        assert_eq!(
            rule.to_relative_path("com.acme.Foo$Bar"),
            Some(String::from("com/acme/Foo.java"))
        );
        assert_eq!(rule.to_relative_path("  "), None);
        assert_eq!(rule.to_relative_path("$Bar"), None);
    }

    #[test]
    fn marker_suffix_is_stripped() {
        let rule = PathRule::new(Some("java")).with_strip_suffix(Some(String::from("IT")));
        assert_eq!(
            rule.to_relative_path("com.acme.FooIT"),
            Some(String::from("com/acme/Foo.java"))
        );
        // never strip a key down to nothing
        assert_eq!(rule.to_relative_path("IT"), Some(String::from("IT.java")));
    }

    #[test]
    fn paths_are_kept() {
        let rule = ReportDialect::Soatest.default_path_rule();
        assert_eq!(
            rule.to_relative_path("src\\math\\add.cpp"),
            Some(String::from("src/math/add.cpp"))
        );
        assert_eq!(rule.to_relative_path("add.cpp"), Some(String::from("add.cpp")));
        assert_eq!(
            rule.to_relative_path("math.Adder"),
            Some(String::from("math/Adder.cpp"))
        );
    }

    #[test]
    fn extension_is_normalized() {
        let rule = PathRule::new(None).with_extension(Some(String::from(".kt")));
        assert_eq!(rule.to_relative_path("a.B"), Some(String::from("a/B.kt")));
        let rule = PathRule::new(Some("java")).with_extension(Some(String::new()));
        assert_eq!(rule.to_relative_path("a.B"), Some(String::from("a/B")));
    }

    #[test]
    fn dialects_parse() {
        assert_eq!("xunit".parse(), Ok(ReportDialect::Xunit));
        assert_eq!("SOAtest".parse(), Ok(ReportDialect::Soatest));
        assert_eq!("dottest".parse(), Ok(ReportDialect::ExecutionTotals));
        assert_eq!(
            ReportDialect::StaticAnalysis.to_string().parse(),
            Ok(ReportDialect::StaticAnalysis)
        );
        assert!("nope".parse::<ReportDialect>().is_err());
        assert_eq!("failures-only".parse(), Ok(DensityPolicy::FailuresOnly));
    }
}
