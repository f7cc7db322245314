use std::collections::{btree_map, BTreeMap};

use constants::INNER_CLASS_SEPARATOR;

use crate::class_report::ClassReport;

/// Class reports by logical key: a class name or a file path, depending on the dialect.
///
/// Not synchronized. Per-file indices are built independently and merged afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportIndex {
    reports: BTreeMap<String, ClassReport>,
}

impl ReportIndex {
    pub fn new() -> Self {
        Default::default()
    }

    /// The report stored under `key`, created empty on first use.
    pub fn index<T: AsRef<str>>(&mut self, key: T) -> &mut ClassReport {
        self.reports.entry(String::from(key.as_ref())).or_default()
    }

    pub fn get<T: AsRef<str>>(&self, key: T) -> Option<&ClassReport> {
        self.reports.get(key.as_ref())
    }

    pub fn contains<T: AsRef<str>>(&self, key: T) -> bool {
        self.reports.contains_key(key.as_ref())
    }

    /// Moves every result of `source_key` into `target_key` and drops `source_key`.
    /// Results already under `target_key` win over duplicates. Nothing happens when
    /// `source_key` is unknown.
    pub fn merge<S: AsRef<str>, T: AsRef<str>>(&mut self, source_key: S, target_key: T) {
        let (source_key, target_key) = (source_key.as_ref(), target_key.as_ref());
        if source_key == target_key {
            return;
        }
        if let Some(source) = self.reports.remove(source_key) {
            self.index(target_key).add_report(source);
        }
    }

    /// Folds every `Outer$Inner` key into `Outer`.
    pub fn normalize_inner_classes(&mut self) {
        let inner_keys: Vec<String> = self
            .reports
            .keys()
            .filter(|key| key.contains(INNER_CLASS_SEPARATOR))
            .cloned()
            .collect();

        for key in inner_keys {
            match key.split_once(INNER_CLASS_SEPARATOR) {
                Some((parent, _)) if !parent.is_empty() => {
                    let parent = String::from(parent);
                    self.merge(&key, &parent);
                }
                _ => {}
            }
        }
    }

    /// Adds every report of `other` to the report with the same key.
    pub fn add_index(&mut self, other: ReportIndex) {
        for (key, report) in other.reports {
            self.index(key).add_report(report);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.reports.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ClassReport> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}

impl IntoIterator for ReportIndex {
    type Item = (String, ClassReport);
    type IntoIter = btree_map::IntoIter<String, ClassReport>;

    fn into_iter(self) -> Self::IntoIter {
        self.reports.into_iter()
    }
}
