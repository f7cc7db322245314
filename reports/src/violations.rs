use std::{
    collections::{btree_map, BTreeMap, HashMap},
    io::BufRead,
};

use lazy_static::lazy_static;
use quick_xml::events::{BytesStart, Event};

use crate::{
    dialect::ReportDialect,
    error::{ReportParseError, ReportParseIssue},
    xml::{parse_attr, tag_name, DocumentReader},
};

const TAG_PATH_ELEMENT: &[u8] = b"ElDesc";

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    Standard,
    FlowAnalysis,
    DupCode,
    Metric,
}

lazy_static! {
    static ref VIOLATION_TAGS: HashMap<&'static [u8], ViolationKind> = HashMap::from([
        (&b"StdViol"[..], ViolationKind::Standard),
        (&b"FlowViol"[..], ViolationKind::FlowAnalysis),
        (&b"DupViol"[..], ViolationKind::DupCode),
        (&b"MetViol"[..], ViolationKind::Metric),
    ]);
}

/// One step of a flow-analysis path, or one copy of duplicated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathElement {
    pub file: Option<String>,
    pub line: Option<u32>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationPath {
    FlowAnalysis(Vec<PathElement>),
    DupCode(Vec<PathElement>),
    Leaf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub rule: Option<String>,
    pub message: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub path: ViolationPath,
}

impl Violation {
    /// Files this violation counts against: every distinct copy for duplicated
    /// code, the reported location otherwise.
    pub fn affected_files(&self) -> Vec<String> {
        match &self.path {
            ViolationPath::Leaf | ViolationPath::FlowAnalysis(_) => {
                self.file.iter().map(|f| normalize_file(f)).collect()
            }
            ViolationPath::DupCode(elements) => {
                let mut files: Vec<String> = Vec::new();
                for file in elements
                    .iter()
                    .filter_map(|element| element.file.as_deref())
                    .chain(self.file.as_deref())
                {
                    let file = normalize_file(file);
                    if !files.contains(&file) {
                        files.push(file);
                    }
                }
                files
            }
        }
    }
}

fn normalize_file(file: &str) -> String {
    file.trim().replace('\\', "/")
}

/// Violations by file path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViolationIndex {
    files: BTreeMap<String, Vec<Violation>>,
}

impl ViolationIndex {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn add(&mut self, violation: Violation) {
        let files = violation.affected_files();
        if let Some((last, rest)) = files.split_last() {
            for file in rest {
                self.files
                    .entry(file.clone())
                    .or_default()
                    .push(violation.clone());
            }
            self.files.entry(last.clone()).or_default().push(violation);
        }
    }

    pub fn add_index(&mut self, other: ViolationIndex) {
        for (file, violations) in other.files {
            self.files.entry(file).or_default().extend(violations);
        }
    }

    pub fn get<T: AsRef<str>>(&self, file: T) -> Option<&[Violation]> {
        self.files.get(file.as_ref()).map(Vec::as_slice)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Vec<Violation>> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl IntoIterator for ViolationIndex {
    type Item = (String, Vec<Violation>);
    type IntoIter = btree_map::IntoIter<String, Vec<Violation>>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

#[derive(Debug, Clone)]
struct OpenViolation {
    depth: usize,
    violation: Violation,
    elements: Vec<PathElement>,
}

#[derive(Debug, Clone, Default)]
pub struct ViolationParser {
    index: ViolationIndex,
    issues: Vec<ReportParseIssue>,
    current_violation: Option<OpenViolation>,
}

impl ViolationParser {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn index(&self) -> &ViolationIndex {
        &self.index
    }

    pub fn issues(&self) -> &[ReportParseIssue] {
        &self.issues
    }

    pub fn into_parts(self) -> (ViolationIndex, Vec<ReportParseIssue>) {
        (self.index, self.issues)
    }

    pub fn parse<R: BufRead>(&mut self, path: &str, xml: R) -> Result<(), ReportParseError> {
        let mut reader = DocumentReader::new(path, xml);
        while let Some((event, depth)) = reader.next_event()? {
            let handled = match event {
                Event::Start(e) => self.open_element(&e, depth),
                Event::Empty(e) => self.open_element(&e, depth).map(|keep_going| {
                    if keep_going {
                        self.close_element(depth);
                    }
                    keep_going
                }),
                Event::End(_) => {
                    self.close_element(depth);
                    Ok(true)
                }
                _ => Ok(true),
            };
            if !handled.map_err(|source| reader.encoding_error(source))? {
                break;
            }
        }
        Ok(())
    }

    fn open_element(&mut self, e: &BytesStart, depth: usize) -> quick_xml::Result<bool> {
        let local_name = e.local_name();
        let tag = local_name.as_ref();
        if depth == 1 {
            let root = tag_name(tag)?;
            if !ReportDialect::StaticAnalysis.accepts_root(&root) {
                self.issues.push(ReportParseIssue::UnexpectedRoot(root));
                return Ok(false);
            }
        }

        if let Some(open) = self.current_violation.as_mut() {
            if tag == TAG_PATH_ELEMENT {
                open.elements.push(PathElement {
                    file: match parse_attr::string(e, "srcRngFile")? {
                        Some(file) => Some(file),
                        None => parse_attr::string(e, "locFile")?,
                    },
                    line: parse_attr::number(e, "ln")?,
                    description: parse_attr::text_field(e, "desc")?,
                });
            }
        } else if let Some(kind) = VIOLATION_TAGS.get(tag) {
            self.current_violation = Some(OpenViolation {
                depth,
                violation: Violation {
                    kind: *kind,
                    rule: parse_attr::string(e, "rule")?,
                    message: parse_attr::text_field(e, "msg")?,
                    file: parse_attr::string(e, "locFile")?,
                    line: parse_attr::number(e, "ln")?,
                    path: ViolationPath::Leaf,
                },
                elements: Vec::new(),
            });
        }
        Ok(true)
    }

    fn close_element(&mut self, depth: usize) {
        if !self
            .current_violation
            .as_ref()
            .is_some_and(|open| open.depth == depth)
        {
            return;
        }
        let Some(OpenViolation {
            mut violation,
            elements,
            ..
        }) = self.current_violation.take()
        else {
            return;
        };

        violation.path = match violation.kind {
            ViolationKind::FlowAnalysis => ViolationPath::FlowAnalysis(elements),
            ViolationKind::DupCode => ViolationPath::DupCode(elements),
            ViolationKind::Standard | ViolationKind::Metric => ViolationPath::Leaf,
        };
        if violation.affected_files().is_empty() {
            self.issues.push(ReportParseIssue::ViolationLocationMissing);
        }
        self.index.add(violation);
    }
}
