use std::{
    fmt,
    path::{Component, Path, PathBuf},
    sync::OnceLock,
};

use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

/// Where a metric is attributed: a project file, or the project as a whole.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    Project,
    File(String),
}

impl Resource {
    pub fn file<T: AsRef<str>>(relative_path: T) -> Self {
        Resource::File(relative_path.as_ref().replace('\\', "/"))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Project => f.write_str("<project>"),
            Resource::File(path) => f.write_str(path),
        }
    }
}

/// Looks up a project-relative path. Implementations must be safe to share
/// between threads that only read from them.
pub trait ResourceResolver {
    fn resolve(&self, relative_path: &str) -> Option<Resource>;
}

impl<F> ResourceResolver for F
where
    F: Fn(&str) -> Option<Resource>,
{
    fn resolve(&self, relative_path: &str) -> Option<Resource> {
        self(relative_path)
    }
}

/// Resolves paths against files on disk under a project root.
///
/// `<root>/<path>` is tried first. Otherwise the tree is searched (hidden
/// entries skipped) for the single file ending with the whole `<path>`.
/// Absolute paths, written by tools on another machine, may also match by
/// ever shorter trailing parts. A part matching more than one file is never
/// used, and paths stepping out of the root through `..` never resolve.
#[derive(Debug)]
pub struct FsResolver {
    root: PathBuf,
    files: OnceLock<Vec<PathBuf>>,
}

impl FsResolver {
    pub fn new<T: Into<PathBuf>>(root: T) -> Self {
        Self {
            root: root.into(),
            files: OnceLock::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_files(&self) -> &[PathBuf] {
        self.files.get_or_init(|| {
            WalkDir::new(&self.root)
                .into_iter()
                .filter_entry(not_hidden)
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .filter_map(|entry| {
                    entry
                        .path()
                        .strip_prefix(&self.root)
                        .ok()
                        .map(Path::to_path_buf)
                })
                .collect()
        })
    }

    fn unique_suffix_match(&self, suffix: &Path) -> Option<&PathBuf> {
        let mut matches = self
            .project_files()
            .iter()
            .filter(|file| file.ends_with(suffix));
        match (matches.next(), matches.next()) {
            (Some(only_match), None) => Some(only_match),
            _ => None,
        }
    }
}

fn not_hidden(entry: &DirEntry) -> bool {
    entry.depth() == 0
        || entry
            .file_name()
            .to_str()
            .map(|name| !name.starts_with('.'))
            .unwrap_or(true)
}

/// `/abs/path` or `C:/abs/path`, separators already normalized.
fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/')
        || (bytes.len() > 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/')
}

impl ResourceResolver for FsResolver {
    fn resolve(&self, relative_path: &str) -> Option<Resource> {
        let path = relative_path.trim().replace('\\', "/");
        let absolute = is_absolute(&path);
        let relative_path = path.trim_start_matches('/');
        if relative_path.is_empty()
            || Path::new(relative_path)
                .components()
                .any(|component| component == Component::ParentDir)
        {
            return None;
        }
        if self.root.join(relative_path).is_file() {
            return Some(Resource::file(relative_path));
        }

        let components: Vec<&str> = relative_path.split('/').filter(|c| !c.is_empty()).collect();
        let shortest_suffix = if absolute { components.len() } else { 1 };
        (0..shortest_suffix)
            .map(|skip| components[skip..].join("/"))
            .find_map(|suffix| self.unique_suffix_match(Path::new(&suffix)))
            .and_then(|found| found.to_str().map(Resource::file))
    }
}
