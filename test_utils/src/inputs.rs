use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn get_test_file_path(file: &str) -> String {
    PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap())
        .join(file)
        .to_str()
        .unwrap()
        .to_string()
}

/// Writes `contents` to `<dir>/<relative_path>`, creating parent directories.
pub fn write_file<T: AsRef<Path>>(dir: T, relative_path: &str, contents: &str) -> PathBuf {
    let path = dir.as_ref().join(relative_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Creates empty source files so a resolver can find them.
pub fn touch_files<T: AsRef<Path>>(dir: T, relative_paths: &[&str]) {
    for relative_path in relative_paths {
        write_file(dir.as_ref(), relative_path, "");
    }
}
