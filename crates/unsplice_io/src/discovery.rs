use std::fs;
use std::path::{Path, PathBuf};
use unsplice_core::Result;

pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "bin"];

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

/// Lists the regular files directly inside `dir` whose extension is in
/// `extensions`, sorted by name.
pub fn scan_directory(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Expands a mix of files and directories into the list of inputs to split.
///
/// Explicit files are taken as given, whatever their extension; directories
/// contribute their matching files. Duplicates are dropped, first one wins.
pub fn discover_inputs(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut inputs: Vec<PathBuf> = Vec::new();

    for path in paths {
        let found = if path.is_dir() {
            scan_directory(path, extensions)?
        } else {
            vec![path.clone()]
        };

        for file in found {
            if !inputs.contains(&file) {
                inputs.push(file);
            }
        }
    }

    tracing::debug!(count = inputs.len(), "discovered inputs");
    Ok(inputs)
}
