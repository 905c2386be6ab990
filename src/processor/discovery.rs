//! File discovery for CAT inputs
//!
//! Resolves an input path (a single file or a directory tree of Catastro
//! downloads) into the ordered list of CAT files to convert.

use crate::constants::{CAT_EXTENSION, GZIP_EXTENSION};
use crate::error::{CatError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File discovery component for CAT inputs
#[derive(Debug)]
pub struct FileDiscovery {
    input_path: PathBuf,
}

impl FileDiscovery {
    /// Create a new file discovery instance
    pub fn new(input_path: PathBuf) -> Self {
        Self { input_path }
    }

    /// Find every CAT file under the input path
    ///
    /// A file given directly is always returned, whatever its name. Inside
    /// directories only `*.cat` and `*.cat.gz` (any case) are picked up:
    /// ```text
    /// downloads/
    ///   28_079_U_2024-01-01.CAT.gz
    ///   28_079_R_2024-01-01.CAT.gz
    ///   old/
    ///     28_900_U_2019-01-01.cat
    /// ```
    pub fn discover_cat_files(&self) -> Result<Vec<PathBuf>> {
        if !self.input_path.exists() {
            return Err(CatError::NotFound {
                path: self.input_path.clone(),
            });
        }

        if self.input_path.is_file() {
            return Ok(vec![self.input_path.clone()]);
        }

        debug!("Searching for CAT files in: {}", self.input_path.display());

        let mut files = Vec::new();
        for entry in WalkDir::new(&self.input_path).follow_links(true) {
            let entry = entry.map_err(|e| CatError::Io(e.into()))?;
            if entry.file_type().is_file() && is_cat_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        debug!("Found {} CAT files", files.len());
        Ok(files)
    }
}

/// Check if a path names a plain or gzipped CAT file
pub fn is_cat_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_ascii_lowercase(),
        None => return false,
    };
    let plain_suffix = format!(".{}", CAT_EXTENSION);
    let gzip_suffix = format!(".{}.{}", CAT_EXTENSION, GZIP_EXTENSION);
    name.ends_with(&plain_suffix) || name.ends_with(&gzip_suffix)
}

/// File name without the `.cat` / `.cat.gz` suffix
pub fn cat_file_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());

    let lower = name.to_ascii_lowercase();
    for suffix in [
        format!(".{}.{}", CAT_EXTENSION, GZIP_EXTENSION),
        format!(".{}", CAT_EXTENSION),
        format!(".{}", GZIP_EXTENSION),
    ] {
        if lower.ends_with(&suffix) {
            return name[..name.len() - suffix.len()].to_string();
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Helper to create a download directory with mixed contents
    fn create_download_dir(temp_dir: &TempDir) -> PathBuf {
        let root = temp_dir.path().join("downloads");
        let nested = root.join("old");
        fs::create_dir_all(&nested).unwrap();

        fs::write(root.join("28_079_U_2024.CAT.gz"), "x").unwrap();
        fs::write(root.join("28_079_R_2024.cat"), "x").unwrap();
        fs::write(nested.join("28_900_U_2019.cat"), "x").unwrap();

        // Should be ignored
        fs::write(root.join("readme.txt"), "x").unwrap();
        fs::write(root.join("28_079_U_2024.zip"), "x").unwrap();

        root
    }

    #[test]
    fn test_discover_cat_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = create_download_dir(&temp_dir);

        let files = FileDiscovery::new(root).discover_cat_files().unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(files.len(), 3);
        assert!(names.contains(&"28_079_U_2024.CAT.gz".to_string()));
        assert!(names.contains(&"28_079_R_2024.cat".to_string()));
        assert!(names.contains(&"28_900_U_2019.cat".to_string()));
    }

    #[test]
    fn test_single_file_input_is_returned_as_is() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("export.txt");
        fs::write(&file, "01").unwrap();

        let files = FileDiscovery::new(file.clone()).discover_cat_files().unwrap();
        assert_eq!(files, vec![file]);
    }

    #[test]
    fn test_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        match FileDiscovery::new(missing.clone()).discover_cat_files() {
            Err(CatError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("Expected NotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_is_cat_file() {
        assert!(is_cat_file(Path::new("a.cat")));
        assert!(is_cat_file(Path::new("/x/A.CAT")));
        assert!(is_cat_file(Path::new("a.CAT.GZ")));
        assert!(!is_cat_file(Path::new("a.gz")));
        assert!(!is_cat_file(Path::new("a.cat.bz2")));
        assert!(!is_cat_file(Path::new("category")));
    }

    #[test]
    fn test_cat_file_stem() {
        assert_eq!(cat_file_stem(Path::new("28_079_U.CAT.gz")), "28_079_U");
        assert_eq!(cat_file_stem(Path::new("/x/28_079_R.cat")), "28_079_R");
        assert_eq!(cat_file_stem(Path::new("export.txt")), "export.txt");
    }
}
