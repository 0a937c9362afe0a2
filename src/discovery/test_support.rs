//! Throwaway Python source trees for discovery tests.

use std::fs::{create_dir_all, write};

/// Write each `(relative path, contents)` pair under a fresh temporary
/// directory, creating parent directories as needed.
pub fn make_tree(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel_path, contents) in files {
        let path = dir.path().join(rel_path);
        create_dir_all(path.parent().unwrap()).unwrap();
        write(path, contents).unwrap();
    }
    dir
}
