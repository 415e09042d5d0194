//! Locating installed data files

use std::path::{Path, PathBuf};

use thiserror::Error;

/// The window layout description loaded at startup
pub const UI_FILE_NAME: &str = "main.ui";

/// Environment variable overriding the resource directory
pub const RESOURCES_ENV: &str = "DROPTERM_RESOURCES";

#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Required resource '{name}' not found (searched: {searched})")]
    Missing { name: String, searched: String },
}

/// Directories searched for resources, most specific first: the
/// `DROPTERM_RESOURCES` override, `resources/` next to the executable, the
/// install prefix share directory, then `extra` (typically the source tree).
pub fn search_dirs(extra: Option<&Path>) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(dir) = std::env::var_os(RESOURCES_ENV) {
        dirs.push(PathBuf::from(dir));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir.join("resources"));
        dirs.push(exe_dir.join("../share/dropterm"));
    }
    if let Some(extra) = extra {
        dirs.push(extra.to_path_buf());
    }
    dirs
}

/// First existing `name` in `dirs`
pub fn find_in(dirs: &[PathBuf], name: &str) -> Result<PathBuf, ResourceError> {
    dirs.iter()
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| ResourceError::Missing {
            name: name.to_string(),
            searched: dirs
                .iter()
                .map(|d| d.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_in_first_match_wins() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::write(b.path().join(UI_FILE_NAME), "<interface/>").unwrap();

        let dirs = vec![a.path().to_path_buf(), b.path().to_path_buf()];
        assert_eq!(find_in(&dirs, UI_FILE_NAME).unwrap(), b.path().join(UI_FILE_NAME));

        std::fs::write(a.path().join(UI_FILE_NAME), "<interface/>").unwrap();
        assert_eq!(find_in(&dirs, UI_FILE_NAME).unwrap(), a.path().join(UI_FILE_NAME));
    }

    #[test]
    fn test_find_in_missing() {
        let a = tempfile::tempdir().unwrap();
        let err = find_in(&[a.path().to_path_buf()], UI_FILE_NAME).unwrap_err();
        assert!(err.to_string().contains("main.ui"));
    }

    #[test]
    fn test_search_dirs_includes_extra_last() {
        let extra = PathBuf::from("/opt/dropterm-test");
        let dirs = search_dirs(Some(&extra));
        assert_eq!(dirs.last(), Some(&extra));
    }
}
