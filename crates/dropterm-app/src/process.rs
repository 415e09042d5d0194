//! Process queries

use std::path::PathBuf;

/// Current working directory of a process, read from `/proc/<pid>/cwd`.
/// None when the process is gone or the platform has no procfs.
pub fn process_cwd(pid: i32) -> Option<PathBuf> {
    if pid <= 0 {
        return None;
    }
    std::fs::read_link(format!("/proc/{}/cwd", pid)).ok()
}
