//! End-of-session artifacts: rotated logs, install results, intent file.
//!
//! These are plain files on the cache partition, read by the main system
//! after reboot. Logs carry mode 0600 because they can contain package
//! paths and device state the shipped system treats as private.

use std::fs;
use std::path::{Path, PathBuf};

use lifeboat_types::error::Result;

const LOG_MODE: u32 = 0o600;

/// Copy the rolling session log to the "most recent completed" location.
///
/// Both files end up with restrictive permissions. A session that never
/// wrote a log (display-only boot) is fine; there is nothing to rotate.
pub fn finalize_session_log(log_path: &Path, last_log_path: &Path) -> Result<()> {
    if !log_path.exists() {
        log::debug!("no session log at {} to rotate", log_path.display());
        return Ok(());
    }
    if let Some(parent) = last_log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(log_path, last_log_path)?;
    set_log_mode(log_path)?;
    set_log_mode(last_log_path)?;
    Ok(())
}

#[cfg(unix)]
fn set_log_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(LOG_MODE))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_log_mode(_path: &Path) -> Result<()> {
    Ok(())
}

/// Write the one-byte result file for package `index`.
///
/// The first package uses the configured path itself; later packages in a
/// batch append `.1`, `.2`, ... so each attempt leaves its own verdict.
pub fn write_install_result(base: &Path, index: usize, success: bool) -> Result<()> {
    let path = result_path(base, index);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, if success { b"1" } else { b"0" })?;
    Ok(())
}

fn result_path(base: &Path, index: usize) -> PathBuf {
    if index == 0 {
        base.to_path_buf()
    } else {
        let mut name = base.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }
}

/// Persist the `--send_intent` payload for the booted system to read.
pub fn write_intent(path: &Path, intent: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, intent)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o7777
    }

    #[test]
    fn finalize_copies_and_restricts() {
        let dir = tempdir().expect("tempdir");
        let log = dir.path().join("log");
        let last = dir.path().join("last_log");
        fs::write(&log, "install ok\n").unwrap();

        finalize_session_log(&log, &last).unwrap();

        assert_eq!(fs::read_to_string(&last).unwrap(), "install ok\n");
        #[cfg(unix)]
        {
            assert_eq!(mode_of(&log), 0o600);
            assert_eq!(mode_of(&last), 0o600);
        }
    }

    #[test]
    fn finalize_without_a_log_is_a_noop() {
        let dir = tempdir().expect("tempdir");
        let log = dir.path().join("never-written");
        let last = dir.path().join("last_log");
        finalize_session_log(&log, &last).unwrap();
        assert!(!last.exists());
    }

    #[test]
    fn first_result_uses_the_base_path() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("last_install");
        write_install_result(&base, 0, true).unwrap();
        assert_eq!(fs::read(&base).unwrap(), b"1");
    }

    #[test]
    fn later_results_get_indexed_names() {
        let dir = tempdir().expect("tempdir");
        let base = dir.path().join("last_install");
        write_install_result(&base, 0, true).unwrap();
        write_install_result(&base, 1, false).unwrap();
        write_install_result(&base, 2, true).unwrap();
        assert_eq!(fs::read(dir.path().join("last_install.1")).unwrap(), b"0");
        assert_eq!(fs::read(dir.path().join("last_install.2")).unwrap(), b"1");
    }

    #[test]
    fn intent_file_holds_the_payload() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("intent");
        write_intent(&path, "system_update_complete").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "system_update_complete"
        );
    }
}
