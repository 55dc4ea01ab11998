//! Error types for the lifeboat console.
//!
//! Two of these are fatal at startup (`DeviceUnavailable`,
//! `UnsupportedFormat`); the install-path variants are reported on screen
//! and return control to the menu. An input wait that runs out of time is
//! not an error and is represented as `None` by the queue, not here.

use std::io;

/// Errors produced by the lifeboat console.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    #[error("mount failure: {0}")]
    MountFailure(String),

    #[error("storage full: {0}")]
    StorageFull(String),

    #[error("package verification failed: {0}")]
    PackageVerificationFailed(String),

    #[error("package corrupt: {0}")]
    PackageCorrupt(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("install error: {0}")]
    Install(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConsoleError {
    /// Whether the console must exit instead of returning to the menu.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConsoleError::DeviceUnavailable(_) | ConsoleError::UnsupportedFormat(_)
        )
    }

    /// Message-catalog key for the user-facing report of this error.
    pub fn message_key(&self) -> &'static str {
        match self {
            ConsoleError::DeviceUnavailable(_) => "error.device",
            ConsoleError::UnsupportedFormat(_) => "error.format",
            ConsoleError::MountFailure(_) => "error.mount",
            ConsoleError::StorageFull(_) => "error.storage_full",
            ConsoleError::PackageVerificationFailed(_) => "error.verify",
            ConsoleError::PackageCorrupt(_) => "error.corrupt",
            ConsoleError::Config(_) => "error.config",
            ConsoleError::Install(_) => "error.install",
            ConsoleError::Io(_) => "error.io",
            ConsoleError::TomlParse(_) | ConsoleError::Json(_) => "error.config",
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ConsoleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_unavailable_display() {
        let e = ConsoleError::DeviceUnavailable("/dev/fb0: no such device".into());
        assert_eq!(
            format!("{e}"),
            "device unavailable: /dev/fb0: no such device"
        );
    }

    #[test]
    fn unsupported_format_display() {
        let e = ConsoleError::UnsupportedFormat("24 bpp".into());
        assert_eq!(format!("{e}"), "unsupported pixel format: 24 bpp");
    }

    #[test]
    fn mount_failure_display() {
        let e = ConsoleError::MountFailure("/sdcard".into());
        assert_eq!(format!("{e}"), "mount failure: /sdcard");
    }

    #[test]
    fn storage_full_display() {
        let e = ConsoleError::StorageFull("/cache".into());
        assert_eq!(format!("{e}"), "storage full: /cache");
    }

    #[test]
    fn verification_failed_display() {
        let e = ConsoleError::PackageVerificationFailed("bad signature".into());
        assert_eq!(format!("{e}"), "package verification failed: bad signature");
    }

    #[test]
    fn package_corrupt_display() {
        let e = ConsoleError::PackageCorrupt("truncated archive".into());
        assert_eq!(format!("{e}"), "package corrupt: truncated archive");
    }

    #[test]
    fn fatal_classification() {
        assert!(ConsoleError::DeviceUnavailable("x".into()).is_fatal());
        assert!(ConsoleError::UnsupportedFormat("x".into()).is_fatal());
        assert!(!ConsoleError::MountFailure("x".into()).is_fatal());
        assert!(!ConsoleError::PackageCorrupt("x".into()).is_fatal());
        assert!(!ConsoleError::StorageFull("x".into()).is_fatal());
    }

    #[test]
    fn message_keys_are_stable() {
        assert_eq!(
            ConsoleError::PackageCorrupt("x".into()).message_key(),
            "error.corrupt"
        );
        assert_eq!(
            ConsoleError::MountFailure("x".into()).message_key(),
            "error.mount"
        );
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: ConsoleError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let bad_toml = "this is [[[not valid toml";
        let toml_err = toml::from_str::<toml::Value>(bad_toml).unwrap_err();
        let e: ConsoleError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn json_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let e: ConsoleError = json_err.into();
        assert!(format!("{e}").contains("JSON error"));
    }

    #[test]
    fn result_alias_ok() {
        let r: Result<i32> = Ok(42);
        assert_eq!(r.unwrap(), 42);
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(ConsoleError::Config("oops".into()));
        assert!(r.is_err());
    }
}
