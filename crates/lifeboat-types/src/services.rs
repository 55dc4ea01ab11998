//! Service traits bounding the console's external collaborators.
//!
//! The package installer, volume manager, host link and init supervisor are
//! separate components on a real device. The console dispatches to them only
//! through these traits; tests substitute mocks, and the binary wires up
//! thin host implementations.

use std::path::{Path, PathBuf};

use crate::error::Result;

// ---------------------------------------------------------------------------
// Package installer
// ---------------------------------------------------------------------------

/// Verifies and applies update archives.
pub trait PackageInstaller {
    /// Check archive integrity and signature before anything is written.
    fn verify(&self, package: &Path) -> Result<()>;

    /// Apply a verified archive. `on_progress` receives fractions in 0..=1.
    fn apply(&mut self, package: &Path, on_progress: &mut dyn FnMut(f32)) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Volume manager
// ---------------------------------------------------------------------------

/// Mounts, unmounts and formats storage volumes.
pub trait VolumeMounter {
    /// Mount the volume holding `mount_point`.
    fn mount(&mut self, mount_point: &str) -> Result<()>;

    /// Unmount a previously mounted volume.
    fn unmount(&mut self, mount_point: &str) -> Result<()>;

    fn is_mounted(&self, mount_point: &str) -> bool;

    /// Free bytes available on a mounted volume.
    fn free_bytes(&self, mount_point: &str) -> Result<u64>;

    /// Recreate the filesystem on a volume, destroying its contents.
    fn format(&mut self, mount_point: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Host link
// ---------------------------------------------------------------------------

/// The cable connection to a host machine.
pub trait HostLink {
    /// Whether a host cable is currently attached. While this is true the
    /// input wait never times out.
    fn cable_attached(&self) -> bool;

    /// Block until the host finishes streaming a package over the cable and
    /// return the local path it was staged at.
    fn receive_package(&mut self) -> Result<PathBuf>;
}

// ---------------------------------------------------------------------------
// Power control
// ---------------------------------------------------------------------------

/// Where a reboot should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootTarget {
    /// Normal system boot.
    System,
    /// Back into the bootloader.
    Bootloader,
    /// Back into this console.
    Recovery,
}

impl std::fmt::Display for RebootTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Bootloader => write!(f, "bootloader"),
            Self::Recovery => write!(f, "recovery"),
        }
    }
}

/// Requests power transitions from the init supervisor.
pub trait PowerControl {
    fn reboot(&mut self, target: RebootTarget) -> Result<()>;

    fn shutdown(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reboot_target_display() {
        assert_eq!(format!("{}", RebootTarget::System), "system");
        assert_eq!(format!("{}", RebootTarget::Bootloader), "bootloader");
        assert_eq!(format!("{}", RebootTarget::Recovery), "recovery");
    }

    #[test]
    fn traits_are_object_safe() {
        // The console stores collaborators as boxed trait objects.
        fn _takes(
            _: &dyn PackageInstaller,
            _: &dyn VolumeMounter,
            _: &dyn HostLink,
            _: &dyn PowerControl,
        ) {
        }
    }
}
