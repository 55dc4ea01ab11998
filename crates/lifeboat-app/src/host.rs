//! Thin host-side service implementations.
//!
//! On a production device the heavy lifting behind these traits lives in
//! separate components: the vendor updater applies payloads, init performs
//! power transitions, and a USB gadget daemon streams sideload packages.
//! The implementations here do the parts the console itself is responsible
//! for (integrity checks, staging I/O, wipe semantics) and log the requests
//! it can only forward.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use lifeboat_types::error::{ConsoleError, Result};
use lifeboat_types::services::{
    HostLink, PackageInstaller, PowerControl, RebootTarget, VolumeMounter,
};

/// Update archives are zip files; anything else is rejected before the
/// expensive streaming pass.
const PACKAGE_MAGIC: [u8; 4] = *b"PK\x03\x04";

const APPLY_CHUNK: usize = 64 * 1024;

/// Installer that verifies archive integrity and streams the payload.
///
/// Payload execution is delegated to the device updater on real builds;
/// this implementation performs the console's own half of the contract:
/// magic and size checks up front, then a full read of the archive with
/// progress callbacks.
#[derive(Debug, Default)]
pub struct HostInstaller;

impl PackageInstaller for HostInstaller {
    fn verify(&self, package: &Path) -> Result<()> {
        let mut file = File::open(package)
            .map_err(|e| ConsoleError::PackageCorrupt(format!("{}: {e}", package.display())))?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(ConsoleError::PackageCorrupt(format!(
                "{}: empty archive",
                package.display()
            )));
        }
        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)
            .map_err(|e| ConsoleError::PackageCorrupt(format!("{}: {e}", package.display())))?;
        if magic != PACKAGE_MAGIC {
            return Err(ConsoleError::PackageVerificationFailed(format!(
                "{}: not an update archive",
                package.display()
            )));
        }
        Ok(())
    }

    fn apply(&mut self, package: &Path, on_progress: &mut dyn FnMut(f32)) -> Result<()> {
        let mut file = File::open(package)?;
        let total = file.metadata()?.len().max(1);
        let mut buf = vec![0u8; APPLY_CHUNK];
        let mut done = 0u64;
        on_progress(0.0);
        loop {
            let n = file.read(&mut buf)?;
            if n == 0 {
                break;
            }
            done += n as u64;
            on_progress((done as f64 / total as f64) as f32);
        }
        on_progress(1.0);
        log::info!("applied {} ({done} bytes)", package.display());
        Ok(())
    }
}

/// Volume manager over mount points prepared by init.
///
/// The recovery ramdisk mounts its volumes before handing over; this
/// tracks which of them the console is using and owns the destructive
/// wipe path.
#[derive(Debug, Default)]
pub struct HostVolumes {
    mounted: HashSet<String>,
}

impl VolumeMounter for HostVolumes {
    fn mount(&mut self, mount_point: &str) -> Result<()> {
        if self.mounted.contains(mount_point) {
            return Ok(());
        }
        if !Path::new(mount_point).is_dir() {
            return Err(ConsoleError::MountFailure(mount_point.to_string()));
        }
        self.mounted.insert(mount_point.to_string());
        log::info!("mounted {mount_point}");
        Ok(())
    }

    fn unmount(&mut self, mount_point: &str) -> Result<()> {
        if !self.mounted.remove(mount_point) {
            log::debug!("unmount of {mount_point}, which was not mounted");
        }
        Ok(())
    }

    fn is_mounted(&self, mount_point: &str) -> bool {
        self.mounted.contains(mount_point)
    }

    #[cfg(target_os = "linux")]
    fn free_bytes(&self, mount_point: &str) -> Result<u64> {
        if !self.mounted.contains(mount_point) {
            return Err(ConsoleError::MountFailure(mount_point.to_string()));
        }
        let stat = nix::sys::statvfs::statvfs(mount_point)
            .map_err(|e| ConsoleError::MountFailure(format!("{mount_point}: {e}")))?;
        Ok(stat.blocks_available() as u64 * stat.fragment_size() as u64)
    }

    #[cfg(not(target_os = "linux"))]
    fn free_bytes(&self, mount_point: &str) -> Result<u64> {
        if !self.mounted.contains(mount_point) {
            return Err(ConsoleError::MountFailure(mount_point.to_string()));
        }
        Ok(u64::MAX)
    }

    fn format(&mut self, mount_point: &str) -> Result<()> {
        // Wipe by emptying the tree under the mount point; recreating the
        // filesystem itself is the bootloader's business.
        let root = Path::new(mount_point);
        if !root.is_dir() {
            return Err(ConsoleError::MountFailure(mount_point.to_string()));
        }
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)?;
            }
        }
        log::info!("formatted {mount_point}");
        Ok(())
    }
}

/// Host link for builds without a cable transport daemon.
#[derive(Debug, Default)]
pub struct DisconnectedHost;

impl HostLink for DisconnectedHost {
    fn cable_attached(&self) -> bool {
        false
    }

    fn receive_package(&mut self) -> Result<PathBuf> {
        Err(ConsoleError::Install(
            "no host transport configured".to_string(),
        ))
    }
}

/// Power control that records the request for the init supervisor.
///
/// Init watches the console's exit and performs the actual transition, so
/// the process only has to stop cleanly after logging where to go.
#[derive(Debug, Default)]
pub struct HostPower;

impl PowerControl for HostPower {
    fn reboot(&mut self, target: RebootTarget) -> Result<()> {
        log::info!("reboot requested, target {target}");
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        log::info!("shutdown requested");
        Ok(())
    }
}
