//! Topology report for the status command.
//!
//! One `DeviceReport` per active deduplicating device, carrying the mounts
//! directly on the device, the volume groups built on it, and each logical
//! volume with its own mounts. Printable as text, serializable to JSON.

use serde::Serialize;
use std::path::PathBuf;

/// One logical volume and the filesystems currently mounted on it.
#[derive(Debug, Clone, Serialize)]
pub struct VolumeReport {
    /// `group/volume` identifier.
    pub volume: String,
    pub mounts: Vec<PathBuf>,
}

/// Discovered topology of one deduplicating device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceReport {
    /// Mapper name of the device.
    pub device: String,
    /// Device node path.
    pub path: PathBuf,
    /// Filesystems mounted directly on the device.
    pub mounts: Vec<PathBuf>,
    pub volume_groups: Vec<String>,
    pub volumes: Vec<VolumeReport>,
}

/// Print the topology report to stdout.
pub fn print_text(reports: &[DeviceReport]) {
    if reports.is_empty() {
        println!("No active deduplicating devices.");
        return;
    }

    for report in reports {
        println!("Device {} ({})", report.device, report.path.display());
        for point in &report.mounts {
            println!("  mounted on: {}", point.display());
        }
        if report.volume_groups.is_empty() {
            println!("  no volume groups");
        } else {
            println!("  volume groups: {}", report.volume_groups.join(", "));
        }
        for volume in &report.volumes {
            println!("  {}", volume.volume);
            for point in &volume.mounts {
                println!("    mounted on: {}", point.display());
            }
        }
    }
}
