//! Mount locator and mount/unmount bindings.
//!
//! Two tables share one matching routine: the live mount table
//! (/proc/mounts) for what is mounted right now, and the persistent
//! configuration table (/etc/fstab) for what should be mounted. Table
//! entries store raw, possibly symlinked device paths, so both sides of
//! every comparison are canonicalized at comparison time rather than once
//! up front. A target that cannot be resolved matches nothing (resolving
//! it to an empty string would match everything).
//!
//! Mount-point fields escape whitespace as octal (`\040`); they are
//! decoded before the paths are returned.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::{run_checked, ToolRunner};

/// Mount points currently mounted from `device`, per the live table.
pub fn live_mounts_on(table: &Path, device: &Path) -> Vec<PathBuf> {
    mounts_matching(table, device, false)
}

/// Mount points configured (but not necessarily mounted) for `device`,
/// per the persistent table. Only device-path-style sources are
/// considered; fstab also carries LABEL=/UUID= and pseudo-fs entries.
pub fn configured_mounts_on(table: &Path, device: &Path) -> Vec<PathBuf> {
    mounts_matching(table, device, true)
}

/// Mount a configured filesystem by its mount point, letting the mount
/// table supply device and options.
pub fn mount(runner: &dyn ToolRunner, mount_point: &Path) -> Result<()> {
    let point = mount_point.to_string_lossy();
    run_checked(runner, "mount", &[point.as_ref()])
}

/// Forced, detached unmount (`umount -f -l`).
///
/// Teardown must not wedge on a busy filesystem; a lazy detach lets the
/// stop sequence proceed to volume deactivation.
pub fn unmount_detached(runner: &dyn ToolRunner, mount_point: &Path) -> Result<()> {
    let point = mount_point.to_string_lossy();
    run_checked(runner, "umount", &["-f", "-l", point.as_ref()])
}

fn mounts_matching(table: &Path, device: &Path, device_sources_only: bool) -> Vec<PathBuf> {
    let Ok(target) = fs::canonicalize(device) else {
        return Vec::new();
    };
    let Ok(content) = fs::read_to_string(table) else {
        return Vec::new();
    };

    let mut points = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(source), Some(mount_point)) = (fields.next(), fields.next()) else {
            continue;
        };
        if device_sources_only && !source.starts_with('/') {
            continue;
        }
        let source = unescape_table_field(source);
        let Ok(source) = fs::canonicalize(&source) else {
            continue;
        };
        if source == target {
            points.push(PathBuf::from(unescape_table_field(mount_point)));
        }
    }
    points
}

/// Decode octal escapes (`\040` for space etc.) in a mount-table field.
fn unescape_table_field(input: &str) -> String {
    let mut chars = input.chars().peekable();
    let mut output = String::with_capacity(input.len());

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }
        let mut oct = String::new();
        for _ in 0..3 {
            match chars.peek() {
                Some(next) if next.is_ascii_digit() => oct.push(chars.next().unwrap()),
                _ => break,
            }
        }
        match u8::from_str_radix(&oct, 8) {
            Ok(value) if oct.len() == 3 => output.push(value as char),
            _ => {
                output.push('\\');
                output.push_str(&oct);
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_unescape_decodes_octal_space() {
        assert_eq!(unescape_table_field("/mnt/my\\040data"), "/mnt/my data");
        assert_eq!(unescape_table_field("/mnt/data"), "/mnt/data");
        assert_eq!(unescape_table_field("a\\04b"), "a\\04b");
    }

    #[test]
    fn test_live_mounts_match_through_symlink() {
        let dir = tempdir().unwrap();
        let device = dir.path().join("dm-0");
        fs::write(&device, "").unwrap();
        let alias = dir.path().join("vdo1");
        std::os::unix::fs::symlink(&device, &alias).unwrap();

        let table = dir.path().join("mounts");
        fs::write(
            &table,
            format!("{} /mnt/data ext4 rw,relatime 0 0\n", device.display()),
        )
        .unwrap();

        // Query by the alias; the table records the real node.
        let points = live_mounts_on(&table, &alias);
        assert_eq!(points, vec![PathBuf::from("/mnt/data")]);
    }

    #[test]
    fn test_unresolvable_device_matches_nothing() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("mounts");
        fs::write(&table, "tmpfs /tmp tmpfs rw 0 0\n").unwrap();

        let missing = dir.path().join("no-such-device");
        assert!(live_mounts_on(&table, &missing).is_empty());
    }

    #[test]
    fn test_configured_mode_skips_non_device_sources() {
        let dir = tempdir().unwrap();
        let device = dir.path().join("dm-0");
        fs::write(&device, "").unwrap();

        let table = dir.path().join("fstab");
        fs::write(
            &table,
            format!(
                "# boot-time mounts\n\
                 UUID=0a52b1a4 / ext4 defaults 0 1\n\
                 tmpfs /tmp tmpfs rw 0 0\n\
                 {} /mnt/data ext4 defaults,noatime 0 2\n",
                device.display()
            ),
        )
        .unwrap();

        let points = configured_mounts_on(&table, &device);
        assert_eq!(points, vec![PathBuf::from("/mnt/data")]);
    }

    #[test]
    fn test_multiple_mount_points_per_device() {
        // Mount tables do not enforce uniqueness; neither do we.
        let dir = tempdir().unwrap();
        let device = dir.path().join("dm-0");
        fs::write(&device, "").unwrap();

        let table = dir.path().join("mounts");
        fs::write(
            &table,
            format!(
                "{dev} /mnt/a ext4 rw 0 0\n{dev} /mnt/b ext4 rw 0 0\n",
                dev = device.display()
            ),
        )
        .unwrap();

        let points = live_mounts_on(&table, &device);
        assert_eq!(
            points,
            vec![PathBuf::from("/mnt/a"), PathBuf::from("/mnt/b")]
        );
    }

    #[test]
    fn test_missing_table_is_empty() {
        let dir = tempdir().unwrap();
        let device = dir.path().join("dm-0");
        fs::write(&device, "").unwrap();
        assert!(live_mounts_on(&dir.path().join("absent"), &device).is_empty());
    }
}
