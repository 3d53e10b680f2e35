//! Runtime configuration for dedupctl.
//!
//! Everything here defaults to the live system (/dev/mapper, /proc/mounts,
//! /etc/fstab) and can be redirected through DEDUPCTL_* environment
//! variables. Tests point the table paths at fabricated files instead of
//! touching real kernel state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Dedupctl configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding device-mapper nodes (default: /dev/mapper)
    pub mapper_dir: PathBuf,
    /// Root for logical-volume nodes, `<dev_dir>/<group>/<volume>`
    /// (default: /dev)
    pub dev_dir: PathBuf,
    /// Live mount table (default: /proc/mounts)
    pub live_table: PathBuf,
    /// Persistent mount configuration (default: /etc/fstab)
    pub config_table: PathBuf,
    /// Pause between stop and start during restart
    pub settle: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mapper_dir: PathBuf::from("/dev/mapper"),
            dev_dir: PathBuf::from("/dev"),
            live_table: PathBuf::from("/proc/mounts"),
            config_table: PathBuf::from("/etc/fstab"),
            settle: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = env_path("DEDUPCTL_MAPPER_DIR") {
            config.mapper_dir = dir;
        }
        if let Some(dir) = env_path("DEDUPCTL_DEV_DIR") {
            config.dev_dir = dir;
        }
        if let Some(path) = env_path("DEDUPCTL_MOUNT_TABLE") {
            config.live_table = path;
        }
        if let Some(path) = env_path("DEDUPCTL_FSTAB") {
            config.config_table = path;
        }
        if let Ok(secs) = env::var("DEDUPCTL_SETTLE_SECS") {
            if let Ok(secs) = secs.trim().parse::<u64>() {
                config.settle = Duration::from_secs(secs);
            }
        }

        config
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let value = env::var(key).ok()?;
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(PathBuf::from(value))
}
