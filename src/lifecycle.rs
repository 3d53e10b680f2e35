//! Lifecycle orchestration over the discovered storage graph.
//!
//! Each operation is a single traversal: enumerate the active
//! deduplicating devices, resolve the volume groups and logical volumes
//! layered on each one, and locate mounts at every tier. Activation walks
//! the graph bottom-up (groups and volumes first, leaf mounts last);
//! deactivation replays it top-down (leaf mounts first, volume groups
//! last). Nothing is cached between traversals; every run discovers a
//! fresh view of external state.
//!
//! Everything is strictly sequential. LVM metadata operations are not safe
//! to run concurrently, and teardown correctness depends on unmounting a
//! leaf before deactivating its parent volume.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::thread;

use crate::config::Config;
use crate::process::ToolRunner;
use crate::report::{DeviceReport, VolumeReport};
use crate::{dedup, lvm, mounts};

/// Aggregate result of a start or stop traversal.
///
/// Individual step failures are reported inline and counted here without
/// aborting the traversal. Volume-group deactivation is the one step whose
/// failure is fatal to the operation's exit status: a group left active
/// blocks teardown of the device underneath it.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// Mutating steps that reported failure.
    pub failed_steps: usize,
    /// Set when any volume-group deactivation failed during stop.
    pub group_deactivation_failed: bool,
}

impl Outcome {
    pub fn success(&self) -> bool {
        self.failed_steps == 0 && !self.group_deactivation_failed
    }
}

/// One start/stop/status/restart traversal over the storage stack.
pub struct Lifecycle<'a> {
    runner: &'a dyn ToolRunner,
    config: &'a Config,
}

impl<'a> Lifecycle<'a> {
    pub fn new(runner: &'a dyn ToolRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    /// Bring every deduplicating device's stack online, bottom-up.
    ///
    /// Filesystems configured directly on a device have no LVM dependency
    /// and are mounted before the device's volumes are activated, matching
    /// the boot-script ordering.
    pub fn start(&self) -> Outcome {
        let mut outcome = Outcome::default();

        if !dedup::target_registered(self.runner) {
            eprintln!(
                "Warning: {} device-mapper target not registered; is the kernel module loaded?",
                dedup::DEDUPE_TARGET
            );
        }
        if let Err(err) = lvm::rescan(self.runner) {
            eprintln!("Warning: volume rescan failed: {err:#}");
        }

        let devices = dedup::list_active_devices(self.runner);
        if devices.is_empty() {
            println!("No active deduplicating devices.");
        }
        for name in devices {
            println!("Starting stack on {name}:");
            let device = self.config.mapper_dir.join(&name);
            self.mount_configured(&device, &mut outcome);

            let groups = lvm::volume_groups_on(self.runner, &device);
            let volumes = lvm::logical_volumes_in(self.runner, &groups);
            if !volumes.is_empty() {
                let label = format!("activate {}", join_names(volumes.iter()));
                self.step(&label, lvm::activate_volumes(self.runner, &volumes), &mut outcome);
            }
            for volume in &volumes {
                self.mount_configured(&self.volume_node(volume), &mut outcome);
            }
        }

        outcome
    }

    /// Take every deduplicating device's stack offline, top-down.
    pub fn stop(&self) -> Outcome {
        let mut outcome = Outcome::default();

        for name in dedup::list_active_devices(self.runner) {
            println!("Stopping stack on {name}:");
            let device = self.config.mapper_dir.join(&name);
            self.unmount_live(&device, &mut outcome);

            let groups = lvm::volume_groups_on(self.runner, &device);
            let volumes = lvm::logical_volumes_in(self.runner, &groups);
            for volume in &volumes {
                self.unmount_live(&self.volume_node(volume), &mut outcome);
                let label = format!("deactivate {volume}");
                self.step(&label, lvm::deactivate_volume(self.runner, volume), &mut outcome);
            }

            if !groups.is_empty() {
                let label = format!("deactivate volume group {}", join_names(groups.iter()));
                let ok = self.step(&label, lvm::deactivate_groups(self.runner, &groups), &mut outcome);
                if !ok {
                    outcome.group_deactivation_failed = true;
                }
            }
        }

        outcome
    }

    /// Stop, settle, then start. Not transactional: a partial stop does
    /// not prevent the start pass, and the result reported is start's.
    pub fn restart(&self) -> Outcome {
        let stop = self.stop();
        if !stop.success() {
            eprintln!("Warning: stop finished with failures; starting anyway");
        }
        thread::sleep(self.config.settle);
        self.start()
    }

    /// Read-only traversal reporting the current topology per device.
    pub fn status(&self) -> Vec<DeviceReport> {
        let mut reports = Vec::new();
        for name in dedup::list_active_devices(self.runner) {
            let device = self.config.mapper_dir.join(&name);
            let groups = lvm::volume_groups_on(self.runner, &device);
            let volumes = lvm::logical_volumes_in(self.runner, &groups);

            let volume_reports = volumes
                .iter()
                .map(|volume| VolumeReport {
                    volume: volume.clone(),
                    mounts: mounts::live_mounts_on(&self.config.live_table, &self.volume_node(volume)),
                })
                .collect();

            reports.push(DeviceReport {
                device: name,
                mounts: mounts::live_mounts_on(&self.config.live_table, &device),
                path: device,
                volume_groups: groups.into_iter().collect(),
                volumes: volume_reports,
            });
        }
        reports
    }

    /// Device node for a `group/volume` identifier.
    fn volume_node(&self, volume: &str) -> PathBuf {
        self.config.dev_dir.join(volume)
    }

    /// Mount every filesystem configured for `device` that is not already
    /// in the live table. Skipping live entries keeps repeated starts
    /// idempotent instead of erroring on already-mounted filesystems.
    fn mount_configured(&self, device: &Path, outcome: &mut Outcome) {
        let live = mounts::live_mounts_on(&self.config.live_table, device);
        for point in mounts::configured_mounts_on(&self.config.config_table, device) {
            if live.contains(&point) {
                println!("  {} already mounted", point.display());
                continue;
            }
            let label = format!("mount {}", point.display());
            self.step(&label, mounts::mount(self.runner, &point), outcome);
        }
    }

    /// Force-detach-unmount every live mount on `device`.
    fn unmount_live(&self, device: &Path, outcome: &mut Outcome) {
        for point in mounts::live_mounts_on(&self.config.live_table, device) {
            let label = format!("unmount {}", point.display());
            self.step(&label, mounts::unmount_detached(self.runner, &point), outcome);
        }
    }

    /// Report one mutating step and fold its result into the outcome.
    fn step(&self, label: &str, result: Result<()>, outcome: &mut Outcome) -> bool {
        match result {
            Ok(()) => {
                println!("  {label}: OK");
                true
            }
            Err(err) => {
                eprintln!("  {label}: FAILED ({err:#})");
                outcome.failed_steps += 1;
                false
            }
        }
    }
}

fn join_names<'n>(names: impl Iterator<Item = &'n String>) -> String {
    names.map(String::as_str).collect::<Vec<_>>().join(" ")
}
