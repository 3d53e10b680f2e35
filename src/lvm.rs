//! Volume graph resolution and LVM lifecycle bindings.
//!
//! Nothing declares which volume groups sit on a deduplicating device; the
//! mapping is reconstructed on every operation from the volume manager's
//! live view (`pvs` restricted to the canonical device path, then `lvs`
//! restricted to the discovered groups). Group and volume membership can
//! change between boots, so nothing here is ever cached.
//!
//! Discovery queries are best-effort and return empty collections on any
//! miss. The mutating bindings (`activate_volumes`, `deactivate_volume`,
//! `deactivate_groups`, `rescan`) return a `Result` that the orchestrator
//! aggregates.

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::process::{run_checked, ToolRunner};

/// Discover the volume groups with a physical volume on `device`.
///
/// The device is resolved to its canonical path first; `/dev/mapper/vdo1`
/// and its `/dev/dm-*` node must land on the same `pvs` row. An
/// unresolvable device yields an empty set without querying.
pub fn volume_groups_on(runner: &dyn ToolRunner, device: &Path) -> BTreeSet<String> {
    let Ok(canonical) = fs::canonicalize(device) else {
        return BTreeSet::new();
    };
    let canonical = canonical.to_string_lossy();
    match runner.run("pvs", &["--noheadings", "-o", "vg_name", canonical.as_ref()]) {
        Ok(out) if out.success() => parse_group_names(&out.stdout),
        _ => BTreeSet::new(),
    }
}

/// Discover the logical volumes carved from `groups`, as `group/volume`
/// identifiers.
///
/// An empty group set short-circuits to an empty result: `lvs` with no
/// positional filter would report every volume on the system.
pub fn logical_volumes_in(runner: &dyn ToolRunner, groups: &BTreeSet<String>) -> BTreeSet<String> {
    if groups.is_empty() {
        return BTreeSet::new();
    }
    let mut args: Vec<&str> = vec!["--noheadings", "-o", "vg_name,lv_name"];
    args.extend(groups.iter().map(String::as_str));
    match runner.run("lvs", &args) {
        Ok(out) if out.success() => parse_volume_pairs(&out.stdout),
        _ => BTreeSet::new(),
    }
}

/// Activate a batch of logical volumes (`lvchange -ay`).
pub fn activate_volumes(runner: &dyn ToolRunner, volumes: &BTreeSet<String>) -> Result<()> {
    let mut args: Vec<&str> = vec!["-ay"];
    args.extend(volumes.iter().map(String::as_str));
    run_checked(runner, "lvchange", &args)
}

/// Deactivate a single logical volume (`lvchange -an group/volume`).
pub fn deactivate_volume(runner: &dyn ToolRunner, volume: &str) -> Result<()> {
    run_checked(runner, "lvchange", &["-an", volume])
}

/// Deactivate a batch of volume groups (`vgchange -an`).
///
/// This is the one teardown step the stop sequence treats as fatal: a
/// group left active pins the deduplicating device underneath it.
pub fn deactivate_groups(runner: &dyn ToolRunner, groups: &BTreeSet<String>) -> Result<()> {
    let mut args: Vec<&str> = vec!["-an"];
    args.extend(groups.iter().map(String::as_str));
    run_checked(runner, "vgchange", &args)
}

/// Refresh the volume manager's device view and recreate missing volume
/// nodes. Run before start; best-effort.
pub fn rescan(runner: &dyn ToolRunner) -> Result<()> {
    run_checked(runner, "vgscan", &["--mknodes"])
}

fn parse_group_names(output: &str) -> BTreeSet<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_volume_pairs(output: &str) -> BTreeSet<String> {
    let mut volumes = BTreeSet::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        if let (Some(group), Some(volume)) = (fields.next(), fields.next()) {
            volumes.insert(format!("{group}/{volume}"));
        }
    }
    volumes
}
