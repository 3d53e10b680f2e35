//! Device enumerator for active deduplicating mapper devices.
//!
//! The kernel exposes deduplicating block devices through device-mapper
//! with the `dedupe` target type. `dmsetup status` prints one
//! `name: start length target ...` row per mapped device; we keep the rows
//! whose target matches and return the mapper names.

use crate::process::ToolRunner;

/// Device-mapper target type registered by the deduplication module.
pub const DEDUPE_TARGET: &str = "dedupe";

/// List the mapper names of all currently active deduplicating devices.
///
/// Best-effort: if `dmsetup` is missing or exits nonzero the result is
/// empty, never an error. Order is whatever dmsetup printed.
pub fn list_active_devices(runner: &dyn ToolRunner) -> Vec<String> {
    match runner.run("dmsetup", &["status"]) {
        Ok(out) if out.success() => parse_status_table(&out.stdout),
        _ => Vec::new(),
    }
}

/// Returns true if the `dedupe` target is registered with device-mapper,
/// i.e. the kernel module is loaded.
pub fn target_registered(runner: &dyn ToolRunner) -> bool {
    match runner.run("dmsetup", &["targets"]) {
        Ok(out) if out.success() => out
            .stdout
            .lines()
            .any(|line| line.split_whitespace().next() == Some(DEDUPE_TARGET)),
        _ => false,
    }
}

/// Extract mapper names of `dedupe`-target rows from `dmsetup status`
/// output.
///
/// A status row looks like `vdo1: 0 41943040 dedupe online ...`; the name
/// is everything before the first colon and the target type is the third
/// field of the remainder. Rows without a colon (e.g. "No devices found")
/// are skipped.
fn parse_status_table(output: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in output.lines() {
        let Some((name, status)) = line.split_once(':') else {
            continue;
        };
        let target = status.split_whitespace().nth(2);
        if target == Some(DEDUPE_TARGET) {
            let name = name.trim();
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }
    names
}
