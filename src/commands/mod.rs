//! CLI command handlers.
//!
//! Thin wrappers mapping each subcommand to a lifecycle traversal and an
//! exit code. Init-script conventions apply: start/restart/status exit 0
//! once they run, stop exits 2 when a volume-group deactivation failed.

use anyhow::Result;

use crate::config::Config;
use crate::lifecycle::{Lifecycle, Outcome};
use crate::process::{self, ToolRunner};
use crate::report;

const REQUIRED_TOOLS: &[&str] = &[
    "dmsetup", "vgscan", "pvs", "lvs", "lvchange", "vgchange", "mount", "umount",
];

/// Execute the start command.
pub fn cmd_start(runner: &dyn ToolRunner, config: &Config) -> u8 {
    warn_missing_tools();
    let outcome = Lifecycle::new(runner, config).start();
    summarize("Start", &outcome);
    0
}

/// Execute the stop command.
pub fn cmd_stop(runner: &dyn ToolRunner, config: &Config) -> u8 {
    warn_missing_tools();
    let outcome = Lifecycle::new(runner, config).stop();
    summarize("Stop", &outcome);
    if outcome.group_deactivation_failed {
        2
    } else {
        0
    }
}

/// Execute the restart command (also force-reload).
pub fn cmd_restart(runner: &dyn ToolRunner, config: &Config) -> u8 {
    warn_missing_tools();
    let outcome = Lifecycle::new(runner, config).restart();
    summarize("Restart", &outcome);
    0
}

/// Execute the status command.
pub fn cmd_status(runner: &dyn ToolRunner, config: &Config, json: bool) -> Result<u8> {
    let reports = Lifecycle::new(runner, config).status();
    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        report::print_text(&reports);
    }
    Ok(0)
}

fn summarize(operation: &str, outcome: &Outcome) {
    if outcome.success() {
        println!("{operation} complete.");
    } else {
        println!(
            "{operation} finished with {} failed step(s).",
            outcome.failed_steps
        );
    }
}

/// Warn about storage tools missing from PATH. Non-fatal; discovery on a
/// system without them degrades to empty results anyway.
fn warn_missing_tools() {
    for tool in REQUIRED_TOOLS {
        if !process::exists(tool) {
            eprintln!("Warning: '{tool}' not found in PATH");
        }
    }
}
