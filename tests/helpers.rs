//! Shared test utilities for dedupctl tests.
//!
//! `FakeRunner` replays canned tool output and records every invocation in
//! order, so tests can assert both what the orchestrator discovered and
//! the exact sequence of external commands it issued. `StackEnv` fabricates
//! the filesystem side: mapper/device nodes and mount tables under a
//! tempdir.

use anyhow::Result;
use dedupctl::config::Config;
use dedupctl::process::{ToolOutput, ToolRunner};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tempfile::TempDir;

/// Tool runner with canned responses, keyed by command-line prefix.
#[derive(Default)]
pub struct FakeRunner {
    rules: Vec<(String, ToolOutput)>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for command lines starting with `prefix`.
    pub fn on(mut self, prefix: &str, stdout: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            ToolOutput {
                code: 0,
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        ));
        self
    }

    /// Fail with exit code 5 and `stderr` for matching command lines.
    pub fn fail_on(mut self, prefix: &str, stderr: &str) -> Self {
        self.rules.push((
            prefix.to_string(),
            ToolOutput {
                code: 5,
                stdout: String::new(),
                stderr: stderr.to_string(),
            },
        ));
        self
    }

    /// Every command line issued so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first call starting with `prefix`.
    pub fn index_of(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    /// Number of calls starting with `prefix`.
    pub fn count_of(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

impl ToolRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line.clone());

        for (prefix, output) in &self.rules {
            if line.starts_with(prefix.as_str()) {
                return Ok(output.clone());
            }
        }
        // Unmatched commands succeed silently, like --no-run mode.
        Ok(ToolOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

/// Fabricated device nodes and mount tables under a tempdir.
pub struct StackEnv {
    /// Kept alive for the lifetime of the environment.
    pub _temp: TempDir,
    pub mapper_dir: PathBuf,
    pub dev_dir: PathBuf,
    pub live_table: PathBuf,
    pub config_table: PathBuf,
}

impl StackEnv {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create tempdir");
        let base = temp.path();

        let mapper_dir = base.join("mapper");
        let dev_dir = base.join("dev");
        fs::create_dir_all(&mapper_dir).expect("create mapper dir");
        fs::create_dir_all(&dev_dir).expect("create dev dir");

        let live_table = base.join("mounts");
        let config_table = base.join("fstab");
        fs::write(&live_table, "").expect("create live table");
        fs::write(&config_table, "").expect("create config table");

        Self {
            _temp: temp,
            mapper_dir,
            dev_dir,
            live_table,
            config_table,
        }
    }

    /// Config pointing at this environment, with a zero settle delay.
    pub fn config(&self) -> Config {
        Config {
            mapper_dir: self.mapper_dir.clone(),
            dev_dir: self.dev_dir.clone(),
            live_table: self.live_table.clone(),
            config_table: self.config_table.clone(),
            settle: Duration::ZERO,
        }
    }

    /// Create a fake mapper device node and return its path.
    pub fn add_device(&self, name: &str) -> PathBuf {
        let path = self.mapper_dir.join(name);
        fs::write(&path, "").expect("create device node");
        path
    }

    /// Create a fake logical-volume node and return its path.
    pub fn add_volume(&self, group: &str, volume: &str) -> PathBuf {
        let group_dir = self.dev_dir.join(group);
        fs::create_dir_all(&group_dir).expect("create group dir");
        let path = group_dir.join(volume);
        fs::write(&path, "").expect("create volume node");
        path
    }

    /// Replace the live mount table with the given (device, mount point)
    /// entries.
    pub fn set_live(&self, entries: &[(&Path, &str)]) {
        fs::write(&self.live_table, render_table(entries)).expect("write live table");
    }

    /// Replace the persistent mount configuration with the given entries.
    pub fn set_configured(&self, entries: &[(&Path, &str)]) {
        fs::write(&self.config_table, render_table(entries)).expect("write config table");
    }
}

fn render_table(entries: &[(&Path, &str)]) -> String {
    let mut table = String::new();
    for (device, mount_point) in entries {
        table.push_str(&format!(
            "{} {} ext4 defaults 0 0\n",
            device.display(),
            mount_point
        ));
    }
    table
}

/// `dmsetup status` output for a list of (name, target) rows.
pub fn dmsetup_status(rows: &[(&str, &str)]) -> String {
    rows.iter()
        .map(|(name, target)| format!("{name}: 0 41943040 {target} online\n"))
        .collect()
}
