//! Centralized external-command execution.
//!
//! Every call into the storage toolchain (dmsetup, LVM, mount/umount) goes
//! through this module, so the orchestration logic never touches
//! `std::process` directly. The `ToolRunner` trait is the seam: production
//! code uses `SystemRunner`, tests substitute a fake that records
//! invocations and replays canned output.

use anyhow::{bail, Context, Result};
use std::process::Command;

/// Captured result of one external command.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit code, or -1 if terminated by signal.
    pub code: i32,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
}

impl ToolOutput {
    /// Returns true if the command exited successfully.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Non-empty diagnostic text, preferring stderr.
    pub fn diagnostic(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

/// Backend for running external tools.
///
/// A failed spawn (tool not installed) is an `Err`; a nonzero exit is a
/// normal `ToolOutput`. Callers decide which of the two matters.
pub trait ToolRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput>;
}

/// Runs commands against the real system.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// Echo each command line before running it.
    pub verbose: bool,
    /// Print commands without executing them; every call reports success.
    pub no_run: bool,
}

impl SystemRunner {
    pub fn new(verbose: bool, no_run: bool) -> Self {
        // no_run without verbose would run silently and do nothing
        Self {
            verbose: verbose || no_run,
            no_run,
        }
    }
}

impl ToolRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ToolOutput> {
        if self.verbose {
            println!("    {} {}", program, args.join(" "));
        }
        if self.no_run {
            return Ok(ToolOutput {
                code: 0,
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("Failed to execute '{program}'. Is it installed?"))?;

        Ok(ToolOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a command and require a zero exit status.
///
/// Used by the mutating bindings (mount, lvchange, vgchange); the discovery
/// queries inspect `ToolOutput` themselves because a nonzero exit there just
/// means "nothing found".
pub fn run_checked(runner: &dyn ToolRunner, program: &str, args: &[&str]) -> Result<()> {
    let out = runner.run(program, args)?;
    if out.success() {
        return Ok(());
    }
    let diagnostic = out.diagnostic();
    if diagnostic.is_empty() {
        bail!("'{program}' failed (exit code {})", out.code);
    }
    bail!("'{program}' failed (exit code {}): {diagnostic}", out.code);
}

/// Check if a program exists in PATH.
pub fn exists(program: &str) -> bool {
    which::which(program).is_ok()
}
