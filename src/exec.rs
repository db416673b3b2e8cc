//! Process execution: the [`Executor`] abstraction and its system-backed
//! implementation.
//!
//! The engine only ever shells out for two things: running topic `install.sh`
//! scripts and asking ambient tools (git) about repository state.  Both go
//! through [`Executor`] so orchestration logic can be tested without spawning
//! processes.
use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{Command, Output};

/// Captured outcome of a finished process.
#[derive(Debug)]
pub struct ExecResult {
    /// Captured standard output, lossily decoded.
    pub stdout: String,
    /// Captured standard error, lossily decoded.
    pub stderr: String,
    /// Whether the command exited successfully.
    pub success: bool,
    /// Exit code, if the process terminated normally.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution.
pub trait Executor: Send + Sync {
    /// Run a command in a specific directory. Fails if the command exits
    /// non-zero; the error message carries the exit code and trailing stderr.
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns the result without bailing).
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl SystemExecutor {
    /// Spawn `cmd`, wait for it, and capture its output.  Spawn failures
    /// (program not found, permission) error here; a non-zero exit does not.
    fn spawn(cmd: &mut Command, label: &str) -> Result<ExecResult> {
        let output = cmd
            .output()
            .with_context(|| format!("could not spawn {label}"))?;
        Ok(ExecResult::from(output))
    }
}

impl Executor for SystemExecutor {
    fn run_in(&self, dir: &Path, program: &str, args: &[&str]) -> Result<ExecResult> {
        let label = format!("{program} in {}", dir.display());
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(dir);
        let result = Self::spawn(&mut cmd, &label)?;
        if result.success {
            return Ok(result);
        }
        match result.code {
            Some(code) => bail!("{label}: exit {code}: {}", result.stderr.trim()),
            None => bail!("{label}: killed by signal: {}", result.stderr.trim()),
        }
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        Self::spawn(&mut cmd, program)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Shared executor doubles for unit tests.
#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod test_helpers {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use super::{ExecResult, Executor};

    /// Scriptable executor that records `run_in` invocations.
    ///
    /// `which()` returns the configured `which_result` value (default:
    /// `false`), so orchestration that guards on tool availability skips
    /// unless explicitly enabled.  `run_in` records the working directory it
    /// was invoked with and fails for directories listed in `fail_dirs`.
    /// `run_unchecked` consumes queued results front-first and panics once
    /// the queue is empty, so tests only exercise probes they scripted.
    #[derive(Debug, Default)]
    pub struct MockExecutor {
        /// Answer `which()` gives for every program name.
        pub which_result: bool,
        /// Working directories whose commands should report failure.
        pub fail_dirs: Vec<PathBuf>,
        /// Recorded `run_in` working directories, in call order.
        pub calls: Mutex<Vec<PathBuf>>,
        /// Queued results handed out by `run_unchecked`.
        pub unchecked: Mutex<Vec<ExecResult>>,
    }

    impl MockExecutor {
        /// Queue a successful `run_unchecked` result with the given stdout.
        pub fn queue_unchecked(&self, stdout: &str) {
            if let Ok(mut queue) = self.unchecked.lock() {
                queue.push(ExecResult {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    success: true,
                    code: Some(0),
                });
            }
        }
    }

    impl Executor for MockExecutor {
        fn run_in(&self, dir: &Path, program: &str, _args: &[&str]) -> anyhow::Result<ExecResult> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(dir.to_path_buf());
            }
            if self.fail_dirs.iter().any(|d| d == dir) {
                anyhow::bail!("{program} in {}: exit 1: boom", dir.display());
            }
            Ok(ExecResult {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                code: Some(0),
            })
        }

        fn run_unchecked(&self, _: &str, _: &[&str]) -> anyhow::Result<ExecResult> {
            let Ok(mut queue) = self.unchecked.lock() else {
                panic!("unchecked queue poisoned")
            };
            if queue.is_empty() {
                panic!("unexpected executor call in test")
            }
            Ok(queue.remove(0))
        }

        fn which(&self, _: &str) -> bool {
            self.which_result
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn run_in_echo() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor.run_in(&dir, "echo", &["hello"]).unwrap();
        assert!(result.success, "echo should run cleanly");
        assert_eq!(result.stdout.trim(), "hello");
    }

    #[test]
    fn run_in_failure() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor.run_in(&dir, "false", &[]);
        assert!(result.is_err(), "run_in must surface a non-zero exit");
    }

    #[test]
    fn run_in_failure_message_carries_exit_code() {
        let dir = std::env::temp_dir();
        let err = SystemExecutor
            .run_in(&dir, "false", &[])
            .unwrap_err()
            .to_string();
        assert!(err.contains("exit 1"), "error should name the exit code: {err}");
    }

    #[test]
    fn run_in_missing_program() {
        let dir = std::env::temp_dir();
        let result = SystemExecutor.run_in(&dir, "this-program-does-not-exist-12345", &[]);
        assert!(result.is_err(), "spawn failure should produce an error");
    }

    #[test]
    fn run_unchecked_failure() {
        let result = SystemExecutor.run_unchecked("false", &[]).unwrap();
        assert!(!result.success, "run_unchecked reports failure without erroring");
        assert_eq!(result.code, Some(1));
    }

    #[test]
    fn run_unchecked_success() {
        let result = SystemExecutor.run_unchecked("true", &[]).unwrap();
        assert!(result.success);
    }

    #[test]
    fn which_sees_sh() {
        assert!(SystemExecutor.which("sh"), "sh is always on PATH here");
    }

    #[test]
    fn which_missing_program() {
        assert!(
            !SystemExecutor.which("this-program-does-not-exist-12345"),
            "a made-up name must not resolve"
        );
    }
}
