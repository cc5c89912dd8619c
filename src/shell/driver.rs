//! Runs an assembled build.
//!
//! The driver applies patches and generated lines, then runs the configure
//! and build steps in order. A non-zero exit stops the build; nothing later
//! runs. Every subprocess goes through a [`CommandRunner`] so the engine can
//! be exercised without spawning processes.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::assemble::{AssembledCommands, CommandLine};
use crate::environment::BuildEnvironment;
use crate::error::{KilnError, Result};

use super::cancel::CancellationToken;
use super::command::{execute, CommandOptions, CommandResult, OutputCallback, OutputLine};
use super::patch::apply_patches;

/// Executes one external step.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        step: &str,
        command: &CommandLine,
        options: &CommandOptions,
        cancel: &CancellationToken,
    ) -> Result<CommandResult>;
}

/// Runs commands as real subprocesses.
///
/// Output is captured and forwarded line by line to the log at debug
/// level; with `inherit_output` the child writes straight to the terminal.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    inherit_output: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inherit_output(mut self, inherit: bool) -> Self {
        self.inherit_output = inherit;
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        step: &str,
        command: &CommandLine,
        options: &CommandOptions,
        cancel: &CancellationToken,
    ) -> Result<CommandResult> {
        let mut options = options.clone();
        options.capture = !self.inherit_output;

        let step_name = step.to_string();
        let callback: OutputCallback = Box::new(move |line| match line {
            OutputLine::Stdout(text) => debug!(target: "kiln::output", "[{}] {}", step_name, text),
            OutputLine::Stderr(text) => debug!(target: "kiln::output", "[{}] {}", step_name, text),
        });

        execute(step, command, &options, cancel, Some(callback))
    }
}

/// Outcome of one external step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: String,
    pub command: String,
    /// Fingerprint of the argument vector.
    pub fingerprint: String,
    pub exit_code: Option<i32>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// What the driver did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriveReport {
    pub patches_applied: usize,
    /// Patches found already in place, from an earlier run in the same tree.
    pub patches_already_applied: usize,
    pub lines_appended: usize,
    pub lines_already_present: usize,
    pub steps: Vec<StepRecord>,
}

/// Applies patches and runs the configure and build steps.
pub struct ProcessDriver<'r> {
    runner: &'r dyn CommandRunner,
    workdir: PathBuf,
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl<'r> ProcessDriver<'r> {
    pub fn new(runner: &'r dyn CommandRunner, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Limit each step's wall-clock time.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Drive the build to completion or first failure.
    pub fn drive(&self, commands: &AssembledCommands, env: &BuildEnvironment) -> Result<DriveReport> {
        let mut report = DriveReport::default();

        self.check_cancelled("patch")?;
        let patched = apply_patches(&commands.patches, &self.workdir)?;
        debug!(
            "{} patch(es) applied, {} already in place, {} replacement(s)",
            patched.applied, patched.already_applied, patched.replacements
        );
        report.patches_applied = patched.applied;
        report.patches_already_applied = patched.already_applied;
        for append in &commands.appends {
            if append.apply(&self.workdir)? {
                report.lines_appended += 1;
            } else {
                report.lines_already_present += 1;
            }
        }

        let options = CommandOptions {
            cwd: Some(self.workdir.clone()),
            env: env.vars.clone(),
            capture: true,
            timeout: self.timeout,
        };

        if let Some(configure) = &commands.configure {
            report.steps.push(self.run_step("configure", configure, &options)?);
        }
        report.steps.push(self.run_step("build", &commands.build, &options)?);

        Ok(report)
    }

    fn run_step(&self, step: &str, command: &CommandLine, options: &CommandOptions) -> Result<StepRecord> {
        self.check_cancelled(step)?;
        info!("{}: {}", step, command);

        let result = self.runner.run(step, command, options, &self.cancel)?;
        if !result.success {
            return Err(KilnError::SubprocessFailed {
                step: step.to_string(),
                exit_code: result.exit_code,
                command: command.to_string(),
            });
        }

        Ok(StepRecord {
            step: step.to_string(),
            command: command.to_string(),
            fingerprint: command.args.fingerprint(),
            exit_code: result.exit_code,
            duration: result.duration,
        })
    }

    fn check_cancelled(&self, step: &str) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(KilnError::BuildCancelled {
                step: step.to_string(),
                reason: "cancelled by request".to_string(),
            });
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}
