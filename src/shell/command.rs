//! Subprocess execution.
//!
//! Every command runs in its own process group with stdin closed. While it
//! runs, the caller's [`CancellationToken`] and timeout are polled; either
//! one kills the whole group and yields [`KilnError::BuildCancelled`].

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::assemble::CommandLine;
use crate::error::{KilnError, Result};

use super::cancel::CancellationToken;

/// How often a running child is checked for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output, when captured.
    pub stdout: String,

    /// Standard error, when captured.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    fn from_status(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
            success: status.success(),
        }
    }
}

/// Options for command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Variables added to the inherited environment.
    pub env: BTreeMap<String, String>,

    /// Capture stdout and stderr (if false, both are inherited).
    pub capture: bool,

    /// Wall-clock limit (None = no limit).
    pub timeout: Option<Duration>,
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Callback for streaming captured output.
pub type OutputCallback = Box<dyn Fn(OutputLine) + Send>;

/// Execute `command` for the named pipeline step.
///
/// A spawn failure is reported as [`KilnError::SubprocessFailed`] without
/// an exit code. A non-zero exit is not an error here; callers decide.
pub fn execute(
    step: &str,
    command: &CommandLine,
    options: &CommandOptions,
    cancel: &CancellationToken,
    callback: Option<OutputCallback>,
) -> Result<CommandResult> {
    let start = Instant::now();

    let mut cmd = Command::new(&command.program);
    cmd.args(command.args.as_slice());
    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    cmd.envs(&options.env);
    cmd.stdin(Stdio::null());
    if options.capture {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|e| KilnError::SubprocessFailed {
        step: step.to_string(),
        exit_code: None,
        command: format!("{} ({})", command, e),
    })?;
    debug!("{} started as pid {}", step, child.id());

    let (tx, rx) = mpsc::channel();
    let readers = [
        child
            .stdout
            .take()
            .map(|out| spawn_reader(out, tx.clone(), OutputLine::Stdout)),
        child
            .stderr
            .take()
            .map(|err| spawn_reader(err, tx.clone(), OutputLine::Stderr)),
    ];
    drop(tx);

    let forward = thread::spawn(move || {
        let mut stdout = String::new();
        let mut stderr = String::new();
        for line in rx {
            match &line {
                OutputLine::Stdout(text) => {
                    stdout.push_str(text);
                    stdout.push('\n');
                }
                OutputLine::Stderr(text) => {
                    stderr.push_str(text);
                    stderr.push('\n');
                }
            }
            if let Some(cb) = &callback {
                cb(line);
            }
        }
        (stdout, stderr)
    });

    let waited = wait(&mut child, step, options.timeout, cancel, start);

    for reader in readers.into_iter().flatten() {
        let _ = reader.join();
    }
    let (stdout, stderr) = forward.join().unwrap_or_default();

    let status = waited?;
    Ok(CommandResult::from_status(
        status,
        stdout,
        stderr,
        start.elapsed(),
    ))
}

/// Wait for the child, polling for cancellation and timeout.
fn wait(
    child: &mut Child,
    step: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
    start: Instant,
) -> Result<ExitStatus> {
    loop {
        if cancel.is_cancelled() {
            kill_group(child);
            return Err(KilnError::BuildCancelled {
                step: step.to_string(),
                reason: "cancelled by request".to_string(),
            });
        }

        if let Some(limit) = timeout {
            if start.elapsed() >= limit {
                kill_group(child);
                return Err(KilnError::BuildCancelled {
                    step: step.to_string(),
                    reason: format!("timed out after {}s", limit.as_secs()),
                });
            }
        }

        if let Some(status) = child.wait_timeout(POLL_INTERVAL)? {
            return Ok(status);
        }
    }
}

/// Kill the child's process group and reap the child.
fn kill_group(child: &mut Child) {
    warn!("killing process group of pid {}", child.id());

    #[cfg(unix)]
    {
        if let Ok(pid) = i32::try_from(child.id()) {
            // SAFETY: kill(2) with a negative pid signals the process group
            // created for this child by `process_group(0)`.
            unsafe {
                libc::kill(-pid, libc::SIGKILL);
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_reader<R>(
    stream: R,
    tx: mpsc::Sender<OutputLine>,
    wrap: fn(String) -> OutputLine,
) -> thread::JoinHandle<()>
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(std::result::Result::ok) {
            let _ = tx.send(wrap(line));
        }
    })
}
