//! Subprocess execution with bounded, verifiable behavior.
//!
//! One primitive, `DriverKernel::run`, wraps the host process API exactly
//! once: argv-only spawn, scrubbed environment, closed stdin, capped output
//! buffers, a hard deadline, and SIGTERM-then-SIGKILL termination. The
//! kernel never interprets exit codes — adapters declare what counts as a
//! clean exit.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use skyline_core::errors::DriverError;

use super::args::validate_args;
use super::cancellation::CancellationToken;
use super::env::scrubbed_env;

/// Poll interval for the wait loop.
const TICK: Duration = Duration::from_millis(25);
/// Grace period between SIGTERM and SIGKILL.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// What to run and where.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub executable: String,
    pub args: Vec<String>,
    /// Must be absolute; inside the project or an owned scratch dir.
    pub working_dir: PathBuf,
}

/// Per-run limits and environment additions.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub timeout: Duration,
    /// Byte budget applied to stdout and stderr independently.
    pub max_output_bytes: usize,
    /// Whitelisted additions beyond `PATH`/`HOME`.
    pub env_additions: Vec<(String, String)>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(120),
            max_output_bytes: 10 * 1024 * 1024,
            env_additions: Vec::new(),
        }
    }
}

/// The structured result of one subprocess run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// None when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// True when the caller's cancellation ended the run early; partial
    /// output collected so far is preserved.
    pub killed: bool,
    pub duration: Duration,
}

impl RunOutcome {
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// The single subprocess-execution primitive.
///
/// Given identical input, env additions, and timeout the kernel behaves
/// identically: no hidden retries, no implicit caching, no rc-files (the
/// environment is scrubbed).
#[derive(Debug, Clone, Default)]
pub struct DriverKernel;

impl DriverKernel {
    pub fn new() -> Self {
        Self
    }

    /// Run an external tool to completion, deadline, or cancellation.
    ///
    /// Timeout discards partial output and fails the run. Cancellation
    /// preserves partial output and returns `killed = true`. An output-cap
    /// breach kills the child and fails the run.
    pub fn run(
        &self,
        spec: &CommandSpec,
        opts: &RunOptions,
        token: &CancellationToken,
    ) -> Result<RunOutcome, DriverError> {
        validate_args(&spec.args)?;
        if !spec.working_dir.is_absolute() {
            return Err(DriverError::InvalidWorkingDir {
                path: spec.working_dir.display().to_string(),
            });
        }
        if token.is_cancelled() {
            return Err(DriverError::Cancelled);
        }

        let start = Instant::now();
        let mut child = Command::new(&spec.executable)
            .args(&spec.args)
            .current_dir(&spec.working_dir)
            .env_clear()
            .envs(scrubbed_env(&opts.env_additions).into_iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DriverError::ToolUnavailable {
                    executable: spec.executable.clone(),
                    message: e.to_string(),
                },
                _ => DriverError::Io {
                    message: e.to_string(),
                },
            })?;

        let (overflow_tx, overflow_rx) = bounded::<()>(2);
        let stdout_handle = spawn_reader(
            child.stdout.take(),
            opts.max_output_bytes,
            overflow_tx.clone(),
        );
        let stderr_handle = spawn_reader(child.stderr.take(), opts.max_output_bytes, overflow_tx);

        let deadline = start + opts.timeout;
        let wait = self.wait_loop(&mut child, deadline, token, &overflow_rx);

        let (stdout, stdout_overflow) = join_reader(stdout_handle);
        let (stderr, stderr_overflow) = join_reader(stderr_handle);
        let duration = start.elapsed();

        match wait {
            WaitResult::Exited(code) => {
                if stdout_overflow || stderr_overflow {
                    return Err(DriverError::OutputExceeded {
                        limit_bytes: opts.max_output_bytes,
                    });
                }
                Ok(RunOutcome {
                    exit_code: code,
                    stdout,
                    stderr,
                    killed: false,
                    duration,
                })
            }
            WaitResult::Overflowed => Err(DriverError::OutputExceeded {
                limit_bytes: opts.max_output_bytes,
            }),
            // Hard deadline: partial output is discarded by policy.
            WaitResult::TimedOut => Err(DriverError::Timeout {
                timeout_ms: opts.timeout.as_millis() as u64,
            }),
            WaitResult::Cancelled(code) => Ok(RunOutcome {
                exit_code: code,
                stdout,
                stderr,
                killed: true,
                duration,
            }),
        }
    }

    fn wait_loop(
        &self,
        child: &mut Child,
        deadline: Instant,
        token: &CancellationToken,
        overflow_rx: &Receiver<()>,
    ) -> WaitResult {
        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    return WaitResult::Exited(status.code());
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, "try_wait failed; killing child");
                    let _ = child.kill();
                    let _ = child.wait();
                    return WaitResult::Exited(None);
                }
            }

            if overflow_rx.try_recv().is_ok() {
                terminate(child);
                return WaitResult::Overflowed;
            }

            if token.is_cancelled() {
                let code = terminate(child);
                return WaitResult::Cancelled(code);
            }

            if Instant::now() >= deadline {
                terminate(child);
                return WaitResult::TimedOut;
            }

            std::thread::sleep(TICK);
        }
    }
}

enum WaitResult {
    Exited(Option<i32>),
    Overflowed,
    TimedOut,
    Cancelled(Option<i32>),
}

/// SIGTERM, a grace period to exit cleanly, then SIGKILL.
fn terminate(child: &mut Child) -> Option<i32> {
    #[cfg(unix)]
    {
        unsafe {
            libc::kill(child.id() as libc::pid_t, libc::SIGTERM);
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }

    let grace_deadline = Instant::now() + KILL_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.code(),
            Ok(None) if Instant::now() >= grace_deadline => {
                tracing::warn!("child ignored SIGTERM; sending SIGKILL");
                let _ = child.kill();
                return child.wait().ok().and_then(|s| s.code());
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(50)),
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                return None;
            }
        }
    }
}

/// Read a pipe into a capped buffer on a dedicated thread.
///
/// On cap breach the thread stops reading and signals the wait loop, which
/// kills the child; a blocked writer is therefore short-lived.
fn spawn_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
    cap: usize,
    overflow_tx: Sender<()>,
) -> Option<JoinHandle<(Vec<u8>, bool)>> {
    let mut pipe = pipe?;
    Some(std::thread::spawn(move || {
        let mut buf = [0u8; 8192];
        let mut out: Vec<u8> = Vec::new();
        loop {
            match pipe.read(&mut buf) {
                Ok(0) => return (out, false),
                Ok(n) => {
                    if out.len() + n > cap {
                        let take = cap.saturating_sub(out.len());
                        out.extend_from_slice(&buf[..take]);
                        let _ = overflow_tx.try_send(());
                        return (out, true);
                    }
                    out.extend_from_slice(&buf[..n]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(_) => return (out, false),
            }
        }
    }))
}

fn join_reader(handle: Option<JoinHandle<(Vec<u8>, bool)>>) -> (Vec<u8>, bool) {
    match handle {
        Some(h) => h.join().unwrap_or_default(),
        None => (Vec::new(), false),
    }
}
