//! Subprocess execution.
//!
//! Commands are spawned from an argument vector — never a shell string —
//! with both output streams drained on background threads so a chatty
//! child can't deadlock against a full pipe. Completion is awaited by
//! polling `try_wait`, which lets an optional timeout kill a hung child.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{AiderError, AiderResult};

/// Poll interval while waiting for a child to exit.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Captured result of a finished subprocess.
#[derive(Debug)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessOutput {
    /// Whether the child exited with status zero.
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `argv`, optionally piping `stdin_data` to the child and applying
/// `extra_env` on top of the inherited environment.
///
/// A nonzero exit status is NOT an error here — callers classify exit
/// codes and stderr content themselves. Errors are reserved for the
/// process never running (missing executable, spawn failure) or being
/// killed by the `timeout`.
///
/// # Errors
///
/// [`AiderError::EmptyCommand`] for an empty vector,
/// [`AiderError::ExecutableNotFound`] when the program is missing,
/// [`AiderError::ProcessTimeout`] when `timeout` elapses, and
/// [`AiderError::Io`] for other spawn/wait failures.
pub fn run(
    argv: &[String],
    stdin_data: Option<&str>,
    extra_env: &[(String, String)],
    timeout: Option<Duration>,
) -> AiderResult<ProcessOutput> {
    let program = argv.first().ok_or(AiderError::EmptyCommand)?;

    let mut command = Command::new(program);
    command
        .args(&argv[1..])
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in extra_env {
        command.env(key, value);
    }

    debug!(command = %argv.join(" "), "spawning subprocess");

    let mut child = command.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AiderError::ExecutableNotFound {
                program: program.clone(),
            }
        } else {
            AiderError::Io {
                path: PathBuf::from(program),
                source: e,
            }
        }
    })?;

    let stdout_drain = drain(child.stdout.take());
    let stderr_drain = drain(child.stderr.take());

    // Feed stdin from its own thread so a child that fills an output pipe
    // before consuming its input cannot deadlock against us, and the
    // timeout below stays enforceable.
    let stdin_feed = stdin_data.and_then(|data| {
        let stdin = child.stdin.take()?;
        let data = data.to_owned();
        let program = program.clone();
        Some(thread::spawn(move || {
            let mut stdin = stdin;
            if let Err(e) = stdin.write_all(data.as_bytes()) {
                // The child may exit before consuming all of its input;
                // its output still tells the caller what happened.
                warn!(program, error = %e, "failed to write subprocess stdin");
            }
            // Dropping the handle closes the stream.
        }))
    });

    let started = Instant::now();
    let status = loop {
        let polled = child.try_wait().map_err(|e| AiderError::Io {
            path: PathBuf::from(program),
            source: e,
        })?;
        match polled {
            Some(status) => break status,
            None => {
                if let Some(limit) = timeout {
                    if started.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        // Killing the child EOFs the pipes; reap the
                        // helper threads before bailing.
                        collect(stdout_drain);
                        collect(stderr_drain);
                        if let Some(feed) = stdin_feed {
                            let _ = feed.join();
                        }
                        return Err(AiderError::ProcessTimeout {
                            program: program.clone(),
                            timeout: limit,
                        });
                    }
                }
                thread::sleep(WAIT_POLL_INTERVAL);
            }
        }
    };

    let stdout = collect(stdout_drain);
    let stderr = collect(stderr_drain);
    if let Some(feed) = stdin_feed {
        let _ = feed.join();
    }
    let exit_code = status.code().unwrap_or(-1);

    debug!(program, exit_code, stdout_bytes = stdout.len(), stderr_bytes = stderr.len(), "subprocess finished");

    Ok(ProcessOutput {
        stdout,
        stderr,
        exit_code,
    })
}

/// Like [`run`], but a nonzero exit becomes [`AiderError::ProcessFailed`].
/// For call sites where any failure is terminal (e.g. `git add`).
pub fn run_checked(
    argv: &[String],
    stdin_data: Option<&str>,
    extra_env: &[(String, String)],
    timeout: Option<Duration>,
) -> AiderResult<ProcessOutput> {
    let output = run(argv, stdin_data, extra_env, timeout)?;
    if output.success() {
        Ok(output)
    } else {
        Err(AiderError::ProcessFailed {
            program: argv.first().cloned().unwrap_or_default(),
            code: output.exit_code,
            stderr: output.stderr.trim().to_owned(),
        })
    }
}

/// Heuristic error-marker scan over a child's stderr.
///
/// Aider can exit zero while still reporting a failure on stderr; this is
/// how such output is classified. Matches the markers the aider CLI and
/// its tracebacks emit.
pub fn stderr_reports_error(stderr: &str) -> bool {
    if stderr.is_empty() {
        return false;
    }
    let lower = stderr.to_lowercase();
    lower.contains("error") || lower.contains("exception")
}

fn drain<R>(stream: Option<R>) -> Option<thread::JoinHandle<Vec<u8>>>
where
    R: std::io::Read + Send + 'static,
{
    stream.map(|mut source| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = source.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<thread::JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
