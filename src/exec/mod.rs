//! Command execution module
//!
//! Runs one program as a child process and captures what it prints:
//! - stdout and stderr share one pipe, so the captured text keeps arrival order
//! - each line can be echoed to our stdout as it arrives
//! - a non-zero return code is a normal result, not an error
//! - every child leads its own process group, so a terminal Ctrl-C reaches
//!   only the harness and an optional wall-clock limit can kill the group

use std::io::{self, BufRead, BufReader, Write};
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;

use crate::constants::{TIMEOUT_EXIT_CODE, TIMEOUT_POLL_INTERVAL_MS};
use crate::models::{CommandSpec, Outcome};

/// Per-invocation behaviour of [`execute`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// Print each output line as it arrives
    pub echo: bool,
    /// Kill the child once it has run this long
    pub timeout: Option<Duration>,
}

/// How the child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
    TimedOut(Duration),
}

/// Captured result of one command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub return_code: i32,
    pub combined_output: String,
    pub termination: Termination,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }

    pub fn outcome(&self) -> Outcome {
        match self.termination {
            Termination::Exited(code) => Outcome::from_exit_code(code),
            Termination::Signaled(signal) => Outcome::CrashOrTimeout {
                reason: format!("terminated by signal {}", signal),
            },
            Termination::TimedOut(limit) => Outcome::CrashOrTimeout {
                reason: format!("timed out after {:?}", limit),
            },
        }
    }
}

/// Run `spec` to completion and return its return code and combined output.
///
/// Errors only when the process cannot be spawned or waited on.
pub fn execute(spec: &CommandSpec, options: &ExecOptions) -> io::Result<CommandOutput> {
    let start = Instant::now();
    let (reader, writer) = io::pipe()?;

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);
    if let Some(dir) = &spec.workdir {
        command.current_dir(dir);
    }
    // own group: a terminal SIGINT must not reach the child, and a timeout
    // takes down wrappers and their children together
    command.process_group(0);

    debug!("spawning: {}", spec.display());
    let spawned = command.spawn();
    // Command still owns the pipe's write ends; the reader only sees EOF once they are gone
    drop(command);
    let mut child = spawned?;

    let echo = options.echo;
    let collector = thread::spawn(move || collect_output(reader, echo));

    let termination = match options.timeout {
        None => termination_of(child.wait()?),
        Some(limit) => wait_with_deadline(&mut child, start, limit)?,
    };

    let combined_output = collector
        .join()
        .map_err(|_| io::Error::other("output collector thread panicked"))??;

    let return_code = match termination {
        Termination::Exited(code) => code,
        Termination::Signaled(signal) => -signal,
        Termination::TimedOut(_) => TIMEOUT_EXIT_CODE,
    };

    Ok(CommandOutput {
        return_code,
        combined_output,
        termination,
        duration: start.elapsed(),
    })
}

fn wait_with_deadline(
    child: &mut Child,
    start: Instant,
    limit: Duration,
) -> io::Result<Termination> {
    let poll = Duration::from_millis(TIMEOUT_POLL_INTERVAL_MS);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(termination_of(status));
        }
        if start.elapsed() >= limit {
            break;
        }
        thread::sleep(poll);
    }

    debug!("killing process group {} after {:?}", child.id(), limit);
    let group = Pid::from_raw(child.id() as i32);
    if killpg(group, Signal::SIGKILL).is_err() {
        // group already gone; make sure the direct child is
        let _ = child.kill();
    }
    let _ = child.wait()?;
    Ok(Termination::TimedOut(limit))
}

fn termination_of(status: ExitStatus) -> Termination {
    match status.code() {
        Some(code) => Termination::Exited(code),
        None => Termination::Signaled(status.signal().unwrap_or(0)),
    }
}

fn collect_output(reader: io::PipeReader, echo: bool) -> io::Result<String> {
    let mut reader = BufReader::new(reader);
    let mut collected = Vec::new();
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        if echo {
            let mut stdout = io::stdout().lock();
            let _ = stdout.write_all(&line);
            let _ = stdout.flush();
        }
        collected.extend_from_slice(&line);
    }

    Ok(String::from_utf8_lossy(&collected).into_owned())
}
