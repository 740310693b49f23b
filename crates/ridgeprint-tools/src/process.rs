//! Child process execution with a deadline.
//!
//! stdout and stderr go to anonymous temporary files instead of pipes,
//! so a chatty tool can never block on a full pipe while we wait for it.
//! The files are unlinked on creation and vanish when dropped.
//!
//! On unix the child leads its own process group, and a timeout kills the
//! whole group, so helpers spawned by a wrapper script die with it.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Output of a child that exited on its own.
#[derive(Debug)]
pub struct Captured {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug)]
pub enum RunOutcome {
    Finished(Captured),
    /// The deadline passed; the child was killed and reaped.
    TimedOut,
}

/// Run `program` with `args`, killing it if it is still running after
/// `timeout`.
pub fn run_with_timeout<I, S>(program: &Path, args: I, timeout: Duration) -> io::Result<RunOutcome>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut stdout = tempfile::tempfile()?;
    let mut stderr = tempfile::tempfile()?;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout.try_clone()?))
        .stderr(Stdio::from(stderr.try_clone()?));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    let mut child = command.spawn()?;

    // A timeout too large to represent as an instant never expires.
    let deadline = Instant::now().checked_add(timeout);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(e) => {
                terminate(&mut child);
                let _ = child.wait();
                return Err(e);
            }
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            // The child may exit between try_wait and kill; either way
            // wait() reaps it.
            terminate(&mut child);
            child.wait()?;
            return Ok(RunOutcome::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(RunOutcome::Finished(Captured {
        status,
        stdout: read_back(&mut stdout)?,
        stderr: read_back(&mut stderr)?,
    }))
}

/// Kill the child's process group, then the child itself in case the
/// group signal could not be sent.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        let _ = Command::new("kill")
            .arg("-KILL")
            .arg("--")
            .arg(format!("-{}", child.id()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
    }
    let _ = child.kill();
}

fn read_back(file: &mut File) -> io::Result<String> {
    file.seek(SeekFrom::Start(0))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
