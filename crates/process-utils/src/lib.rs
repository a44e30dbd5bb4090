//! Process helpers for running external media tools under a deadline.

use std::ffi::OsStr;
use std::process::{Output, Stdio};
use std::time::Duration;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self) -> &mut Self;
}

impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) -> &mut Self {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
        self
    }
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Result of a deadline-bounded run.
#[derive(Debug)]
pub enum BoundedRun {
    /// The process exited on its own; status and captured pipes are available.
    Completed(Output),
    /// The deadline passed first. The child has been killed.
    TimedOut,
}

impl BoundedRun {
    pub fn is_timed_out(&self) -> bool {
        matches!(self, BoundedRun::TimedOut)
    }
}

/// Spawn `cmd` with piped stdout/stderr and wait at most `timeout` for it.
///
/// The child is spawned with `kill_on_drop`, so when the deadline elapses the
/// pending wait is dropped and the process is terminated. Spawn failures are
/// returned as `Err`.
pub async fn run_with_timeout(
    cmd: &mut tokio::process::Command,
    timeout: Duration,
) -> std::io::Result<BoundedRun> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn()?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(BoundedRun::Completed(output?)),
        Err(_) => Ok(BoundedRun::TimedOut),
    }
}
