//! Host collaborators consumed by the updater.
//!
//! The updater never owns the application's lifecycle. It asks the host for
//! the installed version and application root, and asks it to relaunch or
//! quit once an install has been handed off. Child processes go through a
//! [`CommandRunner`] so the install step can be exercised without touching
//! the real system.

use futures::future::BoxFuture;
use std::path::PathBuf;
use std::process::Stdio;
use tracing::debug;

/// The application being updated.
pub trait HostApp: Send + Sync {
    /// Version string of the running application (dotted numeric).
    fn version(&self) -> String;

    /// Root path of the application (a directory, or an archive file).
    fn app_path(&self) -> PathBuf;

    /// Schedule a relaunch once the process exits.
    fn relaunch(&self);

    /// Quit the application.
    fn quit(&self);
}

/// A program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl InstallCommand {
    /// Create a command from a program and its arguments.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Prefix this command with another program, e.g. a privilege escalation.
    #[must_use]
    pub fn prefixed(self, program: impl Into<String>) -> Self {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        args.push(self.program);
        args.extend(self.args);
        Self {
            program: program.into(),
            args,
        }
    }
}

impl std::fmt::Display for InstallCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a completed command.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Whether the exit status was success.
    pub success: bool,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// Runs child processes on behalf of the installer.
pub trait CommandRunner: Send + Sync {
    /// Run a command to completion, capturing its output.
    fn run(&self, command: InstallCommand) -> BoxFuture<'static, std::io::Result<CommandOutput>>;

    /// Start a command without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be started.
    fn spawn_detached(&self, command: &InstallCommand) -> std::io::Result<()>;
}

/// [`CommandRunner`] backed by real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, command: InstallCommand) -> BoxFuture<'static, std::io::Result<CommandOutput>> {
        Box::pin(async move {
            debug!("Running: {command}");
            let output = tokio::process::Command::new(&command.program)
                .args(&command.args)
                .stdin(Stdio::null())
                .output()
                .await?;

            Ok(CommandOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        })
    }

    fn spawn_detached(&self, command: &InstallCommand) -> std::io::Result<()> {
        debug!("Spawning detached: {command}");
        let mut cmd = std::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            cmd.creation_flags(DETACHED_PROCESS);
        }

        // The child outlives us; its handle is intentionally dropped.
        cmd.spawn().map(drop)
    }
}
