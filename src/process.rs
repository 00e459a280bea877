//! External command execution.
//!
//! Every subprocess the upgrader starts goes through [`CommandRunner`], so
//! environment overrides stay scoped to the child and the orchestrator can be
//! driven without touching the host.

use crate::error::{Error, Result};
use std::fmt;
use std::future::Future;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// A command line plus the per-invocation settings it runs with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Environment variables set only for this child.
    pub env: Vec<(String, String)>,
    /// Bytes written to the child's stdin.
    pub stdin: Option<Vec<u8>>,
    /// Capture stdout instead of inheriting the terminal.
    pub capture_stdout: bool,
}

impl CommandSpec {
    /// Create a command with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Build from a full argv, e.g. a configured command line.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `argv` is empty.
    pub fn from_argv(argv: &[String]) -> Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| Error::Config("empty command line".to_string()))?;
        Ok(Self::new(program.clone()).args(args.iter().cloned()))
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Feed `input` to the child's stdin.
    #[must_use]
    pub fn stdin(mut self, input: Vec<u8>) -> Self {
        self.stdin = Some(input);
        self
    }

    /// Capture the child's stdout.
    #[must_use]
    pub fn capture_stdout(mut self) -> Self {
        self.capture_stdout = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{key}={value} ")?;
        }
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// What a finished command reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if terminated by a signal.
    pub code: Option<i32>,
    /// Captured stdout (empty unless requested).
    pub stdout: Vec<u8>,
}

impl CommandOutput {
    /// Successful exit with no output.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stdout: Vec::new(),
        }
    }

    /// Exit with the given code.
    #[must_use]
    pub fn exit(code: i32) -> Self {
        Self {
            code: Some(code),
            stdout: Vec::new(),
        }
    }

    /// Whether the command exited with status 0.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`Error::CommandFailed`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] unless the exit status is 0.
    pub fn check(self, command: &CommandSpec) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let status = self.code.map_or_else(
            || "terminated by signal".to_string(),
            |c| format!("exit status {c}"),
        );
        Err(Error::CommandFailed {
            command: command.to_string(),
            status,
        })
    }
}

/// Runs external commands to completion.
pub trait CommandRunner: Sync {
    /// Run `command` and wait for it to exit.
    ///
    /// A non-zero exit is reported in the output, not as an error; only a
    /// failure to start or talk to the child is an error.
    fn run(&self, command: &CommandSpec) -> impl Future<Output = Result<CommandOutput>> + Send;

    /// Run `command` and fail unless it exits with status 0.
    fn run_checked(
        &self,
        command: &CommandSpec,
    ) -> impl Future<Output = Result<CommandOutput>> + Send {
        async move { self.run(command).await?.check(command) }
    }
}

/// Runs commands on the local host via `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        debug!("Running: {command}");

        let spawn_err = |source: std::io::Error| Error::Spawn {
            command: command.to_string(),
            source,
        };

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.env.iter().map(|(k, v)| (k, v)))
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::inherit()
            })
            .stdout(if command.capture_stdout {
                Stdio::piped()
            } else {
                Stdio::inherit()
            });

        let mut child = cmd.spawn().map_err(spawn_err)?;
        let pipe = child.stdin.take();

        // Feed stdin while stdout drains, or a chatty child fills its pipe.
        let feed = async move {
            if let (Some(input), Some(mut pipe)) = (command.stdin.as_deref(), pipe) {
                pipe.write_all(input).await?;
                // Dropping closes the pipe so the child sees EOF.
            }
            Ok::<(), std::io::Error>(())
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(spawn_err)?;
        fed.map_err(spawn_err)?;

        debug!("{} exited with {:?}", command.program, output.status.code());

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
        })
    }
}
