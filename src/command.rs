use crate::env::Environment;
use crate::redirect::{RedirectionPlan, Stream};
use anyhow::Result;
use thiserror::Error;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
pub type ExitCode = i32;

/// Status reported when a command name matches nothing that can be run.
pub const NOT_FOUND_STATUS: ExitCode = 127;

/// No factory recognized the name, or the program it resolved to could not be started.
///
/// The interpreter reports it against the whole input line.
#[derive(Debug, Error)]
#[error("command not found")]
pub struct CommandNotFound;

/// Outcome of running one command.
///
/// `stdout`/`stderr` hold text the interpreter still has to deliver, either to the
/// terminal or to a redirection target. `None` means the stream was not captured
/// (an external program wrote to the terminal directly).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub status: ExitCode,
    /// Set only by `exit`; the interpreter stops before delivering anything.
    pub terminates: bool,
}

impl ExecutionResult {
    /// A failed command whose only output is `message` on stderr.
    pub fn failure(status: ExitCode, message: impl Into<String>) -> Self {
        Self {
            stdout: None,
            stderr: Some(message.into()),
            status,
            terminates: false,
        }
    }

    /// Captured text of `stream`, if any.
    pub fn text(&self, stream: Stream) -> Option<&str> {
        match stream {
            Stream::Stdout => self.stdout.as_deref(),
            Stream::Stderr => self.stderr.as_deref(),
        }
    }
}

/// Object-safe trait for any command that can be executed by the shell.
///
/// This is implemented by built-ins via a blanket impl and by external commands.
pub trait ExecutableCommand {
    /// Executes the command.
    ///
    /// `plan` tells the command which streams will be redirected, so that it can
    /// capture them instead of writing to the terminal.
    fn execute(
        self: Box<Self>,
        plan: &RedirectionPlan,
        env: &mut Environment,
    ) -> Result<ExecutionResult>;
}

/// Factory that tries to create a command from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
/// Implementations can use the environment to resolve executables (e.g., using PATH).
pub trait CommandFactory {
    /// Attempt to create a command instance for the provided name and arguments.
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>>;
}
