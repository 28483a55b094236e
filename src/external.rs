use crate::command::{CommandFactory, CommandNotFound, ExecutableCommand, ExecutionResult};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::redirect::{RedirectionPlan, Stream};
use crate::resolver::{self, CommandResolution};
use anyhow::{Context, Result};
use std::io;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

/// Command that is not a builtin.
///
/// `argv0` is the name the user typed, which the child sees as its own name;
/// `path` is where the resolver found it.
pub struct ExternalCommand {
    path: PathBuf,
    argv0: String,
    args: Vec<String>,
}

impl ExternalCommand {
    pub fn new(path: PathBuf, argv0: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            path,
            argv0: argv0.into(),
            args,
        }
    }
}

impl CommandFactory for Factory<ExternalCommand> {
    fn try_create(
        &self,
        env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        match resolver::resolve(name, env) {
            CommandResolution::External(path) => Some(Box::new(ExternalCommand::new(
                path,
                name,
                args.iter().map(|x| x.to_string()).collect(),
            ))),
            CommandResolution::Builtin(_) | CommandResolution::NotFound => None,
        }
    }
}

/// Captured streams go through a pipe; the rest write to the terminal directly.
fn stdio_for(plan: &RedirectionPlan, stream: Stream) -> Stdio {
    if plan.is_redirected(stream) {
        Stdio::piped()
    } else {
        Stdio::inherit()
    }
}

fn captured(plan: &RedirectionPlan, stream: Stream, bytes: Vec<u8>) -> Option<String> {
    plan.is_redirected(stream)
        .then(|| String::from_utf8_lossy(&bytes).into_owned())
}

impl ExecutableCommand for ExternalCommand {
    fn execute(
        self: Box<Self>,
        plan: &RedirectionPlan,
        env: &mut Environment,
    ) -> Result<ExecutionResult> {
        let mut cmd = Command::new(&self.path);
        set_argv0(&mut cmd, &self.argv0);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(stdio_for(plan, Stream::Stdout))
            .stderr(stdio_for(plan, Stream::Stderr))
            .envs(env.vars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&env.current_dir);

        tracing::debug!(path = %self.path.display(), argv0 = %self.argv0, args = ?self.args, "spawning");
        let child = match cmd.spawn() {
            Ok(child) => child,
            // The file vanished or lost its execute bit since it was resolved.
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied) => {
                tracing::debug!(error = %e, "spawn failed");
                return Err(CommandNotFound.into());
            }
            Err(e) => return Err(e).with_context(|| self.argv0.clone()),
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("{}: failed to wait for child", self.argv0))?;
        let status = match output.status.code() {
            Some(x) => x,
            None => terminated_by_signal(output.status),
        };
        tracing::debug!(status, "child exited");

        Ok(ExecutionResult {
            stdout: captured(plan, Stream::Stdout, output.stdout),
            stderr: captured(plan, Stream::Stderr, output.stderr),
            status,
            terminates: false,
        })
    }
}

#[cfg(unix)]
fn set_argv0(cmd: &mut Command, argv0: &str) {
    use std::os::unix::process::CommandExt;
    cmd.arg0(argv0);
}

#[cfg(not(unix))]
fn set_argv0(_cmd: &mut Command, _argv0: &str) {}

#[cfg(unix)]
fn terminated_by_signal(exit_status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    if let Some(signal) = ExitStatusExt::signal(&exit_status) {
        128 + signal
    } else if ExitStatusExt::core_dumped(&exit_status) {
        255
    } else {
        -1
    }
}

#[cfg(not(unix))]
fn terminated_by_signal(_exit_status: ExitStatus) -> i32 {
    -1
}
