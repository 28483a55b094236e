use crate::command::{CommandFactory, ExecutableCommand, ExecutionResult, ExitCode};
use crate::env::Environment;
use crate::interpreter::Factory;
use crate::redirect::RedirectionPlan;
use crate::resolver::{self, CommandResolution};
use anyhow::{Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Names of every builtin, in lexicographic order.
pub const BUILTIN_NAMES: [&str; 5] = ["cd", "echo", "exit", "pwd", "type"];

/// Built-in commands known to the shell at compile time.
///
/// Builtins are parsed using the [`argh`] crate (`FromArgs`) and executed directly
/// in-process without spawning a child process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Whether a successful run ends the interpreter.
    const TERMINATES: bool = false;

    /// Canonical name of the command, e.g. "echo" or "cd".
    fn name() -> &'static str;

    /// Executes the command, writing its regular output to `stdout`.
    ///
    /// An `Err` is reported on the command's stderr stream with status 1.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableCommand for T {
    fn execute(
        self: Box<Self>,
        _plan: &RedirectionPlan,
        env: &mut Environment,
    ) -> Result<ExecutionResult> {
        let mut stdout = Vec::new();
        let (status, stderr) = match <T as BuiltinCommand>::execute(*self, &mut stdout, env) {
            Ok(code) => (code, None),
            Err(e) => (1, Some(format!("{e}\n"))),
        };
        Ok(ExecutionResult {
            stdout: Some(String::from_utf8_lossy(&stdout).into_owned()),
            terminates: T::TERMINATES && stderr.is_none(),
            stderr,
            status,
        })
    }
}

/// Usage or parse error produced by argh instead of a command.
struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableCommand for InvalidArgs {
    fn execute(
        self: Box<Self>,
        _plan: &RedirectionPlan,
        _env: &mut Environment,
    ) -> Result<ExecutionResult> {
        let mut output = self.output;
        if !output.ends_with('\n') {
            output.push('\n');
        }
        Ok(if self.is_error {
            ExecutionResult::failure(1, output)
        } else {
            ExecutionResult {
                stdout: Some(output),
                ..Default::default()
            }
        })
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(
        &self,
        _env: &Environment,
        name: &str,
        args: &[&str],
    ) -> Option<Box<dyn ExecutableCommand>> {
        if name != T::name() {
            return None;
        }
        Some(match T::from_args(&[name], args) {
            Ok(cmd) => Box::new(cmd),
            Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                output,
                is_error: status.is_err(),
            }),
        })
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", env.current_dir.display())?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Change the current working directory.
/// If no target is provided, changes to the directory specified by the HOME environment variable.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory. Defaults to $HOME when omitted.
    pub target: Option<String>,
}

/// Expands a leading `~` to the home directory.
fn expand_tilde(target: &str, env: &Environment) -> PathBuf {
    if target == "~" {
        env.home_dir()
    } else if let Some(rest) = target.strip_prefix("~/") {
        env.home_dir().join(rest)
    } else {
        PathBuf::from(target)
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let target = match self.target.as_deref() {
            None | Some("") => env.home_dir(),
            Some(t) => expand_tilde(t, env),
        };

        // `join` keeps absolute targets as they are.
        let new_dir = env.current_dir.join(&target);
        match fs::canonicalize(&new_dir) {
            Ok(dir) if dir.is_dir() => {
                tracing::debug!(dir = %dir.display(), "changed directory");
                env.current_dir = dir;
                Ok(0)
            }
            _ => Err(anyhow!(
                "cd: {}: No such file or directory",
                target.display()
            )),
        }
    }
}

/// Exit the shell with the given status, 0 when omitted.
///
/// Parsed by hand so that negative codes are not mistaken for options.
pub struct Exit {
    pub code: Option<ExitCode>,
}

impl FromArgs for Exit {
    fn from_args(command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let name = command_name.join(" ");
        let usage = |output: String| EarlyExit {
            output,
            status: Err(()),
        };
        match args {
            [] => Ok(Exit { code: None }),
            [code] => code
                .parse()
                .map(|code| Exit { code: Some(code) })
                .map_err(|_| usage(format!("{name}: {code}: numeric argument required"))),
            _ => Err(usage(format!("{name}: too many arguments"))),
        }
    }
}

impl BuiltinCommand for Exit {
    const TERMINATES: bool = true;

    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        Ok(self.code.unwrap_or(0))
    }
}

/// Write the arguments to standard output, separated by spaces.
///
/// Arguments are printed as-is; options such as `-n` are not interpreted.
pub struct Echo {
    pub args: Vec<String>,
}

impl FromArgs for Echo {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        Ok(Echo {
            args: args.iter().map(|arg| arg.to_string()).collect(),
        })
    }
}

impl BuiltinCommand for Echo {
    fn name() -> &'static str {
        "echo"
    }

    fn execute(self, stdout: &mut dyn Write, _env: &mut Environment) -> Result<ExitCode> {
        writeln!(stdout, "{}", self.args.join(" "))?;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Tell how each name would be interpreted if used as a command.
pub struct Type {
    #[argh(positional, greedy)]
    /// command names to look up.
    pub names: Vec<String>,
}

impl BuiltinCommand for Type {
    fn name() -> &'static str {
        "type"
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let mut status = 0;
        for name in &self.names {
            match resolver::resolve(name, env) {
                CommandResolution::Builtin(builtin) => {
                    writeln!(stdout, "{builtin} is a shell builtin")?
                }
                CommandResolution::External(path) => {
                    writeln!(stdout, "{name} is {}", path.display())?
                }
                CommandResolution::NotFound => {
                    writeln!(stdout, "{name}: not found")?;
                    status = 1;
                }
            }
        }
        Ok(status)
    }
}
