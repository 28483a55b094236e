use crate::command::{
    CommandFactory, CommandNotFound, ExecutionResult, ExitCode, NOT_FOUND_STATUS,
};
use crate::completion::ShellHelper;
use crate::env::Environment;
use crate::lexer;
use crate::redirect::{self, RedirectionPlan, Stream};
use rustyline::Editor;
use rustyline::config::{BellStyle, CompletionType, Config};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use std::io::Write;

/// Prompt printed before every line.
pub const PROMPT: &str = "$ ";

/// Factory allows creating instances of ExecutableCommand.
///
/// Only supports commands defined in this crate: builtins and `ExternalCommand`.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

/// A minimal shell-like interpreter that can execute built-in and external commands.
///
/// The interpreter owns the [`Environment`] and a list of [`CommandFactory`] objects
/// that are queried in order to create commands by name. See [`Default`] for the
/// factories included out of the box.
///
/// Example
/// ```
/// use tinysh::Interpreter;
/// let mut sh = Interpreter::default();
/// let mut out = Vec::new();
/// let mut err = Vec::new();
/// let exit = sh.execute_line("echo 'hello   world'", &mut out, &mut err).unwrap();
/// assert_eq!(exit, None);
/// assert_eq!(out, b"hello   world\n");
/// ```
pub struct Interpreter {
    env: Environment,
    commands: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create a new interpreter with a custom set of command factories.
    pub fn new(commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self::with_env(Environment::new(), commands)
    }

    /// Create an interpreter over an explicit environment.
    pub fn with_env(env: Environment, commands: Vec<Box<dyn CommandFactory>>) -> Self {
        Self { env, commands }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Run a single command invocation by name with arguments.
    ///
    /// Fails with [`CommandNotFound`] when no factory knows `name` or the program
    /// could not be started; any other error means the command itself failed.
    pub fn run(
        &mut self,
        name: &str,
        args: &[&str],
        plan: &RedirectionPlan,
    ) -> anyhow::Result<ExecutionResult> {
        for factory in &self.commands {
            if let Some(cmd) = factory.try_create(&self.env, name, args) {
                return cmd.execute(plan, &mut self.env);
            }
        }
        Err(CommandNotFound.into())
    }

    /// Processes one input line: tokenize, extract redirections, run, deliver output.
    ///
    /// Terminal-bound text goes to `out` and `err`. Returns `Some(status)` when the
    /// line ran `exit`, in which case nothing else from the line is delivered.
    pub fn execute_line(
        &mut self,
        line: &str,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> std::io::Result<Option<ExitCode>> {
        let (words, plan) = redirect::extract_redirection(lexer::split_into_words(line));
        let Some((name, args)) = words.split_first() else {
            return Ok(None);
        };
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        // Children write straight to the terminal, so nothing may be left buffered.
        out.flush()?;
        err.flush()?;

        let result = match self.run(name, &args, &plan) {
            Ok(result) => result,
            Err(e) if e.is::<CommandNotFound>() => ExecutionResult::failure(
                NOT_FOUND_STATUS,
                format!("{}: command not found\n", line.trim()),
            ),
            Err(e) => ExecutionResult::failure(1, format!("{e:#}\n")),
        };
        if result.terminates {
            return Ok(Some(result.status));
        }

        if plan.is_empty() {
            if let Some(text) = &result.stdout {
                out.write_all(text.as_bytes())?;
            }
            if let Some(text) = &result.stderr {
                err.write_all(text.as_bytes())?;
            }
            return Ok(None);
        }
        self.deliver(&result, &plan, Stream::Stdout, out, err)?;
        self.deliver(&result, &plan, Stream::Stderr, out, err)?;
        Ok(None)
    }

    /// Sends one stream of `result` to its redirection target or to the terminal.
    fn deliver(
        &self,
        result: &ExecutionResult,
        plan: &RedirectionPlan,
        stream: Stream,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> std::io::Result<()> {
        let text = result.text(stream);
        match plan.get(stream) {
            Some(target) => {
                if let Err(e) = target.write(&self.env.current_dir, text.unwrap_or_default()) {
                    tracing::debug!(error = ?e, "redirection failed");
                    writeln!(err, "{e}")?;
                }
            }
            None => match (stream, text) {
                (Stream::Stdout, Some(text)) => out.write_all(text.as_bytes())?,
                (Stream::Stderr, Some(text)) => err.write_all(text.as_bytes())?,
                (_, None) => {}
            },
        }
        Ok(())
    }

    /// Read-Eval-Print Loop over an interactive line editor.
    ///
    /// Returns the status requested by `exit`, or 0 when input ends.
    pub fn repl(&mut self) -> anyhow::Result<ExitCode> {
        let config = Config::builder()
            .completion_type(CompletionType::List)
            .bell_style(BellStyle::Audible)
            .build();
        let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::with_config(config)?;
        rl.set_helper(Some(ShellHelper::new(self.env.get_var("PATH").map(str::to_owned))));

        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        loop {
            match rl.readline(PROMPT) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        if let Err(e) = rl.add_history_entry(line.as_str()) {
                            tracing::warn!("Failed to add history entry: {}", e);
                        }
                    }
                    if let Some(status) =
                        self.execute_line(&line, &mut stdout.lock(), &mut stderr.lock())?
                    {
                        return Ok(status);
                    }
                }
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(0),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

impl Default for Interpreter {
    /// Create an interpreter with the default set of commands:
    /// - built-ins: `cd`, `echo`, `exit`, `pwd`, `type`
    /// - external command launcher
    fn default() -> Self {
        Self::new(default_factories())
    }
}

/// Builtin factories first, so a builtin shadows a PATH program of the same name.
pub fn default_factories() -> Vec<Box<dyn CommandFactory>> {
    use crate::builtin::*;
    use crate::external::ExternalCommand;
    vec![
        Box::new(Factory::<Cd>::default()),
        Box::new(Factory::<Echo>::default()),
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<Pwd>::default()),
        Box::new(Factory::<Type>::default()),
        Box::new(Factory::<ExternalCommand>::default()),
    ]
}
