//! A small interactive shell.
//!
//! Each input line is split into words with POSIX quoting rules, stripped of
//! output redirections, resolved to a builtin or a program on PATH, executed, and
//! its output delivered to the terminal or to the redirection targets.
//!
//! The main entry point is [`Interpreter`]. The public modules [`command`] and
//! [`env`] expose traits and types for implementing your own commands and for
//! interacting with the process environment.

mod builtin;
pub mod command;
pub mod completion;
pub mod env;
mod external;
mod interpreter;
pub mod lexer;
pub mod redirect;
pub mod resolver;

pub use builtin::BUILTIN_NAMES;
pub use interpreter::{Interpreter, PROMPT, default_factories};
