use std::collections::HashMap;
use std::env as stdenv;
use std::path::PathBuf;

/// Home directory used by `cd` when `HOME` is not set.
pub const DEFAULT_HOME: &str = "/";

/// Mutable view of the process state owned by the interpreter.
///
/// The environment contains:
/// - `vars`: environment variables visible to resolution and to spawned programs.
/// - `current_dir`: the working directory for `pwd`, `cd`, redirections and children.
///
/// Builtins such as `cd` mutate it; everything else only reads it.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Key-value store of environment variables (e.g., PATH, HOME).
    pub vars: HashMap<String, String>,
    /// The current working directory for command execution.
    pub current_dir: PathBuf,
}

impl Environment {
    /// Capture the current process state into a new `Environment` instance.
    ///
    /// This copies variables from `std::env::vars()` and initializes `current_dir`
    /// from `std::env::current_dir()`.
    pub fn new() -> Self {
        let vars = stdenv::vars().collect();
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self { vars, current_dir }
    }

    /// Get the value of an environment variable.
    pub fn get_var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Set or override an environment variable.
    pub fn set_var(&mut self, key: impl Into<String>, val: impl Into<String>) {
        self.vars.insert(key.into(), val.into());
    }

    /// The `HOME` directory, or [`DEFAULT_HOME`] when it is unset or empty.
    pub fn home_dir(&self) -> PathBuf {
        match self.get_var("HOME") {
            Some(home) if !home.is_empty() => PathBuf::from(home),
            _ => PathBuf::from(DEFAULT_HOME),
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::env::{DEFAULT_HOME, Environment};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn empty_env() -> Environment {
        Environment {
            vars: HashMap::new(),
            current_dir: PathBuf::from("/"),
        }
    }

    #[test]
    fn test_env_set_and_get_var() {
        let mut env = empty_env();

        assert_eq!(env.get_var("SOME_RANDOM_ENV_VAR_12345"), None);

        env.set_var("KEY", "VALUE");

        assert_eq!(env.get_var("KEY"), Some("VALUE"));
    }

    #[test]
    fn test_env_reads_from_process_env() {
        let env = Environment::new();
        assert_eq!(env.vars.len(), std::env::vars().count());
    }

    #[test]
    fn test_home_dir_falls_back_when_unset() {
        let mut env = empty_env();
        assert_eq!(env.home_dir(), PathBuf::from(DEFAULT_HOME));

        env.set_var("HOME", "");
        assert_eq!(env.home_dir(), PathBuf::from(DEFAULT_HOME));

        env.set_var("HOME", "/home/someone");
        assert_eq!(env.home_dir(), PathBuf::from("/home/someone"));
    }
}
