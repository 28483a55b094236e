//! Command resolution: builtin, executable on PATH, or not found.
//!
//! Nothing here is cached. PATH and the filesystem are read again on every call,
//! so a program installed between two prompts is found on the next one.

use crate::builtin::BUILTIN_NAMES;
use crate::env::Environment;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// What a command name refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResolution {
    Builtin(&'static str),
    External(PathBuf),
    NotFound,
}

/// Resolve a command name the way a typical shell would.
///
/// Behavior:
/// - A builtin name always wins.
/// - A name containing a path separator (`/usr/bin/true`, `./run.sh`, `bin/tool`)
///   is looked up relative to the current directory and never searched on PATH.
/// - Any other name is searched in each PATH directory in order; the first
///   regular file named `name` is the match.
pub fn resolve(name: &str, env: &Environment) -> CommandResolution {
    if let Some(builtin) = BUILTIN_NAMES.iter().find(|b| **b == name) {
        return CommandResolution::Builtin(*builtin);
    }
    if name.is_empty() {
        return CommandResolution::NotFound;
    }

    let found = if name.contains(std::path::is_separator) {
        find_by_path(&env.current_dir.join(name))
    } else {
        env.get_var("PATH")
            .and_then(|search_paths| find_in_path(search_paths, name))
    };

    tracing::debug!(name, found = ?found, "resolved command");
    match found {
        Some(path) => CommandResolution::External(path),
        None => CommandResolution::NotFound,
    }
}

fn search_dirs(search_paths: &str) -> impl Iterator<Item = PathBuf> + '_ {
    std::env::split_paths(search_paths).filter(|dir| !dir.as_os_str().is_empty())
}

fn find_in_path(search_paths: &str, cmd: &str) -> Option<PathBuf> {
    search_dirs(search_paths).find_map(|dir| find_by_path(&dir.join(cmd)))
}

fn find_by_path(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        Some(path.to_path_buf())
    } else {
        None
    }
}

/// Names of every executable file found across all PATH directories.
///
/// Unreadable or missing directories are skipped.
pub fn path_executables(search_paths: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for dir in search_dirs(search_paths) {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            // fs::metadata follows symlinks, which is how most of /usr/bin looks.
            let Ok(metadata) = fs::metadata(entry.path()) else {
                continue;
            };
            if metadata.is_file() && is_executable(&metadata) {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
    }
    names
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    true
}
