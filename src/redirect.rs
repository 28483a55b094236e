//! Output redirection: extraction of operators from the word vector and
//! delivery of a stream's text to its target file.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

/// Output stream a redirection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// How the target file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `>`, `1>`, `2>`: replace the file's contents.
    Truncate,
    /// `>>`, `1>>`, `2>>`: add to the end of the file.
    Append,
}

/// A single `{stream, mode, target}` entry of a [`RedirectionPlan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub stream: Stream,
    pub kind: RedirectKind,
    pub target: String,
}

/// Errors raised while applying a redirection.
#[derive(Debug, Error)]
pub enum RedirectError {
    #[error("{path}: No such file or directory")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{path}: write failed")]
    Write {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// At most one redirection per stream for a single command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionPlan {
    stdout: Option<Redirect>,
    stderr: Option<Redirect>,
}

impl RedirectionPlan {
    /// The redirection for `stream`, if any.
    pub fn get(&self, stream: Stream) -> Option<&Redirect> {
        match stream {
            Stream::Stdout => self.stdout.as_ref(),
            Stream::Stderr => self.stderr.as_ref(),
        }
    }

    pub fn is_redirected(&self, stream: Stream) -> bool {
        self.get(stream).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    fn set(&mut self, redirect: Redirect) {
        match redirect.stream {
            Stream::Stdout => self.stdout = Some(redirect),
            Stream::Stderr => self.stderr = Some(redirect),
        }
    }
}

impl Redirect {
    /// Opens the target (relative paths are taken from `cwd`) and writes `text` once.
    ///
    /// The file is created even when `text` is empty, so `cmd > f` always leaves `f` behind.
    pub fn write(&self, cwd: &Path, text: &str) -> Result<(), RedirectError> {
        let path = cwd.join(&self.target);
        let mut options = OpenOptions::new();
        match self.kind {
            RedirectKind::Truncate => options.write(true).create(true).truncate(true),
            RedirectKind::Append => options.append(true).create(true),
        };

        tracing::debug!(path = %path.display(), kind = ?self.kind, bytes = text.len(), "writing redirection");
        let mut file = options.open(&path).map_err(|source| RedirectError::Open {
            path: self.target.clone(),
            source,
        })?;
        file.write_all(text.as_bytes())
            .map_err(|source| RedirectError::Write {
                path: self.target.clone(),
                source,
            })
    }
}

fn parse_operator(word: &str) -> Option<(Stream, RedirectKind)> {
    match word {
        ">" | "1>" => Some((Stream::Stdout, RedirectKind::Truncate)),
        ">>" | "1>>" => Some((Stream::Stdout, RedirectKind::Append)),
        "2>" => Some((Stream::Stderr, RedirectKind::Truncate)),
        "2>>" => Some((Stream::Stderr, RedirectKind::Append)),
        _ => None,
    }
}

/// Removes redirection operators and their targets from `words`.
///
/// Operators are recognized only as whole words. Each operator takes the next
/// word as its target; an operator with no following word is dropped without
/// producing an entry. When a stream is redirected twice the later entry wins.
pub fn extract_redirection(words: Vec<String>) -> (Vec<String>, RedirectionPlan) {
    let mut clean = Vec::with_capacity(words.len());
    let mut plan = RedirectionPlan::default();
    let mut iter = words.into_iter();

    while let Some(word) = iter.next() {
        let Some((stream, kind)) = parse_operator(&word) else {
            clean.push(word);
            continue;
        };
        match iter.next() {
            Some(target) => plan.set(Redirect {
                stream,
                kind,
                target,
            }),
            None => tracing::debug!(operator = %word, "dangling redirection operator ignored"),
        }
    }

    (clean, plan)
}
