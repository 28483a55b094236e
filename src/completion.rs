//! Tab completion of command names.
//!
//! [`CompletionEngine`] is a small state machine that decides, for each Tab press,
//! whether to complete, extend to a common prefix, ring the bell or list every
//! candidate. [`ShellHelper`] plugs it into rustyline.

use crate::builtin::BUILTIN_NAMES;
use crate::resolver;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// What the line editor should do in response to one completion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Ring the bell and leave the line unchanged.
    Bell,
    /// Replace the word being completed with this text.
    Replace(String),
    /// Print every candidate below the prompt and redraw the line.
    List(Vec<String>),
    /// Let the line editor choose among these.
    Candidates(Vec<String>),
}

/// Tab presses seen for the current prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PressState {
    #[default]
    Fresh,
    /// One ambiguous press: the bell rang.
    Pressed,
    /// The candidates have been listed.
    Listed,
}

/// Completion state carried between requests.
#[derive(Debug, Default)]
pub struct CompletionState {
    last_prefix: String,
    press: PressState,
    candidates: Vec<String>,
}

impl CompletionState {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Default)]
pub struct CompletionEngine {
    state: CompletionState,
}

impl CompletionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles one completion request for the partial `line`.
    ///
    /// `search_paths` is the current PATH value; it is scanned on every call.
    pub fn complete(&mut self, line: &str, search_paths: Option<&str>) -> Completion {
        let prefix = line.trim();
        if prefix.is_empty() {
            return Completion::Candidates(BUILTIN_NAMES.iter().map(|s| s.to_string()).collect());
        }
        let candidates = matching_candidates(prefix, search_paths);
        self.step(prefix, candidates)
    }

    fn step(&mut self, prefix: &str, candidates: Vec<String>) -> Completion {
        if self.state.last_prefix != prefix {
            self.state.reset();
            self.state.last_prefix = prefix.to_owned();
        }
        self.state.candidates = candidates;

        match self.state.candidates.as_slice() {
            [] => {
                self.state.press = PressState::Pressed;
                Completion::Bell
            }
            [only] => {
                let replacement = format!("{only} ");
                self.state.reset();
                Completion::Replace(replacement)
            }
            many => {
                // Only extend to a prefix that is itself a command.
                let lcp = longest_common_prefix(many);
                if lcp.len() > prefix.len() && many.contains(&lcp) {
                    self.state.reset();
                    return Completion::Replace(lcp);
                }
                match self.state.press {
                    PressState::Fresh | PressState::Listed => {
                        self.state.press = PressState::Pressed;
                        Completion::Bell
                    }
                    PressState::Pressed => {
                        self.state.press = PressState::Listed;
                        Completion::List(self.state.candidates.clone())
                    }
                }
            }
        }
    }
}

/// Builtins and PATH executables starting with `prefix`, sorted and deduplicated.
fn matching_candidates(prefix: &str, search_paths: Option<&str>) -> Vec<String> {
    let mut names: BTreeSet<String> = BUILTIN_NAMES.iter().map(|s| s.to_string()).collect();
    if let Some(search_paths) = search_paths {
        names.extend(resolver::path_executables(search_paths));
    }
    names
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect()
}

/// Longest common prefix, shrinking the first item until every other one starts with it.
pub fn longest_common_prefix(items: &[String]) -> String {
    let Some((first, rest)) = items.split_first() else {
        return String::new();
    };
    let mut prefix = first.as_str();
    for item in rest {
        while !item.starts_with(prefix) {
            let mut chars = prefix.chars();
            chars.next_back();
            prefix = chars.as_str();
        }
    }
    prefix.to_owned()
}

/// rustyline helper providing command-name completion.
pub struct ShellHelper {
    engine: RefCell<CompletionEngine>,
    search_paths: Option<String>,
}

impl ShellHelper {
    pub fn new(search_paths: Option<String>) -> Self {
        Self {
            engine: RefCell::new(CompletionEngine::new()),
            search_paths,
        }
    }
}

fn pair(text: String) -> Pair {
    Pair {
        display: text.clone(),
        replacement: text,
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];
        let start = line.len() - line.trim_start().len();
        let completion = self
            .engine
            .borrow_mut()
            .complete(line, self.search_paths.as_deref());
        tracing::debug!(?completion, "completion");

        let pairs = match completion {
            // An empty candidate list makes rustyline beep.
            Completion::Bell => Vec::new(),
            Completion::Replace(text) => vec![pair(text)],
            Completion::Candidates(names) => names.into_iter().map(pair).collect(),
            Completion::List(names) => {
                let mut stdout = io::stdout();
                write!(stdout, "\n{}\n", names.join("  "))?;
                stdout.flush()?;
                // Re-inserting the word as-is makes rustyline redraw the prompt below the list.
                vec![pair(line[start..].to_owned())]
            }
        };
        Ok((start, pairs))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lcp_of_sets() {
        assert_eq!(longest_common_prefix(&[]), "");
        assert_eq!(longest_common_prefix(&names(&["echo"])), "echo");
        assert_eq!(longest_common_prefix(&names(&["xyz_one", "xyz_two"])), "xyz_");
        assert_eq!(longest_common_prefix(&names(&["abc", "xyz"])), "");
        assert_eq!(longest_common_prefix(&names(&["föö", "föx"])), "fö");
    }

    #[test]
    fn test_empty_line_offers_builtins_without_touching_state() {
        let mut engine = CompletionEngine::new();
        assert_eq!(engine.step("xyz", names(&["xyz_one", "xyz_two"])), Completion::Bell);

        assert_eq!(
            engine.complete("   ", None),
            Completion::Candidates(names(&BUILTIN_NAMES))
        );

        assert_eq!(
            engine.step("xyz", names(&["xyz_one", "xyz_two"])),
            Completion::List(names(&["xyz_one", "xyz_two"]))
        );
    }

    #[test]
    fn test_single_candidate_completes_with_space() {
        let mut engine = CompletionEngine::new();
        assert_eq!(engine.complete("ech", None), Completion::Replace("echo ".to_string()));
        assert_eq!(engine.complete("  ty", None), Completion::Replace("type ".to_string()));
    }

    #[test]
    fn test_no_candidates_rings_every_time() {
        let mut engine = CompletionEngine::new();
        for _ in 0..3 {
            assert_eq!(engine.step("qqq", Vec::new()), Completion::Bell);
        }
        assert_eq!(engine.complete("zzz_no_such_command_prefix", None), Completion::Bell);
    }

    #[test]
    fn test_ambiguous_prefix_rings_then_lists() {
        let mut engine = CompletionEngine::new();
        let candidates = names(&["xyz_one", "xyz_two"]);

        assert_eq!(engine.step("xyz", candidates.clone()), Completion::Bell);
        assert_eq!(
            engine.step("xyz", candidates.clone()),
            Completion::List(candidates.clone())
        );
        // The cycle starts over instead of listing again right away.
        assert_eq!(engine.step("xyz", candidates.clone()), Completion::Bell);
        assert_eq!(
            engine.step("xyz", candidates.clone()),
            Completion::List(candidates)
        );
    }

    #[test]
    fn test_changing_prefix_resets_presses() {
        let mut engine = CompletionEngine::new();
        assert_eq!(engine.step("xyz", names(&["xyz_one", "xyz_two"])), Completion::Bell);
        assert_eq!(engine.step("xyz_", names(&["xyz_one", "xyz_two"])), Completion::Bell);
        assert_eq!(
            engine.step("xyz_", names(&["xyz_one", "xyz_two"])),
            Completion::List(names(&["xyz_one", "xyz_two"]))
        );
    }

    #[test]
    fn test_extends_only_to_a_prefix_that_is_a_candidate() {
        let mut engine = CompletionEngine::new();
        assert_eq!(
            engine.step("xyz_", names(&["xyz_foo", "xyz_foo_bar", "xyz_foo_bar_baz"])),
            Completion::Replace("xyz_foo".to_string())
        );
        assert_eq!(
            engine.step("xyz_foo_", names(&["xyz_foo_bar", "xyz_foo_bar_baz"])),
            Completion::Replace("xyz_foo_bar".to_string())
        );
        assert_eq!(
            engine.step("xyz_foo_bar_", names(&["xyz_foo_bar_baz"])),
            Completion::Replace("xyz_foo_bar_baz ".to_string())
        );
        // `xyz_` is not a command, so it is not offered.
        assert_eq!(engine.step("xyz", names(&["xyz_one", "xyz_two"])), Completion::Bell);
    }

    fn replacements(pairs: &[Pair]) -> Vec<&str> {
        pairs.iter().map(|p| p.replacement.as_str()).collect()
    }

    #[test]
    #[cfg(unix)]
    fn test_helper_translates_completions_for_rustyline() {
        use rustyline::history::DefaultHistory;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        for name in ["xyz_one", "xyz_two"] {
            let path = dir.path().join(name);
            fs::write(&path, "#!/bin/sh\n").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let helper = ShellHelper::new(Some(dir.path().to_string_lossy().into_owned()));
        let history = DefaultHistory::new();
        let ctx = Context::new(&history);

        let (start, pairs) = helper.complete("  ech", 5, &ctx).unwrap();
        assert_eq!((start, replacements(&pairs)), (2, vec!["echo "]));

        // No pairs is what makes rustyline ring the bell.
        let (start, pairs) = helper.complete("zzz", 3, &ctx).unwrap();
        assert_eq!(start, 0);
        assert!(pairs.is_empty());

        let (_, pairs) = helper.complete("xyz", 3, &ctx).unwrap();
        assert!(pairs.is_empty());
        let (start, pairs) = helper.complete("xyz", 3, &ctx).unwrap();
        assert_eq!((start, replacements(&pairs)), (0, vec!["xyz"]));

        // Only the text before the cursor is completed.
        let (start, pairs) = helper.complete("xyz_t rest", 5, &ctx).unwrap();
        assert_eq!((start, replacements(&pairs)), (0, vec!["xyz_two "]));
    }

    #[test]
    #[cfg(unix)]
    fn test_candidates_come_from_path_and_builtins() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        for name in ["xyz_one", "xyz_two", "echo"] {
            let path = dir.path().join(name);
            fs::write(&path, "#!/bin/sh\n").unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        }
        let path = dir.path().to_string_lossy().into_owned();

        assert_eq!(
            matching_candidates("xyz", Some(&path)),
            names(&["xyz_one", "xyz_two"])
        );
        assert_eq!(matching_candidates("ec", Some(&path)), names(&["echo"]));

        let mut engine = CompletionEngine::new();
        assert_eq!(engine.complete("xyz", Some(&path)), Completion::Bell);
        assert_eq!(
            engine.complete("xyz", Some(&path)),
            Completion::List(names(&["xyz_one", "xyz_two"]))
        );
        assert_eq!(
            engine.complete("xyz_t", Some(&path)),
            Completion::Replace("xyz_two ".to_string())
        );
    }
}
