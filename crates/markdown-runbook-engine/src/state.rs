//! Execution state that survives re-renders of a preview.
//!
//! Buttons are identified by a [`CommandKey`] derived from what the button
//! does (action, command text) plus how many identical buttons precede it.
//! Editing unrelated parts of a document therefore keeps checkmarks on the
//! commands that actually ran; only reordering identical commands can move
//! them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{ActionKind, Command};

/// Stable identity of an interactive command within a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandKey(String);

impl CommandKey {
    /// Key of the `rank`-th (zero-based) occurrence of `command`.
    pub fn new(command: &Command, rank: usize) -> Self {
        let kind = command.action.kind();
        Self(format!(
            "{}-{:016x}-{rank}",
            kind.keyword(),
            fingerprint(kind, &command.text)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommandKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// FNV-1a over the action keyword and text; stable across runs and builds.
fn fingerprint(kind: ActionKind, text: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    kind.keyword()
        .bytes()
        .chain(std::iter::once(0))
        .chain(text.bytes())
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Hands out ranks for identical commands in document order.
#[derive(Debug, Default)]
pub struct KeyRanker {
    seen: HashMap<(ActionKind, String), usize>,
}

impl KeyRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many identical commands came before this one.
    pub fn next_rank(&mut self, command: &Command) -> usize {
        let slot = self
            .seen
            .entry((command.action.kind(), command.text.clone()))
            .or_insert(0);
        let rank = *slot;
        *slot += 1;
        rank
    }
}

/// Commands that have fired at least once in a preview session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionState {
    executed: BTreeSet<CommandKey>,
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an execution; returns `false` if it had already fired.
    pub fn mark(&mut self, key: CommandKey) -> bool {
        self.executed.insert(key)
    }

    pub fn contains(&self, key: &CommandKey) -> bool {
        self.executed.contains(key)
    }

    pub fn len(&self) -> usize {
        self.executed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.executed.is_empty()
    }
}
