use serde::{Deserialize, Serialize};

/// What a command tag asks the host to do.
///
/// Only `Execute` carries a channel and the interrupt flag; arguments written
/// after `copy` or `open` are accepted by the grammar and dropped here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Execute {
        /// Named channel; `None` targets the default channel.
        terminal: Option<String>,
        /// Send a cancel signal to the channel before the command.
        interrupt: bool,
    },
    Copy,
    Open,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Execute { .. } => ActionKind::Execute,
            Action::Copy => ActionKind::Copy,
            Action::Open => ActionKind::Open,
        }
    }

    /// Builds an action from its keyword plus the optional execute arguments.
    pub fn from_parts(kind: ActionKind, terminal: Option<String>, interrupt: bool) -> Self {
        match kind {
            ActionKind::Execute => Action::Execute {
                terminal,
                interrupt,
            },
            ActionKind::Copy => Action::Copy,
            ActionKind::Open => Action::Open,
        }
    }

    pub fn terminal(&self) -> Option<&str> {
        match self {
            Action::Execute { terminal, .. } => terminal.as_deref(),
            Action::Copy | Action::Open => None,
        }
    }

    pub fn interrupt(&self) -> bool {
        matches!(self, Action::Execute { interrupt: true, .. })
    }
}

/// The action keyword without its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Execute,
    Copy,
    Open,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Execute, ActionKind::Copy, ActionKind::Open];

    pub fn keyword(self) -> &'static str {
        match self {
            ActionKind::Execute => "execute",
            ActionKind::Copy => "copy",
            ActionKind::Open => "open",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == word)
    }
}

/// A command ready for dispatch: the literal text plus what to do with it.
///
/// Serializes to the flat payload carried by preview buttons:
/// `{"action":"execute","command":"npm test","terminalName":"t2","interrupt":true}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "WireCommand", from = "WireCommand")]
pub struct Command {
    pub text: String,
    pub action: Action,
}

impl Command {
    pub fn new(text: impl Into<String>, action: Action) -> Self {
        Self {
            text: text.into(),
            action,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCommand {
    action: ActionKind,
    command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    terminal_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    interrupt: bool,
}

impl From<Command> for WireCommand {
    fn from(command: Command) -> Self {
        let action = command.action.kind();
        let (terminal_name, interrupt) = match command.action {
            Action::Execute {
                terminal,
                interrupt,
            } => (terminal, interrupt),
            Action::Copy | Action::Open => (None, false),
        };
        Self {
            action,
            command: command.text,
            terminal_name,
            interrupt,
        }
    }
}

impl From<WireCommand> for Command {
    fn from(wire: WireCommand) -> Self {
        Command {
            text: wire.command,
            action: Action::from_parts(wire.action, wire.terminal_name, wire.interrupt),
        }
    }
}

/// Zero-based line plus character columns of a tag occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: usize,
    pub start_column: usize,
    pub end_column: usize,
}

/// One inline command tag found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub location: Location,
    pub command: Command,
}

/// A fenced block whose opening fence carries a command directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCommandDescriptor {
    /// Location of the opening fence line.
    pub location: Location,
    /// Zero-based line of the closing fence.
    pub end_line: usize,
    pub lines: Vec<String>,
    pub action: Action,
    /// Display-only highlighting language from the fence.
    pub language: Option<String>,
}

impl BlockCommandDescriptor {
    /// The single command a "Run All" button sends for this block.
    ///
    /// `open` blocks have no composite: each line is its own path.
    pub fn composite(&self) -> Option<Command> {
        let text = match self.action {
            Action::Execute { .. } => match self.lines.as_slice() {
                [] => return None,
                [single] => single.clone(),
                lines => format!("{{ {}; }}", lines.join(" && ")),
            },
            Action::Copy => self.lines.join("\n"),
            Action::Open => return None,
        };
        Some(Command::new(text, self.action.clone()))
    }

    /// One command per body line, carrying the block's action.
    pub fn line_commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.lines
            .iter()
            .map(|line| Command::new(line.clone(), self.action.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(lines: &[&str], action: Action) -> BlockCommandDescriptor {
        BlockCommandDescriptor {
            location: Location {
                line: 0,
                start_column: 0,
                end_column: 0,
            },
            end_line: lines.len() + 1,
            lines: lines.iter().map(|l| l.to_string()).collect(),
            action,
            language: None,
        }
    }

    #[test]
    fn execute_payload_uses_camel_case_wire_names() {
        let command = Command::new(
            "npm test",
            Action::Execute {
                terminal: Some("t2".into()),
                interrupt: true,
            },
        );
        let json = serde_json::to_string(&command).unwrap();
        assert_eq!(
            json,
            r#"{"action":"execute","command":"npm test","terminalName":"t2","interrupt":true}"#
        );
    }

    #[test]
    fn copy_payload_omits_execute_fields() {
        let json = serde_json::to_string(&Command::new("ls", Action::Copy)).unwrap();
        assert_eq!(json, r#"{"action":"copy","command":"ls"}"#);
    }

    #[test]
    fn payload_without_optional_fields_parses_to_default_channel() {
        let command: Command =
            serde_json::from_str(r#"{"action":"execute","command":"make"}"#).unwrap();
        assert_eq!(
            command.action,
            Action::Execute {
                terminal: None,
                interrupt: false
            }
        );
    }

    #[test]
    fn open_payload_drops_stray_terminal() {
        let command: Command =
            serde_json::from_str(r#"{"action":"open","command":"a.md","terminalName":"x"}"#)
                .unwrap();
        assert_eq!(command.action, Action::Open);
    }

    #[test]
    fn execute_composite_wraps_joined_lines() {
        let descriptor = block(
            &["npm install", "npm test"],
            Action::Execute {
                terminal: None,
                interrupt: false,
            },
        );
        assert_eq!(
            descriptor.composite().unwrap().text,
            "{ npm install && npm test; }"
        );
    }

    #[test]
    fn single_line_composite_is_not_wrapped() {
        let descriptor = block(
            &["make"],
            Action::Execute {
                terminal: None,
                interrupt: false,
            },
        );
        assert_eq!(descriptor.composite().unwrap().text, "make");
    }

    #[test]
    fn copy_composite_joins_with_newlines() {
        let descriptor = block(&["a", "b"], Action::Copy);
        assert_eq!(descriptor.composite().unwrap().text, "a\nb");
    }

    #[test]
    fn open_blocks_have_no_composite() {
        assert!(block(&["README.md"], Action::Open).composite().is_none());
        assert_eq!(block(&["a", "b"], Action::Open).line_commands().count(), 2);
    }
}
