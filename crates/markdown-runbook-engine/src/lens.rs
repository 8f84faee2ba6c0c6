//! Editor-side hints: one lens per command, a status summary, and whether a
//! document deserves an automatic preview.

use std::collections::BTreeSet;

use crate::answer_key::AnswerKeySnapshot;
use crate::models::{Action, Command, Location};
use crate::render::{CommandOrigin, Rendered, RenderedCommand, render_document};
use crate::state::ExecutionState;

/// A clickable hint anchored at a command in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLens {
    pub location: Location,
    pub title: String,
    pub command: Command,
    /// Identical commands the preview shows earlier; together with the
    /// command this gives the preview button's key.
    pub rank: usize,
    pub inline: bool,
}

impl From<RenderedCommand> for CommandLens {
    fn from(found: RenderedCommand) -> Self {
        let title = match (found.origin, &found.command.action) {
            (CommandOrigin::Block { lines }, Action::Copy) => format!("📋 Copy All ({lines} lines)"),
            (CommandOrigin::Block { lines }, _) => format!("▶ Run All ({lines} commands)"),
            (_, action) => title(action, &found.command.text),
        };
        Self {
            location: found.location,
            title,
            command: found.command,
            rank: found.rank,
            inline: found.origin == CommandOrigin::Inline,
        }
    }
}

fn title(action: &Action, text: &str) -> String {
    match action {
        Action::Execute {
            terminal: Some(name),
            ..
        } => format!("▶ Run in '{name}': {text}"),
        Action::Execute { terminal: None, .. } => format!("▶ Run: {text}"),
        Action::Copy => format!("📋 Copy: {text}"),
        Action::Open => format!("📂 Open: {text}"),
    }
}

/// What the preview would show for `text`, without state or answer keys.
fn preview_of(text: &str) -> Rendered {
    render_document(text, &ExecutionState::new(), &AnswerKeySnapshot::empty())
}

/// Lenses for `text`, one per preview button, in preview order.
///
/// Block lenses sit on the opening fence and are always present; the
/// per-command hints are controlled by `show_inline_hints`.
pub fn collect_lenses(text: &str, show_inline_hints: bool) -> Vec<CommandLens> {
    preview_of(text)
        .commands
        .into_iter()
        .filter(|found| show_inline_hints || found.origin != CommandOrigin::Inline)
        .map(CommandLens::from)
        .collect()
}

/// Summary for a status bar, or `None` when the document has no commands.
pub fn status_text(text: &str) -> Option<String> {
    let rendered = preview_of(text);
    let commands = rendered
        .commands
        .iter()
        .filter(|found| found.origin == CommandOrigin::Inline)
        .count();
    let blocks: BTreeSet<usize> = rendered
        .commands
        .iter()
        .filter(|found| found.origin != CommandOrigin::Inline)
        .map(|found| found.location.line)
        .collect();
    if commands == 0 && blocks.is_empty() {
        return None;
    }
    let mut parts = Vec::new();
    if commands > 0 {
        parts.push(plural(commands, "command"));
    }
    if !blocks.is_empty() {
        parts.push(plural(blocks.len(), "block"));
    }
    Some(format!("Runbook: {}", parts.join(", ")))
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Whether opening `text` should bring up the preview on its own.
pub fn should_auto_open(auto_open_preview: bool, text: &str) -> bool {
    auto_open_preview && is_interactive(text)
}

/// Whether the document has anything the preview makes clickable.
pub fn is_interactive(text: &str) -> bool {
    let rendered = preview_of(text);
    !rendered.commands.is_empty() || !rendered.quizzes.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "# Setup\n\
                       Install with `npm ci` {{ execute 'build' }}.\n\
                       \n\
                       ```bash {{ execute }}\n\
                       npm ci\n\
                       npm test\n\
                       ```\n\
                       See `README.md` {{ open }}\n";

    #[test]
    fn lenses_are_in_source_order() {
        let titles: Vec<String> = collect_lenses(DOC, true)
            .into_iter()
            .map(|lens| lens.title)
            .collect();
        assert_eq!(
            titles,
            vec![
                "▶ Run in 'build': npm ci",
                "▶ Run All (2 commands)",
                "📂 Open: README.md",
            ]
        );
    }

    #[test]
    fn inline_hints_can_be_hidden() {
        let lenses = collect_lenses(DOC, false);
        assert_eq!(lenses.len(), 1);
        assert_eq!(lenses[0].command.text, "{ npm ci && npm test; }");
        assert_eq!(lenses[0].location.line, 3);
    }

    #[test]
    fn ranks_count_identical_commands() {
        let doc = "`make` {{ execute }}\n\n```sh {{ execute }}\nmake\n```\n`make` {{ execute }} `make` {{ copy }}";
        let ranks: Vec<(String, usize)> = collect_lenses(doc, false)
            .into_iter()
            .map(|lens| (lens.command.text, lens.rank))
            .collect();
        assert_eq!(ranks, vec![("make".to_string(), 1)]);

        let ranks: Vec<usize> = collect_lenses(doc, true)
            .into_iter()
            .map(|lens| lens.rank)
            .collect();
        assert_eq!(ranks, vec![0, 1, 2, 0]);
    }

    #[test]
    fn open_blocks_get_one_lens_per_line() {
        let doc = "```text {{ open }}\na.md\nb.md\n```";
        let texts: Vec<String> = collect_lenses(doc, true)
            .into_iter()
            .map(|lens| lens.command.text)
            .collect();
        assert_eq!(texts, vec!["a.md", "b.md"]);
        assert_eq!(status_text(doc).as_deref(), Some("Runbook: 1 block"));
    }

    #[test]
    fn code_examples_get_no_lenses() {
        let doc = "Example:\n\n    `make` {{ execute }}\n\nNow run `make` {{ execute }}\n";
        let lenses = collect_lenses(doc, true);
        assert_eq!(lenses.len(), 1);
        assert_eq!(lenses[0].rank, 0);
        assert_eq!(
            lenses[0].location,
            Location {
                line: 4,
                start_column: 8,
                end_column: 28,
            }
        );
        assert_eq!(status_text(doc).as_deref(), Some("Runbook: 1 command"));

        assert!(collect_lenses("\\`rm -rf /\\` {{ execute }}", true).is_empty());
        assert!(!is_interactive("<pre>\n`rm -rf /` {{ execute }}\n</pre>\n"));
    }

    #[test]
    fn lens_locations_follow_extracted_blocks() {
        let doc = "```quiz\nQ\nA) a\nB) b\n```\n\n```sh\nls\nrun `make` {{ execute }}\n```\n\nthen `pwd` {{ copy }}\n";
        let located: Vec<(String, usize, usize)> = collect_lenses(doc, true)
            .into_iter()
            .map(|lens| (lens.command.text, lens.location.line, lens.location.start_column))
            .collect();
        assert_eq!(
            located,
            vec![("make".to_string(), 8, 4), ("pwd".to_string(), 11, 5)]
        );
    }

    #[test]
    fn status_counts_commands_and_blocks() {
        assert_eq!(status_text(DOC).as_deref(), Some("Runbook: 2 commands, 1 block"));
        assert_eq!(status_text("# Nothing here"), None);
    }

    #[test]
    fn auto_open_needs_setting_and_interactive_content() {
        assert!(should_auto_open(true, DOC));
        assert!(!should_auto_open(false, DOC));
        assert!(!should_auto_open(true, "`careful` {{ warning }}"));
        assert!(should_auto_open(true, "`Why?` {{ quiz }}"));
    }
}
