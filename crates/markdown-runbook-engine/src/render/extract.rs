//! Pre-extraction: swaps complex fenced regions for inert placeholder fences
//! before markdown conversion, so the converter never touches their interior.

use crate::grammar::{self, Directive, FenceRole, fenced_regions};
use crate::models::{BlockCommandDescriptor, Command, CommandDescriptor, Location, QuizQuestion};
use crate::quiz::parse_quiz_block;

const PLACEHOLDER_PREFIX: &str = "%%RUNBOOK-PLACEHOLDER-";
const PLACEHOLDER_SUFFIX: &str = "%%";

/// A region lifted out of the document before conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Quiz {
        question: QuizQuestion,
        /// Zero-based source line of the opening fence.
        line: usize,
    },
    /// A fence whose opening line carries a command directive.
    RunAll(BlockCommandDescriptor),
    /// A plain fence with inline command tags on some of its lines.
    PerLine {
        language: Option<String>,
        lines: Vec<PerLine>,
    },
}

/// One line of a per-line block: the text shown and its commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerLine {
    /// The line with each command tag replaced by its command text.
    pub display: String,
    /// Commands of the line, located in the original document.
    pub commands: Vec<CommandDescriptor>,
}

/// The rewritten document plus the scratch table its placeholders index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub table: Vec<Extracted>,
    /// `line_map[n]` is the source line that line `n` of `text` came from.
    /// The three lines of a placeholder fence all map to the opening fence.
    pub line_map: Vec<usize>,
}

pub fn placeholder(index: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}{index}{PLACEHOLDER_SUFFIX}")
}

/// The table index named by a placeholder, if `content` is exactly one.
pub fn placeholder_index(content: &str) -> Option<usize> {
    content
        .trim()
        .strip_prefix(PLACEHOLDER_PREFIX)?
        .strip_suffix(PLACEHOLDER_SUFFIX)?
        .parse()
        .ok()
}

pub fn extract(text: &str) -> Extraction {
    let lines: Vec<&str> = text.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut line_map = Vec::with_capacity(lines.len());
    let mut table = Vec::new();
    let mut next_line = 0;

    for region in fenced_regions(&lines) {
        let extracted = match region.fence.role() {
            FenceRole::Quiz(attrs) => {
                parse_quiz_block(&attrs, &region.body).map(|question| Extracted::Quiz {
                    question,
                    line: region.open_line,
                })
            }
            FenceRole::Commands { language, action } => {
                let block_lines = grammar::block_lines(&region.body);
                (!block_lines.is_empty()).then(|| {
                    Extracted::RunAll(BlockCommandDescriptor {
                        location: Location {
                            line: region.open_line,
                            start_column: 0,
                            end_column: lines[region.open_line].chars().count(),
                        },
                        end_line: region.close_line,
                        lines: block_lines,
                        action,
                        language,
                    })
                })
            }
            FenceRole::Plain { language } => {
                if region.body.iter().any(|line| grammar::has_command_tag(line)) {
                    let first = region.open_line + 1;
                    Some(Extracted::PerLine {
                        language,
                        lines: region
                            .body
                            .iter()
                            .enumerate()
                            .map(|(offset, line)| per_line(line, lines[first + offset], first + offset))
                            .collect(),
                    })
                } else {
                    None
                }
            }
        };

        let Some(extracted) = extracted else {
            continue;
        };

        let open = lines[region.open_line];
        let indent = &open[..open.len() - open.trim_start_matches(' ').len()];
        out.extend(lines[next_line..region.open_line].iter().map(|l| l.to_string()));
        line_map.extend(next_line..region.open_line);
        out.push(format!("{indent}```"));
        out.push(format!("{indent}{}", placeholder(table.len())));
        out.push(format!("{indent}```"));
        line_map.extend([region.open_line; 3]);
        table.push(extracted);
        next_line = region.close_line + 1;
    }

    out.extend(lines[next_line..].iter().map(|l| l.to_string()));
    line_map.extend(next_line..lines.len());
    let mut text_out = out.join("\n");
    text_out.push('\n');
    Extraction {
        text: text_out,
        table,
        line_map,
    }
}

/// Splits one fence body line into display text and located commands.
/// `source` is the same line before the fence indentation was stripped.
fn per_line(line: &str, source: &str, line_no: usize) -> PerLine {
    let indent = source.len() - line.len();
    let mut display = String::with_capacity(line.len());
    let mut commands = Vec::new();
    let mut copied = 0;
    for tag in grammar::parse_line(line) {
        let Directive::Command(action) = tag.directive else {
            continue;
        };
        display.push_str(&line[copied..tag.span.start]);
        display.push_str(&tag.code);
        copied = tag.span.end;
        let (start_column, end_column) = tag.span.columns(line);
        commands.push(CommandDescriptor {
            location: Location {
                line: line_no,
                start_column: start_column + indent,
                end_column: end_column + indent,
            },
            command: Command::new(tag.code, action),
        });
    }
    display.push_str(&line[copied..]);
    PerLine {
        display: display.trim_end().to_string(),
        commands,
    }
}

/// Answer key selectors referenced by quizzes in `text`, deduplicated and
/// in first-seen order. `None` is the document's default key.
pub fn answer_key_selectors(text: &str) -> Vec<Option<String>> {
    let lines: Vec<&str> = text.lines().collect();
    let mut found: Vec<Option<String>> = Vec::new();
    let mut add = |selector: Option<String>| {
        if !found.contains(&selector) {
            found.push(selector);
        }
    };

    for region in fenced_regions(&lines) {
        if let FenceRole::Quiz(attrs) = region.fence.role() {
            add(attrs.answer_key);
        }
    }
    for line in &lines {
        for tag in grammar::parse_line(line) {
            if let Directive::Quiz(attrs) = tag.directive {
                add(attrs.answer_key);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Action, QuizKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn placeholder_round_trips() {
        assert_eq!(placeholder_index(&placeholder(12)), Some(12));
        assert_eq!(placeholder_index("  %%RUNBOOK-PLACEHOLDER-3%%\n"), Some(3));
        assert_eq!(placeholder_index("%%RUNBOOK-PLACEHOLDER-x%%"), None);
        assert_eq!(placeholder_index("echo hi"), None);
    }

    #[test]
    fn quiz_fence_is_replaced() {
        let doc = "Intro\n\n```quiz id=\"q1\"\nQ: 2+2?\nA) 3\nB) 4\n```\n\nOutro";
        let extraction = extract(doc);
        assert_eq!(
            extraction.text,
            "Intro\n\n```\n%%RUNBOOK-PLACEHOLDER-0%%\n```\n\nOutro\n"
        );
        let Extracted::Quiz { question, line } = &extraction.table[0] else {
            panic!("expected quiz");
        };
        assert!(matches!(question.kind, QuizKind::MultipleChoice(_)));
        assert_eq!(*line, 2);
        assert_eq!(extraction.line_map, vec![0, 1, 2, 2, 2, 7, 8]);
    }

    #[test]
    fn malformed_quiz_fence_passes_through() {
        let doc = "```quiz\nQ: only one\nA) yes\n```";
        let extraction = extract(doc);
        assert!(extraction.table.is_empty());
        assert_eq!(extraction.text, format!("{doc}\n"));
    }

    #[test]
    fn run_all_fence_is_replaced_with_indentation_kept() {
        let doc = "- step\n  ```bash {{ execute }}\n  npm ci\n  ```";
        let extraction = extract(doc);
        assert_eq!(
            extraction.text,
            "- step\n  ```\n  %%RUNBOOK-PLACEHOLDER-0%%\n  ```\n"
        );
        let Extracted::RunAll(block) = &extraction.table[0] else {
            panic!("expected run-all block");
        };
        assert_eq!(block.lines, vec!["npm ci"]);
    }

    #[test]
    fn per_line_fence_keeps_untagged_lines() {
        let doc = "```sh\n# setup\n`npm ci` {{ execute 'ci' }} # install\n```";
        let extraction = extract(doc);
        let Extracted::PerLine { language, lines } = &extraction.table[0] else {
            panic!("expected per-line block");
        };
        assert_eq!(language.as_deref(), Some("sh"));
        assert_eq!(lines[0].display, "# setup");
        assert!(lines[0].commands.is_empty());
        assert_eq!(lines[1].display, "npm ci # install");
        assert_eq!(
            lines[1].commands,
            vec![CommandDescriptor {
                location: Location {
                    line: 2,
                    start_column: 0,
                    end_column: 27,
                },
                command: Command::new(
                    "npm ci",
                    Action::Execute {
                        terminal: Some("ci".into()),
                        interrupt: false
                    }
                ),
            }]
        );
    }

    #[test]
    fn per_line_columns_count_fence_indentation() {
        let doc = "1. step
   ```
   `ls` {{ copy }}
   ```";
        let extraction = extract(doc);
        let Extracted::PerLine { lines, .. } = &extraction.table[0] else {
            panic!("expected per-line block");
        };
        assert_eq!(
            lines[0].commands[0].location,
            Location {
                line: 2,
                start_column: 3,
                end_column: 18,
            }
        );
    }

    #[test]
    fn plain_fences_stay_in_place() {
        let doc = "```rust\nfn main() {}\n```";
        assert!(extract(doc).table.is_empty());
    }

    #[test]
    fn selectors_cover_blocks_and_inline_quizzes() {
        let doc = "```quiz answerKey=\"a\"\nQ\nA) 1\nB) 2\n```\n`Why?` {{ quiz }}\n`How?` {{ quiz answerKey=\"a\" }}";
        assert_eq!(
            answer_key_selectors(doc),
            vec![Some("a".to_string()), None]
        );
    }
}
