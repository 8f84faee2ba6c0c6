//! # Tag Grammar
//!
//! Recognizes command, admonition and quiz tags in raw document text.
//!
//! ## Two phases
//!
//! 1. **Spans**: a byte [`cursor::Cursor`] finds balanced backtick runs and the
//!    `{{ ... }}` span that must follow them on the same line.
//! 2. **Classification**: [`directive`] tokenizes the directive body (bare
//!    words, quoted strings, `key=value` attributes) and maps it onto the
//!    closed [`Directive`] enum.
//!
//! Anything that fails either phase is simply not a tag. The grammar never
//! reports errors: malformed directives stay visible as literal text.
//!
//! ## Known limitation
//!
//! The word `interrupt` always sets the interrupt flag, quoted or not, so a
//! channel literally named "interrupt" cannot be addressed.

pub mod cursor;
pub mod directive;
pub mod fence;
pub mod kinds;
pub mod span;

pub use directive::{Directive, QuizAttrs, parse_directive_body, parse_directive_prefix};
pub use fence::{Fence, FenceRole, FencedRegion, fenced_regions};
pub use span::Span;

use crate::models::{BlockCommandDescriptor, Command, CommandDescriptor, Location};

use cursor::Cursor;
use kinds::CodeSpan;

/// A tag occurrence within one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// From the opening backtick to the closing `}}`.
    pub span: Span,
    /// Code span content, with CommonMark's single-space padding removed.
    pub code: String,
    pub directive: Directive,
}

/// A backtick code span within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSpanMatch {
    /// Full span including backticks.
    pub full: Span,
    /// Inner span (content between backticks).
    pub inner: Span,
}

/// Finds every code span in `line`, in order.
pub fn code_spans(line: &str) -> Vec<CodeSpanMatch> {
    let mut cur = Cursor::new(line);
    let mut out = Vec::new();
    while !cur.eof() {
        if cur.peek() != Some(CodeSpan::TICK) {
            cur.bump();
            continue;
        }
        match try_code_span(&mut cur) {
            Some(found) => out.push(found),
            None => {
                cur.bump_while(|b| b == CodeSpan::TICK);
            }
        }
    }
    out
}

/// Attempts to parse a code span at the cursor, which must sit on a backtick.
///
/// The span closes at the next backtick run of exactly the same length. On
/// failure the cursor is restored.
fn try_code_span(cur: &mut Cursor<'_>) -> Option<CodeSpanMatch> {
    let saved = cur.clone();
    let start = cur.pos();
    let width = cur.bump_while(|b| b == CodeSpan::TICK);
    let inner_start = cur.pos();

    while !cur.eof() {
        if cur.peek() != Some(CodeSpan::TICK) {
            cur.bump();
            continue;
        }
        let inner_end = cur.pos();
        if cur.bump_while(|b| b == CodeSpan::TICK) == width {
            let inner = Span {
                start: inner_start,
                end: inner_end,
            };
            if inner.is_empty() {
                break;
            }
            return Some(CodeSpanMatch {
                full: Span {
                    start,
                    end: cur.pos(),
                },
                inner,
            });
        }
    }

    *cur = saved;
    None
}

/// Code span content as CommonMark reads it: one leading and one trailing
/// space are dropped when both are present and the content is not all spaces.
pub fn code_text(raw: &str) -> &str {
    if raw.len() >= 2 && raw.starts_with(' ') && raw.ends_with(' ') && !raw.trim().is_empty() {
        &raw[1..raw.len() - 1]
    } else {
        raw
    }
}

/// Finds every tag in a single physical line.
pub fn parse_line(line: &str) -> Vec<Tag> {
    let mut tags = Vec::new();
    for span in code_spans(line) {
        let after = &line[span.full.end..];
        let Some((directive, used)) = parse_directive_prefix(after) else {
            continue;
        };
        tags.push(Tag {
            span: Span {
                start: span.full.start,
                end: span.full.end + used,
            },
            code: code_text(&line[span.inner.start..span.inner.end]).to_string(),
            directive,
        });
    }
    tags
}

/// Every inline command occurrence in `text`, in document order.
///
/// Parsing is stateless: the same text always yields the same descriptors.
pub fn parse_commands(text: &str) -> Vec<CommandDescriptor> {
    let mut out = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        for tag in parse_line(line) {
            let Directive::Command(action) = tag.directive else {
                continue;
            };
            let (start_column, end_column) = tag.span.columns(line);
            out.push(CommandDescriptor {
                location: Location {
                    line: line_no,
                    start_column,
                    end_column,
                },
                command: Command::new(tag.code, action),
            });
        }
    }
    out
}

/// Every fenced block whose opening fence carries a command directive.
pub fn parse_block_commands(text: &str) -> Vec<BlockCommandDescriptor> {
    let lines: Vec<&str> = text.lines().collect();
    fenced_regions(&lines)
        .into_iter()
        .filter_map(|region| {
            let FenceRole::Commands { language, action } = region.fence.role() else {
                return None;
            };
            let open = lines[region.open_line];
            Some(BlockCommandDescriptor {
                location: Location {
                    line: region.open_line,
                    start_column: 0,
                    end_column: open.chars().count(),
                },
                end_line: region.close_line,
                lines: block_lines(&region.body),
                action,
                language,
            })
        })
        .collect()
}

/// Commands of a block body: backticked spans if there are any, otherwise
/// every non-blank line with trailing whitespace removed.
pub fn block_lines(body: &[&str]) -> Vec<String> {
    let spans: Vec<String> = body
        .iter()
        .flat_map(|line| {
            code_spans(line)
                .into_iter()
                .map(|span| code_text(&line[span.inner.start..span.inner.end]).to_string())
        })
        .collect();
    if !spans.is_empty() {
        return spans;
    }
    body.iter()
        .map(|line| line.trim_end())
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether `line` holds at least one inline command tag.
pub fn has_command_tag(line: &str) -> bool {
    parse_line(line)
        .iter()
        .any(|tag| matches!(tag.directive, Directive::Command(_)))
}
