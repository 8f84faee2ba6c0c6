use crate::models::Action;

use super::directive::{Directive, QUIZ, QuizAttrs, parse_directive_body, parse_directive_prefix};
use super::kinds::DirectiveDelims;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceKind {
    Backticks,
    Tildes,
}

impl FenceKind {
    fn marker(self) -> u8 {
        match self {
            FenceKind::Backticks => b'`',
            FenceKind::Tildes => b'~',
        }
    }
}

/// An opening code fence line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    pub kind: FenceKind,
    /// Number of fence characters; closing fences need at least as many.
    pub width: usize,
    /// Info string after the fence characters, trimmed.
    pub info: String,
}

/// What a fence's info string asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceRole {
    /// ```` ```quiz id="q1" ````
    Quiz(QuizAttrs),
    /// ```` ```bash {{ execute 't2' }} ````
    Commands {
        language: Option<String>,
        action: Action,
    },
    /// Any other fence, including ones with a language only.
    Plain { language: Option<String> },
}

impl Fence {
    pub const MIN_WIDTH: usize = 3;
    pub const MAX_INDENT: usize = 3;

    /// Parses an opening fence line (up to three spaces of indentation).
    pub fn open(line: &str) -> Option<Fence> {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > Self::MAX_INDENT {
            return None;
        }
        let kind = match trimmed.as_bytes().first()? {
            b'`' => FenceKind::Backticks,
            b'~' => FenceKind::Tildes,
            _ => return None,
        };
        let width = trimmed.bytes().take_while(|&b| b == kind.marker()).count();
        if width < Self::MIN_WIDTH {
            return None;
        }
        let info = trimmed[width..].trim();
        if kind == FenceKind::Backticks && info.contains('`') {
            return None;
        }
        Some(Fence {
            kind,
            width,
            info: info.to_string(),
        })
    }

    /// Whether `line` closes this fence.
    pub fn closed_by(&self, line: &str) -> bool {
        let line = line.trim_end_matches(['\r', '\n']);
        let trimmed = line.trim_start_matches(' ');
        if line.len() - trimmed.len() > Self::MAX_INDENT {
            return false;
        }
        let width = trimmed
            .bytes()
            .take_while(|&b| b == self.kind.marker())
            .count();
        width >= self.width && trimmed[width..].trim().is_empty()
    }

    pub fn role(&self) -> FenceRole {
        let info = self.info.as_str();
        let first_word = info.split_whitespace().next();

        if first_word == Some(QUIZ) {
            if let Some(Directive::Quiz(attrs)) = parse_directive_body(info) {
                return FenceRole::Quiz(attrs);
            }
            return FenceRole::Plain {
                language: first_word.map(str::to_string),
            };
        }

        if let Some(open) = info.find(DirectiveDelims::OPEN) {
            let language = info[..open].trim();
            let single_word = !language.contains(char::is_whitespace);
            if single_word
                && let Some((Directive::Command(action), used)) =
                    parse_directive_prefix(&info[open..])
                && info[open + used..].trim().is_empty()
            {
                return FenceRole::Commands {
                    language: (!language.is_empty()).then(|| language.to_string()),
                    action,
                };
            }
        }

        FenceRole::Plain {
            language: first_word.map(str::to_string),
        }
    }
}

/// A closed fenced region in a document, addressed by line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FencedRegion<'a> {
    pub fence: Fence,
    /// Zero-based line of the opening fence.
    pub open_line: usize,
    /// Zero-based line of the closing fence.
    pub close_line: usize,
    /// Lines between the fences, with the opening fence's indentation removed.
    pub body: Vec<&'a str>,
}

/// Finds every closed top-level fenced region in `lines`.
///
/// A fence that never closes runs to the end of the document and is not
/// reported, so nothing after it is treated as a region either.
pub fn fenced_regions<'a>(lines: &[&'a str]) -> Vec<FencedRegion<'a>> {
    let mut regions = Vec::new();
    let mut index = 0;
    while index < lines.len() {
        let Some(fence) = Fence::open(lines[index]) else {
            index += 1;
            continue;
        };
        let Some(offset) = lines[index + 1..]
            .iter()
            .position(|line| fence.closed_by(line))
        else {
            break;
        };
        let close_line = index + 1 + offset;
        let indent = lines[index].len() - lines[index].trim_start_matches(' ').len();
        regions.push(FencedRegion {
            fence,
            open_line: index,
            close_line,
            body: lines[index + 1..close_line]
                .iter()
                .map(|&line| strip_indent(line, indent))
                .collect(),
        });
        index = close_line + 1;
    }
    regions
}

/// Removes up to `indent` leading spaces, as CommonMark does for the
/// content of an indented fence.
fn strip_indent(line: &str, indent: usize) -> &str {
    let spaces = line.bytes().take(indent).take_while(|&b| b == b' ').count();
    &line[spaces..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn detect_backtick_fence() {
        let fence = Fence::open("```rust").unwrap();
        assert_eq!(fence.kind, FenceKind::Backticks);
        assert_eq!(fence.width, 3);
        assert_eq!(fence.info, "rust");
    }

    #[test]
    fn detect_tilde_fence() {
        assert_eq!(Fence::open("~~~~").unwrap().kind, FenceKind::Tildes);
    }

    #[test]
    fn no_fence() {
        assert_eq!(Fence::open("hello"), None);
        assert_eq!(Fence::open("``"), None);
        assert_eq!(Fence::open("    ```"), None);
        assert_eq!(Fence::open("``` `x` "), None);
    }

    #[test]
    fn closes_matching_fence() {
        let fence = Fence::open("````").unwrap();
        assert!(fence.closed_by("`````"));
        assert!(fence.closed_by("````  "));
        assert!(!fence.closed_by("```"));
        assert!(!fence.closed_by("~~~~"));
        assert!(!fence.closed_by("```` rust"));
    }

    #[test]
    fn quiz_role_carries_attributes() {
        let fence = Fence::open("```quiz id=\"q1\" answerKey=\"extra\"").unwrap();
        assert_eq!(
            fence.role(),
            FenceRole::Quiz(QuizAttrs {
                id: Some("q1".into()),
                answer_key: Some("extra".into()),
            })
        );
    }

    #[test]
    fn command_role_with_language_and_channel() {
        let fence = Fence::open("```bash {{ execute 'build' interrupt }}").unwrap();
        assert_eq!(
            fence.role(),
            FenceRole::Commands {
                language: Some("bash".into()),
                action: Action::Execute {
                    terminal: Some("build".into()),
                    interrupt: true,
                },
            }
        );
    }

    #[test]
    fn command_role_without_language() {
        let fence = Fence::open("```{{ copy }}").unwrap();
        assert_eq!(
            fence.role(),
            FenceRole::Commands {
                language: None,
                action: Action::Copy,
            }
        );
    }

    #[test]
    fn unknown_directive_is_plain() {
        let fence = Fence::open("```bash {{ bogus }}").unwrap();
        assert_eq!(
            fence.role(),
            FenceRole::Plain {
                language: Some("bash".into())
            }
        );
    }

    #[test]
    fn regions_skip_unclosed_fences() {
        let lines = ["intro", "```sh", "ls", "```", "", "```", "never closed"];
        let regions = fenced_regions(&lines);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].open_line, 1);
        assert_eq!(regions[0].close_line, 3);
        assert_eq!(regions[0].body, vec!["ls"]);
    }

    #[test]
    fn body_loses_fence_indentation_only() {
        let lines = ["  ```bash {{ execute }}", "  npm ci", "      nested", " odd", "  ```"];
        let regions = fenced_regions(&lines);
        assert_eq!(regions[0].body, vec!["npm ci", "    nested", "odd"]);
    }
}
