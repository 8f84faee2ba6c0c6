//! Quiz block and inline quiz parsing.

use std::sync::OnceLock;

use regex::Regex;

use crate::grammar::QuizAttrs;
use crate::models::{QuizKind, QuizOption, QuizQuestion};

/// Multiple choice needs at least this many options.
pub const MIN_OPTIONS: usize = 2;

/// Prefix of ids assigned to quizzes that have none.
pub const AUTO_ID_PREFIX: &str = "quiz_";

const QUESTION_MARKER: &str = "Q:";

fn option_regex() -> &'static Regex {
    static OPTION_REGEX: OnceLock<Regex> = OnceLock::new();
    OPTION_REGEX.get_or_init(|| Regex::new(r"^\s*([A-Z])\)\s*(.*)$").expect("Invalid option regex"))
}

/// Parses the body of a ```` ```quiz ```` fence.
///
/// The first non-blank line is the question; later `A) text` lines are the
/// options. Returns `None` when fewer than [`MIN_OPTIONS`] options are found,
/// in which case the block is left untouched by the renderer.
pub fn parse_quiz_block(attrs: &QuizAttrs, body: &[&str]) -> Option<QuizQuestion> {
    let mut lines = body.iter().skip_while(|line| line.trim().is_empty());
    let question = strip_question_marker(lines.next()?);

    let options: Vec<QuizOption> = lines
        .filter_map(|line| option_regex().captures(line))
        .filter_map(|caps| {
            let label = caps.get(1)?.as_str().chars().next()?;
            let text = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            Some(QuizOption { label, text })
        })
        .collect();

    if options.len() < MIN_OPTIONS {
        log::debug!(
            "quiz block {:?} has {} option(s); leaving it unprocessed",
            attrs.id,
            options.len()
        );
        return None;
    }

    Some(QuizQuestion {
        id: attrs.id.clone(),
        question,
        kind: QuizKind::MultipleChoice(options),
        answer_key: attrs.answer_key.clone(),
    })
}

/// Builds the free-text question of an inline `` `question` {{ quiz }} `` tag.
pub fn inline_quiz(question: &str, attrs: &QuizAttrs) -> QuizQuestion {
    QuizQuestion {
        id: attrs.id.clone(),
        question: strip_question_marker(question),
        kind: QuizKind::FreeText,
        answer_key: attrs.answer_key.clone(),
    }
}

/// The explicit id, or `quiz_<n>` for the n-th id-less quiz of a render.
pub fn effective_id(question: &QuizQuestion, auto_index: usize) -> String {
    question
        .id
        .clone()
        .unwrap_or_else(|| format!("{AUTO_ID_PREFIX}{auto_index}"))
}

fn strip_question_marker(line: &str) -> String {
    let line = line.trim();
    line.strip_prefix(QUESTION_MARKER)
        .unwrap_or(line)
        .trim()
        .to_string()
}
