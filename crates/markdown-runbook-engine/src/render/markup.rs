//! HTML fragments for interactive elements.
//!
//! Every piece of document text that reaches these functions is escaped
//! here; callers pass raw strings.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::models::{Action, AdmonitionKind, Command, QuizKind, QuizQuestion};
use crate::state::CommandKey;

use super::extract::PerLine;
use super::highlight;

/// Identity and state of one rendered button.
pub struct ButtonState<'a> {
    pub id: usize,
    pub key: &'a CommandKey,
    pub executed: bool,
}

/// What a button shows next to its icon.
pub enum ButtonFace<'a> {
    /// The command text in a code element.
    Code(&'a str),
    /// A fixed caption such as "Run All".
    Caption(&'a str),
}

fn icon(action: &Action) -> &'static str {
    match action {
        Action::Execute { .. } => "▶",
        Action::Copy => "📋",
        Action::Open => "📂",
    }
}

fn tooltip(action: &Action) -> String {
    match action {
        Action::Execute {
            terminal: Some(name),
            interrupt,
        } => format!(
            "Run in terminal '{name}'{}",
            if *interrupt { " (interrupts)" } else { "" }
        ),
        Action::Execute {
            terminal: None,
            interrupt,
        } => format!(
            "Run in terminal{}",
            if *interrupt { " (interrupts)" } else { "" }
        ),
        Action::Copy => "Copy to clipboard".to_string(),
        Action::Open => "Open file".to_string(),
    }
}

pub fn command_button(command: &Command, face: ButtonFace<'_>, state: ButtonState<'_>) -> String {
    let payload = serde_json::to_string(command).unwrap_or_default();
    let mut classes = format!("runbook-command runbook-{}", command.action.kind().keyword());
    if state.executed {
        classes.push_str(" executed");
    }
    let mut out = format!(
        "<button type=\"button\" class=\"{classes}\" data-command-id=\"{}\" data-command-key=\"{}\" data-command=\"{}\" title=\"{}\">",
        state.id,
        attr(state.key.as_str()),
        attr(&payload),
        attr(&tooltip(&command.action)),
    );
    let _ = write!(out, "<span class=\"runbook-icon\">{}</span>", icon(&command.action));
    match face {
        ButtonFace::Code(code) => {
            let _ = write!(out, "<code>{}</code>", text(code));
        }
        ButtonFace::Caption(caption) => {
            let _ = write!(out, "<span class=\"runbook-caption\">{}</span>", text(caption));
        }
    }
    if state.executed {
        out.push_str("<span class=\"runbook-check\" aria-label=\"executed\">✓</span>");
    }
    out.push_str("</button>");
    out
}

/// A command block with one "Run All" (or "Copy All") button above the code.
pub fn run_all_block(language: Option<&str>, lines: &[String], button: &str) -> String {
    let mut out = String::from("<div class=\"runbook-block\">\n<div class=\"runbook-block-header\">");
    if let Some(lang) = language {
        let _ = write!(out, "<span class=\"runbook-lang\">{}</span>", text(lang));
    }
    out.push_str(button);
    out.push_str("</div>\n");
    let mut code = lines.join("\n");
    code.push('\n');
    out.push_str(&highlight::code_block(&code, language));
    out.push_str("</div>\n");
    out
}

/// A block with one button per line; `buttons[i]` holds the markup for line `i`.
pub fn per_line_block(language: Option<&str>, lines: &[PerLine], buttons: &[Vec<String>]) -> String {
    let mut out = String::from("<div class=\"runbook-block runbook-lines\">\n");
    if let Some(lang) = language {
        let _ = writeln!(
            out,
            "<div class=\"runbook-block-header\"><span class=\"runbook-lang\">{}</span></div>",
            text(lang)
        );
    }
    for (line, line_buttons) in lines.iter().zip(buttons) {
        let _ = write!(
            out,
            "<div class=\"runbook-line\"><code>{}</code>",
            text(&line.display)
        );
        for button in line_buttons {
            out.push_str(button);
        }
        out.push_str("</div>\n");
    }
    out.push_str("</div>\n");
    out
}

pub fn admonition(kind: AdmonitionKind, body: &str) -> String {
    format!(
        "<div class=\"admonition admonition-{}\"><div class=\"admonition-title\"><span class=\"admonition-icon\">{}</span>{}</div><div class=\"admonition-body\">{}</div></div>\n",
        kind.style(),
        kind.icon(),
        kind.label(),
        text(body),
    )
}

/// Quiz widget. `multi` switches multiple choice from radios to checkboxes.
pub fn quiz(question: &QuizQuestion, id: &str, multi: bool) -> String {
    let mut out = format!("<div class=\"runbook-quiz\" data-quiz-id=\"{}\"", attr(id));
    if let Some(selector) = &question.answer_key {
        let _ = write!(out, " data-answer-key=\"{}\"", attr(selector));
    }
    if multi {
        out.push_str(" data-multi=\"true\"");
    }
    let _ = write!(
        out,
        ">\n<div class=\"quiz-question\">{}</div>\n",
        text(&question.question)
    );
    match &question.kind {
        QuizKind::MultipleChoice(options) => {
            let input = if multi { "checkbox" } else { "radio" };
            out.push_str("<div class=\"quiz-options\">\n");
            for option in options {
                let _ = writeln!(
                    out,
                    "<label class=\"quiz-option\"><input type=\"{input}\" name=\"quiz-{}\" value=\"{}\"><span class=\"quiz-label\">{})</span> {}</label>",
                    attr(id),
                    option.label,
                    option.label,
                    text(&option.text),
                );
            }
            out.push_str("</div>\n");
        }
        QuizKind::FreeText => {
            out.push_str(
                "<input type=\"text\" class=\"quiz-input\" placeholder=\"Your answer\">\n",
            );
        }
    }
    out.push_str("<button type=\"button\" class=\"quiz-check\">Check answer</button>\n");
    out.push_str("<div class=\"quiz-feedback\" aria-live=\"polite\"></div>\n</div>\n");
    out
}
