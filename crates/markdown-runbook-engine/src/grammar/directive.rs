//! Second phase of tag recognition: tokenizing and classifying the body of
//! a `{{ ... }}` directive.

use crate::models::{Action, ActionKind, AdmonitionKind};

use super::cursor::Cursor;
use super::kinds::{DirectiveDelims, QUOTES, is_inline_space};

/// Bare word that sets the interrupt flag wherever it appears.
pub const INTERRUPT: &str = "interrupt";
/// Keyword of inline quiz tags and quiz fences.
pub const QUIZ: &str = "quiz";

/// A recognized directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Command(Action),
    Admonition(AdmonitionKind),
    Quiz(QuizAttrs),
}

/// Attributes of a quiz tag or quiz fence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizAttrs {
    pub id: Option<String>,
    pub answer_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Word(&'a str),
    Quoted(&'a str),
    Attr { key: &'a str, value: &'a str },
}

/// Recognizes a directive at the start of `text`, after optional spaces.
///
/// Returns the directive and the number of bytes consumed up to and
/// including the closing `}}`. The directive must close on the same line.
pub fn parse_directive_prefix(text: &str) -> Option<(Directive, usize)> {
    let mut cur = Cursor::new(text);
    cur.bump_while(is_inline_space);
    if !cur.starts_with(DirectiveDelims::OPEN.as_bytes()) {
        return None;
    }
    cur.bump_n(DirectiveDelims::OPEN.len());
    let rest = cur.rest();
    let close = rest.find(DirectiveDelims::CLOSE)?;
    let body = &rest[..close];
    if body.contains('\n') {
        return None;
    }
    let directive = classify(&tokenize(body)?)?;
    Some((directive, cur.pos() + close + DirectiveDelims::CLOSE.len()))
}

/// Classifies a directive body without its delimiters, e.g. `execute 't2'`.
pub fn parse_directive_body(body: &str) -> Option<Directive> {
    classify(&tokenize(body)?)
}

fn tokenize(body: &str) -> Option<Vec<Token<'_>>> {
    let mut cur = Cursor::new(body);
    let mut tokens = Vec::new();
    loop {
        cur.bump_while(|b| b.is_ascii_whitespace());
        let Some(b) = cur.peek() else {
            break;
        };
        if QUOTES.contains(&b) {
            tokens.push(Token::Quoted(read_quoted(&mut cur)?));
            continue;
        }
        let start = cur.i;
        cur.bump_while(|b| !b.is_ascii_whitespace() && b != b'=');
        let word = cur.since(start);
        if cur.peek() == Some(b'=') {
            cur.bump();
            if word.is_empty() {
                return None;
            }
            let value = match cur.peek() {
                Some(q) if QUOTES.contains(&q) => read_quoted(&mut cur)?,
                Some(b) if !b.is_ascii_whitespace() => {
                    let start = cur.i;
                    cur.bump_while(|b| !b.is_ascii_whitespace());
                    cur.since(start)
                }
                _ => return None,
            };
            tokens.push(Token::Attr { key: word, value });
        } else {
            tokens.push(Token::Word(word));
        }
    }
    Some(tokens)
}

/// Reads a quoted string; the cursor must sit on the opening quote.
/// Unterminated quotes fail the whole directive.
fn read_quoted<'a>(cur: &mut Cursor<'a>) -> Option<&'a str> {
    let quote = cur.bump()?;
    let start = cur.i;
    cur.bump_while(|b| b != quote);
    let value = cur.since(start);
    cur.bump()?;
    Some(value)
}

fn classify(tokens: &[Token<'_>]) -> Option<Directive> {
    let (Token::Word(keyword), args) = tokens.split_first()? else {
        return None;
    };

    if let Some(kind) = ActionKind::from_keyword(keyword) {
        return classify_command(kind, args);
    }
    if let Some(kind) = AdmonitionKind::from_keyword(keyword) {
        return args.is_empty().then_some(Directive::Admonition(kind));
    }
    if *keyword == QUIZ {
        return classify_quiz(args);
    }
    None
}

fn classify_command(kind: ActionKind, args: &[Token<'_>]) -> Option<Directive> {
    let mut terminal = None;
    let mut interrupt = false;
    for arg in args {
        let value = match arg {
            Token::Word(value) | Token::Quoted(value) => *value,
            Token::Attr { .. } => return None,
        };
        if value == INTERRUPT {
            interrupt = true;
        } else if terminal.is_none() && !value.is_empty() {
            terminal = Some(value.to_string());
        } else {
            return None;
        }
    }
    Some(Directive::Command(Action::from_parts(
        kind, terminal, interrupt,
    )))
}

fn classify_quiz(args: &[Token<'_>]) -> Option<Directive> {
    let mut attrs = QuizAttrs::default();
    for arg in args {
        match arg {
            Token::Attr { key: "id", value } => attrs.id = Some(value.to_string()),
            Token::Attr {
                key: "answerKey",
                value,
            } => attrs.answer_key = Some(value.to_string()),
            _ => return None,
        }
    }
    Some(Directive::Quiz(attrs))
}
