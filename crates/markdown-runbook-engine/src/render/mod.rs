//! Augmented markdown to interactive HTML.
//!
//! Rendering runs in three stages. Fenced regions that need whole-block
//! treatment (quizzes, run-all blocks, blocks with tagged lines) are lifted
//! out of the raw text and replaced with placeholder fences. The remaining
//! text goes through pulldown-cmark, and the event stream is rewritten on
//! the way to HTML: placeholder code blocks become their widgets, and a code
//! span followed by a directive becomes a button, callout or quiz.
//!
//! Rendering is a pure function of its inputs. Execution state and answer
//! keys are passed in; nothing is cached between calls. Every button and
//! quiz is also reported with its source position, so editor hints can
//! address exactly what the preview shows.

pub mod extract;
pub mod highlight;
pub mod markup;
pub mod page;

use std::ops::Range;

use pulldown_cmark::{
    CodeBlockKind, Event, Options, Parser, Tag, TagEnd, TextMergeWithOffset,
};

use crate::answer_key::AnswerKeySnapshot;
use crate::grammar::{self, Directive, parse_directive_prefix};
use crate::models::{
    Action, ActionKind, Command, CommandDescriptor, Location, QuizQuestion,
};
use crate::quiz::{effective_id, inline_quiz};
use crate::state::{CommandKey, ExecutionState, KeyRanker};

pub use extract::{Extracted, Extraction, PerLine, answer_key_selectors, extract};
pub use page::PreviewPage;

use markup::{ButtonFace, ButtonState};

/// Renders a document body to HTML.
pub fn render(text: &str, state: &ExecutionState, keys: &AnswerKeySnapshot) -> String {
    render_document(text, state, keys).html
}

/// Where a rendered button sits in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOrigin {
    /// A tag in running text, or on one line of a plain fence.
    Inline,
    /// The single button of a command fence with `lines` body lines.
    Block { lines: usize },
    /// One line of an `open` fence.
    BlockLine,
}

/// A button as rendered: what it runs, its key and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCommand {
    pub key: CommandKey,
    pub command: Command,
    /// Identical commands rendered before this one.
    pub rank: usize,
    /// The tag, or the opening fence for block buttons.
    pub location: Location,
    pub origin: CommandOrigin,
}

/// A quiz widget as rendered, under the id the page gives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuiz {
    pub id: String,
    pub question: QuizQuestion,
    /// Zero-based source line of the tag or opening fence.
    pub line: usize,
}

/// Output of one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    /// `commands[n]` is the button with `data-command-id="n"`.
    pub commands: Vec<RenderedCommand>,
    pub quizzes: Vec<RenderedQuiz>,
}

impl Rendered {
    pub fn command_keys(&self) -> impl Iterator<Item = &CommandKey> {
        self.commands.iter().map(|command| &command.key)
    }
}

pub fn render_document(text: &str, state: &ExecutionState, keys: &AnswerKeySnapshot) -> Rendered {
    let Extraction {
        text,
        table,
        line_map,
    } = extract(text);
    let mut ctx = RenderContext::new(state, keys, table, SourceMap::new(&text, line_map));

    let parser = Parser::new_ext(&text, options()).into_offset_iter();
    let events: Vec<(Event<'_>, Range<usize>)> = TextMergeWithOffset::new(parser).collect();
    let events = split_block_paragraphs(ctx.transform(events));

    let mut html = String::with_capacity(text.len() * 2);
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    log::debug!(
        "rendered {} button(s), {} extracted region(s), {} quiz(zes)",
        ctx.commands.len(),
        ctx.table.len(),
        ctx.quizzes.len()
    );
    Rendered {
        html,
        commands: ctx.commands,
        quizzes: ctx.quizzes,
    }
}

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Maps byte offsets in the extracted text back to source positions.
struct SourceMap<'t> {
    text: &'t str,
    line_starts: Vec<usize>,
    line_map: Vec<usize>,
}

impl<'t> SourceMap<'t> {
    fn new(text: &'t str, line_map: Vec<usize>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            text,
            line_starts,
            line_map,
        }
    }

    /// Location of the tag whose code span starts at `offset`.
    ///
    /// Lines outside extracted regions are copied verbatim, so the columns
    /// found in the extracted text are the source columns.
    fn tag_location(&self, offset: usize) -> Location {
        let index = self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
        let start = self.line_starts.get(index).copied().unwrap_or(0);
        let line = self.text[start..].split('\n').next().unwrap_or_default();
        let column = offset - start;
        let (start_column, end_column) = grammar::parse_line(line)
            .into_iter()
            .find(|tag| tag.span.start == column)
            .map(|tag| tag.span.columns(line))
            .unwrap_or_else(|| {
                let at = line.get(..column).map_or(0, |head| head.chars().count());
                (at, at)
            });
        Location {
            line: self.line_map.get(index).copied().unwrap_or(index),
            start_column,
            end_column,
        }
    }
}

/// Scratch state for one render call.
struct RenderContext<'a> {
    /// Buttons in `data-command-id` order; the length is the next id.
    commands: Vec<RenderedCommand>,
    quizzes: Vec<RenderedQuiz>,
    /// Next auto id suffix for quizzes without an explicit id.
    next_quiz: usize,
    ranker: KeyRanker,
    table: Vec<Option<Extracted>>,
    source: SourceMap<'a>,
    state: &'a ExecutionState,
    keys: &'a AnswerKeySnapshot,
}

impl<'a> RenderContext<'a> {
    fn new(
        state: &'a ExecutionState,
        keys: &'a AnswerKeySnapshot,
        table: Vec<Extracted>,
        source: SourceMap<'a>,
    ) -> Self {
        Self {
            commands: Vec::new(),
            quizzes: Vec::new(),
            next_quiz: 0,
            ranker: KeyRanker::new(),
            table: table.into_iter().map(Some).collect(),
            source,
            state,
            keys,
        }
    }

    fn transform<'e>(&mut self, events: Vec<(Event<'e>, Range<usize>)>) -> Vec<Event<'e>> {
        let mut out = Vec::with_capacity(events.len());
        let mut iter = events.into_iter().peekable();

        while let Some((event, range)) = iter.next() {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let mut content = String::new();
                    for (inner, _) in iter.by_ref() {
                        match inner {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => content.push_str(&text),
                            _ => {}
                        }
                    }
                    out.push(Event::Html(self.code_block(&kind, &content).into()));
                }
                Event::Code(code) => {
                    let matched = match iter.peek() {
                        Some((Event::Text(next), _)) => parse_directive_prefix(next)
                            .map(|(directive, used)| (directive, next[used..].to_string())),
                        _ => None,
                    };
                    let Some((directive, rest)) = matched else {
                        out.push(Event::Code(code));
                        continue;
                    };
                    iter.next();
                    let location = self.source.tag_location(range.start);
                    out.push(self.directive(&code, directive, location));
                    if !rest.is_empty() {
                        out.push(Event::Text(rest.into()));
                    }
                }
                other => out.push(other),
            }
        }
        out
    }

    fn code_block(&mut self, kind: &CodeBlockKind<'_>, content: &str) -> String {
        let language = match kind {
            CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
            CodeBlockKind::Indented => None,
        };
        if language.is_none() {
            let extracted = extract::placeholder_index(content)
                .and_then(|index| self.table.get_mut(index))
                .and_then(Option::take);
            if let Some(extracted) = extracted {
                return self.extracted(extracted);
            }
        }
        highlight::code_block(content, language)
    }

    fn extracted(&mut self, extracted: Extracted) -> String {
        match extracted {
            Extracted::Quiz { question, line } => self.quiz(question, line),
            Extracted::RunAll(block) => match block.composite() {
                Some(command) => {
                    let caption = match command.action.kind() {
                        ActionKind::Copy => "Copy All",
                        ActionKind::Execute | ActionKind::Open => "Run All",
                    };
                    let origin = CommandOrigin::Block {
                        lines: block.lines.len(),
                    };
                    let button = self.button(
                        &command,
                        ButtonFace::Caption(caption),
                        block.location,
                        origin,
                    );
                    markup::run_all_block(block.language.as_deref(), &block.lines, &button)
                }
                None => {
                    let lines: Vec<PerLine> = block
                        .line_commands()
                        .map(|command| PerLine {
                            display: command.text.clone(),
                            commands: vec![CommandDescriptor {
                                location: block.location,
                                command,
                            }],
                        })
                        .collect();
                    self.per_line(block.language.as_deref(), &lines, CommandOrigin::BlockLine)
                }
            },
            Extracted::PerLine { language, lines } => {
                self.per_line(language.as_deref(), &lines, CommandOrigin::Inline)
            }
        }
    }

    fn per_line(&mut self, language: Option<&str>, lines: &[PerLine], origin: CommandOrigin) -> String {
        let buttons: Vec<Vec<String>> = lines
            .iter()
            .map(|line| {
                line.commands
                    .iter()
                    .map(|found| {
                        let caption = ButtonFace::Caption(caption(&found.command.action));
                        self.button(&found.command, caption, found.location, origin)
                    })
                    .collect()
            })
            .collect();
        markup::per_line_block(language, lines, &buttons)
    }

    fn directive<'e>(&mut self, code: &str, directive: Directive, location: Location) -> Event<'e> {
        match directive {
            Directive::Command(action) => {
                let command = Command::new(code, action);
                let button = self.button(
                    &command,
                    ButtonFace::Code(code),
                    location,
                    CommandOrigin::Inline,
                );
                Event::InlineHtml(button.into())
            }
            Directive::Admonition(kind) => Event::Html(markup::admonition(kind, code).into()),
            Directive::Quiz(attrs) => {
                let question = inline_quiz(code, &attrs);
                Event::Html(self.quiz(question, location.line).into())
            }
        }
    }

    fn button(
        &mut self,
        command: &Command,
        face: ButtonFace<'_>,
        location: Location,
        origin: CommandOrigin,
    ) -> String {
        let rank = self.ranker.next_rank(command);
        let key = CommandKey::new(command, rank);
        let html = markup::command_button(
            command,
            face,
            ButtonState {
                id: self.commands.len(),
                key: &key,
                executed: self.state.contains(&key),
            },
        );
        self.commands.push(RenderedCommand {
            key,
            command: command.clone(),
            rank,
            location,
            origin,
        });
        html
    }

    fn quiz(&mut self, question: QuizQuestion, line: usize) -> String {
        let id = effective_id(&question, self.next_quiz);
        if question.id.is_none() {
            self.next_quiz += 1;
        }
        let multi = self
            .keys
            .get(question.answer_key.as_deref())
            .is_some_and(|key| key.is_multi_answer(&id));
        let html = markup::quiz(&question, &id, multi);
        self.quizzes.push(RenderedQuiz { id, question, line });
        html
    }
}

fn caption(action: &Action) -> &'static str {
    match action {
        Action::Execute { .. } => "Run",
        Action::Copy => "Copy",
        Action::Open => "Open",
    }
}

/// Keeps block widgets out of `<p>`: a paragraph holding admonition or quiz
/// markup is split around it, and leftover pieces with no content vanish.
fn split_block_paragraphs(events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut out: Vec<Event<'_>> = Vec::with_capacity(events.len());
    let mut paragraph: Option<Vec<Event<'_>>> = None;

    for event in events {
        let Some(inner) = paragraph.as_mut() else {
            if matches!(event, Event::Start(Tag::Paragraph)) {
                paragraph = Some(Vec::new());
            } else {
                out.push(event);
            }
            continue;
        };
        if !matches!(event, Event::End(TagEnd::Paragraph)) {
            inner.push(event);
            continue;
        }
        let inner = paragraph.take().unwrap_or_default();
        if !inner.iter().any(|event| matches!(event, Event::Html(_))) {
            push_paragraph(&mut out, inner);
            continue;
        }
        let mut run = Vec::new();
        for event in inner {
            if matches!(event, Event::Html(_)) {
                if !run.iter().all(is_blank) {
                    push_paragraph(&mut out, std::mem::take(&mut run));
                }
                run.clear();
                out.push(event);
            } else {
                run.push(event);
            }
        }
        if !run.iter().all(is_blank) {
            push_paragraph(&mut out, run);
        }
    }
    out
}

fn push_paragraph<'e>(out: &mut Vec<Event<'e>>, inner: Vec<Event<'e>>) {
    out.push(Event::Start(Tag::Paragraph));
    out.extend(inner);
    out.push(Event::End(TagEnd::Paragraph));
}

fn is_blank(event: &Event<'_>) -> bool {
    match event {
        Event::Text(text) => text.trim().is_empty(),
        Event::SoftBreak | Event::HardBreak => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn html(text: &str) -> String {
        render(text, &ExecutionState::new(), &AnswerKeySnapshot::empty())
    }

    #[test]
    fn plain_markdown_renders_normally() {
        assert_eq!(html("# Title\n\nSome *text*."), "<h1>Title</h1>\n<p>Some <em>text</em>.</p>\n");
    }

    #[test]
    fn inline_command_becomes_button() {
        let out = html("Run `npm install` {{ execute }} first.");
        assert!(out.starts_with("<p>Run <button"));
        assert!(out.contains("data-command-id=\"0\""));
        assert!(out.contains("<code>npm install</code>"));
        assert!(out.ends_with("</button> first.</p>\n"));
        assert!(!out.contains("{{"));
    }

    #[test]
    fn untagged_code_span_is_left_alone() {
        assert_eq!(html("Use `ls` here."), "<p>Use <code>ls</code> here.</p>\n");
    }

    #[test]
    fn admonition_paragraph_is_unwrapped() {
        let out = html("`Back up first` {{ warning }}");
        assert!(out.starts_with("<div class=\"admonition admonition-warning\">"));
        assert!(!out.contains("<p>"));
    }

    #[test]
    fn mid_paragraph_callout_splits_the_paragraph() {
        let callout = markup::admonition(crate::models::AdmonitionKind::Warning, "Careful");
        assert_eq!(
            html("Then `Careful` {{ warning }} maybe."),
            format!("<p>Then </p>\n{callout}<p> maybe.</p>\n")
        );

        let out = html("Quick check `Why?` {{ quiz }}\nthen move on.");
        assert!(out.starts_with("<p>Quick check </p>\n<div"), "{out}");
        assert!(out.trim_end().ends_with("then move on.</p>"), "{out}");
        assert!(!out.contains("<p></p>"));
    }

    #[test]
    fn buttons_and_quizzes_report_source_positions() {
        let doc = "`ls` {{ copy }}\n\n```bash {{ execute }}\nmake\nmake test\n```\n\n    `make` {{ execute }}\n\n> run `make` {{ execute }}\n\n`Why?` {{ quiz }}\n";
        let rendered = render_document(doc, &ExecutionState::new(), &AnswerKeySnapshot::empty());

        let found: Vec<(&str, usize, usize, CommandOrigin)> = rendered
            .commands
            .iter()
            .map(|c| (c.command.text.as_str(), c.rank, c.location.line, c.origin))
            .collect();
        assert_eq!(
            found,
            vec![
                ("ls", 0, 0, CommandOrigin::Inline),
                ("{ make && make test; }", 0, 2, CommandOrigin::Block { lines: 2 }),
                ("make", 0, 9, CommandOrigin::Inline),
            ]
        );
        assert_eq!((rendered.commands[2].location.start_column, rendered.commands[2].location.end_column), (6, 26));

        let quizzes: Vec<(&str, &str, usize)> = rendered
            .quizzes
            .iter()
            .map(|q| (q.id.as_str(), q.question.question.as_str(), q.line))
            .collect();
        assert_eq!(quizzes, vec![("quiz_0", "Why?", 11)]);
    }

    #[test]
    fn quizzes_in_code_examples_are_not_numbered() {
        let rendered = render_document(
            "    `Hidden?` {{ quiz }}\n\n`Real?` {{ quiz }}\n",
            &ExecutionState::new(),
            &AnswerKeySnapshot::empty(),
        );
        let ids: Vec<(&str, &str)> = rendered
            .quizzes
            .iter()
            .map(|q| (q.id.as_str(), q.question.question.as_str()))
            .collect();
        assert_eq!(ids, vec![("quiz_0", "Real?")]);
        assert_eq!(rendered.html.matches("data-quiz-id=").count(), 1);
    }

    #[test]
    fn executed_state_marks_matching_button() {
        let command = Command::new(
            "make",
            Action::Execute {
                terminal: None,
                interrupt: false,
            },
        );
        let mut state = ExecutionState::new();
        state.mark(CommandKey::new(&command, 0));
        let out = render(
            "`make` {{ execute }} and `make test` {{ execute }}",
            &state,
            &AnswerKeySnapshot::empty(),
        );
        assert_eq!(out.matches(" executed\"").count(), 1);
    }

    #[test]
    fn plain_fence_is_escaped() {
        let out = html("```\n<b>\n```");
        assert_eq!(out, "<pre><code>&lt;b&gt;\n</code></pre>\n");
    }
}
