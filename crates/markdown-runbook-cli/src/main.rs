mod host;

use anyhow::{Context, Result, bail};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use host::{OutputLog, ShellChannel, TerminalHost};
use markdown_runbook_config::{Config, OpenFilesRelativeTo};
use markdown_runbook_engine::{
    Action, AnswerKeySnapshot, Command, CommandLens, DispatchError, DispatchSettings,
    ExecutionState, Host, HostMessage, Notice, PathBase, PreviewMessage, PreviewSession,
    answer_key::AnswerValue, collect_lenses, io, render_document, should_auto_open, status_text,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use std::{
    env,
    fs::File,
    io::{Stdout, stdout},
    path::{Path, PathBuf},
    process,
    time::{Duration, SystemTime},
};

const TICK: Duration = Duration::from_millis(250);
const OUTPUT_LINES: usize = 200;

fn dispatch_settings(config: &Config) -> DispatchSettings {
    DispatchSettings {
        default_channel: config.default_channel.clone(),
        interrupt_delay: config.interrupt_delay(),
        open_base: match config.open_files_relative_to {
            OpenFilesRelativeTo::Document => PathBase::Document,
            OpenFilesRelativeTo::Workspace => PathBase::Workspace,
        },
        workspace_root: config
            .workspace_root
            .clone()
            .or_else(|| env::current_dir().ok()),
    }
}

struct App {
    document: PathBuf,
    config: Config,
    lenses: Vec<CommandLens>,
    lens_state: ListState,
    session: PreviewSession<ShellChannel>,
    host: TerminalHost,
    modified: Option<SystemTime>,
    text: String,
    preview: bool,
    status: String,
}

impl App {
    fn new(document: PathBuf, config: Config, output: OutputLog) -> Result<Self> {
        let text = io::read_document(&document)?;
        let preview = should_auto_open(config.auto_open_preview, &text);
        let session = PreviewSession::new(&document, dispatch_settings(&config));

        let mut app = Self {
            modified: modified(&document),
            document,
            config,
            lenses: Vec::new(),
            lens_state: ListState::default(),
            session,
            host: TerminalHost::new(output),
            text,
            preview,
            status: String::new(),
        };
        app.refresh();
        Ok(app)
    }

    fn refresh(&mut self) {
        self.lenses = collect_lenses(&self.text, self.config.show_inline_hints);
        let selected = match self.lens_state.selected() {
            _ if self.lenses.is_empty() => None,
            Some(i) => Some(i.min(self.lenses.len() - 1)),
            None => Some(0),
        };
        self.lens_state.select(selected);
        self.status = status_text(&self.text).unwrap_or_else(|| "No commands".to_string());
        if self.preview {
            self.write_preview();
        }
    }

    fn write_preview(&mut self) {
        let page = self.session.render_page(&self.text);
        let path = io::preview_path(&self.document);
        match io::write_file(&path, &page) {
            Ok(()) => log::debug!("preview written to {}", path.display()),
            Err(e) => self.status = format!("Preview failed: {e}"),
        }
    }

    /// Re-reads the document when it changed on disk.
    fn poll_document(&mut self) {
        let modified = modified(&self.document);
        if modified == self.modified {
            return;
        }
        self.modified = modified;
        match io::read_document(&self.document) {
            Ok(text) => {
                self.text = text;
                self.session.reload_answer_keys();
                self.refresh();
            }
            Err(e) => self.status = format!("Reload failed: {e}"),
        }
    }

    fn next_lens(&mut self) {
        if self.lenses.is_empty() {
            return;
        }
        let i = match self.lens_state.selected() {
            Some(i) => (i + 1) % self.lenses.len(),
            None => 0,
        };
        self.lens_state.select(Some(i));
    }

    fn previous_lens(&mut self) {
        if self.lenses.is_empty() {
            return;
        }
        let i = match self.lens_state.selected() {
            Some(0) | None => self.lenses.len() - 1,
            Some(i) => i - 1,
        };
        self.lens_state.select(Some(i));
    }

    fn selected(&self) -> Option<&CommandLens> {
        self.lens_state.selected().and_then(|i| self.lenses.get(i))
    }

    fn run_selected(&mut self) {
        let Some(lens) = self.selected().cloned() else {
            return;
        };
        let result = self
            .session
            .execute(&mut self.host, &lens.command, lens.rank);
        self.report(result.map(|()| format!("Ran: {}", lens.command.text)));
        if self.preview {
            self.write_preview();
        }
    }

    /// Sends the selected lens's text with a different action.
    fn run_selected_as(&mut self, action: Action) {
        let Some(lens) = self.selected().cloned() else {
            return;
        };
        let command = Command::new(lens.command.text, action);
        let result = self.session.dispatch(&mut self.host, &command);
        self.report(result.map(|()| format!("Done: {}", command.text)));
    }

    fn report(&mut self, result: Result<String, DispatchError>) {
        match result {
            Ok(message) => self.status = message,
            Err(e) => self.host.notify(Notice::Error(e.to_string())),
        }
        for notice in self.host.take_notices() {
            self.status = match notice {
                Notice::Info(message) => message,
                Notice::Error(message) => format!("Error: {message}"),
            };
        }
    }

    fn toggle_preview(&mut self) {
        self.preview = !self.preview;
        if self.preview {
            self.write_preview();
            self.status = format!(
                "Preview: {}",
                io::preview_path(&self.document).display()
            );
        } else {
            self.status = "Preview off".to_string();
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {program} <document.md>");
    eprintln!("       {program} --html <document.md> [output.html]");
    eprintln!("       {program} --check <document.md> <quiz-id> <answer>...");
    eprintln!("       {program} --list <document.md>");
    process::exit(1);
}

fn load_config() -> Config {
    Config::load_or_default().unwrap_or_else(|e| {
        eprintln!("Warning: {e}; using defaults");
        Config::default()
    })
}

fn init_stderr_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("markdown-runbook");

    match args.get(1).map(String::as_str) {
        Some("--html") if (3..=4).contains(&args.len()) => {
            init_stderr_logging();
            export_html(Path::new(&args[2]), args.get(3).map(PathBuf::from))
        }
        Some("--check") if args.len() >= 5 => {
            init_stderr_logging();
            let correct = check_answer(Path::new(&args[2]), &args[3], &args[4..])?;
            process::exit(if correct { 0 } else { 2 });
        }
        Some("--list") if args.len() == 3 => {
            init_stderr_logging();
            list_lenses(Path::new(&args[2]))
        }
        Some(arg) if args.len() == 2 && !arg.starts_with("--") => run_tui(PathBuf::from(arg)),
        _ => usage(program),
    }
}

fn export_html(document: &Path, out: Option<PathBuf>) -> Result<()> {
    let config = load_config();
    let text = io::read_document(document)?;
    let mut session: PreviewSession<ShellChannel> =
        PreviewSession::new(document, dispatch_settings(&config));

    // First render requests the answer keys the quizzes need
    session.render(&text);
    session.answer_keys_mut().wait_pending();
    let page = session.render_page(&text);

    let out = out.unwrap_or_else(|| io::preview_path(document));
    io::write_file(&out, &page)?;
    println!("{}", out.display());
    Ok(())
}

fn check_answer(document: &Path, quiz_id: &str, answer: &[String]) -> Result<bool> {
    let text = io::read_document(document)?;
    let rendered = render_document(&text, &ExecutionState::new(), &AnswerKeySnapshot::empty());
    let Some(quiz) = rendered.quizzes.into_iter().find(|quiz| quiz.id == quiz_id) else {
        bail!("No quiz '{quiz_id}' in {}", document.display());
    };

    let answer = match answer {
        [single] => AnswerValue::One(single.clone()),
        many => AnswerValue::Many(many.to_vec()),
    };
    let message = PreviewMessage::CheckQuizAnswer {
        quiz_id: quiz_id.to_string(),
        answer,
        answer_key_selector: quiz.question.answer_key,
    };

    let config = load_config();
    let mut session: PreviewSession<ShellChannel> =
        PreviewSession::new(document, dispatch_settings(&config));
    let mut host = TerminalHost::default();
    let replies = session.handle_message(&mut host, message);
    let reply = replies.first().context("quiz check produced no result")?;
    println!("{}", serde_json::to_string_pretty(reply)?);

    Ok(matches!(
        reply,
        HostMessage::QuizResult { result, .. } if result.correct
    ))
}

fn list_lenses(document: &Path) -> Result<()> {
    let text = io::read_document(document)?;
    for lens in collect_lenses(&text, true) {
        println!(
            "{}:{}: {}",
            lens.location.line + 1,
            lens.location.start_column + 1,
            lens.title
        );
    }
    if let Some(status) = status_text(&text) {
        println!("{status}");
    }
    Ok(())
}

fn run_tui(document: PathBuf) -> Result<()> {
    let config = load_config();

    // The terminal belongs to the UI, so logs go to a file
    let log_path = env::temp_dir().join("markdown-runbook.log");
    let log_file = File::create(&log_path)
        .with_context(|| format!("creating log file {}", log_path.display()))?;
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    let mut app = match App::new(document, config, OutputLog::default()) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if !event::poll(TICK)? {
            app.poll_document();
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next_lens(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_lens(),
                KeyCode::Enter => app.run_selected(),
                KeyCode::Char('c') => app.run_selected_as(Action::Copy),
                KeyCode::Char('o') => app.run_selected_as(Action::Open),
                KeyCode::Char('p') => app.toggle_preview(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(f.area());
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[0]);

    // Lens panel
    let lens_items: Vec<ListItem> = app
        .lenses
        .iter()
        .map(|lens| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:>4} ", lens.location.line + 1),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(lens.title.clone()),
            ]))
        })
        .collect();

    let title = app
        .document
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lens_list = List::new(lens_items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));

    f.render_stateful_widget(lens_list, panes[0], &mut app.lens_state);

    // Output panel
    let height = panes[1].height.saturating_sub(2) as usize;
    let output: Vec<Line> = app
        .host
        .output
        .tail(height.min(OUTPUT_LINES))
        .into_iter()
        .map(Line::from)
        .collect();
    let output = Paragraph::new(output)
        .block(Block::default().borders(Borders::ALL).title("Output"));
    f.render_widget(output, panes[1]);

    let preview = if app.preview { " | preview on" } else { "" };
    let status = Paragraph::new(Line::from(Span::styled(
        format!("{}{preview}", app.status),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    f.render_widget(status, rows[1]);

    let help = Paragraph::new(Line::from(vec![
        Span::raw("q: Quit | "),
        Span::raw("↑/k ↓/j: Select | "),
        Span::raw("Enter: Run | c: Copy | o: Open | p: Preview"),
    ]));
    f.render_widget(help, rows[2]);
}
