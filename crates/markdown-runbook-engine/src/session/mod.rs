//! Preview sessions: one per open document.
//!
//! A session owns everything that must outlive a single render: which
//! commands have fired, the answer keys loaded so far, the channels created
//! for its commands and the preview's scroll position.

pub mod messages;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::answer_key::{AnswerKeyStore, validate_answer};
use crate::dispatch::{Channel, DispatchError, DispatchSettings, Dispatcher, Host, Notice};
use crate::models::Command;
use crate::render::{PreviewPage, answer_key_selectors, render_document};
use crate::state::{CommandKey, ExecutionState};

pub use messages::{HostMessage, PreviewMessage};

pub struct PreviewSession<C> {
    document: PathBuf,
    state: ExecutionState,
    keys: AnswerKeyStore,
    dispatcher: Dispatcher<C>,
    /// Keys of the buttons in the most recent render, by `data-command-id`.
    command_keys: Vec<CommandKey>,
    scroll: f64,
    nonce: Uuid,
}

impl<C: Channel> PreviewSession<C> {
    pub fn new(document: impl Into<PathBuf>, settings: DispatchSettings) -> Self {
        Self {
            document: document.into(),
            state: ExecutionState::new(),
            keys: AnswerKeyStore::new(),
            dispatcher: Dispatcher::new(settings),
            command_keys: Vec::new(),
            scroll: 0.0,
            nonce: Uuid::new_v4(),
        }
    }

    pub fn document(&self) -> &Path {
        &self.document
    }

    pub fn execution_state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn scroll(&self) -> f64 {
        self.scroll
    }

    pub fn answer_keys_mut(&mut self) -> &mut AnswerKeyStore {
        &mut self.keys
    }

    /// Renders the document body with this session's state.
    ///
    /// Answer keys the document refers to are requested in the background;
    /// keys still loading are missing from this render and present in a later
    /// one.
    pub fn render(&mut self, text: &str) -> String {
        self.keys.poll();
        let selectors = answer_key_selectors(text);
        for selector in &selectors {
            self.keys.request(&self.document, selector.as_deref());
        }
        let snapshot = self
            .keys
            .snapshot(&self.document, selectors.iter().map(Option::as_deref));
        let rendered = render_document(text, &self.state, &snapshot);
        self.command_keys = rendered.command_keys().cloned().collect();
        rendered.html
    }

    /// Renders the full preview page.
    pub fn render_page(&mut self, text: &str) -> String {
        let body = self.render(text);
        let title = self
            .document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Preview".to_string());
        PreviewPage {
            title: &title,
            body: &body,
            nonce: self.nonce,
            scroll: self.scroll,
        }
        .to_string()
    }

    /// Handles one message from the preview page, returning replies for it.
    ///
    /// Dispatch failures are reported through the host and produce no reply.
    pub fn handle_message<H>(&mut self, host: &mut H, message: PreviewMessage) -> Vec<HostMessage>
    where
        H: Host<Channel = C>,
    {
        match message {
            PreviewMessage::ExecuteCommand {
                command,
                command_id,
            } => {
                if let Err(e) = self.dispatch(host, &command) {
                    log::warn!("command {command_id} failed: {e}");
                    host.notify(Notice::Error(e.to_string()));
                    return Vec::new();
                }
                match self.command_keys.get(command_id) {
                    Some(key) => {
                        self.state.mark(key.clone());
                    }
                    None => log::warn!("command id {command_id} is not in the current render"),
                }
                vec![HostMessage::CommandExecuted { command_id }]
            }
            PreviewMessage::SaveScrollPosition { position } => {
                self.scroll = position.max(0.0);
                Vec::new()
            }
            PreviewMessage::CheckQuizAnswer {
                quiz_id,
                answer,
                answer_key_selector,
            } => {
                let key = self
                    .keys
                    .resolve(&self.document, answer_key_selector.as_deref());
                let result = validate_answer(&quiz_id, &answer, key.as_deref());
                vec![HostMessage::QuizResult { quiz_id, result }]
            }
            PreviewMessage::ScrollSync { percentage } => {
                host.reveal_percentage(percentage.clamp(0.0, 1.0));
                Vec::new()
            }
        }
    }

    /// Runs a command picked outside the preview, e.g. from a lens, and
    /// marks it executed under the key the preview gives that occurrence.
    pub fn execute<H>(
        &mut self,
        host: &mut H,
        command: &Command,
        rank: usize,
    ) -> Result<(), DispatchError>
    where
        H: Host<Channel = C>,
    {
        self.dispatch(host, command)?;
        self.state.mark(CommandKey::new(command, rank));
        Ok(())
    }

    /// Dispatches without touching execution state.
    pub fn dispatch<H>(&mut self, host: &mut H, command: &Command) -> Result<(), DispatchError>
    where
        H: Host<Channel = C>,
    {
        self.dispatcher.dispatch(host, command, &self.document)
    }

    /// Message that scrolls the preview to match the editor.
    pub fn sync_scroll(&self, percentage: f64) -> HostMessage {
        HostMessage::ScrollSync {
            percentage: percentage.clamp(0.0, 1.0),
        }
    }

    /// Forgets cached answer keys, e.g. after a key file changed on disk.
    pub fn reload_answer_keys(&mut self) {
        self.keys.invalidate(&self.document);
    }
}

/// Open preview sessions keyed by document path.
pub struct PreviewRegistry<C> {
    settings: DispatchSettings,
    sessions: HashMap<PathBuf, PreviewSession<C>>,
}

impl<C: Channel> PreviewRegistry<C> {
    pub fn new(settings: DispatchSettings) -> Self {
        Self {
            settings,
            sessions: HashMap::new(),
        }
    }

    /// Returns the session for `document`, creating it if needed.
    pub fn open(&mut self, document: &Path) -> &mut PreviewSession<C> {
        self.sessions
            .entry(document.to_path_buf())
            .or_insert_with(|| {
                log::debug!("opening preview session for {}", document.display());
                PreviewSession::new(document, self.settings.clone())
            })
    }

    pub fn get(&self, document: &Path) -> Option<&PreviewSession<C>> {
        self.sessions.get(document)
    }

    pub fn get_mut(&mut self, document: &Path) -> Option<&mut PreviewSession<C>> {
        self.sessions.get_mut(document)
    }

    /// Closes a session; its execution state and channels are dropped.
    pub fn dispose(&mut self, document: &Path) -> bool {
        self.sessions.remove(document).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
