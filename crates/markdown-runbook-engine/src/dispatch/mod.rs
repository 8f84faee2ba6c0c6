//! Routing commands to host capabilities.
//!
//! The engine never spawns processes or touches the clipboard itself. A
//! front-end implements [`Host`] (and a [`Channel`] type for its execution
//! destinations) and the [`Dispatcher`] decides what to call.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use relative_path::RelativePath;

use crate::models::{Action, Command};

/// Channel used when an execute tag names none.
pub const DEFAULT_CHANNEL: &str = "runbook";

/// Pause between an interrupt and the next command.
pub const DEFAULT_INTERRUPT_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Channel '{name}' failed: {message}")]
    Channel { name: String, message: String },
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("Could not open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// A message for the user, shown however the host shows such things.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

/// A named, persistent execution destination such as a shell.
pub trait Channel {
    /// Best-effort stop of whatever is running.
    fn send_interrupt(&mut self) -> Result<(), HostError>;
    /// Sends one line of input, followed by a newline.
    fn send_text(&mut self, text: &str) -> Result<(), HostError>;
}

/// Capabilities a front-end lends to the engine.
pub trait Host {
    type Channel: Channel;

    fn create_channel(&mut self, name: &str) -> Result<Self::Channel, HostError>;
    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError>;
    fn open_file(&mut self, path: &Path) -> Result<(), HostError>;
    fn notify(&mut self, notice: Notice);
    /// Scrolls the source view so `percentage` (0.0 to 1.0) of it is above.
    fn reveal_percentage(&mut self, percentage: f64);
}

/// Base directory for relative `open` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathBase {
    #[default]
    Document,
    Workspace,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub default_channel: String,
    pub interrupt_delay: Duration,
    pub open_base: PathBase,
    /// Falls back to the document directory when unknown.
    pub workspace_root: Option<PathBuf>,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            default_channel: DEFAULT_CHANNEL.to_string(),
            interrupt_delay: DEFAULT_INTERRUPT_DELAY,
            open_base: PathBase::Document,
            workspace_root: None,
        }
    }
}

/// Owns the channels created for one preview session.
pub struct Dispatcher<C> {
    settings: DispatchSettings,
    channels: HashMap<String, C>,
}

impl<C: Channel> Dispatcher<C> {
    pub fn new(settings: DispatchSettings) -> Self {
        Self {
            settings,
            channels: HashMap::new(),
        }
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    /// Carries out `command` for the document at `document`.
    pub fn dispatch<H>(
        &mut self,
        host: &mut H,
        command: &Command,
        document: &Path,
    ) -> Result<(), DispatchError>
    where
        H: Host<Channel = C>,
    {
        match &command.action {
            Action::Execute {
                terminal,
                interrupt,
            } => {
                let name = terminal
                    .as_deref()
                    .unwrap_or(&self.settings.default_channel)
                    .to_string();
                let delay = self.settings.interrupt_delay;
                let channel = match self.channels.entry(name.clone()) {
                    std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
                    std::collections::hash_map::Entry::Vacant(entry) => {
                        log::info!("creating channel '{name}'");
                        entry.insert(host.create_channel(&name)?)
                    }
                };
                if *interrupt {
                    channel.send_interrupt()?;
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                log::info!("executing in '{name}': {}", command.text);
                channel.send_text(&escape_history_expansion(&command.text))?;
            }
            Action::Copy => {
                host.write_clipboard(&command.text)?;
                host.notify(Notice::Info(format!("Copied: {}", command.text)));
            }
            Action::Open => {
                let path = self.resolve_open_path(&command.text, document);
                if !path.exists() {
                    return Err(DispatchError::FileNotFound(path));
                }
                log::info!("opening {}", path.display());
                host.open_file(&path)?;
            }
        }
        Ok(())
    }

    /// Absolute targets pass through; relative ones join the configured base.
    pub fn resolve_open_path(&self, target: &str, document: &Path) -> PathBuf {
        let target = target.trim();
        if Path::new(target).is_absolute() {
            return PathBuf::from(target);
        }
        let document_dir = document.parent().unwrap_or_else(|| Path::new("."));
        let base = match (self.settings.open_base, &self.settings.workspace_root) {
            (PathBase::Workspace, Some(root)) => root.as_path(),
            (PathBase::Workspace, None) | (PathBase::Document, _) => document_dir,
        };
        RelativePath::new(target).to_path(base)
    }
}

/// Escapes `!` so interactive shells do not apply history expansion.
pub fn escape_history_expansion(text: &str) -> String {
    text.replace('!', "\\!")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every host call as a line of text.
    #[derive(Default, Clone)]
    pub(crate) struct RecordingHost {
        pub log: Rc<RefCell<Vec<String>>>,
    }

    pub(crate) struct RecordingChannel {
        name: String,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingHost {
        pub fn calls(&self) -> Vec<String> {
            self.log.borrow().clone()
        }
    }

    impl Channel for RecordingChannel {
        fn send_interrupt(&mut self) -> Result<(), HostError> {
            self.log.borrow_mut().push(format!("{}: ^C", self.name));
            Ok(())
        }

        fn send_text(&mut self, text: &str) -> Result<(), HostError> {
            self.log.borrow_mut().push(format!("{}: {text}", self.name));
            Ok(())
        }
    }

    impl Host for RecordingHost {
        type Channel = RecordingChannel;

        fn create_channel(&mut self, name: &str) -> Result<RecordingChannel, HostError> {
            self.log.borrow_mut().push(format!("create {name}"));
            Ok(RecordingChannel {
                name: name.to_string(),
                log: Rc::clone(&self.log),
            })
        }

        fn write_clipboard(&mut self, text: &str) -> Result<(), HostError> {
            self.log.borrow_mut().push(format!("clipboard {text}"));
            Ok(())
        }

        fn open_file(&mut self, path: &Path) -> Result<(), HostError> {
            self.log
                .borrow_mut()
                .push(format!("open {}", path.display()));
            Ok(())
        }

        fn notify(&mut self, notice: Notice) {
            self.log.borrow_mut().push(format!("notify {notice:?}"));
        }

        fn reveal_percentage(&mut self, percentage: f64) {
            self.log.borrow_mut().push(format!("reveal {percentage}"));
        }
    }

    pub(crate) fn quick_settings() -> DispatchSettings {
        DispatchSettings {
            interrupt_delay: Duration::ZERO,
            ..DispatchSettings::default()
        }
    }

    fn execute(text: &str, terminal: Option<&str>, interrupt: bool) -> Command {
        Command::new(
            text,
            Action::Execute {
                terminal: terminal.map(str::to_string),
                interrupt,
            },
        )
    }

    #[test]
    fn execute_reuses_named_channels() {
        let mut host = RecordingHost::default();
        let mut dispatcher = Dispatcher::new(quick_settings());
        let doc = Path::new("/docs/guide.md");

        dispatcher.dispatch(&mut host, &execute("ls", None, false), doc).unwrap();
        dispatcher.dispatch(&mut host, &execute("pwd", None, false), doc).unwrap();
        dispatcher.dispatch(&mut host, &execute("top", Some("t2"), false), doc).unwrap();

        assert_eq!(
            host.calls(),
            vec!["create runbook", "runbook: ls", "runbook: pwd", "create t2", "t2: top"]
        );
    }

    #[test]
    fn interrupt_comes_before_text() {
        let mut host = RecordingHost::default();
        let mut dispatcher = Dispatcher::new(quick_settings());
        dispatcher
            .dispatch(&mut host, &execute("npm start", Some("srv"), true), Path::new("g.md"))
            .unwrap();
        assert_eq!(host.calls(), vec!["create srv", "srv: ^C", "srv: npm start"]);
    }

    #[test]
    fn bang_is_escaped_for_shells() {
        let mut host = RecordingHost::default();
        let mut dispatcher = Dispatcher::new(quick_settings());
        dispatcher
            .dispatch(&mut host, &execute("echo hi!", None, false), Path::new("g.md"))
            .unwrap();
        assert_eq!(host.calls()[1], "runbook: echo hi\\!");
    }

    #[test]
    fn copy_goes_to_clipboard_unescaped() {
        let mut host = RecordingHost::default();
        let mut dispatcher: Dispatcher<RecordingChannel> = Dispatcher::new(quick_settings());
        dispatcher
            .dispatch(&mut host, &Command::new("echo hi!", Action::Copy), Path::new("g.md"))
            .unwrap();
        assert_eq!(host.calls()[0], "clipboard echo hi!");
        assert!(dispatcher.channel_names().next().is_none());
    }

    #[test]
    fn open_resolves_against_document_directory() {
        let dir = create_test_dir();
        let doc = create_test_file(&dir, "guide.md", "");
        create_test_file(&dir, "setup.sh", "");
        let mut host = RecordingHost::default();
        let mut dispatcher: Dispatcher<RecordingChannel> = Dispatcher::new(quick_settings());

        dispatcher
            .dispatch(&mut host, &Command::new("setup.sh", Action::Open), &doc)
            .unwrap();
        assert_eq!(
            host.calls(),
            vec![format!("open {}", dir.path().join("setup.sh").display())]
        );
    }

    #[test]
    fn open_missing_file_is_an_error() {
        let dir = create_test_dir();
        let doc = create_test_file(&dir, "guide.md", "");
        let mut host = RecordingHost::default();
        let mut dispatcher: Dispatcher<RecordingChannel> = Dispatcher::new(quick_settings());

        let result = dispatcher.dispatch(&mut host, &Command::new("nope.txt", Action::Open), &doc);
        assert!(matches!(result, Err(DispatchError::FileNotFound(_))));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn workspace_base_uses_root_when_known() {
        let settings = DispatchSettings {
            open_base: PathBase::Workspace,
            workspace_root: Some(PathBuf::from("/work")),
            ..quick_settings()
        };
        let dispatcher: Dispatcher<RecordingChannel> = Dispatcher::new(settings);
        let doc = Path::new("/work/docs/guide.md");
        assert_eq!(
            dispatcher.resolve_open_path("src/main.rs", doc),
            PathBuf::from("/work/src/main.rs")
        );
        assert_eq!(
            dispatcher.resolve_open_path("/etc/hosts", doc),
            PathBuf::from("/etc/hosts")
        );

        let fallback: Dispatcher<RecordingChannel> = Dispatcher::new(DispatchSettings {
            open_base: PathBase::Workspace,
            ..quick_settings()
        });
        assert_eq!(
            fallback.resolve_open_path("notes.md", doc),
            PathBuf::from("/work/docs/notes.md")
        );
    }
}
