//! Process-backed host: channels are `sh` processes, the clipboard and file
//! opening go through the usual desktop tools.

use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use markdown_runbook_engine::{Channel, Host, HostError, Notice};

/// Lines captured from every channel, oldest first.
#[derive(Clone, Default)]
pub struct OutputLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl OutputLog {
    const MAX_LINES: usize = 1000;

    pub fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
            let excess = lines.len().saturating_sub(Self::MAX_LINES);
            lines.drain(..excess);
        }
    }

    /// The last `count` lines.
    pub fn tail(&self, count: usize) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines[lines.len().saturating_sub(count)..].to_vec(),
            Err(_) => Vec::new(),
        }
    }
}

pub struct ShellChannel {
    name: String,
    child: Child,
    stdin: ChildStdin,
    output: OutputLog,
}

impl ShellChannel {
    pub fn spawn(name: &str, output: OutputLog) -> Result<Self, HostError> {
        let mut child = Command::new("sh")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| HostError::Channel {
                name: name.to_string(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| HostError::Channel {
            name: name.to_string(),
            message: "no stdin".to_string(),
        })?;
        if let Some(stdout) = child.stdout.take() {
            forward(name, stdout, output.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward(name, stderr, output.clone());
        }

        Ok(Self {
            name: name.to_string(),
            child,
            stdin,
            output,
        })
    }

    fn failed(&self, e: std::io::Error) -> HostError {
        HostError::Channel {
            name: self.name.clone(),
            message: e.to_string(),
        }
    }
}

fn forward(name: &str, stream: impl Read + Send + 'static, output: OutputLog) {
    let name = name.to_string();
    thread::spawn(move || {
        for line in BufReader::new(stream).lines() {
            match line {
                Ok(line) => output.push(format!("[{name}] {line}")),
                Err(_) => break,
            }
        }
    });
}

impl Channel for ShellChannel {
    /// A pipe has no terminal to send ^C through, so the shell is replaced.
    fn send_interrupt(&mut self) -> Result<(), HostError> {
        self.output.push(format!("[{}] ^C", self.name));
        let fresh = Self::spawn(&self.name, self.output.clone())?;
        *self = fresh;
        Ok(())
    }

    fn send_text(&mut self, text: &str) -> Result<(), HostError> {
        self.output.push(format!("[{}] $ {text}", self.name));
        writeln!(self.stdin, "{text}").map_err(|e| self.failed(e))?;
        self.stdin.flush().map_err(|e| self.failed(e))
    }
}

impl Drop for ShellChannel {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

const CLIPBOARD_TOOLS: [(&str, &[&str]); 3] = [
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("pbcopy", &[]),
];

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

#[derive(Default)]
pub struct TerminalHost {
    pub output: OutputLog,
    notices: Vec<Notice>,
}

impl TerminalHost {
    pub fn new(output: OutputLog) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    /// Notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

fn pipe_to(program: &str, args: &[&str], text: &str) -> std::io::Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("{program} exited with {status}")))
    }
}

impl Host for TerminalHost {
    type Channel = ShellChannel;

    fn create_channel(&mut self, name: &str) -> Result<ShellChannel, HostError> {
        ShellChannel::spawn(name, self.output.clone())
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        let mut failures = Vec::new();
        for (program, args) in CLIPBOARD_TOOLS {
            match pipe_to(program, args, text) {
                Ok(()) => return Ok(()),
                Err(e) => failures.push(format!("{program}: {e}")),
            }
        }
        Err(HostError::Clipboard(failures.join("; ")))
    }

    fn open_file(&mut self, path: &Path) -> Result<(), HostError> {
        Command::new(OPENER)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|e| HostError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
    }

    fn notify(&mut self, notice: Notice) {
        match &notice {
            Notice::Info(message) => log::info!("{message}"),
            Notice::Error(message) => log::warn!("{message}"),
        }
        self.notices.push(notice);
    }

    fn reveal_percentage(&mut self, percentage: f64) {
        log::debug!("no source view to scroll to {percentage:.2}");
    }
}
