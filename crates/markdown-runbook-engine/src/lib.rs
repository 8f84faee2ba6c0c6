pub mod answer_key;
pub mod dispatch;
pub mod grammar;
pub mod io;
pub mod lens;
pub mod models;
pub mod quiz;
pub mod render;
pub mod session;
pub mod state;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use answer_key::{AnswerKey, AnswerKeySnapshot, AnswerKeyStore, QuizResult, UserAnswer};
pub use dispatch::{
    Channel, DispatchError, DispatchSettings, Dispatcher, Host, HostError, Notice, PathBase,
};
pub use grammar::{parse_block_commands, parse_commands};
pub use io::*;
pub use lens::{CommandLens, collect_lenses, should_auto_open, status_text};
pub use models::{
    Action, ActionKind, AdmonitionKind, BlockCommandDescriptor, Command, CommandDescriptor,
    Location, QuizKind, QuizOption, QuizQuestion,
};
pub use render::{
    CommandOrigin, PreviewPage, Rendered, RenderedCommand, RenderedQuiz, render, render_document,
};
pub use session::{HostMessage, PreviewMessage, PreviewRegistry, PreviewSession};
pub use state::{CommandKey, ExecutionState};
