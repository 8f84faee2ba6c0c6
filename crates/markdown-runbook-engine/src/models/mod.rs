pub mod admonition;
pub mod command;
pub mod quiz;

pub use admonition::AdmonitionKind;
pub use command::{Action, ActionKind, BlockCommandDescriptor, Command, CommandDescriptor, Location};
pub use quiz::{QuizKind, QuizOption, QuizQuestion};
