//! Messages exchanged between a preview webview and its host.
//!
//! Both directions are JSON objects tagged by `type` with camelCase fields.

use serde::{Deserialize, Serialize};

use crate::answer_key::{QuizResult, UserAnswer};
use crate::models::Command;

/// Sent by the preview page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum PreviewMessage {
    ExecuteCommand {
        command: Command,
        command_id: usize,
    },
    SaveScrollPosition {
        position: f64,
    },
    CheckQuizAnswer {
        quiz_id: String,
        answer: UserAnswer,
        #[serde(default)]
        answer_key_selector: Option<String>,
    },
    ScrollSync {
        percentage: f64,
    },
}

/// Sent to the preview page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HostMessage {
    QuizResult {
        quiz_id: String,
        #[serde(flatten)]
        result: QuizResult,
    },
    ScrollSync {
        percentage: f64,
    },
    CommandExecuted {
        command_id: usize,
    },
}
