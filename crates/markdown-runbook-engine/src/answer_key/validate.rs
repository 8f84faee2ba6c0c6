use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{AnswerKey, AnswerValue, UserAnswer};

/// Explanation reported when no key or no entry exists for a question.
pub const NO_ANSWER_KEY: &str = "no answer key found";

/// Outcome of checking one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<AnswerValue>,
}

/// Checks `user_answer` against the key's entry for `question_id`.
///
/// Strings are trimmed, and lowercased as well when the entry is
/// case-insensitive. Multi-answer entries need exactly the same set (order and
/// duplicates ignored, no partial credit). Single answers match `correct` or
/// any of `alternatives`. When an entry exists the result always carries the
/// key's `correct` value and explanation.
pub fn validate_answer(
    question_id: &str,
    user_answer: &UserAnswer,
    key: Option<&AnswerKey>,
) -> QuizResult {
    let Some((key, answer)) = key.and_then(|key| Some((key, key.answer(question_id)?))) else {
        return QuizResult {
            correct: false,
            explanation: Some(NO_ANSWER_KEY.to_string()),
            correct_answer: None,
        };
    };

    let case_sensitive = key.case_sensitive(answer);
    let normalize = |s: &str| -> String {
        let trimmed = s.trim();
        if case_sensitive {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        }
    };

    let correct = match &answer.correct {
        AnswerValue::Many(expected) => {
            let expected: BTreeSet<String> = expected.iter().map(|s| normalize(s.as_str())).collect();
            let given: BTreeSet<String> =
                user_answer.as_slice().iter().map(|s| normalize(s.as_str())).collect();
            expected == given
        }
        AnswerValue::One(expected) => match user_answer.as_slice() {
            [given] => {
                let given = normalize(given.as_str());
                std::iter::once(expected)
                    .chain(&answer.alternatives)
                    .any(|candidate| normalize(candidate.as_str()) == given)
            }
            _ => false,
        },
    };

    QuizResult {
        correct,
        explanation: answer.explanation.clone(),
        correct_answer: Some(answer.correct.clone()),
    }
}
