//! # Answer Keys
//!
//! Externally authored files that map quiz ids to correct answers.
//!
//! - **`model`**: `AnswerKey`, `Answer`, `AnswerValue` and the scalar-tolerant
//!   deserialization that lets authors write `correct: 4` or `correct: B`.
//! - **`load`**: candidate path search and YAML-then-JSON parsing.
//! - **`store`**: per-session cache with background loading and immutable
//!   per-render snapshots.
//! - **`validate`**: answer normalization and comparison.

pub mod load;
pub mod model;
mod scalar;
pub mod store;
pub mod validate;

pub use load::{AnswerKeyError, candidate_paths, load_answer_key, parse_answer_key};
pub use model::{Answer, AnswerKey, AnswerKeySettings, AnswerValue, UserAnswer};
pub use store::{AnswerKeySnapshot, AnswerKeyStore, KeyRef};
pub use validate::{NO_ANSWER_KEY, QuizResult, validate_answer};
