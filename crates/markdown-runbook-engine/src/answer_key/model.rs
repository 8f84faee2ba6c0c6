use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::scalar::{self, Scalar};

/// A parsed answer key file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKey {
    #[serde(default, deserialize_with = "scalar::optional")]
    pub version: Option<String>,
    #[serde(default)]
    pub answers: BTreeMap<String, Answer>,
    #[serde(default)]
    pub settings: Option<AnswerKeySettings>,
}

/// File-wide defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerKeySettings {
    /// Default for answers that do not set `caseSensitive` themselves.
    #[serde(default)]
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub correct: AnswerValue,
    #[serde(default, deserialize_with = "scalar::optional")]
    pub explanation: Option<String>,
    /// Extra accepted spellings for single answers.
    #[serde(default, deserialize_with = "scalar::list")]
    pub alternatives: Vec<String>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
}

/// A single answer or an unordered set of answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    One(String),
    Many(Vec<String>),
}

/// What a reader submitted: the same shape as a key's `correct` value.
pub type UserAnswer = AnswerValue;

impl<'de> Deserialize<'de> for AnswerValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Many(Vec<Scalar>),
            One(Scalar),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Many(values) => AnswerValue::Many(values.into_iter().map(|s| s.0).collect()),
            Raw::One(value) => AnswerValue::One(value.0),
        })
    }
}

impl AnswerValue {
    pub fn is_many(&self) -> bool {
        matches!(self, AnswerValue::Many(_))
    }

    pub fn as_slice(&self) -> &[String] {
        match self {
            AnswerValue::One(value) => std::slice::from_ref(value),
            AnswerValue::Many(values) => values,
        }
    }
}

impl AnswerKey {
    pub fn answer(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Whether comparisons for `answer` keep case: the answer's own flag,
    /// then the file default, then `true`.
    pub fn case_sensitive(&self, answer: &Answer) -> bool {
        answer
            .case_sensitive
            .or_else(|| self.settings.as_ref().and_then(|s| s.case_sensitive))
            .unwrap_or(true)
    }

    /// Whether `question_id` expects several answers.
    pub fn is_multi_answer(&self, question_id: &str) -> bool {
        self.answer(question_id)
            .is_some_and(|answer| answer.correct.is_many())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_full_yaml_schema() {
        let yaml = r#"
version: 2
settings:
  caseSensitive: false
answers:
  q1:
    correct: B
    explanation: Two plus two is four.
  q2:
    correct: [A, C]
  q3:
    correct: 42
    alternatives: [forty-two, "42.0"]
    caseSensitive: true
"#;
        let key: AnswerKey = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(key.version.as_deref(), Some("2"));
        assert_eq!(key.answers["q1"].correct, AnswerValue::One("B".into()));
        assert_eq!(
            key.answers["q2"].correct,
            AnswerValue::Many(vec!["A".into(), "C".into()])
        );
        assert_eq!(key.answers["q3"].correct, AnswerValue::One("42".into()));
        assert_eq!(key.answers["q3"].alternatives, vec!["forty-two", "42.0"]);
        assert!(!key.case_sensitive(&key.answers["q1"]));
        assert!(key.case_sensitive(&key.answers["q3"]));
        assert!(key.is_multi_answer("q2"));
        assert!(!key.is_multi_answer("q1"));
        assert!(!key.is_multi_answer("missing"));
    }

    #[test]
    fn case_sensitivity_defaults_to_true() {
        let key: AnswerKey = serde_json::from_str(r#"{"answers":{"q":{"correct":"x"}}}"#).unwrap();
        assert!(key.case_sensitive(&key.answers["q"]));
        assert!(key.answers["q"].alternatives.is_empty());
    }

    #[test]
    fn answer_value_serializes_untagged() {
        assert_eq!(
            serde_json::to_string(&AnswerValue::One("B".into())).unwrap(),
            r#""B""#
        );
        assert_eq!(
            serde_json::to_string(&AnswerValue::Many(vec!["A".into(), "C".into()])).unwrap(),
            r#"["A","C"]"#
        );
    }
}
