use std::fs;
use std::path::{Path, PathBuf};

use super::model::AnswerKey;

#[derive(Debug, thiserror::Error)]
pub enum AnswerKeyError {
    #[error("Failed to read answer key at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Answer key at {path} is neither YAML ({yaml}) nor JSON ({json})")]
    Parse {
        path: PathBuf,
        yaml: serde_yaml::Error,
        json: serde_json::Error,
    },
}

const DEFAULT_SUFFIXES: [&str; 3] = ["answer.yaml", "answer.yml", "answer"];
const CUSTOM_EXTENSIONS: [&str; 2] = ["yaml", "yml"];

/// Paths searched for the answer key of `document`, in priority order.
///
/// With a custom name: `<dir>/<name>.yaml`, `<dir>/<name>.yml`, `<dir>/<name>`.
/// Otherwise the document's extension is replaced by `.answer.yaml`,
/// `.answer.yml` and `.answer`.
pub fn candidate_paths(document: &Path, custom: Option<&str>) -> Vec<PathBuf> {
    match custom {
        Some(name) => {
            let dir = document.parent().unwrap_or_else(|| Path::new(""));
            CUSTOM_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{name}.{ext}")))
                .chain(std::iter::once(dir.join(name)))
                .collect()
        }
        None => DEFAULT_SUFFIXES
            .iter()
            .map(|suffix| document.with_extension(suffix))
            .collect(),
    }
}

/// Parses answer key text as YAML, falling back to JSON.
pub fn parse_answer_key(path: &Path, text: &str) -> Result<AnswerKey, AnswerKeyError> {
    serde_yaml::from_str(text).or_else(|yaml| {
        serde_json::from_str(text).map_err(|json| AnswerKeyError::Parse {
            path: path.to_path_buf(),
            yaml,
            json,
        })
    })
}

fn read_answer_key(path: &Path) -> Result<AnswerKey, AnswerKeyError> {
    let text = fs::read_to_string(path).map_err(|source| AnswerKeyError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_answer_key(path, &text)
}

/// Loads the first usable answer key for `document`.
///
/// Missing candidates are skipped silently; unreadable or unparsable ones are
/// logged and skipped. Never fails: no usable candidate means `None`.
pub fn load_answer_key(document: &Path, custom: Option<&str>) -> Option<AnswerKey> {
    for path in candidate_paths(document, custom) {
        if !path.is_file() {
            continue;
        }
        match read_answer_key(&path) {
            Ok(key) => {
                log::debug!("loaded answer key {}", path.display());
                return Some(key);
            }
            Err(e) => log::warn!("{e}"),
        }
    }
    log::debug!(
        "no answer key for {} (custom: {custom:?})",
        document.display()
    );
    None
}
