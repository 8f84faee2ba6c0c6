use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use super::load::load_answer_key;
use super::model::AnswerKey;

/// Cache key: the document plus the optional custom key name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyRef {
    pub document: PathBuf,
    pub custom: Option<String>,
}

impl KeyRef {
    pub fn new(document: &Path, custom: Option<&str>) -> Self {
        Self {
            document: document.to_path_buf(),
            custom: custom.map(str::to_string),
        }
    }
}

type Loaded = (KeyRef, Option<AnswerKey>);

/// Answer keys known to one preview session.
///
/// Successful loads stay cached until [`invalidate`](Self::invalidate) or
/// [`clear`](Self::clear). Keys that were looked for and not found are
/// remembered the same way so a document without a key is not searched for
/// on every render.
pub struct AnswerKeyStore {
    cache: HashMap<KeyRef, Arc<AnswerKey>>,
    missing: HashSet<KeyRef>,
    pending: HashSet<KeyRef>,
    tx: Sender<Loaded>,
    rx: Receiver<Loaded>,
}

impl Default for AnswerKeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnswerKeyStore {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            cache: HashMap::new(),
            missing: HashSet::new(),
            pending: HashSet::new(),
            tx,
            rx,
        }
    }

    /// Resolves a key synchronously, loading it on a cache miss.
    pub fn resolve(&mut self, document: &Path, custom: Option<&str>) -> Option<Arc<AnswerKey>> {
        self.poll();
        let key_ref = KeyRef::new(document, custom);
        if let Some(key) = self.cache.get(&key_ref) {
            return Some(Arc::clone(key));
        }
        let loaded = load_answer_key(document, custom);
        self.store(key_ref, loaded)
    }

    /// Starts a background load unless the key is cached, known missing or
    /// already in flight. The result becomes visible after [`poll`](Self::poll).
    pub fn request(&mut self, document: &Path, custom: Option<&str>) {
        let key_ref = KeyRef::new(document, custom);
        if self.cache.contains_key(&key_ref)
            || self.missing.contains(&key_ref)
            || !self.pending.insert(key_ref.clone())
        {
            return;
        }
        let tx = self.tx.clone();
        thread::spawn(move || {
            let loaded = load_answer_key(&key_ref.document, key_ref.custom.as_deref());
            // The store may have been dropped with its session; nothing to deliver to.
            let _ = tx.send((key_ref, loaded));
        });
    }

    /// Moves finished background loads into the cache.
    pub fn poll(&mut self) {
        while let Ok((key_ref, loaded)) = self.rx.try_recv() {
            self.store(key_ref, loaded);
        }
    }

    /// Blocks until every requested load has finished.
    pub fn wait_pending(&mut self) {
        while !self.pending.is_empty() {
            match self.rx.recv() {
                Ok((key_ref, loaded)) => {
                    self.store(key_ref, loaded);
                }
                Err(_) => break,
            }
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Immutable view of the cached keys for one render.
    pub fn snapshot<'a>(
        &self,
        document: &Path,
        selectors: impl IntoIterator<Item = Option<&'a str>>,
    ) -> AnswerKeySnapshot {
        let keys = selectors
            .into_iter()
            .filter_map(|selector| {
                let key = self.cache.get(&KeyRef::new(document, selector))?;
                Some((selector.map(str::to_string), Arc::clone(key)))
            })
            .collect();
        AnswerKeySnapshot { keys }
    }

    /// Forgets everything known about `document`'s keys.
    pub fn invalidate(&mut self, document: &Path) {
        self.cache.retain(|k, _| k.document != document);
        self.missing.retain(|k| k.document != document);
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.missing.clear();
    }

    fn store(&mut self, key_ref: KeyRef, loaded: Option<AnswerKey>) -> Option<Arc<AnswerKey>> {
        self.pending.remove(&key_ref);
        match loaded {
            Some(key) => {
                let key = Arc::new(key);
                self.missing.remove(&key_ref);
                self.cache.insert(key_ref, Arc::clone(&key));
                Some(key)
            }
            None => {
                self.missing.insert(key_ref);
                None
            }
        }
    }
}

/// The answer keys a single render may consult, by selector.
///
/// `None` is the document's default key.
#[derive(Debug, Clone, Default)]
pub struct AnswerKeySnapshot {
    keys: BTreeMap<Option<String>, Arc<AnswerKey>>,
}

impl AnswerKeySnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, selector: Option<&str>, key: AnswerKey) -> Self {
        self.keys.insert(selector.map(str::to_string), Arc::new(key));
        self
    }

    pub fn get(&self, selector: Option<&str>) -> Option<&AnswerKey> {
        self.keys
            .get(&selector.map(str::to_string))
            .map(|key| key.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};

    const KEY: &str = "answers:\n  q1:\n    correct: B\n";

    #[test]
    fn resolve_caches_successful_loads() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "doc.answer.yaml", KEY);
        let document = dir.path().join("doc.md");
        let mut store = AnswerKeyStore::new();

        let first = store.resolve(&document, None).unwrap();
        std::fs::remove_file(path).unwrap();
        let second = store.resolve(&document, None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        store.clear();
        assert!(store.resolve(&document, None).is_none());
    }

    #[test]
    fn custom_names_are_cached_separately() {
        let dir = create_test_dir();
        create_test_file(&dir, "doc.answer.yaml", KEY);
        let document = dir.path().join("doc.md");
        let mut store = AnswerKeyStore::new();
        assert!(store.resolve(&document, None).is_some());
        assert!(store.resolve(&document, Some("other")).is_none());
    }

    #[test]
    fn background_request_lands_after_wait() {
        let dir = create_test_dir();
        create_test_file(&dir, "doc.answer.yaml", KEY);
        let document = dir.path().join("doc.md");
        let mut store = AnswerKeyStore::new();

        assert!(store.snapshot(&document, [None]).is_empty());
        store.request(&document, None);
        store.request(&document, None);
        store.wait_pending();
        assert!(!store.is_pending());

        let snapshot = store.snapshot(&document, [None]);
        assert!(snapshot.get(None).unwrap().answer("q1").is_some());
        assert!(snapshot.get(Some("x")).is_none());
    }

    #[test]
    fn missing_keys_are_not_requested_again_until_invalidated() {
        let dir = create_test_dir();
        let document = dir.path().join("doc.md");
        let mut store = AnswerKeyStore::new();

        store.request(&document, None);
        store.wait_pending();
        create_test_file(&dir, "doc.answer.yaml", KEY);
        store.request(&document, None);
        assert!(!store.is_pending());

        store.invalidate(&document);
        store.request(&document, None);
        store.wait_pending();
        assert!(store.snapshot(&document, [None]).get(None).is_some());
    }
}
