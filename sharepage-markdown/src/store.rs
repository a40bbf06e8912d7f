//! Where note text comes from.
//!
//! The pipeline only ever asks a [`ContentStore`] for a note by its logical
//! name. Names are NFC-normalized and matched case-insensitively as a
//! fallback, so links written on one platform resolve on another.
use std::{
  collections::HashMap,
  fs,
  path::{Component, Path, PathBuf},
  sync::{Arc, Mutex, PoisonError},
  time::SystemTime,
};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::{
  error::{FetchError, FetchResult},
  utils::{normalize_name, strip_md_extension},
};

/// Source of raw note text, keyed by logical note name.
pub trait ContentStore: Send + Sync {
  /// Fetch the raw text of `name`. A missing `.md` extension is implied.
  ///
  /// # Errors
  ///
  /// Returns [`FetchError::NotFound`] when no such note exists and
  /// [`FetchError::Io`] when it exists but cannot be read.
  fn fetch(&self, name: &str) -> FetchResult<String>;
}

impl<T: ContentStore + ?Sized> ContentStore for Arc<T> {
  fn fetch(&self, name: &str) -> FetchResult<String> {
    (**self).fetch(name)
  }
}

impl<T: ContentStore + ?Sized> ContentStore for &T {
  fn fetch(&self, name: &str) -> FetchResult<String> {
    (**self).fetch(name)
  }
}

/// The file name a logical note name is stored under.
#[must_use]
pub fn note_file_name(name: &str) -> String {
  let name = normalize_name(name);
  if name.ends_with(".md") {
    name
  } else {
    format!("{name}.md")
  }
}

/// Key under which two spellings of the same note compare equal: NFC,
/// lower-cased, spaces as `_`, no `.md`. Mirrors the fallbacks
/// [`FsContentStore`] resolves, so `[[Book A]]` and `book_a.md` agree.
#[must_use]
pub fn note_key(name: &str) -> String {
  strip_md_extension(&normalize_name(name))
    .trim()
    .to_lowercase()
    .replace(' ', "_")
}

/// Notes stored as `.md` files under a directory.
#[derive(Debug, Clone)]
pub struct FsContentStore {
  root: PathBuf,
}

impl FsContentStore {
  #[must_use]
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  #[must_use]
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn read(&self, name: &str, path: &Path) -> FetchResult<String> {
    fs::read_to_string(path).map_err(|source| {
      FetchError::Io {
        name: name.to_string(),
        source,
      }
    })
  }

  /// Walk the store looking for a file whose relative path matches `file`
  /// ignoring case and Unicode normalization.
  fn find_loosely(&self, file: &str) -> Option<PathBuf> {
    let wanted = file.to_lowercase();
    let wanted_underscored = wanted.replace(' ', "_");

    WalkDir::new(&self.root)
      .into_iter()
      .filter_map(Result::ok)
      .filter(|entry| entry.file_type().is_file())
      .find(|entry| {
        entry
          .path()
          .strip_prefix(&self.root)
          .ok()
          .map(relative_name)
          .is_some_and(|candidate| {
            let candidate = normalize_name(&candidate).to_lowercase();
            candidate == wanted || candidate == wanted_underscored
          })
      })
      .map(walkdir::DirEntry::into_path)
  }
}

impl ContentStore for FsContentStore {
  fn fetch(&self, name: &str) -> FetchResult<String> {
    let file = note_file_name(name);
    let relative = Path::new(&file);
    if relative
      .components()
      .any(|c| !matches!(c, Component::Normal(_)))
    {
      return Err(FetchError::InvalidName(name.to_string()));
    }

    for candidate in [file.clone(), file.replace(' ', "_")] {
      let path = self.root.join(&candidate);
      if path.is_file() {
        return self.read(name, &path);
      }
    }

    match self.find_loosely(&file) {
      Some(path) => {
        log::debug!("Resolved '{name}' loosely to {}", path.display());
        self.read(name, &path)
      },
      None => Err(FetchError::NotFound(name.to_string())),
    }
  }
}

/// Notes held in memory. Handy for tests and for embedding callers that
/// already have the text.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  notes: HashMap<String, String>,
}

impl MemoryStore {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Add or replace a note.
  pub fn insert(&mut self, name: &str, content: impl Into<String>) {
    self.notes.insert(note_file_name(name), content.into());
  }

  /// Builder-style [`MemoryStore::insert`].
  #[must_use]
  pub fn with(mut self, name: &str, content: impl Into<String>) -> Self {
    self.insert(name, content);
    self
  }
}

impl ContentStore for MemoryStore {
  fn fetch(&self, name: &str) -> FetchResult<String> {
    let file = note_file_name(name);
    if let Some(content) = self.notes.get(&file) {
      return Ok(content.clone());
    }

    let wanted = note_key(name);
    self
      .notes
      .iter()
      .find(|(key, _)| note_key(key) == wanted)
      .map(|(_, content)| content.clone())
      .ok_or_else(|| FetchError::NotFound(name.to_string()))
  }
}

/// A keyed content cache in front of another store.
///
/// Only successful fetches are cached. This is the one piece of state that
/// is shared between concurrent pipeline runs.
#[derive(Debug)]
pub struct CachedStore<S> {
  inner: S,
  cache: Mutex<HashMap<String, String>>,
}

impl<S: ContentStore> CachedStore<S> {
  #[must_use]
  pub fn new(inner: S) -> Self {
    Self {
      inner,
      cache: Mutex::new(HashMap::new()),
    }
  }

  /// Number of cached notes.
  #[must_use]
  pub fn len(&self) -> usize {
    self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Forget everything.
  pub fn clear(&self) {
    self
      .cache
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clear();
  }
}

impl<S: ContentStore> ContentStore for CachedStore<S> {
  fn fetch(&self, name: &str) -> FetchResult<String> {
    let key = note_file_name(name);

    if let Some(content) = self
      .cache
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .get(&key)
    {
      log::trace!("Cache hit: {key}");
      return Ok(content.clone());
    }

    log::trace!("Cache miss: {key}");
    let content = self.inner.fetch(name)?;
    self
      .cache
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .insert(key, content.clone());
    Ok(content)
  }
}

/// The global list of published note files, most recent first.
///
/// Used for auto-discovery on the dashboard and as the last-resort sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRegistry {
  files: Vec<String>,
}

impl FileRegistry {
  #[must_use]
  pub fn new(files: Vec<String>) -> Self {
    Self {
      files: files.iter().map(|f| normalize_name(f)).collect(),
    }
  }

  /// Parse a JSON array of file names.
  ///
  /// # Errors
  ///
  /// Returns an error if `json` is not an array of strings.
  pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
    let files: Vec<String> = serde_json::from_str(json)?;
    Ok(Self::new(files))
  }

  /// Load a registry file. An unreadable or malformed registry simply means
  /// there is no auto-discovery, so this returns `None` instead of failing.
  #[must_use]
  pub fn load(path: &Path) -> Option<Self> {
    let json = fs::read_to_string(path)
      .map_err(|e| {
        log::debug!("No file registry at {}: {e}", path.display());
      })
      .ok()?;
    Self::from_json(&json)
      .map_err(|e| {
        log::warn!("Ignoring malformed file registry {}: {e}", path.display());
      })
      .ok()
  }

  /// Build a registry from the `.md` files under `dir`, most recently
  /// modified first. Files starting with `_` (the dashboard, drafts) are
  /// not published and are left out.
  #[must_use]
  pub fn discover(dir: &Path) -> Option<Self> {
    if !dir.is_dir() {
      log::debug!("Cannot discover notes, not a directory: {}", dir.display());
      return None;
    }

    let mut found: Vec<(SystemTime, String)> = WalkDir::new(dir)
      .into_iter()
      .filter_map(Result::ok)
      .filter(|entry| entry.file_type().is_file())
      .filter(|entry| {
        let name = entry.file_name().to_string_lossy();
        name.ends_with(".md") && !name.starts_with('_')
      })
      .filter_map(|entry| {
        let relative = entry.path().strip_prefix(dir).ok()?;
        let modified = entry
          .metadata()
          .ok()
          .and_then(|m| m.modified().ok())
          .unwrap_or(SystemTime::UNIX_EPOCH);
        Some((modified, relative_name(relative)))
      })
      .collect();

    found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    Some(Self::new(found.into_iter().map(|(_, name)| name).collect()))
  }

  #[must_use]
  pub fn files(&self) -> &[String] {
    &self.files
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.files.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  /// Whether `file` is listed, compared by [`note_key`].
  #[must_use]
  pub fn contains(&self, file: &str) -> bool {
    self.position(file).is_some()
  }

  #[must_use]
  pub fn position(&self, file: &str) -> Option<usize> {
    let key = note_key(file);
    self.files.iter().position(|f| note_key(f) == key)
  }

  /// Position-based sort key: earlier entries sort higher.
  #[must_use]
  pub fn sort_key(&self, file: &str) -> Option<i64> {
    let idx = self.position(file)?;
    i64::try_from(self.files.len() - idx).ok()
  }

  /// Serialize as the JSON array [`FileRegistry::from_json`] reads.
  ///
  /// # Errors
  ///
  /// Returns an error if serialization fails.
  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&self.files)
  }
}

fn relative_name(path: &Path) -> String {
  path
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(test)]
mod tests {
  use std::fs;

  use super::*;

  #[test]
  fn test_note_file_name() {
    assert_eq!(note_file_name("Note"), "Note.md");
    assert_eq!(note_file_name("Note.md"), "Note.md");
    assert_eq!(note_file_name(" Cafe\u{301} "), "Caf\u{e9}.md");
  }

  #[test]
  fn test_fs_store_fetch_and_fallbacks() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("Plain.md"), "plain").expect("write");
    fs::write(dir.path().join("With_Space.md"), "underscored").expect("write");
    fs::write(dir.path().join("MixedCase.md"), "mixed").expect("write");

    let store = FsContentStore::new(dir.path());
    assert_eq!(store.fetch("Plain").expect("fetch"), "plain");
    assert_eq!(store.fetch("With Space").expect("fetch"), "underscored");
    assert_eq!(store.fetch("mixedcase").expect("fetch"), "mixed");
    assert!(matches!(
      store.fetch("Missing"),
      Err(FetchError::NotFound(name)) if name == "Missing"
    ));
  }

  #[test]
  fn test_fs_store_rejects_escaping_names() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = FsContentStore::new(dir.path());
    assert!(matches!(
      store.fetch("../secret"),
      Err(FetchError::InvalidName(_))
    ));
  }

  #[test]
  fn test_memory_store_case_insensitive() {
    let store = MemoryStore::new().with("Book A", "content");
    assert_eq!(store.fetch("book a").expect("fetch"), "content");
    assert_eq!(store.fetch("book_a").expect("fetch"), "content");
    assert!(store.fetch("Book B").is_err());
  }

  #[test]
  fn test_note_key_joins_spellings() {
    assert_eq!(note_key("Book A"), "book_a");
    assert_eq!(note_key("book_a.md"), "book_a");
    assert_eq!(note_key(" Cafe\u{301} Note "), note_key("café_note.md"));
  }

  #[test]
  fn test_registry_position_ignores_spelling() {
    let registry = FileRegistry::new(vec!["Book_A.md".into(), "Listed.md".into()]);
    assert_eq!(registry.position("Book A"), Some(0));
    assert_eq!(registry.position("listed"), Some(1));
    assert!(!registry.contains("Book B"));
  }

  #[test]
  fn test_cached_store_only_caches_hits() {
    let store = CachedStore::new(MemoryStore::new().with("a", "A"));
    assert!(store.is_empty());
    assert_eq!(store.fetch("a").expect("fetch"), "A");
    assert!(store.fetch("missing").is_err());
    assert_eq!(store.len(), 1);
    assert_eq!(store.fetch("a.md").expect("fetch"), "A");
    store.clear();
    assert!(store.is_empty());
  }

  #[test]
  fn test_registry_positions() {
    let registry =
      FileRegistry::from_json(r#"["new.md", "mid.md", "old.md"]"#)
        .expect("valid registry");
    assert_eq!(registry.sort_key("new"), Some(3));
    assert_eq!(registry.sort_key("old.md"), Some(1));
    assert_eq!(registry.sort_key("absent"), None);
    assert!(registry.contains("mid"));
  }

  #[test]
  fn test_registry_load_missing_is_none() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    assert!(FileRegistry::load(&dir.path().join("nope.json")).is_none());

    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{not json").expect("write");
    assert!(FileRegistry::load(&bad).is_none());
  }

  #[test]
  fn test_registry_discover_skips_private_files() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(dir.path().join("_dashboard.md"), "").expect("write");
    fs::write(dir.path().join("note.md"), "").expect("write");
    fs::write(dir.path().join("image.png"), "").expect("write");
    fs::create_dir(dir.path().join("sub")).expect("mkdir");
    fs::write(dir.path().join("sub").join("deep.md"), "").expect("write");

    let registry = FileRegistry::discover(dir.path()).expect("registry");
    let mut files = registry.files().to_vec();
    files.sort();
    assert_eq!(files, ["note.md", "sub/deep.md"]);
  }

  #[test]
  fn test_registry_json_round_trip() {
    let registry = FileRegistry::new(vec!["a.md".into(), "b.md".into()]);
    let json = registry.to_json().expect("serialize");
    assert_eq!(FileRegistry::from_json(&json).expect("parse"), registry);
  }
}
