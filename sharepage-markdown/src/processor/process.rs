//! Panic-safe wrappers and batch processing.
use std::panic::{AssertUnwindSafe, catch_unwind};

use log::error;
use rayon::prelude::*;

use super::types::MarkdownProcessor;
use crate::{
  error::FetchResult,
  metadata::{NoteKind, title_from_file},
  store::ContentStore,
  types::{Metadata, RenderedDocument},
};

fn log_panic(stage: &str, payload: &(dyn std::any::Any + Send)) {
  if let Some(msg) = payload.downcast_ref::<String>() {
    error!("Error processing {stage}: {msg}");
  } else if let Some(msg) = payload.downcast_ref::<&str>() {
    error!("Error processing {stage}: {msg}");
  } else {
    error!("Unknown error occurred while processing {stage}");
  }
}

/// Safely process markup content with error recovery.
///
/// Runs `processor_fn` and, should it panic, logs the failure and returns
/// `fallback` (or the untouched input when `fallback` is empty) instead of
/// breaking the whole document.
///
/// # Arguments
///
/// * `content` - The content to process
/// * `processor_fn` - The processing function to apply
/// * `fallback` - Fallback content to use if processing fails
pub fn process_safe<F>(content: &str, processor_fn: F, fallback: &str) -> String
where
  F: FnOnce(&str) -> String,
{
  // Avoid processing empty strings
  if content.is_empty() {
    return String::new();
  }

  match catch_unwind(AssertUnwindSafe(|| processor_fn(content))) {
    Ok(processed_text) => processed_text,
    Err(e) => {
      log_panic("markup", e.as_ref());
      if fallback.is_empty() {
        content.to_string()
      } else {
        fallback.to_string()
      }
    },
  }
}

/// Like [`process_safe`] for stages that produce more than a string.
pub fn process_safe_with<T, F, G>(stage: &str, processor_fn: F, fallback: G) -> T
where
  F: FnOnce() -> T,
  G: FnOnce() -> T,
{
  match catch_unwind(AssertUnwindSafe(processor_fn)) {
    Ok(value) => value,
    Err(e) => {
      log_panic(stage, e.as_ref());
      fallback()
    },
  }
}

/// Render a document, never failing.
///
/// Every stage already recovers on its own; this catches anything that
/// slips through and returns an error notice as the document body.
#[must_use]
pub fn process_with_recovery(
  processor: &MarkdownProcessor,
  name: &str,
  raw: &str,
) -> RenderedDocument {
  process_safe_with(
    "document",
    || processor.render_document(name, raw),
    || {
      let title = title_from_file(name);
      RenderedDocument {
        html: "<div class=\"error\">Critical error processing markdown \
               content</div>"
          .to_string(),
        tags: Vec::new(),
        metadata: Metadata {
          title:       title.clone(),
          description: String::new(),
          thumbnail:   None,
          tags:        Vec::new(),
          url:         processor.resolver().page_url(name),
          kind:        NoteKind::Standard,
        },
        title,
        headers: Vec::new(),
      }
    },
  )
}

/// Load and render several notes in parallel.
///
/// Results come back in the order of `names`. A note that cannot be
/// fetched yields its error and does not affect the others.
#[must_use]
pub fn process_batch<S>(
  processor: &MarkdownProcessor,
  store: &S,
  names: &[String],
) -> Vec<(String, FetchResult<RenderedDocument>)>
where
  S: ContentStore + ?Sized,
{
  names
    .par_iter()
    .map(|name| {
      let result = store
        .fetch(name)
        .map(|raw| process_with_recovery(processor, name, &raw));
      (name.clone(), result)
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{MarkdownOptions, store::MemoryStore};

  #[test]
  fn test_process_safe_recovers_from_panic() {
    let out = process_safe("input", |_| panic!("boom"), "");
    assert_eq!(out, "input");

    let out = process_safe("input", |_| panic!("boom"), "fallback");
    assert_eq!(out, "fallback");

    assert_eq!(process_safe("", |s| format!("{s}!"), ""), "");
  }

  #[test]
  fn test_process_safe_with_fallback() {
    let value: usize = process_safe_with("count", || panic!("boom"), || 7);
    assert_eq!(value, 7);
  }

  #[test]
  fn test_batch_keeps_order_and_errors() {
    let processor = MarkdownProcessor::new(MarkdownOptions {
      highlight_code: false,
      ..Default::default()
    });
    let store = MemoryStore::new().with("a", "# A").with("c", "# C");
    let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let results = process_batch(&processor, &store, &names);
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "a");
    assert!(results[0].1.as_ref().is_ok_and(|d| d.html.contains("id=\"a\"")));
    assert!(results[1].1.is_err());
    assert!(results[2].1.as_ref().is_ok_and(|d| d.title == "c"));
  }
}
