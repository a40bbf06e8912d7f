//! Error types surfaced by the pipeline's collaborators.
use std::io;

use thiserror::Error;

/// Failure to load a note's raw text from a [`ContentStore`].
///
/// This is the only pipeline error that is propagated to callers; everything
/// else degrades locally.
///
/// [`ContentStore`]: crate::store::ContentStore
#[derive(Debug, Error)]
pub enum FetchError {
  #[error("Note not found: {0}")]
  NotFound(String),

  #[error("Failed to read note '{name}': {source}")]
  Io {
    name:   String,
    #[source]
    source: io::Error,
  },

  #[error("Invalid note name: {0}")]
  InvalidName(String),
}

/// Result type for content fetches.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors reported by a [`MathTypesetter`].
///
/// [`MathTypesetter`]: crate::processor::math::MathTypesetter
#[derive(Debug, Error)]
pub enum MathError {
  #[error("Empty math expression")]
  Empty,

  #[error("Unbalanced braces in math expression: {0}")]
  UnbalancedBraces(String),

  #[error("Typesetting failed: {0}")]
  Failed(String),
}
