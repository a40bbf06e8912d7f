//! Types for the sharepage-markdown public API.
use serde::{Deserialize, Serialize};

use crate::metadata::NoteKind;

/// Represents a header in a Markdown document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Header {
  /// Header text (inline content, no markdown formatting).
  pub text:  String,
  /// Header level (1-4).
  pub level: u8,
  /// Generated anchor ID for the header.
  pub id:    String,
}

/// Preview and SEO metadata for one note.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metadata {
  pub title:       String,
  pub description: String,
  pub thumbnail:   Option<String>,
  pub tags:        Vec<String>,
  /// Canonical page URL.
  pub url:         String,
  pub kind:        NoteKind,
}

impl Metadata {
  /// Open Graph `og:type` for this note.
  #[must_use]
  pub const fn og_type(&self) -> &'static str {
    self.kind.og_type()
  }
}

/// Result of running the full pipeline over one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderedDocument {
  /// Final HTML fragment.
  pub html: String,

  /// Declared and inline tags, deduplicated.
  pub tags: Vec<String>,

  /// Display title derived from the file name.
  pub title: String,

  pub metadata: Metadata,

  /// Headings that received an ID (for `ToC`, navigation, etc).
  pub headers: Vec<Header>,
}

/// A note referenced from the dashboard, resolved through its frontmatter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NoteReference {
  /// Logical note name as linked (no extension).
  pub name:        String,
  /// Page path derived from `name`.
  pub path:        String,
  /// File name in the notes store.
  pub file:        String,
  pub title:       String,
  pub description: String,
  pub thumbnail:   Option<String>,
  pub tags:        Vec<String>,
  pub kind:        NoteKind,
  /// Date string the sort key came from, if any.
  pub date:        Option<String>,
  /// Larger sorts first.
  pub sort_key:    i64,
}

/// A named group of notes on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DashboardSection {
  pub title: String,
  pub notes: Vec<NoteReference>,
  pub count: usize,
}

impl DashboardSection {
  #[must_use]
  pub fn new(title: impl Into<String>, notes: Vec<NoteReference>) -> Self {
    Self {
      title: title.into(),
      count: notes.len(),
      notes,
    }
  }
}
