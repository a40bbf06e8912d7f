//! Type definitions for the Markdown processor.
//!
//! Contains the configuration options (`MarkdownOptions`), their builder and
//! the processor struct itself (`MarkdownProcessor`).
//!
//! # Examples
//!
//! ```
//! use sharepage_markdown::{MarkdownOptions, MarkdownProcessor};
//!
//! let options = MarkdownOptions {
//!   highlight_code: false,
//!   max_heading_level: 3,
//!   ..Default::default()
//! };
//!
//! let processor = MarkdownProcessor::new(options);
//! ```
use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::{
  metadata::DEFAULT_DESCRIPTION_LENGTH,
  processor::math::MathTypesetter,
  render::MarkdownRenderer,
  resolver::AssetResolver,
  syntax::SyntaxManager,
};

const fn default_true() -> bool {
  true
}

const fn default_highlight_code() -> bool {
  cfg!(feature = "syntect")
}

fn default_diagram_languages() -> Vec<String> {
  vec!["mermaid".to_string()]
}

const fn default_max_heading_level() -> u8 {
  4
}

const fn default_description_length() -> usize {
  DEFAULT_DESCRIPTION_LENGTH
}

/// Options for configuring the Markdown processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct MarkdownOptions {
  /// Enable GitHub Flavored Markdown (GFM) extensions.
  #[serde(default = "default_true")]
  pub gfm: bool,

  /// Render single newlines as line breaks.
  #[serde(default = "default_true")]
  pub hard_breaks: bool,

  /// Enable syntax highlighting for code blocks.
  #[serde(default = "default_highlight_code")]
  pub highlight_code: bool,

  /// Optional: Custom syntax highlighting theme name. Becomes the syntax
  /// manager's default stylesheet theme.
  #[serde(default)]
  pub highlight_theme: Option<String>,

  /// Code block languages handed to the diagram renderer.
  #[serde(default = "default_diagram_languages")]
  pub diagram_languages: Vec<String>,

  /// Deepest heading level that receives an ID and anchor.
  #[serde(default = "default_max_heading_level")]
  pub max_heading_level: u8,

  /// Maximum description length, in characters.
  #[serde(default = "default_description_length")]
  pub description_length: usize,

  /// Turn `**strong**` into `<strong>` before rendering, for runs CommonMark
  /// refuses to treat as emphasis (e.g. next to CJK punctuation).
  #[serde(default = "default_true")]
  pub normalize_strong_emphasis: bool,
}

impl Default for MarkdownOptions {
  fn default() -> Self {
    Self {
      gfm:                       true,
      hard_breaks:               true,
      highlight_code:            default_highlight_code(),
      highlight_theme:           None,
      diagram_languages:         default_diagram_languages(),
      max_heading_level:         default_max_heading_level(),
      description_length:        DEFAULT_DESCRIPTION_LENGTH,
      normalize_strong_emphasis: true,
    }
  }
}

/// Main Markdown processor.
///
/// Holds configuration and collaborators only, never per-document state,
/// so one instance can render any number of documents concurrently. Cheap
/// to clone since collaborators are behind `Arc`s.
#[derive(Clone)]
pub struct MarkdownProcessor {
  pub(crate) options:        MarkdownOptions,
  pub(crate) syntax_manager: Option<Arc<SyntaxManager>>,
  pub(crate) resolver:       Arc<dyn AssetResolver>,
  pub(crate) typesetter:     Arc<dyn MathTypesetter>,
  pub(crate) renderer:       Arc<dyn MarkdownRenderer>,
}

impl fmt::Debug for MarkdownProcessor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MarkdownProcessor")
      .field("options", &self.options)
      .field(
        "highlighter",
        &self.syntax_manager.as_ref().map(|m| m.highlighter().name()),
      )
      .finish_non_exhaustive()
  }
}

/// Builder for constructing `MarkdownOptions` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptionsBuilder {
  options: MarkdownOptions,
}

impl MarkdownOptionsBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Enable or disable GitHub Flavored Markdown.
  #[must_use]
  pub const fn gfm(mut self, enabled: bool) -> Self {
    self.options.gfm = enabled;
    self
  }

  /// Enable or disable hard line breaks.
  #[must_use]
  pub const fn hard_breaks(mut self, enabled: bool) -> Self {
    self.options.hard_breaks = enabled;
    self
  }

  /// Enable or disable syntax highlighting.
  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Set the syntax highlighting theme.
  #[must_use]
  pub fn highlight_theme<S: Into<String>>(mut self, theme: Option<S>) -> Self {
    self.options.highlight_theme = theme.map(Into::into);
    self
  }

  /// Set the code block languages treated as diagrams.
  #[must_use]
  pub fn diagram_languages<I, S>(mut self, languages: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.options.diagram_languages = languages.into_iter().map(Into::into).collect();
    self
  }

  /// Set the deepest heading level that gets an anchor.
  #[must_use]
  pub const fn max_heading_level(mut self, level: u8) -> Self {
    self.options.max_heading_level = level;
    self
  }

  /// Set the description length used for metadata.
  #[must_use]
  pub const fn description_length(mut self, length: usize) -> Self {
    self.options.description_length = length;
    self
  }

  /// Enable or disable the `**strong**` pre-pass.
  #[must_use]
  pub const fn normalize_strong_emphasis(mut self, enabled: bool) -> Self {
    self.options.normalize_strong_emphasis = enabled;
    self
  }

  /// Build the final `MarkdownOptions`.
  #[must_use]
  pub fn build(self) -> MarkdownOptions {
    self.options
  }
}
