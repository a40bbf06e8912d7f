//! Markdown processing module with modular organization.
//!
//! # Architecture
//!
//! The processor module is organized into focused submodules:
//!
//! - [`core`]: Main processor implementation and processing pipeline
//! - [`process`]: Panic-safe stage wrappers and batch processing
//! - [`callout`]: Obsidian callout expansion
//! - [`extensions`]: The other dialect preprocessors (wiki-links, embeds,
//!   diagram aliases)
//! - [`math`]: Math protection and restoration
//! - [`postprocess`]: DOM passes over the rendered HTML
//! - [`types`]: Configuration and the processor struct
pub mod callout;
pub mod core;
pub mod extensions;
pub mod math;
pub mod postprocess;
pub mod process;
pub mod types;

pub use callout::{CalloutKind, expand_callouts};
pub use extensions::{
  WikiTarget,
  embed_youtube_links,
  find_wiki_links,
  normalize_mermaid_aliases,
  parse_wiki_target,
  rewrite_wiki_syntax,
};
pub use math::{MarkupTypesetter, MathSpan, MathTypesetter, RenderContext};
pub use process::{
  process_batch,
  process_safe,
  process_safe_with,
  process_with_recovery,
};
pub use types::{MarkdownOptions, MarkdownOptionsBuilder, MarkdownProcessor};
