//! # sharepage-markdown
//!
//! The document pipeline behind SharePage: it turns Obsidian-flavored
//! Markdown notes into HTML fragments with preview metadata, and turns a
//! dashboard note into sections of note cards.
//!
//! ## Quick Start
//!
//! ```rust
//! use sharepage_markdown::{MarkdownOptions, MarkdownProcessor};
//!
//! let processor = MarkdownProcessor::new(MarkdownOptions::default());
//! let doc = processor.render_document(
//!   "Hello.md",
//!   "---\ntags: [demo]\n---\n# Hello\n\n> [!tip] Try it\n> Euler: $e^{i\\pi} + 1 = 0$",
//! );
//!
//! println!("HTML: {}", doc.html);
//! println!("Description: {}", doc.metadata.description);
//! println!("Headers: {:?}", doc.headers);
//! ```
//!
//! ## Features
//!
//! - **Frontmatter** parsing for the YAML subset notes actually use
//! - **Callouts** (`> [!note] Title`) with nesting and fold markers
//! - **Wiki-links and embeds** (`[[Note#Heading|alias]]`, `![[image.png]]`)
//! - **Math** protected from the Markdown renderer and typeset afterwards
//! - **Diagrams** with optional `width,height` size lines
//! - **Syntax highlighting** through syntect and two-face
//! - **Dashboards** built from `## ` sections of wiki-links, with
//!   auto-discovery of unlisted notes
//! - **Error recovery**: every stage degrades to its input instead of
//!   failing the document
//!
//! ## Collaborators
//!
//! Where notes come from ([`ContentStore`]), how names become URLs
//! ([`AssetResolver`]), how Markdown is rendered ([`MarkdownRenderer`]) and
//! how math is typeset ([`MathTypesetter`]) are all traits, with default
//! implementations that work out of the box.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sharepage_markdown::{
//!   MarkdownOptions,
//!   MarkdownProcessor,
//!   MemoryStore,
//!   PathConfig,
//!   PathResolver,
//! };
//!
//! let resolver = PathResolver::new(PathConfig {
//!   base_path: "/notes".to_string(),
//!   ..Default::default()
//! });
//! let processor = MarkdownProcessor::new(MarkdownOptions::default())
//!   .with_resolver(Arc::new(resolver));
//!
//! let store = MemoryStore::new().with("Index", "See [[Other Note]].");
//! let doc = processor.load_document(&store, "Index").expect("note exists");
//! assert!(doc.html.contains("/notes/posts/Other_Note"));
//! ```

pub mod dashboard;
pub mod error;
pub mod frontmatter;
pub mod metadata;
pub mod processor;
pub mod render;
pub mod resolver;
pub mod store;
pub mod syntax;
mod types;
pub mod utils;

pub use crate::{
  dashboard::{
    AutoDiscoveryPolicy,
    DashboardLoader,
    LinkEntry,
    LinkSection,
    extract_sectioned_links,
    filter_sections,
    load_sectioned_dashboard,
    remove_dashboard_link,
    upsert_dashboard_link,
  },
  error::{FetchError, FetchResult, MathError},
  frontmatter::{Frontmatter, FrontmatterValue, parse_frontmatter, serialize_frontmatter},
  metadata::{NoteKind, extract_metadata},
  processor::{
    MarkdownOptions,
    MarkdownOptionsBuilder,
    MarkdownProcessor,
    MarkupTypesetter,
    MathTypesetter,
    RenderContext,
  },
  render::{ComrakRenderer, MarkdownRenderer},
  resolver::{AssetResolver, PathConfig, PathResolver},
  store::{CachedStore, ContentStore, FileRegistry, FsContentStore, MemoryStore},
  types::{DashboardSection, Header, Metadata, NoteReference, RenderedDocument},
};
