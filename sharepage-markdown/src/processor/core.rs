//! Core implementation of the Markdown processor.
//!
//! This module contains the main implementation of `MarkdownProcessor`: the
//! ordered pipeline from raw note text to a [`RenderedDocument`], and the
//! collaborator wiring.
use std::sync::Arc;

use log::{trace, warn};

use super::{
  callout::expand_callouts,
  extensions::{
    embed_youtube_links,
    normalize_mermaid_aliases,
    normalize_strong_emphasis,
    rewrite_wiki_syntax,
  },
  math::{MarkupTypesetter, MathTypesetter, RenderContext},
  postprocess::{
    assign_heading_ids,
    extract_diagrams,
    highlight_code_blocks,
    rewrite_text_links,
    with_document,
  },
  process::{process_safe, process_safe_with},
  types::{MarkdownOptions, MarkdownProcessor},
};
use crate::{
  error::FetchResult,
  frontmatter::parse_frontmatter,
  metadata::{extract_metadata, title_from_file},
  render::{ComrakRenderer, MarkdownRenderer},
  resolver::{AssetResolver, PathResolver},
  store::ContentStore,
  syntax::{SyntaxManager, create_default_manager},
  types::{Header, RenderedDocument},
};

impl MarkdownProcessor {
  /// Create a new `MarkdownProcessor` with the given options and the
  /// default collaborators.
  #[must_use]
  pub fn new(options: MarkdownOptions) -> Self {
    let syntax_manager = if options.highlight_code {
      create_default_manager()
        .map_err(|e| warn!("Syntax highlighting disabled: {e}"))
        .ok()
        .map(|mut manager| {
          if let Some(theme) = &options.highlight_theme {
            let mut config = manager.config().clone();
            config.default_theme.clone_from(theme);
            manager.set_config(config);
          }
          Arc::new(manager)
        })
    } else {
      None
    };
    let renderer = ComrakRenderer::new(options.gfm, options.hard_breaks);

    Self {
      options,
      syntax_manager,
      resolver: Arc::new(PathResolver::default()),
      typesetter: Arc::new(MarkupTypesetter),
      renderer: Arc::new(renderer),
    }
  }

  /// Use a different asset resolver.
  #[must_use]
  pub fn with_resolver(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
    self.resolver = resolver;
    self
  }

  /// Use a different math typesetter.
  #[must_use]
  pub fn with_typesetter(mut self, typesetter: Arc<dyn MathTypesetter>) -> Self {
    self.typesetter = typesetter;
    self
  }

  /// Use a different Markdown renderer.
  #[must_use]
  pub fn with_renderer(mut self, renderer: Arc<dyn MarkdownRenderer>) -> Self {
    self.renderer = renderer;
    self
  }

  /// Replace the syntax manager, or pass `None` to turn highlighting off.
  #[must_use]
  pub fn with_syntax_manager(mut self, manager: Option<SyntaxManager>) -> Self {
    self.syntax_manager = manager.map(Arc::new);
    self
  }

  /// Access processor options.
  #[must_use]
  pub const fn options(&self) -> &MarkdownOptions {
    &self.options
  }

  #[must_use]
  pub fn resolver(&self) -> &dyn AssetResolver {
    self.resolver.as_ref()
  }

  #[must_use]
  pub fn syntax_manager(&self) -> Option<&SyntaxManager> {
    self.syntax_manager.as_deref()
  }

  /// Fetch a note from `store` and render it.
  ///
  /// # Errors
  ///
  /// Returns the store's [`FetchError`](crate::error::FetchError) when the
  /// note cannot be loaded. Rendering itself never fails.
  pub fn load_document(
    &self,
    store: &dyn ContentStore,
    name: &str,
  ) -> FetchResult<RenderedDocument> {
    let raw = store.fetch(name)?;
    Ok(self.render_document(name, &raw))
  }

  /// Run the full pipeline over one note: frontmatter, preprocessing,
  /// rendering, HTML postprocessing and metadata extraction.
  #[must_use]
  pub fn render_document(&self, name: &str, raw: &str) -> RenderedDocument {
    trace!("Rendering document '{name}'");
    let frontmatter = parse_frontmatter(raw);
    let (html, headers) = self.render_html(&frontmatter.body);
    let metadata = extract_metadata(
      name,
      &frontmatter,
      self.resolver.as_ref(),
      self.options.description_length,
    );

    RenderedDocument {
      html,
      tags: frontmatter.tags().to_vec(),
      title: title_from_file(name),
      metadata,
      headers,
    }
  }

  /// Render a Markdown body (no frontmatter) to final HTML.
  ///
  /// Each call gets its own [`RenderContext`].
  #[must_use]
  pub fn render_html(&self, markdown: &str) -> (String, Vec<Header>) {
    let mut ctx = RenderContext::new();
    let markdown = process_safe(markdown, normalize_mermaid_aliases, markdown);
    let html = self.render_markdown(&markdown, &mut ctx);
    self.postprocess(&html, &ctx)
  }

  /// Apply the dialect preprocessors in order, protecting math into `ctx`.
  ///
  /// Callout bodies are run through [`MarkdownProcessor::render_markdown`]
  /// with the same context, so their math is restored along with the rest
  /// of the document.
  #[must_use]
  pub fn preprocess(&self, markdown: &str, ctx: &mut RenderContext) -> String {
    let text = process_safe(
      markdown,
      |text| expand_callouts(text, |body| self.render_markdown(body, ctx)),
      markdown,
    );
    trace!("Callouts expanded");

    let text = process_safe(
      &text,
      |text| rewrite_wiki_syntax(text, self.resolver.as_ref()),
      &text,
    );
    let text = process_safe(&text, embed_youtube_links, &text);
    let text = process_safe(&text, |text| ctx.protect_math(text), &text);
    trace!("Protected {} math spans", ctx.len());

    if self.options.normalize_strong_emphasis {
      process_safe(&text, normalize_strong_emphasis, &text)
    } else {
      text
    }
  }

  /// Preprocess and hand to the renderer, without postprocessing.
  fn render_markdown(&self, markdown: &str, ctx: &mut RenderContext) -> String {
    let text = self.preprocess(markdown, ctx);
    process_safe(&text, |text| self.renderer.render(text), &text)
  }

  fn postprocess(&self, html: &str, ctx: &RenderContext) -> (String, Vec<Header>) {
    let highlighter = self
      .syntax_manager
      .as_deref()
      .filter(|_| self.options.highlight_code);

    let (html, headers) = process_safe_with(
      "HTML postprocessing",
      || {
        with_document(html, |document| {
          let diagrams = extract_diagrams(document, &self.options.diagram_languages);
          let headers = assign_heading_ids(document, self.options.max_heading_level, ctx);
          let highlighted = highlighter.map_or(0, |m| highlight_code_blocks(document, m));
          trace!(
            "Postprocessed {diagrams} diagrams, {} headings, {highlighted} code blocks",
            headers.len()
          );
          headers
        })
      },
      || (html.to_string(), Vec::new()),
    );

    let html = process_safe(
      &html,
      |html| ctx.restore_math(html, self.typesetter.as_ref()),
      &html,
    );

    let html = process_safe(
      &html,
      |html| with_document(html, |document| rewrite_text_links(document, self.resolver.as_ref())).0,
      &html,
    );

    (html, headers)
  }
}
