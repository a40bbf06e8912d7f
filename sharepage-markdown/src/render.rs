//! The CommonMark rendering step.
use comrak::{Arena, options::Options, parse_document};

/// Turns preprocessed Markdown into an HTML fragment.
///
/// Implementations must pass raw HTML through (callouts, wiki-links and
/// embeds arrive as inline HTML) and must not generate heading IDs of
/// their own.
pub trait MarkdownRenderer: Send + Sync {
  fn render(&self, markdown: &str) -> String;
}

/// [`MarkdownRenderer`] backed by comrak.
#[derive(Debug, Clone, Copy)]
pub struct ComrakRenderer {
  /// Tables, footnotes, strikethrough, task lists, superscript and
  /// autolinks.
  pub gfm:         bool,
  /// Treat soft line breaks as `<br>`, matching how notes read in the
  /// editor.
  pub hard_breaks: bool,
}

impl Default for ComrakRenderer {
  fn default() -> Self {
    Self {
      gfm:         true,
      hard_breaks: true,
    }
  }
}

impl ComrakRenderer {
  #[must_use]
  pub const fn new(gfm: bool, hard_breaks: bool) -> Self {
    Self { gfm, hard_breaks }
  }

  fn comrak_options(&self) -> Options<'static> {
    let mut options = Options::default();
    if self.gfm {
      options.extension.table = true;
      options.extension.footnotes = true;
      options.extension.strikethrough = true;
      options.extension.tasklist = true;
      options.extension.superscript = true;
      options.extension.autolink = true;
    }
    options.render.r#unsafe = true;
    options.render.hardbreaks = self.hard_breaks;
    // Heading IDs are assigned by the HTML postprocessor
    options.extension.header_ids = None;
    options
  }
}

impl MarkdownRenderer for ComrakRenderer {
  fn render(&self, markdown: &str) -> String {
    let arena = Arena::new();
    let options = self.comrak_options();
    let root = parse_document(&arena, markdown, &options);

    let mut html = String::new();
    if let Err(e) = comrak::format_html(root, &options, &mut html) {
      log::error!("Failed to format HTML: {e}");
    }
    html
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_raw_html_passes_through() {
    let html = ComrakRenderer::default().render("<div class=\"x\">hi</div>\n");
    assert!(html.contains("<div class=\"x\">hi</div>"));
  }

  #[test]
  fn test_hard_breaks() {
    let html = ComrakRenderer::default().render("a\nb");
    assert!(html.contains("<br"));
    let soft = ComrakRenderer::new(true, false).render("a\nb");
    assert!(!soft.contains("<br"));
  }

  #[test]
  fn test_no_heading_ids() {
    let html = ComrakRenderer::default().render("## Setup");
    assert!(html.contains("<h2>Setup</h2>"));
  }

  #[test]
  fn test_gfm_tables() {
    let html = ComrakRenderer::default().render("| a | b |\n|---|---|\n| 1 | 2 |\n");
    assert!(html.contains("<table>"));
  }
}
