use std::{fmt::Write, fs};

use anyhow::{Context, Result};
use sharepage_markdown::{DashboardSection, Header, RenderedDocument};
use tera::Tera;

use crate::config::Config;

// Template constants - these serve as fallbacks
const NOTE_TEMPLATE: &str = include_str!("../../templates/note.html");
const DASHBOARD_TEMPLATE: &str = include_str!("../../templates/dashboard.html");

/// Shown on the dashboard pages in place of a note description.
const DASHBOARD_DESCRIPTION: &str = "Shared notes";

/// Compiled page templates.
pub struct Templates {
  tera: Tera,
}

impl Templates {
  /// Compile the built-in templates, preferring same-named files from the
  /// configured template directory.
  ///
  /// # Errors
  ///
  /// Returns an error if an override cannot be read or a template does not
  /// compile.
  pub fn load(config: &Config) -> Result<Self> {
    let mut tera = Tera::default();
    tera.set_escape_fn(escape_html);
    for (name, fallback) in [
      ("note.html", NOTE_TEMPLATE),
      ("dashboard.html", DASHBOARD_TEMPLATE),
    ] {
      let content = get_template_content(config, name, fallback)?;
      tera
        .add_raw_template(name, &content)
        .with_context(|| format!("Failed to compile template {name}"))?;
    }
    Ok(Self { tera })
  }

  /// Render the standalone page of one note.
  ///
  /// # Errors
  ///
  /// Returns an error if the template fails to render.
  pub fn render_note(
    &self,
    config: &Config,
    doc: &RenderedDocument,
  ) -> Result<String> {
    let metadata = &doc.metadata;

    let mut context = tera::Context::new();
    context.insert("title", &metadata.title);
    context.insert("description", &metadata.description);
    context.insert("page_url", &metadata.url);
    context.insert("og_image", &og_image(config, metadata.thumbnail.as_deref()));
    context.insert("og_type", metadata.og_type());
    context.insert("kind", &metadata.kind);
    context.insert("site_title", &config.site_title);
    context.insert("base_path", config.base_path.trim_end_matches('/'));
    context.insert("content", &doc.html);
    context.insert("tags", &doc.tags);
    context.insert("toc", &generate_toc(&doc.headers));

    Ok(self.tera.render("note.html", &context)?)
  }

  /// Render the dashboard, either as the site index or as the not-found
  /// page.
  ///
  /// # Errors
  ///
  /// Returns an error if the template fails to render.
  pub fn render_dashboard(
    &self,
    config: &Config,
    sections: &[DashboardSection],
    not_found: bool,
  ) -> Result<String> {
    let base_path = config.base_path.trim_end_matches('/');

    let mut context = tera::Context::new();
    context.insert("site_title", &config.site_title);
    context.insert("description", DASHBOARD_DESCRIPTION);
    context.insert(
      "page_url",
      &format!("{}{base_path}/", config.site_url.trim_end_matches('/')),
    );
    context.insert("og_image", &og_image(config, None));
    context.insert("base_path", base_path);
    context.insert("sections", sections);
    context.insert("not_found", &not_found);

    Ok(self.tera.render("dashboard.html", &context)?)
  }
}

/// Escapes for text and double-quoted attributes. Tera's default also
/// escapes `/`, which mangles every URL in the page head.
fn escape_html(input: &str) -> String {
  html_escape::encode_double_quoted_attribute(input).into_owned()
}

fn get_template_content(
  config: &Config,
  template_name: &str,
  fallback: &str,
) -> Result<String> {
  if let Some(template_dir) = &config.template_dir {
    let template_path = template_dir.join(template_name);
    if template_path.exists() {
      log::debug!("Using custom template: {}", template_path.display());
      return fs::read_to_string(&template_path).with_context(|| {
        format!(
          "Failed to read custom template file: {}. Check file permissions \
           and ensure the file is valid UTF-8",
          template_path.display()
        )
      });
    }
  }

  Ok(fallback.to_string())
}

/// Absolute URL for `og:image`. Link previews need an absolute URL, so
/// site-relative thumbnails are prefixed with the site URL and notes
/// without one fall back to the site logo.
#[must_use]
pub fn og_image(config: &Config, thumbnail: Option<&str>) -> String {
  let site_url = config.site_url.trim_end_matches('/');
  match thumbnail.map(str::trim).filter(|t| !t.is_empty()) {
    Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
      url.to_string()
    },
    Some(path) => format!("{site_url}/{}", path.trim_start_matches('/')),
    None => format!("{site_url}/images/logo.png"),
  }
}

/// Nested list of links to the `h1`-`h3` headings.
fn generate_toc(headers: &[Header]) -> String {
  let mut toc = String::new();
  let mut current_level = 0;

  for header in headers.iter().filter(|h| h.level <= 3) {
    // Adjust TOC nesting
    while current_level < header.level {
      toc.push_str("<ul>");
      current_level += 1;
    }
    while current_level > header.level {
      toc.push_str("</ul>");
      current_level -= 1;
    }

    let _ = write!(
      toc,
      "<li><a href=\"#{}\">{}</a></li>",
      html_escape::encode_double_quoted_attribute(&header.id),
      html_escape::encode_text(&header.text)
    );
  }

  while current_level > 0 {
    toc.push_str("</ul>");
    current_level -= 1;
  }

  toc
}
