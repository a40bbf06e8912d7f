//! Static share pages: one `index.html` per note with link-preview
//! metadata, plus the dashboard as the site index and not-found page.
pub mod template;

use std::{
  fs,
  path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rayon::prelude::*;
use sharepage_markdown::{
  DashboardLoader,
  FileRegistry,
  FsContentStore,
  MarkdownProcessor,
  utils::{normalize_name, strip_md_extension},
};

use self::template::Templates;
use crate::config::Config;

/// Outcome of publishing a batch of notes.
#[derive(Debug, Default)]
pub struct PublishReport {
  /// Pages written, in input order.
  pub written: Vec<PathBuf>,
  /// Notes that failed, with the reason.
  pub failed:  Vec<(String, String)>,
}

/// Renders notes and the dashboard into `output_dir`.
pub struct Publisher<'a> {
  config:    &'a Config,
  processor: MarkdownProcessor,
  store:     FsContentStore,
  templates: Templates,
}

impl<'a> Publisher<'a> {
  /// # Errors
  ///
  /// Returns an error if the page templates cannot be loaded.
  pub fn new(config: &'a Config) -> Result<Self> {
    Ok(Self {
      config,
      processor: config.processor(),
      store: config.store(),
      templates: Templates::load(config)?,
    })
  }

  /// Where the page of `name` is written.
  #[must_use]
  pub fn note_output_path(&self, name: &str) -> PathBuf {
    let name = normalize_name(name);
    let slug = strip_md_extension(&name).replace(' ', "_");
    self
      .config
      .output_dir
      .join(self.config.note_prefix.trim_matches('/'))
      .join(slug)
      .join("index.html")
  }

  /// Render and write the page of one note.
  ///
  /// # Errors
  ///
  /// Returns an error if the note cannot be loaded, rendered or written.
  pub fn publish_note(&self, name: &str) -> Result<PathBuf> {
    let doc = self
      .processor
      .load_document(&self.store, name)
      .with_context(|| format!("Failed to load note {name}"))?;
    let html = self.templates.render_note(self.config, &doc)?;

    let path = self.note_output_path(name);
    write_file(&path, &html)?;
    log::debug!("Published {name} to {}", path.display());
    Ok(path)
  }

  /// Publish every note in `names` in parallel. Failures are logged and
  /// collected; they never stop the rest of the batch.
  #[must_use]
  pub fn publish_notes(&self, names: &[String]) -> PublishReport {
    let results: Vec<(&String, Result<PathBuf>)> = names
      .par_iter()
      .map(|name| (name, self.publish_note(name)))
      .collect();

    let mut report = PublishReport::default();
    for (name, result) in results {
      match result {
        Ok(path) => report.written.push(path),
        Err(e) => {
          log::error!("Failed to publish {name}: {e:#}");
          report.failed.push((name.clone(), format!("{e:#}")));
        },
      }
    }
    report
  }

  /// Write the dashboard as `index.html` and `404.html`.
  ///
  /// # Errors
  ///
  /// Returns an error if a page cannot be rendered or written.
  pub fn publish_dashboard(
    &self,
    registry: Option<&FileRegistry>,
  ) -> Result<Vec<PathBuf>> {
    let sections = DashboardLoader::new(&self.store, self.processor.resolver())
      .with_registry(registry)
      .with_policy(self.config.auto_discovery.clone())
      .with_description_length(self.processor.options().description_length)
      .load(&self.config.dashboard);

    let mut written = Vec::with_capacity(2);
    for (file, not_found) in [("index.html", false), ("404.html", true)] {
      let html = self
        .templates
        .render_dashboard(self.config, &sections, not_found)?;
      let path = self.config.output_dir.join(file);
      write_file(&path, &html)?;
      written.push(path);
    }
    Ok(written)
  }

  /// Write the code highlighting stylesheet to `assets/highlight.css`.
  /// Returns `None` when highlighting is disabled.
  ///
  /// # Errors
  ///
  /// Returns an error if the theme is unknown or the file cannot be written.
  pub fn publish_stylesheet(&self) -> Result<Option<PathBuf>> {
    let Some(manager) = self.processor.syntax_manager() else {
      return Ok(None);
    };

    let css = manager.stylesheet(self.config.highlight_theme.as_deref())?;
    let path = self.config.output_dir.join("assets").join("highlight.css");
    write_file(&path, &css)?;
    Ok(Some(path))
  }
}

/// Names to publish when none are given: every registered note.
#[must_use]
pub fn registered_notes(registry: &FileRegistry) -> Vec<String> {
  registry
    .files()
    .iter()
    .map(|file| strip_md_extension(file).to_string())
    .collect()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| {
      format!("Failed to create directory: {}", parent.display())
    })?;
  }
  fs::write(path, content)
    .with_context(|| format!("Failed to write {}", path.display()))
}
