//! Mapping logical note and asset names to URLs.
use serde::{Deserialize, Serialize};

use crate::utils::{normalize_name, strip_md_extension};

/// Turns logical names into URLs. Implementations must be pure functions
/// of the name and their own configuration.
pub trait AssetResolver: Send + Sync {
  /// URL of an embedded file such as an image.
  fn asset_url(&self, name: &str) -> String;

  /// Site-relative path of a note's page.
  fn note_path(&self, name: &str) -> String;

  /// URL of a note's raw Markdown file.
  fn note_file_url(&self, name: &str) -> String;

  /// Absolute URL of a note's page, for canonical links.
  fn page_url(&self, name: &str) -> String;
}

fn default_notes_dir() -> String {
  "notes".to_string()
}

fn default_images_dir() -> String {
  "images".to_string()
}

fn default_note_prefix() -> String {
  "posts".to_string()
}

/// Where things live on the published site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
  /// Prefix for every generated path, e.g. `/my-site` when hosted in a
  /// sub-directory. Empty for the site root.
  #[serde(default)]
  pub base_path: String,

  /// Directory holding raw note files.
  #[serde(default = "default_notes_dir")]
  pub notes_dir: String,

  /// Directory holding embedded images.
  #[serde(default = "default_images_dir")]
  pub images_dir: String,

  /// Path segment note pages are published under.
  #[serde(default = "default_note_prefix")]
  pub note_prefix: String,

  /// Origin used for absolute page URLs, e.g. `https://notes.example.com`.
  #[serde(default)]
  pub site_url: String,
}

impl Default for PathConfig {
  fn default() -> Self {
    Self {
      base_path:   String::new(),
      notes_dir:   default_notes_dir(),
      images_dir:  default_images_dir(),
      note_prefix: default_note_prefix(),
      site_url:    String::new(),
    }
  }
}

/// The default [`AssetResolver`]: spaces become underscores and path
/// segments of assets are percent-encoded.
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
  config: PathConfig,
}

impl PathResolver {
  #[must_use]
  pub const fn new(config: PathConfig) -> Self {
    Self { config }
  }

  #[must_use]
  pub const fn config(&self) -> &PathConfig {
    &self.config
  }

  fn base(&self) -> &str {
    self.config.base_path.trim_end_matches('/')
  }
}

impl AssetResolver for PathResolver {
  fn asset_url(&self, name: &str) -> String {
    let name = name.trim();
    if is_external(name) {
      return name.to_string();
    }

    let name = normalize_name(name).replace(' ', "_");
    format!(
      "{}/{}/{}",
      self.base(),
      self.config.images_dir.trim_matches('/'),
      encode_segments(name.trim_start_matches('/'))
    )
  }

  fn note_path(&self, name: &str) -> String {
    let name = normalize_name(name);
    let slug = strip_md_extension(&name).replace(' ', "_");
    format!(
      "{}/{}/{slug}",
      self.base(),
      self.config.note_prefix.trim_matches('/')
    )
  }

  fn note_file_url(&self, name: &str) -> String {
    let name = normalize_name(name);
    let file = format!("{}.md", strip_md_extension(&name));
    format!(
      "{}/{}/{}",
      self.base(),
      self.config.notes_dir.trim_matches('/'),
      encode_segments(&file.replace(' ', "_"))
    )
  }

  fn page_url(&self, name: &str) -> String {
    format!(
      "{}{}",
      self.config.site_url.trim_end_matches('/'),
      self.note_path(name)
    )
  }
}

fn is_external(name: &str) -> bool {
  ["http://", "https://", "data:", "//"]
    .iter()
    .any(|scheme| name.starts_with(scheme))
}

fn encode_segments(path: &str) -> String {
  path
    .split('/')
    .map(|segment| urlencoding::encode(segment).into_owned())
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn resolver(base_path: &str) -> PathResolver {
    PathResolver::new(PathConfig {
      base_path: base_path.to_string(),
      site_url: "https://notes.example.com/".to_string(),
      ..PathConfig::default()
    })
  }

  #[test]
  fn test_note_path() {
    assert_eq!(resolver("").note_path("My Note"), "/posts/My_Note");
    assert_eq!(resolver("/site/").note_path("My Note.md"), "/site/posts/My_Note");
  }

  #[test]
  fn test_asset_url_encodes_segments() {
    assert_eq!(
      resolver("").asset_url("diagrams/my image.png"),
      "/images/diagrams/my_image.png"
    );
    assert_eq!(resolver("").asset_url("사진.png"), "/images/%EC%82%AC%EC%A7%84.png");
  }

  #[test]
  fn test_asset_url_passes_external_through() {
    let url = "https://cdn.example.com/a b.png";
    assert_eq!(resolver("/site").asset_url(url), url);
  }

  #[test]
  fn test_page_url() {
    assert_eq!(
      resolver("").page_url("Hello World"),
      "https://notes.example.com/posts/Hello_World"
    );
  }

  #[test]
  fn test_note_file_url() {
    assert_eq!(resolver("").note_file_url("A Note"), "/notes/A_Note.md");
  }

  #[test]
  fn test_path_config_defaults_from_empty_object() {
    let config: PathConfig = serde_json::from_str("{}").expect("defaults");
    assert_eq!(config, PathConfig::default());
  }
}
