pub mod error;
pub mod templates;

use std::{
  fs,
  path::{Path, PathBuf},
  sync::Arc,
};

use serde::{Deserialize, Serialize};
use sharepage_markdown::{
  AutoDiscoveryPolicy,
  FileRegistry,
  FsContentStore,
  MarkdownOptions,
  MarkdownOptionsBuilder,
  MarkdownProcessor,
  PathConfig,
  PathResolver,
};

pub use self::error::ConfigError;
use crate::cli::{Cli, Commands};

/// File looked up in the working directory when no `--config-file` is given.
pub const DEFAULT_CONFIG_FILE: &str = "sharepage.toml";

fn default_notes_dir() -> PathBuf {
  PathBuf::from("notes")
}

fn default_dashboard() -> String {
  "_Dashboard".to_string()
}

fn default_note_prefix() -> String {
  "posts".to_string()
}

fn default_images_dir() -> String {
  "images".to_string()
}

fn default_output_dir() -> PathBuf {
  PathBuf::from("public")
}

fn default_site_title() -> String {
  "SharePage".to_string()
}

const fn default_true() -> bool {
  true
}

/// Configuration options for sharepage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// Directory containing the Markdown notes
  #[serde(default = "default_notes_dir")]
  pub notes_dir: PathBuf,

  /// Ordered note index. Discovered from `notes_dir` when unset.
  #[serde(default)]
  pub registry: Option<PathBuf>,

  /// Name of the dashboard note
  #[serde(default = "default_dashboard")]
  pub dashboard: String,

  #[serde(default)]
  pub base_path: String,

  /// Origin for absolute URLs, e.g. `https://notes.example.com`
  #[serde(default)]
  pub site_url: String,

  #[serde(default = "default_note_prefix")]
  pub note_prefix: String,

  #[serde(default = "default_images_dir")]
  pub images_dir: String,

  /// Whether to enable syntax highlighting for code blocks
  #[serde(default = "default_true")]
  pub highlight_code: bool,

  #[serde(default = "default_true")]
  pub hard_breaks: bool,

  /// Output directory for published pages
  #[serde(default = "default_output_dir")]
  pub output_dir: PathBuf,

  /// Path to template directory containing template overrides
  #[serde(default)]
  pub template_dir: Option<PathBuf>,

  #[serde(default = "default_site_title")]
  pub site_title: String,

  /// Theme for the code highlighting stylesheet
  #[serde(default)]
  pub highlight_theme: Option<String>,

  #[serde(default)]
  pub auto_discovery: AutoDiscoveryPolicy,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      notes_dir:       default_notes_dir(),
      registry:        None,
      dashboard:       default_dashboard(),
      base_path:       String::new(),
      site_url:        String::new(),
      note_prefix:     default_note_prefix(),
      images_dir:      default_images_dir(),
      highlight_code:  true,
      hard_breaks:     true,
      output_dir:      default_output_dir(),
      template_dir:    None,
      site_title:      default_site_title(),
      highlight_theme: None,
      auto_discovery:  AutoDiscoveryPolicy::default(),
    }
  }
}

impl Config {
  /// Load configuration from a file (TOML or JSON).
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be read or parsed, or if the format is
  /// unsupported.
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to read config file: {}: {e}",
        path.display()
      ))
    })?;

    match path.extension().and_then(|ext| ext.to_str()) {
      Some(ext) if ext.eq_ignore_ascii_case("toml") => {
        Ok(toml::from_str(&content)?)
      },
      Some(ext) if ext.eq_ignore_ascii_case("json") => {
        Ok(serde_json::from_str(&content)?)
      },
      Some(_) => {
        Err(ConfigError::Config(format!(
          "Unsupported config file format: {}",
          path.display()
        )))
      },
      None => {
        Err(ConfigError::Config(format!(
          "Config file has no extension: {}",
          path.display()
        )))
      },
    }
  }

  /// Load the configuration for a CLI invocation: the explicit
  /// `--config-file`, else `sharepage.toml` when present, else defaults.
  /// Command-line values are merged on top.
  ///
  /// # Errors
  ///
  /// Returns an error if a config file cannot be loaded.
  pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
    let mut config = if let Some(path) = &cli.config_file {
      Self::from_file(path)?
    } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
      log::debug!("Using discovered config file: {DEFAULT_CONFIG_FILE}");
      Self::from_file(DEFAULT_CONFIG_FILE)?
    } else {
      log::debug!("No config file found, using defaults");
      Self::default()
    };

    config.merge_with_cli(cli);
    Ok(config)
  }

  /// Merge CLI arguments into this config, prioritizing CLI values when
  /// present
  pub fn merge_with_cli(&mut self, cli: &Cli) {
    match &cli.command {
      Some(Commands::Publish {
        output: Some(output),
        ..
      }) => self.output_dir.clone_from(output),
      Some(Commands::Css { theme: Some(theme) }) => {
        self.highlight_theme = Some(theme.clone());
      },
      _ => {},
    }
  }

  /// Check that the notes directory exists.
  ///
  /// # Errors
  ///
  /// Returns an error naming the missing directory.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.notes_dir.is_dir() {
      Ok(())
    } else {
      Err(ConfigError::Config(format!(
        "Notes directory does not exist: {}",
        self.notes_dir.display()
      )))
    }
  }

  /// Where generated URLs point.
  #[must_use]
  pub fn path_config(&self) -> PathConfig {
    PathConfig {
      base_path:   self.base_path.clone(),
      notes_dir:   self
        .notes_dir
        .file_name()
        .map_or_else(|| "notes".to_string(), |n| n.to_string_lossy().into_owned()),
      images_dir:  self.images_dir.clone(),
      note_prefix: self.note_prefix.clone(),
      site_url:    self.site_url.clone(),
    }
  }

  #[must_use]
  pub fn markdown_options(&self) -> MarkdownOptions {
    MarkdownOptionsBuilder::new()
      .highlight_code(self.highlight_code)
      .hard_breaks(self.hard_breaks)
      .highlight_theme(self.highlight_theme.as_deref())
      .build()
  }

  #[must_use]
  pub fn resolver(&self) -> PathResolver {
    PathResolver::new(self.path_config())
  }

  /// A processor wired to this site's paths.
  #[must_use]
  pub fn processor(&self) -> MarkdownProcessor {
    MarkdownProcessor::new(self.markdown_options())
      .with_resolver(Arc::new(self.resolver()))
  }

  #[must_use]
  pub fn store(&self) -> FsContentStore {
    FsContentStore::new(&self.notes_dir)
  }

  /// Path the registry is read from and written to.
  #[must_use]
  pub fn registry_path(&self) -> PathBuf {
    self
      .registry
      .clone()
      .unwrap_or_else(|| self.notes_dir.join("file_index.json"))
  }

  /// The configured registry, or one discovered from the notes directory.
  #[must_use]
  pub fn registry(&self) -> Option<FileRegistry> {
    FileRegistry::load(&self.registry_path())
      .or_else(|| FileRegistry::discover(&self.notes_dir))
  }

  /// Write the default configuration file to `path`.
  ///
  /// # Errors
  ///
  /// Returns an error if the file cannot be written.
  pub fn generate_default_config(path: &Path) -> Result<(), ConfigError> {
    fs::write(path, templates::DEFAULT_TOML_TEMPLATE).map_err(|e| {
      ConfigError::Config(format!(
        "Failed to write default config to {}: {e}",
        path.display()
      ))
    })?;

    log::info!("Created default configuration file: {}", path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  #![allow(clippy::expect_used, reason = "Fine in tests")]
  use super::*;

  #[test]
  fn test_default_template_parses_to_defaults() {
    let parsed: Config =
      toml::from_str(templates::DEFAULT_TOML_TEMPLATE).expect("template parses");
    let expected = Config {
      site_url: "https://notes.example.com".to_string(),
      ..Config::default()
    };
    assert_eq!(parsed, expected);
  }

  #[test]
  fn test_missing_fields_use_defaults() {
    let config: Config = toml::from_str(
      "site_url = \"https://x.dev\"\n[auto_discovery]\nenabled = false\n",
    )
    .expect("partial config parses");

    assert_eq!(config.notes_dir, PathBuf::from("notes"));
    assert_eq!(config.dashboard, "_Dashboard");
    assert!(!config.auto_discovery.enabled);
    assert_eq!(config.auto_discovery.others_title, "Others");
  }

  #[test]
  fn test_from_file_by_extension() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let json = dir.path().join("site.json");
    fs::write(&json, r#"{"site_title": "From JSON"}"#).expect("write json");
    let config = Config::from_file(&json).expect("json config loads");
    assert_eq!(config.site_title, "From JSON");

    let yaml = dir.path().join("site.yaml");
    fs::write(&yaml, "site_title: nope").expect("write yaml");
    assert!(matches!(
      Config::from_file(&yaml),
      Err(ConfigError::Config(_))
    ));

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "site_title = [").expect("write toml");
    assert!(matches!(
      Config::from_file(&broken),
      Err(ConfigError::Toml(_))
    ));
  }

  #[test]
  fn test_cli_overrides_output_dir() {
    let cli = <Cli as clap::Parser>::parse_from([
      "sharepage",
      "publish",
      "--output",
      "dist",
    ]);
    let mut config = Config::default();
    config.merge_with_cli(&cli);
    assert_eq!(config.output_dir, PathBuf::from("dist"));
  }

  #[test]
  fn test_path_config_uses_notes_dir_name() {
    let config = Config {
      notes_dir: PathBuf::from("/srv/site/vault"),
      base_path: "/blog".to_string(),
      ..Config::default()
    };
    let paths = config.path_config();
    assert_eq!(paths.notes_dir, "vault");
    assert_eq!(paths.base_path, "/blog");
    assert_eq!(paths.note_prefix, "posts");
  }

  #[test]
  fn test_generate_default_config() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("sharepage.toml");

    Config::generate_default_config(&path).expect("config written");
    let loaded = Config::from_file(&path).expect("written config loads");
    assert_eq!(loaded.output_dir, PathBuf::from("public"));
  }
}
