//! Core types and traits for syntax highlighting.

use std::collections::HashMap;

use super::error::{SyntaxError, SyntaxResult};

/// Trait for syntax highlighting backends.
///
/// Backends emit class-based markup; colors come from the stylesheet
/// returned by [`SyntaxHighlighter::stylesheet`], so one rendered page works
/// with any theme.
pub trait SyntaxHighlighter: Send + Sync {
  /// Get the name of this highlighter backend
  fn name(&self) -> &'static str;

  /// Get a list of supported languages
  fn supported_languages(&self) -> Vec<String>;

  /// Get a list of available themes
  fn available_themes(&self) -> Vec<String>;

  /// Check if a language is supported
  fn supports_language(&self, language: &str) -> bool {
    self
      .supported_languages()
      .iter()
      .any(|lang| lang.eq_ignore_ascii_case(language))
  }

  /// Check if a theme is available
  fn has_theme(&self, theme: &str) -> bool {
    self
      .available_themes()
      .iter()
      .any(|t| t.eq_ignore_ascii_case(theme))
  }

  /// Highlight code in the given language (case-insensitive), returning
  /// the inner HTML of the `<code>` element.
  fn highlight(&self, code: &str, language: &str) -> SyntaxResult<String>;

  /// Guess the language of a snippet with no usable fence tag.
  fn detect_language(&self, code: &str) -> Option<String>;

  /// CSS for the classes [`SyntaxHighlighter::highlight`] emits.
  fn stylesheet(&self, theme: &str) -> SyntaxResult<String>;

  /// Detect language from a file extension
  fn language_from_extension(&self, extension: &str) -> Option<String>;

  /// Detect language from a filename
  fn language_from_filename(&self, filename: &str) -> Option<String> {
    std::path::Path::new(filename)
      .extension()
      .and_then(|ext| ext.to_str())
      .and_then(|ext| self.language_from_extension(ext))
  }
}

/// Configuration for syntax highlighting
#[derive(Debug, Clone)]
pub struct SyntaxConfig {
  /// Theme used for [`SyntaxManager::stylesheet`] when none is given
  pub default_theme: String,

  /// Language aliases for mapping common names to supported languages
  pub language_aliases: HashMap<String, String>,

  /// Whether to fall back to plain text when nothing else matches
  pub fallback_to_plain: bool,
}

impl Default for SyntaxConfig {
  fn default() -> Self {
    let language_aliases = [
      ("js", "javascript"),
      ("ts", "typescript"),
      ("py", "python"),
      ("rb", "ruby"),
      ("sh", "bash"),
      ("shell", "bash"),
      ("zsh", "bash"),
      ("yml", "yaml"),
      ("md", "markdown"),
      ("kt", "kotlin"),
      ("golang", "go"),
      ("c++", "cpp"),
      ("dockerfile", "docker"),
    ]
    .into_iter()
    .map(|(alias, language)| (alias.to_string(), language.to_string()))
    .collect();

    Self {
      default_theme: "InspiredGitHub".to_string(),
      language_aliases,
      fallback_to_plain: true,
    }
  }
}

/// A highlighted code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
  /// Inner HTML for the `<code>` element.
  pub html:     String,
  /// The fence language, when it was recognized and used. `None` when the
  /// language was detected or the block fell back to plain text.
  pub language: Option<String>,
}

/// High-level syntax highlighting manager.
///
/// Manages a syntax highlighting backend and provides a convenient
/// interface for highlighting code with configuration options.
pub struct SyntaxManager {
  highlighter: Box<dyn SyntaxHighlighter>,
  config:      SyntaxConfig,
}

impl std::fmt::Debug for SyntaxManager {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SyntaxManager")
      .field("highlighter", &self.highlighter.name())
      .field("config", &self.config)
      .finish()
  }
}

impl SyntaxManager {
  /// Create a new syntax manager with the given highlighter and config
  #[must_use]
  pub fn new(
    highlighter: Box<dyn SyntaxHighlighter>,
    config: SyntaxConfig,
  ) -> Self {
    Self {
      highlighter,
      config,
    }
  }

  /// Create a new syntax manager with the default configuration
  #[must_use]
  pub fn with_highlighter(highlighter: Box<dyn SyntaxHighlighter>) -> Self {
    Self::new(highlighter, SyntaxConfig::default())
  }

  /// Get the underlying highlighter
  #[must_use]
  pub fn highlighter(&self) -> &dyn SyntaxHighlighter {
    self.highlighter.as_ref()
  }

  /// Get the configuration
  #[must_use]
  pub const fn config(&self) -> &SyntaxConfig {
    &self.config
  }

  /// Update the configuration
  pub fn set_config(&mut self, config: SyntaxConfig) {
    self.config = config;
  }

  /// Resolve a language name using aliases, then file names such as
  /// `main.rs`
  #[must_use]
  pub fn resolve_language(&self, language: &str) -> String {
    let lower = language.to_lowercase();
    if let Some(alias) = self.config.language_aliases.get(&lower) {
      return alias.clone();
    }
    if !self.highlighter.supports_language(&lower)
      && let Some(from_file) = self.highlighter.language_from_filename(&lower)
    {
      return from_file;
    }
    lower
  }

  /// Whether a fence language resolves to something the backend knows.
  #[must_use]
  pub fn is_known_language(&self, language: &str) -> bool {
    self
      .highlighter
      .supports_language(&self.resolve_language(language))
  }

  /// Highlight code with automatic language resolution and fallback.
  ///
  /// A recognized fence language is used as-is. Anything else goes
  /// through detection and then, if enabled, plain text.
  ///
  /// # Errors
  ///
  /// Returns an error if the backend fails, or if nothing matched and
  /// plain-text fallback is disabled.
  pub fn highlight_code(
    &self,
    code: &str,
    language: Option<&str>,
  ) -> SyntaxResult<Highlighted> {
    if let Some(language) = language.filter(|l| self.is_known_language(l)) {
      let resolved = self.resolve_language(language);
      return Ok(Highlighted {
        html:     self.highlighter.highlight(code, &resolved)?,
        language: Some(language.to_string()),
      });
    }

    let fallback = self.highlighter.detect_language(code).or_else(|| {
      self
        .config
        .fallback_to_plain
        .then(|| ["text", "plain text"])
        .and_then(|names| {
          names
            .into_iter()
            .find(|name| self.highlighter.supports_language(name))
            .map(str::to_string)
        })
    });

    match fallback {
      Some(detected) => Ok(Highlighted {
        html:     self.highlighter.highlight(code, &detected)?,
        language: None,
      }),
      None => Err(SyntaxError::UnsupportedLanguage(
        language.unwrap_or_default().to_string(),
      )),
    }
  }

  /// CSS for `theme`, or the configured default theme.
  ///
  /// # Errors
  ///
  /// Returns an error if the theme is unknown or cannot be converted.
  pub fn stylesheet(&self, theme: Option<&str>) -> SyntaxResult<String> {
    self
      .highlighter
      .stylesheet(theme.unwrap_or(&self.config.default_theme))
  }
}
