//! Syntect-based syntax highlighting backend enhanced with two-face.
//!
//! Syntaxes come from two-face's extended set (Sublime Text grammars) and
//! output uses CSS classes, not inline colors. Themes from syntect's
//! defaults and from two-face can both be turned into a stylesheet.

use std::sync::OnceLock;

use syntect::{
  highlighting::{Theme, ThemeSet},
  html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style},
  parsing::{SyntaxReference, SyntaxSet},
  util::LinesWithEndings,
};
use two_face::theme::EmbeddedLazyThemeSet;

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager},
};

/// Class prefix keeps highlighter classes apart from page classes such as
/// `string` or `comment` a stylesheet might already use.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// Syntect-based syntax highlighter
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
  #[must_use]
  pub const fn new() -> Self {
    Self
  }

  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
  }

  fn theme_set() -> &'static EmbeddedLazyThemeSet {
    static THEME_SET: OnceLock<EmbeddedLazyThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(two_face::theme::extra)
  }

  fn default_theme_set() -> &'static ThemeSet {
    static DEFAULT_THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    DEFAULT_THEME_SET.get_or_init(ThemeSet::load_defaults)
  }

  /// Look a theme up by name, syntect's bundled themes first.
  fn find_theme(name: &str) -> Option<&'static Theme> {
    if let Some(theme) = Self::default_theme_set().themes.get(name) {
      return Some(theme);
    }

    EmbeddedLazyThemeSet::theme_names()
      .iter()
      .find(|embedded| embedded.as_name().eq_ignore_ascii_case(name))
      .map(|&embedded| Self::theme_set().get(embedded))
  }

  fn find_syntax(language: &str) -> &'static SyntaxReference {
    let syntax_set = Self::syntax_set();
    syntax_set
      .find_syntax_by_token(language)
      .unwrap_or_else(|| syntax_set.find_syntax_plain_text())
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supported_languages(&self) -> Vec<String> {
    Self::syntax_set()
      .syntaxes()
      .iter()
      .flat_map(|syntax| {
        std::iter::once(syntax.name.to_lowercase())
          .chain(syntax.file_extensions.iter().map(|ext| ext.to_lowercase()))
      })
      .collect()
  }

  fn supports_language(&self, language: &str) -> bool {
    Self::syntax_set().find_syntax_by_token(language).is_some()
  }

  fn available_themes(&self) -> Vec<String> {
    let mut themes: Vec<String> =
      Self::default_theme_set().themes.keys().cloned().collect();
    themes.extend(
      EmbeddedLazyThemeSet::theme_names()
        .iter()
        .map(|embedded| embedded.as_name().to_string()),
    );
    themes.sort();
    themes.dedup();
    themes
  }

  fn highlight(&self, code: &str, language: &str) -> SyntaxResult<String> {
    let syntax = Self::find_syntax(language);
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
      syntax,
      Self::syntax_set(),
      CLASS_STYLE,
    );

    for line in LinesWithEndings::from(code) {
      generator
        .parse_html_for_line_which_includes_newline(line)
        .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;
    }

    Ok(generator.finalize())
  }

  fn detect_language(&self, code: &str) -> Option<String> {
    let first_line = code.lines().find(|line| !line.trim().is_empty())?;
    Self::syntax_set()
      .find_syntax_by_first_line(first_line)
      .map(|syntax| syntax.name.to_lowercase())
  }

  fn stylesheet(&self, theme: &str) -> SyntaxResult<String> {
    let theme = Self::find_theme(theme)
      .ok_or_else(|| SyntaxError::ThemeNotFound(theme.to_string()))?;
    css_for_theme_with_class_style(theme, CLASS_STYLE)
      .map_err(|e| SyntaxError::StylesheetFailed(e.to_string()))
  }

  fn language_from_extension(&self, extension: &str) -> Option<String> {
    Self::syntax_set()
      .find_syntax_by_extension(extension)
      .map(|syntax| syntax.name.to_lowercase())
  }
}

/// Create a Syntect-based syntax manager with the default configuration
///
/// # Errors
///
/// Never fails today; the signature matches the other manager
/// constructors.
pub fn create_syntect_manager() -> SyntaxResult<SyntaxManager> {
  Ok(SyntaxManager::new(
    Box::new(SyntectHighlighter::new()),
    SyntaxConfig::default(),
  ))
}
