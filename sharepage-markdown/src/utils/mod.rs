pub mod codeblock;

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Slugify a string for use as an anchor ID.
///
/// Lower-cases and trims the text, turns each whitespace run into a single
/// hyphen, drops everything except ASCII word characters, hyphens and Hangul
/// syllables, then trims leading/trailing hyphens. Heading IDs and
/// `[[#heading]]` fragments both go through here, so they always agree.
#[must_use]
pub fn slugify(text: &str) -> String {
  let lowered = text.to_lowercase();
  let mut slug = String::with_capacity(lowered.len());
  let mut pending_hyphen = false;

  for c in lowered.trim().chars() {
    if c.is_whitespace() {
      pending_hyphen = true;
      continue;
    }
    if pending_hyphen {
      slug.push('-');
      pending_hyphen = false;
    }
    if is_slug_char(c) {
      slug.push(c);
    }
  }

  slug.trim_matches('-').to_string()
}

const fn is_slug_char(c: char) -> bool {
  c.is_ascii_alphanumeric()
    || c == '_'
    || c == '-'
    || matches!(c, '\u{AC00}'..='\u{D7A3}')
}

/// Capitalize the first letter of a string.
#[must_use]
pub fn capitalize_first(s: &str) -> String {
  let mut chars = s.chars();
  chars.next().map_or_else(String::new, |c| {
    c.to_uppercase().collect::<String>() + chars.as_str()
  })
}

/// Canonical form of a note name: NFC-normalized and trimmed.
///
/// File systems disagree on Unicode normalization (macOS hands out NFD), so
/// every lookup and comparison of note names goes through this.
#[must_use]
pub fn normalize_name(name: &str) -> String {
  name.trim().nfc().collect()
}

/// Strip a trailing `.md` extension, if any.
#[must_use]
pub fn strip_md_extension(name: &str) -> &str {
  name.strip_suffix(".md").unwrap_or(name)
}

/// Truncate to at most `max` characters, never splitting a code point.
#[must_use]
pub fn truncate_chars(text: &str, max: usize) -> String {
  match text.char_indices().nth(max) {
    Some((idx, _)) => text[..idx].to_string(),
    None => text.to_string(),
  }
}

/// Compile a regex that is known to be valid at build time.
///
/// On the off chance it is not, the failure is logged and a pattern that
/// never matches is used instead, so the caller degrades to a no-op.
pub(crate) fn compile_or_never(name: &str, pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    log::error!(
      "Failed to compile {name} regex: {e}\n Falling back to never matching \
       regex."
    );
    never_matching_regex()
  })
}

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile.
/// It will never match any input, which is safer than using a trivial regex
/// like `^$` which would match empty strings.
///
/// # Panics
///
/// Panics if the fallback regex pattern `r"^\b$"` fails to compile, which
/// should never happen.
#[must_use]
#[allow(clippy::unwrap_used, reason = "Constant pattern")]
pub fn never_matching_regex() -> Regex {
  // An empty character class; the pattern is constant and always compiles.
  Regex::new(r"[^\s\S]").unwrap_or_else(|_| {
    // As an ultimate fallback, a pattern that asserts something impossible
    Regex::new(r"^\b$").unwrap()
  })
}

static YOUTUBE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "YOUTUBE_ID_RE",
    r#"(?:youtube\.com/(?:[^/]+/.+/|(?:v|e(?:mbed)?)/|.*[?&]v=)|youtu\.be/)([^"&?/\s]{11})"#,
  )
});

/// Extract the 11-character video ID from any of the common YouTube URL
/// shapes (`watch?v=`, `youtu.be/`, `embed/`, `v/`).
#[must_use]
pub fn youtube_video_id(url: &str) -> Option<&str> {
  YOUTUBE_ID_RE
    .captures(url)
    .and_then(|caps| caps.get(1))
    .map(|m| m.as_str())
}

/// Canonical maximum-resolution thumbnail for a YouTube video.
#[must_use]
pub fn youtube_thumbnail_url(video_id: &str) -> String {
  format!("https://img.youtube.com/vi/{video_id}/maxresdefault.jpg")
}

static EMBED_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("EMBED_RE", r"!\[\[[^\]]*\]\]"));
static IMAGE_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("IMAGE_RE", r"!\[[^\]]*\]\([^)]*\)"));
static WIKI_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("WIKI_ALIAS_RE", r"\[\[[^\]|]*\|([^\]]*)\]\]")
});
static WIKI_PLAIN_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("WIKI_PLAIN_RE", r"\[\[([^\]]*)\]\]"));
static LINK_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("LINK_RE", r"\[([^\]]+)\]\([^)]+\)"));
static EMPHASIS_RES: LazyLock<[Regex; 6]> = LazyLock::new(|| {
  [
    compile_or_never("STRONG_STAR_RE", r"\*\*(.*?)\*\*"),
    compile_or_never("STRONG_UNDERSCORE_RE", r"__(.*?)__"),
    compile_or_never("STRIKE_RE", r"~~(.*?)~~"),
    compile_or_never("CODE_RE", r"`(.*?)`"),
    compile_or_never("EM_STAR_RE", r"\*(.*?)\*"),
    compile_or_never("EM_UNDERSCORE_RE", r"_(.*?)_"),
  ]
});
static CONTROL_CHARS_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("CONTROL_CHARS_RE", r"[#*`_~\[\]]"));
static WHITESPACE_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("WHITESPACE_RE", r"\s+"));

/// Reduce a line of Markdown to plain text for previews.
///
/// Images are dropped, wiki-links and links keep their visible text, and
/// emphasis/code markers plus any stray `#*`_~[]` go away. Whitespace runs
/// collapse to one space.
#[must_use]
pub fn clean_plain_text(text: &str) -> String {
  let text = EMBED_RE.replace_all(text, "");
  let text = IMAGE_RE.replace_all(&text, "");
  let text = WIKI_ALIAS_RE.replace_all(&text, "$1");
  let text = WIKI_PLAIN_RE.replace_all(&text, "$1");
  let mut text = LINK_RE.replace_all(&text, "$1").into_owned();

  for re in EMPHASIS_RES.iter() {
    text = re.replace_all(&text, "$1").into_owned();
  }

  let text = CONTROL_CHARS_RE.replace_all(&text, "");
  WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_slugify_basic() {
    assert_eq!(slugify("Getting Started"), "getting-started");
    assert_eq!(slugify("  Setup  "), "setup");
    assert_eq!(slugify("Hello, World!"), "hello-world");
  }

  #[test]
  fn test_slugify_keeps_hangul_and_underscores() {
    assert_eq!(slugify("설치 방법"), "설치-방법");
    assert_eq!(slugify("snake_case name"), "snake_case-name");
  }

  #[test]
  fn test_slugify_drops_other_scripts() {
    assert_eq!(slugify("Café au lait"), "caf-au-lait");
    assert_eq!(slugify("日本語"), "");
  }

  #[test]
  fn test_slugify_symbol_between_words() {
    assert_eq!(slugify("A & B"), "a--b");
    assert_eq!(slugify("--edge--"), "edge");
  }

  #[test]
  fn test_capitalize_first() {
    assert_eq!(capitalize_first("warning"), "Warning");
    assert_eq!(capitalize_first(""), "");
  }

  #[test]
  fn test_normalize_name_composes() {
    let decomposed = "Cafe\u{301}";
    assert_eq!(normalize_name(decomposed), "Caf\u{e9}");
  }

  #[test]
  fn test_truncate_chars_is_char_safe() {
    assert_eq!(truncate_chars("한국어 텍스트", 3), "한국어");
    assert_eq!(truncate_chars("short", 10), "short");
  }

  #[test]
  fn test_youtube_video_id_shapes() {
    for url in [
      "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
      "https://youtu.be/dQw4w9WgXcQ",
      "https://www.youtube.com/embed/dQw4w9WgXcQ",
      "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
    ] {
      assert_eq!(youtube_video_id(url), Some("dQw4w9WgXcQ"), "{url}");
    }
    assert_eq!(youtube_video_id("https://example.com/video.mp4"), None);
  }

  #[test]
  fn test_clean_plain_text() {
    assert_eq!(
      clean_plain_text("See [[Other Note|the other]] and **bold** `code`"),
      "See the other and bold code"
    );
    assert_eq!(clean_plain_text("[link](https://x.y) _it_"), "link it");
    assert_eq!(clean_plain_text("![[img.png]] ## Title   here"), "Title here");
  }

  #[test]
  fn test_never_matching_regex() {
    let re = never_matching_regex();
    assert!(!re.is_match(""));
    assert!(!re.is_match("anything"));
  }
}
