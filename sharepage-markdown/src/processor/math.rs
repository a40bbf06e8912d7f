//! Math protection and restoration.
//!
//! comrak knows nothing about `$...$`, and left alone it would happily turn
//! `a_1 * b_2` into emphasis. Before rendering, every math span is swapped
//! for an opaque token that survives Markdown and HTML processing
//! untouched; after the HTML postprocessors have run, the tokens are
//! replaced with typeset output.
//!
//! The token map lives in a [`RenderContext`] that is created for each
//! document, so documents rendered in parallel can never see each other's
//! math.
use std::{
  hash::{BuildHasher, Hasher, RandomState},
  ops::Range,
  sync::{
    LazyLock,
    atomic::{AtomicU64, Ordering},
  },
};

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::{
  error::MathError,
  utils::{
    codeblock::{code_ranges, merge_ranges},
    compile_or_never,
  },
};

const TOKEN_OPEN: char = '\u{E000}';
const TOKEN_CLOSE: char = '\u{E001}';

static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "MATH_TOKEN_RE",
    r"\x{E000}MATH([0-9a-f]+)\.(\d+)\x{E001}",
  )
});

/// Link destinations, `<scheme:...>` autolinks and bare URLs. A `$` in
/// there is part of the address.
static LINK_TARGET_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "LINK_TARGET_RE",
    r"\]\([^)\n]*\)|<[A-Za-z][A-Za-z0-9+.\-]*:[^\s<>]*>|https?://[^\s<>()\[\]]+",
  )
});

/// An HTML start tag, attribute values included.
static HTML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "HTML_TAG_RE",
    r#"<[A-Za-z][^\s/>]*(?:[^>"']|"[^"]*"|'[^']*')*>"#,
  )
});

static NONCE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Seeds each context's tokens. Randomly keyed per call.
fn fresh_nonce() -> u64 {
  let mut hasher = RandomState::new().build_hasher();
  hasher.write_u64(NONCE_COUNTER.fetch_add(1, Ordering::Relaxed));
  hasher.finish()
}

/// One protected math expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathSpan {
  /// LaTeX source, trimmed.
  pub latex:        String,
  /// `$$...$$` rather than `$...$`.
  pub display_mode: bool,
}

/// Typesets LaTeX into HTML.
pub trait MathTypesetter: Send + Sync {
  /// # Errors
  ///
  /// Returns an error if the expression cannot be typeset. The caller
  /// falls back to the escaped source.
  fn typeset(&self, latex: &str, display_mode: bool) -> Result<String, MathError>;
}

/// Emits markup for client-side rendering with KaTeX's auto-render
/// extension: `\(...\)` for inline math and `\[...\]` for display math,
/// wrapped in a span that stylesheets can target.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkupTypesetter;

impl MathTypesetter for MarkupTypesetter {
  fn typeset(&self, latex: &str, display_mode: bool) -> Result<String, MathError> {
    let latex = latex.trim();
    if latex.is_empty() {
      return Err(MathError::Empty);
    }
    if !braces_balanced(latex) {
      return Err(MathError::UnbalancedBraces(latex.to_string()));
    }

    let escaped = html_escape::encode_text(latex);
    Ok(if display_mode {
      format!(r#"<span class="math math-display">\[{escaped}\]</span>"#)
    } else {
      format!(r#"<span class="math math-inline">\({escaped}\)</span>"#)
    })
  }
}

fn braces_balanced(latex: &str) -> bool {
  let mut depth = 0usize;
  let mut escaped = false;
  for c in latex.chars() {
    match c {
      _ if escaped => escaped = false,
      '\\' => escaped = true,
      '{' => depth += 1,
      '}' => {
        let Some(next) = depth.checked_sub(1) else {
          return false;
        };
        depth = next;
      },
      _ => {},
    }
  }
  depth == 0
}

/// Per-document state shared by every stage of one render call.
///
/// Tokens carry the context's nonce, so a note that happens to contain
/// token-shaped text can never pull in another span's rendering.
#[derive(Debug)]
pub struct RenderContext {
  nonce: u64,
  spans: Vec<MathSpan>,
}

impl Default for RenderContext {
  fn default() -> Self {
    Self {
      nonce: fresh_nonce(),
      spans: Vec::new(),
    }
  }
}

impl RenderContext {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of protected spans so far.
  #[must_use]
  pub fn len(&self) -> usize {
    self.spans.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.spans.is_empty()
  }

  /// The span a token index refers to.
  #[must_use]
  pub fn span(&self, index: usize) -> Option<&MathSpan> {
    self.spans.get(index)
  }

  fn push(&mut self, latex: &str, display_mode: bool) -> String {
    let index = self.spans.len();
    self.spans.push(MathSpan {
      latex: latex.trim().to_string(),
      display_mode,
    });
    format!("{TOKEN_OPEN}MATH{:x}.{index}{TOKEN_CLOSE}", self.nonce)
  }

  /// The span a matched token refers to, if this context minted it.
  fn lookup(&self, caps: &Captures) -> Option<&MathSpan> {
    let nonce = u64::from_str_radix(&caps[1], 16).ok()?;
    if nonce != self.nonce {
      return None;
    }
    caps[2].parse::<usize>().ok().and_then(|n| self.span(n))
  }

  /// Replace math spans in `text` with tokens, recording them in this
  /// context.
  ///
  /// Code (fenced blocks, inline spans and already-rendered `<pre>` /
  /// `<code>` elements) is skipped, and so are link destinations and
  /// URLs. A `$` preceded by a backslash never opens or closes a span.
  pub fn protect_math(&mut self, text: &str) -> String {
    let mut skip = code_ranges(text);
    skip.extend(LINK_TARGET_RE.find_iter(text).map(|m| m.range()));
    let skip = merge_ranges(skip);

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for range in &skip {
      self.protect_segment(&text[cursor..range.start], &mut out);
      out.push_str(&text[range.clone()]);
      cursor = range.end;
    }
    self.protect_segment(&text[cursor..], &mut out);
    out
  }

  fn protect_segment(&mut self, segment: &str, out: &mut String) {
    let bytes = segment.as_bytes();
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
      match bytes[i] {
        b'\\' if bytes.get(i + 1) == Some(&b'$') => i += 2,
        b'$' => {
          let Some((content, end, display)) = find_math(segment, i) else {
            i += 1;
            continue;
          };
          out.push_str(&segment[copied..i]);
          let token = self.push(&segment[content], display);
          out.push_str(&token);
          i = end;
          copied = end;
        },
        _ => i += 1,
      }
    }

    out.push_str(&segment[copied..]);
  }

  /// Replace every token in `html` with typeset math.
  ///
  /// Tokens inside a tag (an image's `alt`, a `title`) become the escaped
  /// LaTeX source, since markup cannot live in an attribute. Typesetting
  /// failures are logged and the escaped source is used instead. Tokens
  /// this context does not know are left in place.
  #[must_use]
  pub fn restore_math(&self, html: &str, typesetter: &dyn MathTypesetter) -> String {
    if self.spans.is_empty() {
      return html.to_string();
    }

    let html = HTML_TAG_RE.replace_all(html, |tag: &Captures| {
      TOKEN_RE
        .replace_all(&tag[0], |caps: &Captures| {
          self.lookup(caps).map_or_else(
            || caps[0].to_string(),
            |span| html_escape::encode_double_quoted_attribute(&span.latex).into_owned(),
          )
        })
        .into_owned()
    });

    TOKEN_RE
      .replace_all(&html, |caps: &Captures| {
        let Some(span) = self.lookup(caps) else {
          return caps[0].to_string();
        };
        typesetter
          .typeset(&span.latex, span.display_mode)
          .unwrap_or_else(|e| {
            log::warn!("Failed to typeset math '{}': {e}", span.latex);
            html_escape::encode_text(&span.latex).into_owned()
          })
      })
      .into_owned()
  }

  /// Replace tokens with their LaTeX source, for plain-text uses such as
  /// heading slugs.
  #[must_use]
  pub fn plain_text(&self, text: &str) -> String {
    if self.spans.is_empty() || !text.contains(TOKEN_OPEN) {
      return text.to_string();
    }

    TOKEN_RE
      .replace_all(text, |caps: &Captures| {
        self
          .lookup(caps)
          .map_or_else(|| caps[0].to_string(), |span| span.latex.clone())
      })
      .into_owned()
  }
}

/// Whether `text` still contains a math token.
#[must_use]
pub fn contains_math_token(text: &str) -> bool {
  TOKEN_RE.is_match(text)
}

/// Locate the math span opening at `start` (a `$`). Returns the content
/// range, the byte offset just past the closing delimiter, and whether it
/// is display math.
fn find_math(segment: &str, start: usize) -> Option<(Range<usize>, usize, bool)> {
  let rest = &segment[start..];

  if rest.starts_with("$$") {
    let content_start = start + 2;
    let close = segment[content_start..].find("$$")? + content_start;
    if segment[content_start..close].trim().is_empty() {
      return None;
    }
    return Some((content_start..close, close + 2, true));
  }

  let content_start = start + 1;
  let line_end = segment[content_start..]
    .find('\n')
    .map_or(segment.len(), |n| n + content_start);
  let close = segment[content_start..line_end].find('$')? + content_start;

  let content = &segment[content_start..close];
  if content.trim().is_empty() || content.ends_with('\\') {
    return None;
  }
  Some((content_start..close, close + 1, false))
}
