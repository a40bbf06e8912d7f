//! Preview and SEO metadata for notes.
//!
//! Which strategy applies is decided by [`NoteKind::classify`] from the
//! note's `type` (or `source_type`) field. YouTube notes prefer the video's
//! own thumbnail; everything else uses the standard rules.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  frontmatter::Frontmatter,
  resolver::AssetResolver,
  types::Metadata,
  utils::{
    clean_plain_text,
    codeblock::{FenceTracker, strip_code},
    compile_or_never,
    strip_md_extension,
    truncate_chars,
    youtube_thumbnail_url,
    youtube_video_id,
  },
};

/// Default description length, in characters.
pub const DEFAULT_DESCRIPTION_LENGTH: usize = 150;

/// The closed set of note types with their own metadata strategy.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
  #[default]
  Standard,
  YouTube,
}

impl NoteKind {
  /// Map a `type` value onto a kind. Unknown types are standard notes.
  #[must_use]
  pub fn from_type(value: &str) -> Self {
    match value.trim().to_lowercase().as_str() {
      "youtube" => Self::YouTube,
      _ => Self::Standard,
    }
  }

  /// Classify a note from its `type` or `source_type` field.
  #[must_use]
  pub fn classify(frontmatter: &Frontmatter) -> Self {
    frontmatter
      .first_str(&["type", "source_type"])
      .map_or(Self::Standard, Self::from_type)
  }

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Standard => "standard",
      Self::YouTube => "youtube",
    }
  }

  /// Open Graph `og:type`.
  #[must_use]
  pub const fn og_type(self) -> &'static str {
    match self {
      Self::Standard => "website",
      Self::YouTube => "video.other",
    }
  }

  /// Dashboard section new notes of this kind are filed under.
  #[must_use]
  pub const fn section(self) -> &'static str {
    match self {
      Self::Standard => "Inbox",
      Self::YouTube => "YouTube",
    }
  }
}

/// Display title from a file name: `.md` dropped, underscores to spaces.
#[must_use]
pub fn title_from_file(name: &str) -> String {
  strip_md_extension(name.trim()).replace('_', " ").trim().to_string()
}

/// Frontmatter `title`, else [`title_from_file`].
#[must_use]
pub fn extract_title(name: &str, frontmatter: &Frontmatter) -> String {
  frontmatter
    .get_str("title")
    .map_or_else(|| title_from_file(name), str::to_string)
}

static HEADING_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("HEADING_RE", r"^#{1,6}\s+(.+)$"));

/// Plain-text description of at most `max_chars` characters.
///
/// Frontmatter `description`, `summary` or `excerpt` win. Otherwise the
/// first heading is used, then the first other non-blank line; fenced code
/// never counts. Empty when the note has no text at all.
#[must_use]
pub fn extract_description(frontmatter: &Frontmatter, max_chars: usize) -> String {
  let text = frontmatter
    .first_str(&["description", "summary", "excerpt"])
    .map(clean_plain_text)
    .filter(|text| !text.is_empty())
    .or_else(|| body_summary(&frontmatter.body))
    .unwrap_or_default();

  truncate_chars(&text, max_chars).trim_end().to_string()
}

fn body_summary(body: &str) -> Option<String> {
  let mut fence = FenceTracker::new();
  let mut first_heading = None;
  let mut first_line = None;

  for line in body.lines() {
    if fence.advance(line) {
      continue;
    }
    let line = line.trim();
    if line.is_empty() {
      continue;
    }

    if let Some(caps) = HEADING_RE.captures(line) {
      let text = clean_plain_text(&caps[1]);
      if !text.is_empty() {
        first_heading = Some(text);
        break;
      }
    } else if first_line.is_none() {
      let text = clean_plain_text(line);
      if !text.is_empty() {
        first_line = Some(text);
      }
    }
  }

  first_heading.or(first_line)
}

static EMBED_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("EMBED_IMAGE_RE", r"!\[\[([^\]|]+)(?:\|[^\]]*)?\]\]")
});

static MARKDOWN_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("MARKDOWN_IMAGE_RE", r"!\[[^\]]*\]\(\s*<?([^)\s>]+)")
});

/// Strip `![[...]]` / `[[...]]` wrapping and any `|alias`.
fn unwrap_wiki(value: &str) -> &str {
  let value = value.trim();
  let inner = value
    .strip_prefix('!')
    .unwrap_or(value)
    .strip_prefix("[[")
    .and_then(|v| v.strip_suffix("]]"))
    .unwrap_or(value);
  inner.split('|').next().unwrap_or(inner).trim()
}

fn resolve_image(target: &str, resolver: &dyn AssetResolver) -> String {
  if let Some(id) = youtube_video_id(target) {
    return youtube_thumbnail_url(id);
  }
  if target.starts_with('/') {
    return target.to_string();
  }
  resolver.asset_url(target)
}

/// The first image in `body` by position, `![[...]]` embeds and
/// `![alt](url)` links alike. Code is ignored.
fn first_body_image(body: &str) -> Option<String> {
  let text = strip_code(body);
  let embed = EMBED_IMAGE_RE.captures(&text).and_then(|c| c.get(1));
  let image = MARKDOWN_IMAGE_RE.captures(&text).and_then(|c| c.get(1));

  let earliest = match (embed, image) {
    (Some(e), Some(i)) => Some(if e.start() <= i.start() { e } else { i }),
    (e, i) => e.or(i),
  };
  earliest.map(|m| m.as_str().trim().to_string())
}

fn standard_thumbnail(
  frontmatter: &Frontmatter,
  resolver: &dyn AssetResolver,
) -> Option<String> {
  if let Some(thumbnail) = frontmatter.get_str("thumbnail") {
    let target = unwrap_wiki(thumbnail);
    if !target.is_empty() {
      return Some(resolve_image(target, resolver));
    }
  }

  first_body_image(&frontmatter.body).map(|target| resolve_image(&target, resolver))
}

fn youtube_thumbnail(
  frontmatter: &Frontmatter,
  resolver: &dyn AssetResolver,
) -> Option<String> {
  let id = ["thumbnail", "url"]
    .iter()
    .filter_map(|key| frontmatter.get_str(key))
    .find_map(youtube_video_id)
    .map(str::to_string)
    .or_else(|| youtube_video_id(&strip_code(&frontmatter.body)).map(str::to_string));

  match id {
    Some(id) => Some(youtube_thumbnail_url(&id)),
    None => standard_thumbnail(frontmatter, resolver),
  }
}

/// Preview image URL for a note of the given kind.
#[must_use]
pub fn extract_thumbnail(
  frontmatter: &Frontmatter,
  kind: NoteKind,
  resolver: &dyn AssetResolver,
) -> Option<String> {
  match kind {
    NoteKind::Standard => standard_thumbnail(frontmatter, resolver),
    NoteKind::YouTube => youtube_thumbnail(frontmatter, resolver),
  }
}

/// Everything a link preview needs for one note.
#[must_use]
pub fn extract_metadata(
  name: &str,
  frontmatter: &Frontmatter,
  resolver: &dyn AssetResolver,
  description_length: usize,
) -> Metadata {
  let kind = NoteKind::classify(frontmatter);

  Metadata {
    title: extract_title(name, frontmatter),
    description: extract_description(frontmatter, description_length),
    thumbnail: extract_thumbnail(frontmatter, kind, resolver),
    tags: frontmatter.tags().to_vec(),
    url: resolver.page_url(name),
    kind,
  }
}
