//! Frontmatter parsing and serialization.
//!
//! Only a small, line-oriented subset of YAML is understood:
//!
//! ```text
//! ---
//! title: "Quoted or bare scalar"
//! aliases: [one, two]
//! tags: rust, notes
//! links:
//!   - first
//!   - second
//! ---
//! ```
//!
//! Anything outside that subset is ignored rather than rejected, so a
//! document with a confusing header still renders.
use std::{collections::HashSet, fmt::Write as _, sync::LazyLock};

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::{codeblock::FenceTracker, compile_or_never};

const DELIMITER: &str = "---";
const TAGS_KEY: &str = "tags";

/// A frontmatter value: a scalar string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
  Scalar(String),
  List(Vec<String>),
}

impl FrontmatterValue {
  /// The scalar value, if this is one.
  #[must_use]
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::Scalar(s) => Some(s),
      Self::List(_) => None,
    }
  }

  /// The list items, if this is a list.
  #[must_use]
  pub fn as_list(&self) -> Option<&[String]> {
    match self {
      Self::Scalar(_) => None,
      Self::List(items) => Some(items),
    }
  }
}

/// A document split into its metadata and body.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frontmatter {
  /// Keys in declaration order. `tags` is always present as a list.
  pub data: IndexMap<String, FrontmatterValue>,
  /// The document with the frontmatter block removed.
  pub body: String,
}

impl Frontmatter {
  #[must_use]
  pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
    self.data.get(key)
  }

  /// A non-blank scalar value, trimmed.
  #[must_use]
  pub fn get_str(&self, key: &str) -> Option<&str> {
    self
      .data
      .get(key)
      .and_then(FrontmatterValue::as_str)
      .map(str::trim)
      .filter(|s| !s.is_empty())
  }

  /// The first of `keys` that has a non-blank scalar value.
  #[must_use]
  pub fn first_str(&self, keys: &[&str]) -> Option<&str> {
    keys.iter().find_map(|key| self.get_str(key))
  }

  /// Declared and inline tags.
  #[must_use]
  pub fn tags(&self) -> &[String] {
    self
      .data
      .get(TAGS_KEY)
      .and_then(FrontmatterValue::as_list)
      .unwrap_or_default()
  }
}

/// Split a raw document into frontmatter and body.
///
/// If the text does not start with a `---` line closed by a later `---`
/// line, the data holds only an empty `tags` list and the body is the input
/// verbatim. This never fails.
#[must_use]
pub fn parse_frontmatter(raw: &str) -> Frontmatter {
  let (mut data, body) = match split_block(raw) {
    Some((block, rest)) => (parse_block(block), skip_blank_lines(rest)),
    None => (IndexMap::new(), raw),
  };

  let mut tags = data
    .get(TAGS_KEY)
    .and_then(FrontmatterValue::as_list)
    .map(<[String]>::to_vec)
    .unwrap_or_default();
  tags.extend(extract_inline_tags(body));
  data.insert(TAGS_KEY.to_string(), FrontmatterValue::List(dedup(tags)));

  Frontmatter {
    data,
    body: body.to_string(),
  }
}

/// Write `data` back out as a frontmatter block, delimiters included.
///
/// Lists become block lists; scalars are quoted whenever reading them back
/// bare would change them.
#[must_use]
pub fn serialize_frontmatter(data: &IndexMap<String, FrontmatterValue>) -> String {
  let mut out = String::from("---\n");

  for (key, value) in data {
    match value {
      FrontmatterValue::Scalar(s) => {
        let _ = writeln!(out, "{key}: {}", quote_if_needed(s));
      },
      FrontmatterValue::List(items) if items.is_empty() => {
        let _ = writeln!(out, "{key}: []");
      },
      FrontmatterValue::List(items) => {
        let _ = writeln!(out, "{key}:");
        for item in items {
          let _ = writeln!(out, "  - {}", quote_if_needed(item));
        }
      },
    }
  }

  out.push_str("---\n");
  out
}

static INLINE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "INLINE_TAG_RE",
    r#"(?:^|\s)#([^\s!@#$%^&*(),.?":{}|<>]+)"#,
  )
});

/// Collect `#tag` tokens from a body, skipping fenced code.
///
/// Headings never match because the `#` of a heading is followed by a space
/// or another `#`.
#[must_use]
pub fn extract_inline_tags(body: &str) -> Vec<String> {
  let mut tracker = FenceTracker::new();
  let mut tags = Vec::new();

  for line in body.lines() {
    if tracker.advance(line) {
      continue;
    }
    tags.extend(
      INLINE_TAG_RE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()),
    );
  }

  dedup(tags)
}

fn split_block(raw: &str) -> Option<(&str, &str)> {
  let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
  let mut lines = raw.split_inclusive('\n');

  let first = lines.next()?;
  if first.trim_end() != DELIMITER {
    return None;
  }

  let mut offset = first.len();
  for line in lines {
    if line.trim_end() == DELIMITER {
      return Some((&raw[first.len()..offset], &raw[offset + line.len()..]));
    }
    offset += line.len();
  }

  log::debug!("Frontmatter delimiter is never closed, treating it as body");
  None
}

fn skip_blank_lines(mut text: &str) -> &str {
  while let Some(end) = text.find('\n') {
    if !text[..end].trim().is_empty() {
      break;
    }
    text = &text[end + 1..];
  }
  if text.trim().is_empty() { "" } else { text }
}

fn parse_block(block: &str) -> IndexMap<String, FrontmatterValue> {
  let mut data: IndexMap<String, FrontmatterValue> = IndexMap::new();
  let mut block_lists: HashSet<String> = HashSet::new();
  let mut open_key: Option<String> = None;

  for line in block.lines() {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
      continue;
    }

    if let Some(item) = list_item(trimmed) {
      match open_key.as_deref() {
        Some(key) => append_item(&mut data, key, item),
        None => log::debug!("Ignoring list item outside of a list: {trimmed}"),
      }
      continue;
    }

    open_key = None;
    let Some((key, value)) = trimmed.split_once(':') else {
      log::debug!("Ignoring frontmatter line without a key: {trimmed}");
      continue;
    };
    let key = key.trim();
    if key.is_empty() {
      continue;
    }
    let value = value.trim();

    if key == TAGS_KEY {
      let entry = data
        .entry(TAGS_KEY.to_string())
        .or_insert_with(|| FrontmatterValue::List(Vec::new()));
      if value.is_empty() {
        open_key = Some(key.to_string());
      } else if let FrontmatterValue::List(tags) = entry {
        let items = inline_list(value).unwrap_or_else(|| split_items(value));
        tags.extend(items.iter().filter_map(|t| clean_tag(t)));
      }
      continue;
    }

    let parsed = if value.is_empty() {
      open_key = Some(key.to_string());
      block_lists.insert(key.to_string());
      FrontmatterValue::List(Vec::new())
    } else if let Some(items) = inline_list(value) {
      block_lists.remove(key);
      FrontmatterValue::List(items)
    } else {
      block_lists.remove(key);
      FrontmatterValue::Scalar(unquote(value).to_string())
    };
    data.insert(key.to_string(), parsed);
  }

  // `key:` with nothing under it is an empty scalar, not an empty list.
  for key in block_lists {
    if let Some(value) = data.get_mut(&key)
      && value.as_list().is_some_and(<[String]>::is_empty)
    {
      *value = FrontmatterValue::Scalar(String::new());
    }
  }

  data
}

fn list_item(trimmed: &str) -> Option<&str> {
  if trimmed == "-" {
    return Some("");
  }
  trimmed
    .strip_prefix('-')
    .filter(|rest| rest.starts_with(char::is_whitespace))
    .map(str::trim)
}

fn append_item(
  data: &mut IndexMap<String, FrontmatterValue>,
  key: &str,
  item: &str,
) {
  let Some(FrontmatterValue::List(items)) = data.get_mut(key) else {
    return;
  };
  if key == TAGS_KEY {
    items.extend(clean_tag(item));
  } else {
    items.push(unquote(item).to_string());
  }
}

fn inline_list(value: &str) -> Option<Vec<String>> {
  value
    .strip_prefix('[')
    .and_then(|v| v.strip_suffix(']'))
    .map(split_items)
}

fn split_items(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(|item| unquote(item.trim()).to_string())
    .filter(|item| !item.is_empty())
    .collect()
}

fn clean_tag(tag: &str) -> Option<String> {
  let tag = unquote(tag.trim());
  let tag = tag.strip_prefix('#').unwrap_or(tag).trim();
  (!tag.is_empty()).then(|| tag.to_string())
}

fn unquote(value: &str) -> &str {
  for quote in ['"', '\''] {
    if value.len() >= 2
      && value.starts_with(quote)
      && value.ends_with(quote)
    {
      return &value[1..value.len() - 1];
    }
  }
  value
}

fn quote_if_needed(value: &str) -> String {
  let needs_quotes = value.is_empty()
    || value.trim() != value
    || value.starts_with(['"', '\'', '[', '-', '#'])
    || value.ends_with(['"', '\'']);
  if needs_quotes {
    format!("\"{value}\"")
  } else {
    value.to_string()
  }
}

fn dedup(items: Vec<String>) -> Vec<String> {
  let mut seen = HashSet::new();
  items
    .into_iter()
    .filter(|item| seen.insert(item.clone()))
    .collect()
}
