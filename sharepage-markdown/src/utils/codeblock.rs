//! Code-aware scanning helpers.
//!
//! Every dialect preprocessor has to leave code alone, so the fence state
//! machine and the inline code span scanner live here and are shared.
//! Already-rendered `<pre>` and `<code>` elements count as code too: callout
//! bodies reach the later passes as HTML.
use std::{ops::Range, sync::LazyLock};

use regex::Regex;

use super::compile_or_never;

static HTML_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "HTML_CODE_RE",
    r"(?is)<pre\b[^>]*>.*?</pre>|<code\b[^>]*>.*?</code>",
  )
});

/// State tracking for code fence detection in markdown.
///
/// This tracks whether we're currently inside a fenced code block and
/// maintains the fence character and count for proper closing detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceTracker {
  in_code_block:    bool,
  code_fence_char:  Option<char>,
  code_fence_count: usize,
}

impl FenceTracker {
  /// Create a new fence tracker.
  #[must_use]
  pub const fn new() -> Self {
    Self {
      in_code_block:    false,
      code_fence_char:  None,
      code_fence_count: 0,
    }
  }

  /// Check if currently inside a code block.
  #[must_use]
  pub const fn in_code_block(&self) -> bool {
    self.in_code_block
  }

  /// Process a line and return the state after it.
  ///
  /// Lines inside blockquotes (`> ```rust`) open and close fences too, since
  /// callout bodies carry their own code blocks.
  #[must_use]
  pub fn process_line(&self, line: &str) -> Self {
    let trimmed = strip_quote_markers(line.trim_start());

    let Some(fence_char) = trimmed.chars().next() else {
      return *self;
    };
    if fence_char != '`' && fence_char != '~' {
      return *self;
    }

    let fence_count = trimmed.chars().take_while(|&c| c == fence_char).count();
    if fence_count < 3 {
      return *self;
    }

    if !self.in_code_block {
      // An info string may not contain backticks for backtick fences
      let info = &trimmed[fence_count..];
      if fence_char == '`' && info.contains('`') {
        return *self;
      }
      return Self {
        in_code_block:    true,
        code_fence_char:  Some(fence_char),
        code_fence_count: fence_count,
      };
    }

    let closes = self.code_fence_char == Some(fence_char)
      && fence_count >= self.code_fence_count
      && trimmed[fence_count..].trim().is_empty();
    if closes { Self::new() } else { *self }
  }

  /// Returns `true` when `line` belongs to a fenced block, delimiters
  /// included, and advances the tracker past it.
  pub fn advance(&mut self, line: &str) -> bool {
    let next = self.process_line(line);
    let is_code = self.in_code_block || next.in_code_block;
    *self = next;
    is_code
  }
}

fn strip_quote_markers(mut line: &str) -> &str {
  while let Some(rest) = line.strip_prefix('>') {
    line = rest.trim_start();
  }
  line
}

/// Byte ranges of every fenced code block in `text`, delimiter lines
/// included. An unterminated fence runs to the end of the input.
#[must_use]
pub fn fenced_ranges(text: &str) -> Vec<Range<usize>> {
  let mut ranges: Vec<Range<usize>> = Vec::new();
  let mut tracker = FenceTracker::new();
  let mut offset = 0;

  for line in text.split_inclusive('\n') {
    let start = offset;
    offset += line.len();
    if !tracker.advance(line) {
      continue;
    }
    match ranges.last_mut() {
      Some(last) if last.end == start => last.end = offset,
      _ => ranges.push(start..offset),
    }
  }

  ranges
}

/// Byte ranges of `<pre>` and `<code>` elements outside fenced blocks.
#[must_use]
pub fn html_code_ranges(text: &str) -> Vec<Range<usize>> {
  let fences = fenced_ranges(text);
  HTML_CODE_RE
    .find_iter(text)
    .map(|m| m.range())
    .filter(|m| !fences.iter().any(|f| f.contains(&m.start)))
    .collect()
}

/// Fenced blocks and HTML code elements, merged.
fn block_ranges(text: &str) -> Vec<Range<usize>> {
  let mut ranges = fenced_ranges(text);
  ranges.extend(html_code_ranges(text));
  merge_ranges(ranges)
}

/// Byte ranges of inline code spans outside fenced blocks and HTML code.
///
/// A span opens with a run of N backticks and closes at the next run of
/// exactly N backticks within the same paragraph. Unmatched runs are
/// literal text.
#[must_use]
pub fn inline_code_ranges(text: &str) -> Vec<Range<usize>> {
  let blocks = block_ranges(text);
  let bytes = text.as_bytes();
  let mut ranges = Vec::new();
  let mut i = 0;

  while i < bytes.len() {
    if let Some(block) = blocks.iter().find(|r| r.contains(&i)) {
      i = block.end;
      continue;
    }
    if bytes[i] != b'`' {
      i += 1;
      continue;
    }

    let run = count_backticks(bytes, i);
    let open_end = i + run;
    match find_closing_run(text, open_end, run) {
      Some(close_end) => {
        ranges.push(i..close_end);
        i = close_end;
      },
      None => i = open_end,
    }
  }

  ranges
}

/// Fenced blocks, HTML code elements and inline code spans merged into one
/// sorted list.
#[must_use]
pub fn code_ranges(text: &str) -> Vec<Range<usize>> {
  let mut ranges = block_ranges(text);
  ranges.extend(inline_code_ranges(text));
  merge_ranges(ranges)
}

/// Sort and coalesce overlapping ranges.
#[must_use]
pub fn merge_ranges(mut ranges: Vec<Range<usize>>) -> Vec<Range<usize>> {
  ranges.sort_by_key(|r| r.start);
  let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
  for range in ranges {
    match merged.last_mut() {
      Some(last) if range.start <= last.end => {
        last.end = last.end.max(range.end);
      },
      _ => merged.push(range),
    }
  }
  merged
}

/// Apply `transform` to every stretch of `text` outside `skip`, copying the
/// skipped ranges through untouched. `skip` must be sorted and disjoint.
pub fn map_outside<F>(text: &str, skip: &[Range<usize>], mut transform: F) -> String
where
  F: FnMut(&str) -> String,
{
  let mut out = String::with_capacity(text.len());
  let mut cursor = 0;

  for range in skip {
    if range.start > cursor {
      out.push_str(&transform(&text[cursor..range.start]));
    }
    out.push_str(&text[range.start..range.end]);
    cursor = range.end;
  }
  if cursor < text.len() {
    out.push_str(&transform(&text[cursor..]));
  }

  out
}

/// Apply `transform` outside every range [`code_ranges`] reports.
pub fn map_outside_code<F>(text: &str, transform: F) -> String
where
  F: FnMut(&str) -> String,
{
  map_outside(text, &code_ranges(text), transform)
}

/// Replace every range [`code_ranges`] reports with a single space.
#[must_use]
pub fn strip_code(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut cursor = 0;
  for range in code_ranges(text) {
    out.push_str(&text[cursor..range.start]);
    out.push(' ');
    cursor = range.end;
  }
  out.push_str(&text[cursor..]);
  out
}

fn count_backticks(bytes: &[u8], start: usize) -> usize {
  bytes[start..].iter().take_while(|&&b| b == b'`').count()
}

fn find_closing_run(text: &str, from: usize, run: usize) -> Option<usize> {
  let bytes = text.as_bytes();
  let mut j = from;
  while j < bytes.len() {
    match bytes[j] {
      b'`' => {
        let len = count_backticks(bytes, j);
        if len == run {
          return Some(j + len);
        }
        j += len;
      },
      b'\n' if text[j + 1..].trim_start_matches([' ', '\t']).starts_with('\n') => {
        return None;
      },
      _ => j += 1,
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fence_tracker_basic() {
    let tracker = FenceTracker::new();
    assert!(!tracker.in_code_block());

    let tracker = tracker.process_line("```rust");
    assert!(tracker.in_code_block());

    let tracker = tracker.process_line("fn main() {}");
    assert!(tracker.in_code_block());

    let tracker = tracker.process_line("```");
    assert!(!tracker.in_code_block());
  }

  #[test]
  fn test_fence_tracker_mismatched() {
    let tracker = FenceTracker::new().process_line("```");
    assert!(tracker.in_code_block());

    // Tilde doesn't close backtick fence
    let tracker = tracker.process_line("~~~");
    assert!(tracker.in_code_block());

    let tracker = tracker.process_line("```");
    assert!(!tracker.in_code_block());
  }

  #[test]
  fn test_fence_tracker_count() {
    let tracker = FenceTracker::new().process_line("````");
    let tracker = tracker.process_line("```");
    assert!(tracker.in_code_block());
    let tracker = tracker.process_line("````");
    assert!(!tracker.in_code_block());
  }

  #[test]
  fn test_fence_tracker_inside_blockquote() {
    let tracker = FenceTracker::new().process_line("> ```python");
    assert!(tracker.in_code_block());
    let tracker = tracker.process_line("> ```");
    assert!(!tracker.in_code_block());
  }

  #[test]
  fn test_advance_marks_delimiters_as_code() {
    let mut tracker = FenceTracker::new();
    let flags: Vec<bool> = ["a", "```", "b", "```", "c"]
      .iter()
      .map(|line| tracker.advance(line))
      .collect();
    assert_eq!(flags, [false, true, true, true, false]);
  }

  #[test]
  fn test_fenced_ranges() {
    let text = "before\n```\ncode\n```\nafter\n";
    let ranges = fenced_ranges(text);
    assert_eq!(ranges.len(), 1);
    assert_eq!(&text[ranges[0].clone()], "```\ncode\n```\n");
  }

  #[test]
  fn test_inline_code_ranges() {
    let text = "use `[[x]]` and ``a ` b`` here";
    let spans: Vec<&str> = inline_code_ranges(text)
      .into_iter()
      .map(|r| &text[r])
      .collect();
    assert_eq!(spans, ["`[[x]]`", "``a ` b``"]);
  }

  #[test]
  fn test_unmatched_backtick_is_literal() {
    assert!(inline_code_ranges("a ` b").is_empty());
    assert!(inline_code_ranges("a `b\n\nc` d").is_empty());
  }

  #[test]
  fn test_map_outside_code() {
    let text = "x `x` x\n```\nx\n```\n";
    let out = map_outside_code(text, |s| s.replace('x', "y"));
    assert_eq!(out, "y `x` y\n```\nx\n```\n");
  }

  #[test]
  fn test_map_outside_code_skips_rendered_code() {
    let text = "x <pre><code>x\n`x\n</code></pre> x <code>x</code> `x`";
    let out = map_outside_code(text, |s| s.replace('x', "y"));
    assert_eq!(out, "y <pre><code>x\n`x\n</code></pre> y <code>x</code> `x`");
  }

  #[test]
  fn test_html_code_inside_fence_is_fence_only() {
    let text = "```\n<code>a</code>\n```\n";
    assert!(html_code_ranges(text).is_empty());
    assert_eq!(code_ranges(text), [0..text.len()]);
  }

  #[test]
  fn test_strip_code() {
    let out = strip_code("a `b` c\n```\nd\n```\ne");
    assert!(out.contains('a'));
    assert!(out.contains('e'));
    assert!(!out.contains('b'));
    assert!(!out.contains('d'));
  }
}
