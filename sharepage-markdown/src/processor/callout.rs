//! Callout (admonition) expansion.
//!
//! ```markdown
//! > [!warning] Careful
//! > This body is rendered as Markdown.
//! ```
//!
//! Callouts are found with a line scanner that is either outside a callout
//! or collecting one. A blank line only stays inside the callout when the
//! line right after it continues the blockquote, so this needs one line of
//! lookahead and nothing more.
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::{capitalize_first, codeblock::FenceTracker, compile_or_never};

/// The closed set of callout kinds. Aliases map onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalloutKind {
  Note,
  Abstract,
  Info,
  Tip,
  Success,
  Question,
  Warning,
  Failure,
  Danger,
  Bug,
  Example,
  Quote,
}

impl CalloutKind {
  /// Resolve an author-written kind token. Unknown tokens become `Note`.
  #[must_use]
  pub fn from_alias(alias: &str) -> Self {
    match alias.to_lowercase().as_str() {
      "abstract" | "summary" | "tldr" => Self::Abstract,
      "info" | "todo" => Self::Info,
      "tip" | "hint" | "important" => Self::Tip,
      "success" | "check" | "done" => Self::Success,
      "question" | "help" | "faq" => Self::Question,
      "warning" | "caution" | "attention" => Self::Warning,
      "failure" | "fail" | "missing" => Self::Failure,
      "danger" | "error" => Self::Danger,
      "bug" => Self::Bug,
      "example" => Self::Example,
      "quote" | "cite" => Self::Quote,
      _ => Self::Note,
    }
  }

  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Note => "note",
      Self::Abstract => "abstract",
      Self::Info => "info",
      Self::Tip => "tip",
      Self::Success => "success",
      Self::Question => "question",
      Self::Warning => "warning",
      Self::Failure => "failure",
      Self::Danger => "danger",
      Self::Bug => "bug",
      Self::Example => "example",
      Self::Quote => "quote",
    }
  }

  /// Lucide icon name shown in the callout title bar.
  #[must_use]
  pub const fn icon(self) -> &'static str {
    match self {
      Self::Note => "pencil",
      Self::Abstract => "clipboard-list",
      Self::Info => "info",
      Self::Tip => "flame",
      Self::Success => "check",
      Self::Question => "help-circle",
      Self::Warning => "alert-triangle",
      Self::Failure => "x",
      Self::Danger => "zap",
      Self::Bug => "bug",
      Self::Example => "list",
      Self::Quote => "quote",
    }
  }
}

static CALLOUT_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("CALLOUT_OPEN_RE", r"^(\s*)>\s*\[!(\w+)\]([+-]?)(.*)$")
});

#[derive(Debug)]
struct OpenCallout<'a> {
  indent: &'a str,
  kind:   CalloutKind,
  title:  String,
  body:   Vec<&'a str>,
  fence:  FenceTracker,
}

impl<'a> OpenCallout<'a> {
  fn parse(line: &'a str) -> Option<Self> {
    let caps = CALLOUT_OPEN_RE.captures(line)?;
    let indent = caps.get(1).map_or("", |m| m.as_str());
    let alias = caps.get(2).map_or("", |m| m.as_str());
    let title = caps.get(4).map_or("", |m| m.as_str()).trim();

    let title = if title.is_empty() {
      capitalize_first(&alias.to_lowercase())
    } else {
      title.to_string()
    };

    Some(Self {
      indent,
      kind: CalloutKind::from_alias(alias),
      title,
      body: Vec::new(),
      fence: FenceTracker::new(),
    })
  }

  /// The line with this callout's indentation and one `>` marker removed.
  fn continuation(&self, line: &'a str) -> Option<&'a str> {
    let rest = line.strip_prefix(self.indent)?.strip_prefix('>')?;
    Some(rest.strip_prefix([' ', '\t']).unwrap_or(rest))
  }

  fn emit<F>(self, render_body: &mut F) -> Vec<String>
  where
    F: FnMut(&str) -> String,
  {
    let rendered = render_body(&self.body.join("\n"));
    let title = html_escape::encode_text(&self.title);
    let kind = self.kind.as_str();
    let icon = self.kind.icon();

    let mut lines = vec![
      format!(r#"<div class="callout" data-callout="{kind}">"#),
      r#"<div class="callout-title">"#.to_string(),
      format!(r#"<div class="callout-icon" data-icon="{icon}"></div>"#),
      format!(r#"<div class="callout-title-text">{title}</div>"#),
      "</div>".to_string(),
      r#"<div class="callout-content">"#.to_string(),
    ];
    // A blank line would end the HTML block early in the next stage
    lines.extend(rendered.trim_end().lines().map(|line| {
      if line.trim().is_empty() {
        "<!-- -->".to_string()
      } else {
        line.to_string()
      }
    }));
    lines.push("</div>".to_string());
    lines.push("</div>".to_string());

    lines
      .into_iter()
      .map(|line| format!("{}{line}", self.indent))
      .collect()
  }
}

/// Expand every callout in `markdown` into an HTML block.
///
/// `render_body` turns a callout's body (blockquote markers stripped) into
/// HTML; the processor hands in its own preprocess-and-render step so that
/// nested callouts, links and math in bodies behave like top-level ones.
/// Each emitted line carries the opening line's indentation so callouts
/// nested in list items stay inside the item. Fenced code outside callouts
/// is left alone.
pub fn expand_callouts<F>(markdown: &str, mut render_body: F) -> String
where
  F: FnMut(&str) -> String,
{
  let lines: Vec<&str> = markdown.lines().collect();
  let mut out: Vec<String> = Vec::with_capacity(lines.len());
  let mut fence = FenceTracker::new();
  let mut current: Option<OpenCallout> = None;

  for (i, &line) in lines.iter().enumerate() {
    if let Some(mut callout) = current.take() {
      let in_body_code = callout.fence.in_code_block();

      if !in_body_code && let Some(next) = OpenCallout::parse(line) {
        out.extend(callout.emit(&mut render_body));
        current = Some(next);
        continue;
      }

      if let Some(content) = callout.continuation(line) {
        callout.fence = callout.fence.process_line(content);
        callout.body.push(content);
        current = Some(callout);
        continue;
      }

      let gap_continues = line.trim().is_empty()
        && lines
          .get(i + 1)
          .is_some_and(|&next| callout.continuation(next).is_some());
      if gap_continues {
        callout.body.push("");
        current = Some(callout);
        continue;
      }

      out.extend(callout.emit(&mut render_body));
      if !line.trim().is_empty() {
        out.push(String::new());
      }
    }

    if fence.advance(line) {
      out.push(line.to_string());
      continue;
    }

    match OpenCallout::parse(line) {
      Some(callout) => current = Some(callout),
      None => out.push(line.to_string()),
    }
  }

  if let Some(callout) = current {
    out.extend(callout.emit(&mut render_body));
  }

  let mut result = out.join("\n");
  if markdown.ends_with('\n') {
    result.push('\n');
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;

  fn paragraph(body: &str) -> String {
    format!("<p>{}</p>", body.replace('\n', " "))
  }

  #[test]
  fn test_alias_table() {
    assert_eq!(CalloutKind::from_alias("caution"), CalloutKind::Warning);
    assert_eq!(CalloutKind::from_alias("TLDR"), CalloutKind::Abstract);
    assert_eq!(CalloutKind::from_alias("important"), CalloutKind::Tip);
    assert_eq!(CalloutKind::from_alias("error"), CalloutKind::Danger);
    assert_eq!(CalloutKind::from_alias("whatever"), CalloutKind::Note);
  }

  #[test]
  fn test_basic_callout() {
    let out = expand_callouts("> [!tip] Try this\n> Body text", paragraph);
    assert!(out.contains(r#"<div class="callout" data-callout="tip">"#));
    assert!(out.contains(r#"<div class="callout-title-text">Try this</div>"#));
    assert!(out.contains(r#"data-icon="flame""#));
    assert!(out.contains("<p>Body text</p>"));
    assert!(!out.contains("[!tip]"));
  }

  #[test]
  fn test_default_title_is_capitalized_kind() {
    let out = expand_callouts("> [!caution]\n> Body", paragraph);
    assert!(out.contains(r#"data-callout="warning""#));
    assert!(out.contains(r#"<div class="callout-title-text">Caution</div>"#));
  }

  #[test]
  fn test_closes_before_following_paragraph() {
    let input = "> [!warning] Careful\n> line one\n> line two\n\nAfter paragraph";
    let out = expand_callouts(input, paragraph);
    assert!(out.contains("<p>line one line two</p>"));
    assert!(out.ends_with("\n\nAfter paragraph"));
    let callout_end = out.rfind("</div>").unwrap_or_default();
    let para = out.find("After paragraph").unwrap_or_default();
    assert!(callout_end < para);
  }

  #[test]
  fn test_blank_gap_kept_only_when_followed_by_continuation() {
    let input = "> [!note]\n> first\n\n> second\n\nplain";
    let mut bodies = Vec::new();
    let out = expand_callouts(input, |body| {
      bodies.push(body.to_string());
      String::new()
    });
    assert_eq!(bodies, ["first\n\nsecond"]);
    assert!(out.ends_with("plain"));
  }

  #[test]
  fn test_new_opener_closes_current() {
    let mut bodies = Vec::new();
    let out = expand_callouts("> [!info] A\n> a\n> [!bug] B\n> b", |body| {
      bodies.push(body.to_string());
      String::new()
    });
    assert_eq!(bodies, ["a", "b"]);
    assert!(out.contains(r#"data-callout="info""#));
    assert!(out.contains(r#"data-callout="bug""#));
  }

  #[test]
  fn test_indentation_preserved_on_every_line() {
    let input = "- item\n  > [!note] Nested\n  > body\n";
    let out = expand_callouts(input, paragraph);
    for line in out.lines().skip(1).filter(|l| !l.trim().is_empty()) {
      assert!(line.starts_with("  <"), "line lost indentation: {line:?}");
    }
    assert!(out.ends_with('\n'));
  }

  #[test]
  fn test_different_indentation_is_not_continuation() {
    let mut bodies = Vec::new();
    let _ = expand_callouts("> [!note]\n> a\n  > b", |body| {
      bodies.push(body.to_string());
      String::new()
    });
    assert_eq!(bodies, ["a"]);
  }

  #[test]
  fn test_fold_marker_is_dropped() {
    let out = expand_callouts("> [!faq]- Folded\n> text", paragraph);
    assert!(out.contains(r#"data-callout="question""#));
    assert!(out.contains(">Folded</div>"));
  }

  #[test]
  fn test_callout_syntax_in_code_block_untouched() {
    let input = "```\n> [!note] not a callout\n```";
    assert_eq!(expand_callouts(input, paragraph), input);
  }

  #[test]
  fn test_blank_lines_in_rendered_body_are_masked() {
    let out = expand_callouts("> [!example]\n> x", |_| {
      "<pre><code>a\n\nb</code></pre>".to_string()
    });
    assert!(out.contains("<pre><code>a\n<!-- -->\nb</code></pre>"));
  }

  #[test]
  fn test_title_is_escaped() {
    let out = expand_callouts("> [!note] a <b> c", paragraph);
    assert!(out.contains("a &lt;b&gt; c"));
  }
}
