//! Dialect preprocessors that run on Markdown text before comrak sees it.
//!
//! Each function is a pure `&str -> String` map. Fenced code is never
//! touched; the link and embed rewriters skip inline code spans as well.
use std::{ops::Range, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{
  resolver::AssetResolver,
  utils::{
    codeblock::map_outside_code,
    compile_or_never,
    slugify,
    strip_md_extension,
    youtube_video_id,
  },
};

static MERMAID_ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "MERMAID_ALIAS_RE",
    r"(?m)^([ \t>]*(?:`{3,}|~{3,})[ \t]*)(?:merlight|merdark|mer)\b",
  )
});

/// Rewrite the `mer`, `merlight` and `merdark` fence languages to
/// `mermaid`.
#[must_use]
pub fn normalize_mermaid_aliases(markdown: &str) -> String {
  MERMAID_ALIAS_RE
    .replace_all(markdown, "${1}mermaid")
    .into_owned()
}

static WIKI_EMBED_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("WIKI_EMBED_RE", r"!\[\[([^\]]+)\]\]"));

static WIKI_LINK_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("WIKI_LINK_RE", r"\[\[(.*?)\]\]"));

/// Rewrite `![[file]]` embeds and `[[...]]` links in Markdown text.
///
/// Embeds become standard image references so comrak renders them;
/// links become `<a>` elements directly.
#[must_use]
pub fn rewrite_wiki_syntax(markdown: &str, resolver: &dyn AssetResolver) -> String {
  map_outside_code(markdown, |chunk| {
    let embedded = rewrite_image_embeds(chunk, resolver);
    rewrite_wiki_links(&embedded, resolver)
  })
}

/// `![[file]]` / `![[file|alt]]` to `![alt](url)`.
#[must_use]
pub fn rewrite_image_embeds(text: &str, resolver: &dyn AssetResolver) -> String {
  WIKI_EMBED_RE
    .replace_all(text, |caps: &Captures| {
      let inner = &caps[1];
      let (file, alt) = match inner.split_once('|') {
        // A bare number after the pipe is an Obsidian display size
        Some((file, alt)) if !alt.trim().chars().all(|c| c.is_ascii_digit() || c == 'x') => {
          (file.trim(), alt.trim())
        },
        Some((file, _)) => (file.trim(), file.trim()),
        None => (inner.trim(), inner.trim()),
      };
      format!("![{alt}]({})", resolver.asset_url(file))
    })
    .into_owned()
}

/// Replace every `[[...]]` in `text` with an anchor. Tokens that do not
/// name anything (`[[]]`, `[[|]]`) are left as they are.
#[must_use]
pub fn rewrite_wiki_links(text: &str, resolver: &dyn AssetResolver) -> String {
  WIKI_LINK_RE
    .replace_all(text, |caps: &Captures| {
      wiki_link_html(&caps[1], resolver).unwrap_or_else(|| caps[0].to_string())
    })
    .into_owned()
}

/// Every `[[...]]` token in `text` that names a target, with the byte range
/// of the whole token.
#[must_use]
pub fn find_wiki_links(text: &str) -> Vec<(Range<usize>, WikiTarget<'_>)> {
  WIKI_LINK_RE
    .captures_iter(text)
    .filter_map(|caps| {
      let whole = caps.get(0)?;
      let target = parse_wiki_target(caps.get(1)?.as_str())?;
      Some((whole.range(), target))
    })
    .collect()
}

/// Whether `text` contains anything [`rewrite_wiki_links`] would change.
#[must_use]
pub fn has_wiki_link(text: &str) -> bool {
  !find_wiki_links(text).is_empty()
}

/// The parts of a `[[target#heading|alias]]` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiTarget<'a> {
  /// Note name without `.md`; empty for same-page heading links.
  pub note:    &'a str,
  pub heading: Option<&'a str>,
  pub alias:   Option<&'a str>,
}

impl WikiTarget<'_> {
  /// Visible link text.
  #[must_use]
  pub fn text(&self) -> String {
    if let Some(alias) = self.alias {
      return alias.to_string();
    }
    match self.heading {
      Some(heading) if self.note.is_empty() => heading.to_string(),
      Some(heading) => format!("{} > {heading}", self.note),
      None => self.note.to_string(),
    }
  }

  /// Link target, heading fragment slugified.
  #[must_use]
  pub fn href(&self, resolver: &dyn AssetResolver) -> String {
    let fragment = self.heading.map(|h| format!("#{}", slugify(h)));
    match (self.note.is_empty(), fragment) {
      (true, Some(fragment)) => fragment,
      (false, Some(fragment)) => resolver.note_path(self.note) + &fragment,
      (_, None) => resolver.note_path(self.note),
    }
  }
}

/// Split the inside of a `[[...]]` token.
#[must_use]
pub fn parse_wiki_target(inner: &str) -> Option<WikiTarget<'_>> {
  let (target, alias) = match inner.split_once('|') {
    Some((target, alias)) => (target.trim(), Some(alias.trim())),
    None => (inner.trim(), None),
  };
  let alias = alias.filter(|a| !a.is_empty());

  let (note, heading) = match target.split_once('#') {
    Some((note, heading)) => (note.trim(), Some(heading.trim())),
    None => (target, None),
  };
  let heading = heading.filter(|h| !h.is_empty());
  let note = strip_md_extension(note).trim();

  if note.is_empty() && heading.is_none() {
    return None;
  }

  Some(WikiTarget {
    note,
    heading,
    alias,
  })
}

/// Render one wiki-link token (without brackets) as an anchor element.
#[must_use]
pub fn wiki_link_html(inner: &str, resolver: &dyn AssetResolver) -> Option<String> {
  let target = parse_wiki_target(inner)?;
  let class = if target.note.is_empty() {
    "internal-link anchor-link"
  } else {
    "internal-link"
  };

  Some(format!(
    r#"<a href="{}" class="{class}">{}</a>"#,
    html_escape::encode_double_quoted_attribute(&target.href(resolver)),
    html_escape::encode_text(&target.text())
  ))
}

static MARKDOWN_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never(
    "MARKDOWN_IMAGE_RE",
    r#"!\[([^\]]*)\]\(\s*<?([^)\s>]+)>?(?:\s+"[^"]*")?\s*\)"#,
  )
});

/// Replace image links pointing at YouTube videos with an embedded player.
#[must_use]
pub fn embed_youtube_links(markdown: &str) -> String {
  map_outside_code(markdown, |chunk| {
    MARKDOWN_IMAGE_RE
      .replace_all(chunk, |caps: &Captures| {
        youtube_video_id(&caps[2]).map_or_else(
          || caps[0].to_string(),
          |id| youtube_embed_html(id, &caps[1]),
        )
      })
      .into_owned()
  })
}

/// Responsive player markup for a YouTube video.
#[must_use]
pub fn youtube_embed_html(video_id: &str, title: &str) -> String {
  let title = if title.trim().is_empty() {
    "YouTube video player"
  } else {
    title.trim()
  };
  format!(
    r#"<div class="video-container"><iframe src="https://www.youtube.com/embed/{}" title="{}" frameborder="0" allow="accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture; web-share" referrerpolicy="strict-origin-when-cross-origin" allowfullscreen></iframe></div>"#,
    html_escape::encode_double_quoted_attribute(video_id),
    html_escape::encode_double_quoted_attribute(title)
  )
}

static STRONG_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("STRONG_RE", r"\*\*([^\s*](?:[^*\n]*?[^\s*])?)\*\*")
});

/// Turn `**text**` into `<strong>` up front.
///
/// CommonMark's flanking rules reject `**"인용"**은` and similar runs where
/// the closing delimiter sits between punctuation and a letter, which is
/// everyday text in Korean, Japanese and Chinese notes.
#[must_use]
pub fn normalize_strong_emphasis(markdown: &str) -> String {
  map_outside_code(markdown, |chunk| {
    STRONG_RE
      .replace_all(chunk, "<strong>$1</strong>")
      .into_owned()
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resolver::PathResolver;

  #[test]
  fn test_mermaid_aliases() {
    let md = "```mer\ngraph TD\n```\n~~~merdark\nA\n~~~\n```merlight\nB\n```";
    let out = normalize_mermaid_aliases(md);
    assert_eq!(out.matches("mermaid").count(), 3);
    assert!(!out.contains("merdark"));
  }

  #[test]
  fn test_mermaid_tag_untouched() {
    let md = "```mermaid\ngraph TD\n```\n```merge\n```";
    assert_eq!(normalize_mermaid_aliases(md), md);
  }

  #[test]
  fn test_wiki_link_shapes() {
    let r = PathResolver::default();
    assert_eq!(
      rewrite_wiki_links("[[My Note]]", &r),
      r#"<a href="/posts/My_Note" class="internal-link">My Note</a>"#
    );
    assert_eq!(
      rewrite_wiki_links("[[My Note|alias]]", &r),
      r#"<a href="/posts/My_Note" class="internal-link">alias</a>"#
    );
    assert_eq!(
      rewrite_wiki_links("[[#Getting Started]]", &r),
      r##"<a href="#getting-started" class="internal-link anchor-link">Getting Started</a>"##
    );
    assert_eq!(
      rewrite_wiki_links("[[Guide.md#Set Up|here]]", &r),
      r#"<a href="/posts/Guide#set-up" class="internal-link">here</a>"#
    );
    assert_eq!(
      rewrite_wiki_links("[[Guide#Set Up]]", &r),
      r#"<a href="/posts/Guide#set-up" class="internal-link">Guide &gt; Set Up</a>"#
    );
  }

  #[test]
  fn test_empty_wiki_link_is_literal() {
    let r = PathResolver::default();
    assert_eq!(rewrite_wiki_links("[[]] and [[ | ]]", &r), "[[]] and [[ | ]]");
    assert!(!has_wiki_link("[[]]"));
    assert!(has_wiki_link("see [[x]]"));
  }

  #[test]
  fn test_image_embeds() {
    let r = PathResolver::default();
    assert_eq!(
      rewrite_image_embeds("![[my photo.png]]", &r),
      "![my photo.png](/images/my_photo.png)"
    );
    assert_eq!(
      rewrite_image_embeds("![[a.png|A cat]] ![[b.png|300]]", &r),
      "![A cat](/images/a.png) ![b.png](/images/b.png)"
    );
  }

  #[test]
  fn test_wiki_syntax_skips_code() {
    let r = PathResolver::default();
    let md = "[[A]] `[[B]]`\n```\n[[C]]\n```\n";
    let out = rewrite_wiki_syntax(md, &r);
    assert!(out.contains(r#"href="/posts/A""#));
    assert!(out.contains("`[[B]]`"));
    assert!(out.contains("\n[[C]]\n"));
  }

  #[test]
  fn test_youtube_embed() {
    let out =
      embed_youtube_links("![Talk](https://www.youtube.com/watch?v=dQw4w9WgXcQ)");
    assert!(out.contains(r#"<div class="video-container">"#));
    assert!(out.contains("https://www.youtube.com/embed/dQw4w9WgXcQ"));
    assert!(out.contains(r#"title="Talk""#));
  }

  #[test]
  fn test_non_youtube_image_passes_through() {
    let md = "![diagram](/images/d.png) ![v](https://vimeo.com/1)";
    assert_eq!(embed_youtube_links(md), md);
  }

  #[test]
  fn test_youtube_default_title() {
    let out = embed_youtube_links("![](https://youtu.be/dQw4w9WgXcQ)");
    assert!(out.contains(r#"title="YouTube video player""#));
  }

  #[test]
  fn test_strong_emphasis_normalization() {
    assert_eq!(
      normalize_strong_emphasis("**\"인용\"**은 `**x**`"),
      "<strong>\"인용\"</strong>은 `**x**`"
    );
    assert_eq!(normalize_strong_emphasis("a ** b ** c"), "a ** b ** c");
  }
}
