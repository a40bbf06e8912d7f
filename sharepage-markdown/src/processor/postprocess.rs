//! DOM passes over comrak's output.
//!
//! The rendered fragment is parsed once with kuchikikiki, every pass edits
//! the tree in place, and only the `<body>` children are serialized back.
use std::collections::HashSet;

use kuchikikiki::{Attribute, ExpandedName, NodeRef, parse_html};
use markup5ever::{LocalName, QualName, local_name, ns};
use tendril::TendrilSink;

use super::{extensions::find_wiki_links, math::RenderContext};
use crate::{
  resolver::AssetResolver,
  syntax::SyntaxManager,
  types::Header,
  utils::slugify,
};

/// First words that mark an untagged code block as a Mermaid diagram.
pub const DIAGRAM_KEYWORDS: &[&str] = &[
  "graph",
  "flowchart",
  "sequenceDiagram",
  "classDiagram",
  "stateDiagram",
  "stateDiagram-v2",
  "erDiagram",
  "gantt",
  "pie",
  "journey",
  "gitGraph",
  "mindmap",
  "timeline",
  "quadrantChart",
  "requirementDiagram",
  "c4Context",
];

/// Parse `html` as a fragment, run `transform` on it and serialize the
/// result.
pub fn with_document<F, T>(html: &str, transform: F) -> (String, T)
where
  F: FnOnce(&NodeRef) -> T,
{
  let document = parse_html().one(html);
  let value = transform(&document);
  (serialize_body(&document), value)
}

/// Serialize the children of `<body>`, which is where a parsed fragment
/// ends up.
#[must_use]
pub fn serialize_body(document: &NodeRef) -> String {
  let mut out = Vec::new();
  let Ok(body) = document.select_first("body") else {
    return String::new();
  };

  for child in body.as_node().children() {
    if let Err(e) = child.serialize(&mut out) {
      log::warn!("Failed to serialize HTML node: {e}");
    }
  }
  String::from_utf8(out).unwrap_or_default()
}

fn new_element(name: LocalName, attrs: &[(&str, &str)]) -> NodeRef {
  NodeRef::new_element(
    QualName::new(None, ns!(html), name),
    attrs.iter().map(|&(key, value)| {
      (ExpandedName::new("", key), Attribute {
        prefix: None,
        value:  value.to_string(),
      })
    }),
  )
}

fn class_list(node: &NodeRef) -> Vec<String> {
  node
    .as_element()
    .and_then(|element| {
      element
        .attributes
        .borrow()
        .get(local_name!("class"))
        .map(|class| class.split_whitespace().map(str::to_string).collect())
    })
    .unwrap_or_default()
}

fn code_language(code: &NodeRef) -> Option<String> {
  class_list(code)
    .iter()
    .find_map(|class| class.strip_prefix("language-").map(str::to_string))
    .filter(|language| !language.is_empty())
}

fn select_nodes(document: &NodeRef, selector: &str) -> Vec<NodeRef> {
  document
    .select(selector)
    .map(|matches| matches.map(|m| m.as_node().clone()).collect())
    .unwrap_or_default()
}

/// Give h1 to h`max_level` unique IDs, wrap each in an anchor-link
/// container and report them in document order.
///
/// Math tokens in heading text are read as their LaTeX source.
pub fn assign_heading_ids(
  document: &NodeRef,
  max_level: u8,
  ctx: &RenderContext,
) -> Vec<Header> {
  let max_level = max_level.clamp(1, 6);
  let selector = (1..=max_level)
    .map(|level| format!("h{level}"))
    .collect::<Vec<_>>()
    .join(", ");

  let mut taken: HashSet<String> = select_nodes(document, "[id]")
    .iter()
    .filter_map(|node| {
      node
        .as_element()
        .and_then(|e| e.attributes.borrow().get(local_name!("id")).map(str::to_string))
    })
    .collect();

  let mut headers = Vec::new();
  for heading in select_nodes(document, &selector) {
    let Some(element) = heading.as_element() else {
      continue;
    };
    let level = element
      .name
      .local
      .strip_prefix('h')
      .and_then(|n| n.parse::<u8>().ok())
      .unwrap_or(1);
    let text = ctx.plain_text(heading.text_contents().trim());

    let existing = element
      .attributes
      .borrow()
      .get(local_name!("id"))
      .map(str::to_string);
    let id = existing.unwrap_or_else(|| {
      let id = unique_id(&slugify(&text), &mut taken);
      element
        .attributes
        .borrow_mut()
        .insert(local_name!("id"), id.clone());
      id
    });

    let wrapper =
      new_element(local_name!("div"), &[("class", "markdown-heading-wrapper")]);
    let anchor = new_element(local_name!("a"), &[
      ("href", &format!("#{id}")),
      ("class", "heading-anchor"),
    ]);
    anchor.append(NodeRef::new_text("#"));
    heading.insert_before(wrapper.clone());
    wrapper.append(anchor);
    wrapper.append(heading.clone());

    headers.push(Header { text, level, id });
  }

  headers
}

fn unique_id(base: &str, taken: &mut HashSet<String>) -> String {
  let base = if base.is_empty() { "section" } else { base };
  let id = if taken.contains(base) {
    (2..)
      .map(|n| format!("{base}-{n}"))
      .find(|candidate| !taken.contains(candidate))
      .unwrap_or_else(|| base.to_string())
  } else {
    base.to_string()
  };
  taken.insert(id.clone());
  id
}

/// Whether a code element is a diagram: tagged with a diagram language, or
/// (inside `pre`) starting with a diagram keyword.
fn is_diagram(code: &NodeRef, in_pre: bool, languages: &[String]) -> bool {
  let tagged = class_list(code).iter().any(|class| {
    let language = class.strip_prefix("language-").unwrap_or(class);
    languages.iter().any(|l| l.eq_ignore_ascii_case(language))
  });
  if tagged || !in_pre {
    return tagged;
  }

  code
    .text_contents()
    .split_whitespace()
    .next()
    .is_some_and(|word| DIAGRAM_KEYWORDS.contains(&word))
}

/// Parse an optional `W`, `W,H` or `,H` size line.
fn diagram_dimensions(line: &str) -> Option<(Option<&str>, Option<&str>)> {
  let (width, height) = match line.split_once(',') {
    Some((w, h)) => (w, Some(h)),
    None => (line, None),
  };
  let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

  if !(width.is_empty() || is_number(width)) || height.is_some_and(|h| !is_number(h))
  {
    return None;
  }
  let width = Some(width).filter(|w| !w.is_empty());
  if width.is_none() && height.is_none() {
    return None;
  }
  Some((width, height))
}

/// Replace diagram code blocks with `.mermaid` containers for the
/// client-side renderer.
pub fn extract_diagrams(document: &NodeRef, languages: &[String]) -> usize {
  let mut count = 0;

  for code in select_nodes(document, "code") {
    let parent_pre = code
      .parent()
      .filter(|p| p.as_element().is_some_and(|e| e.name.local == local_name!("pre")));
    if !is_diagram(&code, parent_pre.is_some(), languages) {
      continue;
    }

    let text = code.text_contents();
    let source = text.trim();
    let (first_line, rest) = source.split_once('\n').unwrap_or((source, ""));
    let (source, dimensions) = match diagram_dimensions(first_line.trim()) {
      Some(dimensions) => (rest.trim(), Some(dimensions)),
      None => (source, None),
    };

    let mut attrs = vec![("class", "mermaid".to_string()), ("data-code", source.to_string())];
    if let Some((width, height)) = dimensions {
      let mut style = Vec::new();
      if let Some(width) = width {
        style.push(format!("width: {width}px"));
      }
      if let Some(height) = height {
        style.push(format!("height: {height}px"));
      }
      style.push("max-width: 100%; margin-left: auto; margin-right: auto".to_string());
      attrs.push(("style", style.join("; ")));
    }

    let attrs: Vec<(&str, &str)> = attrs.iter().map(|(k, v)| (*k, v.as_str())).collect();
    let container = new_element(local_name!("div"), &attrs);
    container.append(NodeRef::new_text(source));

    let target = parent_pre.unwrap_or(code);
    target.insert_before(container);
    target.detach();
    count += 1;
  }

  count
}

/// Highlight every remaining `pre > code` block.
///
/// A fence language the highlighter knows keeps its `language-X` class
/// next to `hljs`; detected or plain-text blocks get `hljs` alone. Blocks
/// the highlighter fails on are left unchanged.
pub fn highlight_code_blocks(document: &NodeRef, manager: &SyntaxManager) -> usize {
  let mut count = 0;

  for code in select_nodes(document, "pre > code") {
    let language = code_language(&code);
    let source = code.text_contents();

    let highlighted = match manager.highlight_code(&source, language.as_deref()) {
      Ok(highlighted) => highlighted,
      Err(e) => {
        log::debug!("Leaving code block unhighlighted: {e}");
        continue;
      },
    };

    let Some(element) = code.as_element() else {
      continue;
    };
    let class = highlighted
      .language
      .map_or_else(|| "hljs".to_string(), |language| format!("hljs language-{language}"));
    element
      .attributes
      .borrow_mut()
      .insert(local_name!("class"), class);

    replace_children_with_html(&code, &highlighted.html);
    count += 1;
  }

  count
}

fn replace_children_with_html(node: &NodeRef, html: &str) {
  let fragment = parse_html().one(format!("<pre><code>{html}</code></pre>"));
  let Ok(source) = fragment.select_first("code") else {
    return;
  };

  for child in node.children().collect::<Vec<_>>() {
    child.detach();
  }
  for child in source.as_node().children().collect::<Vec<_>>() {
    node.append(child);
  }
}

fn in_link_free_zone(node: &NodeRef) -> bool {
  node.ancestors().any(|ancestor| {
    let Some(element) = ancestor.as_element() else {
      return false;
    };
    [
      local_name!("pre"),
      local_name!("code"),
      local_name!("a"),
      local_name!("script"),
      local_name!("style"),
    ]
    .contains(&element.name.local)
      || class_list(&ancestor).iter().any(|c| c == "mermaid")
  })
}

/// Second link pass: rewrite `[[...]]` left in text nodes, such as links
/// that came out of raw HTML blocks. Text inside code, links, scripts,
/// styles and diagrams is left alone. Running it twice changes nothing.
pub fn rewrite_text_links(document: &NodeRef, resolver: &dyn AssetResolver) -> usize {
  let candidates: Vec<(NodeRef, String)> = document
    .descendants()
    .filter_map(|node| {
      let text = node.as_text()?.borrow().clone();
      (text.contains("[[") && !in_link_free_zone(&node)).then_some((node, text))
    })
    .collect();

  let mut count = 0;
  for (node, text) in candidates {
    let links = find_wiki_links(&text);
    if links.is_empty() {
      continue;
    }

    let mut cursor = 0;
    for (range, target) in links {
      if range.start > cursor {
        node.insert_before(NodeRef::new_text(&text[cursor..range.start]));
      }

      let class = if target.note.is_empty() {
        "internal-link anchor-link"
      } else {
        "internal-link"
      };
      let anchor = new_element(local_name!("a"), &[
        ("href", &target.href(resolver)),
        ("class", class),
      ]);
      anchor.append(NodeRef::new_text(target.text()));
      node.insert_before(anchor);

      cursor = range.end;
      count += 1;
    }
    if cursor < text.len() {
      node.insert_before(NodeRef::new_text(&text[cursor..]));
    }
    node.detach();
  }

  count
}
