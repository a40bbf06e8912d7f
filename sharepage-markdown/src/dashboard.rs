//! The sectioned dashboard.
//!
//! A dashboard is an ordinary note whose `## ` headings name sections and
//! whose wiki-links list the notes in each. Any text after a link is taken
//! as a manual sort date:
//!
//! ```markdown
//! ## Reading
//! - [[Book A]] 2024-01-01
//! - [[Book B|The second one]] 2023-06-01
//! ```
//!
//! Every referenced note is resolved through the same frontmatter and
//! metadata logic the page renderer uses. Notes in the [`FileRegistry`] that
//! no section mentions are appended as auto-discovered sections.
use std::{collections::HashSet, sync::LazyLock};

use jiff::{Timestamp, civil, tz::TimeZone};
use log::{debug, trace, warn};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
  frontmatter::parse_frontmatter,
  metadata::{DEFAULT_DESCRIPTION_LENGTH, NoteKind, extract_metadata},
  resolver::AssetResolver,
  store::{ContentStore, FileRegistry, note_file_name, note_key},
  types::{DashboardSection, NoteReference},
  utils::{capitalize_first, compile_or_never, normalize_name, strip_md_extension},
};

/// Section name for links that appear before the first heading.
pub const GENERAL_SECTION: &str = "General";

/// Fallback section for [`upsert_dashboard_link`].
pub const INBOX_SECTION: &str = "Inbox";

const NO_DESCRIPTION: &str = "No description available.";

/// One wiki-link on a dashboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEntry {
  /// Linked note name, alias and `.md` removed.
  pub name:        String,
  /// Free text after the link, usually a date.
  pub manual_date: Option<String>,
}

/// A `## ` section of the dashboard before its links are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSection {
  pub title: String,
  pub links: Vec<LinkEntry>,
}

impl LinkSection {
  fn new(title: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      links: Vec::new(),
    }
  }

  fn push(&mut self, entry: LinkEntry) {
    let key = note_key(&entry.name);
    if !self.links.iter().any(|l| note_key(&l.name) == key) {
      self.links.push(entry);
    }
  }
}

static SECTION_HEADING_RE: LazyLock<Regex> =
  LazyLock::new(|| compile_or_never("SECTION_HEADING_RE", r"^##\s+(.+)$"));

static DASHBOARD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
  compile_or_never("DASHBOARD_LINK_RE", r"\[\[([^\]]+)\]\](?:\s*(.+))?")
});

/// Group the dashboard's wiki-links by `## ` heading.
///
/// Links before the first heading go to [`GENERAL_SECTION`], which is only
/// kept if it collected something. Only the first link on a line counts.
#[must_use]
pub fn extract_sectioned_links(content: &str) -> Vec<LinkSection> {
  let mut sections = Vec::new();
  let mut current = LinkSection::new(GENERAL_SECTION);
  let mut implicit = true;

  for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
    if let Some(caps) = SECTION_HEADING_RE.captures(line) {
      let finished = std::mem::replace(&mut current, LinkSection::new(caps[1].trim()));
      if !implicit || !finished.links.is_empty() {
        sections.push(finished);
      }
      implicit = false;
      continue;
    }

    let Some(caps) = DASHBOARD_LINK_RE.captures(line) else {
      continue;
    };
    let target = caps[1].split('|').next().unwrap_or_default();
    let name = strip_md_extension(target.trim()).trim().to_string();
    if name.is_empty() {
      continue;
    }

    current.push(LinkEntry {
      name,
      manual_date: caps
        .get(2)
        .map(|m| m.as_str().trim().to_string())
        .filter(|d| !d.is_empty()),
    });
  }

  if !implicit || !current.links.is_empty() {
    sections.push(current);
  }
  sections
}

/// Parse a dashboard or frontmatter date into epoch milliseconds.
///
/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and `YYYY-MM-DD HH:MM[:SS]`.
/// Civil dates and times are read as UTC. When the whole string does not
/// parse, its first word is tried, so `2024-01-01 (reread)` still sorts.
#[must_use]
pub fn parse_date_millis(value: &str) -> Option<i64> {
  let value = value.trim();
  parse_date_exact(value).or_else(|| {
    let first = value.split_whitespace().next()?;
    (first != value).then(|| parse_date_exact(first)).flatten()
  })
}

fn parse_date_exact(value: &str) -> Option<i64> {
  if value.is_empty() {
    return None;
  }
  if let Ok(ts) = value.parse::<Timestamp>() {
    return Some(ts.as_millisecond());
  }
  if let Ok(dt) = value.parse::<civil::DateTime>() {
    return dt.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp().as_millisecond());
  }
  if let Ok(date) = value.parse::<civil::Date>() {
    return date
      .to_zoned(TimeZone::UTC)
      .ok()
      .map(|z| z.timestamp().as_millisecond());
  }
  None
}

fn default_youtube_title() -> String {
  "YouTube".to_string()
}

fn default_others_title() -> String {
  "Others".to_string()
}

const fn default_true() -> bool {
  true
}

/// How notes missing from every dashboard section are presented.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoDiscoveryPolicy {
  /// Whether to append unlisted registry notes at all.
  #[serde(default = "default_true")]
  pub enabled: bool,

  /// Treat any note whose thumbnail is a YouTube still as a video note,
  /// whatever its declared type.
  #[serde(default = "default_true")]
  pub youtube_thumbnail_heuristic: bool,

  #[serde(default = "default_youtube_title")]
  pub youtube_title: String,

  #[serde(default = "default_others_title")]
  pub others_title: String,

  /// Append discovered video notes to an explicit section with the same
  /// title instead of adding a new one.
  #[serde(default)]
  pub merge_into_explicit: bool,
}

impl Default for AutoDiscoveryPolicy {
  fn default() -> Self {
    Self {
      enabled: true,
      youtube_thumbnail_heuristic: true,
      youtube_title: default_youtube_title(),
      others_title: default_others_title(),
      merge_into_explicit: false,
    }
  }
}

impl AutoDiscoveryPolicy {
  fn is_video(&self, note: &NoteReference) -> bool {
    note.kind == NoteKind::YouTube
      || (self.youtube_thumbnail_heuristic
        && note
          .thumbnail
          .as_deref()
          .is_some_and(|t| t.contains("youtube.com/vi/")))
  }
}

fn sort_notes(notes: &mut [NoteReference]) {
  notes.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
}

/// Resolves dashboard links into [`DashboardSection`]s.
pub struct DashboardLoader<'a> {
  store:              &'a dyn ContentStore,
  resolver:           &'a dyn AssetResolver,
  registry:           Option<&'a FileRegistry>,
  policy:             AutoDiscoveryPolicy,
  description_length: usize,
}

impl<'a> DashboardLoader<'a> {
  #[must_use]
  pub fn new(store: &'a dyn ContentStore, resolver: &'a dyn AssetResolver) -> Self {
    Self {
      store,
      resolver,
      registry: None,
      policy: AutoDiscoveryPolicy::default(),
      description_length: DEFAULT_DESCRIPTION_LENGTH,
    }
  }

  /// Registry used for auto-discovery and as the last-resort sort key.
  #[must_use]
  pub const fn with_registry(mut self, registry: Option<&'a FileRegistry>) -> Self {
    self.registry = registry;
    self
  }

  #[must_use]
  pub fn with_policy(mut self, policy: AutoDiscoveryPolicy) -> Self {
    self.policy = policy;
    self
  }

  #[must_use]
  pub const fn with_description_length(mut self, length: usize) -> Self {
    self.description_length = length;
    self
  }

  /// Fetch a note and build its dashboard card.
  ///
  /// The sort key is the first of these that exists: the manual date, the
  /// frontmatter `date`, the note's registry position, `0`. Returns `None`
  /// when the note cannot be fetched.
  #[must_use]
  pub fn resolve_note(&self, name: &str, manual_date: Option<&str>) -> Option<NoteReference> {
    let name = strip_md_extension(&normalize_name(name)).trim().to_string();
    if name.is_empty() {
      warn!("Ignoring empty dashboard link");
      return None;
    }

    let raw = match self.store.fetch(&name) {
      Ok(raw) => raw,
      Err(e) => {
        warn!("Skipping dashboard note '{name}': {e}");
        return None;
      },
    };

    let file = note_file_name(&name);
    let frontmatter = parse_frontmatter(&raw);
    let metadata = extract_metadata(&name, &frontmatter, self.resolver, self.description_length);
    let frontmatter_date = frontmatter.get_str("date").filter(|d| !d.trim().is_empty());

    let sort_key = manual_date
      .and_then(parse_date_millis)
      .or_else(|| frontmatter_date.and_then(parse_date_millis))
      .or_else(|| self.registry.and_then(|r| r.sort_key(&file)))
      .unwrap_or(0);

    let description = if metadata.description.is_empty() {
      NO_DESCRIPTION.to_string()
    } else {
      metadata.description
    };

    Some(NoteReference {
      path: self.resolver.note_path(&name),
      title: capitalize_first(&metadata.title),
      description,
      thumbnail: metadata.thumbnail,
      tags: metadata.tags,
      kind: metadata.kind,
      date: manual_date
        .filter(|d| !d.trim().is_empty())
        .or(frontmatter_date)
        .map(str::to_string),
      sort_key,
      file,
      name,
    })
  }

  fn resolve_all(&self, links: &[LinkEntry]) -> Vec<NoteReference> {
    links
      .par_iter()
      .map(|link| self.resolve_note(&link.name, link.manual_date.as_deref()))
      .collect::<Vec<_>>()
      .into_iter()
      .flatten()
      .collect()
  }

  /// Resolve already extracted sections, then append auto-discovered notes.
  ///
  /// A registry file counts as listed when any section resolved a note with
  /// the same [`note_key`], however the dashboard spelled the link.
  #[must_use]
  pub fn load_sections(&self, sections: &[LinkSection]) -> Vec<DashboardSection> {
    let mut result = Vec::with_capacity(sections.len() + 2);
    let mut listed = HashSet::new();

    for section in sections {
      let mut notes = self.resolve_all(&section.links);
      sort_notes(&mut notes);
      listed.extend(notes.iter().map(|n| note_key(&n.file)));

      if notes.is_empty() {
        debug!("Dropping empty dashboard section '{}'", section.title);
        continue;
      }
      result.push(DashboardSection::new(section.title.clone(), notes));
    }

    if self.policy.enabled {
      self.append_discovered(&mut result, &listed);
    }
    result
  }

  fn append_discovered(&self, result: &mut Vec<DashboardSection>, listed: &HashSet<String>) {
    let Some(registry) = self.registry else {
      debug!("No file registry, skipping auto-discovery");
      return;
    };

    let unlisted: Vec<LinkEntry> = registry
      .files()
      .iter()
      .filter(|file| !listed.contains(&note_key(file)))
      .map(|file| LinkEntry {
        name:        file.clone(),
        manual_date: None,
      })
      .collect();
    if unlisted.is_empty() {
      return;
    }
    trace!("Auto-discovering {} unlisted notes", unlisted.len());

    let (mut videos, mut others): (Vec<_>, Vec<_>) = self
      .resolve_all(&unlisted)
      .into_iter()
      .partition(|note| self.policy.is_video(note));

    if !videos.is_empty() {
      let explicit = self
        .policy
        .merge_into_explicit
        .then(|| result.iter_mut().find(|s| s.title == self.policy.youtube_title))
        .flatten();

      if let Some(section) = explicit {
        section.notes.append(&mut videos);
        sort_notes(&mut section.notes);
        section.count = section.notes.len();
      } else {
        sort_notes(&mut videos);
        result.push(DashboardSection::new(self.policy.youtube_title.clone(), videos));
      }
    }

    if !others.is_empty() {
      sort_notes(&mut others);
      result.push(DashboardSection::new(self.policy.others_title.clone(), others));
    }
  }

  /// Fetch the dashboard note and resolve it. A dashboard that cannot be
  /// fetched yields no sections.
  #[must_use]
  pub fn load(&self, dashboard_name: &str) -> Vec<DashboardSection> {
    match self.store.fetch(dashboard_name) {
      Ok(content) => self.load_sections(&extract_sectioned_links(&content)),
      Err(e) => {
        warn!("Cannot load dashboard '{dashboard_name}': {e}");
        Vec::new()
      },
    }
  }
}

/// Load a dashboard with the default description length.
#[must_use]
pub fn load_sectioned_dashboard(
  store: &dyn ContentStore,
  resolver: &dyn AssetResolver,
  dashboard_name: &str,
  registry: Option<&FileRegistry>,
  policy: &AutoDiscoveryPolicy,
) -> Vec<DashboardSection> {
  DashboardLoader::new(store, resolver)
    .with_registry(registry)
    .with_policy(policy.clone())
    .load(dashboard_name)
}

/// Narrow sections down to notes matching `query` (title or description,
/// case-insensitive) and carrying any of `tags`. Sections left empty are
/// removed. An empty query or tag list does not filter.
#[must_use]
pub fn filter_sections(
  sections: Vec<DashboardSection>,
  query: &str,
  tags: &[String],
) -> Vec<DashboardSection> {
  let query = query.trim().to_lowercase();
  let tags: Vec<String> = tags
    .iter()
    .map(|t| t.trim().trim_start_matches('#').to_lowercase())
    .filter(|t| !t.is_empty())
    .collect();

  let matches = |note: &NoteReference| {
    let query_ok = query.is_empty()
      || note.title.to_lowercase().contains(&query)
      || note.description.to_lowercase().contains(&query);
    let tags_ok = tags.is_empty()
      || note.tags.iter().any(|t| tags.contains(&t.to_lowercase()));
    query_ok && tags_ok
  };

  sections
    .into_iter()
    .filter_map(|section| {
      let notes: Vec<_> = section.notes.into_iter().filter(|n| matches(n)).collect();
      (!notes.is_empty()).then(|| DashboardSection::new(section.title, notes))
    })
    .collect()
}

/// Whether a trimmed line is a `- [[note]]` or `- [[note|alias]]` entry.
fn is_link_line(line: &str, note: &str) -> bool {
  let line = normalize_name(line);
  line
    .strip_prefix('-')
    .map(str::trim_start)
    .and_then(|rest| rest.strip_prefix("[["))
    .and_then(|rest| rest.strip_prefix(note))
    .is_some_and(|rest| {
      rest.starts_with("]]") || (rest.starts_with('|') && rest.contains("]]"))
    })
}

fn section_title(line: &str) -> Option<&str> {
  line.trim().strip_prefix("## ").map(str::trim)
}

fn clean_note_name(note: &str) -> String {
  strip_md_extension(&normalize_name(note)).trim().to_string()
}

/// Make sure the dashboard links `note` from `section`.
///
/// A link to the note under any other section is removed. When no link is
/// left in the target section, `- [[note]] {date}` is inserted right below
/// its heading, below `## Inbox` if that section does not exist, or in a
/// new section at the end.
#[must_use]
pub fn upsert_dashboard_link(content: &str, note: &str, date: &str, section: &str) -> String {
  let note = clean_note_name(note);
  let section = section.trim();

  let mut current = String::new();
  let mut present = false;
  let mut lines: Vec<&str> = Vec::new();

  for line in content.split('\n') {
    if let Some(title) = section_title(line) {
      current = title.to_string();
    }
    if is_link_line(line.trim(), &note) {
      if current == section && !present {
        present = true;
      } else {
        debug!("Moving [[{note}]] from '{current}' to '{section}'");
        continue;
      }
    }
    lines.push(line);
  }

  if present {
    return lines.join("\n");
  }

  let entry = format!("- [[{note}]] {}", date.trim());
  let entry = entry.trim_end();

  let heading = lines
    .iter()
    .position(|l| section_title(l) == Some(section))
    .or_else(|| lines.iter().position(|l| section_title(l) == Some(INBOX_SECTION)));

  let mut out: Vec<&str> = lines;
  if let Some(idx) = heading {
    out.insert(idx + 1, entry);
  } else {
    let trailing_newline = out.last().is_some_and(|l| l.is_empty());
    while out.last().is_some_and(|l| l.trim().is_empty()) {
      out.pop();
    }
    let heading = format!("## {section}");
    let mut text = out.join("\n");
    if !text.is_empty() {
      text.push_str("\n\n");
    }
    text.push_str(&heading);
    text.push('\n');
    text.push_str(entry);
    if trailing_newline {
      text.push('\n');
    }
    return text;
  }
  out.join("\n")
}

/// Remove every link line for `note` from the dashboard.
#[must_use]
pub fn remove_dashboard_link(content: &str, note: &str) -> String {
  let note = clean_note_name(note);
  content
    .split('\n')
    .filter(|line| !is_link_line(line.trim(), &note))
    .collect::<Vec<_>>()
    .join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{resolver::PathResolver, store::MemoryStore};

  fn names(section: &DashboardSection) -> Vec<&str> {
    section.notes.iter().map(|n| n.name.as_str()).collect()
  }

  #[test]
  fn test_extract_sections_and_dates() {
    let sections = extract_sectioned_links(
      "Intro text\n\n## Reading\n- [[Book A]] 2024-01-01\n- [[Book B.md|B]] 2023-06-01\n- [[Book A]] again\n",
    );
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Reading");
    assert_eq!(sections[0].links.len(), 2);
    assert_eq!(sections[0].links[0].manual_date.as_deref(), Some("2024-01-01"));
    assert_eq!(sections[0].links[1].name, "Book B");
  }

  #[test]
  fn test_general_section_kept_only_with_links() {
    let sections = extract_sectioned_links("[[Loose]]\n## Later\n[[Other]]");
    assert_eq!(sections[0].title, GENERAL_SECTION);
    assert_eq!(sections[0].links[0].manual_date, None);
    assert_eq!(sections[1].title, "Later");
  }

  #[test]
  fn test_parse_dates() {
    assert_eq!(parse_date_millis("1970-01-02"), Some(86_400_000));
    assert_eq!(parse_date_millis("1970-01-01 00:01"), Some(60_000));
    assert_eq!(parse_date_millis("1970-01-01T00:00:01Z"), Some(1000));
    assert_eq!(parse_date_millis("1970-01-02 (reread)"), Some(86_400_000));
    assert_eq!(parse_date_millis("someday"), None);
  }

  #[test]
  fn test_manual_date_orders_section() {
    let store = MemoryStore::new()
      .with("Book A", "a")
      .with("Book B", "b")
      .with("_Dashboard", "## Reading\n[[Book B]] 2023-06-01\n[[Book A]] 2024-01-01");
    let resolver = PathResolver::default();
    let sections =
      load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());

    assert_eq!(sections.len(), 1);
    assert_eq!(names(&sections[0]), ["Book A", "Book B"]);
    assert_eq!(sections[0].count, 2);
  }

  #[test]
  fn test_sort_key_falls_through() {
    let store = MemoryStore::new()
      .with("Dated", "---\ndate: 2020-01-01\n---\n")
      .with("Registered", "x");
    let registry = FileRegistry::new(vec!["Registered.md".into(), "Other.md".into()]);
    let resolver = PathResolver::default();
    let loader = DashboardLoader::new(&store, &resolver).with_registry(Some(&registry));

    let dated = loader.resolve_note("Dated", Some("not a date")).expect("resolves");
    assert_eq!(dated.sort_key, parse_date_millis("2020-01-01").expect("valid date"));
    assert_eq!(dated.date.as_deref(), Some("not a date"));

    let registered = loader.resolve_note("Registered", None).expect("resolves");
    assert_eq!(registered.sort_key, 2);
    assert_eq!(registered.path, "/posts/Registered");

    assert!(loader.resolve_note("Missing", None).is_none());
  }

  #[test]
  fn test_card_defaults() {
    let store = MemoryStore::new().with("_draft_note", "");
    let resolver = PathResolver::default();
    let note = DashboardLoader::new(&store, &resolver)
      .resolve_note("_draft_note.md", None)
      .expect("resolves");
    assert_eq!(note.title, "Draft note");
    assert_eq!(note.description, NO_DESCRIPTION);
    assert_eq!(note.file, "_draft_note.md");
  }

  #[test]
  fn test_auto_discovery_appears_once() {
    let store = MemoryStore::new()
      .with("Listed", "x")
      .with("Video", "---\ntype: youtube\n---\nhttps://youtu.be/dQw4w9WgXcQ")
      .with("Thumb", "![v](https://www.youtube.com/watch?v=dQw4w9WgXcQ)")
      .with("Plain", "text")
      .with("_Dashboard", "## Main\n- [[Listed]]\n");
    let registry = FileRegistry::new(vec![
      "Plain.md".into(),
      "Listed.md".into(),
      "Video.md".into(),
      "Thumb.md".into(),
    ]);
    let resolver = PathResolver::default();
    let sections = load_sectioned_dashboard(
      &store,
      &resolver,
      "_Dashboard",
      Some(&registry),
      &AutoDiscoveryPolicy::default(),
    );

    let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["Main", "YouTube", "Others"]);
    assert_eq!(names(&sections[1]), ["Video", "Thumb"]);
    assert_eq!(names(&sections[2]), ["Plain"]);

    let total: usize = sections.iter().map(|s| s.count).sum();
    assert_eq!(total, 4);
  }

  #[test]
  fn test_loosely_spelled_links_are_not_rediscovered() {
    let store = MemoryStore::new()
      .with("Book_A", "underscored on disk")
      .with("Listed", "capitalized on disk")
      .with("_Dashboard", "## Reading\n- [[Book A]]\n- [[listed]]\n");
    let registry = FileRegistry::new(vec!["Book_A.md".into(), "Listed.md".into()]);
    let resolver = PathResolver::default();
    let sections = load_sectioned_dashboard(
      &store,
      &resolver,
      "_Dashboard",
      Some(&registry),
      &AutoDiscoveryPolicy::default(),
    );

    assert_eq!(sections.len(), 1);
    assert_eq!(names(&sections[0]), ["Book A", "listed"]);
    assert_eq!(sections[0].notes[0].sort_key, 2);
  }

  #[test]
  fn test_heuristic_off_and_merge() {
    let store = MemoryStore::new()
      .with("Thumb", "![v](https://youtu.be/dQw4w9WgXcQ)")
      .with("Video", "---\ntype: youtube\n---\n")
      .with("Kept", "x")
      .with("_Dashboard", "## YouTube\n[[Kept]]");
    let registry = FileRegistry::new(vec!["Thumb.md".into(), "Video.md".into(), "Kept.md".into()]);
    let resolver = PathResolver::default();
    let policy = AutoDiscoveryPolicy {
      youtube_thumbnail_heuristic: false,
      merge_into_explicit: true,
      ..AutoDiscoveryPolicy::default()
    };
    let sections =
      load_sectioned_dashboard(&store, &resolver, "_Dashboard", Some(&registry), &policy);

    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].title, "YouTube");
    assert_eq!(sections[0].count, 2);
    assert_eq!(names(&sections[1]), ["Thumb"]);
  }

  #[test]
  fn test_missing_dashboard_is_empty() {
    let store = MemoryStore::new();
    let resolver = PathResolver::default();
    let registry = FileRegistry::new(vec!["A.md".into()]);
    assert!(
      load_sectioned_dashboard(&store, &resolver, "_Dashboard", Some(&registry), &AutoDiscoveryPolicy::default())
        .is_empty()
    );
  }

  #[test]
  fn test_filter_sections() {
    let store = MemoryStore::new()
      .with("Rust", "---\ntags: [lang]\n---\nSystems programming")
      .with("Cooking", "---\ntags: [food]\n---\nPasta")
      .with("_Dashboard", "## A\n[[Rust]]\n## B\n[[Cooking]]");
    let resolver = PathResolver::default();
    let sections =
      load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());

    let by_query = filter_sections(sections.clone(), "SYSTEMS", &[]);
    assert_eq!(by_query.len(), 1);
    assert_eq!(by_query[0].title, "A");

    let by_tag = filter_sections(sections.clone(), "", &["#Food".to_string()]);
    assert_eq!(names(&by_tag[0]), ["Cooking"]);

    assert_eq!(filter_sections(sections, "", &[]).len(), 2);
  }

  #[test]
  fn test_upsert_inserts_under_heading() {
    let out = upsert_dashboard_link("## YouTube\n- [[Old]] 2024-01-01\n", "New.md", "2024-02-01", "YouTube");
    assert_eq!(out, "## YouTube\n- [[New]] 2024-02-01\n- [[Old]] 2024-01-01\n");
  }

  #[test]
  fn test_upsert_falls_back_to_inbox_then_appends() {
    let out = upsert_dashboard_link("## Inbox\n", "Note", "2024-02-01", "Reading");
    assert_eq!(out, "## Inbox\n- [[Note]] 2024-02-01\n");

    let out = upsert_dashboard_link("# Home\n", "Note", "", "Reading");
    assert_eq!(out, "# Home\n\n## Reading\n- [[Note]]\n");
  }

  #[test]
  fn test_upsert_moves_between_sections() {
    let content = "## Inbox\n- [[Note|alias]] 2024-01-01\n## YouTube\n";
    let out = upsert_dashboard_link(content, "Note", "2024-02-01", "YouTube");
    assert_eq!(out, "## Inbox\n## YouTube\n- [[Note]] 2024-02-01\n");

    assert_eq!(upsert_dashboard_link(&out, "Note", "2025-01-01", "YouTube"), out);
  }

  #[test]
  fn test_upsert_does_not_match_prefix_names() {
    let out = upsert_dashboard_link("## Inbox\n- [[Notebook]]", "Note", "d", "Inbox");
    assert_eq!(out, "## Inbox\n- [[Note]] d\n- [[Notebook]]");
  }

  #[test]
  fn test_remove_link() {
    let out = remove_dashboard_link("## A\n- [[Gone]] 2024\n- [[Stay]]\n  - [[Gone|x]]", "Gone");
    assert_eq!(out, "## A\n- [[Stay]]");
  }
}
