use std::fs;

use sharepage_markdown::{
  AutoDiscoveryPolicy,
  CachedStore,
  ContentStore,
  DashboardLoader,
  FileRegistry,
  FsContentStore,
  MemoryStore,
  NoteKind,
  PathResolver,
  load_sectioned_dashboard,
  upsert_dashboard_link,
};

#[test]
fn test_reading_section_orders_by_manual_date() {
  let store = MemoryStore::new()
    .with("Book A", "# A")
    .with("Book B", "# B")
    .with("_Dashboard", "## Reading\n[[Book A]] 2024-01-01\n[[Book B]] 2023-06-01");
  let resolver = PathResolver::default();

  let sections =
    load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());

  assert_eq!(sections.len(), 1);
  assert_eq!(sections[0].title, "Reading");
  let names: Vec<_> = sections[0].notes.iter().map(|n| n.name.as_str()).collect();
  assert_eq!(names, ["Book A", "Book B"]);
  assert_eq!(sections[0].notes[0].date.as_deref(), Some("2024-01-01"));
}

#[test]
fn test_unlisted_note_appears_exactly_once() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let root = dir.path();
  fs::write(root.join("_Dashboard.md"), "## Picks\n- [[Listed]]\n").expect("write dashboard");
  fs::write(root.join("Listed.md"), "---\ndate: 2024-03-01\n---\nListed body").expect("write note");
  fs::write(root.join("Unlisted.md"), "Unlisted body").expect("write note");
  fs::write(
    root.join("Clip.md"),
    "---\ntype: YouTube\nurl: https://youtu.be/dQw4w9WgXcQ\n---\n",
  )
  .expect("write note");

  let registry = FileRegistry::discover(root).expect("registry from directory");
  assert!(!registry.contains("_Dashboard"));
  assert_eq!(registry.len(), 3);

  let store = FsContentStore::new(root);
  let resolver = PathResolver::default();
  let sections = DashboardLoader::new(&store, &resolver)
    .with_registry(Some(&registry))
    .load("_Dashboard");

  let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, ["Picks", "YouTube", "Others"]);

  let everywhere: Vec<_> = sections
    .iter()
    .flat_map(|s| s.notes.iter().map(|n| n.name.as_str()))
    .collect();
  assert_eq!(everywhere.iter().filter(|n| **n == "Unlisted").count(), 1);
  assert_eq!(everywhere.iter().filter(|n| **n == "Listed").count(), 1);
  assert_eq!(sections[1].notes[0].kind, NoteKind::YouTube);
  assert_eq!(
    sections[1].notes[0].thumbnail.as_deref(),
    Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
  );
}

#[test]
fn test_loose_link_spelling_counts_as_listed() {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let root = dir.path();
  fs::write(root.join("_Dashboard.md"), "## Reading\n- [[Book A]]\n- [[listed]]\n")
    .expect("write dashboard");
  fs::write(root.join("Book_A.md"), "Underscored file").expect("write note");
  fs::write(root.join("Listed.md"), "Capitalized file").expect("write note");

  let registry = FileRegistry::discover(root).expect("registry from directory");
  let store = FsContentStore::new(root);
  let resolver = PathResolver::default();
  let sections = DashboardLoader::new(&store, &resolver)
    .with_registry(Some(&registry))
    .load("_Dashboard");

  let titles: Vec<_> = sections.iter().map(|s| s.title.as_str()).collect();
  assert_eq!(titles, ["Reading"]);
  assert_eq!(sections[0].count, 2);
}

#[test]
fn test_missing_notes_are_skipped() {
  let store = MemoryStore::new()
    .with("Here", "present")
    .with("_Dashboard", "## List\n[[Here]]\n[[Gone]]\n## Empty\n[[Also Gone]]");
  let resolver = PathResolver::default();

  let sections =
    load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());

  assert_eq!(sections.len(), 1);
  assert_eq!(sections[0].count, 1);
}

#[test]
fn test_cached_store_serves_dashboard_twice() {
  let store = CachedStore::new(MemoryStore::new().with("A", "a").with("_Dashboard", "[[A]]"));
  let resolver = PathResolver::default();

  let first =
    load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());
  let second =
    load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());

  assert_eq!(first, second);
  assert_eq!(first[0].title, "General");
  assert_eq!(store.len(), 2);
}

#[test]
fn test_upserted_link_is_loaded() {
  let dashboard = upsert_dashboard_link("## Inbox\n", "Fresh.md", "2025-05-05", NoteKind::Standard.section());
  let store = MemoryStore::new()
    .with("Fresh", "New note")
    .with("_Dashboard", dashboard);
  let resolver = PathResolver::default();

  assert!(store.fetch("fresh").is_ok());
  let sections =
    load_sectioned_dashboard(&store, &resolver, "_Dashboard", None, &AutoDiscoveryPolicy::default());
  assert_eq!(sections[0].title, "Inbox");
  assert_eq!(sections[0].notes[0].description, "New note");
}
