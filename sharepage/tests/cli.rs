use std::{fs, path::Path, process::Command};

fn sharepage(dir: &Path, args: &[&str]) -> std::process::Output {
  Command::new(env!("CARGO_BIN_EXE_sharepage"))
    .args(args)
    .current_dir(dir)
    .output()
    .expect("Failed to run sharepage")
}

fn vault() -> tempfile::TempDir {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let notes = dir.path().join("notes");
  fs::create_dir_all(&notes).expect("create notes dir");
  fs::write(
    notes.join("Rust Notes.md"),
    "---\ntags: [rust]\n---\n# Ownership\n\nBorrowing rules.",
  )
  .expect("write note");
  fs::write(
    notes.join("Talk.md"),
    "---\ntype: youtube\nurl: https://youtu.be/dQw4w9WgXcQ\n---\nA talk.",
  )
  .expect("write note");
  dir
}

#[test]
fn test_init_refuses_to_overwrite() {
  let dir = vault();

  let first = sharepage(dir.path(), &["init"]);
  assert!(first.status.success());
  assert!(dir.path().join("sharepage.toml").exists());

  let second = sharepage(dir.path(), &["init"]);
  assert!(!second.status.success());

  let forced = sharepage(dir.path(), &["init", "--force"]);
  assert!(forced.status.success());
}

#[test]
fn test_render_prints_document_json() {
  let dir = vault();

  let output = sharepage(dir.path(), &["render", "Rust Notes"]);
  assert!(output.status.success());

  let doc: serde_json::Value =
    serde_json::from_slice(&output.stdout).expect("render prints JSON");
  assert_eq!(doc["title"], "Rust Notes");
  assert_eq!(doc["tags"][0], "rust");
  assert_eq!(doc["headers"][0]["id"], "ownership");

  let html = sharepage(dir.path(), &["render", "Rust Notes", "--html-only"]);
  let html = String::from_utf8(html.stdout).expect("utf-8 output");
  assert!(html.contains("Borrowing rules."));
}

#[test]
fn test_render_missing_note_fails() {
  let dir = vault();
  let output = sharepage(dir.path(), &["render", "Nope"]);
  assert!(!output.status.success());
}

#[test]
fn test_dashboard_add_files_by_kind() {
  let dir = vault();
  fs::write(dir.path().join("notes/_Dashboard.md"), "## Inbox\n\n## YouTube\n")
    .expect("write dashboard");

  for note in ["Rust Notes", "Talk"] {
    let output = sharepage(dir.path(), &["dashboard", "add", note, "--date", "2025-01-02"]);
    assert!(output.status.success());
  }

  let dashboard =
    fs::read_to_string(dir.path().join("notes/_Dashboard.md")).expect("dashboard written");
  assert!(dashboard.contains("## Inbox\n- [[Rust Notes]] 2025-01-02"));
  assert!(dashboard.contains("## YouTube\n- [[Talk]] 2025-01-02"));

  let output = sharepage(dir.path(), &["dashboard", "--tag", "rust"]);
  let sections: serde_json::Value =
    serde_json::from_slice(&output.stdout).expect("dashboard prints JSON");
  assert_eq!(sections.as_array().map(Vec::len), Some(1));
  assert_eq!(sections[0]["notes"][0]["name"], "Rust Notes");
}

#[test]
fn test_publish_writes_pages() {
  let dir = vault();
  fs::write(
    dir.path().join("sharepage.toml"),
    "site_url = \"https://notes.example.com\"\nhighlight_code = false\n",
  )
  .expect("write config");

  let output = sharepage(dir.path(), &["publish", "--output", "site"]);
  assert!(output.status.success());

  let page = fs::read_to_string(dir.path().join("site/posts/Rust_Notes/index.html"))
    .expect("note page written");
  assert!(page.contains("https://notes.example.com/posts/Rust_Notes"));

  let talk = fs::read_to_string(dir.path().join("site/posts/Talk/index.html"))
    .expect("video page written");
  assert!(talk.contains("content=\"video.other\""));
  assert!(talk.contains("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg"));

  assert!(dir.path().join("site/index.html").exists());
  assert!(dir.path().join("site/404.html").exists());
}

#[test]
fn test_index_writes_registry() {
  let dir = vault();

  let output = sharepage(dir.path(), &["index", "--write"]);
  assert!(output.status.success());

  let json = fs::read_to_string(dir.path().join("notes/file_index.json"))
    .expect("registry written");
  let files: Vec<String> = serde_json::from_str(&json).expect("registry is a JSON array");
  assert_eq!(files.len(), 2);
  assert!(files.contains(&"Talk.md".to_string()));
}
