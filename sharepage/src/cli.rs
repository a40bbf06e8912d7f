use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line interface for sharepage
#[derive(Parser, Debug)]
#[command(
  author,
  version,
  about = "SharePage: publish Obsidian-flavored notes as pages and a dashboard"
)]
pub struct Cli {
  /// Subcommand to execute (see [`Commands`])
  #[command(subcommand)]
  pub command: Option<Commands>,

  /// Enable verbose debug logging
  #[arg(short, long, global = true)]
  pub verbose: bool,

  /// Path to the configuration file (TOML or JSON). Defaults to
  /// `sharepage.toml` in the current directory when it exists.
  #[arg(short = 'c', long = "config-file", global = true)]
  pub config_file: Option<PathBuf>,
}

/// All supported subcommands for the sharepage CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Render one note and print the result as JSON.
  Render {
    /// Note name, with or without the `.md` extension.
    note: String,

    /// Print only the HTML fragment.
    #[arg(long)]
    html_only: bool,
  },

  /// Print the preview metadata of one note as JSON.
  Metadata {
    /// Note name, with or without the `.md` extension.
    note: String,
  },

  /// Load the dashboard and print its sections as JSON.
  Dashboard {
    #[command(subcommand)]
    action: Option<DashboardAction>,

    /// Keep only notes whose title or description contains this text.
    #[arg(short, long)]
    query: Option<String>,

    /// Keep only notes carrying one of these tags (can be repeated).
    #[arg(short, long = "tag", action = clap::ArgAction::Append)]
    tags: Vec<String>,
  },

  /// Render notes into static pages with link-preview metadata.
  Publish {
    /// Notes to publish. Publishes every registered note when empty.
    notes: Vec<String>,

    /// Output directory for the generated pages.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Print the stylesheet for highlighted code blocks.
  Css {
    /// Highlighting theme. Defaults to the configured theme.
    #[arg(short, long)]
    theme: Option<String>,
  },

  /// Build the file registry from the notes directory.
  Index {
    /// Write the registry to the configured registry path instead of
    /// printing it.
    #[arg(short, long)]
    write: bool,
  },

  /// Initialize a new sharepage configuration file
  Init {
    /// Path to create the configuration file at
    #[arg(short, long, default_value = "sharepage.toml")]
    output: PathBuf,

    /// Force overwrite if file already exists
    #[arg(short, long)]
    force: bool,
  },
}

/// Changes to the dashboard note itself.
#[derive(Subcommand, Debug)]
pub enum DashboardAction {
  /// Add a link to a note, or move it to the right section.
  Add {
    /// Note to link.
    note: String,

    /// Date written after the link. Defaults to today.
    #[arg(short, long)]
    date: Option<String>,

    /// Section to file the note under. Defaults to the note's kind.
    #[arg(short, long)]
    section: Option<String>,
  },

  /// Remove every link to a note.
  Remove {
    /// Note to unlink.
    note: String,
  },
}

impl Cli {
  /// Parse command line arguments
  #[must_use]
  pub fn parse_args() -> Self {
    Self::parse()
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_is_well_formed() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_dashboard_add_parses() {
    let cli = Cli::parse_from([
      "sharepage",
      "-v",
      "dashboard",
      "add",
      "My Note",
      "--section",
      "Reading",
    ]);

    assert!(cli.verbose);
    assert!(matches!(
      cli.command,
      Some(Commands::Dashboard {
        action: Some(DashboardAction::Add { ref note, date: None, ref section }),
        ..
      }) if note == "My Note" && section.as_deref() == Some("Reading")
    ));
  }

  #[test]
  fn test_dashboard_filters_parse() {
    let cli = Cli::parse_from([
      "sharepage", "dashboard", "--tag", "rust", "--tag", "web", "-q", "guide",
    ]);

    assert!(matches!(
      cli.command,
      Some(Commands::Dashboard { action: None, ref query, ref tags })
        if query.as_deref() == Some("guide") && tags == &["rust", "web"]
    ));
  }
}
