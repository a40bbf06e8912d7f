use std::{
  fs,
  io::{self, Write},
  path::Path,
};

use color_eyre::eyre::{Context, Result, bail, eyre};
use log::{LevelFilter, info, warn};
use serde::Serialize;
use sharepage_markdown::{
  ContentStore,
  DashboardLoader,
  FileRegistry,
  NoteKind,
  filter_sections,
  parse_frontmatter,
  remove_dashboard_link,
  store::note_file_name,
  upsert_dashboard_link,
};

mod cli;
mod config;
mod publish;

use cli::{Cli, Commands, DashboardAction};
use config::Config;
use publish::Publisher;

fn main() -> Result<()> {
  color_eyre::install()?;

  // Parse command line arguments
  let cli = Cli::parse_args();

  // Initialize logging first so we can log during command handling
  env_logger::Builder::new()
    .filter_level(if cli.verbose {
      LevelFilter::Debug
    } else {
      LevelFilter::Info
    })
    .write_style(env_logger::WriteStyle::Always)
    .init();

  let Some(command) = &cli.command else {
    bail!("No command given. Run `sharepage --help` for usage.");
  };

  if let Commands::Init { output, force } = command {
    return init_config(output, *force);
  }

  let config = Config::load(&cli).wrap_err("Failed to load configuration")?;

  match command {
    Commands::Render { note, html_only } => {
      config.validate()?;
      let doc = config
        .processor()
        .load_document(&config.store(), note)
        .wrap_err_with(|| format!("Failed to render {note}"))?;

      if *html_only {
        print_text(&doc.html)
      } else {
        print_json(&doc)
      }
    },

    Commands::Metadata { note } => {
      config.validate()?;
      let doc = config
        .processor()
        .load_document(&config.store(), note)
        .wrap_err_with(|| format!("Failed to read metadata of {note}"))?;
      print_json(&doc.metadata)
    },

    Commands::Dashboard {
      action,
      query,
      tags,
    } => {
      config.validate()?;
      match action {
        Some(DashboardAction::Add {
          note,
          date,
          section,
        }) => add_to_dashboard(&config, note, date.as_deref(), section.as_deref()),
        Some(DashboardAction::Remove { note }) => {
          edit_dashboard(&config, |content| remove_dashboard_link(content, note))
        },
        None => {
          let registry = config.registry();
          let store = config.store();
          let resolver = config.resolver();
          let sections = DashboardLoader::new(&store, &resolver)
            .with_registry(registry.as_ref())
            .with_policy(config.auto_discovery.clone())
            .load(&config.dashboard);

          print_json(&filter_sections(
            sections,
            query.as_deref().unwrap_or_default(),
            tags,
          ))
        },
      }
    },

    Commands::Publish { notes, .. } => {
      config.validate()?;
      publish_site(&config, notes)
    },

    Commands::Css { .. } => {
      let processor = config.processor();
      let Some(manager) = processor.syntax_manager() else {
        bail!("Syntax highlighting is disabled, there is no stylesheet to print");
      };
      let css = manager
        .stylesheet(config.highlight_theme.as_deref())
        .wrap_err("Failed to generate the highlighting stylesheet")?;
      print_text(&css)
    },

    Commands::Index { write } => {
      config.validate()?;
      let Some(registry) = FileRegistry::discover(&config.notes_dir) else {
        bail!("Cannot index {}", config.notes_dir.display());
      };
      let json = registry.to_json()?;

      if *write {
        let path = config.registry_path();
        fs::write(&path, json)
          .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
        info!("Indexed {} notes into {}", registry.len(), path.display());
        Ok(())
      } else {
        print_text(&json)
      }
    },

    Commands::Init { .. } => Ok(()),
  }
}

fn init_config(output: &Path, force: bool) -> Result<()> {
  // Check if file already exists and that we're not forcing overwrite
  if output.exists() && !force {
    bail!(
      "Configuration file already exists: {}. Use --force to overwrite.",
      output.display()
    );
  }

  // Create parent directories if needed
  if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
    if !parent.exists() {
      fs::create_dir_all(parent).wrap_err_with(|| {
        format!("Failed to create directory: {}", parent.display())
      })?;
      info!("Created directory: {}", parent.display());
    }
  }

  Config::generate_default_config(output).wrap_err_with(|| {
    format!("Failed to generate configuration file: {}", output.display())
  })?;

  info!("Configuration file created successfully. Edit it to describe your site.");
  Ok(())
}

/// Render the requested notes, or every registered note, plus the
/// dashboard pages and the highlighting stylesheet.
fn publish_site(config: &Config, notes: &[String]) -> Result<()> {
  info!("Publishing to {}", config.output_dir.display());

  let registry = config.registry();
  let names = if notes.is_empty() {
    registry
      .as_ref()
      .map(publish::registered_notes)
      .unwrap_or_default()
  } else {
    notes.to_vec()
  };

  let publisher = Publisher::new(config).map_err(|e| eyre!("{e:#}"))?;
  let report = publisher.publish_notes(&names);
  publisher
    .publish_dashboard(registry.as_ref())
    .map_err(|e| eyre!("{e:#}"))?;
  if let Some(path) = publisher
    .publish_stylesheet()
    .map_err(|e| eyre!("{e:#}"))?
  {
    info!("Wrote {}", path.display());
  }

  info!(
    "Published {} of {} notes in {}",
    report.written.len(),
    names.len(),
    config.output_dir.display()
  );

  if !report.failed.is_empty() {
    bail!("{} notes failed to publish", report.failed.len());
  }
  Ok(())
}

/// Link `note` from the dashboard, under `section` or the section its kind
/// belongs to.
fn add_to_dashboard(
  config: &Config,
  note: &str,
  date: Option<&str>,
  section: Option<&str>,
) -> Result<()> {
  let store = config.store();
  let raw = store
    .fetch(note)
    .wrap_err_with(|| format!("Cannot link {note}"))?;
  let kind = NoteKind::classify(&parse_frontmatter(&raw));

  let today = jiff::Zoned::now().date().to_string();
  let date = date.unwrap_or(&today);
  let section = section.unwrap_or_else(|| kind.section());

  edit_dashboard(config, |content| {
    upsert_dashboard_link(content, note, date, section)
  })?;
  info!("Linked {note} under ## {section}");
  Ok(())
}

/// Apply `edit` to the dashboard note, creating it when missing.
fn edit_dashboard(
  config: &Config,
  edit: impl FnOnce(&str) -> String,
) -> Result<()> {
  let path = config.notes_dir.join(note_file_name(&config.dashboard));
  let content = match fs::read_to_string(&path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => {
      warn!("Creating missing dashboard {}", path.display());
      String::new()
    },
    other => {
      other.wrap_err_with(|| format!("Failed to read {}", path.display()))?
    },
  };

  let updated = edit(&content);
  if updated == content {
    info!("Dashboard already up to date");
    return Ok(());
  }

  fs::write(&path, updated)
    .wrap_err_with(|| format!("Failed to write {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value)?;
  print_text(&json)
}

fn print_text(text: &str) -> Result<()> {
  let mut stdout = io::stdout().lock();
  writeln!(stdout, "{text}")?;
  Ok(())
}
