//! Main CLI application structure

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use super::output::{Output, OutputFormat};
use crate::domain::{OperateOnProjectFiles, ProjectFileProcessor};
use crate::storage::{Config, ProjectFile};

#[derive(Parser, Debug)]
#[command(name = "fixproj")]
#[command(author, version, about = "Removes duplicate and dangling items from MSBuild project files and sorts them")]
pub struct Cli {
    /// Project file, or a directory containing exactly one
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(long, short = 'f', default_value = "text")]
    pub format: OutputFormat,

    /// List every change and print debug output
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Global configuration file to use instead of the default location
    #[arg(long, env = "FIXPROJ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep items in their original order
    #[arg(long)]
    pub no_sort: bool,

    /// Leave property groups as they are
    #[arg(long)]
    pub no_sort_properties: bool,

    /// Do not remove duplicate items
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Do not remove items whose files are missing
    #[arg(long)]
    pub keep_missing: bool,

    /// Report changes without writing the file
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Save a timestamped copy before overwriting
    #[arg(long)]
    pub backup: bool,

    /// Print the normalized project to stdout instead of writing it
    #[arg(long, conflicts_with_all = ["dry_run", "backup"])]
    pub stdout: bool,
}

impl Cli {
    /// Applies command-line switches on top of file configuration
    fn apply_to(&self, config: &mut Config) {
        if self.no_sort {
            config.sort_items = false;
        }
        if self.no_sort_properties {
            config.sort_properties = false;
        }
        if self.keep_duplicates {
            config.delete_duplicates = false;
        }
        if self.keep_missing {
            config.delete_missing = false;
        }
        if self.backup {
            config.backup = true;
        }
    }
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    execute(Cli::parse())
}

/// Runs the CLI with already-parsed arguments
pub fn execute(cli: Cli) -> Result<()> {
    let output = Output::new(cli.format, cli.verbose);

    output.verbose("fixproj starting");

    let config_dir = config_dir_for(&cli.path);
    let mut config = Config::load(&config_dir, cli.config.as_deref())?;
    cli.apply_to(&mut config);
    output.verbose_ctx("config", &format!("{:?}", config.fix_options()));

    let path = ProjectFile::locate(&cli.path, &config.extensions)?;
    output.verbose_ctx("load", &format!("Reading {}", path.display()));
    let (project, document) = ProjectFile::load(&path)?;

    let mut processor = ProjectFileProcessor::new(document, project.dir())
        .with_vocabulary(config.vocabulary.clone())
        .with_options(config.fix_options());

    let entities = processor.fix_content();
    output.verbose_ctx("fix", &format!("Processed {} item type(s)", entities.len()));

    if config.sort_properties {
        processor.sort_property_groups();
    }

    if output.is_verbose() && !output.is_json() {
        // The document goes to stdout with --stdout, so the log moves aside
        if cli.stdout {
            processor.verbose(&mut io::stderr())?;
        } else {
            processor.verbose(&mut io::stdout())?;
        }
    }

    let (document, changes) = processor.into_parts();
    let rendered = project.render(&document)?;
    let unchanged = project.is_unchanged(&rendered);

    if cli.stdout {
        io::stdout()
            .write_all(rendered.as_bytes())
            .context("Failed to write to stdout")?;
        return Ok(());
    }

    let mut backup = None;
    let written = !cli.dry_run && !unchanged;
    if written {
        if config.backup {
            let backup_path = project.backup()?;
            output.verbose_ctx("write", &format!("Backup saved to {}", backup_path.display()));
            backup = Some(backup_path);
        }
        project.write(&rendered)?;
        output.verbose_ctx("write", &format!("Wrote {}", project.path().display()));
    }

    if output.is_json() {
        output.data(&serde_json::json!({
            "path": project.path().display().to_string(),
            "changes": changes,
            "messages": changes.lines(),
            "written": written,
            "dry_run": cli.dry_run,
            "backup": backup.map(|p| p.display().to_string()),
        }));
        return Ok(());
    }

    if cli.dry_run && !output.is_verbose() {
        for line in changes.lines() {
            println!("{}", line);
        }
    }

    let summary = if unchanged {
        format!("No changes needed for {}", project.path().display())
    } else if cli.dry_run {
        format!(
            "Would fix {}: {} change(s)",
            project.path().display(),
            changes.len()
        )
    } else {
        format!("Fixed {}: {} change(s)", project.path().display(), changes.len())
    };
    output.success(&summary);

    output.verbose("Command completed successfully");
    Ok(())
}

/// Directory whose `.fixproj.toml` applies to `target`
fn config_dir_for(target: &Path) -> PathBuf {
    if target.is_dir() {
        return target.to_path_buf();
    }
    match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
