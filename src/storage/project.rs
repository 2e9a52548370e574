//! Project file access
//!
//! Locates the project file, reads it (remembering BOM and line endings),
//! and writes the normalized result back atomically.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use fs2::FileExt;
use thiserror::Error;

use super::xml;
use crate::domain::Document;

const BOM: char = '\u{feff}';

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("No project file found in {0}")]
    NoProjectFile(PathBuf),

    #[error("Found {count} project files in {dir}; pass one explicitly")]
    Ambiguous { dir: PathBuf, count: usize },
}

/// Line terminator used by the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    /// Picks CRLF when most line breaks in `text` are CRLF
    pub fn detect(text: &str) -> Self {
        let total = text.matches('\n').count();
        let crlf = text.matches("\r\n").count();
        if total > 0 && crlf * 2 >= total {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        }
    }
}

/// A project file on disk and the text conventions it was read with
#[derive(Debug)]
pub struct ProjectFile {
    path: PathBuf,
    bom: bool,
    line_ending: LineEnding,
    original: String,
}

impl ProjectFile {
    /// Resolves `target` to a single project file.
    ///
    /// A file is taken as is. A directory must contain exactly one file with
    /// one of `extensions`.
    pub fn locate(target: &Path, extensions: &[String]) -> Result<PathBuf> {
        if target.is_file() {
            return Ok(target.to_path_buf());
        }
        if !target.is_dir() {
            return Err(ProjectError::NotFound(target.to_path_buf()).into());
        }

        let entries = fs::read_dir(target)
            .with_context(|| format!("Failed to read directory: {}", target.display()))?;

        let mut candidates = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to read directory: {}", target.display()))?
                .path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                .unwrap_or(false);
            if matches && path.is_file() {
                candidates.push(path);
            }
        }

        match candidates.len() {
            0 => Err(ProjectError::NoProjectFile(target.to_path_buf()).into()),
            1 => Ok(candidates.remove(0)),
            count => Err(ProjectError::Ambiguous {
                dir: target.to_path_buf(),
                count,
            }
            .into()),
        }
    }

    /// Reads and parses the project file
    pub fn load(path: impl Into<PathBuf>) -> Result<(Self, Document)> {
        let path = path.into();

        let file = File::open(&path)
            .with_context(|| format!("Failed to open project file: {}", path.display()))?;
        file.lock_shared()
            .context("Failed to acquire read lock on project file")?;
        let original = std::io::read_to_string(&file)
            .with_context(|| format!("Failed to read project file: {}", path.display()))?;
        drop(file);

        let bom = original.starts_with(BOM);
        let line_ending = LineEnding::detect(&original);
        let body = original.trim_start_matches(BOM).replace("\r\n", "\n");

        let document = xml::parse(&body)
            .with_context(|| format!("Failed to parse project file: {}", path.display()))?;

        let project = Self {
            path,
            bom,
            line_ending,
            original,
        };
        Ok((project, document))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory that item paths are relative to
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn has_bom(&self) -> bool {
        self.bom
    }

    /// Serializes `document` using the source file's BOM and line endings
    pub fn render(&self, document: &Document) -> Result<String> {
        let mut text = xml::to_string(document).context("Failed to serialize project file")?;
        if self.line_ending == LineEnding::CrLf {
            text = text.replace('\n', "\r\n");
        }
        if self.bom {
            text.insert(0, BOM);
        }
        Ok(text)
    }

    /// Returns true if writing `rendered` would leave the file as it was
    pub fn is_unchanged(&self, rendered: &str) -> bool {
        self.original == rendered
    }

    /// Copies the current file to `<name>.<timestamp>.bak` next to it
    pub fn backup(&self) -> Result<PathBuf> {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let backup_path = self.path.with_file_name(format!("{}.{}.bak", file_name, stamp));

        fs::write(&backup_path, &self.original)
            .with_context(|| format!("Failed to write backup: {}", backup_path.display()))?;

        Ok(backup_path)
    }

    /// Replaces the file contents with `rendered` (temp file + rename)
    pub fn write(&self, rendered: &str) -> Result<()> {
        let temp_path = self.temp_path();

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

            // Lock the temp file while it is being written
            file.lock_exclusive()
                .context("Failed to acquire write lock on temp file")?;

            let mut writer = BufWriter::new(&file);
            writer
                .write_all(rendered.as_bytes())
                .context("Failed to write project file")?;
            writer.flush().context("Failed to flush project file")?;
        }

        // Atomic rename
        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
