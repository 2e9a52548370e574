//! # Storage Layer
//!
//! Everything that touches the filesystem on behalf of the processor.
//!
//! | Concern | Module | Notes |
//! |---------|--------|-------|
//! | XML text ⇄ [`Document`](crate::domain::Document) | `xml` | quick-xml reader/writer |
//! | Project file | `project` | locate, read, backup, atomic write |
//! | Settings | `config` | global `config.toml` + `.fixproj.toml` |
//!
//! ## Write Safety
//!
//! - The project file is read under a shared lock (`fs2`)
//! - Writes go to `<file>.tmp`, locked exclusively while written, then renamed
//!   over the project file
//! - BOM and CRLF line endings of the source file are preserved

mod config;
mod project;
pub mod xml;

pub use config::{Config, ConfigError, PROJECT_CONFIG_FILE};
pub use project::{LineEnding, ProjectError, ProjectFile};
pub use xml::XmlError;
