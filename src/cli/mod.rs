//! # Command-Line Interface
//!
//! `fixproj [OPTIONS] [PATH]` normalizes a single project file in place.
//!
//! ## Steps
//!
//! | Step | Disabled by |
//! |------|-------------|
//! | Remove duplicate items | `--keep-duplicates` |
//! | Remove items whose file is missing | `--keep-missing` |
//! | Merge item groups per item type, sorted | `--no-sort` (merge still happens) |
//! | Sort property groups | `--no-sort-properties` |
//!
//! ## Output Formats
//!
//! `--format text` (default) prints a one-line summary; `--format json`
//! prints a single object with the path, the change list and whether the
//! file was written.
//!
//! ## Verbose Mode
//!
//! `--verbose` (or `-v`) lists every change on stdout and prints debug
//! lines on stderr:
//! ```bash
//! fixproj --verbose src/App/App.csproj
//! ```

mod app;
mod output;

pub use app::{execute, run, Cli};
pub use output::{Output, OutputFormat};
