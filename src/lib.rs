//! fixproj - normalizes MSBuild project files
//!
//! Removes duplicate item entries, prunes references to files that no
//! longer exist, merges item groups per item type (optionally sorted) and
//! orders property groups deterministically.

pub mod domain;
pub mod storage;
pub mod cli;

pub use domain::{
    ChangeLog, Document, Element, ItemGroupEntity, OperateOnProjectFiles, ProjectFileProcessor,
};
