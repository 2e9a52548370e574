//! Domain model for fixproj
//!
//! Contains the normalization logic without any I/O concerns. The document
//! arrives already parsed; the filesystem is only reached through a
//! [`FileOracle`].

mod change;
mod document;
mod entity;
mod processor;
mod sort;
mod vocabulary;

pub use change::{Change, ChangeLog};
pub use document::{local_name, Attribute, Declaration, Document, Element, Node};
pub use entity::{item_groups, ItemGroupEntity};
pub use processor::{
    is_resolvable, sort_property_groups, DiskOracle, FileOracle, FixOptions,
    OperateOnProjectFiles, ProjectFileProcessor,
};
pub use sort::{is_sorted, sort_element};
pub use vocabulary::Vocabulary;
