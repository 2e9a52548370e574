//! Change log entries recorded while normalizing a project

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

/// One mutation performed on the document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A later item repeated an include value already seen
    DuplicateRemoved { item_type: String, include: String },

    /// An item pointed at a path that does not exist
    MissingFileRemoved { item_type: String, include: String },

    /// Several item groups holding one item type were collapsed into one
    GroupsMerged { item_type: String, groups: usize },

    /// Items of one type were reordered by include value
    ItemsSorted { item_type: String, items: usize },

    /// A property group's attributes or children were reordered
    PropertyGroupSorted { index: usize },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::DuplicateRemoved { item_type, include } => {
                write!(f, "Removed duplicate {} item: {}", item_type, include)
            }
            Change::MissingFileRemoved { item_type, include } => {
                write!(f, "Removed reference to missing file ({}): {}", item_type, include)
            }
            Change::GroupsMerged { item_type, groups } => {
                write!(f, "Merged {} item groups containing {} items", groups, item_type)
            }
            Change::ItemsSorted { item_type, items } => {
                write!(f, "Sorted {} {} items", items, item_type)
            }
            Change::PropertyGroupSorted { index } => {
                write!(f, "Sorted property group #{}", index + 1)
            }
        }
    }
}

/// Append-only record of changes for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChangeLog {
    entries: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a change
    pub fn push(&mut self, change: Change) {
        self.entries.push(change);
    }

    /// All changes in the order they were recorded
    pub fn entries(&self) -> &[Change] {
        &self.entries
    }

    /// Human-readable lines in recorded order
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(Change::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes one line per entry to `sink`
    pub fn write_to(&self, sink: &mut dyn Write) -> io::Result<()> {
        for change in &self.entries {
            writeln!(sink, "{}", change)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_include_value() {
        let change = Change::DuplicateRemoved {
            item_type: "Compile".to_string(),
            include: "A.cs".to_string(),
        };
        assert_eq!(change.to_string(), "Removed duplicate Compile item: A.cs");
    }

    #[test]
    fn write_to_preserves_order() {
        let mut log = ChangeLog::new();
        log.push(Change::GroupsMerged {
            item_type: "Content".to_string(),
            groups: 2,
        });
        log.push(Change::MissingFileRemoved {
            item_type: "Compile".to_string(),
            include: "Gone.cs".to_string(),
        });

        let mut out = Vec::new();
        log.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Merged 2 item groups containing Content items\n\
             Removed reference to missing file (Compile): Gone.cs\n"
        );
    }

    #[test]
    fn serializes_as_tagged_array() {
        let mut log = ChangeLog::new();
        log.push(Change::ItemsSorted {
            item_type: "None".to_string(),
            items: 3,
        });

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json[0]["kind"], "items_sorted");
        assert_eq!(json[0]["items"], 3);
    }
}
