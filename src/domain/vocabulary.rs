//! Tag and attribute spellings recognized by the processor

use serde::{Deserialize, Serialize};

/// Names the matching logic looks for. All comparisons are against local
/// (prefix-free) names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    /// Container element for item declarations
    pub item_group: String,

    /// Container element for build properties
    pub property_group: String,

    /// Attribute holding an item's referenced path
    pub include: String,

    /// Item types whose include value is not a file path (assembly names,
    /// package ids, GUIDs). These are never checked against the filesystem.
    pub non_file_items: Vec<String>,

    /// Elements whose contents are left untouched. Item and property groups
    /// inside a `Target` are evaluated at execution time, in order.
    pub opaque_containers: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            item_group: "ItemGroup".to_string(),
            property_group: "PropertyGroup".to_string(),
            include: "Include".to_string(),
            non_file_items: [
                "Reference",
                "PackageReference",
                "PackageVersion",
                "COMReference",
                "WebReferences",
                "Service",
                "BootstrapperPackage",
                "FrameworkReference",
                "InternalsVisibleTo",
                "Using",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            opaque_containers: vec!["Target".to_string()],
        }
    }
}

impl Vocabulary {
    /// Returns true if items of this type reference files on disk
    pub fn is_file_item(&self, item_type: &str) -> bool {
        !self.non_file_items.iter().any(|t| t == item_type)
    }

    /// Returns true if the element's subtree must not be touched
    pub fn is_opaque(&self, local_name: &str) -> bool {
        self.opaque_containers.iter().any(|c| c == local_name)
    }
}
