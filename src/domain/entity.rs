//! Item groups viewed by item type
//!
//! A project may spread one item type (say `Compile`) over several physical
//! `ItemGroup` elements. [`ItemGroupEntity`] gathers every item of one type
//! in document order so the processor can reason about them together.

use super::document::Element;
use super::vocabulary::Vocabulary;

/// All items of a single item type, in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroupEntity {
    item_type: String,
    items: Vec<Element>,
}

impl ItemGroupEntity {
    /// Discovers every item type in the document, ordered by first appearance
    pub fn discover(root: &Element, vocabulary: &Vocabulary) -> Vec<ItemGroupEntity> {
        let mut entities: Vec<ItemGroupEntity> = Vec::new();

        for group in item_groups(root, vocabulary) {
            for item in group.elements() {
                let item_type = item.local_name();
                match entities.iter_mut().find(|e| e.item_type == item_type) {
                    Some(entity) => entity.items.push(item.clone()),
                    None => entities.push(ItemGroupEntity {
                        item_type: item_type.to_string(),
                        items: vec![item.clone()],
                    }),
                }
            }
        }

        entities
    }

    /// Collects the items of one type currently in the document
    pub fn collect(root: &Element, vocabulary: &Vocabulary, item_type: &str) -> Self {
        let items = item_groups(root, vocabulary)
            .into_iter()
            .flat_map(|group| group.elements())
            .filter(|item| item.local_name() == item_type)
            .cloned()
            .collect();

        Self {
            item_type: item_type.to_string(),
            items,
        }
    }

    /// Re-reads this entity's items after the document changed
    pub fn refresh(&mut self, root: &Element, vocabulary: &Vocabulary) {
        *self = Self::collect(root, vocabulary, &self.item_type);
    }

    /// The item type (local tag name) shared by every item
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Items in document order
    pub fn items(&self) -> &[Element] {
        &self.items
    }

    /// Include values in document order; `None` for items without one
    pub fn includes<'a>(&'a self, vocabulary: &Vocabulary) -> Vec<Option<&'a str>> {
        self.items
            .iter()
            .map(|item| item.attribute(&vocabulary.include))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Item groups in document order, skipping opaque containers
pub fn item_groups<'a>(root: &'a Element, vocabulary: &Vocabulary) -> Vec<&'a Element> {
    let mut groups = Vec::new();
    collect_groups(root, &vocabulary.item_group, vocabulary, &mut groups);
    groups
}

fn collect_groups<'a>(
    element: &'a Element,
    name: &str,
    vocabulary: &Vocabulary,
    groups: &mut Vec<&'a Element>,
) {
    for child in element.elements() {
        if child.local_name() == name {
            groups.push(child);
        } else if !vocabulary.is_opaque(child.local_name()) {
            collect_groups(child, name, vocabulary, groups);
        }
    }
}

/// Visits every container named `name` in document order with its ordinal.
///
/// Containers are not descended into, nor are opaque containers.
pub(crate) fn walk_containers_mut(
    element: &mut Element,
    name: &str,
    vocabulary: &Vocabulary,
    ordinal: &mut usize,
    visit: &mut dyn FnMut(usize, &mut Element),
) {
    for child in element.elements_mut() {
        if child.local_name() == name {
            visit(*ordinal, child);
            *ordinal += 1;
        } else if !vocabulary.is_opaque(child.local_name()) {
            walk_containers_mut(child, name, vocabulary, ordinal, visit);
        }
    }
}

/// Detaches containers named `name` whose ordinal satisfies `doomed`.
///
/// Ordinals are assigned exactly as [`walk_containers_mut`] assigns them.
pub(crate) fn remove_containers(
    element: &mut Element,
    name: &str,
    vocabulary: &Vocabulary,
    ordinal: &mut usize,
    doomed: &dyn Fn(usize) -> bool,
) {
    element.children.retain_mut(|node| {
        let Some(child) = node.as_element_mut() else {
            return true;
        };
        if child.local_name() == name {
            let current = *ordinal;
            *ordinal += 1;
            !doomed(current)
        } else {
            if !vocabulary.is_opaque(child.local_name()) {
                remove_containers(child, name, vocabulary, ordinal, doomed);
            }
            true
        }
    });
}
