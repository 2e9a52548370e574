//! Project file normalization pipeline
//!
//! [`ProjectFileProcessor`] owns a parsed [`Document`] for the duration of a
//! run and mutates it in place:
//!
//! 1. duplicate items are dropped (first occurrence wins)
//! 2. items pointing at missing files are dropped
//! 3. every item type is folded into a single item group, optionally sorted
//!
//! Property groups are sorted separately via
//! [`OperateOnProjectFiles::sort_property_groups`]. Every mutation is
//! recorded in a [`ChangeLog`].

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::change::{Change, ChangeLog};
use super::document::{Document, Element, Node};
use super::entity::{remove_containers, walk_containers_mut, ItemGroupEntity};
use super::sort::sort_element;
use super::vocabulary::Vocabulary;

/// Answers whether a resolved path exists
pub trait FileOracle {
    fn exists(&self, path: &Path) -> bool;
}

impl<F> FileOracle for F
where
    F: Fn(&Path) -> bool,
{
    fn exists(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Oracle backed by the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskOracle;

impl FileOracle for DiskOracle {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Operations on a loaded project file.
///
/// Implementors provide the item-group pipeline; output of the change log
/// and property-group sorting come with default bodies.
pub trait OperateOnProjectFiles {
    /// The document in its current state
    fn document(&self) -> &Document;

    fn document_mut(&mut self) -> &mut Document;

    fn vocabulary(&self) -> &Vocabulary;

    /// Every change recorded so far
    fn changes(&self) -> &ChangeLog;

    fn changes_mut(&mut self) -> &mut ChangeLog;

    /// Runs dedup, pruning and merge/sort for every item type
    fn fix_content(&mut self) -> Vec<ItemGroupEntity>;

    fn delete_duplicates(&mut self, entity: &mut ItemGroupEntity);

    fn delete_references_to_non_existent_files(&mut self, entity: &mut ItemGroupEntity);

    fn merge_and_sort_item_groups(&mut self, entity: &mut ItemGroupEntity, sort: bool);

    /// Writes the change log to `sink`, one entry per line
    fn verbose(&self, sink: &mut dyn Write) -> io::Result<()> {
        self.changes().write_to(sink)
    }

    /// Canonicalizes every property group
    fn sort_property_groups(&mut self) {
        let vocabulary = self.vocabulary().clone();
        let changes = sort_property_groups(&mut self.document_mut().root, &vocabulary);
        for change in changes {
            self.changes_mut().push(change);
        }
    }
}

/// Sorts each property group under `root` outside opaque containers
/// (`<Target>`), returning one change per group whose layout actually changed
pub fn sort_property_groups(root: &mut Element, vocabulary: &Vocabulary) -> Vec<Change> {
    let mut changes = Vec::new();
    let mut ordinal = 0;

    walk_containers_mut(
        root,
        &vocabulary.property_group,
        vocabulary,
        &mut ordinal,
        &mut |index, group| {
            let before = group.clone();
            sort_element(group);
            if *group != before {
                changes.push(Change::PropertyGroupSorted { index });
            }
        },
    );

    changes
}

/// Which pipeline steps [`ProjectFileProcessor::fix_content`] runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixOptions {
    pub delete_duplicates: bool,
    pub delete_missing: bool,
    pub sort_items: bool,
}

impl Default for FixOptions {
    fn default() -> Self {
        Self {
            delete_duplicates: true,
            delete_missing: true,
            sort_items: true,
        }
    }
}

/// Default processor over an owned document
pub struct ProjectFileProcessor<O = DiskOracle> {
    document: Document,
    base_dir: PathBuf,
    oracle: O,
    vocabulary: Vocabulary,
    options: FixOptions,
    changes: ChangeLog,
}

impl ProjectFileProcessor<DiskOracle> {
    /// Creates a processor that checks item paths on disk, relative to
    /// `base_dir` (the project file's directory)
    pub fn new(document: Document, base_dir: impl Into<PathBuf>) -> Self {
        Self::with_oracle(document, base_dir, DiskOracle)
    }
}

impl<O: FileOracle> ProjectFileProcessor<O> {
    /// Creates a processor with a custom existence oracle
    pub fn with_oracle(document: Document, base_dir: impl Into<PathBuf>, oracle: O) -> Self {
        Self {
            document,
            base_dir: base_dir.into(),
            oracle,
            vocabulary: Vocabulary::default(),
            options: FixOptions::default(),
            changes: ChangeLog::new(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_options(mut self, options: FixOptions) -> Self {
        self.options = options;
        self
    }

    /// Consumes the processor, returning the document and its change log
    pub fn into_parts(self) -> (Document, ChangeLog) {
        (self.document, self.changes)
    }

    /// Maps an include value to the path handed to the oracle, or `None`
    /// if the value cannot be checked with a plain filesystem lookup
    fn resolve(&self, include: &str) -> Option<PathBuf> {
        if !is_resolvable(include) {
            return None;
        }
        Some(self.base_dir.join(include.trim().replace('\\', "/")))
    }
}

/// Literal relative paths are resolvable; empty values, lists, wildcards and
/// `$(...)`, `@(...)`, `%(...)` placeholders are not
pub fn is_resolvable(include: &str) -> bool {
    let include = include.trim();
    !include.is_empty()
        && !include.contains(';')
        && !include.contains(['*', '?'])
        && !["$(", "@(", "%("].iter().any(|p| include.contains(p))
}

impl<O: FileOracle> OperateOnProjectFiles for ProjectFileProcessor<O> {
    fn document(&self) -> &Document {
        &self.document
    }

    fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    fn changes_mut(&mut self) -> &mut ChangeLog {
        &mut self.changes
    }

    fn fix_content(&mut self) -> Vec<ItemGroupEntity> {
        let mut entities = ItemGroupEntity::discover(&self.document.root, &self.vocabulary);

        for entity in &mut entities {
            if self.options.delete_duplicates {
                self.delete_duplicates(entity);
            }
            if self.options.delete_missing {
                self.delete_references_to_non_existent_files(entity);
            }
            self.merge_and_sort_item_groups(entity, self.options.sort_items);
        }

        entities
    }

    fn delete_duplicates(&mut self, entity: &mut ItemGroupEntity) {
        let item_type = entity.item_type().to_string();
        let include_name = self.vocabulary.include.clone();
        let mut seen: HashSet<String> = HashSet::new();
        let mut removed = Vec::new();

        retain_items(
            &mut self.document.root,
            &self.vocabulary,
            &item_type,
            &mut |item| {
                let Some(include) = item.attribute(&include_name) else {
                    return true;
                };
                if seen.insert(include.to_string()) {
                    true
                } else {
                    removed.push(include.to_string());
                    false
                }
            },
        );

        for include in removed {
            self.changes.push(Change::DuplicateRemoved {
                item_type: item_type.clone(),
                include,
            });
        }
        entity.refresh(&self.document.root, &self.vocabulary);
    }

    fn delete_references_to_non_existent_files(&mut self, entity: &mut ItemGroupEntity) {
        let item_type = entity.item_type().to_string();
        if !self.vocabulary.is_file_item(&item_type) {
            return;
        }

        // Resolve up front so the document can be borrowed mutably below
        let mut missing: HashSet<String> = HashSet::new();
        let mut checked: HashMap<PathBuf, bool> = HashMap::new();
        for include in entity.includes(&self.vocabulary).into_iter().flatten() {
            let Some(path) = self.resolve(include) else {
                continue;
            };
            let exists = *checked
                .entry(path)
                .or_insert_with_key(|path| self.oracle.exists(path));
            if !exists {
                missing.insert(include.to_string());
            }
        }

        if missing.is_empty() {
            return;
        }

        let include_name = self.vocabulary.include.clone();
        let mut removed = Vec::new();
        retain_items(
            &mut self.document.root,
            &self.vocabulary,
            &item_type,
            &mut |item| match item.attribute(&include_name) {
                Some(include) if missing.contains(include) => {
                    removed.push(include.to_string());
                    false
                }
                _ => true,
            },
        );

        for include in removed {
            self.changes.push(Change::MissingFileRemoved {
                item_type: item_type.clone(),
                include,
            });
        }
        entity.refresh(&self.document.root, &self.vocabulary);
    }

    fn merge_and_sort_item_groups(&mut self, entity: &mut ItemGroupEntity, sort: bool) {
        let item_type = entity.item_type().to_string();
        let item_group = self.vocabulary.item_group.clone();

        // Detach every item of this type, remembering where the first group
        // had its first one
        let mut moved: Vec<Element> = Vec::new();
        let mut holders: Vec<usize> = Vec::new();
        let mut insert_at = 0;
        let mut ordinal = 0;
        walk_containers_mut(
            &mut self.document.root,
            &item_group,
            &self.vocabulary,
            &mut ordinal,
            &mut |index, group| {
                let mut found = false;
                let mut kept = Vec::with_capacity(group.children.len());
                for node in std::mem::take(&mut group.children) {
                    match node {
                        Node::Element(item) if item.local_name() == item_type => {
                            if !found && holders.is_empty() {
                                insert_at = kept.len();
                            }
                            found = true;
                            moved.push(item);
                        }
                        other => kept.push(other),
                    }
                }
                group.children = kept;
                if found {
                    holders.push(index);
                }
            },
        );

        let Some(&target) = holders.first() else {
            return;
        };

        if sort {
            let include_name = &self.vocabulary.include;
            let mut indexed: Vec<(usize, Element)> = moved.into_iter().enumerate().collect();
            indexed.sort_by(|(_, a), (_, b)| {
                let key_a = a.attribute(include_name);
                let key_b = b.attribute(include_name);
                (key_a.is_none(), key_a).cmp(&(key_b.is_none(), key_b))
            });
            let reordered = indexed
                .iter()
                .enumerate()
                .any(|(position, (original, _))| position != *original);
            moved = indexed.into_iter().map(|(_, item)| item).collect();

            if reordered {
                self.changes.push(Change::ItemsSorted {
                    item_type: item_type.clone(),
                    items: moved.len(),
                });
            }
        }

        let mut ordinal = 0;
        let mut pending = Some(moved);
        walk_containers_mut(
            &mut self.document.root,
            &item_group,
            &self.vocabulary,
            &mut ordinal,
            &mut |index, group| {
                if index == target {
                    if let Some(items) = pending.take() {
                        let tail = group.children.split_off(insert_at);
                        group.children.extend(items.into_iter().map(Node::Element));
                        group.children.extend(tail);
                    }
                }
            },
        );

        if holders.len() > 1 {
            let emptied: HashSet<usize> = holders[1..].iter().copied().collect();
            let mut empty_now: HashSet<usize> = HashSet::new();
            let mut ordinal = 0;
            walk_containers_mut(
                &mut self.document.root,
                &item_group,
                &self.vocabulary,
                &mut ordinal,
                &mut |index, group| {
                    if emptied.contains(&index) && !group.has_elements() {
                        empty_now.insert(index);
                    }
                },
            );

            let mut ordinal = 0;
            remove_containers(
                &mut self.document.root,
                &item_group,
                &self.vocabulary,
                &mut ordinal,
                &|index| empty_now.contains(&index),
            );

            self.changes.push(Change::GroupsMerged {
                item_type: item_type.clone(),
                groups: holders.len(),
            });
        }

        entity.refresh(&self.document.root, &self.vocabulary);
    }
}

/// Drops items of `item_type` for which `keep` returns false, across every
/// item group in document order.
///
/// Groups left without child elements by a removal are deleted; groups that
/// were already empty stay.
fn retain_items(
    root: &mut Element,
    vocabulary: &Vocabulary,
    item_type: &str,
    keep: &mut dyn FnMut(&Element) -> bool,
) {
    let mut emptied: HashSet<usize> = HashSet::new();
    let mut ordinal = 0;
    walk_containers_mut(
        root,
        &vocabulary.item_group,
        vocabulary,
        &mut ordinal,
        &mut |index, group| {
            let before = group.children.len();
            group.children.retain(|node| match node {
                Node::Element(item) if item.local_name() == item_type => keep(item),
                _ => true,
            });
            if group.children.len() < before && !group.has_elements() {
                emptied.insert(index);
            }
        },
    );

    if emptied.is_empty() {
        return;
    }
    let mut ordinal = 0;
    remove_containers(
        root,
        &vocabulary.item_group,
        vocabulary,
        &mut ordinal,
        &|index| emptied.contains(&index),
    );
}
