//! Deterministic recursive ordering of an element subtree

use super::document::{Element, Node};

/// Canonicalizes `element` in place, bottom-up.
///
/// Attributes are ordered by their `name="value"` form. If the element has
/// child elements, they are ordered by local name (stable for equal names),
/// each child is canonicalized before being re-attached, and the child
/// sequence is replaced by the sorted elements alone. An element without
/// child elements only gets its attributes sorted.
pub fn sort_element(element: &mut Element) {
    element
        .attributes
        .sort_by_cached_key(|attribute| attribute.to_string());

    if !element.has_elements() {
        return;
    }

    let mut children: Vec<Element> = std::mem::take(&mut element.children)
        .into_iter()
        .filter_map(Node::into_element)
        .collect();
    children.sort_by(|a, b| a.local_name().cmp(b.local_name()));

    for child in &mut children {
        sort_element(child);
    }

    element.children = children.into_iter().map(Node::Element).collect();
}

/// Returns true if `element` and every descendant already satisfy the
/// ordering produced by [`sort_element`]
pub fn is_sorted(element: &Element) -> bool {
    let attrs_sorted = element
        .attributes
        .windows(2)
        .all(|pair| pair[0].to_string() <= pair[1].to_string());

    let children: Vec<&Element> = element.elements().collect();
    let children_sorted = children
        .windows(2)
        .all(|pair| pair[0].local_name() <= pair[1].local_name());

    attrs_sorted && children_sorted && children.into_iter().all(is_sorted)
}
