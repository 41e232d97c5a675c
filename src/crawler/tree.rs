use crate::context::SharedElement;

/// An element with its path-descendants nested beneath it.
#[derive(Debug, Clone)]
pub struct ElementNode {
    /// Key relative to the parent node.
    pub key: String,
    pub element: SharedElement,
    pub children: Vec<ElementNode>,
}

/// Nests flat dotted keys into a prefix tree whose siblings are ordered by key.
///
/// Keys whose ancestors are absent are placed at the shallowest level
/// that has a present ancestor.
pub fn build_element_tree(entries: impl IntoIterator<Item = (String, SharedElement)>) -> Vec<ElementNode> {
    let mut entries: Vec<_> = entries.into_iter().collect();
    // A prefix sorts before its extensions, so ancestors are inserted first
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));

    let mut roots = Vec::new();
    for (key, element) in entries {
        insert(&mut roots, &key, element);
    }
    roots
}

fn insert(nodes: &mut Vec<ElementNode>, key: &str, element: SharedElement) {
    for node in nodes.iter_mut() {
        if let Some(rest) = key
            .strip_prefix(node.key.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
        {
            insert(&mut node.children, rest, element);
            return;
        }
    }
    nodes.push(ElementNode {
        key: key.to_string(),
        element,
        children: Vec::new(),
    });
}
