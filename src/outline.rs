//! Table-of-contents construction from a flat list of document headings.

use serde::Serialize;

/// Shown instead of a navigable list when a document has no headings
pub const EMPTY_OUTLINE_MESSAGE: &str = "No headings found in this document";

/// A heading found in the document, in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    /// Nesting depth, 1 (most significant) to 6
    pub level: u8,
    pub text: String,
    /// Anchor id, either written in the source (`{#id}`) or assigned on load
    pub id: Option<String>,
    /// Zero-based source line, used for scroll targeting
    pub line: usize,
}

impl HeadingRecord {
    pub fn new(level: u8, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            id: None,
            line: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// The id this heading is anchored at: its own, or `heading-<index>`
    pub fn anchor_id(&self, index: usize) -> String {
        self.id
            .clone()
            .unwrap_or_else(|| format!("heading-{}", index))
    }
}

/// One entry of the outline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutlineNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    fn new(id: String, label: String) -> Self {
        Self {
            id,
            label,
            children: Vec::new(),
        }
    }
}

/// The nested outline of a document. A forest: the first heading need not be
/// level 1 and top-level siblings are not merged under a synthetic root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Outline {
    pub nodes: Vec<OutlineNode>,
}

impl Outline {
    /// True when the document had no headings
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes in the whole forest
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Pre-order traversal, yielding `(depth, node)` in document order
    pub fn iter(&self) -> OutlineIter<'_> {
        OutlineIter {
            stack: self.nodes.iter().rev().map(|n| (0, n)).collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct OutlineIter<'a> {
    stack: Vec<(usize, &'a OutlineNode)>,
}

impl<'a> Iterator for OutlineIter<'a> {
    type Item = (usize, &'a OutlineNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

/// Write the fallback `heading-<index>` id into every heading that has none.
pub fn assign_anchor_ids(headings: &mut [HeadingRecord]) {
    for (index, heading) in headings.iter_mut().enumerate() {
        if heading.id.is_none() {
            heading.id = Some(format!("heading-{}", index));
        }
    }
}

/// Build the outline forest for `headings`.
///
/// A heading at level L nests under the most recently seen heading with a
/// level below L, or becomes a top-level entry if there is none. Skipped
/// levels do not produce intermediate nodes. Levels are trusted to be 1-6.
pub fn build_outline(headings: &[HeadingRecord]) -> Outline {
    let mut roots = Vec::new();
    // Open nodes from the root down to the last emitted heading. A node is
    // attached to its parent when it is closed, so sibling order holds.
    let mut open: Vec<(u8, OutlineNode)> = Vec::new();

    for (index, heading) in headings.iter().enumerate() {
        while open
            .last()
            .is_some_and(|(level, _)| *level >= heading.level)
        {
            if let Some((_, closed)) = open.pop() {
                attach(&mut open, &mut roots, closed);
            }
        }
        let node = OutlineNode::new(heading.anchor_id(index), heading.text.clone());
        open.push((heading.level, node));
    }

    while let Some((_, closed)) = open.pop() {
        attach(&mut open, &mut roots, closed);
    }

    Outline { nodes: roots }
}

fn attach(open: &mut [(u8, OutlineNode)], roots: &mut Vec<OutlineNode>, node: OutlineNode) {
    match open.last_mut() {
        Some((_, parent)) => parent.children.push(node),
        None => roots.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headings(levels: &[u8]) -> Vec<HeadingRecord> {
        levels
            .iter()
            .enumerate()
            .map(|(i, &level)| HeadingRecord::new(level, format!("Heading {}", i)))
            .collect()
    }

    fn ids(outline: &Outline) -> Vec<String> {
        outline.iter().map(|(_, n)| n.id.clone()).collect()
    }

    #[test]
    fn empty_input_gives_empty_outline() {
        let outline = build_outline(&[]);
        assert!(outline.is_empty());
        assert_eq!(outline.len(), 0);
    }

    #[test]
    fn monotonic_levels_form_a_chain() {
        let outline = build_outline(&headings(&[1, 2, 3]));
        assert_eq!(outline.nodes.len(), 1);
        let root = &outline.nodes[0];
        assert_eq!(root.id, "heading-0");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id, "heading-1");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[0].children[0].id, "heading-2");
        assert!(root.children[0].children[0].children.is_empty());
    }

    #[test]
    fn repeated_level_gives_siblings() {
        let outline = build_outline(&headings(&[2, 2, 2]));
        assert_eq!(outline.nodes.len(), 3);
        assert!(outline.nodes.iter().all(|n| n.children.is_empty()));
    }

    #[test]
    fn level_skip_does_not_nest_under_the_deeper_heading() {
        let outline = build_outline(&headings(&[1, 4, 2]));
        assert_eq!(outline.nodes.len(), 1);
        let root = &outline.nodes[0];
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].id, "heading-1");
        assert!(root.children[0].children.is_empty());
        assert_eq!(root.children[1].id, "heading-2");
    }

    #[test]
    fn first_heading_below_level_one_is_top_level() {
        let outline = build_outline(&headings(&[3, 1, 2]));
        assert_eq!(outline.nodes.len(), 2);
        assert_eq!(outline.nodes[0].id, "heading-0");
        assert_eq!(outline.nodes[1].id, "heading-1");
        assert_eq!(outline.nodes[1].children[0].id, "heading-2");
    }

    #[test]
    fn shallower_heading_pops_to_nearest_ancestor() {
        let outline = build_outline(&headings(&[1, 2, 3, 3, 2, 1]));
        assert_eq!(outline.nodes.len(), 2);
        let first = &outline.nodes[0];
        assert_eq!(first.children.len(), 2);
        assert_eq!(first.children[0].children.len(), 2);
        assert!(first.children[1].children.is_empty());
    }

    #[test]
    fn synthesized_ids_follow_input_order() {
        let input = headings(&[2, 4, 1, 6, 3, 3, 5, 1]);
        let outline = build_outline(&input);
        let expected: Vec<String> = (0..input.len()).map(|i| format!("heading-{}", i)).collect();
        assert_eq!(ids(&outline), expected);
        assert_eq!(outline.len(), input.len());
    }

    #[test]
    fn preorder_reproduces_input_order_for_many_shapes() {
        let shapes: &[&[u8]] = &[
            &[1],
            &[6, 5, 4, 3, 2, 1],
            &[1, 6, 1, 6],
            &[2, 3, 2, 3, 4, 1, 4],
            &[3, 3, 1, 2, 2, 5, 4, 6],
        ];
        for shape in shapes {
            let input = headings(shape);
            let outline = build_outline(&input);
            let labels: Vec<&str> = outline.iter().map(|(_, n)| n.label.as_str()).collect();
            let expected: Vec<&str> = input.iter().map(|h| h.text.as_str()).collect();
            assert_eq!(labels, expected, "shape {:?}", shape);
        }
    }

    #[test]
    fn existing_ids_are_kept_without_deduplication() {
        let input = vec![
            HeadingRecord::new(1, "Intro").with_id("intro"),
            HeadingRecord::new(2, "Details"),
            HeadingRecord::new(2, "Again").with_id("intro"),
        ];
        let outline = build_outline(&input);
        assert_eq!(ids(&outline), vec!["intro", "heading-1", "intro"]);
    }

    #[test]
    fn assign_anchor_ids_fills_only_missing_ids() {
        let mut input = vec![
            HeadingRecord::new(1, "A"),
            HeadingRecord::new(2, "B").with_id("custom"),
            HeadingRecord::new(2, "C"),
        ];
        assign_anchor_ids(&mut input);
        let assigned: Vec<_> = input.iter().map(|h| h.id.as_deref()).collect();
        assert_eq!(assigned, vec![Some("heading-0"), Some("custom"), Some("heading-2")]);
        // Building after assignment yields the same ids
        let outline = build_outline(&input);
        assert_eq!(ids(&outline), vec!["heading-0", "custom", "heading-2"]);
    }

    #[test]
    fn iter_reports_depth() {
        let outline = build_outline(&headings(&[1, 3, 2]));
        let depths: Vec<usize> = outline.iter().map(|(d, _)| d).collect();
        assert_eq!(depths, vec![0, 1, 1]);
    }

    #[test]
    fn json_omits_empty_children() {
        let outline = build_outline(&headings(&[1, 2]));
        let value: serde_json::Value = serde_json::from_str(&outline.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["id"], "heading-0");
        assert_eq!(value[0]["children"][0]["label"], "Heading 1");
        assert!(value[0]["children"][0].get("children").is_none());
    }
}
