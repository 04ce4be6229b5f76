//! Hierarchy and navigation trees.
//!
//! Both trees are arenas: nodes live in a `Vec` and refer to each other by
//! index, so parent links need no reference counting.
//!
//! ```text
//! 1 Setup                 depth 1          nodes[0]
//!   Step 1: download      depth 2            nodes[1]  parent 0
//!   Step 2: unpack        depth 2            nodes[2]  parent 0
//! 2 Usage                 depth 1          nodes[3]
//!   2.1 Flags             depth 2            nodes[4]  parent 3
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::headings::Heading;

/// A numbered or step element in the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    /// The element's line text.
    pub label: String,
    /// Nesting depth, 1 for top level.
    pub depth: usize,
    /// Byte offset of the element.
    pub position: usize,
    /// Parent node index.
    pub parent: Option<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
}

/// Tree of numbered and step elements keyed by nesting depth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyTree {
    /// All nodes in document order.
    pub nodes: Vec<HierarchyNode>,
    /// Indices of top-level nodes.
    pub roots: Vec<usize>,
    /// Deepest depth reached.
    pub max_depth: usize,
}

impl HierarchyTree {
    /// Whether the tree has more than one level.
    #[must_use]
    pub fn is_hierarchical(&self) -> bool {
        self.max_depth >= 2
    }

    /// Whether there are no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A heading in the navigation tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationNode {
    /// Heading text.
    pub title: String,
    /// Heading level.
    pub level: u8,
    /// Byte offset of the heading.
    pub position: usize,
    /// Parent node index.
    pub parent: Option<usize>,
    /// Child node indices.
    pub children: Vec<usize>,
}

/// Tree of headings by level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationTree {
    /// All nodes in document order.
    pub nodes: Vec<NavigationNode>,
    /// Indices of top-level nodes.
    pub roots: Vec<usize>,
}

impl NavigationTree {
    /// Path of titles from the root to node `index`.
    #[must_use]
    pub fn breadcrumb(&self, index: usize) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(index);
        while let Some(i) = current {
            let Some(node) = self.nodes.get(i) else { break };
            path.push(node.title.as_str());
            current = node.parent;
        }
        path.reverse();
        path
    }
}

static ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^([ \t]*)(?:(\d+(?:\.\d+)*)[.)]?[ \t]+\S|step[ \t]*\d+\b)[^\n]*$")
        .expect("hierarchy element pattern")
});

/// Columns of indentation per nesting level.
const INDENT_PER_LEVEL: usize = 2;

/// Build the hierarchy from numbered and step lines.
pub fn build_hierarchy(content: &str) -> HierarchyTree {
    let elements = ELEMENT.captures_iter(content).filter_map(|caps| {
        let whole = caps.get(0)?;
        let indent: usize = caps
            .get(1)
            .map_or(0, |m| m.as_str().chars().map(|c| if c == '\t' { 4 } else { 1 }).sum());
        let numbering_depth = caps.get(2).map_or(1, |m| m.as_str().split('.').count());
        Some((
            whole.as_str().trim().to_string(),
            numbering_depth + indent / INDENT_PER_LEVEL,
            whole.start(),
        ))
    });

    let mut tree = HierarchyTree::default();
    let mut stack: Vec<usize> = Vec::new();
    for (label, depth, position) in elements {
        while stack.last().is_some_and(|&top| tree.nodes[top].depth >= depth) {
            stack.pop();
        }
        let index = tree.nodes.len();
        let parent = stack.last().copied();
        match parent {
            Some(p) => tree.nodes[p].children.push(index),
            None => tree.roots.push(index),
        }
        tree.max_depth = tree.max_depth.max(depth);
        tree.nodes.push(HierarchyNode {
            label,
            depth,
            position,
            parent,
            children: Vec::new(),
        });
        stack.push(index);
    }
    tree
}

/// Build the navigation tree from sorted headings.
pub fn build_navigation(headings: &[Heading]) -> NavigationTree {
    let mut tree = NavigationTree::default();
    let mut stack: Vec<usize> = Vec::new();
    for heading in headings {
        while stack
            .last()
            .is_some_and(|&top| tree.nodes[top].level >= heading.level)
        {
            stack.pop();
        }
        let index = tree.nodes.len();
        let parent = stack.last().copied();
        match parent {
            Some(p) => tree.nodes[p].children.push(index),
            None => tree.roots.push(index),
        }
        tree.nodes.push(NavigationNode {
            title: heading.text.clone(),
            level: heading.level,
            position: heading.position,
            parent,
            children: Vec::new(),
        });
        stack.push(index);
    }
    tree
}
