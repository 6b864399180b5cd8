/*
 * Defines the tree model shared by the parser, the tree session and the panel.
 * A `Tree` is the hierarchy produced by the parser for one entry file. Every node
 * carries a stable `NodeId` and the panel's expanded/collapsed flag, so the flag can
 * be flipped in place and carried over when the parser re-derives the tree.
 * The serialized form is the root node itself, with camelCase field names.
 */
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

// Identifier of a node, unique within one tree and stable across re-derivations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        NodeId(id.to_string())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/*
 * A single node in the parsed hierarchy.
 * Only `id` and `name` are required on the wire; everything else defaults so that
 * parsers emitting a reduced node shape are still accepted.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub file_path: PathBuf,
    #[serde(default)]
    pub depth: u32,
    #[serde(default)]
    pub expanded: bool,
    #[serde(default)]
    pub third_party: bool,
    #[serde(default)]
    pub react_router: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /*
     * Creates a collapsed leaf node for `file_path`. The display file name is taken
     * from the last path component.
     */
    pub fn new(id: impl Into<NodeId>, name: impl Into<String>, file_path: PathBuf) -> Self {
        let file_name = display_name_of(&file_path);
        TreeNode {
            id: id.into(),
            name: name.into(),
            file_name,
            file_path,
            depth: 0,
            expanded: false,
            third_party: false,
            react_router: false,
            error: None,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<TreeNode>) -> Self {
        let child_depth = self.depth + 1;
        self.children = children
            .into_iter()
            .map(|mut child| {
                child.set_depth_recursive(child_depth);
                child
            })
            .collect();
        self
    }

    fn set_depth_recursive(&mut self, depth: u32) {
        self.depth = depth;
        for child in &mut self.children {
            child.set_depth_recursive(depth + 1);
        }
    }

    fn find<'a>(&'a self, id: &NodeId) -> Option<&'a TreeNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    fn find_mut<'a>(&'a mut self, id: &NodeId) -> Option<&'a mut TreeNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter_mut().find_map(|child| child.find_mut(id))
    }

    fn collect_expansion(&self, states: &mut HashMap<NodeId, bool>) {
        states.insert(self.id.clone(), self.expanded);
        for child in &self.children {
            child.collect_expansion(states);
        }
    }

    fn apply_expansion(&mut self, states: &HashMap<NodeId, bool>) -> usize {
        let mut applied = 0;
        if let Some(expanded) = states.get(&self.id) {
            self.expanded = *expanded;
            applied += 1;
        }
        for child in &mut self.children {
            applied += child.apply_expansion(states);
        }
        applied
    }

    fn references_file(&self, path: &Path) -> bool {
        self.file_path == path || self.children.iter().any(|c| c.references_file(path))
    }

    fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

// The hierarchy built by the parser for one entry file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    pub root: TreeNode,
}

impl Tree {
    pub fn new(root: TreeNode) -> Self {
        Tree { root }
    }

    pub fn find_node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.root.find(id)
    }

    /*
     * Sets the expanded flag of the node with the given id in place.
     * Returns `false` when no such node exists; the tree is left untouched then.
     */
    pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) -> bool {
        match self.root.find_mut(id) {
            Some(node) => {
                node.expanded = expanded;
                true
            }
            None => false,
        }
    }

    // True if the entry file or any descendant was built from `path`.
    pub fn references_file(&self, path: &Path) -> bool {
        self.root.references_file(path)
    }

    /*
     * Copies expanded flags from `previous` onto nodes of this tree that have the same
     * id. Nodes that are new in this tree keep the flag the parser gave them.
     * Returns the number of nodes whose flag was carried over.
     */
    pub fn carry_over_expansion(&mut self, previous: &Tree) -> usize {
        let mut states = HashMap::new();
        previous.root.collect_expansion(&mut states);
        self.root.apply_expansion(&states)
    }

    pub fn node_count(&self) -> usize {
        self.root.count()
    }
}

/*
 * Returns the short display name for a file: its final path component, or the whole
 * path text when there is none (e.g. a bare root).
 */
pub fn display_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
