//! Format-agnostic tree node model for explorable documents
//!
//! One node shape serves both grammars: the XML builder produces these
//! directly, and embedded CDATA documents become second trees hanging off
//! the hosting node. Paths are the addressing scheme shared with the
//! external patch collaborator, so their format never changes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Synthetic path segment under which an embedded document's tree is rooted.
pub const EMBEDDED_SEGMENT: &str = "[EMBEDDED]";

/// A single element in a parsed document tree.
///
/// `path` is unique within one tree: `parent_path + "/" + tag_name`, with
/// namespace prefixes kept verbatim (no normalization). A node carrying
/// `embedded_document` owns the raw text of a nested document found in its
/// character data; the parsed form is re-derived on demand, never stored,
/// so the outer and inner trees cannot share mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub direct_text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedded_document: Option<String>,
}

impl TreeNode {
    pub(crate) fn new(tag_name: &str, parent_path: &str) -> Self {
        let path = if parent_path.is_empty() {
            tag_name.to_string()
        } else {
            format!("{}/{}", parent_path, tag_name)
        };
        let namespace_prefix = tag_name
            .split_once(':')
            .map(|(prefix, _)| prefix.to_string());
        Self {
            tag_name: tag_name.to_string(),
            namespace_prefix,
            attributes: IndexMap::new(),
            direct_text: String::new(),
            children: Vec::new(),
            path,
            embedded_document: None,
        }
    }

    /// Tag name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.tag_name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.tag_name)
    }

    /// Parse the embedded document carried in this node's character data.
    ///
    /// Returns `None` when there is no embedded text or when it is not
    /// well-formed XML (not an error: the raw text stays retrievable via
    /// `embedded_document`). The tree is rebuilt from text on every call.
    pub fn embedded_tree(&self) -> Option<TreeNode> {
        let text = self.embedded_document.as_deref()?;
        let parent = format!("{}/{}", self.path, EMBEDDED_SEGMENT);
        crate::xml::parse_tree_at(text, &parent).ok()
    }

    /// Depth-first walk over this node and all descendants.
    ///
    /// Does not descend into embedded documents; those are separate trees.
    pub fn walk(&self) -> TreeWalk<'_> {
        TreeWalk { stack: vec![self] }
    }

    /// Find a descendant (or self) by exact path.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        self.walk().find(|node| node.path == path)
    }

    /// Paths of every node in the tree, in document order.
    pub fn all_paths(&self) -> Vec<String> {
        self.walk().map(|node| node.path.clone()).collect()
    }

    /// Nodes carrying an embedded document that parses as well-formed XML.
    pub fn embedded_hosts(&self) -> Vec<&TreeNode> {
        self.walk()
            .filter(|node| node.embedded_tree().is_some())
            .collect()
    }
}

/// Iterator returned by [`TreeNode::walk`].
pub struct TreeWalk<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for TreeWalk<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push in reverse so children come out in document order.
        for child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some(node)
    }
}
