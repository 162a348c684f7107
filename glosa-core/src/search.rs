//! Search and expansion engine
//!
//! Substring search over a document tree plus the ancestor closure a
//! rendering layer needs to make every match visible. Both functions are
//! pure: the query input re-runs them on every keystroke, so any debouncing
//! belongs to the presentation layer, not here.

use crate::path::json;
use crate::tree::TreeNode;
use serde_json::Value;
use std::collections::BTreeSet;

/// Paths of every node matching `query` (case-insensitive substring over
/// tag name, direct text, attribute names and attribute values).
///
/// An empty query matches nothing. Embedded documents are separate trees
/// and are not searched; run `search` on [`TreeNode::embedded_tree`] output
/// to cover them.
pub fn search(tree: &TreeNode, query: &str) -> BTreeSet<String> {
    let mut matches = BTreeSet::new();
    if query.is_empty() {
        return matches;
    }
    let needle = query.to_lowercase();
    for node in tree.walk() {
        let hit = node.tag_name.to_lowercase().contains(&needle)
            || node.direct_text.to_lowercase().contains(&needle)
            || node.attributes.iter().any(|(name, value)| {
                name.to_lowercase().contains(&needle) || value.to_lowercase().contains(&needle)
            });
        if hit {
            matches.insert(node.path.clone());
        }
    }
    matches
}

/// Minimal set of container paths that must be expanded to reveal every
/// match: the prefix chain of each matched path.
pub fn expansion_closure(matches: &BTreeSet<String>) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    for path in matches {
        let mut current = path.as_str();
        while let Some(cut) = current.rfind('/') {
            current = &current[..cut];
            closure.insert(current.to_string());
        }
    }
    closure
}

/// JSON-side search: paths of members whose key or scalar value contains
/// `query` (case-insensitive).
pub fn search_json(value: &Value, query: &str) -> BTreeSet<String> {
    let mut matches = BTreeSet::new();
    if query.is_empty() {
        return matches;
    }
    let needle = query.to_lowercase();
    search_json_into(value, "", &needle, &mut matches);
    matches
}

fn search_json_into(value: &Value, path: &str, needle: &str, matches: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = json::append_key(path, key);
                if key.to_lowercase().contains(needle) {
                    matches.insert(child_path.clone());
                }
                search_json_into(child, &child_path, needle, matches);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                let child_path = json::append_index(path, index);
                search_json_into(child, &child_path, needle, matches);
            }
        }
        Value::String(s) => {
            if s.to_lowercase().contains(needle) {
                matches.insert(path.to_string());
            }
        }
        Value::Number(_) | Value::Bool(_) => {
            if value.to_string().to_lowercase().contains(needle) {
                matches.insert(path.to_string());
            }
        }
        Value::Null => {}
    }
}

/// Ancestor closure over JSON paths.
pub fn json_expansion_closure(matches: &BTreeSet<String>) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    for path in matches {
        let mut current = json::parent(path);
        while let Some(ancestor) = current {
            if ancestor.is_empty() {
                break;
            }
            current = json::parent(&ancestor);
            closure.insert(ancestor);
        }
    }
    closure
}

/// Which container nodes are currently open in an explorer.
///
/// Operator toggles and search-driven expansion are unioned, never
/// replaced: clearing the query leaves whatever the operator opened alone.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    pub fn toggle(&mut self, path: &str) {
        if !self.expanded.remove(path) {
            self.expanded.insert(path.to_string());
        }
    }

    pub fn expand_all(&mut self, tree: &TreeNode) {
        for node in tree.walk() {
            self.expanded.insert(node.path.clone());
        }
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Run a search and open everything needed to show the matches.
    ///
    /// Returns the match set. Matched paths themselves are opened too so
    /// their children are visible. An empty query opens nothing and
    /// collapses nothing.
    pub fn apply_search(&mut self, tree: &TreeNode, query: &str) -> BTreeSet<String> {
        let matches = search(tree, query);
        if !matches.is_empty() {
            self.expanded.extend(expansion_closure(&matches));
            self.expanded.extend(matches.iter().cloned());
        }
        matches
    }

    /// Jump to every node whose tag (with or without prefix) contains
    /// `tag_name`, replacing the current expansion with exactly the paths
    /// needed to show them.
    pub fn expand_to_tag(&mut self, tree: &TreeNode, tag_name: &str) {
        let needle = tag_name.to_lowercase();
        let mut matches = BTreeSet::new();
        for node in tree.walk() {
            if node.tag_name.to_lowercase().contains(&needle)
                || node.local_name().to_lowercase().contains(&needle)
            {
                matches.insert(node.path.clone());
            }
        }
        if !matches.is_empty() {
            let mut paths = expansion_closure(&matches);
            paths.extend(matches);
            self.expanded = paths;
        }
    }

    pub fn expanded_paths(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_tree;
    use serde_json::json;

    const DOC: &str = r#"<Invoice>
      <cac:Party>
        <cbc:ID schemeName="NIT">900123456</cbc:ID>
        <cac:PartyName><cbc:Name>Clinica Central</cbc:Name></cac:PartyName>
      </cac:Party>
      <cac:InvoiceLine><cbc:LineExtensionAmount currencyID="COP">1200</cbc:LineExtensionAmount></cac:InvoiceLine>
    </Invoice>"#;

    #[test]
    fn test_search_matches_tag_text_and_attributes() {
        let tree = parse_tree(DOC).unwrap();
        // tag name
        assert!(search(&tree, "partyname").contains("Invoice/cac:Party/cac:PartyName"));
        // direct text
        assert!(search(&tree, "clinica").contains("Invoice/cac:Party/cac:PartyName/cbc:Name"));
        // attribute name and value
        assert!(search(&tree, "schemename").contains("Invoice/cac:Party/cbc:ID"));
        assert!(search(&tree, "cop").contains("Invoice/cac:InvoiceLine/cbc:LineExtensionAmount"));
    }

    #[test]
    fn test_search_is_pure() {
        let tree = parse_tree(DOC).unwrap();
        assert_eq!(search(&tree, "party"), search(&tree, "party"));
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let tree = parse_tree(DOC).unwrap();
        assert!(search(&tree, "").is_empty());
    }

    #[test]
    fn test_closure_contains_every_ancestor_of_every_match() {
        let tree = parse_tree(DOC).unwrap();
        let matches = search(&tree, "900123456");
        let closure = expansion_closure(&matches);
        for path in &matches {
            let mut current = path.as_str();
            while let Some(cut) = current.rfind('/') {
                current = &current[..cut];
                assert!(closure.contains(current), "missing ancestor {}", current);
            }
        }
        assert!(closure.contains("Invoice"));
        assert!(closure.contains("Invoice/cac:Party"));
        // Unrelated subtrees stay out of the closure.
        assert!(!closure.contains("Invoice/cac:InvoiceLine"));
    }

    #[test]
    fn test_search_expansion_unions_with_manual_state() {
        let tree = parse_tree(DOC).unwrap();
        let mut state = ExpansionState::new();
        state.toggle("Invoice/cac:InvoiceLine");

        let matches = state.apply_search(&tree, "clinica");
        assert!(!matches.is_empty());
        assert!(state.is_expanded("Invoice/cac:Party"));
        // Manually opened node survives the search.
        assert!(state.is_expanded("Invoice/cac:InvoiceLine"));

        // Clearing the query must not force-collapse anything.
        let matches = state.apply_search(&tree, "");
        assert!(matches.is_empty());
        assert!(state.is_expanded("Invoice/cac:InvoiceLine"));
        assert!(state.is_expanded("Invoice/cac:Party"));
    }

    #[test]
    fn test_expand_to_tag_uses_local_name() {
        let tree = parse_tree(DOC).unwrap();
        let mut state = ExpansionState::new();
        state.expand_to_tag(&tree, "LineExtensionAmount");
        assert!(state.is_expanded("Invoice/cac:InvoiceLine"));
        assert!(state.is_expanded("Invoice"));
    }

    #[test]
    fn test_expand_and_collapse_all() {
        let tree = parse_tree(DOC).unwrap();
        let mut state = ExpansionState::new();
        state.expand_all(&tree);
        assert!(state.is_expanded("Invoice/cac:Party/cbc:ID"));
        state.collapse_all();
        assert!(!state.is_expanded("Invoice"));
    }

    #[test]
    fn test_search_json_matches_keys_and_values() {
        let doc = json!({
            "numFactura": "F-100",
            "usuarios": [{"tipoUsuario": "02", "vrServicio": 1200}]
        });
        let matches = search_json(&doc, "tipousuario");
        assert!(matches.contains("usuarios[0].tipoUsuario"));
        let matches = search_json(&doc, "f-100");
        assert!(matches.contains("numFactura"));
        let matches = search_json(&doc, "1200");
        assert!(matches.contains("usuarios[0].vrServicio"));
        assert!(search_json(&doc, "").is_empty());
    }

    #[test]
    fn test_json_closure_walks_parent_chain() {
        let mut matches = BTreeSet::new();
        matches.insert("usuarios[0].servicios.consultas[0].vrServicio".to_string());
        let closure = json_expansion_closure(&matches);
        assert!(closure.contains("usuarios[0].servicios.consultas[0]"));
        assert!(closure.contains("usuarios[0].servicios.consultas"));
        assert!(closure.contains("usuarios[0].servicios"));
        assert!(closure.contains("usuarios[0]"));
        assert!(closure.contains("usuarios"));
        assert!(!closure.contains(""));
    }
}
