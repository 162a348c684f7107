//! Path codec for both document grammars
//!
//! Paths are the wire contract with the external analysis and patch
//! collaborators: whatever the explorers emit must be accepted unmodified
//! on re-submission, so neither encoding ever escapes or normalizes.
//!
//! - XML: `/`-joined tag names with verbatim namespace prefixes, e.g.
//!   `ext:UBLExtensions/ext:UBLExtension`. Sibling elements sharing a tag
//!   resolve to the first match; [`xml::check_unique`] flags the collision
//!   instead of silently adding positional indices.
//! - JSON: dotted member access plus bracket indices, e.g.
//!   `usuarios[0].tipoUsuario`. Keys containing `.` or `[` are flagged
//!   ambiguous, never escaped.

pub mod xml {
    use crate::error::GlosaError;
    use crate::tree::{TreeNode, EMBEDDED_SEGMENT};

    /// Resolve a path to a node, descending into embedded trees on
    /// `[EMBEDDED]` segments.
    ///
    /// Returns an owned node: embedded trees are re-derived from text, so
    /// there is nothing to borrow from. Sibling tag collisions resolve to
    /// the first match.
    pub fn resolve(root: &TreeNode, path: &str) -> crate::Result<TreeNode> {
        let mut segments = path.split('/');
        match segments.next() {
            Some(first) if first == root.tag_name => {}
            _ => return Err(not_found(path)),
        }

        let mut current = root.clone();
        while let Some(segment) = segments.next() {
            if segment == EMBEDDED_SEGMENT {
                let embedded = current.embedded_tree().ok_or_else(|| not_found(path))?;
                match segments.next() {
                    Some(tag) if tag == embedded.tag_name => current = embedded,
                    _ => return Err(not_found(path)),
                }
            } else {
                current = current
                    .children
                    .iter()
                    .find(|child| child.tag_name == segment)
                    .cloned()
                    .ok_or_else(|| not_found(path))?;
            }
        }
        Ok(current)
    }

    /// Fail with `AmbiguousPath` if any step of `path` selects among
    /// siblings that share a tag name.
    ///
    /// First-match resolution is kept for compatibility with the patch
    /// collaborator; this probe lets callers surface the collision so the
    /// operator can pick a different, unambiguous field.
    pub fn check_unique(root: &TreeNode, path: &str) -> crate::Result<()> {
        let mut segments = path.split('/');
        match segments.next() {
            Some(first) if first == root.tag_name => {}
            _ => return Err(not_found(path)),
        }

        let mut current = root.clone();
        while let Some(segment) = segments.next() {
            if segment == EMBEDDED_SEGMENT {
                let embedded = current.embedded_tree().ok_or_else(|| not_found(path))?;
                match segments.next() {
                    Some(tag) if tag == embedded.tag_name => current = embedded,
                    _ => return Err(not_found(path)),
                }
                continue;
            }
            let hits = current
                .children
                .iter()
                .filter(|child| child.tag_name == segment)
                .count();
            if hits > 1 {
                return Err(GlosaError::AmbiguousPath {
                    path: path.to_string(),
                    reason: format!("{} siblings share tag {}", hits, segment),
                });
            }
            current = current
                .children
                .iter()
                .find(|child| child.tag_name == segment)
                .cloned()
                .ok_or_else(|| not_found(path))?;
        }
        Ok(())
    }

    fn not_found(path: &str) -> GlosaError {
        GlosaError::PathNotFound(path.to_string())
    }
}

pub mod json {
    use crate::error::GlosaError;
    use serde_json::Value;

    /// One step of a parsed JSON path expression.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Segment {
        Key(String),
        Index(usize),
    }

    /// Append a member access to a path.
    pub fn append_key(path: &str, key: &str) -> String {
        if path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", path, key)
        }
    }

    /// Append an array index to a path.
    pub fn append_index(path: &str, index: usize) -> String {
        format!("{}[{}]", path, index)
    }

    /// Keys containing the path metacharacters cannot be addressed; they
    /// are flagged, not escaped.
    pub fn is_ambiguous_key(key: &str) -> bool {
        key.contains('.') || key.contains('[')
    }

    /// `AmbiguousPath` for a key [`is_ambiguous_key`] rejected.
    pub fn ambiguous_key(path: &str, key: &str) -> GlosaError {
        GlosaError::AmbiguousPath {
            path: append_key(path, key),
            reason: "object key contains a path metacharacter".to_string(),
        }
    }

    /// Parse a path expression into segments. The empty path is the root.
    pub fn parse(path: &str) -> crate::Result<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut rest = path;
        let mut leading = true;

        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix('[') {
                let close = after.find(']').ok_or_else(|| not_found(path))?;
                let index: usize = after[..close].parse().map_err(|_| not_found(path))?;
                segments.push(Segment::Index(index));
                rest = &after[close + 1..];
            } else {
                let rest_key = if leading {
                    rest
                } else {
                    rest.strip_prefix('.').ok_or_else(|| not_found(path))?
                };
                let end = rest_key
                    .find(['.', '['])
                    .unwrap_or(rest_key.len());
                if end == 0 {
                    return Err(not_found(path));
                }
                segments.push(Segment::Key(rest_key[..end].to_string()));
                rest = &rest_key[end..];
            }
            leading = false;
        }
        Ok(segments)
    }

    /// Resolve a path against a document snapshot; exactly one value or
    /// `PathNotFound`.
    pub fn resolve<'a>(value: &'a Value, path: &str) -> crate::Result<&'a Value> {
        let mut current = value;
        for segment in parse(path)? {
            current = match segment {
                Segment::Key(key) => current.get(&key),
                Segment::Index(index) => current.get(index),
            }
            .ok_or_else(|| not_found(path))?;
        }
        Ok(current)
    }

    /// The path of the immediate container of `path`, or `None` at the root.
    pub fn parent(path: &str) -> Option<String> {
        if path.is_empty() {
            return None;
        }
        let dot = path.rfind('.');
        let bracket = path.rfind('[');
        let cut = match (dot, bracket) {
            (Some(d), Some(b)) => d.max(b),
            (Some(d), None) => d,
            (None, Some(b)) => b,
            (None, None) => return Some(String::new()),
        };
        Some(path[..cut].to_string())
    }

    /// Every addressable path in the document, in document order.
    ///
    /// The walker that produces these is the same one the explorer uses,
    /// so `resolve(value, p)` succeeds for every returned `p` as long as
    /// the snapshot is unchanged.
    pub fn collect_paths(value: &Value) -> Vec<String> {
        let mut paths = Vec::new();
        collect_into(value, "", &mut paths);
        paths
    }

    fn collect_into(value: &Value, path: &str, paths: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    let child_path = append_key(path, key);
                    paths.push(child_path.clone());
                    collect_into(child, &child_path, paths);
                }
            }
            Value::Array(items) => {
                for (index, child) in items.iter().enumerate() {
                    let child_path = append_index(path, index);
                    paths.push(child_path.clone());
                    collect_into(child, &child_path, paths);
                }
            }
            _ => {}
        }
    }

    fn not_found(path: &str) -> GlosaError {
        GlosaError::PathNotFound(path.to_string())
    }
}
