//! XML tree builder
//!
//! Parses a raw XML blob into the [`TreeNode`] model with `quick-xml`'s
//! pull parser. A malformed outer document is fatal (`MalformedDocument`,
//! no partial tree); a CDATA payload that fails to parse as XML is not.

use crate::error::GlosaError;
use crate::tree::TreeNode;
use quick_xml::events::Event;
use quick_xml::Reader;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Parse a document into a tree rooted at the document element.
pub fn parse_tree(text: &str) -> crate::Result<TreeNode> {
    parse_tree_at(text, "")
}

/// Parse a document, prefixing every path with `parent_path`.
///
/// Embedded documents use this to root their tree below the hosting node's
/// `[EMBEDDED]` segment.
pub fn parse_tree_at(text: &str, parent_path: &str) -> crate::Result<TreeNode> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<TreeNode> = Vec::new();
    let mut root: Option<TreeNode> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed("multiple root elements"));
                }
                let parent = stack
                    .last()
                    .map(|node| node.path.as_str())
                    .unwrap_or(parent_path);
                let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut node = TreeNode::new(&tag, parent);
                for attr in start.attributes() {
                    let attr = attr.map_err(|e| malformed(&e.to_string()))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| malformed(&e.to_string()))?
                        .into_owned();
                    node.attributes.insert(key, value);
                }
                stack.push(node);
            }
            Ok(Event::Empty(start)) => {
                if stack.is_empty() && root.is_some() {
                    return Err(malformed("multiple root elements"));
                }
                let parent = stack
                    .last()
                    .map(|node| node.path.as_str())
                    .unwrap_or(parent_path);
                let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                let mut node = TreeNode::new(&tag, parent);
                for attr in start.attributes() {
                    let attr = attr.map_err(|e| malformed(&e.to_string()))?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    let value = attr
                        .unescape_value()
                        .map_err(|e| malformed(&e.to_string()))?
                        .into_owned();
                    node.attributes.insert(key, value);
                }
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::End(_)) => {
                // Mismatched names are already rejected by the reader.
                let mut node = match stack.pop() {
                    Some(node) => node,
                    None => return Err(malformed("close tag without open tag")),
                };
                finish_node(&mut node);
                attach(&mut stack, &mut root, node);
            }
            Ok(Event::Text(text)) => {
                let piece = text
                    .unescape()
                    .map_err(|e| malformed(&e.to_string()))?;
                match stack.last_mut() {
                    Some(node) => node.direct_text.push_str(&piece),
                    // Whitespace between top-level constructs is fine.
                    None if piece.trim().is_empty() => {}
                    None => return Err(malformed("text outside of root element")),
                }
            }
            Ok(Event::CData(cdata)) => {
                let content = String::from_utf8_lossy(&cdata.into_inner()).into_owned();
                match stack.last_mut() {
                    // Only the first character-data block is the embedded candidate.
                    Some(node) if node.embedded_document.is_none() => {
                        node.embedded_document = Some(content);
                    }
                    Some(_) => {}
                    None => return Err(malformed("character data outside of root element")),
                }
            }
            Ok(Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(&e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(malformed("unexpected end of document"));
    }
    root.ok_or_else(|| malformed("no root element"))
}

fn malformed(message: &str) -> GlosaError {
    GlosaError::MalformedDocument(message.to_string())
}

fn attach(stack: &mut Vec<TreeNode>, root: &mut Option<TreeNode>, node: TreeNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => *root = Some(node),
    }
}

/// Trim accumulated direct text and run the fallback CDATA scan.
///
/// Some serializers emit the `<![CDATA[` marker as escaped text instead of
/// a real character-data node; after unescaping it shows up in the direct
/// text, so both detection mechanisms must be checked.
fn finish_node(node: &mut TreeNode) {
    node.direct_text = node.direct_text.trim().to_string();
    if node.embedded_document.is_none() {
        if let Some(inner) = extract_cdata(&node.direct_text) {
            node.embedded_document = Some(inner.to_string());
        }
    }
}

/// First `<![CDATA[ ... ]]>` payload inside a text blob, if any.
fn extract_cdata(text: &str) -> Option<&str> {
    let start = text.find(CDATA_OPEN)? + CDATA_OPEN.len();
    let end = text[start..].find(CDATA_CLOSE)? + start;
    Some(&text[start..end])
}
