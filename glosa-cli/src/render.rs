//! Terminal rendering of document trees

use colored::Colorize;
use glosa_core::TreeNode;
use serde_json::Value;

/// Truncate a value for single-line display.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}…", cut)
}

pub fn print_xml_tree(node: &TreeNode, depth: usize, embedded: bool, max_chars: usize) {
    let indent = "  ".repeat(depth);
    let mut line = format!("{}{}", indent, node.tag_name.cyan());

    for (name, value) in &node.attributes {
        line.push_str(&format!(
            " {}={}",
            name.blue(),
            format!("{:?}", preview(value, max_chars)).green()
        ));
    }
    if !node.direct_text.is_empty() {
        line.push_str(&format!(" {:?}", preview(&node.direct_text, max_chars)));
    }
    if node.embedded_document.is_some() {
        line.push_str(&format!(" {}", "[CDATA]".purple().bold()));
    }
    println!("{}", line);

    for child in &node.children {
        print_xml_tree(child, depth + 1, embedded, max_chars);
    }

    if embedded {
        if let Some(tree) = node.embedded_tree() {
            println!(
                "{}  {}",
                indent,
                "embedded document:".purple().bold()
            );
            print_xml_tree(&tree, depth + 2, embedded, max_chars);
        }
    }
}

pub fn print_json_tree(value: &Value, label: &str, depth: usize, max_chars: usize) {
    let indent = "  ".repeat(depth);
    let name = if label.is_empty() { "$" } else { label };
    match value {
        Value::Object(map) => {
            println!("{}{}", indent, name.cyan());
            for (key, child) in map {
                print_json_tree(child, key, depth + 1, max_chars);
            }
        }
        Value::Array(items) => {
            println!("{}{} [{}]", indent, name.cyan(), items.len());
            for (index, child) in items.iter().enumerate() {
                print_json_tree(child, &format!("[{}]", index), depth + 1, max_chars);
            }
        }
        scalar => {
            println!(
                "{}{}: {}",
                indent,
                name.blue(),
                preview(&scalar.to_string(), max_chars).green()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("0123456789abc", 10), "0123456789…");
        // Multibyte text must not split a character.
        assert_eq!(preview("áéíóúáéíóúXX", 10), "áéíóúáéíóú…");
    }
}
