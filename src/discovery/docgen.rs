//! Static documentation extraction for component source files
//!
//! A lightweight source-level analysis: no full parser, a set of regular
//! expressions recognizing the common component declaration shapes plus a
//! small brace scanner for the prop blocks. Most files in a repository are
//! not components; those yield `None` and are skipped by the discovery walk.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Documentation for a single prop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropDoc {
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Documentation extracted from one component source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDoc {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub props: BTreeMap<String, PropDoc>,
}

/// Extract component documentation from `source`, or `None` when the file
/// does not declare a recognizable component.
pub fn extract_doc(source: &str, path: &Path) -> Option<ComponentDoc> {
    let (display_name, decl_start) = find_declaration(source)?;

    let description = leading_doc_comment(&source[..decl_start]).unwrap_or_default();

    let mut props = prop_types_block(source)
        .map(parse_prop_types)
        .unwrap_or_default();

    // TypeScript components document their props on an interface instead
    if props.is_empty()
        && path.extension().and_then(|e| e.to_str()) == Some("tsx")
        && let Some(block) = props_interface_block(source)
    {
        props = parse_props_interface(block);
    }

    if let Some(block) = default_props_block(source) {
        for (name, value) in parse_default_props(block) {
            if let Some(prop) = props.get_mut(&name) {
                prop.default_value = Some(value);
            } else {
                props.insert(
                    name,
                    PropDoc {
                        type_name: "unknown".to_string(),
                        required: false,
                        default_value: Some(value),
                        description: String::new(),
                    },
                );
            }
        }
    }

    Some(ComponentDoc {
        display_name,
        description,
        props,
    })
}

/// Locate the component declaration, returning its name and byte offset
fn find_declaration(source: &str) -> Option<(String, usize)> {
    let class_decl = Regex::new(
        r"(?m)^\s*(?:export\s+(?:default\s+)?)?class\s+(\w+)\s+extends\s+(?:React\.)?(?:Pure)?Component\b",
    )
    .ok()?;
    if let Some(captures) = class_decl.captures(source) {
        let m = captures.get(0)?;
        return Some((captures[1].to_string(), m.start()));
    }

    let create_class = Regex::new(r"(?:const|let|var)\s+(\w+)\s*=\s*React\.createClass\b").ok()?;
    if let Some(captures) = create_class.captures(source) {
        let m = captures.get(0)?;
        return Some((captures[1].to_string(), m.start()));
    }

    // Function and arrow components are only components if the file renders
    // something
    if !has_render_evidence(source) {
        return None;
    }

    let function_decl =
        Regex::new(r"(?m)^\s*(?:export\s+(?:default\s+)?)?function\s+([A-Z]\w*)\s*\(").ok()?;
    if let Some(captures) = function_decl.captures(source) {
        let m = captures.get(0)?;
        return Some((captures[1].to_string(), m.start()));
    }

    let arrow_decl = Regex::new(
        r"(?m)^\s*(?:export\s+(?:default\s+)?)?(?:const|let)\s+([A-Z]\w*)\s*=\s*(?:\([^)\n]*\)|\w+)\s*=>",
    )
    .ok()?;
    if let Some(captures) = arrow_decl.captures(source) {
        let m = captures.get(0)?;
        return Some((captures[1].to_string(), m.start()));
    }

    None
}

/// JSX or an explicit createElement call somewhere in the file
fn has_render_evidence(source: &str) -> bool {
    if source.contains("React.createElement") {
        return true;
    }
    Regex::new(r"<[A-Za-z][\w.]*\s*[\s/>]")
        .map(|re| re.is_match(source))
        .unwrap_or(false)
}

/// The `/** ... */` block immediately preceding the declaration, cleaned of
/// comment markers
fn leading_doc_comment(prefix: &str) -> Option<String> {
    let doc_comment = Regex::new(r"(?s)/\*\*(.*?)\*/").ok()?;
    let captures = doc_comment.captures_iter(prefix).last()?;
    let m = captures.get(0)?;
    // Only whitespace may separate the comment from the declaration
    if !prefix[m.end()..].trim().is_empty() {
        return None;
    }
    let text = captures[1]
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    (!text.is_empty()).then_some(text)
}

/// Contents of the `{ ... }` block starting at the first `{` at or after
/// `from`, with nesting respected. String and comment contents are not
/// special-cased; prop blocks in practice do not hide braces there.
fn brace_block(source: &str, from: usize) -> Option<&str> {
    let open = source[from..].find('{')? + from;
    let mut depth = 0usize;
    for (offset, ch) in source[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[open + 1..open + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn prop_types_block(source: &str) -> Option<&str> {
    let anchor = Regex::new(r"propTypes\s*[:=]\s*\{").ok()?.find(source)?;
    brace_block(source, anchor.start())
}

fn default_props_block(source: &str) -> Option<&str> {
    let anchor = Regex::new(r"defaultProps\s*[:=]\s*\{").ok()?.find(source)?;
    brace_block(source, anchor.start())
}

fn props_interface_block(source: &str) -> Option<&str> {
    let anchor = Regex::new(r"interface\s+\w*Props\s*(?:extends[^{]*)?\{")
        .ok()?
        .find(source)?;
    brace_block(source, anchor.start())
}

/// Parse `name: PropTypes.<type>[.isRequired]` entries, one per line.
/// Entries spanning multiple lines (shapes, nested arrays) are skipped.
fn parse_prop_types(block: &str) -> BTreeMap<String, PropDoc> {
    let mut props = BTreeMap::new();
    let Ok(entry) = Regex::new(r"^\s*(\w+)\s*:\s*(?:React\.)?PropTypes\.(\w+)") else {
        return props;
    };

    let mut pending_description = String::new();
    for line in block.lines() {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix("//") {
            if !pending_description.is_empty() {
                pending_description.push('\n');
            }
            pending_description.push_str(comment.trim());
            continue;
        }
        if let Some(captures) = entry.captures(line) {
            props.insert(
                captures[1].to_string(),
                PropDoc {
                    type_name: captures[2].to_string(),
                    required: line.contains(".isRequired"),
                    default_value: None,
                    description: std::mem::take(&mut pending_description),
                },
            );
        } else {
            pending_description.clear();
        }
    }
    props
}

/// Parse `name: <literal>` entries from a defaultProps block, one per line
fn parse_default_props(block: &str) -> Vec<(String, String)> {
    let Ok(entry) = Regex::new(r"^\s*(\w+)\s*:\s*(.+?),?\s*$") else {
        return Vec::new();
    };
    block
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .filter_map(|line| {
            entry
                .captures(line)
                .map(|c| (c[1].to_string(), c[2].trim().to_string()))
        })
        .collect()
}

/// Parse `name[?]: <type>` members from a TypeScript props interface
fn parse_props_interface(block: &str) -> BTreeMap<String, PropDoc> {
    let mut props = BTreeMap::new();
    let Ok(entry) = Regex::new(r"^\s*(\w+)(\?)?\s*:\s*(.+?);?\s*$") else {
        return props;
    };

    let mut pending_description = String::new();
    for line in block.lines() {
        let trimmed = line.trim();
        if let Some(comment) = trimmed.strip_prefix("//") {
            if !pending_description.is_empty() {
                pending_description.push('\n');
            }
            pending_description.push_str(comment.trim());
            continue;
        }
        if let Some(captures) = entry.captures(line) {
            props.insert(
                captures[1].to_string(),
                PropDoc {
                    type_name: captures[3].trim().to_string(),
                    required: captures.get(2).is_none(),
                    default_value: None,
                    description: std::mem::take(&mut pending_description),
                },
            );
        } else {
            pending_description.clear();
        }
    }
    props
}
