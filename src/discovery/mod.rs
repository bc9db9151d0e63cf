//! Component discovery: walk a cloned repository and extract documentation
//!
//! ## Sub-modules
//!
//! - [`docgen`]: static documentation extraction from a single source file
//!
//! The walk prunes ignored directories before descent, so dependency trees
//! and other conventionally skipped subtrees are never visited at all.

pub mod docgen;

pub use docgen::{ComponentDoc, PropDoc};

use crate::constants::discovery::{IGNORED_DIRECTORIES, SOURCE_EXTENSIONS};
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A component found during the discovery walk
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedComponent {
    /// File stem with the extension stripped
    pub name: String,
    /// Absolute path inside the clone
    pub filepath: PathBuf,
    /// Path relative to the repository root, rendered absolute-style
    /// (`/src/Button.js`) - the stable identity key across compilations
    pub relative_filepath: String,
    pub doc: ComponentDoc,
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRECTORIES.contains(&name))
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

/// Walk the repository tree and emit a [`ParsedComponent`] for every source
/// file whose documentation extracts successfully.
///
/// Files that fail extraction are skipped silently - most files in a
/// repository are not components and that is not an error. Walk order is
/// filesystem order and carries no guarantee; downstream stages must not
/// depend on it.
pub fn discover_components(repo_path: &Path) -> Result<Vec<ParsedComponent>> {
    let mut components = Vec::new();

    for entry in WalkDir::new(repo_path)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_ignored_dir(entry))
        .filter_map(|entry| entry.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_source_file(path) {
            continue;
        }

        // Unreadable files are treated like files that are not components
        let Ok(source) = std::fs::read_to_string(path) else {
            continue;
        };
        let Some(doc) = docgen::extract_doc(&source, path) else {
            continue;
        };
        let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let relative = path.strip_prefix(repo_path).unwrap_or(path);
        components.push(ParsedComponent {
            name: name.to_string(),
            filepath: path.to_path_buf(),
            relative_filepath: format!("/{}", relative.display()),
            doc,
        });
    }

    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const COMPONENT_SOURCE: &str = r#"
import React from 'react';

export default class Widget extends React.Component {
  render() {
    return <div className="widget" />;
  }
}
"#;

    fn write_file(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_discover_finds_components() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "src/Widget.jsx", COMPONENT_SOURCE);
        write_file(dir.path(), "src/util.js", "export const two = 1 + 1;\n");

        let components = discover_components(dir.path()).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "Widget");
        assert_eq!(components[0].relative_filepath, "/src/Widget.jsx");
        assert!(components[0].filepath.is_absolute() || components[0].filepath.starts_with(dir.path()));
        assert_eq!(components[0].doc.display_name, "Widget");
    }

    #[test]
    fn test_discover_prunes_ignored_directories() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "src/Widget.jsx", COMPONENT_SOURCE);
        // Would-be components below ignored directories must never be visited
        write_file(dir.path(), "node_modules/dep/Other.jsx", COMPONENT_SOURCE);
        write_file(dir.path(), "src/__tests__/Widget.test.jsx", COMPONENT_SOURCE);
        write_file(dir.path(), "build/Widget.jsx", COMPONENT_SOURCE);
        write_file(dir.path(), "docs/Example.jsx", COMPONENT_SOURCE);

        let components = discover_components(dir.path()).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].relative_filepath, "/src/Widget.jsx");
    }

    #[test]
    fn test_discover_skips_non_source_extensions() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "README.md", "# readme");
        write_file(dir.path(), "styles.css", ".a { color: red; }");
        write_file(dir.path(), "Widget.jsx.orig", COMPONENT_SOURCE);

        let components = discover_components(dir.path()).unwrap();
        assert!(components.is_empty());
    }

    #[test]
    fn test_discover_skips_unparsable_files_silently() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "src/garbage.js", "{{{{ not a component ]]]");
        write_file(dir.path(), "src/Widget.jsx", COMPONENT_SOURCE);

        let components = discover_components(dir.path()).unwrap();
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_discover_empty_tree() {
        let dir = TempDir::new().unwrap();
        let components = discover_components(dir.path()).unwrap();
        assert!(components.is_empty());
    }

    #[test]
    fn test_discover_name_strips_extension() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "Button.tsx", &COMPONENT_SOURCE.replace("Widget", "Button"));

        let components = discover_components(dir.path()).unwrap();
        assert_eq!(components.len(), 1);
        assert_eq!(components[0].name, "Button");
    }
}
