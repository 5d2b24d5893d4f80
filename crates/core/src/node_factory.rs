//! Node construction and identifier generation
//!
//! Identifiers are derived from kind and fully-qualified name so the same
//! element found twice in one build produces the same id. Class ids carry a
//! disambiguator derived from the declaring file so that identically named
//! classes declared in different files stay distinct (one node per
//! declaration site).

use crate::graph::{GraphNode, NodeKind, NodeMetadata};
use std::path::Path;

/// Package used when no package symbol encloses an element
pub const DEFAULT_PACKAGE: &str = "default";

/// Class used when no class symbol encloses an element
pub const DEFAULT_CLASS: &str = "AnonymousClass";

/// Immutable package/class context threaded down a symbol walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeContext {
    pub package: String,
    pub class_name: String,
    /// Node id of the enclosing class, if a class has been seen in this file
    pub class_id: Option<String>,
}

impl ScopeContext {
    /// Root context with the default package and class
    pub fn new() -> Self {
        Self {
            package: DEFAULT_PACKAGE.to_string(),
            class_name: DEFAULT_CLASS.to_string(),
            class_id: None,
        }
    }

    /// Returns a copy scoped to `package`
    pub fn with_package(&self, package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..self.clone()
        }
    }

    /// Returns a copy scoped to a class node
    pub fn with_class(&self, class_name: impl Into<String>, class_id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            class_id: Some(class_id.into()),
            ..self.clone()
        }
    }

    /// `<package>.<class>` for this scope
    pub fn qualified_class(&self) -> String {
        format!("{}.{}", self.package, self.class_name)
    }
}

impl Default for ScopeContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Lossy string form of a path, used inside ids
pub fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Base name of a path, falling back to the whole path for roots
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_string(path))
}

pub fn directory_id(path: &Path) -> String {
    format!("dir:{}", path_string(path))
}

pub fn file_id(path: &Path) -> String {
    format!("file:{}", path_string(path))
}

pub fn package_id(package: &str) -> String {
    format!("pkg:{package}")
}

/// File-derived disambiguator: base name without extension, dots replaced by `_`
pub fn class_disambiguator(file_path: &Path) -> String {
    file_path
        .file_stem()
        .map(|s| s.to_string_lossy().replace('.', "_"))
        .unwrap_or_default()
}

pub fn class_id(package: &str, class_name: &str, file_path: &Path) -> String {
    format!(
        "cls:{package}.{class_name}_{}",
        class_disambiguator(file_path)
    )
}

pub fn method_id(package: &str, class_name: &str, method_name: &str) -> String {
    format!("meth:{package}.{class_name}.{method_name}")
}

/// Bare method name from a symbol name such as `foo(int, String)`
pub fn method_name(symbol_name: &str) -> &str {
    symbol_name
        .split_once('(')
        .map_or(symbol_name, |(name, _)| name)
        .trim()
}

/// Parameter list parsed from a symbol's detail string
///
/// Returns `None` when the detail is absent or lists nothing.
pub fn parse_parameters(detail: Option<&str>) -> Option<Vec<String>> {
    let params: Vec<String> = detail?
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();
    (!params.is_empty()).then_some(params)
}

pub fn directory_node(path: &Path, parent: Option<&Path>) -> GraphNode {
    GraphNode {
        id: directory_id(path),
        label: base_name(path),
        kind: NodeKind::Directory,
        path: path_string(path),
        group: NodeKind::Directory.to_string(),
        parent_id: parent.map(directory_id),
        metadata: None,
    }
}

pub fn file_node(path: &Path, parent_id: &str) -> GraphNode {
    GraphNode {
        id: file_id(path),
        label: base_name(path),
        kind: NodeKind::File,
        path: path_string(path),
        group: NodeKind::File.to_string(),
        parent_id: Some(parent_id.to_string()),
        metadata: None,
    }
}

pub fn package_node(package: &str, parent_id: &str) -> GraphNode {
    GraphNode {
        id: package_id(package),
        label: package.to_string(),
        kind: NodeKind::Package,
        path: package.to_string(),
        group: NodeKind::Package.to_string(),
        parent_id: Some(parent_id.to_string()),
        metadata: Some(NodeMetadata {
            package: Some(package.to_string()),
            ..Default::default()
        }),
    }
}

pub fn class_node(scope: &ScopeContext, class_name: &str, file_path: &Path, parent_id: &str) -> GraphNode {
    GraphNode {
        id: class_id(&scope.package, class_name, file_path),
        label: class_name.to_string(),
        kind: NodeKind::Class,
        path: format!("{}.{class_name}", scope.package),
        group: NodeKind::Class.to_string(),
        parent_id: Some(parent_id.to_string()),
        metadata: Some(NodeMetadata {
            package: Some(scope.package.clone()),
            class_name: Some(class_name.to_string()),
            ..Default::default()
        }),
    }
}

pub fn method_node(
    scope: &ScopeContext,
    name: &str,
    detail: Option<&str>,
    file_path: &Path,
    parent_id: &str,
) -> GraphNode {
    GraphNode {
        id: method_id(&scope.package, &scope.class_name, name),
        label: name.to_string(),
        kind: NodeKind::Method,
        path: path_string(file_path),
        group: NodeKind::Method.to_string(),
        parent_id: Some(parent_id.to_string()),
        metadata: Some(NodeMetadata {
            parameters: parse_parameters(detail),
            package: Some(scope.package.clone()),
            class_name: Some(scope.class_name.clone()),
            references: Vec::new(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_scope_context_is_not_mutated_by_derivation() {
        let root = ScopeContext::new();
        let scoped = root.with_package("com.acme").with_class("Widget", "cls:x");

        assert_eq!(root.package, DEFAULT_PACKAGE);
        assert_eq!(root.class_name, DEFAULT_CLASS);
        assert_eq!(scoped.qualified_class(), "com.acme.Widget");
        assert_eq!(scoped.class_id.as_deref(), Some("cls:x"));
    }

    #[test]
    fn test_class_id_uses_file_disambiguator() {
        let a = class_id("p", "Util", &PathBuf::from("/src/a/Util.java"));
        let b = class_id("p", "Util", &PathBuf::from("/src/b/Helpers.java"));
        assert_eq!(a, "cls:p.Util_Util");
        assert_eq!(b, "cls:p.Util_Helpers");
    }

    #[test]
    fn test_disambiguator_replaces_dots() {
        assert_eq!(
            class_disambiguator(&PathBuf::from("/src/Foo.generated.java")),
            "Foo_generated"
        );
    }

    #[test]
    fn test_method_name_strips_signature() {
        assert_eq!(method_name("bar(int, String)"), "bar");
        assert_eq!(method_name("bar"), "bar");
        assert_eq!(method_name("<init> ()"), "<init>");
    }

    #[test]
    fn test_parse_parameters() {
        assert_eq!(
            parse_parameters(Some("int a, String b")),
            Some(vec!["int a".to_string(), "String b".to_string()])
        );
        assert_eq!(parse_parameters(Some("  ")), None);
        assert_eq!(parse_parameters(None), None);
    }

    #[test]
    fn test_method_node_metadata() {
        let scope = ScopeContext::new().with_package("p").with_class("A", "cls:p.A_A");
        let node = method_node(&scope, "foo", Some("int x"), &PathBuf::from("/w/A.java"), "cls:p.A_A");

        assert_eq!(node.id, "meth:p.A.foo");
        assert_eq!(node.path, "/w/A.java");
        assert_eq!(node.package(), Some("p"));
        assert_eq!(node.class_name(), Some("A"));
        assert_eq!(
            node.metadata.and_then(|m| m.parameters),
            Some(vec!["int x".to_string()])
        );
    }

    #[test]
    fn test_directory_node_parent() {
        let root = directory_node(&PathBuf::from("/w"), None);
        let child = directory_node(&PathBuf::from("/w/src"), Some(&PathBuf::from("/w")));
        assert_eq!(root.parent_id, None);
        assert_eq!(root.label, "w");
        assert_eq!(child.parent_id.as_deref(), Some("dir:/w"));
    }
}
