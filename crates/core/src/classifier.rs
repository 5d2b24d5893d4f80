//! Call edge relationship classification

use crate::graph::{GraphNode, Relationship};

/// Classifies a call from `source` to `target` by owning class and package.
///
/// Missing metadata on either side never matches, so such pairs fall through
/// to [`Relationship::CrossPackage`].
pub fn classify(source: &GraphNode, target: &GraphNode) -> Relationship {
    if matches(source.class_name(), target.class_name()) {
        Relationship::SameClass
    } else if matches(source.package(), target.package()) {
        Relationship::SamePackage
    } else {
        Relationship::CrossPackage
    }
}

fn matches(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeKind, NodeMetadata};

    fn method(package: Option<&str>, class_name: Option<&str>) -> GraphNode {
        GraphNode {
            id: "meth:x".to_string(),
            label: "x".to_string(),
            kind: NodeKind::Method,
            path: "/x.java".to_string(),
            group: "method".to_string(),
            parent_id: None,
            metadata: Some(NodeMetadata {
                package: package.map(str::to_string),
                class_name: class_name.map(str::to_string),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_same_class() {
        let a = method(Some("p"), Some("A"));
        let b = method(Some("p"), Some("A"));
        assert_eq!(classify(&a, &b), Relationship::SameClass);
    }

    #[test]
    fn test_same_package() {
        let a = method(Some("p"), Some("A"));
        let b = method(Some("p"), Some("B"));
        assert_eq!(classify(&a, &b), Relationship::SamePackage);
    }

    #[test]
    fn test_cross_package() {
        let a = method(Some("p"), Some("A"));
        let b = method(Some("q"), Some("B"));
        assert_eq!(classify(&a, &b), Relationship::CrossPackage);
    }

    #[test]
    fn test_class_name_wins_over_package() {
        let a = method(Some("p"), Some("A"));
        let b = method(Some("q"), Some("A"));
        assert_eq!(classify(&a, &b), Relationship::SameClass);
    }

    #[test]
    fn test_missing_metadata_never_matches() {
        let mut bare = method(None, None);
        bare.metadata = None;
        let other = method(None, None);

        assert_eq!(classify(&bare, &bare.clone()), Relationship::CrossPackage);
        assert_eq!(classify(&other, &other.clone()), Relationship::CrossPackage);
        assert_eq!(
            classify(&method(Some("p"), None), &method(Some("p"), None)),
            Relationship::SamePackage
        );
    }
}
