#![allow(unused_imports)]

use tree_sitter::Node;

use crate::GroovySupport;
use lsp_core::language_support::LanguageSupport;

use super::*;

fn first_node_of_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    if node.kind() == kind {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_node_of_kind(child, kind) {
            return Some(found);
        }
    }
    None
}

#[test]
fn test_get_class_declaration_metadata() {
    let support = GroovySupport::new();
    let content = r#"
        @Deprecated
        public abstract class Widget extends Base implements Runnable, Comparable {
        }
        "#;
    let parsed = support.parse_str(content).expect("cannot parse content");
    let class_node = first_node_of_kind(parsed.0.root_node(), "class_declaration")
        .expect("expected a class_declaration node");

    assert_eq!(
        support.get_extends(&class_node, &parsed.1),
        Some("Base".to_string())
    );
    assert_eq!(
        support.get_implements(&class_node, &parsed.1),
        vec!["Runnable".to_string(), "Comparable".to_string()]
    );

    let modifiers = support.get_modifiers(&class_node, &parsed.1);
    assert!(modifiers.contains(&"public".to_string()));
    assert!(modifiers.contains(&"abstract".to_string()));

    assert_eq!(
        support.get_annotations(&class_node, &parsed.1),
        vec!["Deprecated".to_string()]
    );
}

#[test]
fn test_get_method_declaration_metadata() {
    let support = GroovySupport::new();
    let content = r#"
        class Widget {
            public String render(int count, String label) {
                return null
            }
        }
        "#;
    let parsed = support.parse_str(content).expect("cannot parse content");
    let method_node = first_node_of_kind(parsed.0.root_node(), "function_declaration")
        .expect("expected a function_declaration node");

    assert_eq!(
        support.get_return(&method_node, &parsed.1),
        Some("String".to_string())
    );
    assert!(
        support
            .get_modifiers(&method_node, &parsed.1)
            .contains(&"public".to_string())
    );

    let params = support
        .get_parameters(&method_node, &parsed.1)
        .expect("expected parameters");
    assert_eq!(params.len(), 2);
    assert_eq!(params[0].0, "count");
    assert_eq!(params[1].0, "label");
}

#[test]
fn test_get_field_declaration_metadata() {
    let support = GroovySupport::new();
    let content = r#"
        class Widget {
            private String name
        }
        "#;
    let parsed = support.parse_str(content).expect("cannot parse content");
    let field_node = first_node_of_kind(parsed.0.root_node(), "field_declaration")
        .expect("expected a field_declaration node");

    assert_eq!(
        support.get_return(&field_node, &parsed.1),
        Some("String".to_string())
    );
    assert!(
        support
            .get_modifiers(&field_node, &parsed.1)
            .contains(&"private".to_string())
    );
}
