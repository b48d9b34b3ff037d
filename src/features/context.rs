use crate::dom::{DomTree, ElementNode, NodePath};
use indexmap::IndexSet;

/// Tags whose text is treated as a section heading
const CONTEXT_TAGS: [&str; 7] = ["h1", "h2", "h3", "h4", "h5", "h6", "p"];

/// Tags where the upward walk stops
const BOUNDARY_TAGS: [&str; 2] = ["body", "html"];

/// Minimum length, exclusive, of an accepted heading
const MIN_HEADING_CHARS: usize = 2;

/// Collapse whitespace runs into single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Headings and paragraphs that precede an element, nearest first.
///
/// Walks from the element towards the root. At every node below `<body>` the preceding
/// siblings are scanned nearest first, then the node itself is tested. Texts are
/// whitespace-normalized, must be longer than two characters and are deduplicated
/// exactly. At most `max` entries are returned.
pub fn collect_context_headings(tree: &DomTree, path: &NodePath, max: usize) -> Vec<String> {
    let mut found: IndexSet<String> = IndexSet::new();
    let mut current = Some(path.clone());

    while let Some(node_path) = current {
        if found.len() >= max {
            break;
        }
        let Some(node) = tree.get(&node_path) else {
            break;
        };
        if node.is_any_tag(&BOUNDARY_TAGS) {
            break;
        }

        for sibling in tree.preceding_siblings(&node_path) {
            if found.len() >= max {
                break;
            }
            accept(sibling, &mut found);
        }
        if found.len() < max {
            accept(node, &mut found);
        }

        current = node_path.parent();
    }

    found.into_iter().collect()
}

fn accept(node: &ElementNode, found: &mut IndexSet<String>) {
    if !node.is_any_tag(&CONTEXT_TAGS) {
        return;
    }
    let text = normalize_whitespace(&node.visible_text());
    if text.chars().count() > MIN_HEADING_CHARS {
        found.insert(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(main_children: Vec<ElementNode>) -> DomTree {
        let body = ElementNode::new("body").with_children(vec![
            ElementNode::new("h1").with_text("Bem-vindo"),
            ElementNode::new("main").with_children(main_children),
        ]);
        DomTree::new(ElementNode::new("html").with_children(vec![ElementNode::new("head"), body]))
    }

    #[test]
    fn test_duplicates_collapse_nearest_first() {
        let tree = page(vec![
            ElementNode::new("h2").with_text("Planos"),
            ElementNode::new("h2").with_text("Preços"),
            ElementNode::new("h2").with_text("Planos"),
            ElementNode::new("button").with_id("target").with_text("Assinar"),
        ]);
        let target = tree.find_by_id("target").unwrap();

        let headings = collect_context_headings(&tree, &target, 5);
        assert_eq!(headings, vec!["Planos", "Preços"]);
    }

    #[test]
    fn test_walk_stops_at_body() {
        let tree = page(vec![ElementNode::new("div").with_id("target")]);
        let target = tree.find_by_id("target").unwrap();

        // The h1 is a sibling of <main>, which is scanned; <body> itself is not
        assert_eq!(collect_context_headings(&tree, &target, 5), vec!["Bem-vindo"]);
    }

    #[test]
    fn test_self_included_only_when_heading() {
        let tree = page(vec![
            ElementNode::new("p").with_text("Introdução"),
            ElementNode::new("h3").with_id("target").with_text("Detalhes"),
        ]);
        let target = tree.find_by_id("target").unwrap();

        assert_eq!(
            collect_context_headings(&tree, &target, 5),
            vec!["Introdução", "Detalhes", "Bem-vindo"]
        );
    }

    #[test]
    fn test_short_and_blank_text_rejected() {
        let tree = page(vec![
            ElementNode::new("h2").with_text("Oi"),
            ElementNode::new("p").with_text("   "),
            ElementNode::new("h4").with_text("  Sobre \n\t nós "),
            ElementNode::new("span").with_text("Não é título"),
            ElementNode::new("a").with_id("target"),
        ]);
        let target = tree.find_by_id("target").unwrap();

        assert_eq!(collect_context_headings(&tree, &target, 5), vec!["Sobre nós", "Bem-vindo"]);
    }

    #[test]
    fn test_respects_max() {
        let mut children: Vec<ElementNode> =
            (1..=8).map(|i| ElementNode::new("p").with_text(format!("Parágrafo {i}"))).collect();
        children.push(ElementNode::new("img").with_id("target"));
        let tree = page(children);
        let target = tree.find_by_id("target").unwrap();

        let headings = collect_context_headings(&tree, &target, 3);
        assert_eq!(headings, vec!["Parágrafo 8", "Parágrafo 7", "Parágrafo 6"]);
    }

    #[test]
    fn test_properties_hold_on_nested_page() {
        let tree = page(vec![
            ElementNode::new("h2").with_text("Produtos"),
            ElementNode::new("section").with_children(vec![
                ElementNode::new("h3").with_text("Maquininhas"),
                ElementNode::new("div").with_children(vec![
                    ElementNode::new("p").with_text("Produtos"),
                    ElementNode::new("span").with_id("target").with_text("R$ 10"),
                ]),
            ]),
        ]);
        let target = tree.find_by_id("target").unwrap();

        for max in 1..=6 {
            let headings = collect_context_headings(&tree, &target, max);
            assert!(headings.len() <= max);
            assert!(headings.iter().all(|h| h.chars().count() > 2));
            let unique: IndexSet<&String> = headings.iter().collect();
            assert_eq!(unique.len(), headings.len());
        }
        assert_eq!(
            collect_context_headings(&tree, &target, 6),
            vec!["Produtos", "Maquininhas", "Bem-vindo"]
        );
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n b\u{a0}c  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }
}
