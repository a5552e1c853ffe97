use crate::types::{BoundaryHint, OutlineNode};
use tracing::debug;

/// Flattens a bookmark tree into boundary hints ordered by target page.
#[derive(Debug, Clone)]
pub struct OutlineFlattener {
    max_depth: usize,
    leaf_only: bool,
}

impl OutlineFlattener {
    pub fn new(max_depth: usize, leaf_only: bool) -> Self {
        Self {
            max_depth: max_depth.max(1),
            leaf_only,
        }
    }

    /// Depth 1 is the top level. Nodes below `max_depth` are never visited, and
    /// nodes pointing outside `[1, total_pages]` are dropped.
    pub fn flatten(&self, roots: &[OutlineNode], total_pages: usize) -> Vec<BoundaryHint> {
        let mut visited: Vec<BoundaryHint> = Vec::new();
        let mut stack: Vec<(&OutlineNode, usize)> =
            roots.iter().rev().map(|node| (node, 1)).collect();

        while let Some((node, depth)) = stack.pop() {
            let descend = depth < self.max_depth && !node.children.is_empty();
            if descend {
                stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
            }

            if self.leaf_only && descend {
                continue;
            }
            if node.target_page == 0 || node.target_page > total_pages {
                debug!(
                    "Dropping outline entry '{}' targeting page {} of {}",
                    node.title, node.target_page, total_pages
                );
                continue;
            }

            let title = node.title.trim();
            let title = if title.is_empty() { "Untitled" } else { title };
            visited.push(BoundaryHint::new(title, node.target_page));
        }

        // Stable: equal pages keep pre-order position.
        visited.sort_by_key(|hint| hint.start_page);
        visited
    }
}

impl Default for OutlineFlattener {
    fn default() -> Self {
        Self::new(10, false)
    }
}
