//! Forest transitions.
//!
//! All mutating operations go through one structural rewrite: walk the
//! forest, transform the node with the matching id, and rebuild only the
//! ancestors on the path to it. Every other subtree is shared by `Arc`
//! with the previous snapshot. A rewrite that matches nothing returns
//! pointer-equal roots.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::domain::entities::{ChildSpec, Forest, NodeState, TreeNode};
use crate::domain::id::uid;

/// Result of asking a node to expand or collapse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggle {
    /// Unknown id, or a fetch for this node is already in flight
    Unchanged,
    /// Loaded node flipped between expanded and collapsed
    Flipped(Forest),
    /// Unloaded node is now Loading; its children must be fetched
    FetchRequired(Forest),
}

enum Edit {
    Keep,
    Replace(TreeNode),
    Remove,
}

fn rewrite<F>(nodes: &[Arc<TreeNode>], id: &str, edit: &mut F) -> Option<Vec<Arc<TreeNode>>>
where
    F: FnMut(&TreeNode) -> Edit,
{
    for (i, node) in nodes.iter().enumerate() {
        let replacement = if node.id == id {
            match edit(node) {
                Edit::Keep => return None,
                Edit::Replace(next) => Some(Some(Arc::new(next))),
                Edit::Remove => Some(None),
            }
        } else {
            rewrite(&node.children, id, &mut *edit)
                .map(|children| Some(Arc::new(node.with_shared_children(children))))
        };

        if let Some(replacement) = replacement {
            let mut out = Vec::with_capacity(nodes.len());
            out.extend(nodes[..i].iter().cloned());
            out.extend(replacement);
            out.extend(nodes[i + 1..].iter().cloned());
            return Some(out);
        }
    }
    None
}

fn apply<F>(forest: &Forest, id: &str, mut edit: F) -> Forest
where
    F: FnMut(&TreeNode) -> Edit,
{
    match rewrite(&forest.roots, id, &mut edit) {
        Some(roots) => Forest::from_shared(roots),
        None => forest.clone(),
    }
}

/// Depth-first lookup by id.
pub fn find_node<'a>(forest: &'a Forest, id: &str) -> Option<&'a Arc<TreeNode>> {
    fn walk<'a>(nodes: &'a [Arc<TreeNode>], id: &str) -> Option<&'a Arc<TreeNode>> {
        nodes
            .iter()
            .find_map(|n| if n.id == id { Some(n) } else { walk(&n.children, id) })
    }
    walk(&forest.roots, id)
}

pub fn node_state(forest: &Forest, id: &str) -> Option<NodeState> {
    find_node(forest, id).map(|n| n.state())
}

/// Ids of a node and all of its descendants, preorder.
pub fn subtree_ids(forest: &Forest, id: &str) -> Vec<String> {
    let mut ids = Vec::new();
    if let Some(node) = find_node(forest, id) {
        collect_ids(std::slice::from_ref(node), &mut ids);
    }
    ids
}

fn collect_ids(nodes: &[Arc<TreeNode>], out: &mut Vec<String>) {
    for node in nodes {
        out.push(node.id.clone());
        collect_ids(&node.children, out);
    }
}

/// Append a new loaded leaf under `parent_id` and expand the parent.
///
/// No-op if the parent is unknown or the trimmed name is empty.
#[instrument(level = "debug", skip(forest))]
pub fn add_child(forest: &Forest, parent_id: &str, name: &str) -> Forest {
    let name = name.trim();
    if name.is_empty() {
        debug!("add_child: empty name rejected");
        return forest.clone();
    }
    attach_child(forest, parent_id, TreeNode::leaf(uid(), name))
}

pub(crate) fn attach_child(forest: &Forest, parent_id: &str, child: TreeNode) -> Forest {
    let mut child = Some(child);
    apply(forest, parent_id, |parent| {
        let Some(child) = child.take() else {
            return Edit::Keep;
        };
        let mut children = parent.children.clone();
        children.push(Arc::new(child));
        Edit::Replace(TreeNode {
            children,
            expanded: true,
            ..parent.clone()
        })
    })
}

/// Append a new loaded root node.
#[instrument(level = "debug", skip(forest))]
pub fn add_root(forest: &Forest, name: &str) -> Forest {
    let name = name.trim();
    if name.is_empty() {
        debug!("add_root: empty name rejected");
        return forest.clone();
    }
    let mut roots = forest.roots.clone();
    roots.push(Arc::new(TreeNode::leaf(uid(), name)));
    Forest::from_shared(roots)
}

/// Rename a node in place, keeping its position and children.
#[instrument(level = "debug", skip(forest))]
pub fn rename_node(forest: &Forest, id: &str, name: &str) -> Forest {
    let name = name.trim();
    if name.is_empty() {
        debug!("rename_node: empty name rejected");
        return forest.clone();
    }
    apply(forest, id, |node| {
        if node.name == name {
            return Edit::Keep;
        }
        Edit::Replace(TreeNode {
            name: name.to_string(),
            ..node.clone()
        })
    })
}

/// Remove a node and its whole subtree. Sibling order is preserved.
#[instrument(level = "debug", skip(forest))]
pub fn delete_node(forest: &Forest, id: &str) -> Forest {
    apply(forest, id, |_| Edit::Remove)
}

/// Drive the expand/collapse state machine one step.
///
/// Collapsed-Unloaded moves to Loading and asks for a fetch. Loading
/// ignores further toggles. Loaded nodes flip `expanded` and keep their
/// children.
#[instrument(level = "debug", skip(forest))]
pub fn toggle_expand(forest: &Forest, id: &str) -> Toggle {
    let Some(state) = node_state(forest, id) else {
        debug!("toggle_expand: {} not found", id);
        return Toggle::Unchanged;
    };
    match state {
        NodeState::Loading => Toggle::Unchanged,
        NodeState::CollapsedUnloaded => Toggle::FetchRequired(apply(forest, id, |node| {
            Edit::Replace(TreeNode {
                loading: true,
                ..node.clone()
            })
        })),
        NodeState::CollapsedLoaded | NodeState::ExpandedLoaded => {
            Toggle::Flipped(apply(forest, id, |node| {
                Edit::Replace(TreeNode {
                    expanded: !node.expanded,
                    ..node.clone()
                })
            }))
        }
    }
}

/// Write fetched children into a node: Loading becomes Expanded-Loaded.
///
/// Children added locally while the node was unloaded are kept after the
/// fetched ones. Fetched ids that already exist in the forest are dropped.
/// A node that is gone or already loaded is left alone.
#[instrument(level = "debug", skip(forest, children), fields(fetched = children.len()))]
pub fn complete_load(forest: &Forest, id: &str, children: Vec<ChildSpec>) -> Forest {
    let Some(node) = find_node(forest, id) else {
        debug!("complete_load: {} no longer exists", id);
        return forest.clone();
    };
    if node.loaded {
        debug!("complete_load: {} already loaded, keeping cached children", id);
        return apply(forest, id, |node| {
            if !node.loading {
                return Edit::Keep;
            }
            Edit::Replace(TreeNode {
                loading: false,
                ..node.clone()
            })
        });
    }

    let mut taken = Vec::new();
    collect_ids(&forest.roots, &mut taken);
    let mut taken: HashSet<String> = taken.into_iter().collect();

    let mut fetched: Vec<Arc<TreeNode>> = Vec::with_capacity(children.len());
    for spec in children {
        if !taken.insert(spec.id.clone()) {
            warn!("complete_load: dropping fetched child with duplicate id {}", spec.id);
            continue;
        }
        fetched.push(Arc::new(spec.into_node()));
    }

    let mut fetched = Some(fetched);
    apply(forest, id, |node| {
        let Some(mut children) = fetched.take() else {
            return Edit::Keep;
        };
        children.extend(node.children.iter().cloned());
        Edit::Replace(TreeNode {
            children,
            loaded: true,
            expanded: true,
            loading: false,
            ..node.clone()
        })
    })
}

/// Return a Loading node to Collapsed-Unloaded so it can be retried.
#[instrument(level = "debug", skip(forest))]
pub fn abort_load(forest: &Forest, id: &str) -> Forest {
    apply(forest, id, |node| {
        if node.loaded {
            return Edit::Keep;
        }
        Edit::Replace(TreeNode {
            loading: false,
            expanded: false,
            ..node.clone()
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> Forest {
        Forest::new(vec![
            TreeNode::leaf("1", "Root")
                .with_expanded(true)
                .with_children(vec![
                    TreeNode::lazy("1-1", "Frontend"),
                    TreeNode::lazy("1-2", "Backend"),
                ]),
            TreeNode::leaf("2", "Other").with_children(vec![TreeNode::leaf("2-1", "Leaf")]),
        ])
    }

    #[test]
    fn given_unknown_id_when_rewriting_then_roots_are_pointer_equal() {
        let before = forest();
        let after = delete_node(&before, "missing");
        assert!(before
            .roots
            .iter()
            .zip(after.roots.iter())
            .all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn given_rename_deep_when_rewriting_then_sibling_subtrees_shared() {
        let before = forest();
        let after = rename_node(&before, "1-2", "Server");

        assert!(Arc::ptr_eq(&before.roots[1], &after.roots[1]));
        assert!(Arc::ptr_eq(&before.roots[0].children[0], &after.roots[0].children[0]));
        assert!(!Arc::ptr_eq(&before.roots[0], &after.roots[0]));
        assert_eq!(after.roots[0].children[1].name, "Server");
    }

    #[test]
    fn given_child_added_when_parent_collapsed_then_parent_expands() {
        let after = add_child(&forest(), "2", "New");
        let parent = find_node(&after, "2").unwrap();
        assert!(parent.expanded);
        assert_eq!(parent.children.len(), 2);
        assert_eq!(parent.children[1].name, "New");
        assert!(parent.children[1].loaded);
    }

    #[test]
    fn given_local_child_on_unloaded_node_when_load_completes_then_kept_after_fetched() {
        let with_local = attach_child(&forest(), "1-1", TreeNode::leaf("local", "Mine"));
        let Toggle::FetchRequired(loading) = toggle_expand(&with_local, "1-1") else {
            panic!("expected fetch");
        };
        let done = complete_load(
            &loading,
            "1-1",
            vec![ChildSpec::leaf("1-1-1", "React"), ChildSpec::leaf("1-1-2", "TypeScript")],
        );
        let node = find_node(&done, "1-1").unwrap();
        let ids: Vec<_> = node.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1-1-1", "1-1-2", "local"]);
        assert_eq!(node.state(), NodeState::ExpandedLoaded);
    }

    #[test]
    fn given_fetched_duplicate_id_when_completing_then_dropped() {
        let Toggle::FetchRequired(loading) = toggle_expand(&forest(), "1-2") else {
            panic!("expected fetch");
        };
        let done = complete_load(
            &loading,
            "1-2",
            vec![ChildSpec::leaf("2-1", "Clash"), ChildSpec::leaf("1-2-1", "Node.js")],
        );
        assert_eq!(subtree_ids(&done, "1-2"), vec!["1-2", "1-2-1"]);
        assert!(done.validate().is_ok());
    }

    #[test]
    fn given_loading_node_when_aborted_then_collapsed_unloaded() {
        let Toggle::FetchRequired(loading) = toggle_expand(&forest(), "1-1") else {
            panic!("expected fetch");
        };
        let reverted = abort_load(&loading, "1-1");
        assert_eq!(node_state(&reverted, "1-1"), Some(NodeState::CollapsedUnloaded));
        assert!(find_node(&reverted, "1-1").unwrap().children.is_empty());
    }

    #[test]
    fn given_loaded_node_when_aborted_then_untouched() {
        let before = forest();
        assert_eq!(abort_load(&before, "2"), before);
    }

    #[test]
    fn given_root_name_when_adding_root_then_appended_last() {
        let after = add_root(&forest(), " Third ");
        assert_eq!(after.roots.len(), 3);
        assert_eq!(after.roots[2].name, "Third");
        assert!(after.roots[2].loaded);
    }
}
