use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::solver::engine::VariableId;

/// One variable's view of the pseudo-tree: its parent (none for the root)
/// and its ordered list of children. This is the payload of the one-shot
/// tree notification each agent consumes; it is immutable once delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeView {
    pub variable: VariableId,
    pub parent: Option<VariableId>,
    pub children: Vec<VariableId>,
}

impl TreeView {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// A pseudo-tree over the constraint graph, used to structure message flow.
///
/// Constructed by a depth-first traversal of the primal graph (variables as
/// nodes, one edge per pair of variables sharing a cost function). The
/// traversal guarantees the defining property of a pseudo-tree: every pair
/// of constrained variables lies on a common root-to-leaf path, so all
/// constraint-relevant ancestors of a variable sit on its path to the root.
///
/// This is a stand-in for an external tree-construction protocol; the
/// search engine itself only ever consumes the per-variable [`TreeView`]s.
#[derive(Debug, Clone)]
pub struct PseudoTree {
    root: VariableId,
    views: BTreeMap<VariableId, TreeView>,
    depths: BTreeMap<VariableId, usize>,
}

impl PseudoTree {
    /// Builds a pseudo-tree for `variables` from the scopes of the
    /// problem's cost functions. `root` overrides the default root choice
    /// (the lowest variable id).
    ///
    /// Variables in components disconnected from the root are attached
    /// directly beneath it; no constraint crosses such an attachment, so
    /// the pseudo-tree property is preserved.
    pub fn from_scopes(
        variables: &[VariableId],
        scopes: &[Vec<VariableId>],
        root: Option<VariableId>,
    ) -> Self {
        let mut neighbours: BTreeMap<VariableId, BTreeSet<VariableId>> =
            variables.iter().map(|v| (*v, BTreeSet::new())).collect();
        for scope in scopes {
            for a in scope {
                for b in scope {
                    if a != b {
                        neighbours.entry(*a).or_default().insert(*b);
                    }
                }
            }
        }

        let root = root
            .or_else(|| variables.iter().min().copied())
            .unwrap_or(0);

        let mut views: BTreeMap<VariableId, TreeView> = BTreeMap::new();
        let mut depths: BTreeMap<VariableId, usize> = BTreeMap::new();
        let mut visited: BTreeSet<VariableId> = BTreeSet::new();

        Self::dfs(root, None, 0, &neighbours, &mut views, &mut depths, &mut visited);

        // Any variable the traversal never reached belongs to a component
        // with no constraint path to the root; hang it off the root.
        let orphans: Vec<VariableId> = variables
            .iter()
            .filter(|v| !visited.contains(v))
            .copied()
            .collect();
        for orphan in orphans {
            if visited.contains(&orphan) {
                continue;
            }
            debug!(variable = orphan, "attaching disconnected component under the root");
            Self::dfs(
                orphan,
                Some(root),
                1,
                &neighbours,
                &mut views,
                &mut depths,
                &mut visited,
            );
            if let Some(view) = views.get_mut(&root) {
                view.children.push(orphan);
            }
        }

        Self {
            root,
            views,
            depths,
        }
    }

    fn dfs(
        variable: VariableId,
        parent: Option<VariableId>,
        depth: usize,
        neighbours: &BTreeMap<VariableId, BTreeSet<VariableId>>,
        views: &mut BTreeMap<VariableId, TreeView>,
        depths: &mut BTreeMap<VariableId, usize>,
        visited: &mut BTreeSet<VariableId>,
    ) {
        visited.insert(variable);
        depths.insert(variable, depth);
        views.insert(
            variable,
            TreeView {
                variable,
                parent,
                children: Vec::new(),
            },
        );

        let adjacent = neighbours.get(&variable).cloned().unwrap_or_default();
        for next in adjacent {
            if !visited.contains(&next) {
                Self::dfs(next, Some(variable), depth + 1, neighbours, views, depths, visited);
                if let Some(view) = views.get_mut(&variable) {
                    view.children.push(next);
                }
            }
        }
    }

    pub fn root(&self) -> VariableId {
        self.root
    }

    pub fn view(&self, variable: VariableId) -> Option<&TreeView> {
        self.views.get(&variable)
    }

    pub fn views(&self) -> impl Iterator<Item = &TreeView> {
        self.views.values()
    }

    pub fn depth(&self, variable: VariableId) -> Option<usize> {
        self.depths.get(&variable).copied()
    }

    /// The deepest variable of a scope — the one that ends up owning the
    /// cost function during normalization.
    pub fn deepest(&self, scope: &[VariableId]) -> Option<VariableId> {
        scope
            .iter()
            .filter_map(|v| self.depths.get(v).map(|d| (*d, *v)))
            .max()
            .map(|(_, v)| v)
    }

    /// Variables in bottom-up order (deepest first), used by the normalizer
    /// to accumulate separators from the leaves towards the root.
    pub fn bottom_up(&self) -> Vec<VariableId> {
        let mut order: Vec<VariableId> = self.views.keys().copied().collect();
        order.sort_by_key(|v| std::cmp::Reverse(self.depths.get(v).copied().unwrap_or(0)));
        order
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn a_chain_of_binary_scopes_builds_a_chain_tree() {
        let tree = PseudoTree::from_scopes(&[0, 1, 2], &[vec![0, 1], vec![1, 2]], None);

        assert_eq!(tree.root(), 0);
        assert_eq!(tree.view(0).unwrap().children, vec![1]);
        assert_eq!(tree.view(1).unwrap().parent, Some(0));
        assert_eq!(tree.view(1).unwrap().children, vec![2]);
        assert!(tree.view(2).unwrap().is_leaf());
        assert_eq!(tree.depth(2), Some(2));
    }

    #[test]
    fn constrained_pairs_end_up_on_one_root_to_leaf_path() {
        // A triangle plus a pendant: 0-1, 1-2, 0-2, 2-3.
        let scopes = vec![vec![0, 1], vec![1, 2], vec![0, 2], vec![2, 3]];
        let tree = PseudoTree::from_scopes(&[0, 1, 2, 3], &scopes, None);

        for scope in &scopes {
            let (a, b) = (scope[0], scope[1]);
            let (da, db) = (tree.depth(a).unwrap(), tree.depth(b).unwrap());
            let (shallow, mut deep) = if da <= db { (a, b) } else { (b, a) };

            // Walk up from the deeper endpoint; we must meet the other one.
            while tree.depth(deep).unwrap() > tree.depth(shallow).unwrap() {
                deep = tree.view(deep).unwrap().parent.unwrap();
            }
            assert_eq!(deep, shallow, "scope {:?} spans branches", scope);
        }
    }

    #[test]
    fn disconnected_variables_hang_off_the_root() {
        let tree = PseudoTree::from_scopes(&[0, 1, 5], &[vec![0, 1]], None);

        assert_eq!(tree.view(5).unwrap().parent, Some(0));
        assert!(tree.view(0).unwrap().children.contains(&5));
    }

    #[test]
    fn the_deepest_scope_variable_owns_the_constraint() {
        let tree = PseudoTree::from_scopes(&[0, 1, 2], &[vec![0, 1], vec![1, 2], vec![0, 2]], None);
        assert_eq!(tree.deepest(&[0, 2]), Some(2));
        assert_eq!(tree.deepest(&[0, 1]), Some(1));
    }

    #[test]
    fn an_explicit_root_is_honoured() {
        let tree = PseudoTree::from_scopes(&[0, 1, 2], &[vec![0, 1], vec![1, 2]], Some(1));
        assert_eq!(tree.root(), 1);
        assert!(tree.view(1).unwrap().is_root());
    }
}
