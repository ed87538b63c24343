//! Pedigree tree construction.
//!
//! Turns a flat list of [`AncestorRecord`]s, each naming the descendant it is a
//! direct parent of, into a rooted tree for one focal individual. The tree
//! grows upward: a node's `children` are its parents, in input order.
//!
//! Source data is not trusted to be acyclic. The builder carries the set of ids
//! on the current root-to-node path and refuses to descend into an id already on
//! it, so a record pointing back at one of its own descendants ends that branch
//! instead of recursing forever. The same ancestor reached through two different
//! branches (common in line-bred stock) is not a cycle and is expanded in both.
//!
//! Expansion uses an explicit work stack, and a tree never grows past
//! [`MAX_GENERATIONS`]: deeper records are left out and the individuals at the
//! cut are listed in [`BuildReport::truncated`].

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

use super::{AncestorRecord, FocalAnimal, Sex};

/// Deepest tree the builder produces, counting the focal individual.
pub const MAX_GENERATIONS: usize = 256;

/// A node of the built pedigree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub display_name: String,
    pub sex: Sex,
    /// Direct parents of this individual, in input order
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Create a node with no parents attached.
    pub fn leaf(id: impl Into<String>, display_name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            sex,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(&node.children);
        }
        count
    }

    /// Number of generations in this subtree (a leaf is 1).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }

    /// Depth-first (pre-order) search for the first node with `id`.
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Ids of the direct parents, in order.
    pub fn child_ids(&self) -> Vec<&str> {
        self.children.iter().map(|c| c.id.as_str()).collect()
    }
}

impl Drop for TreeNode {
    // Parents are moved onto a flat stack; dropping never recurses.
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

/// A record that would have closed a loop back onto the current path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleWarning {
    /// Id of the record that was not expanded
    pub ancestor_id: String,
    /// The descendant it claimed to be a parent of
    pub descendant_id: String,
}

/// Structural diagnostics gathered while building a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    /// Branches cut because they looped back onto their own path
    pub cycles: Vec<CycleWarning>,
    /// Extra occurrences of a repeated sibling id, keyed by id
    pub duplicates: BTreeMap<String, usize>,
    /// Individuals with more than two upward links (kept, reported for review)
    pub multi_parent: Vec<String>,
    /// Individuals at the generation cap whose recorded parents were left out
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub truncated: Vec<String>,
}

impl BuildReport {
    /// Total number of dropped duplicate records.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.values().sum()
    }

    /// True when no cycle, duplicate or truncation was found.
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty() && self.duplicates.is_empty() && self.truncated.is_empty()
    }

    fn record_truncation(&mut self, id: &str) {
        warn!(
            id,
            max_generations = MAX_GENERATIONS,
            "pedigree too deep, ancestors beyond the cap left out"
        );
        self.truncated.push(id.to_string());
    }

    fn record_cycle(&mut self, ancestor_id: &str, descendant_id: &str) {
        let seen = self
            .cycles
            .iter()
            .any(|c| c.ancestor_id == ancestor_id && c.descendant_id == descendant_id);
        if !seen {
            warn!(
                ancestor = ancestor_id,
                descendant = descendant_id,
                "pedigree cycle: ancestor already on path, branch truncated"
            );
            self.cycles.push(CycleWarning {
                ancestor_id: ancestor_id.to_string(),
                descendant_id: descendant_id.to_string(),
            });
        }
    }
}

/// A built pedigree with its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PedigreeTree {
    pub root: TreeNode,
    pub report: BuildReport,
}

impl PedigreeTree {
    /// Number of generations including the focal individual.
    pub fn generations(&self) -> usize {
        self.root.depth()
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }
}

/// Indexes ancestor records by descendant and expands them into a tree.
pub struct AncestryTreeBuilder<'a> {
    by_descendant: HashMap<&'a str, Vec<&'a AncestorRecord>>,
    report: BuildReport,
}

impl<'a> AncestryTreeBuilder<'a> {
    /// Index `ancestors` by `descendant_id`, dropping repeated sibling ids.
    ///
    /// Records without a descendant cannot be attached anywhere and are ignored.
    pub fn new(ancestors: &'a [AncestorRecord]) -> Self {
        let mut by_descendant: HashMap<&'a str, Vec<&'a AncestorRecord>> = HashMap::new();
        let mut report = BuildReport::default();

        for record in ancestors {
            let Some(descendant) = record.descendant_id.as_deref() else {
                continue;
            };
            let siblings = by_descendant.entry(descendant).or_default();
            if siblings.iter().any(|s| s.id == record.id) {
                warn!(
                    id = %record.id,
                    descendant,
                    "duplicate ancestor record dropped"
                );
                *report.duplicates.entry(record.id.clone()).or_insert(0) += 1;
                continue;
            }
            siblings.push(record);
        }

        let mut multi_parent: Vec<String> = by_descendant
            .iter()
            .filter(|(_, parents)| parents.len() > 2)
            .map(|(id, _)| id.to_string())
            .collect();
        multi_parent.sort();
        for id in &multi_parent {
            debug!(id = %id, "individual has more than two upward links");
        }
        report.multi_parent = multi_parent;

        Self {
            by_descendant,
            report,
        }
    }

    /// Records whose `descendant_id` is `parent_id`, in input order.
    pub fn children_of(&self, parent_id: &str) -> &[&'a AncestorRecord] {
        self.by_descendant
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Build the tree rooted at `focal`.
    pub fn build(mut self, focal: &'a FocalAnimal) -> PedigreeTree {
        let mut report = std::mem::take(&mut self.report);
        let mut path: HashSet<&'a str> = HashSet::new();
        path.insert(focal.id.as_str());

        let mut stack = vec![Frame::new(focal.id.as_str(), None)];
        let children = loop {
            let generation = stack.len();
            let Some(frame) = stack.last_mut() else {
                break Vec::new();
            };
            let parents = self.children_of(frame.id);

            if generation >= MAX_GENERATIONS && frame.next < parents.len() {
                report.record_truncation(frame.id);
                frame.next = parents.len();
            }
            if let Some(&record) = parents.get(frame.next) {
                frame.next += 1;
                let id = record.id.as_str();
                if path.contains(id) {
                    report.record_cycle(id, frame.id);
                } else {
                    path.insert(id);
                    stack.push(Frame::new(id, Some(record)));
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                break Vec::new();
            };
            let Some(record) = done.record else {
                break done.children;
            };
            path.remove(done.id);
            if let Some(below) = stack.last_mut() {
                below.children.push(TreeNode {
                    id: record.id.clone(),
                    display_name: record.display_name.clone(),
                    sex: record.sex,
                    children: done.children,
                });
            }
        };

        PedigreeTree {
            root: TreeNode {
                id: focal.id.clone(),
                display_name: focal.display_name.clone(),
                sex: focal.sex,
                children,
            },
            report,
        }
    }
}

/// One individual being expanded. `record` is `None` for the focal individual.
struct Frame<'a> {
    id: &'a str,
    record: Option<&'a AncestorRecord>,
    next: usize,
    children: Vec<TreeNode>,
}

impl<'a> Frame<'a> {
    fn new(id: &'a str, record: Option<&'a AncestorRecord>) -> Self {
        Self {
            id,
            record,
            next: 0,
            children: Vec::new(),
        }
    }
}

/// Build the pedigree of `focal` from a flat ancestor list.
pub fn build_tree(focal: &FocalAnimal, ancestors: &[AncestorRecord]) -> PedigreeTree {
    AncestryTreeBuilder::new(ancestors).build(focal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn focal() -> FocalAnimal {
        FocalAnimal::new("F", "Focal", Sex::Male)
    }

    fn rec(id: &str, descendant: &str) -> AncestorRecord {
        AncestorRecord::new(id, format!("Animal {}", id), Sex::Unknown, descendant)
    }

    #[test]
    fn test_tree_shape_preserves_input_order() {
        let ancestors = vec![rec("B", "F"), rec("C", "F"), rec("D", "B")];
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.root.id, "F");
        assert_eq!(tree.root.child_ids(), vec!["B", "C"]);
        assert_eq!(tree.root.children[0].child_ids(), vec!["D"]);
        assert!(tree.root.children[1].is_leaf());
        assert!(tree.report.is_clean());
        assert_eq!(tree.generations(), 3);
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn test_empty_ancestors_is_single_leaf() {
        let tree = build_tree(&focal(), &[]);
        assert!(tree.root.is_leaf());
        assert_eq!(tree.root.display_name, "Focal");
        assert_eq!(tree.node_count(), 1);
        assert!(tree.report.is_clean());
    }

    #[test]
    fn test_cycle_through_root_terminates() {
        let ancestors = vec![rec("X", "F"), rec("F", "X")];
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.root.child_ids(), vec!["X"]);
        assert!(tree.root.children[0].is_leaf());
        assert_eq!(
            tree.report.cycles,
            vec![CycleWarning {
                ancestor_id: "F".to_string(),
                descendant_id: "X".to_string(),
            }]
        );
    }

    #[test]
    fn test_longer_cycle_terminates() {
        let ancestors = vec![rec("A", "F"), rec("B", "A"), rec("C", "B"), rec("A", "C")];
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.node_count(), 4);
        assert_eq!(tree.report.cycles.len(), 1);
        assert_eq!(tree.report.cycles[0].ancestor_id, "A");
        assert_eq!(tree.report.cycles[0].descendant_id, "C");
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let ancestors = vec![rec("F", "F")];
        let tree = build_tree(&focal(), &ancestors);
        assert!(tree.root.is_leaf());
        assert_eq!(tree.report.cycles.len(), 1);
    }

    #[test]
    fn test_duplicate_siblings_expanded_once() {
        let ancestors = vec![rec("B", "F"), rec("B", "F"), rec("B", "F"), rec("G", "B")];
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.root.child_ids(), vec!["B"]);
        assert_eq!(tree.root.children[0].child_ids(), vec!["G"]);
        assert_eq!(tree.report.duplicate_count(), 2);
        assert_eq!(tree.report.duplicates.get("B"), Some(&2));
        assert!(!tree.report.is_clean());
    }

    #[test]
    fn test_shared_ancestor_in_two_branches_is_not_a_cycle() {
        // Both parents share the same sire (line breeding)
        let ancestors = vec![rec("S", "F"), rec("D", "F"), rec("G", "S"), rec("G", "D")];
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.root.children[0].child_ids(), vec!["G"]);
        assert_eq!(tree.root.children[1].child_ids(), vec!["G"]);
        assert!(tree.report.is_clean());
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_more_than_two_parents_kept() {
        let ancestors = vec![rec("P1", "F"), rec("P2", "F"), rec("P3", "F")];
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.root.child_ids(), vec!["P1", "P2", "P3"]);
        assert_eq!(tree.report.multi_parent, vec!["F".to_string()]);
        assert!(tree.report.is_clean());
    }

    #[test]
    fn test_unattached_records_ignored() {
        let mut orphan = rec("O", "F");
        orphan.descendant_id = None;
        let ancestors = vec![orphan, rec("Z", "nobody")];
        let tree = build_tree(&focal(), &ancestors);
        assert!(tree.root.is_leaf());
    }

    #[test]
    fn test_children_of_unknown_is_empty() {
        let ancestors = vec![rec("B", "F")];
        let builder = AncestryTreeBuilder::new(&ancestors);
        assert_eq!(builder.children_of("F").len(), 1);
        assert!(builder.children_of("missing").is_empty());
    }

    #[test]
    fn test_find_and_depth() {
        let ancestors = vec![rec("B", "F"), rec("D", "B"), rec("E", "D")];
        let tree = build_tree(&focal(), &ancestors);
        assert_eq!(tree.root.find("E").map(|n| n.id.as_str()), Some("E"));
        assert!(tree.root.find("Q").is_none());
        assert_eq!(tree.root.depth(), 4);
    }

    #[test]
    fn test_find_returns_first_in_preorder() {
        let mut ancestors = vec![rec("S", "F"), rec("D", "F"), rec("G", "S"), rec("G", "D")];
        ancestors[3].display_name = "Second G".to_string();
        let tree = build_tree(&focal(), &ancestors);
        assert_eq!(tree.root.find("G").map(|n| n.display_name.as_str()), Some("Animal G"));
    }

    fn chain(generations: usize) -> Vec<AncestorRecord> {
        let mut ancestors = vec![rec("A1", "F")];
        for i in 2..generations {
            ancestors.push(rec(&format!("A{}", i), &format!("A{}", i - 1)));
        }
        ancestors
    }

    #[test]
    fn test_very_deep_lineage_is_capped() {
        let ancestors = chain(10_000);
        let tree = build_tree(&focal(), &ancestors);

        assert_eq!(tree.generations(), MAX_GENERATIONS);
        assert_eq!(tree.node_count(), MAX_GENERATIONS);
        let last = format!("A{}", MAX_GENERATIONS - 1);
        assert_eq!(tree.report.truncated, vec![last.clone()]);
        assert!(tree.root.find(&last).is_some_and(TreeNode::is_leaf));
        assert!(tree.report.cycles.is_empty());
        assert!(!tree.report.is_clean());
    }

    #[test]
    fn test_queries_on_hand_built_deep_tree() {
        let mut root = TreeNode::leaf("N0", "N0", Sex::Female);
        for i in 1..100_000 {
            let mut child = TreeNode::leaf(format!("N{}", i), "", Sex::Female);
            std::mem::swap(&mut root, &mut child);
            root.children.push(child);
        }
        assert_eq!(root.node_count(), 100_000);
        assert_eq!(root.depth(), 100_000);
        assert!(root.find("N0").is_some_and(TreeNode::is_leaf));
    }

    #[test]
    fn test_lineage_at_the_cap_is_complete() {
        let ancestors = chain(MAX_GENERATIONS);
        let tree = build_tree(&focal(), &ancestors);
        assert_eq!(tree.generations(), MAX_GENERATIONS);
        assert!(tree.report.is_clean());
    }
}
