//! クラス階層
//!
//! Taxonomy over named classes: equivalent classes share a node and every
//! node links to its direct super and sub nodes.

use crate::entity::ClassId;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A set of equivalent classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyNode {
    /// Equivalent classes in ascending id order
    pub classes: Vec<ClassId>,
    /// Indexes of the direct super nodes
    pub parents: Vec<usize>,
    /// Indexes of the direct sub nodes
    pub children: Vec<usize>,
}

impl HierarchyNode {
    /// The smallest class id of the node
    pub fn representative(&self) -> ClassId {
        self.classes[0]
    }
}

/// Class hierarchy DAG
#[derive(Debug, Clone, Serialize)]
pub struct ClassHierarchy {
    nodes: Vec<HierarchyNode>,
    #[serde(skip)]
    node_of: FxHashMap<ClassId, usize>,
}

impl ClassHierarchy {
    /// Build the hierarchy of `classes` from their subsumer sets.
    ///
    /// `subsumers_of(c)` must contain `c` itself and be transitively closed
    /// over `classes`; ids outside `classes` are ignored.
    pub fn build<F>(classes: &BTreeSet<ClassId>, subsumers_of: F) -> Self
    where
        F: Fn(ClassId) -> BTreeSet<ClassId>,
    {
        let supers: BTreeMap<ClassId, BTreeSet<ClassId>> = classes
            .iter()
            .map(|&class| {
                let mut set: BTreeSet<ClassId> =
                    subsumers_of(class).into_iter().filter(|c| classes.contains(c)).collect();
                set.insert(class);
                (class, set)
            })
            .collect();
        let subsumes = |sub: ClassId, sup: ClassId| supers.get(&sub).is_some_and(|set| set.contains(&sup));

        // 同値クラスをまとめる
        let mut nodes: Vec<HierarchyNode> = Vec::new();
        let mut node_of: FxHashMap<ClassId, usize> = FxHashMap::default();
        for (&class, class_supers) in &supers {
            if node_of.contains_key(&class) {
                continue;
            }
            let members: Vec<ClassId> = class_supers
                .iter()
                .copied()
                .filter(|&other| subsumes(other, class))
                .collect();
            let index = nodes.len();
            for &member in &members {
                node_of.insert(member, index);
            }
            nodes.push(HierarchyNode { classes: members, parents: Vec::new(), children: Vec::new() });
        }

        let strict_supers: Vec<BTreeSet<usize>> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                supers
                    .get(&node.representative())
                    .into_iter()
                    .flatten()
                    .filter_map(|c| node_of.get(c).copied())
                    .filter(|&other| other != index)
                    .collect()
            })
            .collect();

        // 直接の上位ノードだけを残す
        for (index, above) in strict_supers.iter().enumerate() {
            let direct: Vec<usize> = above
                .iter()
                .copied()
                .filter(|&candidate| {
                    !above
                        .iter()
                        .any(|&other| other != candidate && strict_supers[other].contains(&candidate))
                })
                .collect();
            for &parent in &direct {
                nodes[parent].children.push(index);
            }
            nodes[index].parents = direct;
        }

        Self { nodes, node_of }
    }

    pub fn nodes(&self) -> &[HierarchyNode] {
        &self.nodes
    }

    pub fn node_of(&self, class: ClassId) -> Option<&HierarchyNode> {
        self.node_of.get(&class).map(|&index| &self.nodes[index])
    }

    /// The node holding ⊤
    pub fn top(&self) -> Option<&HierarchyNode> {
        self.node_of(ClassId::TOP)
    }

    /// The node holding ⊥ and every unsatisfiable class
    pub fn bottom(&self) -> Option<&HierarchyNode> {
        self.node_of(ClassId::BOTTOM)
    }

    /// Classes equivalent to `class`, `class` included
    pub fn equivalents(&self, class: ClassId) -> &[ClassId] {
        self.node_of(class).map(|node| node.classes.as_slice()).unwrap_or(&[])
    }

    pub fn direct_super_classes(&self, class: ClassId) -> Vec<&HierarchyNode> {
        self.node_of(class)
            .map(|node| node.parents.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    pub fn direct_sub_classes(&self, class: ClassId) -> Vec<&HierarchyNode> {
        self.node_of(class)
            .map(|node| node.children.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// Every class strictly above `class`
    pub fn super_classes(&self, class: ClassId) -> BTreeSet<ClassId> {
        self.reachable_classes(class, |node| &node.parents)
    }

    /// Every class strictly below `class`
    pub fn sub_classes(&self, class: ClassId) -> BTreeSet<ClassId> {
        self.reachable_classes(class, |node| &node.children)
    }

    fn reachable_classes<'h>(&'h self, class: ClassId, next: impl Fn(&'h HierarchyNode) -> &'h Vec<usize>) -> BTreeSet<ClassId> {
        let mut classes = BTreeSet::new();
        let Some(&start) = self.node_of.get(&class) else {
            return classes;
        };
        let mut visited = BTreeSet::from([start]);
        let mut stack = next(&self.nodes[start]).clone();
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            let node = &self.nodes[index];
            classes.extend(node.classes.iter().copied());
            stack.extend(next(node).iter().copied());
        }
        classes
    }
}
