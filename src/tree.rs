// SPDX-License-Identifier: MIT

//! An ordered tree of named nodes, the intermediate form of tree-shaped
//! formats.
//!
//! Nodes live in an arena and are addressed by [NodeId]. Each node owns
//! the ids of its children and knows its parent. Detached nodes stay in
//! the arena but are no longer reachable from the root.

use crate::{Position, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub comment: Option<String>,
    /// Where the node was read from, if it was parsed from a document
    pub position: Option<Position>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn new(name: &str) -> Node {
        Node {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Node {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Node {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_comment(mut self, comment: Option<String>) -> Node {
        self.comment = comment;
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing one with the same name.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// A tree with a single root node named `root`.
    pub fn new(root: &str) -> Tree {
        Tree {
            nodes: vec![Node::new(root)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn add(&mut self, mut node: Node, parent: NodeId) -> Result<NodeId> {
        self.nodes.try_reserve(1)?;
        self.nodes[parent.0].children.try_reserve(1)?;
        node.parent = Some(parent);
        node.children.clear();
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        Ok(id)
    }

    /// Append `node` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, node: Node) -> Result<NodeId> {
        let id = self.add(node, parent)?;
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Insert `node` as the next sibling of `sibling`. The root has no
    /// siblings, inserting after it appends to the root instead.
    pub fn insert_after(&mut self, sibling: NodeId, node: Node) -> Result<NodeId> {
        let Some(parent) = self.parent(sibling) else {
            return self.append(sibling, node);
        };
        let id = self.add(node, parent)?;
        let siblings = &mut self.nodes[parent.0].children;
        let idx = siblings
            .iter()
            .position(|c| *c == sibling)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(idx, id);
        Ok(id)
    }

    /// Move all children of `from` to the end of the children of `to`,
    /// keeping their order.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        self.nodes[to.0].children.try_reserve(children.len())?;
        for child in children.iter() {
            self.nodes[child.0].parent = Some(to);
        }
        self.nodes[to.0].children.extend(children);
        Ok(())
    }

    /// Detach `id` from its parent. Its subtree becomes unreachable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|c| *c != id);
        }
    }

    /// `id` followed by its ancestors up to and including the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |n| self.parent(*n))
    }
}
