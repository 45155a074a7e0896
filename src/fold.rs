// SPDX-License-Identifier: MIT

//! Folding an item stream into a [Tree] and unfolding it back.
//!
//! Three constructs bracket items: Collection/End Collection,
//! Push/Pop and Delimiter open/close. Each of them becomes a container
//! node (`collection`, `push-scope`, `delimiter-scope`) holding the
//! items in between. Descriptors do not have to nest the three
//! properly, e.g.
//!
//! ```text
//! Collection (Application)
//!     Push
//! End Collection
//!     Pop
//! ```
//!
//! When a closing item matches a container further up than the current
//! one, every container in between is *broken*: it is replaced by a
//! resume node (`collection-resume`, `push-resume`,
//! `delimiter-resume`) with the same attributes and children, which
//! stands for the opening item only. The example above folds into
//!
//! ```text
//! descriptor
//!   collection type=application
//!     push-resume
//!   pop
//! ```
//!
//! A closing item without a matching container is kept as a leaf. At
//! the end of the stream every container still open is broken.
//! Unfolding the tree reproduces the original item stream.
//!
//! ```
//! # use hidrd::fold::{Folder, Unfolder};
//! # use hidrd::hid::Item;
//! # use hidrd::strm::Source;
//! let bytes = [0xa1, 0x01, 0xa4, 0xc0, 0xb4];
//! let mut folder = Folder::new();
//! let mut offset = 0;
//! while offset < bytes.len() {
//!     let (item, size) = Item::decode(&bytes[offset..]).unwrap();
//!     folder.put(&item).unwrap();
//!     offset += size;
//! }
//! let tree = folder.finish().unwrap();
//! let mut unfolder = Unfolder::new(tree);
//! let mut out = Vec::new();
//! while let Some(item) = unfolder.get().unwrap() {
//!     out.extend(item.encode());
//! }
//! assert_eq!(out, bytes);
//! ```

use crate::context::Context;
use crate::element::{self, DATA_ATTR, END_DATA_ATTR, END_SIZE_ATTR, SIZE_ATTR};
use crate::hid::Item;
use crate::item::{GlobalItem, LocalItem, MainItem, SemanticItem};
use crate::strm::Source;
use crate::tree::{Node, NodeId, Tree};
use crate::types::Delimiter;
use crate::{Position, Result};

use log::{debug, trace};

/// The name of the root node.
pub const ROOT: &str = "descriptor";

/// The three bracketing constructs of a report descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Collection,
    Push,
    Delimiter,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Collection, Group::Push, Group::Delimiter];

    /// The name of a container node of this group.
    pub fn container(&self) -> &'static str {
        match self {
            Group::Collection => "collection",
            Group::Push => "push-scope",
            Group::Delimiter => "delimiter-scope",
        }
    }

    /// The name of a resume node of this group.
    pub fn resume(&self) -> &'static str {
        match self {
            Group::Collection => "collection-resume",
            Group::Push => "push-resume",
            Group::Delimiter => "delimiter-resume",
        }
    }

    fn end(&self) -> SemanticItem {
        match self {
            Group::Collection => MainItem::EndCollection.into(),
            Group::Push => GlobalItem::Pop.into(),
            Group::Delimiter => LocalItem::Delimiter(Delimiter::CLOSE).into(),
        }
    }

    fn from_container(name: &str) -> Option<Group> {
        Group::ALL.into_iter().find(|g| g.container() == name)
    }

    fn from_resume(name: &str) -> Option<Group> {
        Group::ALL.into_iter().find(|g| g.resume() == name)
    }
}

/// How an item takes part in bracketing.
enum Bracket {
    Start(Group),
    End(Group),
    None,
}

impl From<&SemanticItem> for Bracket {
    fn from(item: &SemanticItem) -> Bracket {
        match item {
            SemanticItem::Main(MainItem::Collection(_)) => Bracket::Start(Group::Collection),
            SemanticItem::Main(MainItem::EndCollection) => Bracket::End(Group::Collection),
            SemanticItem::Global(GlobalItem::Push) => Bracket::Start(Group::Push),
            SemanticItem::Global(GlobalItem::Pop) => Bracket::End(Group::Push),
            SemanticItem::Local(LocalItem::Delimiter(d)) if d.is_open() => {
                Bracket::Start(Group::Delimiter)
            }
            SemanticItem::Local(LocalItem::Delimiter(d)) if d.is_close() => {
                Bracket::End(Group::Delimiter)
            }
            _ => Bracket::None,
        }
    }
}

/// Builds a [Tree] from items pushed one at a time.
#[derive(Debug)]
pub struct Folder {
    tree: Tree,
    current: NodeId,
    context: Context,
}

impl Default for Folder {
    fn default() -> Self {
        Folder::new()
    }
}

impl Folder {
    pub fn new() -> Folder {
        let tree = Tree::new(ROOT);
        let current = tree.root();
        Folder {
            tree,
            current,
            context: Context::new(),
        }
    }

    pub fn put(&mut self, item: &Item) -> Result<()> {
        let semantic = SemanticItem::interpret(item, &mut self.context);
        let mut node = element::to_node(item, &semantic, &self.context);

        match Bracket::from(&semantic) {
            Bracket::Start(group) => {
                node.name = group.container().to_string();
                // Containers carry the opening item in their name
                node.text = None;
                self.current = self.tree.append(self.current, node)?;
            }
            Bracket::End(group) => match self.find_open(group) {
                Some(target) => {
                    self.break_branch(self.current, target)?;
                    element::record_payload(
                        self.tree.node_mut(target),
                        item,
                        &semantic,
                        &semantic,
                        END_SIZE_ATTR,
                        END_DATA_ATTR,
                    );
                    self.current = self.tree.parent(target).unwrap_or(self.tree.root());
                }
                None => {
                    debug!("Unmatched {} closing item, keeping it as a leaf", group.container());
                    self.tree.append(self.current, node)?;
                }
            },
            Bracket::None => {
                self.tree.append(self.current, node)?;
            }
        }
        Ok(())
    }

    /// The innermost open container of `group`.
    fn find_open(&self, group: Group) -> Option<NodeId> {
        self.tree
            .ancestors(self.current)
            .find(|id| self.tree.node(*id).name == group.container())
    }

    /// Break every container from `from` up to, but excluding, `until`.
    fn break_branch(&mut self, from: NodeId, until: NodeId) -> Result<()> {
        let branch: Vec<NodeId> = self
            .tree
            .ancestors(from)
            .take_while(|id| *id != until)
            .collect();
        for id in branch {
            self.break_node(id)?;
        }
        Ok(())
    }

    /// Replace container `id` with a resume node in place.
    fn break_node(&mut self, id: NodeId) -> Result<()> {
        let node = self.tree.node(id);
        let Some(group) = Group::from_container(&node.name) else {
            return Ok(());
        };
        trace!("Breaking {}", node.name);
        let mut resume = Node::new(group.resume());
        resume.attributes = node.attributes.clone();
        resume.comment = node.comment.clone();
        let resume = self.tree.insert_after(id, resume)?;
        self.tree.move_children(id, resume)?;
        self.tree.detach(id);
        Ok(())
    }

    /// Break all containers still open and return the tree.
    pub fn finish(mut self) -> Result<Tree> {
        let root = self.tree.root();
        self.break_branch(self.current, root)?;
        Ok(self.tree)
    }
}

struct Frame {
    node: NodeId,
    next_child: usize,
    end: Option<Item>,
}

/// A [Source] producing the items of a folded [Tree] in order.
pub struct Unfolder {
    tree: Tree,
    stack: Vec<Frame>,
    context: Context,
    index: usize,
    position: Position,
}

impl Unfolder {
    pub fn new(tree: Tree) -> Unfolder {
        let root = Frame {
            node: tree.root(),
            next_child: 0,
            end: None,
        };
        Unfolder {
            tree,
            stack: vec![root],
            context: Context::new(),
            index: 0,
            position: Position::Unknown,
        }
    }

    /// The opening and closing items of a container, or only the
    /// opening item of a resume node.
    fn group_items(&self, group: Group, node: &Node, resume: bool) -> Result<(Item, Option<Item>)> {
        let start: SemanticItem = match group {
            Group::Collection => {
                MainItem::Collection(element::container_collection(node, self.position)?).into()
            }
            Group::Push => GlobalItem::Push.into(),
            Group::Delimiter => LocalItem::Delimiter(Delimiter::OPEN).into(),
        };
        let start = element::lower_as(node, &start, SIZE_ATTR, DATA_ATTR, self.position)?;
        let end = match resume {
            true => None,
            false => Some(element::lower_as(
                node,
                &group.end(),
                END_SIZE_ATTR,
                END_DATA_ATTR,
                self.position,
            )?),
        };
        Ok((start, end))
    }

    fn emit(&mut self, item: Item) -> Result<Option<Item>> {
        SemanticItem::interpret(&item, &mut self.context);
        Ok(Some(item))
    }
}

impl Source for Unfolder {
    fn get(&mut self) -> Result<Option<Item>> {
        loop {
            let Some(frame) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(&child) = self.tree.children(frame.node).get(frame.next_child) else {
                let frame = self.stack.pop();
                match frame.and_then(|f| f.end) {
                    Some(end) => return self.emit(end),
                    None => continue,
                }
            };
            frame.next_child += 1;
            self.index += 1;

            let node = self.tree.node(child);
            self.position = node.position.unwrap_or(Position::Node(self.index));
            let container = Group::from_container(&node.name).map(|g| (g, false));
            let resume = Group::from_resume(&node.name).map(|g| (g, true));
            match container.or(resume) {
                Some((group, resume)) => {
                    let (start, end) = self.group_items(group, node, resume)?;
                    self.stack.push(Frame {
                        node: child,
                        next_child: 0,
                        end,
                    });
                    return self.emit(start);
                }
                None => {
                    let (_, item) = element::from_node(node, &self.context, self.position)?;
                    return self.emit(item);
                }
            }
        }
    }

    fn position(&self) -> Position {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn fold(bytes: &[u8]) -> Tree {
        let mut folder = Folder::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let (item, size) = Item::decode(&bytes[offset..]).unwrap();
            folder.put(&item).unwrap();
            offset += size;
        }
        folder.finish().unwrap()
    }

    fn unfold(tree: Tree) -> Vec<u8> {
        let mut unfolder = Unfolder::new(tree);
        let mut bytes = Vec::new();
        while let Some(item) = unfolder.get().unwrap() {
            bytes.extend(item.encode());
        }
        bytes
    }

    /// Render a tree as an s-expression like string for comparisons
    fn render(tree: &Tree, id: NodeId) -> String {
        let node = tree.node(id);
        let mut s = node.name.clone();
        for (name, value) in node.attributes.iter() {
            s.push_str(&format!("[{name}={value}]"));
        }
        if let Some(text) = &node.text {
            s.push_str(&format!("({text})"));
        }
        let children = tree.children(id);
        if !children.is_empty() || Group::from_container(&node.name).is_some() {
            let inner: Vec<String> = children.iter().map(|c| render(tree, *c)).collect();
            s.push_str(&format!("{{{}}}", inner.join(",")));
        }
        s
    }

    fn check(bytes: &[u8], expected: &str) {
        let tree = fold(bytes);
        assert_eq!(render(&tree, tree.root()), expected);
        assert_eq!(unfold(tree), bytes);
    }

    #[test]
    fn nested() {
        check(
            &[0x05, 0x0d, 0x09, 0x02, 0xa1, 0x01, 0x85, 0x07, 0xc0],
            "descriptor{usage_page(0d),usage(02),collection[type=application]{report_id(7)}}",
        );
    }

    #[test]
    fn collection_interleaved_with_push() {
        check(
            &[0xa1, 0x01, 0xa4, 0xc0, 0xb4],
            "descriptor{collection[type=application]{push-resume},pop}",
        );
    }

    #[test]
    fn push_interleaved_with_collection() {
        check(
            &[0xa4, 0xa1, 0x00, 0xb4, 0x81, 0x02, 0xc0],
            "descriptor{push-scope{collection-resume[type=physical]},input(variable),end_collection}",
        );
    }

    #[test]
    fn broken_container_keeps_children() {
        check(
            &[0xa4, 0xa1, 0x01, 0x75, 0x08, 0xa1, 0x02, 0x95, 0x01, 0xb4, 0xc0, 0xc0],
            "descriptor{push-scope{collection-resume[type=application]{report_size(8),\
             collection-resume[type=logical]{report_count(1)}}},end_collection,end_collection}",
        );
    }

    #[test]
    fn unmatched_closing_items() {
        check(
            &[0xb4, 0xc0, 0xa9, 0x00],
            "descriptor{pop,end_collection,delimiter(0)}",
        );
    }

    #[test]
    fn unterminated() {
        check(
            &[0xa1, 0x01, 0xa9, 0x01, 0x09, 0x30],
            "descriptor{collection-resume[type=application]{delimiter-resume{usage(30)}}}",
        );
    }

    #[test]
    fn delimiter_set() {
        check(
            &[0xa9, 0x01, 0x09, 0x30, 0x09, 0x31, 0xa9, 0x00],
            "descriptor{delimiter-scope{usage(30),usage(31)}}",
        );
        // Values other than open and close are plain leaves
        check(&[0xa9, 0x02], "descriptor{delimiter(2)}");
    }

    #[test]
    fn item_widths() {
        check(
            &[0xa2, 0x01, 0x00, 0xc1, 0x00],
            "descriptor{collection[type=application][size=2][end_size=1]{}}",
        );
        check(&[0xa7, 0, 0, 0, 0, 0xb7, 0, 0, 0, 0], "descriptor{push-scope[size=4][end_size=4]{}}");
        check(&[0xaa, 0x01, 0x00, 0xa8], "descriptor{delimiter-scope[size=2][end_size=0]{}}");
        // A zero-width delimiter is a close
        check(&[0xa8], "descriptor{delimiter[size=0](0)}");
    }

    #[test]
    fn payloads_kept_as_data() {
        check(&[0xa5, 0x01, 0xb4], "descriptor{push-scope[data=01]{}}");
        check(&[0xa4, 0xb5, 0x02], "descriptor{push-scope[end_data=02]{}}");
        check(&[0xa1, 0x01, 0xc1, 0x07], "descriptor{collection[type=application][end_data=07]{}}");
        check(
            &[0xa2, 0x01, 0x01, 0xc0],
            "descriptor{collection[type=application][data=01 01]{}}",
        );
        check(&[0x07, 0x01, 0x00, 0x01, 0x00], "descriptor{usage_page[data=01 00 01 00](01)}");
        // Unmatched closing items and resume nodes keep their data too
        check(&[0xb5, 0x02, 0xc2, 0x00, 0x01], "descriptor{pop[data=02],end_collection[data=00 01]}");
        check(
            &[0xa1, 0x01, 0xa5, 0x03, 0xc0, 0xb4],
            "descriptor{collection[type=application]{push-resume[data=03]},pop}",
        );
    }

    #[test]
    fn usage_pages_restored_by_pop() {
        check(
            &[
                0x05, 0x01, 0xa4, 0x05, 0x0d, 0x0b, 0x30, 0x00, 0x01, 0x00, 0xb4, 0x0b, 0x30, 0x00,
                0x01, 0x00,
            ],
            "descriptor{usage_page(01),push-scope{usage_page(0d),usage(00010030)},usage[size=4](30)}",
        );
    }

    #[test]
    fn invalid_tree() {
        let mut tree = Tree::new(ROOT);
        let root = tree.root();
        tree.append(root, Node::new("usage").with_text("01")).unwrap();
        tree.append(root, Node::new("collection")).unwrap();
        let mut unfolder = Unfolder::new(tree);
        assert!(unfolder.get().unwrap().is_some());
        assert!(matches!(
            unfolder.get(),
            Err(Error::InvalidNode {
                position: Position::Node(2),
                ..
            })
        ));
    }
}
