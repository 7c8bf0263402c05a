//! Character trie
//!
//! Terms are paths from a virtual root. Each node names one character and
//! may own a posting list. Children of a node form a sibling chain in
//! insertion order; nodes are never freed.
//!
//! ## Slot Format (16 bytes)
//!
//! ```text
//!   character           u32 LE    (Unicode scalar value)
//!   documents_head      link      → documents file
//!   first_child         link
//!   next_sibling        link      (also the free-list link)
//! ```
//!
//! The virtual root has no slot of its own: its first child lives in the
//! file header and its posting list (the empty term) in the
//! `documents_head` field of the reserved slot 0.

use std::path::Path;

use catalog_core::codec::{decode_char, decode_link, encode_char, encode_link};
use catalog_core::{Error, Result, SlotNo, VersionDate};
use tracing::debug;

use crate::slot_file::{SlotFile, TREE_LAYOUT};

const CHAR_OFFSET: usize = 0;
const DOCUMENTS_OFFSET: usize = 4;
const CHILD_OFFSET: usize = 8;
const SIBLING_OFFSET: usize = 12;

/// Address of a trie node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// The virtual root (the empty term)
    Root,
    /// A node stored in the given tree slot
    Slot(SlotNo),
}

/// One decoded tree slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeSlot {
    /// Edge label
    pub character: char,
    /// Head of the posting list in the documents file
    pub documents_head: Option<SlotNo>,
    /// First child in the tree file
    pub first_child: Option<SlotNo>,
    /// Next sibling in the tree file
    pub next_sibling: Option<SlotNo>,
}

impl TreeSlot {
    fn encode(&self) -> [u8; 16] {
        let mut out = [0u8; 16];
        out[CHAR_OFFSET..DOCUMENTS_OFFSET].copy_from_slice(&encode_char(self.character));
        out[DOCUMENTS_OFFSET..CHILD_OFFSET].copy_from_slice(&encode_link(self.documents_head));
        out[CHILD_OFFSET..SIBLING_OFFSET].copy_from_slice(&encode_link(self.first_child));
        out[SIBLING_OFFSET..].copy_from_slice(&encode_link(self.next_sibling));
        out
    }

    fn decode(data: &[u8]) -> Result<Self> {
        Ok(TreeSlot {
            character: decode_char(&data[CHAR_OFFSET..])?,
            documents_head: decode_link(&data[DOCUMENTS_OFFSET..])?,
            first_child: decode_link(&data[CHILD_OFFSET..])?,
            next_sibling: decode_link(&data[SIBLING_OFFSET..])?,
        })
    }
}

/// A node visited by [`TreeStore::preorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrieEntry {
    /// Characters on the path from the root
    pub term: String,
    /// Node address
    pub node: NodeId,
    /// Head of the node's posting list
    pub documents_head: Option<SlotNo>,
}

/// Store of trie nodes backed by the tree file.
#[derive(Debug)]
pub struct TreeStore {
    file: SlotFile,
}

impl TreeStore {
    /// Create a fresh tree file.
    pub fn create(path: &Path, version: VersionDate) -> Result<Self> {
        Ok(TreeStore {
            file: SlotFile::create(path, &TREE_LAYOUT, version)?,
        })
    }

    /// Open an existing tree file.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(TreeStore {
            file: SlotFile::open(path, &TREE_LAYOUT)?,
        })
    }

    /// The underlying slot file.
    pub fn file(&self) -> &SlotFile {
        &self.file
    }

    /// Mutable access to the underlying slot file.
    pub fn file_mut(&mut self) -> &mut SlotFile {
        &mut self.file
    }

    /// Give up the store, keeping its slot file.
    pub fn into_file(self) -> SlotFile {
        self.file
    }

    /// Decode one node, range-checking its tree links.
    pub fn read(&self, slot: SlotNo) -> Result<TreeSlot> {
        self.file.check_link(Some(slot))?;
        let node = TreeSlot::decode(self.file.read_slot(slot)?)?;
        self.file.check_link(node.first_child)?;
        self.file.check_link(node.next_sibling)?;
        Ok(node)
    }

    /// First child of a node.
    pub fn first_child(&self, node: NodeId) -> Result<Option<SlotNo>> {
        match node {
            NodeId::Root => Ok(self.file.first_root_child()),
            NodeId::Slot(slot) => Ok(self.read(slot)?.first_child),
        }
    }

    fn set_first_child(&mut self, node: NodeId, child: Option<SlotNo>) -> Result<()> {
        match node {
            NodeId::Root => self.file.set_first_root_child(child),
            NodeId::Slot(slot) => self.file.write_link_field(slot, CHILD_OFFSET, child),
        }
    }

    /// Head of a node's posting list.
    pub fn documents_head(&self, node: NodeId) -> Result<Option<SlotNo>> {
        match node {
            NodeId::Root if self.file.number_of_slots() == 0 => Ok(None),
            NodeId::Root => decode_link(&self.file.read_slot(0)?[DOCUMENTS_OFFSET..]),
            NodeId::Slot(slot) => Ok(self.read(slot)?.documents_head),
        }
    }

    /// Replace the head of a node's posting list.
    pub fn set_documents_head(&mut self, node: NodeId, head: Option<SlotNo>) -> Result<()> {
        let slot = match node {
            NodeId::Root => {
                self.file.ensure_reserved();
                0
            }
            NodeId::Slot(slot) => slot,
        };
        self.file.write_link_field(slot, DOCUMENTS_OFFSET, head)
    }

    /// Iterate the children of a node in sibling-chain order.
    pub fn children(&self, parent: NodeId) -> Result<SiblingChain<'_>> {
        Ok(SiblingChain {
            tree: self,
            cursor: self.first_child(parent)?,
            steps: 0,
        })
    }

    /// Find the child of `parent` labelled `c`.
    pub fn find_child(&self, parent: NodeId, c: char) -> Result<Option<SlotNo>> {
        for child in self.children(parent)? {
            let (slot, node) = child?;
            if node.character == c {
                return Ok(Some(slot));
            }
        }
        Ok(None)
    }

    /// Find the child of `parent` labelled `c`, appending a new node at the
    /// end of the sibling chain if there is none.
    pub fn find_or_create_child(&mut self, parent: NodeId, c: char) -> Result<SlotNo> {
        let mut tail = None;
        for child in self.children(parent)? {
            let (slot, node) = child?;
            if node.character == c {
                return Ok(slot);
            }
            tail = Some(slot);
        }

        let slot = self.file.alloc_slot()?;
        let node = TreeSlot {
            character: c,
            documents_head: None,
            first_child: None,
            next_sibling: None,
        };
        self.file.write_slot(slot, &node.encode())?;
        match tail {
            None => self.set_first_child(parent, Some(slot))?,
            Some(tail) => self.file.write_link_field(tail, SIBLING_OFFSET, Some(slot))?,
        }
        debug!(target: "catalog::storage", slot, character = %c, "Created trie node");
        Ok(slot)
    }

    /// Follow `term` from the root; `None` if any character is missing.
    pub fn walk(&self, term: &str) -> Result<Option<NodeId>> {
        let mut node = NodeId::Root;
        for c in term.chars() {
            match self.find_child(node, c)? {
                Some(slot) => node = NodeId::Slot(slot),
                None => return Ok(None),
            }
        }
        Ok(Some(node))
    }

    /// Follow `term` from the root, creating missing nodes.
    pub fn walk_or_create(&mut self, term: &str) -> Result<NodeId> {
        let mut node = NodeId::Root;
        for c in term.chars() {
            node = NodeId::Slot(self.find_or_create_child(node, c)?);
        }
        Ok(node)
    }

    /// Visit every node depth-first, parents before children, siblings in
    /// chain order. The root comes first with the empty term.
    pub fn preorder(&self) -> PreOrder<'_> {
        PreOrder {
            tree: self,
            pending: Vec::new(),
            started: false,
            visited: 0,
            failed: false,
        }
    }
}

/// Iterator over a sibling chain.
pub struct SiblingChain<'a> {
    tree: &'a TreeStore,
    cursor: Option<SlotNo>,
    steps: u32,
}

impl Iterator for SiblingChain<'_> {
    type Item = Result<(SlotNo, TreeSlot)>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.cursor.take()?;
        if self.steps >= self.tree.file.number_of_slots() {
            return Some(Err(Error::invariant("cycle in sibling chain")));
        }
        self.steps += 1;
        match self.tree.read(slot) {
            Ok(node) => {
                self.cursor = node.next_sibling;
                Some(Ok((slot, node)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Pre-order traversal of the whole trie.
pub struct PreOrder<'a> {
    tree: &'a TreeStore,
    pending: Vec<(String, SlotNo)>,
    started: bool,
    visited: u32,
    failed: bool,
}

impl PreOrder<'_> {
    fn push_children(&mut self, term: &str, parent: NodeId) -> Result<()> {
        let mut children = Vec::new();
        for child in self.tree.children(parent)? {
            let (slot, node) = child?;
            let mut child_term = String::with_capacity(term.len() + node.character.len_utf8());
            child_term.push_str(term);
            child_term.push(node.character);
            children.push((child_term, slot));
        }
        self.pending.extend(children.into_iter().rev());
        Ok(())
    }

    fn step(&mut self) -> Result<Option<TrieEntry>> {
        if !self.started {
            self.started = true;
            self.push_children("", NodeId::Root)?;
            return Ok(Some(TrieEntry {
                term: String::new(),
                node: NodeId::Root,
                documents_head: self.tree.documents_head(NodeId::Root)?,
            }));
        }
        let Some((term, slot)) = self.pending.pop() else {
            return Ok(None);
        };
        self.visited += 1;
        if self.visited >= self.tree.file.number_of_slots() {
            return Err(Error::invariant(format!(
                "trie walk revisited nodes after {} steps",
                self.visited
            )));
        }
        let node = self.tree.read(slot)?;
        self.push_children(&term, NodeId::Slot(slot))?;
        Ok(Some(TrieEntry {
            term,
            node: NodeId::Slot(slot),
            documents_head: node.documents_head,
        }))
    }
}

impl Iterator for PreOrder<'_> {
    type Item = Result<TrieEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.step() {
            Ok(entry) => entry.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
