//! The namespace tree.
//!
//! Records live in an arena addressed by [`InodeId`]. A directory's children form a
//! singly linked chain (`first_child` / `next_sibling`) in insertion order, each child
//! pointing back at its directory through `parent`. Freed slots are reused by later
//! inserts, most recently freed first.

use tracing::{debug, trace};

use crate::bitmap::BlockAllocator;
use crate::error::{FsError, Result};
use crate::path::{self, is_descendant, join, split};
use crate::{FileType, Inode, InodeAttr, InodeId, ROOT_PATH};

#[derive(Debug, Clone)]
pub struct Namespace {
    slots: Vec<Option<Inode>>,
    free_slots: Vec<usize>,
    len: usize,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    /// A tree holding only the root directory.
    pub fn new() -> Self {
        let root = Inode::new(InodeId::ROOT, ROOT_PATH.to_string(), FileType::Directory, None);
        Self {
            slots: vec![Some(root)],
            free_slots: Vec::new(),
            len: 1,
        }
    }

    /// Number of live records, root included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, id: InodeId) -> Option<&Inode> {
        id.slot().and_then(|slot| self.slots.get(slot)).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: InodeId) -> Option<&mut Inode> {
        id.slot().and_then(|slot| self.slots.get_mut(slot)).and_then(Option::as_mut)
    }

    fn node(&self, id: InodeId) -> &Inode {
        self.get(id).expect("tree link points at a freed slot")
    }

    fn node_mut(&mut self, id: InodeId) -> &mut Inode {
        self.get_mut(id).expect("tree link points at a freed slot")
    }

    /// Exact-match search. A record whose path is only a prefix of `path` is walked
    /// into as an ancestor, never returned.
    pub fn lookup(&self, path: &str) -> Option<InodeId> {
        if path == ROOT_PATH {
            return Some(InodeId::ROOT);
        }
        let mut current = self.node(InodeId::ROOT).first_child;
        while let Some(id) = current {
            let inode = self.node(id);
            if inode.path == path {
                trace!(path, ino = id.0, "lookup hit");
                return Some(id);
            }
            current = if inode.is_dir() && is_descendant(path, &inode.path) {
                inode.first_child
            } else {
                inode.next_sibling
            };
        }
        trace!(path, "lookup miss");
        None
    }

    pub fn attributes(&self, path: &str) -> Option<InodeAttr> {
        self.lookup(path).map(|id| self.node(id).attr())
    }

    /// Inserts a new record under the directory implied by `path`, appended at the end
    /// of that directory's child chain.
    pub fn insert(&mut self, path: &str, ftype: FileType) -> Result<InodeId> {
        path::validate(path)?;
        if self.lookup(path).is_some() {
            return Err(FsError::AlreadyExists(path.to_string()));
        }
        let (parent_path, _) = split(path);
        let parent_id = self
            .lookup(parent_path)
            .filter(|id| self.node(*id).is_dir())
            .ok_or_else(|| FsError::ParentMissing(path.to_string()))?;

        let slot = self.alloc_slot();
        let id = InodeId::from_slot(slot);
        let inode = Inode::new(id, path.to_string(), ftype, Some(parent_id));
        self.slots[slot] = Some(inode);
        self.len += 1;

        let last = self.last_child(parent_id);
        match last {
            Some(last) => self.node_mut(last).next_sibling = Some(id),
            None => self.node_mut(parent_id).first_child = Some(id),
        }
        self.node_mut(parent_id).touch_modified();

        debug!(path, ino = id.0, kind = ?ftype, "inserted record");
        Ok(id)
    }

    /// Removes the record at `path` together with its whole subtree. Every storage
    /// unit held by a removed record is released to `allocator` before the record is
    /// spliced out of its parent's chain.
    pub fn remove(&mut self, path: &str, allocator: &mut impl BlockAllocator) -> Result<()> {
        let id = self
            .lookup(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if id == InodeId::ROOT {
            return Err(FsError::RootBusy);
        }

        let subtree = self.subtree(id);
        for &member in &subtree {
            if let Some(unit) = self.node_mut(member).block.take() {
                allocator.release(unit);
            }
        }

        self.unlink_from_parent(id);

        for slot in subtree.iter().filter_map(|member| member.slot()) {
            self.slots[slot] = None;
            self.free_slots.push(slot);
        }
        self.len -= subtree.len();

        debug!(path, removed = subtree.len(), "removed record");
        Ok(())
    }

    /// Names of the direct children of `path`, in chain order. Empty if `path` does not
    /// resolve to a directory.
    pub fn list_children(&self, path: &str) -> ChildNames<'_> {
        let next = self
            .lookup(path)
            .map(|id| self.node(id))
            .filter(|inode| inode.is_dir())
            .and_then(|inode| inode.first_child);
        ChildNames { namespace: self, next }
    }

    /// Ids of the direct children of `dir`, in chain order.
    pub fn children(&self, dir: InodeId) -> impl Iterator<Item = InodeId> + '_ {
        let mut next = self.get(dir).and_then(|inode| inode.first_child);
        std::iter::from_fn(move || {
            let id = next?;
            next = self.node(id).next_sibling;
            Some(id)
        })
    }

    /// Checks the structural invariants of the whole tree. Used by tests.
    pub fn check_invariants(&self) -> core::result::Result<(), String> {
        let mut seen = 0;
        let mut stack = vec![InodeId::ROOT];
        while let Some(dir) = stack.pop() {
            seen += 1;
            let dir_inode = self.node(dir);
            for child in self.children(dir) {
                let inode = self.node(child);
                if inode.parent != Some(dir) {
                    return Err(format!("{} has wrong parent link", inode.path));
                }
                if inode.path != join(&dir_inode.path, path::name_of(&inode.path)) {
                    return Err(format!("{} is not a child path of {}", inode.path, dir_inode.path));
                }
                if inode.is_dir() {
                    stack.push(child);
                } else {
                    seen += 1;
                }
            }
        }
        if seen != self.len {
            return Err(format!("{} records reachable, {} live", seen, self.len));
        }
        Ok(())
    }

    fn alloc_slot(&mut self) -> usize {
        self.free_slots.pop().unwrap_or_else(|| {
            self.slots.push(None);
            self.slots.len() - 1
        })
    }

    fn last_child(&self, dir: InodeId) -> Option<InodeId> {
        self.children(dir).last()
    }

    /// `id` followed by all of its descendants.
    fn subtree(&self, id: InodeId) -> Vec<InodeId> {
        let mut members = vec![id];
        let mut idx = 0;
        while idx < members.len() {
            let current = members[idx];
            members.extend(self.children(current));
            idx += 1;
        }
        members
    }

    fn unlink_from_parent(&mut self, id: InodeId) {
        let (parent, next) = {
            let inode = self.node(id);
            (inode.parent.expect("non-root record without parent"), inode.next_sibling)
        };
        if self.node(parent).first_child == Some(id) {
            self.node_mut(parent).first_child = next;
        } else {
            let prev = self
                .children(parent)
                .find(|sibling| self.node(*sibling).next_sibling == Some(id));
            if let Some(prev) = prev {
                self.node_mut(prev).next_sibling = next;
            }
        }
        self.node_mut(parent).touch_modified();
    }
}

/// Lazy iterator over child names of one directory. Clone it to restart.
#[derive(Debug, Clone)]
pub struct ChildNames<'a> {
    namespace: &'a Namespace,
    next: Option<InodeId>,
}

impl<'a> Iterator for ChildNames<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let inode = self.namespace.node(self.next?);
        self.next = inode.next_sibling;
        Some(path::name_of(&inode.path))
    }
}
