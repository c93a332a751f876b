//! Construction and snapshots of metadata records.

use std::time::SystemTime;

use crate::{FileType, Inode, InodeAttr, InodeId, Mode, Timestamps};

impl Inode {
    /// Fresh record with default attributes: owner rwx, size 0, no storage unit.
    pub fn new(id: InodeId, path: String, ftype: FileType, parent: Option<InodeId>) -> Self {
        let links_cnt = match ftype {
            FileType::Directory => 2, // '.' and the entry in the parent
            FileType::Regular => 1,
        };
        Self {
            id,
            path,
            ftype,
            mode: Mode::RWE,
            links_cnt,
            size: 0,
            times: Timestamps::now(),
            block: None,
            parent,
            first_child: None,
            next_sibling: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.ftype == FileType::Directory
    }

    pub fn attr(&self) -> InodeAttr {
        InodeAttr {
            ino: self.id.0,
            path: self.path.clone(),
            kind: self.ftype,
            size: self.size,
            blocks: u64::from(self.block.is_some()),
            perm: self.mode.owner_bits(),
            nlink: self.links_cnt,
            crtime: self.times.created,
            mtime: self.times.modified,
            atime: self.times.accessed,
            ctime: self.times.changed,
        }
    }

    pub(crate) fn touch_accessed(&mut self) {
        self.times.accessed = SystemTime::now();
    }

    pub(crate) fn touch_modified(&mut self) {
        let now = SystemTime::now();
        self.times.modified = now;
        self.times.changed = now;
    }
}
