use std::time::SystemTime;

use crate::config::*;

/// Handle of a record in the namespace arena. Doubles as the reported inode number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InodeId(pub u32);

impl InodeId {
    pub const ROOT: Self = Self(ROOT_INODE_ID);

    /// Arena slot of this id; `None` for ids below the root's.
    pub(crate) fn slot(self) -> Option<usize> {
        self.0.checked_sub(ROOT_INODE_ID).map(|slot| slot as usize)
    }

    pub(crate) fn from_slot(slot: usize) -> Self {
        Self(slot as u32 + ROOT_INODE_ID)
    }
}

/// One fixed-size region of the disk image, addressed at `index * BLOCK_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageUnit(u64);

impl StorageUnit {
    pub fn new(index: u64) -> Self {
        Self(index)
    }

    pub fn index(self) -> u64 {
        self.0
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Regular = 1,
    Directory = 2,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read = 0b100,
    Write = 0b010,
    Execute = 0b001,
    RW = Self::Read as u8 | Self::Write as u8,
    RWE = Self::Read as u8 | Self::Write as u8 | Self::Execute as u8,
    None = 0b000, // No permissions
}

impl Mode {
    /// Owner permission bits in `st_mode` layout.
    pub fn owner_bits(self) -> u16 {
        (self as u16) << 6
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created: SystemTime,
    pub modified: SystemTime,
    pub accessed: SystemTime,
    pub changed: SystemTime,
}

impl Timestamps {
    pub fn now() -> Self {
        let now = SystemTime::now();
        Self { created: now, modified: now, accessed: now, changed: now }
    }
}

/// Metadata record of one file or directory.
///
/// Tree links are arena handles: `parent` is a back-reference, `first_child` heads the
/// child chain of a directory, `next_sibling` continues the chain of the parent.
#[derive(Debug, Clone)]
pub struct Inode {
    pub id: InodeId,
    pub path: String,
    pub ftype: FileType,
    pub mode: Mode,
    pub links_cnt: u32,
    pub size: u64,
    pub times: Timestamps,
    pub block: Option<StorageUnit>,
    pub parent: Option<InodeId>,
    pub first_child: Option<InodeId>,
    pub next_sibling: Option<InodeId>,
}

/// Read-only snapshot of a record, as returned by stat-style queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeAttr {
    pub ino: u32,
    pub path: String,
    pub kind: FileType,
    pub size: u64,
    pub blocks: u64,
    pub perm: u16,
    pub nlink: u32,
    pub crtime: SystemTime,
    pub mtime: SystemTime,
    pub atime: SystemTime,
    pub ctime: SystemTime,
}

impl InodeAttr {
    pub fn is_dir(&self) -> bool {
        self.kind == FileType::Directory
    }
}

/// Allocation and namespace counters, roughly what `statfs` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsUsage {
    pub block_size: usize,
    pub blocks_created: u64,
    pub blocks_in_use: u64,
    pub max_blocks: Option<u64>,
    pub inodes: usize,
}

impl FsUsage {
    pub fn blocks_free(&self) -> u64 {
        self.blocks_created - self.blocks_in_use
    }
}
