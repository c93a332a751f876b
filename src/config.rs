pub const BLOCK_SIZE: usize = 4096; // Size of one storage unit in the disk image
pub const ROOT_PATH: &str = "/";
pub const ROOT_INODE_ID: u32 = 1; // Inode number reported for the root directory
pub const MAX_FILE_NAME_LEN: usize = 255;
pub const MAX_FILE_SIZE: u64 = BLOCK_SIZE as u64; // One storage unit per file
pub const DEFAULT_PERM: u16 = 0o700; // Owner read/write/execute, fixed at creation

/// Mount-time settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsConfig {
    /// Upper bound on storage units handed out at once. `None` lets the image grow.
    pub max_blocks: Option<u64>,
}

impl FsConfig {
    pub fn with_max_blocks(max_blocks: u64) -> Self {
        Self { max_blocks: Some(max_blocks) }
    }
}
