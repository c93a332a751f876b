//! A small in-memory file system core over a single disk image, meant to sit behind a
//! user-space filesystem bridge.
//!
//! The namespace (paths, kinds, sizes, timestamps) lives only in memory and is rebuilt
//! empty on every mount; file content lives in fixed-size storage units of the image.
//!
//! Layers (from bottom to top):
//! 1. Block Device: positioned byte transfer against the disk image.
//! 2. Bitmap: hands out and reclaims storage units, first fit.
//! 3. Inode: metadata records and their stat snapshots.
//! 4. Directory/Path: the namespace tree keyed by absolute path.
//! 5. File: byte-range reads and writes inside a file's storage unit.
//! 6. FileSystem: the mounted context, one lock around tree and allocator.
//!
//! Each file owns at most one storage unit, so files are capped at `BLOCK_SIZE` bytes.

mod config;
mod block_dev;
mod structs;
mod bitmap;
mod inode;
mod directory;
mod path;
mod file;
mod fs;
mod error;

pub use block_dev::{unit_offset, BlockDevice, FileDisk};
pub use config::*;
pub use structs::*;
pub use bitmap::{BitmapAllocator, BlockAllocator};
pub use path::{is_descendant, join, name_of, split, validate};
pub use directory::{ChildNames, Namespace};
pub use file::{fread, ftruncate, fwrite};
pub use fs::*;
pub use error::FsError as Error;
pub use error::Result;
