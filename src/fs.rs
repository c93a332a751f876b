use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::bitmap::{BitmapAllocator, BlockAllocator};
use crate::directory::Namespace;
use crate::error::{FsError, Result};
use crate::file::{fread, ftruncate, fwrite};
use crate::{BlockDevice, FileType, FsConfig, FsUsage, Inode, InodeAttr};

/// Everything the single global lock protects: the tree and the allocator change
/// together on remove and write, so they are guarded as one unit.
#[derive(Debug)]
struct FsState<A> {
    namespace: Namespace,
    allocator: A,
}

impl<A> FsState<A> {
    fn inode_mut(&mut self, path: &str) -> Result<(&mut Inode, &mut A)> {
        let id = self
            .namespace
            .lookup(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        let inode = self
            .namespace
            .get_mut(id)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok((inode, &mut self.allocator))
    }
}

/// A mounted file system: the namespace tree and block allocator over one backing store.
///
/// Created at mount time and shared between request handlers (e.g. in an `Arc`).
/// Every operation runs to completion under the state lock.
#[derive(Debug)]
pub struct FileSystem<D: BlockDevice, A: BlockAllocator = BitmapAllocator> {
    device: Arc<D>,
    config: FsConfig,
    state: RwLock<FsState<A>>,
}

impl<D: BlockDevice> FileSystem<D> {
    /// Mounts `device` with an empty namespace and the first-fit bitmap allocator.
    pub fn mount(device: Arc<D>, config: FsConfig) -> Self {
        Self::mount_with_allocator(device, BitmapAllocator::with_capacity_limit(config.max_blocks), config)
    }
}

impl<D: BlockDevice, A: BlockAllocator> FileSystem<D, A> {
    pub fn mount_with_allocator(device: Arc<D>, allocator: A, config: FsConfig) -> Self {
        info!(max_blocks = ?config.max_blocks, block_size = device.block_size(), "mounting file system");
        Self {
            device,
            config,
            state: RwLock::new(FsState {
                namespace: Namespace::new(),
                allocator,
            }),
        }
    }

    /// Flushes the backing store. The namespace is not persisted and is gone after this.
    pub fn unmount(self) -> Result<()> {
        self.device.flush()?;
        let state = self.state.into_inner();
        info!(
            inodes = state.namespace.len(),
            blocks_in_use = state.allocator.units_in_use(),
            "unmounted file system"
        );
        Ok(())
    }

    pub fn flush(&self) -> Result<()> {
        self.device.flush()
    }

    pub fn attributes(&self, path: &str) -> Result<InodeAttr> {
        self.lookup(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))
    }

    pub fn lookup(&self, path: &str) -> Option<InodeAttr> {
        self.state.read().namespace.attributes(path)
    }

    pub fn create(&self, path: &str) -> Result<InodeAttr> {
        self.insert(path, FileType::Regular)
    }

    pub fn mkdir(&self, path: &str) -> Result<InodeAttr> {
        self.insert(path, FileType::Directory)
    }

    fn insert(&self, path: &str, ftype: FileType) -> Result<InodeAttr> {
        let mut state = self.state.write();
        let id = state.namespace.insert(path, ftype)?;
        let inode = state
            .namespace
            .get(id)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        Ok(inode.attr())
    }

    /// Removes a file or a directory with everything below it.
    pub fn remove(&self, path: &str) -> Result<()> {
        let mut state = self.state.write();
        let FsState { namespace, allocator } = &mut *state;
        namespace.remove(path, allocator)
    }

    /// Removes a regular file.
    pub fn unlink(&self, path: &str) -> Result<()> {
        self.remove_kind(path, FileType::Regular)
    }

    /// Removes a directory and its whole subtree.
    pub fn rmdir(&self, path: &str) -> Result<()> {
        self.remove_kind(path, FileType::Directory)
    }

    fn remove_kind(&self, path: &str, expected: FileType) -> Result<()> {
        let mut state = self.state.write();
        let FsState { namespace, allocator } = &mut *state;
        let attr = namespace
            .attributes(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        match (attr.kind, expected) {
            (FileType::Directory, FileType::Regular) => Err(FsError::IsDirectory(path.to_string())),
            (FileType::Regular, FileType::Directory) => Err(FsError::NotDirectory(path.to_string())),
            _ => namespace.remove(path, allocator),
        }
    }

    /// Child names of `path`; empty when `path` is not a directory.
    pub fn list_children(&self, path: &str) -> Vec<String> {
        let state = self.state.read();
        state.namespace.list_children(path).map(str::to_string).collect()
    }

    /// Child names of the directory at `path`, failing if it is missing or a file.
    pub fn read_dir(&self, path: &str) -> Result<Vec<String>> {
        let state = self.state.read();
        let attr = state
            .namespace
            .attributes(path)
            .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        if !attr.is_dir() {
            return Err(FsError::NotDirectory(path.to_string()));
        }
        Ok(state.namespace.list_children(path).map(str::to_string).collect())
    }

    /// Checks that `path` names a regular file that can be opened.
    pub fn open(&self, path: &str) -> Result<InodeAttr> {
        let attr = self.attributes(path)?;
        if attr.is_dir() {
            return Err(FsError::IsDirectory(path.to_string()));
        }
        Ok(attr)
    }

    /// Checks that `path` names a directory that can be listed.
    pub fn opendir(&self, path: &str) -> Result<InodeAttr> {
        let attr = self.attributes(path)?;
        if !attr.is_dir() {
            return Err(FsError::NotDirectory(path.to_string()));
        }
        Ok(attr)
    }

    pub fn read(&self, path: &str, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut state = self.state.write();
        let (inode, _) = state.inode_mut(path)?;
        let bytes_read = fread(&*self.device, inode, offset, buf)?;
        debug!(path, offset, bytes_read, "read");
        Ok(bytes_read)
    }

    pub fn write(&self, path: &str, offset: u64, data: &[u8]) -> Result<usize> {
        let mut state = self.state.write();
        let (inode, allocator) = state.inode_mut(path)?;
        let bytes_written = fwrite(&*self.device, allocator, inode, offset, data)?;
        debug!(path, offset, bytes_written, size = inode.size, "write");
        Ok(bytes_written)
    }

    pub fn truncate(&self, path: &str, size: u64) -> Result<()> {
        let mut state = self.state.write();
        let (inode, allocator) = state.inode_mut(path)?;
        ftruncate(&*self.device, allocator, inode, size)?;
        debug!(path, size, "truncate");
        Ok(())
    }

    pub fn usage(&self) -> FsUsage {
        let state = self.state.read();
        FsUsage {
            block_size: self.device.block_size(),
            blocks_created: state.allocator.units_created(),
            blocks_in_use: state.allocator.units_in_use(),
            max_blocks: self.config.max_blocks,
            inodes: state.namespace.len(),
        }
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    pub fn device(&self) -> Arc<D> {
        Arc::clone(&self.device)
    }
}
