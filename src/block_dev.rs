//! Backing store abstraction and the disk-image implementation.
//!
//! Storage unit `i` lives at byte offset `i * BLOCK_SIZE`. Every transfer is
//! positioned, so concurrent transfers on different units never share a cursor.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::BLOCK_SIZE;
use crate::error::{FsError, Result};
use crate::StorageUnit;

pub trait BlockDevice: Send + Sync {
    /// Reads up to `buf.len()` bytes at absolute byte `offset`.
    /// Returns the number of bytes read; bytes past the end of the store read as zero.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf` at absolute byte `offset`, growing the store if needed.
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()>;

    /// Flushes any buffered data to the underlying medium.
    fn flush(&self) -> Result<()>;

    /// Returns the size of each storage unit in bytes.
    fn block_size(&self) -> usize {
        BLOCK_SIZE
    }

    /// Reads from inside one storage unit, starting `intra` bytes into it.
    fn read_block(&self, unit: StorageUnit, intra: usize, buf: &mut [u8]) -> Result<usize> {
        let offset = unit_offset(self.block_size(), unit, intra, buf.len())?;
        self.read_at(offset, buf)
    }

    /// Writes into one storage unit, starting `intra` bytes into it.
    fn write_block(&self, unit: StorageUnit, intra: usize, data: &[u8]) -> Result<()> {
        let offset = unit_offset(self.block_size(), unit, intra, data.len())?;
        self.write_at(offset, data)
    }
}

/// Absolute byte address of `intra` inside `unit`. The range must not cross the unit.
pub fn unit_offset(block_size: usize, unit: StorageUnit, intra: usize, len: usize) -> Result<u64> {
    if intra.checked_add(len).is_none_or(|end| end > block_size) {
        return Err(FsError::FileTooLarge { offset: intra as u64, len: len as u64 });
    }
    Ok(unit.index() * block_size as u64 + intra as u64)
}

/// A disk image file opened once per mount.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
    path: PathBuf,
}

impl FileDisk {
    /// Opens the image read/write, creating it with owner-only permissions if absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .mode(0o600)
            .open(&path)?;
        debug!(path = %path.display(), "opened disk image");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current length of the image in bytes.
    pub fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl BlockDevice for FileDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut done = 0;
        while done < buf.len() {
            match self.file.read_at(&mut buf[done..], offset + done as u64) {
                Ok(0) => break,
                Ok(n) => done += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        // Never-touched region of a sparse image.
        buf[done..].fill(0);
        Ok(buf.len())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        self.file.write_all_at(buf, offset)?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        self.file.sync_data()?;
        Ok(())
    }
}
