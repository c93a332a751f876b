//! Byte-range transfers between a file record and its single storage unit.

use tracing::warn;

use crate::bitmap::BlockAllocator;
use crate::error::{FsError, Result};
use crate::{BlockDevice, FileType, Inode, StorageUnit, MAX_FILE_SIZE};

fn check_range(offset: u64, len: usize) -> Result<()> {
    let end = offset.checked_add(len as u64);
    if end.is_none_or(|end| end > MAX_FILE_SIZE) {
        return Err(FsError::FileTooLarge { offset, len: len as u64 });
    }
    Ok(())
}

/// Reads file content starting at `offset` into `buffer`.
/// Returns the number of bytes read; 0 at or past the end of file, or when the file
/// never received a storage unit.
pub fn fread(
    device: &impl BlockDevice,
    inode: &mut Inode,
    offset: u64,
    buffer: &mut [u8],
) -> Result<usize> {
    if inode.ftype != FileType::Regular {
        return Err(FsError::IsDirectory(inode.path.clone()));
    }
    let Some(unit) = inode.block.filter(|_| offset < inode.size) else {
        inode.touch_accessed();
        return Ok(0);
    };
    // Bytes past `size` may hold a previous owner's data.
    let len = buffer.len().min((inode.size - offset) as usize);
    device.read_block(unit, offset as usize, &mut buffer[..len])?;
    // atime only moves once the transfer succeeded.
    inode.touch_accessed();
    Ok(len)
}

/// Writes `buffer` into the file at `offset`, acquiring a storage unit on first write.
/// Metadata is only updated once the transfer succeeded.
pub fn fwrite(
    device: &impl BlockDevice,
    allocator: &mut impl BlockAllocator,
    inode: &mut Inode,
    offset: u64,
    buffer: &[u8],
) -> Result<usize> {
    if inode.ftype != FileType::Regular {
        return Err(FsError::IsDirectory(inode.path.clone()));
    }
    check_range(offset, buffer.len())?;
    if buffer.is_empty() {
        return Ok(0);
    }

    let (unit, fresh) = match inode.block {
        Some(unit) => (unit, false),
        None => (allocator.acquire()?, true),
    };

    // Anything between the old end of file and `offset` must read back as zero,
    // whatever the unit held before.
    let gap_start = if fresh { 0 } else { inode.size };
    let result = if offset > gap_start {
        zero_fill(device, unit, gap_start as usize, (offset - gap_start) as usize)
    } else {
        Ok(())
    }
    .and_then(|_| device.write_block(unit, offset as usize, buffer));
    if let Err(e) = result {
        warn!(path = %inode.path, unit = unit.index(), error = %e, "write to backing store failed");
        if fresh {
            allocator.release(unit);
        }
        return Err(e);
    }

    inode.block = Some(unit);
    inode.size = inode.size.max(offset + buffer.len() as u64);
    inode.touch_modified();
    Ok(buffer.len())
}

/// Sets the file length. Growing zero-fills the new range, truncating to zero gives the
/// storage unit back to the allocator.
pub fn ftruncate(
    device: &impl BlockDevice,
    allocator: &mut impl BlockAllocator,
    inode: &mut Inode,
    size: u64,
) -> Result<()> {
    if inode.ftype != FileType::Regular {
        return Err(FsError::IsDirectory(inode.path.clone()));
    }
    if size > MAX_FILE_SIZE {
        return Err(FsError::FileTooLarge { offset: 0, len: size });
    }

    if size == 0 {
        if let Some(unit) = inode.block.take() {
            allocator.release(unit);
        }
    } else if size > inode.size {
        let (unit, fresh) = match inode.block {
            Some(unit) => (unit, false),
            None => (allocator.acquire()?, true),
        };
        let start = if fresh { 0 } else { inode.size as usize };
        if let Err(e) = zero_fill(device, unit, start, size as usize - start) {
            warn!(path = %inode.path, unit = unit.index(), error = %e, "truncate on backing store failed");
            if fresh {
                allocator.release(unit);
            }
            return Err(e);
        }
        inode.block = Some(unit);
    }

    inode.size = size;
    inode.touch_modified();
    Ok(())
}

fn zero_fill(device: &impl BlockDevice, unit: StorageUnit, start: usize, len: usize) -> Result<()> {
    if len == 0 {
        return Ok(());
    }
    device.write_block(unit, start, &vec![0u8; len])
}
