//! Storage unit allocation.
//! One in-use bit per unit ever created; a unit index is assigned once and then
//! only flips between used and free. Content is never zeroed on release.

use tracing::trace;

use crate::error::{FsError, Result};
use crate::StorageUnit;

/// Hands out storage units of the backing store. No knowledge of paths or files.
pub trait BlockAllocator: Send + Sync {
    /// Returns a unit marked in use.
    fn acquire(&mut self) -> Result<StorageUnit>;

    /// Marks `unit` free again. Releasing a free unit is a no-op.
    fn release(&mut self, unit: StorageUnit);

    fn is_in_use(&self, unit: StorageUnit) -> bool;

    /// Number of unit indices assigned so far (the store's extent in units).
    fn units_created(&self) -> u64;

    fn units_in_use(&self) -> u64;
}

/// First-fit allocator over a flat bitmap.
#[derive(Debug, Clone, Default)]
pub struct BitmapAllocator {
    bits: Vec<bool>,
    in_use: u64,
    max_blocks: Option<u64>,
}

impl BitmapAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator that refuses to hold more than `max_blocks` units at once.
    pub fn with_capacity_limit(max_blocks: Option<u64>) -> Self {
        Self { max_blocks, ..Self::default() }
    }

    fn first_fit(&self) -> Option<usize> {
        self.bits.iter().position(|used| !used)
    }
}

impl BlockAllocator for BitmapAllocator {
    fn acquire(&mut self) -> Result<StorageUnit> {
        if let Some(slot) = self.first_fit() {
            self.bits[slot] = true;
            self.in_use += 1;
            trace!(unit = slot, "reusing free storage unit");
            return Ok(StorageUnit::new(slot as u64));
        }

        if self.max_blocks.is_some_and(|max| self.bits.len() as u64 >= max) {
            return Err(FsError::NoSpace);
        }

        let index = self.bits.len();
        self.bits.push(true);
        self.in_use += 1;
        trace!(unit = index, "created storage unit");
        Ok(StorageUnit::new(index as u64))
    }

    fn release(&mut self, unit: StorageUnit) {
        match self.bits.get_mut(unit.index() as usize) {
            Some(used) if *used => {
                *used = false;
                self.in_use -= 1;
                trace!(unit = unit.index(), "released storage unit");
            }
            Some(_) => trace!(unit = unit.index(), "storage unit already free"),
            None => trace!(unit = unit.index(), "release of unknown storage unit ignored"),
        }
    }

    fn is_in_use(&self, unit: StorageUnit) -> bool {
        self.bits.get(unit.index() as usize).copied().unwrap_or(false)
    }

    fn units_created(&self) -> u64 {
        self.bits.len() as u64
    }

    fn units_in_use(&self) -> u64 {
        self.in_use
    }
}
