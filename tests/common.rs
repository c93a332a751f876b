//! Common utilities for tests

#![allow(unused)]

use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use sfs::{BlockDevice, Error, Result};

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
}

/// Growable in-memory disk image.
#[derive(Default)]
pub struct RamDisk {
    inner: Mutex<Vec<u8>>,
}

impl RamDisk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes of the image, for checking unit addressing.
    pub fn bytes(&self, offset: usize, len: usize) -> Vec<u8> {
        let data = self.inner.lock().unwrap();
        (offset..offset + len).map(|i| data.get(i).copied().unwrap_or(0)).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

impl BlockDevice for RamDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let data = self.inner.lock().unwrap();
        let start = offset as usize;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = data.get(start + i).copied().unwrap_or(0);
        }
        Ok(buf.len())
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        let mut data = self.inner.lock().unwrap();
        let start = offset as usize;
        let end = start + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        // In a RAM disk, flushing is a no-op since data is already in memory.
        Ok(())
    }
}

/// Disk whose reads or writes can be switched to fail, to exercise backing-store errors.
#[derive(Default)]
pub struct FailingDisk {
    pub disk: RamDisk,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FailingDisk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_writes.store(failing, Ordering::SeqCst);
    }

    pub fn set_read_failing(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }
}

impl BlockDevice for FailingDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::BackingStore(io::Error::from_raw_os_error(libc::EIO)));
        }
        self.disk.read_at(offset, buf)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::BackingStore(io::Error::from_raw_os_error(libc::EIO)));
        }
        self.disk.write_at(offset, buf)
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
