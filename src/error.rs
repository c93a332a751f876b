//! Error types shared by the namespace, the allocator and the backing store.
//!
//! Structural errors (`NotFound`, `AlreadyExists`, `ParentMissing`) are returned to
//! the caller as-is and never retried. A read of a file that never received a
//! storage unit is not an error, it is an empty read.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("parent directory missing: {0}")]
    ParentMissing(String),

    /// The positioned transfer against the disk image failed.
    #[error("backing store I/O error: {0}")]
    BackingStore(#[from] io::Error),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("file name too long: {0}")]
    NameTooLong(String),

    #[error("not a directory: {0}")]
    NotDirectory(String),

    #[error("is a directory: {0}")]
    IsDirectory(String),

    /// Files are limited to a single storage unit.
    #[error("range {offset}+{len} exceeds the single-block file limit")]
    FileTooLarge { offset: u64, len: u64 },

    #[error("no free storage units left")]
    NoSpace,

    #[error("the root directory cannot be removed")]
    RootBusy,
}

pub type Result<T> = core::result::Result<T, FsError>;

impl FsError {
    /// POSIX errno for the filesystem bridge to hand back to the kernel.
    pub fn to_errno(&self) -> libc::c_int {
        match self {
            Self::NotFound(_) | Self::ParentMissing(_) => libc::ENOENT,
            Self::AlreadyExists(_) => libc::EEXIST,
            Self::BackingStore(err) => err.raw_os_error().unwrap_or(libc::EIO),
            Self::InvalidPath(_) => libc::EINVAL,
            Self::NameTooLong(_) => libc::ENAMETOOLONG,
            Self::NotDirectory(_) => libc::ENOTDIR,
            Self::IsDirectory(_) => libc::EISDIR,
            Self::FileTooLarge { .. } => libc::EFBIG,
            Self::NoSpace => libc::ENOSPC,
            Self::RootBusy => libc::EBUSY,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_errno_mapping() {
        assert_eq!(FsError::NotFound("/a".into()).to_errno(), libc::ENOENT);
        assert_eq!(FsError::ParentMissing("/a/b".into()).to_errno(), libc::ENOENT);
        assert_eq!(FsError::AlreadyExists("/a".into()).to_errno(), libc::EEXIST);
        assert_eq!(FsError::FileTooLarge { offset: 0, len: 5000 }.to_errno(), libc::EFBIG);
        assert_eq!(FsError::RootBusy.to_errno(), libc::EBUSY);
    }

    #[test]
    fn test_io_error_keeps_os_code() {
        let err: FsError = io::Error::from_raw_os_error(libc::ENOSPC).into();
        assert_eq!(err.to_errno(), libc::ENOSPC);
        let err: FsError = io::Error::new(io::ErrorKind::Other, "boom").into();
        assert_eq!(err.to_errno(), libc::EIO);
    }
}
