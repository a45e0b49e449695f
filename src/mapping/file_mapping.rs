// src/mapping/file_mapping.rs
//! Immutable memory mappings of snapshot files

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io;
use std::os::fd::AsRawFd;
use std::ptr;

/// Page protection a mapping is created under.
///
/// There is no writable variant: code is mapped read+execute and data is
/// mapped read-only, never both writable and executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protection {
    ReadOnly,
    ReadExecute,
}

impl Protection {
    /// Protection for an artifact that will (or will not) be executed
    #[inline]
    pub fn for_executable(executable: bool) -> Self {
        if executable {
            Protection::ReadExecute
        } else {
            Protection::ReadOnly
        }
    }

    #[inline]
    pub fn is_executable(self) -> bool {
        matches!(self, Protection::ReadExecute)
    }

    #[inline]
    fn prot_flags(self) -> libc::c_int {
        match self {
            Protection::ReadOnly => libc::PROT_READ,
            Protection::ReadExecute => libc::PROT_READ | libc::PROT_EXEC,
        }
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protection::ReadOnly => write!(f, "r--"),
            Protection::ReadExecute => write!(f, "r-x"),
        }
    }
}

/// A private, read-only mapping of a whole file.
///
/// The file handle is owned by the mapping and closed when it is dropped.
/// An empty file produces a mapping with size zero and a null base address;
/// callers decide whether that is usable (see [`FileMapping::is_usable`]).
pub struct FileMapping {
    ptr: *const u8,
    len: usize,
    protection: Protection,
    _file: File,
}

// SAFETY: the mapped pages are never written through this type and the
// region stays valid until drop, so shared reads from any thread are sound.
unsafe impl Send for FileMapping {}
unsafe impl Sync for FileMapping {}

impl FileMapping {
    /// Map all of `file` with the given protection
    pub fn new(file: File, protection: Protection) -> io::Result<Self> {
        let len = usize::try_from(file.metadata()?.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "file too large to map")
        })?;

        if len == 0 {
            return Ok(Self {
                ptr: ptr::null(),
                len: 0,
                protection,
                _file: file,
            });
        }

        // SAFETY: a fresh MAP_PRIVATE mapping at a kernel-chosen address of a
        // descriptor we own; `len` is the file size and non-zero.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                protection.prot_flags(),
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            ptr: addr as *const u8,
            len,
            protection,
            _file: file,
        })
    }

    /// Size of the mapping in bytes
    #[inline]
    pub fn size(&self) -> usize {
        self.len
    }

    /// Base address of the mapping, null for an empty file
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    #[inline]
    pub fn protection(&self) -> Protection {
        self.protection
    }

    /// Non-empty and addressable
    #[inline]
    pub fn is_usable(&self) -> bool {
        self.len > 0 && !self.ptr.is_null()
    }

    /// Mapped contents
    pub fn as_bytes(&self) -> &[u8] {
        if self.ptr.is_null() {
            return &[];
        }
        // SAFETY: ptr..ptr+len is a live PROT_READ mapping owned by self.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl Drop for FileMapping {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            // SAFETY: ptr/len describe the region returned by mmap in `new`, and
            // no borrow from `as_bytes` can outlive `self`.
            unsafe {
                libc::munmap(self.ptr as *mut libc::c_void, self.len);
            }
        }
    }
}

impl fmt::Debug for FileMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileMapping")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("protection", &self.protection)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_selection() {
        assert_eq!(Protection::for_executable(true), Protection::ReadExecute);
        assert_eq!(Protection::for_executable(false), Protection::ReadOnly);
        assert!(Protection::ReadExecute.is_executable());
        assert!(!Protection::ReadOnly.is_executable());
    }

    #[test]
    fn test_prot_flags_never_writable() {
        for protection in [Protection::ReadOnly, Protection::ReadExecute] {
            assert_eq!(protection.prot_flags() & libc::PROT_WRITE, 0);
            assert_ne!(protection.prot_flags() & libc::PROT_READ, 0);
        }
        assert_eq!(Protection::ReadOnly.prot_flags() & libc::PROT_EXEC, 0);
    }

    #[test]
    fn test_map_read_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"snapshot bytes").unwrap();

        let mapping = FileMapping::new(File::open(&path).unwrap(), Protection::ReadOnly).unwrap();

        assert!(mapping.is_usable());
        assert_eq!(mapping.size(), 14);
        assert_eq!(mapping.as_bytes(), b"snapshot bytes");
        assert_eq!(mapping.protection(), Protection::ReadOnly);
    }

    #[test]
    fn test_empty_file_is_not_usable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();

        let mapping = FileMapping::new(File::open(&path).unwrap(), Protection::ReadOnly).unwrap();

        assert!(!mapping.is_usable());
        assert!(mapping.as_ptr().is_null());
        assert!(mapping.as_bytes().is_empty());
    }

    #[test]
    fn test_mapping_outlives_path_removal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data");
        std::fs::write(&path, b"kept").unwrap();

        let mapping = FileMapping::new(File::open(&path).unwrap(), Protection::ReadOnly).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mapping.as_bytes(), b"kept");
    }
}
