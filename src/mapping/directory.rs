// src/mapping/directory.rs
//! Read-only directory handle that artifact lookups are resolved against

use std::ffi::CString;
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// An opened, read-only handle to a fixtures directory.
///
/// Files are opened relative to the held descriptor with `openat(2)`, so a
/// rename of the directory path after opening does not change what gets
/// mapped.
#[derive(Debug)]
pub struct BaseDirectory {
    fd: OwnedFd,
    path: PathBuf,
}

impl BaseDirectory {
    /// Open `path` as a directory for reading
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let c_path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a NUL byte"))?;

        // SAFETY: `c_path` is a NUL-terminated string that outlives the call.
        let raw = unsafe {
            libc::open(
                c_path.as_ptr(),
                libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC,
            )
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(Self {
            // SAFETY: `raw` is a freshly opened descriptor owned by nobody else.
            fd: unsafe { OwnedFd::from_raw_fd(raw) },
            path: path.to_path_buf(),
        })
    }

    /// Path the directory was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open `name`, located directly under this directory, read-only.
    ///
    /// Never creates the file. Names containing a path separator are
    /// rejected.
    pub fn open_file(&self, name: &str) -> io::Result<File> {
        if name.is_empty() || name.contains('/') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact name must be a plain file name: {name:?}"),
            ));
        }
        let c_name = CString::new(name)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "name contains a NUL byte"))?;

        // SAFETY: `c_name` is NUL-terminated and `self.fd` stays open for the
        // duration of the call.
        let raw = unsafe {
            libc::openat(
                self.fd.as_raw_fd(),
                c_name.as_ptr(),
                libc::O_RDONLY | libc::O_CLOEXEC,
            )
        };
        if raw < 0 {
            return Err(io::Error::last_os_error());
        }

        // SAFETY: `raw` was just returned by openat and is not shared.
        Ok(File::from(unsafe { OwnedFd::from_raw_fd(raw) }))
    }
}
