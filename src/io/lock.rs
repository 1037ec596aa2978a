//! Advisory locks
//!
//! Two capabilities, each with a platform implementation chosen at build
//! time:
//! - `RangeLock`: byte ranges around individual writes (`fcntl`)
//! - `FileLock`: whole-file exclusive access for a handle's lifetime
//!   (`flock`, owned by the open file description rather than the process,
//!   so a second open in the same process is refused and closing it does
//!   not release the first)

use std::fs::File;
use std::io;
use std::time::Duration;

/// Delay between attempts when a range is held by someone else
pub const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Try-lock / unlock of an exclusive byte range
///
/// A `len` of 0 means "from `offset` to the end of the file, however far
/// it grows".
pub trait RangeLock: Send + Sync {
    /// Attempt an exclusive lock without blocking. `Ok(false)` means the
    /// range is held elsewhere.
    fn try_lock(&self, offset: u64, len: u64) -> io::Result<bool>;

    /// Release a previously acquired range
    fn unlock(&self, offset: u64, len: u64) -> io::Result<()>;
}

/// Lock that always succeeds (in-memory streams, unsupported platforms)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRangeLock;

impl RangeLock for NoopRangeLock {
    fn try_lock(&self, _offset: u64, _len: u64) -> io::Result<bool> {
        Ok(true)
    }

    fn unlock(&self, _offset: u64, _len: u64) -> io::Result<()> {
        Ok(())
    }
}

/// Exclusive lock over a whole file
pub trait FileLock: Send + Sync {
    /// Attempt the lock without blocking. `Ok(false)` means another open
    /// description holds it.
    fn try_lock_exclusive(&self) -> io::Result<bool>;

    fn unlock(&self) -> io::Result<()>;
}

impl FileLock for NoopRangeLock {
    fn try_lock_exclusive(&self) -> io::Result<bool> {
        Ok(true)
    }

    fn unlock(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Build the platform whole-file lock for an open file
pub fn platform_file_lock(file: &File) -> io::Result<Box<dyn FileLock>> {
    #[cfg(unix)]
    {
        Ok(Box::new(unix::FlockFileLock::new(file.try_clone()?)))
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(Box::new(NoopRangeLock))
    }
}

/// Build the platform range lock for an open file
pub fn platform_lock(file: &File) -> io::Result<Box<dyn RangeLock>> {
    #[cfg(unix)]
    {
        Ok(Box::new(unix::FcntlRangeLock::new(file.try_clone()?)))
    }
    #[cfg(not(unix))]
    {
        let _ = file;
        Ok(Box::new(NoopRangeLock))
    }
}

#[cfg(unix)]
mod unix {
    use std::fs::File;
    use std::io;
    use std::os::unix::io::AsRawFd;

    use super::{FileLock, RangeLock};

    fn would_block(err: &io::Error) -> bool {
        matches!(
            err.raw_os_error(),
            Some(code) if code == libc::EACCES || code == libc::EAGAIN || code == libc::EWOULDBLOCK
        )
    }

    /// POSIX record lock via `fcntl(F_SETLK)`
    ///
    /// Holds its own duplicate of the descriptor so the lock outlives any
    /// buffering around the primary handle.
    pub(super) struct FcntlRangeLock {
        file: File,
    }

    impl FcntlRangeLock {
        pub(super) fn new(file: File) -> Self {
            Self { file }
        }

        fn set(&self, kind: libc::c_int, offset: u64, len: u64) -> io::Result<bool> {
            // SAFETY: flock is a plain C struct; all-zero is a valid value
            let mut fl: libc::flock = unsafe { std::mem::zeroed() };
            fl.l_type = kind as _;
            fl.l_whence = libc::SEEK_SET as _;
            fl.l_start = offset as libc::off_t;
            fl.l_len = len as libc::off_t;

            // SAFETY: fd is owned by self.file and fl is fully initialized
            let rc = unsafe { libc::fcntl(self.file.as_raw_fd(), libc::F_SETLK, &fl) };
            if rc == 0 {
                return Ok(true);
            }

            let err = io::Error::last_os_error();
            if would_block(&err) {
                return Ok(false);
            }
            Err(err)
        }
    }

    impl RangeLock for FcntlRangeLock {
        fn try_lock(&self, offset: u64, len: u64) -> io::Result<bool> {
            self.set(libc::F_WRLCK as libc::c_int, offset, len)
        }

        fn unlock(&self, offset: u64, len: u64) -> io::Result<()> {
            self.set(libc::F_UNLCK as libc::c_int, offset, len).map(|_| ())
        }
    }

    /// BSD `flock` on a duplicate of the table's data descriptor
    ///
    /// Both descriptors share one open file description, which is what
    /// owns the lock. Released on drop.
    pub(super) struct FlockFileLock {
        file: File,
    }

    impl FlockFileLock {
        pub(super) fn new(file: File) -> Self {
            Self { file }
        }

        fn call(&self, operation: libc::c_int) -> io::Result<bool> {
            // SAFETY: fd is owned by self.file
            let rc = unsafe { libc::flock(self.file.as_raw_fd(), operation) };
            if rc == 0 {
                return Ok(true);
            }

            let err = io::Error::last_os_error();
            if would_block(&err) {
                return Ok(false);
            }
            Err(err)
        }
    }

    impl FileLock for FlockFileLock {
        fn try_lock_exclusive(&self) -> io::Result<bool> {
            self.call(libc::LOCK_EX | libc::LOCK_NB)
        }

        fn unlock(&self) -> io::Result<()> {
            self.call(libc::LOCK_UN).map(|_| ())
        }
    }

    impl Drop for FlockFileLock {
        fn drop(&mut self) {
            let _ = self.unlock();
        }
    }
}
