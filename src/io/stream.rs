//! Positioned stream access

use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::thread;

use parking_lot::Mutex;
use tracing::trace;

use super::lock::{RangeLock, LOCK_RETRY_DELAY};
use crate::error::{DbfError, Result};

/// Anything the engine can seek, read and write
pub trait Stream: Read + Write + Seek + Send {}

impl<T: Read + Write + Seek + Send> Stream for T {}

/// A table or memo file addressed by absolute byte offset
///
/// ## Concurrency:
/// - `stream`: Mutex, held for each seek+read / seek+write pair
/// - `lock`: optional advisory range lock taken around writes
pub struct BlockFile {
    stream: Mutex<Box<dyn Stream>>,
    lock: Option<Box<dyn RangeLock>>,
}

impl BlockFile {
    /// Wrap a stream without range locking
    pub fn new(stream: Box<dyn Stream>) -> Self {
        Self {
            stream: Mutex::new(stream),
            lock: None,
        }
    }

    /// Lock written ranges through `lock`
    pub fn with_lock(mut self, lock: Box<dyn RangeLock>) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Fill `buf` from `offset`; a short read is `Incomplete`
    pub fn read_at(&self, offset: u64, buf: &mut [u8], operation: &'static str) -> Result<()> {
        let mut stream = self.stream.lock();
        stream.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(DbfError::Io(e)),
            }
        }

        if filled < buf.len() {
            return Err(DbfError::Incomplete {
                operation,
                expected: buf.len(),
                actual: filled,
            });
        }
        Ok(())
    }

    /// Read exactly `len` bytes at `offset`
    pub fn read_vec(&self, offset: u64, len: usize, operation: &'static str) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_at(offset, &mut buf, operation)?;
        Ok(buf)
    }

    /// Write all of `data` at `offset`, under the range lock if enabled
    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let len = data.len() as u64;

        if let Some(lock) = &self.lock {
            Self::acquire(lock.as_ref(), offset, len)?;
        }

        let written = self.write_unlocked(offset, data);

        if let Some(lock) = &self.lock {
            lock.unlock(offset, len)?;
        }
        written
    }

    /// Current stream length in bytes
    pub fn len(&self) -> Result<u64> {
        let mut stream = self.stream.lock();
        Ok(stream.seek(SeekFrom::End(0))?)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn flush(&self) -> Result<()> {
        self.stream.lock().flush()?;
        Ok(())
    }

    fn write_unlocked(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut stream = self.stream.lock();
        stream.seek(SeekFrom::Start(offset))?;
        stream.write_all(data).map_err(|e| match e.kind() {
            ErrorKind::WriteZero => DbfError::Incomplete {
                operation: "write",
                expected: data.len(),
                actual: 0,
            },
            _ => DbfError::Io(e),
        })?;
        stream.flush()?;
        Ok(())
    }

    fn acquire(lock: &dyn RangeLock, offset: u64, len: u64) -> Result<()> {
        loop {
            if lock.try_lock(offset, len)? {
                return Ok(());
            }
            trace!(offset, len, "range busy, retrying");
            thread::sleep(LOCK_RETRY_DELAY);
        }
    }
}
