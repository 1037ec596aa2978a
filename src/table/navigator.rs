//! Row pointer
//!
//! A single cursor in `[0, row_count]`. Boundaries are reported, not
//! raised: the caller decides whether EOF/BOF ends its loop.

use std::sync::atomic::{AtomicU32, Ordering};

/// Outcome of a pointer move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Pointer is on a row
    Moved,
    /// Clamped to 0 after moving below the first row
    BeginningOfFile,
    /// Clamped to `row_count`
    EndOfFile,
}

impl Position {
    pub fn is_boundary(self) -> bool {
        self != Position::Moved
    }
}

/// Cursor over the row sequence
///
/// Never skips deleted rows; reading does not advance it.
#[derive(Debug, Default)]
pub struct Navigator {
    pointer: AtomicU32,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> u32 {
        self.pointer.load(Ordering::SeqCst)
    }

    /// Jump to row `n`, clamping to `row_count`
    pub fn go_to(&self, n: u32, row_count: u32) -> Position {
        if n >= row_count {
            self.pointer.store(row_count, Ordering::SeqCst);
            return Position::EndOfFile;
        }
        self.pointer.store(n, Ordering::SeqCst);
        Position::Moved
    }

    /// Move by `delta` rows, clamping to `[0, row_count]`
    pub fn skip(&self, delta: i64, row_count: u32) -> Position {
        let target = self.pointer() as i64 + delta;
        if target < 0 {
            self.pointer.store(0, Ordering::SeqCst);
            return Position::BeginningOfFile;
        }
        if target >= row_count as i64 {
            self.pointer.store(row_count, Ordering::SeqCst);
            return Position::EndOfFile;
        }
        self.pointer.store(target as u32, Ordering::SeqCst);
        Position::Moved
    }

    pub fn at_eof(&self, row_count: u32) -> bool {
        self.pointer() >= row_count
    }

    pub fn at_bof(&self) -> bool {
        self.pointer() == 0
    }
}
