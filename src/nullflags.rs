//! Null-flag bitmap
//!
//! Side channel stored in the trailing `_NullFlags` column. Only Varchar and
//! Varbinary columns take bits, assigned in declared column order:
//!
//! ```text
//! nullable variable column      bit N   = stored short
//!                               bit N+1 = null
//! non-nullable variable column  bit N   = stored short
//! ```
//!
//! Bits are packed LSB-first: byte = bit / 8, mask = 1 << (bit % 8).
//! The bitmap is rebuilt from scratch every time a row is serialized.

use crate::header::Column;

/// Per-column bitmap state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VarFlags {
    /// Payload is shorter than the column; the last byte holds its length
    pub short: bool,
    /// Value is null
    pub null: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    short_bit: usize,
    null_bit: Option<usize>,
}

/// Bit assignments for one column list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullFlagLayout {
    slots: Vec<Option<Slot>>,
    bits: usize,
}

impl NullFlagLayout {
    pub fn new(columns: &[Column]) -> Self {
        let mut bits = 0;
        let slots = columns
            .iter()
            .map(|column| {
                if !column.data_type.is_variable() {
                    return None;
                }
                let short_bit = bits;
                bits += 1;
                let null_bit = if column.flags.is_nullable() {
                    bits += 1;
                    Some(short_bit + 1)
                } else {
                    None
                };
                Some(Slot { short_bit, null_bit })
            })
            .collect();

        Self { slots, bits }
    }

    pub fn bits_needed(&self) -> usize {
        self.bits
    }

    pub fn byte_length(&self) -> usize {
        self.bits.div_ceil(8)
    }

    /// Flags of the column at `index`; bits beyond the bitmap read as clear
    pub fn read(&self, bitmap: &[u8], index: usize) -> VarFlags {
        match self.slot(index) {
            Some(slot) => VarFlags {
                short: get_bit(bitmap, slot.short_bit),
                null: slot.null_bit.map(|bit| get_bit(bitmap, bit)).unwrap_or(false),
            },
            None => VarFlags::default(),
        }
    }

    /// Record the flags of the column at `index`
    pub fn write(&self, bitmap: &mut [u8], index: usize, flags: VarFlags) {
        if let Some(slot) = self.slot(index) {
            set_bit(bitmap, slot.short_bit, flags.short);
            if let Some(bit) = slot.null_bit {
                set_bit(bitmap, bit, flags.null);
            }
        }
    }

    fn slot(&self, index: usize) -> Option<Slot> {
        self.slots.get(index).copied().flatten()
    }
}

/// True when the table needs a `_NullFlags` column
pub fn needs_null_flags(columns: &[Column]) -> bool {
    columns
        .iter()
        .any(|c| c.data_type.is_variable() || c.flags.is_nullable())
}

/// Bitmap bytes needed for `columns`
pub fn byte_length(columns: &[Column]) -> usize {
    NullFlagLayout::new(columns).byte_length()
}

fn get_bit(bitmap: &[u8], bit: usize) -> bool {
    bitmap
        .get(bit / 8)
        .map(|byte| byte & (1 << (bit % 8)) != 0)
        .unwrap_or(false)
}

fn set_bit(bitmap: &mut [u8], bit: usize, on: bool) {
    if let Some(byte) = bitmap.get_mut(bit / 8) {
        if on {
            *byte |= 1 << (bit % 8);
        } else {
            *byte &= !(1 << (bit % 8));
        }
    }
}
