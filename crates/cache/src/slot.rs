//! The fixed-size on-disk index record
//!
//! Each cache index holds exactly one [`Slot`]: an unsigned 64-bit byte
//! offset into the data file followed by a signed 64-bit payload length,
//! both little-endian. A negative length marks the slot as empty.

/// Size of one serialized slot record in bytes.
pub const SLOT_LEN: usize = 16;

/// One index record: where a payload lives in the data file.
///
/// `length = -1` with `offset = 0` is the empty sentinel. Once a slot is
/// written with a non-negative length it never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Byte offset of the payload within the data file
    pub offset: u64,
    /// Payload length in bytes; negative means "no value stored here"
    pub length: i64,
}

impl Slot {
    /// The empty sentinel record.
    pub const SENTINEL: Self = Self {
        offset: 0,
        length: -1,
    };

    /// A record describing an occupied slot.
    #[must_use]
    pub fn occupied(offset: u64, length: u64) -> Self {
        // Payloads are capped well below i64::MAX by the filesystem long
        // before this cast could wrap.
        Self {
            offset,
            length: length as i64,
        }
    }

    /// Whether the record holds a stored value.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.length >= 0
    }

    /// The `(offset, length)` pair for an occupied slot, `None` for the
    /// sentinel.
    #[must_use]
    pub fn location(&self) -> Option<(u64, u64)> {
        if self.length >= 0 {
            Some((self.offset, self.length as u64))
        } else {
            None
        }
    }

    /// Serialize to the 16-byte on-disk form.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SLOT_LEN] {
        let mut buf = [0u8; SLOT_LEN];
        buf[..8].copy_from_slice(&self.offset.to_le_bytes());
        buf[8..].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    /// Deserialize from the 16-byte on-disk form.
    #[must_use]
    pub fn from_bytes(buf: &[u8; SLOT_LEN]) -> Self {
        let mut offset = [0u8; 8];
        let mut length = [0u8; 8];
        offset.copy_from_slice(&buf[..8]);
        length.copy_from_slice(&buf[8..]);
        Self {
            offset: u64::from_le_bytes(offset),
            length: i64::from_le_bytes(length),
        }
    }
}
