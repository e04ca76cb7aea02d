use crate::error::MachineError;

/// Smallest supported word width.
pub const MIN_WIDTH: u32 = 8;
/// Largest supported word width, limited by the `u64` backing store.
pub const MAX_WIDTH: u32 = 64;

/// Number of bits held by every register and memory cell of a machine.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Width(u32);

impl Width {
    pub fn new(bits: u32) -> Result<Self, MachineError> {
        if (MIN_WIDTH..=MAX_WIDTH).contains(&bits) {
            Ok(Width(bits))
        } else {
            Err(MachineError::Configuration { width: bits })
        }
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// All bits of a word set.
    pub fn mask(&self) -> u64 {
        if self.0 == 64 {
            u64::MAX
        } else {
            (1u64 << self.0) - 1
        }
    }

    /// Reduce a value to `value mod 2^bits`.
    ///
    /// Negative values wrap the way two's complement does, eg. `-1` becomes all ones.
    #[inline]
    pub fn truncate(&self, value: i128) -> u64 {
        (value as u64) & self.mask()
    }

    /// Bytes needed to hold one word.
    pub fn bytes(&self) -> usize {
        self.0.div_ceil(8) as usize
    }

    /// Render `value` in binary, zero-padded to the word width.
    pub fn binary(&self, value: u64) -> String {
        format!("{:0width$b}", value, width = self.0 as usize)
    }
}

impl Default for Width {
    fn default() -> Self {
        Width(16)
    }
}
