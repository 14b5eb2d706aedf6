use serde::{Deserialize, Serialize};

/// Knobs for the shift search. The default searches every shift the array
/// length allows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitOptions {
    /// Upper bound on any shift tried. The search is linear in this for two
    /// levels and quadratic for three, so it is the only way to budget a
    /// compile.
    pub max_shift: Option<u32>,
}

impl SplitOptions {
    pub fn with_max_shift(mut self, max_shift: u32) -> Self {
        self.max_shift = Some(max_shift);
        self
    }

    pub(crate) fn shift_limit(&self, len: usize) -> u32 {
        let natural = max_shift_for_len(len);
        match self.max_shift {
            Some(cap) => cap.min(natural),
            None => natural,
        }
    }
}

/// The largest shift that still leaves more than one block's worth of
/// index bits: one less than the bit length of `len - 1`, floored at 0.
pub fn max_shift_for_len(len: usize) -> u32 {
    if len <= 2 {
        return 0;
    }
    let last = len - 1;
    usize::BITS - last.leading_zeros() - 1
}

/// A mask of the low `bits` bits of an index, or `None` if `bits` is not
/// narrower than `usize`. Lookups on deserialized tables go through this so
/// a corrupt shift misses instead of overflowing.
pub(crate) fn low_bits(bits: u32) -> Option<usize> {
    Some(1_usize.checked_shl(bits)? - 1)
}
