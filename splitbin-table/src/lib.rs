// A split table replaces one dense array `t` of N values by a short chain of
// smaller arrays, each indexed by a slice of the bits of the original index:
//
//   two levels:    t[i] == t2[(t1[i >> shift] << shift) + (i & mask)]
//   three levels:  t[i] == t3[t2[t1[i >> s1] + ((i >> s2) & mask1)] + (i & mask2)]
//
// The arrays we care about (per-codepoint attribute ids, decomposition
// offsets) are enormous runs of the same few values, so most 2^shift sized
// blocks of them repeat and each distinct block only needs storing once.
//
// Compilation is a brute-force search: for every candidate shift (or shift
// pair) cut the array into blocks, dedup them, and measure the tables at the
// narrowest word width (1, 2 or 4 bytes) that holds their maximum. The
// smallest total wins, ties going to the first candidate tried. The winner
// is then checked at every index before it is handed back; a table that
// fails that check is a bug in here and is never returned.
//
// Upstream of the compilers, structured per-key records are interned into a
// record pool (id 0 reserved for the default record) and variable-length
// per-key data into a sequence pool (offset 0 reserved for the empty
// sequence), so the compilers only ever see small unsigned integers.

mod dedup;
mod intern;
mod options;
mod seqpool;
mod split2;
mod split3;
mod wordty;

#[cfg(test)]
mod test;

pub use dedup::{dedup_blocks, BlockDedup, Placed};
pub use intern::{intern_records, intern_rows, RecordPool};
pub use options::{max_shift_for_len, SplitOptions};
pub use seqpool::{read_sequence, SequencePool};
pub use split2::{PackedTwoLevel, TwoLevel};
pub use split3::{PackedThreeLevel, ThreeLevel};
pub use wordty::{PackedWords, Value, WordTy};

/// A reconstructed value disagreeing with the source array. Produced by the
/// verification pass of both compilers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mismatch<T> {
    pub index: usize,
    pub shift: u32,
    pub inner_shift: Option<u32>,
    pub expected: T,
    pub found: Option<T>,
}

impl<T: std::fmt::Display> std::fmt::Display for Mismatch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "split table mismatch at index {} (shift {}", self.index, self.shift)?;
        if let Some(inner) = self.inner_shift {
            write!(f, "/{}", inner)?;
        }
        write!(f, "): expected {}, ", self.expected)?;
        match &self.found {
            Some(found) => write!(f, "found {}", found),
            None => write!(f, "lookup fell outside the tables"),
        }
    }
}

impl<T: std::fmt::Debug + std::fmt::Display> std::error::Error for Mismatch<T> {}
