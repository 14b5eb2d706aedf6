use crate::{
    dedup::BlockDedup,
    options::{low_bits, SplitOptions},
    wordty::{PackedWords, Value, WordTy},
    Mismatch,
};
use serde::{Deserialize, Serialize};
use splitbin_base::{err, Result};
use tracing::{debug, trace};

/// A table split over two levels of indirection:
///
/// ```text
/// t[i] == t2[(t1[i >> shift] << shift) + (i & ((1 << shift) - 1))]
/// ```
///
/// `t1` holds block numbers (t2 offsets already shifted down), `t2` holds
/// the distinct blocks of the source, each stored whole.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwoLevel<T> {
    pub t1: Vec<u32>,
    pub t2: Vec<T>,
    pub shift: u32,
    len: usize,
}

impl<T: Value> TwoLevel<T> {
    /// Splits `t` at one fixed shift. No searching, no verification.
    pub fn build(t: &[T], shift: u32) -> Result<Self> {
        if shift >= usize::BITS {
            return Err(err(format!("shift {} is wider than an index", shift)));
        }
        let size = 1_usize << shift;
        let mut dedup = BlockDedup::new();
        let mut t1 = Vec::with_capacity(t.len().div_ceil(size));
        for block in t.chunks(size) {
            let placed = dedup.add(block);
            let entry = u32::try_from(placed.offset >> shift)
                .map_err(|_| err(format!("more than 2^32 unique blocks at shift {}", shift)))?;
            t1.push(entry);
        }
        Ok(TwoLevel {
            t1,
            t2: dedup.into_flat(),
            shift,
            len: t.len(),
        })
    }

    /// Searches every shift allowed by `opts` for the smallest split of `t`,
    /// verifies it against `t` and returns it.
    pub fn compile(t: &[T], opts: &SplitOptions) -> Result<Self> {
        if t.is_empty() {
            return Err(err("cannot split an empty table"));
        }
        let limit = opts.shift_limit(t.len());
        let mut best: Option<(usize, Self)> = None;
        for shift in 0..=limit {
            let candidate = Self::build(t, shift)?;
            let bytes = candidate.byte_size()?;
            trace!(
                target: "splitbin",
                "{}+{} bins at shift {}; {} bytes",
                candidate.t1.len(),
                candidate.t2.len(),
                shift,
                bytes
            );
            let better = match &best {
                Some((best_bytes, _)) => bytes < *best_bytes,
                None => true,
            };
            if better {
                best = Some((bytes, candidate));
            }
        }
        let Some((bytes, best)) = best else {
            return Err(err("shift search tried no candidates"));
        };
        debug!(
            target: "splitbin",
            "best two-level split: shift {}, {}+{} bins, {} bytes (from {})",
            best.shift,
            best.t1.len(),
            best.t2.len(),
            bytes,
            WordTy::byte_size(t)?
        );
        best.verify(t)?;
        Ok(best)
    }

    /// Number of source entries this table answers for.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Option<T> {
        if i >= self.len {
            return None;
        }
        self.lookup(i)
    }

    fn lookup(&self, i: usize) -> Option<T> {
        let mask = low_bits(self.shift)?;
        let block = *self.t1.get(i.checked_shr(self.shift)?)? as usize;
        self.t2.get(block.checked_shl(self.shift)? + (i & mask)).copied()
    }

    /// Total encoded size with each table at its narrowest word type.
    pub fn byte_size(&self) -> Result<usize> {
        Ok(WordTy::byte_size(&self.t1)? + WordTy::byte_size(&self.t2)?)
    }

    /// First index of `t` this table reconstructs wrongly, if any.
    pub fn first_mismatch(&self, t: &[T]) -> Option<Mismatch<T>> {
        if t.len() != self.len {
            let index = t.len().min(self.len);
            return Some(Mismatch {
                index,
                shift: self.shift,
                inner_shift: None,
                expected: t.get(index).copied().unwrap_or_default(),
                found: None,
            });
        }
        t.iter().enumerate().find_map(|(index, &expected)| {
            let found = self.lookup(index);
            (found != Some(expected)).then(|| Mismatch {
                index,
                shift: self.shift,
                inner_shift: None,
                expected,
                found,
            })
        })
    }

    /// Checks every index of `t`; any disagreement is an error.
    pub fn verify(&self, t: &[T]) -> Result<()> {
        match self.first_mismatch(t) {
            Some(mismatch) => Err(mismatch.into()),
            None => Ok(()),
        }
    }

    pub fn pack(&self) -> Result<PackedTwoLevel> {
        Ok(PackedTwoLevel {
            t1: PackedWords::pack(&self.t1)?,
            t2: PackedWords::pack(&self.t2)?,
            shift: self.shift,
            len: self.len,
        })
    }
}

/// A [`TwoLevel`] with both tables stored at their selected widths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedTwoLevel {
    pub t1: PackedWords,
    pub t2: PackedWords,
    pub shift: u32,
    len: usize,
}

impl PackedTwoLevel {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        if i >= self.len {
            return None;
        }
        let mask = low_bits(self.shift)?;
        let block = self.t1.get(i.checked_shr(self.shift)?)? as usize;
        self.t2.get(block.checked_shl(self.shift)? + (i & mask))
    }

    pub fn byte_size(&self) -> usize {
        self.t1.byte_len() + self.t2.byte_len()
    }
}
