use crate::{
    dedup::BlockDedup,
    options::{low_bits, SplitOptions},
    wordty::{PackedWords, Value, WordTy},
    Mismatch,
};
use serde::{Deserialize, Serialize};
use splitbin_base::{err, Result};
use tracing::{debug, trace};

// Three levels cut the index into three bit fields:
//
//   i = [ outer block | middle slot | inner position ]
//            >> shift1   (>> shift2) & mask1   & mask2
//
// t3 holds the distinct inner blocks (2^shift2 values each). An outer block
// is then a run of 2^(shift1 - shift2) t3 offsets, and t2 holds the distinct
// runs. t1 holds one t2 offset per outer block. Unlike the two-level t1,
// neither t1 nor t2 store shifted offsets: their entries index elements.

/// A table split over three levels of indirection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeLevel<T> {
    pub t1: Vec<u32>,
    pub t2: Vec<u32>,
    pub t3: Vec<T>,
    pub shift1: u32,
    pub shift2: u32,
    len: usize,
}

fn offset_word(offset: usize, table: &str) -> Result<u32> {
    u32::try_from(offset).map_err(|_| err(format!("{} offset {} exceeds 4 bytes", table, offset)))
}

impl<T: Value> ThreeLevel<T> {
    /// Splits `t` at one fixed shift pair. Requires `shift2 <= shift1`.
    pub fn build(t: &[T], shift1: u32, shift2: u32) -> Result<Self> {
        if shift2 > shift1 {
            return Err(err(format!(
                "inner shift {} exceeds outer shift {}",
                shift2, shift1
            )));
        }
        if shift1 >= usize::BITS {
            return Err(err(format!("shift {} is wider than an index", shift1)));
        }
        let outer = 1_usize << shift1;
        let inner = 1_usize << shift2;
        let mut t3_dedup = BlockDedup::new();
        let mut t2_dedup = BlockDedup::new();
        let mut t1 = Vec::with_capacity(t.len().div_ceil(outer));
        let mut slots = Vec::with_capacity(outer >> shift2);
        for outer_block in t.chunks(outer) {
            // A short final outer block yields a short run of slots, and a
            // short final inner block a short t3 entry; both land at the end
            // of their tables and cover exactly the indices that exist.
            slots.clear();
            for inner_block in outer_block.chunks(inner) {
                slots.push(offset_word(t3_dedup.add(inner_block).offset, "t3")?);
            }
            t1.push(offset_word(t2_dedup.add(&slots).offset, "t2")?);
        }
        Ok(ThreeLevel {
            t1,
            t2: t2_dedup.into_flat(),
            t3: t3_dedup.into_flat(),
            shift1,
            shift2,
            len: t.len(),
        })
    }

    /// Searches every shift pair `shift2 <= shift1` allowed by `opts`,
    /// verifies the smallest split against `t` and returns it.
    pub fn compile(t: &[T], opts: &SplitOptions) -> Result<Self> {
        if t.is_empty() {
            return Err(err("cannot split an empty table"));
        }
        let limit = opts.shift_limit(t.len());
        let mut best: Option<(usize, Self)> = None;
        for shift1 in 0..=limit {
            for shift2 in 0..=shift1 {
                let candidate = Self::build(t, shift1, shift2)?;
                let bytes = candidate.byte_size()?;
                trace!(
                    target: "splitbin",
                    "{}+{}+{} bins at shifts {}/{}; {} bytes",
                    candidate.t1.len(),
                    candidate.t2.len(),
                    candidate.t3.len(),
                    shift1,
                    shift2,
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
        }
        let Some((bytes, best)) = best else {
            return Err(err("shift search tried no candidates"));
        };
        debug!(
            target: "splitbin",
            "best three-level split: shifts {}/{}, {}+{}+{} bins, {} bytes (from {})",
            best.shift1,
            best.shift2,
            best.t1.len(),
            best.t2.len(),
            best.t3.len(),
            bytes,
            WordTy::byte_size(t)?
        );
        best.verify(t)?;
        Ok(best)
    }

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
        let mask1 = low_bits(self.shift1.checked_sub(self.shift2)?)?;
        let mask2 = low_bits(self.shift2)?;
        let run = *self.t1.get(i.checked_shr(self.shift1)?)? as usize;
        let block = *self.t2.get(run + (i.checked_shr(self.shift2)? & mask1))? as usize;
        self.t3.get(block + (i & mask2)).copied()
    }

    pub fn byte_size(&self) -> Result<usize> {
        Ok(WordTy::byte_size(&self.t1)?
            + WordTy::byte_size(&self.t2)?
            + WordTy::byte_size(&self.t3)?)
    }

    pub fn first_mismatch(&self, t: &[T]) -> Option<Mismatch<T>> {
        if t.len() != self.len {
            let index = t.len().min(self.len);
            return Some(Mismatch {
                index,
                shift: self.shift1,
                inner_shift: Some(self.shift2),
                expected: t.get(index).copied().unwrap_or_default(),
                found: None,
            });
        }
        t.iter().enumerate().find_map(|(index, &expected)| {
            let found = self.lookup(index);
            (found != Some(expected)).then(|| Mismatch {
                index,
                shift: self.shift1,
                inner_shift: Some(self.shift2),
                expected,
                found,
            })
        })
    }

    pub fn verify(&self, t: &[T]) -> Result<()> {
        match self.first_mismatch(t) {
            Some(mismatch) => Err(mismatch.into()),
            None => Ok(()),
        }
    }

    pub fn pack(&self) -> Result<PackedThreeLevel> {
        Ok(PackedThreeLevel {
            t1: PackedWords::pack(&self.t1)?,
            t2: PackedWords::pack(&self.t2)?,
            t3: PackedWords::pack(&self.t3)?,
            shift1: self.shift1,
            shift2: self.shift2,
            len: self.len,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedThreeLevel {
    pub t1: PackedWords,
    pub t2: PackedWords,
    pub t3: PackedWords,
    pub shift1: u32,
    pub shift2: u32,
    len: usize,
}

impl PackedThreeLevel {
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
        let mask1 = low_bits(self.shift1.checked_sub(self.shift2)?)?;
        let mask2 = low_bits(self.shift2)?;
        let run = self.t1.get(i.checked_shr(self.shift1)?)? as usize;
        let block = self.t2.get(run + (i.checked_shr(self.shift2)? & mask1))? as usize;
        self.t3.get(block + (i & mask2))
    }

    pub fn byte_size(&self) -> usize {
        self.t1.byte_len() + self.t2.byte_len() + self.t3.byte_len()
    }
}
