use serde::{Deserialize, Serialize};
use splitbin_base::{err, Result};

/// Anything we can put in a split table: an unsigned primitive we can widen
/// to u64 for sizing. Values that don't fit 4 bytes are rejected at sizing
/// time rather than here, so u64 and u128 tables are fine as long as their
/// contents are small.
pub trait Value: funty::Unsigned + TryInto<u64> {
    fn to_u64(self) -> Option<u64> {
        TryInto::<u64>::try_into(self).ok()
    }
}

impl<T: funty::Unsigned + TryInto<u64>> Value for T {}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WordTy {
    Word1,
    Word2,
    Word4,
}

impl WordTy {
    pub fn len(&self) -> usize {
        match self {
            WordTy::Word1 => 1,
            WordTy::Word2 => 2,
            WordTy::Word4 => 4,
        }
    }

    pub fn for_max(max: u64) -> Result<WordTy> {
        if max <= 0xff {
            Ok(WordTy::Word1)
        } else if max <= 0xffff {
            Ok(WordTy::Word2)
        } else if max <= 0xffff_ffff {
            Ok(WordTy::Word4)
        } else {
            Err(err(format!("value {:#x} does not fit a 4-byte word", max)))
        }
    }

    /// Narrowest word holding every value of `vals`.
    ///
    /// # Panics
    ///
    /// If `vals` is empty: there is no table to size, and asking is a bug in
    /// the caller.
    pub fn select_ty<T: Value>(vals: &[T]) -> Result<WordTy> {
        assert!(!vals.is_empty(), "word type requested for an empty table");
        let mut max = 0_u64;
        for v in vals {
            let Some(v) = v.to_u64() else {
                return Err(err(format!("value {} does not fit a 4-byte word", v)));
            };
            max = max.max(v);
        }
        WordTy::for_max(max)
    }

    /// Encoded size of `vals` at its narrowest word type.
    pub fn byte_size<T: Value>(vals: &[T]) -> Result<usize> {
        Ok(vals.len() * WordTy::select_ty(vals)?.len())
    }
}

/// A table stored at its selected word width.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum PackedWords {
    Word1(Vec<u8>),
    Word2(Vec<u16>),
    Word4(Vec<u32>),
}

impl PackedWords {
    pub fn pack<T: Value>(vals: &[T]) -> Result<PackedWords> {
        let ty = WordTy::select_ty(vals)?;
        // select_ty has already checked every value converts and fits.
        let words = vals.iter().map(|v| v.to_u64().unwrap_or_default());
        Ok(match ty {
            WordTy::Word1 => PackedWords::Word1(words.map(|w| w as u8).collect()),
            WordTy::Word2 => PackedWords::Word2(words.map(|w| w as u16).collect()),
            WordTy::Word4 => PackedWords::Word4(words.map(|w| w as u32).collect()),
        })
    }

    pub fn word_ty(&self) -> WordTy {
        match self {
            PackedWords::Word1(_) => WordTy::Word1,
            PackedWords::Word2(_) => WordTy::Word2,
            PackedWords::Word4(_) => WordTy::Word4,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PackedWords::Word1(v) => v.len(),
            PackedWords::Word2(v) => v.len(),
            PackedWords::Word4(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len() * self.word_ty().len()
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            PackedWords::Word1(v) => v.get(i).map(|&w| w as u32),
            PackedWords::Word2(v) => v.get(i).map(|&w| w as u32),
            PackedWords::Word4(v) => v.get(i).copied(),
        }
    }

    pub fn to_le_bytes(&self) -> Vec<u8> {
        match self {
            PackedWords::Word1(v) => v.clone(),
            PackedWords::Word2(v) => v.iter().flat_map(|w| w.to_le_bytes()).collect(),
            PackedWords::Word4(v) => v.iter().flat_map(|w| w.to_le_bytes()).collect(),
        }
    }

    pub fn from_le_bytes(ty: WordTy, bytes: &[u8]) -> Result<PackedWords> {
        if bytes.len() % ty.len() != 0 {
            return Err(err(format!(
                "{} bytes is not a whole number of {}-byte words",
                bytes.len(),
                ty.len()
            )));
        }
        Ok(match ty {
            WordTy::Word1 => PackedWords::Word1(bytes.to_vec()),
            WordTy::Word2 => PackedWords::Word2(
                bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect(),
            ),
            WordTy::Word4 => PackedWords::Word4(
                bytes
                    .chunks_exact(4)
                    .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                    .collect(),
            ),
        })
    }
}
