// The pipelines callers actually run. Each takes a dense per-key input,
// reduces it to an array of small ids or offsets, and compiles that into
// whichever split table is smaller:
//
//   records   -> RecordPool   -> ids     -> CompiledTable
//   sequences -> SequencePool -> offsets -> CompiledTable
//   integers  ----------------------------> CompiledTable
//
// Nothing here holds state between calls.


use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::debug;

pub use splitbin_base::{err, Error, Result};
pub use splitbin_table::{
    dedup_blocks, intern_records, intern_rows, max_shift_for_len, read_sequence, BlockDedup,
    Mismatch, PackedThreeLevel, PackedTwoLevel, PackedWords, Placed, RecordPool, SequencePool,
    SplitOptions, ThreeLevel, TwoLevel, Value, WordTy,
};

/// The smaller of the two split shapes for one array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompiledTable<T> {
    TwoLevel(TwoLevel<T>),
    ThreeLevel(ThreeLevel<T>),
}

impl<T: Value> CompiledTable<T> {
    pub fn get(&self, i: usize) -> Option<T> {
        match self {
            CompiledTable::TwoLevel(t) => t.get(i),
            CompiledTable::ThreeLevel(t) => t.get(i),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            CompiledTable::TwoLevel(t) => t.len(),
            CompiledTable::ThreeLevel(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn byte_size(&self) -> Result<usize> {
        match self {
            CompiledTable::TwoLevel(t) => t.byte_size(),
            CompiledTable::ThreeLevel(t) => t.byte_size(),
        }
    }

    pub fn verify(&self, t: &[T]) -> Result<()> {
        match self {
            CompiledTable::TwoLevel(split) => split.verify(t),
            CompiledTable::ThreeLevel(split) => split.verify(t),
        }
    }
}

/// Compiles `t` both ways and keeps the smaller, two levels winning ties.
pub fn compile_smallest<T: Value>(t: &[T], opts: &SplitOptions) -> Result<CompiledTable<T>> {
    let two = TwoLevel::compile(t, opts)?;
    let three = ThreeLevel::compile(t, opts)?;
    let (two_bytes, three_bytes) = (two.byte_size()?, three.byte_size()?);
    debug!(
        target: "splitbin",
        "two levels {} bytes, three levels {} bytes",
        two_bytes,
        three_bytes
    );
    if three_bytes < two_bytes {
        Ok(CompiledTable::ThreeLevel(three))
    } else {
        Ok(CompiledTable::TwoLevel(two))
    }
}

/// Per-key records: a pool of distinct records plus a split table mapping
/// each key to its record id. Keys the caller never populated should carry
/// the default record and come back as id 0.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordTable<R> {
    pub records: Vec<R>,
    pub index: CompiledTable<u32>,
}

impl<R: Eq + Hash + Clone> RecordTable<R> {
    pub fn compile(
        default: R,
        records: impl IntoIterator<Item = R>,
        opts: &SplitOptions,
    ) -> Result<Self> {
        let (records, ids) = intern_records(default, records)?;
        let index = compile_smallest(&ids, opts)?;
        Ok(RecordTable { records, index })
    }

    pub fn get(&self, key: usize) -> Option<&R> {
        let id = self.index.get(key)?;
        self.records.get(id as usize)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Per-key variable-length data: a sequence pool plus a split table mapping
/// each key to a pool offset. Keys without data map to offset 0, the empty
/// sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTable {
    pub tags: Vec<String>,
    pub data: Vec<u32>,
    pub index: CompiledTable<u32>,
}

impl SequenceTable {
    /// `entries` yields, per key, an optional tag name and its items. Tag
    /// names are numbered with "" as tag 0; at most 256 distinct names fit.
    pub fn compile<S: Into<String>>(
        entries: impl IntoIterator<Item = Option<(S, Vec<u32>)>>,
        opts: &SplitOptions,
    ) -> Result<Self> {
        let mut tags = RecordPool::new(String::new());
        let mut pool = SequencePool::new();
        let mut offsets = Vec::new();
        for entry in entries {
            let offset = match entry {
                Some((tag, items)) => {
                    let tag = tags.intern(tag.into())?;
                    let tag = u8::try_from(tag)
                        .map_err(|_| err("more than 256 distinct sequence tags"))?;
                    pool.add_tagged(tag, &items)?
                }
                None => 0,
            };
            offsets.push(offset);
        }
        debug!(
            target: "splitbin",
            "{} tags, {} unique sequences in {} words",
            tags.len(),
            pool.len(),
            pool.data().len()
        );
        let index = compile_smallest(&offsets, opts)?;
        Ok(SequenceTable {
            tags: tags.into_records(),
            data: pool.into_data(),
            index,
        })
    }

    /// The tag name and items for `key`; keys without data give ("", []).
    pub fn get(&self, key: usize) -> Option<(&str, &[u32])> {
        let offset = self.index.get(key)?;
        let (tag, items) = read_sequence(&self.data, offset)?;
        let tag = self.tags.get(tag as usize)?;
        Some((tag.as_str(), items))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
