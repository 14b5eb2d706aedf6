use rapidhash::RapidHashMap;
use std::hash::Hash;

/// Where a block ended up: its ordinal among the unique blocks, and the
/// element offset of its canonical copy in the flattened unique table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placed {
    pub ordinal: usize,
    pub offset: usize,
}

/// Collapses equal blocks to one canonical copy, appended whole to a flat
/// table in first-occurrence order. Equality is element-wise on content, so
/// duplicates anywhere in the input collapse, not just adjacent ones.
#[derive(Debug)]
pub struct BlockDedup<T> {
    cache: RapidHashMap<Vec<T>, Placed>,
    flat: Vec<T>,
}

impl<T: Hash + Eq + Clone> Default for BlockDedup<T> {
    fn default() -> Self {
        BlockDedup {
            cache: RapidHashMap::default(),
            flat: Vec::new(),
        }
    }
}

impl<T: Hash + Eq + Clone> BlockDedup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, block: &[T]) -> Placed {
        if let Some(placed) = self.cache.get(block) {
            return *placed;
        }
        let placed = Placed {
            ordinal: self.cache.len(),
            offset: self.flat.len(),
        };
        self.flat.extend_from_slice(block);
        self.cache.insert(block.to_vec(), placed);
        placed
    }

    pub fn unique_count(&self) -> usize {
        self.cache.len()
    }

    pub fn flat(&self) -> &[T] {
        &self.flat
    }

    pub fn into_flat(self) -> Vec<T> {
        self.flat
    }
}

/// Returns the unique blocks in first-occurrence order along with, for each
/// input block, the ordinal of the unique block with the same content.
pub fn dedup_blocks<T, B>(blocks: impl IntoIterator<Item = B>) -> (Vec<Vec<T>>, Vec<usize>)
where
    T: Hash + Eq + Clone,
    B: AsRef<[T]>,
{
    let mut dedup = BlockDedup::new();
    let mut starts = Vec::new();
    let mut positions = Vec::new();
    for block in blocks {
        let placed = dedup.add(block.as_ref());
        if placed.ordinal == starts.len() {
            starts.push(placed.offset);
        }
        positions.push(placed.ordinal);
    }
    // Unique blocks sit back to back in the flat table, so cutting it at
    // each start (last first) hands every block its own vector.
    let mut flat = dedup.into_flat();
    let mut unique: Vec<Vec<T>> = starts
        .iter()
        .rev()
        .map(|&start| flat.split_off(start))
        .collect();
    unique.reverse();
    (unique, positions)
}
