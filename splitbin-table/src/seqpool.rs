use rapidhash::RapidHashMap;
use splitbin_base::{err, Result};

const TAG_BITS: u32 = 8;
const MAX_SEQ_LEN: usize = (1 << (32 - TAG_BITS)) - 1;

/// Decodes the sequence whose header is at `offset` in a pool's flat data.
/// Returns `None` if the header or its items run off the end; an offset
/// that isn't a header is not detected.
pub fn read_sequence(data: &[u32], offset: u32) -> Option<(u8, &[u32])> {
    let start = offset as usize;
    let header = *data.get(start)?;
    let tag = (header & 0xff) as u8;
    let len = (header >> TAG_BITS) as usize;
    let items = data.get(start + 1..start + 1 + len)?;
    Some((tag, items))
}

/// Variable-length sequences packed into one flat word array. Each sequence
/// is a header word `tag | (len << 8)` followed by its items, and is named by
/// the offset of its header. Offset 0 is the empty untagged sequence, so a
/// per-key offset array defaults to 0 for keys with no data.
///
/// Identical (tag, items) pairs are stored once.
#[derive(Clone, Debug)]
pub struct SequencePool {
    data: Vec<u32>,
    offsets: RapidHashMap<(u8, Vec<u32>), u32>,
}

impl Default for SequencePool {
    fn default() -> Self {
        let mut offsets = RapidHashMap::default();
        offsets.insert((0, Vec::new()), 0);
        SequencePool {
            data: vec![0],
            offsets,
        }
    }
}

impl SequencePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, items: &[u32]) -> Result<u32> {
        self.add_tagged(0, items)
    }

    pub fn add_tagged(&mut self, tag: u8, items: &[u32]) -> Result<u32> {
        let key = (tag, items.to_vec());
        if let Some(offset) = self.offsets.get(&key) {
            return Ok(*offset);
        }
        if items.len() > MAX_SEQ_LEN {
            return Err(err(format!(
                "sequence of {} items is too long for a pool header",
                items.len()
            )));
        }
        let offset = u32::try_from(self.data.len())
            .map_err(|_| err("sequence pool exceeds 2^32 words"))?;
        self.data.push(tag as u32 | ((items.len() as u32) << TAG_BITS));
        self.data.extend_from_slice(items);
        self.offsets.insert(key, offset);
        Ok(offset)
    }

    /// The tag and items stored at `offset`, if a header starts there.
    pub fn get(&self, offset: u32) -> Option<(u8, &[u32])> {
        read_sequence(&self.data, offset)
    }

    /// Number of distinct sequences, the empty sentinel included.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Never true: the empty sentinel is always present.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u32> {
        self.data
    }
}
