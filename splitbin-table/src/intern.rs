use rapidhash::RapidHashMap;
use splitbin_base::{err, Result};
use std::hash::Hash;
use tracing::debug;

/// Distinct records numbered in first-occurrence order. Id 0 is always the
/// default record the pool was created with, whether or not anything
/// interned later equals it, so callers have a fixed id for "no attributes".
///
/// Ids mean nothing outside the pool that issued them.
#[derive(Clone, Debug)]
pub struct RecordPool<R> {
    records: Vec<R>,
    ids: RapidHashMap<R, u32>,
}

impl<R: Eq + Hash + Clone> RecordPool<R> {
    pub fn new(default: R) -> Self {
        let mut ids = RapidHashMap::default();
        ids.insert(default.clone(), 0);
        RecordPool {
            records: vec![default],
            ids,
        }
    }

    pub fn intern(&mut self, record: R) -> Result<u32> {
        if let Some(id) = self.ids.get(&record) {
            return Ok(*id);
        }
        let id = u32::try_from(self.records.len())
            .map_err(|_| err("record pool exceeds 2^32 entries"))?;
        self.records.push(record.clone());
        self.ids.insert(record, id);
        Ok(id)
    }

    pub fn id_of(&self, record: &R) -> Option<u32> {
        self.ids.get(record).copied()
    }

    pub fn get(&self, id: u32) -> Option<&R> {
        self.records.get(id as usize)
    }

    pub fn default_record(&self) -> &R {
        &self.records[0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Never true: the default record is always present.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

/// Interns `records` behind `default`, returning the pool and the id of
/// each input record in order.
pub fn intern_records<R: Eq + Hash + Clone>(
    default: R,
    records: impl IntoIterator<Item = R>,
) -> Result<(Vec<R>, Vec<u32>)> {
    let mut pool = RecordPool::new(default);
    let ids = records
        .into_iter()
        .map(|r| pool.intern(r))
        .collect::<Result<Vec<u32>>>()?;
    debug!(
        target: "splitbin",
        "{} unique records for {} entries",
        pool.len(),
        ids.len()
    );
    Ok((pool.into_records(), ids))
}

/// Like [`intern_records`] for rows whose arity is only known at runtime.
/// Every row must have the default row's arity.
pub fn intern_rows<V: Eq + Hash + Clone>(
    default: Vec<V>,
    rows: impl IntoIterator<Item = Vec<V>>,
) -> Result<(Vec<Vec<V>>, Vec<u32>)> {
    let arity = default.len();
    let mut pool = RecordPool::new(default);
    let mut ids = Vec::new();
    for (n, row) in rows.into_iter().enumerate() {
        if row.len() != arity {
            return Err(err(format!(
                "row {} has {} fields, expected {}",
                n,
                row.len(),
                arity
            )));
        }
        ids.push(pool.intern(row)?);
    }
    debug!(
        target: "splitbin",
        "{} unique rows for {} entries",
        pool.len(),
        ids.len()
    );
    Ok((pool.into_records(), ids))
}
