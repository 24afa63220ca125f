//! Stable-id → index lookup tables.
//!
//! Ids are packed into a dense table starting at the smallest id. A table is
//! only built when every entity carries an id and no id repeats; otherwise
//! lookups fall back to the `id - 1` convention.

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdLookup {
    min: u32,
    table: Vec<Option<usize>>,
}

impl IdLookup {
    /// Build a table from per-entity ids. Returns an empty table when any
    /// entity lacks an id or two entities share one.
    pub fn build<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = Option<u32>> + Clone,
    {
        let mut min = u32::MAX;
        let mut max = 0u32;
        let mut count = 0usize;
        for id in ids.clone() {
            let Some(id) = id else {
                return Self::default();
            };
            min = min.min(id);
            max = max.max(id);
            count += 1;
        }
        if count == 0 {
            return Self::default();
        }
        let span = (max - min) as usize + 1;
        if span < count {
            return Self::default();
        }
        let mut table = vec![None; span];
        for (index, id) in ids.into_iter().enumerate() {
            let Some(id) = id else {
                return Self::default();
            };
            let slot = &mut table[(id - min) as usize];
            if slot.is_some() {
                return Self::default();
            }
            *slot = Some(index);
        }
        Self { min, table }
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.min = 0;
    }

    /// Index of the entity with stable id `id`. Without a table, ids are
    /// taken to be one-based positions, bounded by `len`.
    pub fn index_of(&self, id: u32, len: usize) -> Option<usize> {
        if self.table.is_empty() {
            let idx = (id as usize).checked_sub(1)?;
            return (idx < len).then_some(idx);
        }
        let off = id.checked_sub(self.min)? as usize;
        self.table.get(off).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_ids_resolve() {
        let lut = IdLookup::build([Some(10), Some(14), Some(12)]);
        assert!(!lut.is_empty());
        assert_eq!(lut.index_of(10, 3), Some(0));
        assert_eq!(lut.index_of(12, 3), Some(2));
        assert_eq!(lut.index_of(11, 3), None);
        assert_eq!(lut.index_of(9, 3), None);
        assert_eq!(lut.index_of(99, 3), None);
    }

    #[test]
    fn duplicates_or_missing_ids_fall_back() {
        let lut = IdLookup::build([Some(3), Some(3)]);
        assert!(lut.is_empty());
        assert_eq!(lut.index_of(2, 2), Some(1));
        assert_eq!(lut.index_of(3, 2), None);

        let lut = IdLookup::build([Some(1), None]);
        assert!(lut.is_empty());
    }
}
