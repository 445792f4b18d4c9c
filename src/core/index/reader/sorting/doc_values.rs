// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use core::codec::doc_values::{
    BinaryDocValues, DocValuesIterator, NumericDocValues, SortedDocValues,
    SortedNumericDocValues, SortedSetDocValues, NO_MORE_ORDS,
};
use core::codec::{DocMap, LiveCursor};
use core::search::{DocIterator, NO_MORE_DOCS};
use core::util::{Bits, DocId, FixedBitSet};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Walks `dv` once in old doc order and hands every value of a live doc to
/// `collect` together with the doc's new id.
fn collect_live<T, F>(dv: &mut T, doc_map: &DocMap, mut collect: F) -> Result<FixedBitSet>
where
    T: DocValuesIterator + ?Sized,
    F: FnMut(&mut T, usize) -> Result<()>,
{
    let mut docs_with_field = FixedBitSet::new(doc_map.live_count() as usize);
    let mut cursor = LiveCursor::new(doc_map.max_doc(), None);
    while let Some(old_doc) = cursor.next(&mut *dv)? {
        if let Some(new_doc) = doc_map.try_old_to_new(old_doc) {
            collect(&mut *dv, new_doc as usize)?;
            docs_with_field.set(new_doc as usize);
        }
    }
    Ok(docs_with_field)
}

pub struct CachedNumericDVs {
    values: Vec<i64>,
    docs_with_field: FixedBitSet,
    cost: usize,
}

impl CachedNumericDVs {
    pub fn collect(dv: &mut dyn NumericDocValues, doc_map: &DocMap) -> Result<Self> {
        let mut values = vec![0i64; doc_map.live_count() as usize];
        let docs_with_field = collect_live(dv, doc_map, |dv, new_doc| {
            values[new_doc] = dv.long_value()?;
            Ok(())
        })?;
        let cost = docs_with_field.cardinality();
        Ok(CachedNumericDVs {
            values,
            docs_with_field,
            cost,
        })
    }
}

pub struct CachedBinaryDVs {
    values: Vec<Vec<u8>>,
    docs_with_field: FixedBitSet,
    cost: usize,
}

impl CachedBinaryDVs {
    pub fn collect(dv: &mut dyn BinaryDocValues, doc_map: &DocMap) -> Result<Self> {
        let mut values = vec![Vec::new(); doc_map.live_count() as usize];
        let docs_with_field = collect_live(dv, doc_map, |dv, new_doc| {
            values[new_doc] = dv.binary_value()?.to_vec();
            Ok(())
        })?;
        let cost = docs_with_field.cardinality();
        Ok(CachedBinaryDVs {
            values,
            docs_with_field,
            cost,
        })
    }
}

/// Ords of a sorted field by new doc id. The dictionary is not copied.
pub struct CachedSortedDVs {
    ords: Vec<i32>,
    docs_with_field: FixedBitSet,
    cost: usize,
}

impl CachedSortedDVs {
    pub fn collect(dv: &mut dyn SortedDocValues, doc_map: &DocMap) -> Result<Self> {
        let mut ords = vec![-1i32; doc_map.live_count() as usize];
        let docs_with_field = collect_live(dv, doc_map, |dv, new_doc| {
            ords[new_doc] = dv.ord_value()?;
            Ok(())
        })?;
        let cost = docs_with_field.cardinality();
        Ok(CachedSortedDVs {
            ords,
            docs_with_field,
            cost,
        })
    }
}

pub struct CachedSortedNumericDVs {
    values: Vec<Vec<i64>>,
    docs_with_field: FixedBitSet,
    cost: usize,
}

impl CachedSortedNumericDVs {
    pub fn collect(dv: &mut dyn SortedNumericDocValues, doc_map: &DocMap) -> Result<Self> {
        let mut values = vec![Vec::new(); doc_map.live_count() as usize];
        let docs_with_field = collect_live(dv, doc_map, |dv, new_doc| {
            let count = dv.doc_value_count();
            let mut doc_values = Vec::with_capacity(count);
            for _ in 0..count {
                doc_values.push(dv.next_value()?);
            }
            values[new_doc] = doc_values;
            Ok(())
        })?;
        let cost = docs_with_field.cardinality();
        Ok(CachedSortedNumericDVs {
            values,
            docs_with_field,
            cost,
        })
    }
}

pub struct CachedSortedSetDVs {
    ords: Vec<Vec<i64>>,
    docs_with_field: FixedBitSet,
    cost: usize,
}

impl CachedSortedSetDVs {
    pub fn collect(dv: &mut dyn SortedSetDocValues, doc_map: &DocMap) -> Result<Self> {
        let mut ords = vec![Vec::new(); doc_map.live_count() as usize];
        let docs_with_field = collect_live(dv, doc_map, |dv, new_doc| {
            let mut doc_ords = Vec::with_capacity(dv.doc_value_count());
            loop {
                let ord = dv.next_ord()?;
                if ord == NO_MORE_ORDS {
                    break;
                }
                doc_ords.push(ord);
            }
            ords[new_doc] = doc_ords;
            Ok(())
        })?;
        let cost = docs_with_field.cardinality();
        Ok(CachedSortedSetDVs {
            ords,
            docs_with_field,
            cost,
        })
    }
}

/// Remapped doc values of a sorting reader, collected at most once per field
/// and shared by every iterator handed out afterwards.
#[derive(Default)]
pub struct DocValuesCache {
    numeric: Mutex<HashMap<String, Arc<CachedNumericDVs>>>,
    binary: Mutex<HashMap<String, Arc<CachedBinaryDVs>>>,
    sorted: Mutex<HashMap<String, Arc<CachedSortedDVs>>>,
    sorted_numeric: Mutex<HashMap<String, Arc<CachedSortedNumericDVs>>>,
    sorted_set: Mutex<HashMap<String, Arc<CachedSortedSetDVs>>>,
}

/// The lock is not held while `collect` runs, so two threads may collect the
/// same field; the first one to finish wins.
pub fn get_or_collect<T, F>(
    cache: &Mutex<HashMap<String, Arc<T>>>,
    field: &str,
    collect: F,
) -> Result<Arc<T>>
where
    F: FnOnce() -> Result<T>,
{
    if let Some(cached) = cache.lock()?.get(field) {
        return Ok(Arc::clone(cached));
    }
    let collected = Arc::new(collect()?);
    let mut guard = cache.lock()?;
    let entry = guard.entry(field.to_string()).or_insert(collected);
    Ok(Arc::clone(entry))
}

impl DocValuesCache {
    pub fn numeric<F>(&self, field: &str, collect: F) -> Result<Arc<CachedNumericDVs>>
    where
        F: FnOnce() -> Result<CachedNumericDVs>,
    {
        get_or_collect(&self.numeric, field, collect)
    }

    pub fn binary<F>(&self, field: &str, collect: F) -> Result<Arc<CachedBinaryDVs>>
    where
        F: FnOnce() -> Result<CachedBinaryDVs>,
    {
        get_or_collect(&self.binary, field, collect)
    }

    pub fn sorted<F>(&self, field: &str, collect: F) -> Result<Arc<CachedSortedDVs>>
    where
        F: FnOnce() -> Result<CachedSortedDVs>,
    {
        get_or_collect(&self.sorted, field, collect)
    }

    pub fn sorted_numeric<F>(&self, field: &str, collect: F) -> Result<Arc<CachedSortedNumericDVs>>
    where
        F: FnOnce() -> Result<CachedSortedNumericDVs>,
    {
        get_or_collect(&self.sorted_numeric, field, collect)
    }

    pub fn sorted_set<F>(&self, field: &str, collect: F) -> Result<Arc<CachedSortedSetDVs>>
    where
        F: FnOnce() -> Result<CachedSortedSetDVs>,
    {
        get_or_collect(&self.sorted_set, field, collect)
    }
}

/// Implements doc iteration in new doc order over the `docs_with_field` of
/// the cached values. `on_doc` resets the per-document state after every
/// move.
macro_rules! sorting_doc_values_iterator {
    ($t:ident) => {
        impl DocIterator for $t {
            fn doc_id(&self) -> DocId {
                self.doc
            }

            fn next(&mut self) -> Result<DocId> {
                if self.doc == NO_MORE_DOCS {
                    return Ok(NO_MORE_DOCS);
                }
                let target = self.doc + 1;
                self.advance(target)
            }

            fn advance(&mut self, target: DocId) -> Result<DocId> {
                self.doc = self.cached.docs_with_field.next_set_bit(target as usize);
                self.on_doc();
                Ok(self.doc)
            }

            fn cost(&self) -> usize {
                self.cached.cost
            }
        }

        impl DocValuesIterator for $t {
            fn advance_exact(&mut self, target: DocId) -> Result<bool> {
                if target < 0 || target as usize >= self.cached.docs_with_field.len() {
                    bail!(IllegalArgument(format!(
                        "target {} out of bounds for {} docs",
                        target,
                        self.cached.docs_with_field.len()
                    )));
                }
                self.doc = target;
                self.on_doc();
                Ok(self.cached.docs_with_field.is_set(target as usize))
            }
        }

        impl $t {
            fn current(&self) -> Result<usize> {
                if self.doc < 0
                    || self.doc == NO_MORE_DOCS
                    || !self.cached.docs_with_field.is_set(self.doc as usize)
                {
                    bail!(IllegalState(format!("no value for doc {}", self.doc)));
                }
                Ok(self.doc as usize)
            }
        }
    };
}

pub struct SortingNumericDocValues {
    cached: Arc<CachedNumericDVs>,
    doc: DocId,
}

impl SortingNumericDocValues {
    pub fn new(cached: Arc<CachedNumericDVs>) -> Self {
        SortingNumericDocValues { cached, doc: -1 }
    }

    fn on_doc(&mut self) {}
}

sorting_doc_values_iterator!(SortingNumericDocValues);

impl NumericDocValues for SortingNumericDocValues {
    fn long_value(&self) -> Result<i64> {
        Ok(self.cached.values[self.current()?])
    }
}

pub struct SortingBinaryDocValues {
    cached: Arc<CachedBinaryDVs>,
    doc: DocId,
}

impl SortingBinaryDocValues {
    pub fn new(cached: Arc<CachedBinaryDVs>) -> Self {
        SortingBinaryDocValues { cached, doc: -1 }
    }

    fn on_doc(&mut self) {}
}

sorting_doc_values_iterator!(SortingBinaryDocValues);

impl BinaryDocValues for SortingBinaryDocValues {
    fn binary_value(&self) -> Result<&[u8]> {
        Ok(&self.cached.values[self.current()?])
    }
}

/// Serves remapped ords; `lookup_ord` and `value_count` go to the wrapped
/// column, whose dictionary does not depend on doc order.
pub struct SortingSortedDocValues {
    cached: Arc<CachedSortedDVs>,
    dict: Box<dyn SortedDocValues>,
    doc: DocId,
}

impl SortingSortedDocValues {
    pub fn new(cached: Arc<CachedSortedDVs>, dict: Box<dyn SortedDocValues>) -> Self {
        SortingSortedDocValues {
            cached,
            dict,
            doc: -1,
        }
    }

    fn on_doc(&mut self) {}
}

sorting_doc_values_iterator!(SortingSortedDocValues);

impl SortedDocValues for SortingSortedDocValues {
    fn ord_value(&self) -> Result<i32> {
        Ok(self.cached.ords[self.current()?])
    }

    fn lookup_ord(&self, ord: i32) -> Result<&[u8]> {
        self.dict.lookup_ord(ord)
    }

    fn value_count(&self) -> usize {
        self.dict.value_count()
    }
}

pub struct SortingSortedNumericDocValues {
    cached: Arc<CachedSortedNumericDVs>,
    doc: DocId,
    upto: usize,
}

impl SortingSortedNumericDocValues {
    pub fn new(cached: Arc<CachedSortedNumericDVs>) -> Self {
        SortingSortedNumericDocValues {
            cached,
            doc: -1,
            upto: 0,
        }
    }

    fn on_doc(&mut self) {
        self.upto = 0;
    }
}

sorting_doc_values_iterator!(SortingSortedNumericDocValues);

impl SortedNumericDocValues for SortingSortedNumericDocValues {
    fn doc_value_count(&self) -> usize {
        self.current()
            .map(|doc| self.cached.values[doc].len())
            .unwrap_or(0)
    }

    fn next_value(&mut self) -> Result<i64> {
        let doc = self.current()?;
        match self.cached.values[doc].get(self.upto) {
            Some(&value) => {
                self.upto += 1;
                Ok(value)
            }
            None => bail!(IllegalState(format!(
                "doc {} has only {} values",
                doc, self.upto
            ))),
        }
    }
}

pub struct SortingSortedSetDocValues {
    cached: Arc<CachedSortedSetDVs>,
    dict: Box<dyn SortedSetDocValues>,
    doc: DocId,
    upto: usize,
}

impl SortingSortedSetDocValues {
    pub fn new(cached: Arc<CachedSortedSetDVs>, dict: Box<dyn SortedSetDocValues>) -> Self {
        SortingSortedSetDocValues {
            cached,
            dict,
            doc: -1,
            upto: 0,
        }
    }

    fn on_doc(&mut self) {
        self.upto = 0;
    }
}

sorting_doc_values_iterator!(SortingSortedSetDocValues);

impl SortedSetDocValues for SortingSortedSetDocValues {
    fn doc_value_count(&self) -> usize {
        self.current()
            .map(|doc| self.cached.ords[doc].len())
            .unwrap_or(0)
    }

    fn next_ord(&mut self) -> Result<i64> {
        let doc = self.current()?;
        match self.cached.ords[doc].get(self.upto) {
            Some(&ord) => {
                self.upto += 1;
                Ok(ord)
            }
            None => Ok(NO_MORE_ORDS),
        }
    }

    fn lookup_ord(&self, ord: i64) -> Result<&[u8]> {
        self.dict.lookup_ord(ord)
    }

    fn value_count(&self) -> usize {
        self.dict.value_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::memory::{ColumnIterator, NumericColumn};

    #[test]
    fn test_collect_skips_deleted_docs() {
        let column = Arc::new(NumericColumn::new(vec![(0, 10), (2, 30), (3, 40)]));
        let mut dv = ColumnIterator::new(column);
        // doc 1 has no value, doc 2 is deleted
        let doc_map = DocMap::from_new_to_old(4, vec![3, 1, 0]).unwrap();
        let cached = CachedNumericDVs::collect(&mut dv, &doc_map).unwrap();
        assert_eq!(cached.cost, 2);

        let mut sorted = SortingNumericDocValues::new(Arc::new(cached));
        assert_eq!(sorted.next().unwrap(), 0);
        assert_eq!(sorted.long_value().unwrap(), 40);
        assert_eq!(sorted.next().unwrap(), 2);
        assert_eq!(sorted.long_value().unwrap(), 10);
        assert_eq!(sorted.next().unwrap(), NO_MORE_DOCS);
        assert_eq!(sorted.next().unwrap(), NO_MORE_DOCS);
        assert!(!sorted.advance_exact(1).unwrap());
        assert!(sorted.long_value().is_err());
        assert!(sorted.advance_exact(3).is_err());
    }

    #[test]
    fn test_cache_collects_once() {
        let cache = DocValuesCache::default();
        let doc_map = DocMap::from_new_to_old(1, vec![0]).unwrap();
        let mut calls = 0;
        for _ in 0..3 {
            let cached = cache
                .numeric("f", || {
                    calls += 1;
                    let column = Arc::new(NumericColumn::new(vec![(0, 7)]));
                    CachedNumericDVs::collect(&mut ColumnIterator::new(column), &doc_map)
                })
                .unwrap();
            assert_eq!(cached.values, vec![7]);
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.numeric.lock().unwrap().len(), 1);
    }
}
