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

use core::codec::{SortKeyColumn, SortKeyExtractor};
use core::index::merge::OneMergeProgress;
use core::index::reader::LeafReader;
use core::search::sort_field::Sort;
use core::util::{is_live_doc, DocId};

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::cmp::Ordering;
use std::time::Instant;

/// A permutation of doc IDs. For every document ID between `0` and
/// `max_doc`, `old_to_new(new_to_old(doc_id))` must return `doc_id`.
pub trait SorterDocMap: Send + Sync {
    /// Given a doc ID from the original index, return its ordinal in the
    /// sorted index.
    fn old_to_new(&self, doc_id: DocId) -> DocId;

    /// Given the ordinal of a doc ID, return its doc ID in the original index.
    fn new_to_old(&self, doc_id: DocId) -> DocId;

    /// Return the number of documents in this map. This must be equal to the
    /// number of live documents of the `LeafReader` which is sorted.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bijection between the live docs of a segment and the dense range
/// `[0, live_count)`.
///
/// `old_to_new` is addressable by every old doc ID below `max_doc`; slots of
/// deleted docs hold `-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocMap {
    max_doc: DocId,
    old_to_new: Vec<DocId>,
    new_to_old: Vec<DocId>,
}

impl DocMap {
    /// Builds the map from the sorted list of live old doc IDs, inverting it
    /// in one pass.
    pub fn from_new_to_old(max_doc: DocId, new_to_old: Vec<DocId>) -> Result<DocMap> {
        let mut old_to_new = vec![-1; max_doc as usize];
        for (new_id, &old_id) in new_to_old.iter().enumerate() {
            if old_id < 0 || old_id >= max_doc {
                bail!(IllegalArgument(format!(
                    "doc {} out of bounds for max_doc {}",
                    old_id, max_doc
                )));
            }
            if old_to_new[old_id as usize] != -1 {
                bail!(IllegalArgument(format!("doc {} mapped twice", old_id)));
            }
            old_to_new[old_id as usize] = new_id as DocId;
        }
        Ok(DocMap {
            max_doc,
            old_to_new,
            new_to_old,
        })
    }

    /// Number of docs of the original segment, deleted ones included.
    pub fn max_doc(&self) -> DocId {
        self.max_doc
    }

    pub fn live_count(&self) -> DocId {
        self.new_to_old.len() as DocId
    }

    pub fn is_live(&self, old_id: DocId) -> bool {
        old_id >= 0 && old_id < self.max_doc && self.old_to_new[old_id as usize] >= 0
    }

    /// Returns the new ID of `old_id`, or `None` when the doc was deleted.
    pub fn try_old_to_new(&self, old_id: DocId) -> Option<DocId> {
        match self.old_to_new.get(old_id as usize) {
            Some(&new_id) if new_id >= 0 => Some(new_id),
            _ => None,
        }
    }

    /// True when the map neither moves nor drops any doc.
    pub fn is_identity(&self) -> bool {
        self.live_count() == self.max_doc
            && self
                .new_to_old
                .iter()
                .enumerate()
                .all(|(i, &old)| i as DocId == old)
    }
}

impl SorterDocMap for DocMap {
    fn old_to_new(&self, doc_id: DocId) -> DocId {
        debug_assert!(self.is_live(doc_id), "doc {} is not live", doc_id);
        self.old_to_new[doc_id as usize]
    }

    fn new_to_old(&self, doc_id: DocId) -> DocId {
        self.new_to_old[doc_id as usize]
    }

    fn len(&self) -> usize {
        self.new_to_old.len()
    }
}

/// Sorts documents of a given index by returning a permutation
/// on the document IDs.
pub struct Sorter {
    sort: Sort,
}

impl Sorter {
    pub fn new(sort: Sort) -> Self {
        Sorter { sort }
    }

    pub fn get_sort(&self) -> &Sort {
        &self.sort
    }

    /// Check consistency of a `DocMap`, useful for assertions.
    pub fn is_consistent(doc_map: &DocMap) -> bool {
        let live_count = doc_map.live_count();
        let mut seen = vec![false; live_count as usize];
        for old_id in 0..doc_map.max_doc() {
            if let Some(new_id) = doc_map.try_old_to_new(old_id) {
                if new_id >= live_count || seen[new_id as usize] {
                    return false;
                }
                seen[new_id as usize] = true;
                if doc_map.new_to_old(new_id) != old_id {
                    return false;
                }
            }
        }
        seen.into_iter().all(|s| s)
    }

    /// Computes the new order of the live docs of `reader`.
    ///
    /// All sort fields are validated before any key is extracted. The merge
    /// is checked for abort between sort fields.
    pub fn sort_leaf_reader<R: LeafReader + ?Sized>(
        &self,
        reader: &R,
        progress: &OneMergeProgress,
    ) -> Result<DocMap> {
        let start = Instant::now();
        let extractor = SortKeyExtractor::new(&self.sort, reader.field_infos())?;

        let max_doc = reader.max_doc();
        let live_docs = reader.live_docs();
        let mut docs = Vec::with_capacity(reader.num_docs() as usize);
        for doc in 0..max_doc {
            if is_live_doc(live_docs.as_ref(), doc as usize)? {
                docs.push(doc);
            }
        }

        let mut columns = Vec::with_capacity(extractor.len());
        for i in 0..extractor.len() {
            progress.check_aborted()?;
            columns.push(extractor.extract(reader, i)?);
        }
        progress.check_aborted()?;

        let doc_map = Self::sort(max_doc, docs, &columns)?;
        debug_assert!(Self::is_consistent(&doc_map));
        debug!(
            "segment '{}' sorted by {}: {} of {} docs live, identity={}, took {:?}",
            reader.name(),
            self.sort,
            doc_map.live_count(),
            max_doc,
            doc_map.is_identity(),
            start.elapsed()
        );
        Ok(doc_map)
    }

    /// Computes the permutation of `docs` (live old doc IDs, ascending) under
    /// the comparator chain of `columns`, breaking ties by old doc ID.
    pub fn sort(max_doc: DocId, mut docs: Vec<DocId>, columns: &[SortKeyColumn]) -> Result<DocMap> {
        docs.sort_by(|doc1, doc2| {
            for column in columns {
                let cmp = column.compare(*doc1, *doc2);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            doc1.cmp(doc2)
        });
        DocMap::from_new_to_old(max_doc, docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::index::merge::is_merge_aborted;
    use core::index::reader::MemorySegment;
    use core::index::tests::{numeric_segment, rank_sort, sample_segment};
    use core::index::writer::SegmentBuilder;
    use core::search::sort_field::{SortField, SortFieldMissingValue, SortFieldType};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sort_by(segment: &MemorySegment, sort: Sort) -> DocMap {
        Sorter::new(sort)
            .sort_leaf_reader(segment, &OneMergeProgress::new())
            .unwrap()
    }

    fn new_to_old(doc_map: &DocMap) -> Vec<DocId> {
        (0..doc_map.live_count())
            .map(|doc| doc_map.new_to_old(doc))
            .collect()
    }

    #[test]
    fn test_sort_ascending() {
        let segment = numeric_segment(&[Some(18), Some(-1), Some(7)], &[]);
        let doc_map = sort_by(&segment, rank_sort());
        assert_eq!(new_to_old(&doc_map), vec![1, 2, 0]);
        assert_eq!(doc_map.old_to_new(0), 2);
        assert_eq!(doc_map.old_to_new(1), 0);
        assert_eq!(doc_map.old_to_new(2), 1);
        assert!(!doc_map.is_identity());
        assert!(Sorter::is_consistent(&doc_map));
    }

    #[test]
    fn test_ties_keep_old_order() {
        let segment = numeric_segment(&[Some(5), Some(3), Some(5), Some(3)], &[]);
        let doc_map = sort_by(&segment, rank_sort());
        assert_eq!(new_to_old(&doc_map), vec![1, 3, 0, 2]);

        let reversed = Sort::new(vec![SortField::new("rank", SortFieldType::Long, true)]);
        let doc_map = sort_by(&segment, reversed);
        assert_eq!(new_to_old(&doc_map), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_missing_values() {
        let segment = numeric_segment(&[Some(2), None, Some(1)], &[]);
        assert_eq!(new_to_old(&sort_by(&segment, rank_sort())), vec![2, 0, 1]);

        let reversed = Sort::new(vec![SortField::new("rank", SortFieldType::Long, true)]);
        assert_eq!(new_to_old(&sort_by(&segment, reversed)), vec![0, 2, 1]);

        let mut first = SortField::new("rank", SortFieldType::Long, false);
        first.set_missing_value(SortFieldMissingValue::First);
        assert_eq!(
            new_to_old(&sort_by(&segment, Sort::new(vec![first]))),
            vec![1, 2, 0]
        );
    }

    #[test]
    fn test_deleted_docs_are_dropped() {
        let segment = numeric_segment(&[Some(18), Some(-1), Some(7), Some(3)], &[1]);
        let doc_map = sort_by(&segment, rank_sort());
        assert_eq!(doc_map.max_doc(), 4);
        assert_eq!(doc_map.live_count(), 3);
        assert_eq!(new_to_old(&doc_map), vec![3, 2, 0]);
        assert!(!doc_map.is_live(1));
        assert_eq!(doc_map.try_old_to_new(1), None);
        assert_eq!(doc_map.try_old_to_new(3), Some(0));
        assert_eq!(doc_map.try_old_to_new(4), None);
    }

    #[test]
    fn test_empty_sort_compacts() {
        let segment = numeric_segment(&[Some(18), None, Some(7)], &[1]);
        let doc_map = sort_by(&segment, Sort::default());
        assert_eq!(new_to_old(&doc_map), vec![0, 2]);

        let segment = numeric_segment(&[Some(18), None, Some(7)], &[]);
        assert!(sort_by(&segment, Sort::default()).is_identity());
    }

    #[test]
    fn test_no_live_docs() {
        let segment = numeric_segment(&[Some(2), Some(1)], &[0, 1]);
        let doc_map = sort_by(&segment, rank_sort());
        assert_eq!(doc_map.max_doc(), 2);
        assert_eq!(doc_map.live_count(), 0);
        assert!(doc_map.is_empty());
        assert!(new_to_old(&doc_map).is_empty());
        assert_eq!(doc_map.try_old_to_new(0), None);
        assert!(Sorter::is_consistent(&doc_map));

        let empty = SegmentBuilder::new("_e").finish().unwrap();
        let doc_map = sort_by(&empty, Sort::default());
        assert_eq!(doc_map.max_doc(), 0);
        assert!(doc_map.is_identity());
    }

    #[test]
    fn test_redundant_trailing_fields_change_nothing() {
        let segment = sample_segment();
        let alone = sort_by(&segment, rank_sort());
        let padded = Sort::new(vec![
            SortField::new("rank", SortFieldType::Long, false),
            SortField::new("cat", SortFieldType::String, false),
            SortField::new("rank", SortFieldType::Long, true),
        ]);
        assert_eq!(sort_by(&segment, padded), alone);
    }

    #[test]
    fn test_sort_is_repeatable() {
        let segment = numeric_segment(&[Some(4), None, Some(4), Some(-9), None, Some(4)], &[2]);
        let first = sort_by(&segment, rank_sort());
        let second = sort_by(&segment, rank_sort());
        assert_eq!(first, second);
        assert_eq!(new_to_old(&first), vec![3, 0, 5, 1, 4]);
    }

    #[test]
    fn test_multiple_sort_fields() {
        let segment = sample_segment();
        let sort = Sort::new(vec![
            SortField::new("cat", SortFieldType::String, false),
            SortField::new("rank", SortFieldType::Long, true),
        ]);
        assert_eq!(new_to_old(&sort_by(&segment, sort)), vec![1, 0, 2, 4]);
    }

    #[test]
    fn test_sort_sorted_set_by_min() {
        let segment = sample_segment();
        let sort = Sort::new(vec![
            SortField::new("tags", SortFieldType::String, false),
            SortField::new("rank", SortFieldType::Long, false),
        ]);
        // mins: 0 -> x, 1 -> z, 2 -> x, 4 -> y
        assert_eq!(new_to_old(&sort_by(&segment, sort)), vec![2, 0, 4, 1]);
    }

    #[test]
    fn test_aborted_sort() {
        let segment = sample_segment();
        let progress = OneMergeProgress::new();
        progress.abort();
        let err = Sorter::new(rank_sort())
            .sort_leaf_reader(&segment, &progress)
            .err()
            .unwrap();
        assert!(is_merge_aborted(&err));
    }

    #[test]
    fn test_doc_map_rejects_invalid_permutation() {
        assert!(DocMap::from_new_to_old(3, vec![0, 0]).is_err());
        assert!(DocMap::from_new_to_old(3, vec![0, 3]).is_err());
        assert!(DocMap::from_new_to_old(3, vec![-1]).is_err());
        assert!(DocMap::from_new_to_old(3, vec![2, 0]).is_ok());
    }

    #[test]
    fn test_random_sort_is_ordered_bijection() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let max_doc = rng.gen_range(1, 200);
            let mut builder = SegmentBuilder::new("_r");
            let mut values = Vec::with_capacity(max_doc);
            for _ in 0..max_doc {
                let doc = builder.add_document();
                let value = if rng.gen_bool(0.1) {
                    None
                } else {
                    Some(rng.gen_range(-20i64, 20))
                };
                if let Some(v) = value {
                    builder.add_numeric(doc, "rank", v).unwrap();
                }
                if rng.gen_bool(0.2) {
                    builder.delete_document(doc).unwrap();
                }
                values.push(value);
            }
            let segment = builder.finish().unwrap();
            let live = segment.num_docs();

            let doc_map = sort_by(&segment, rank_sort());
            assert_eq!(doc_map.live_count(), live);
            assert!(Sorter::is_consistent(&doc_map));

            let order = new_to_old(&doc_map);
            for pair in order.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                assert!(segment.live_docs().map_or(true, |bits| bits.get(a as usize).unwrap()));
                let in_order = match (values[a as usize], values[b as usize]) {
                    (Some(x), Some(y)) => x < y || (x == y && a < b),
                    (Some(_), None) => true,
                    (None, Some(_)) => false,
                    (None, None) => a < b,
                };
                assert!(in_order, "doc {} sorted before doc {}", a, b);
            }
        }
    }
}
