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

//! Views of a segment with its documents renumbered by a `Sort`.

mod doc_values;

pub use self::doc_values::*;

mod postings;

pub use self::postings::*;

mod points;

pub use self::points::*;

mod vectors;

pub use self::vectors::*;

use core::codec::doc_values::{
    BinaryDocValues, NumericDocValues, SortedDocValues, SortedNumericDocValues,
    SortedSetDocValues,
};
use core::codec::field_infos::{FieldInfo, FieldInfos};
use core::codec::points::PointValues;
use core::codec::vectors::{HnswGraph, VectorValues};
use core::codec::{DocMap, Fields, Sorter, SorterDocMap};
use core::doc::StoredFieldVisitor;
use core::index::merge::OneMergeProgress;
use core::index::reader::LeafReader;
use core::search::sort_field::Sort;
use core::util::{BitsRef, DocId};

use error::ErrorKind::{CorruptIndex, IllegalArgument, IllegalState};
use error::Result;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A `LeafReader` which presents the live documents of another reader in
/// the order of a `Sort`, numbered densely from zero.
///
/// Deleted documents are gone from every view: `max_doc` equals the number
/// of live documents and there are no live docs bits. Doc values are
/// remapped once per field and cached; everything else is remapped lazily
/// on access.
pub struct SortingLeafReader<R: LeafReader + ?Sized> {
    reader: Arc<R>,
    doc_map: Arc<DocMap>,
    sort: Sort,
    doc_values: DocValuesCache,
    ordinals: Mutex<HashMap<String, Arc<OrdinalMap>>>,
}

impl<R: LeafReader + ?Sized> SortingLeafReader<R> {
    /// Sorts `reader` by `sort` and wraps it.
    pub fn wrap(reader: Arc<R>, sort: &Sort, progress: &OneMergeProgress) -> Result<Self> {
        let doc_map = Sorter::new(sort.clone()).sort_leaf_reader(reader.as_ref(), progress)?;
        Ok(Self::new(reader, Arc::new(doc_map), sort.clone()))
    }

    /// Wraps `reader` with a prebuilt map, which must cover its `max_doc`.
    pub fn new(reader: Arc<R>, doc_map: Arc<DocMap>, sort: Sort) -> Self {
        debug_assert_eq!(reader.max_doc(), doc_map.max_doc());
        SortingLeafReader {
            reader,
            doc_map,
            sort,
            doc_values: DocValuesCache::default(),
            ordinals: Mutex::new(HashMap::new()),
        }
    }

    pub fn doc_map(&self) -> &Arc<DocMap> {
        &self.doc_map
    }

    pub fn reader(&self) -> &Arc<R> {
        &self.reader
    }

    fn old_doc(&self, doc_id: DocId) -> Result<DocId> {
        if doc_id < 0 || doc_id >= self.doc_map.live_count() {
            bail!(IllegalArgument(format!(
                "doc {} out of bounds for {} sorted docs",
                doc_id,
                self.doc_map.live_count()
            )));
        }
        Ok(self.doc_map.new_to_old(doc_id))
    }

    fn ordinal_map(&self, field: &str, values: &dyn VectorValues) -> Result<Arc<OrdinalMap>> {
        get_or_collect(&self.ordinals, field, || {
            OrdinalMap::build(values, &self.doc_map)
        })
    }
}

fn doc_values_vanished(field: &str) -> ::error::Error {
    IllegalState(format!("doc values of field '{}' vanished", field)).into()
}

impl<R: LeafReader + ?Sized> LeafReader for SortingLeafReader<R> {
    fn name(&self) -> &str {
        self.reader.name()
    }

    fn max_doc(&self) -> DocId {
        self.doc_map.live_count()
    }

    fn num_docs(&self) -> DocId {
        self.doc_map.live_count()
    }

    fn live_docs(&self) -> Option<BitsRef> {
        None
    }

    fn field_infos(&self) -> &FieldInfos {
        self.reader.field_infos()
    }

    fn field_info(&self, field: &str) -> Option<&FieldInfo> {
        self.reader.field_info(field)
    }

    fn fields(&self) -> Result<Box<dyn Fields>> {
        Ok(Box::new(SortingFields::new(
            self.reader.fields()?,
            Arc::clone(&self.doc_map),
        )))
    }

    fn term_vector(&self, doc_id: DocId) -> Result<Option<Box<dyn Fields>>> {
        self.reader.term_vector(self.old_doc(doc_id)?)
    }

    fn document(&self, doc_id: DocId, visitor: &mut dyn StoredFieldVisitor) -> Result<()> {
        self.reader.document(self.old_doc(doc_id)?, visitor)
    }

    fn get_numeric_doc_values(&self, field: &str) -> Result<Option<Box<dyn NumericDocValues>>> {
        let mut dv = match self.reader.get_numeric_doc_values(field)? {
            Some(dv) => dv,
            None => return Ok(None),
        };
        let cached = self.doc_values.numeric(field, || {
            CachedNumericDVs::collect(dv.as_mut(), &self.doc_map)
        })?;
        Ok(Some(Box::new(SortingNumericDocValues::new(cached))))
    }

    fn get_binary_doc_values(&self, field: &str) -> Result<Option<Box<dyn BinaryDocValues>>> {
        let mut dv = match self.reader.get_binary_doc_values(field)? {
            Some(dv) => dv,
            None => return Ok(None),
        };
        let cached = self.doc_values.binary(field, || {
            CachedBinaryDVs::collect(dv.as_mut(), &self.doc_map)
        })?;
        Ok(Some(Box::new(SortingBinaryDocValues::new(cached))))
    }

    fn get_sorted_doc_values(&self, field: &str) -> Result<Option<Box<dyn SortedDocValues>>> {
        let dict = match self.reader.get_sorted_doc_values(field)? {
            Some(dv) => dv,
            None => return Ok(None),
        };
        let cached = self.doc_values.sorted(field, || {
            match self.reader.get_sorted_doc_values(field)? {
                Some(mut dv) => CachedSortedDVs::collect(dv.as_mut(), &self.doc_map),
                None => Err(doc_values_vanished(field)),
            }
        })?;
        Ok(Some(Box::new(SortingSortedDocValues::new(cached, dict))))
    }

    fn get_sorted_numeric_doc_values(
        &self,
        field: &str,
    ) -> Result<Option<Box<dyn SortedNumericDocValues>>> {
        let mut dv = match self.reader.get_sorted_numeric_doc_values(field)? {
            Some(dv) => dv,
            None => return Ok(None),
        };
        let cached = self.doc_values.sorted_numeric(field, || {
            CachedSortedNumericDVs::collect(dv.as_mut(), &self.doc_map)
        })?;
        Ok(Some(Box::new(SortingSortedNumericDocValues::new(cached))))
    }

    fn get_sorted_set_doc_values(
        &self,
        field: &str,
    ) -> Result<Option<Box<dyn SortedSetDocValues>>> {
        let dict = match self.reader.get_sorted_set_doc_values(field)? {
            Some(dv) => dv,
            None => return Ok(None),
        };
        let cached = self.doc_values.sorted_set(field, || {
            match self.reader.get_sorted_set_doc_values(field)? {
                Some(mut dv) => CachedSortedSetDVs::collect(dv.as_mut(), &self.doc_map),
                None => Err(doc_values_vanished(field)),
            }
        })?;
        Ok(Some(Box::new(SortingSortedSetDocValues::new(cached, dict))))
    }

    fn point_values(&self) -> Option<Arc<dyn PointValues>> {
        self.reader.point_values().map(|p| {
            Arc::new(SortingPointValues::new(p, Arc::clone(&self.doc_map))) as Arc<dyn PointValues>
        })
    }

    fn get_vector_values(&self, field: &str) -> Result<Option<Arc<dyn VectorValues>>> {
        let values = match self.reader.get_vector_values(field)? {
            Some(values) => values,
            None => return Ok(None),
        };
        let ords = self.ordinal_map(field, values.as_ref())?;
        Ok(Some(Arc::new(SortingVectorValues::new(values, ords))))
    }

    fn get_hnsw_graph(&self, field: &str) -> Result<Option<Arc<dyn HnswGraph>>> {
        let graph = match self.reader.get_hnsw_graph(field)? {
            Some(graph) => graph,
            None => return Ok(None),
        };
        let values = match self.reader.get_vector_values(field)? {
            Some(values) => values,
            None => bail!(CorruptIndex(format!(
                "field '{}' has a graph but no vectors",
                field
            ))),
        };
        let ords = self.ordinal_map(field, values.as_ref())?;
        Ok(Some(Arc::new(SortingHnswGraph::new(graph.as_ref(), &ords)?)))
    }

    /// The sort of this view, `None` for the empty sort which only drops
    /// deleted docs.
    fn index_sort(&self) -> Option<&Sort> {
        if self.sort.is_empty() {
            None
        } else {
            Some(&self.sort)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::doc_values::NO_MORE_ORDS;
    use core::codec::memory::{OnHeapHnswGraph, Position, Posting};
    use core::codec::points::Relation;
    use core::codec::vectors::{VectorOrd, VectorValuesIterator};
    use core::doc::{DocumentStoredFieldVisitor, StoredValue};
    use core::index::reader::MemorySegment;
    use core::index::tests::*;
    use core::index::writer::SegmentBuilder;
    use core::search::sort_field::{SortField, SortFieldType};
    use core::search::tests::collect_docs;
    use core::search::{DocIterator, PostingIteratorFlags, NO_MORE_DOCS};

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use std::collections::BTreeSet;

    fn sorted_sample() -> SortingLeafReader<MemorySegment> {
        let progress = OneMergeProgress::new();
        SortingLeafReader::wrap(Arc::new(sample_segment()), &rank_sort(), &progress).unwrap()
    }

    #[test]
    fn test_view_shape() {
        let reader = sorted_sample();
        assert_eq!(reader.doc_map().live_count(), 4);
        assert_eq!(reader.max_doc(), 4);
        assert_eq!(reader.num_docs(), 4);
        assert!(reader.live_docs().is_none());
        assert!(!reader.has_deletions());
        assert_eq!(reader.index_sort(), Some(&rank_sort()));
        assert_eq!(reader.field_infos().len(), reader.reader().field_infos().len());
    }

    #[test]
    fn test_stored_fields_follow_new_order() {
        let reader = sorted_sample();
        let mut ids = vec![];
        for doc in 0..reader.max_doc() {
            let mut visitor = DocumentStoredFieldVisitor::new(&["id".to_string()]);
            reader.document(doc, &mut visitor).unwrap();
            ids.push(visitor.document().get_values("id")[0].clone());
        }
        assert_eq!(
            ids,
            vec![
                StoredValue::Int(1),
                StoredValue::Int(2),
                StoredValue::Int(4),
                StoredValue::Int(0)
            ]
        );

        let mut visitor = DocumentStoredFieldVisitor::new(&[]);
        assert!(reader.document(4, &mut visitor).is_err());
        assert!(reader.document(-1, &mut visitor).is_err());
    }

    #[test]
    fn test_term_vectors_follow_new_order() {
        let reader = sorted_sample();
        // old doc 0 is new doc 3, old doc 4 is new doc 2
        let tv = reader.term_vector(3).unwrap().unwrap();
        let mut terms = tv.terms("body").unwrap().unwrap().iterator().unwrap();
        assert_eq!(terms.next().unwrap(), Some(b"foo".to_vec()));
        let tv = reader.term_vector(2).unwrap().unwrap();
        let mut terms = tv.terms("body").unwrap().unwrap().iterator().unwrap();
        assert_eq!(terms.next().unwrap(), Some(b"bar".to_vec()));
        assert!(reader.term_vector(0).unwrap().is_none());
        assert!(reader.term_vector(4).is_err());
    }

    #[test]
    fn test_numeric_and_binary_doc_values() {
        let reader = sorted_sample();
        let mut rank = reader.get_numeric_doc_values("rank").unwrap().unwrap();
        let mut values = vec![];
        while rank.next().unwrap() != NO_MORE_DOCS {
            values.push((rank.doc_id(), rank.long_value().unwrap()));
        }
        assert_eq!(values, vec![(0, -1), (1, 7), (2, 12), (3, 18)]);

        let mut title = reader.get_binary_doc_values("title").unwrap().unwrap();
        assert!(title.advance_exact(2).unwrap());
        assert_eq!(title.binary_value().unwrap(), b"t4");
        assert_eq!(title.next().unwrap(), 3);
        assert_eq!(title.binary_value().unwrap(), b"t0");
        assert_eq!(title.next().unwrap(), NO_MORE_DOCS);

        assert!(reader.get_numeric_doc_values("missing").unwrap().is_none());
        // wrong shape for an existing field
        assert!(reader.get_numeric_doc_values("title").is_err());
    }

    #[test]
    fn test_sorted_doc_values_keep_dictionary() {
        let reader = sorted_sample();
        let mut cat = reader.get_sorted_doc_values("cat").unwrap().unwrap();
        assert_eq!(cat.value_count(), 3);
        let mut values = vec![];
        while cat.next().unwrap() != NO_MORE_DOCS {
            let ord = cat.ord_value().unwrap();
            values.push((cat.doc_id(), cat.lookup_ord(ord).unwrap().to_vec()));
        }
        assert_eq!(
            values,
            vec![(0, b"a".to_vec()), (1, b"c".to_vec()), (3, b"b".to_vec())]
        );

        let mut cat = reader.get_sorted_doc_values("cat").unwrap().unwrap();
        assert!(!cat.advance_exact(2).unwrap());
        assert!(cat.ord_value().is_err());
    }

    #[test]
    fn test_multi_valued_doc_values() {
        let reader = sorted_sample();
        let mut nums = reader.get_sorted_numeric_doc_values("nums").unwrap().unwrap();
        let mut values = vec![];
        while nums.next().unwrap() != NO_MORE_DOCS {
            let mut doc_values = vec![];
            for _ in 0..nums.doc_value_count() {
                doc_values.push(nums.next_value().unwrap());
            }
            values.push((nums.doc_id(), doc_values));
        }
        assert_eq!(
            values,
            vec![(0, vec![2]), (2, vec![3, 7, 7]), (3, vec![1, 5])]
        );

        let mut tags = reader.get_sorted_set_doc_values("tags").unwrap().unwrap();
        let mut values = vec![];
        while tags.next().unwrap() != NO_MORE_DOCS {
            let mut doc_values = vec![];
            loop {
                let ord = tags.next_ord().unwrap();
                if ord == NO_MORE_ORDS {
                    break;
                }
                doc_values.push(tags.lookup_ord(ord).unwrap().to_vec());
            }
            values.push((tags.doc_id(), doc_values));
        }
        assert_eq!(
            values,
            vec![
                (0, vec![b"z".to_vec()]),
                (1, vec![b"x".to_vec()]),
                (2, vec![b"y".to_vec(), b"z".to_vec()]),
                (3, vec![b"x".to_vec(), b"y".to_vec()]),
            ]
        );
    }

    #[test]
    fn test_doc_values_are_cached_per_field() {
        let reader = sorted_sample();
        let mut first = reader.get_numeric_doc_values("rank").unwrap().unwrap();
        let mut second = reader.get_numeric_doc_values("rank").unwrap().unwrap();
        assert_eq!(collect_docs(first.as_mut()).unwrap(), vec![0, 1, 2, 3]);
        assert_eq!(collect_docs(second.as_mut()).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_postings_are_remapped() {
        let reader = sorted_sample();
        let fields = reader.fields().unwrap();
        let terms = fields.terms("body").unwrap().unwrap();
        // statistics still count the deleted doc
        assert_eq!(terms.sum_doc_freq().unwrap(), 6);
        assert_eq!(terms.doc_count().unwrap(), 5);

        let mut iter = terms.iterator().unwrap();
        assert!(iter.seek_exact(b"foo").unwrap());
        assert_eq!(iter.doc_freq().unwrap(), 4);

        let mut docs = iter.postings_with_flags(PostingIteratorFlags::FREQS).unwrap();
        let mut freqs = vec![];
        while docs.next().unwrap() != NO_MORE_DOCS {
            freqs.push((docs.doc_id(), docs.freq().unwrap()));
        }
        // old docs 2, 4, 0 map to 1, 2, 3; deleted doc 3 is dropped
        assert_eq!(freqs, vec![(1, 1), (2, 1), (3, 2)]);

        let mut postings = iter.postings_with_flags(PostingIteratorFlags::ALL).unwrap();
        assert_eq!(postings.advance(3).unwrap(), 3);
        assert_eq!(postings.freq().unwrap(), 2);
        assert_eq!(postings.next_position().unwrap(), 0);
        assert_eq!(postings.start_offset().unwrap(), 0);
        assert_eq!(postings.end_offset().unwrap(), 3);
        assert_eq!(postings.payload().unwrap(), b"p0".to_vec());
        assert_eq!(postings.next_position().unwrap(), 3);
        assert_eq!(postings.start_offset().unwrap(), 10);
        assert!(postings.payload().unwrap().is_empty());
        assert_eq!(postings.next().unwrap(), NO_MORE_DOCS);

        assert!(iter.seek_exact(b"bar").unwrap());
        let mut docs = iter.postings_with_flags(PostingIteratorFlags::NONE).unwrap();
        assert_eq!(collect_docs(docs.as_mut()).unwrap(), vec![0, 2]);
    }

    /// Postings naming a doc beyond `max_doc` are reported as corrupt.
    #[test]
    fn test_postings_out_of_range_doc() {
        use core::codec::memory::{MemoryFields, MemoryTermsData};
        use core::doc::IndexOptions;
        use std::collections::BTreeMap;

        let mut terms = BTreeMap::new();
        terms.insert(
            b"t".to_vec(),
            vec![Posting {
                doc: 7,
                freq: 1,
                positions: vec![Position::new(0)],
            }],
        );
        let data = MemoryTermsData::new(IndexOptions::DocsAndFreqsAndPositions, false, terms);
        let mut fields = BTreeMap::new();
        fields.insert("f".to_string(), Arc::new(data.unwrap()));
        let doc_map = Arc::new(DocMap::from_new_to_old(2, vec![1, 0]).unwrap());
        let sorting = SortingFields::new(Box::new(MemoryFields::new(fields)), doc_map);

        let mut iter = sorting.terms("f").unwrap().unwrap().iterator().unwrap();
        iter.next().unwrap();
        let err = iter
            .postings_with_flags(PostingIteratorFlags::POSITIONS)
            .err()
            .unwrap();
        match err.kind() {
            ::error::ErrorKind::CorruptIndex(_) => {}
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_points_are_sorted_per_leaf() {
        let reader = sorted_sample();
        let points = reader.point_values().unwrap();
        assert_eq!(points.size("loc").unwrap(), 6);
        assert_eq!(points.min_packed_value("loc").unwrap(), int_point(10));

        let mut visitor = RecordingVisitor::default();
        points.intersect("loc", &mut visitor).unwrap();
        assert_eq!(
            visitor.leaves,
            vec![
                vec![(1, Some(int_point(10))), (3, Some(int_point(10)))],
                vec![(0, Some(int_point(20))), (2, Some(int_point(20)))],
                vec![(2, Some(int_point(40)))],
            ]
        );

        let mut visitor = RecordingVisitor {
            relation: Some(Relation::CellInsideQuery),
            ..Default::default()
        };
        points.intersect("loc", &mut visitor).unwrap();
        assert_eq!(visitor.leaves[0], vec![(1, None), (3, None)]);
    }

    #[test]
    fn test_vectors_get_new_ordinals() {
        let reader = sorted_sample();
        let vectors = reader.get_vector_values("vec").unwrap().unwrap();
        assert_eq!(vectors.size(), 3);
        assert_eq!(vectors.dimension(), 2);

        let mut iter = VectorValuesIterator::new(vectors.as_ref());
        let mut seen = vec![];
        while iter.next().unwrap() != NO_MORE_DOCS {
            seen.push((iter.doc_id(), iter.index(), iter.vector_value().unwrap()[0]));
        }
        // old docs 2, 4, 0 hold vectors 2.0, 4.0, 0.0
        assert_eq!(
            seen,
            vec![
                (1, VectorOrd(0), 2.0),
                (2, VectorOrd(1), 4.0),
                (3, VectorOrd(2), 0.0)
            ]
        );
        assert!(vectors.vector_value(VectorOrd(3)).is_err());
    }

    #[test]
    fn test_graph_is_reanchored() {
        let reader = sorted_sample();
        let graph = reader.get_hnsw_graph("vec").unwrap().unwrap();
        assert_eq!(graph.size(), 3);
        assert_eq!(graph.num_levels(), 2);
        assert_eq!(
            graph.nodes_on_level(0).unwrap(),
            vec![VectorOrd(0), VectorOrd(1), VectorOrd(2)]
        );
        // old ords 0, 1, 3 are new ords 2, 0, 1; old ord 2 was deleted
        assert_eq!(
            graph.neighbors(0, VectorOrd(2)).unwrap(),
            &[VectorOrd(0), VectorOrd(1)]
        );
        assert_eq!(
            graph.neighbors(0, VectorOrd(1)).unwrap(),
            &[VectorOrd(2), VectorOrd(0)]
        );
        assert_eq!(graph.nodes_on_level(1).unwrap(), vec![VectorOrd(1)]);
        assert!(graph.neighbors(1, VectorOrd(1)).unwrap().is_empty());
        // the entry node was deleted
        assert_eq!(graph.entry_node(), Some(VectorOrd(1)));
    }

    #[test]
    fn test_wrap_rejects_bad_sort_before_reading() {
        let segment = Arc::new(sample_segment());
        let progress = OneMergeProgress::new();
        let sort = Sort::new(vec![
            SortField::new("rank", SortFieldType::Long, false),
            SortField::new("title", SortFieldType::Long, false),
        ]);
        let err = SortingLeafReader::wrap(segment, &sort, &progress).err().unwrap();
        match err.kind() {
            ::error::ErrorKind::SortFieldTypeMismatch(ref field, _) => assert_eq!(field, "title"),
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn test_empty_sort_compacts() {
        let segment = Arc::new(sample_segment());
        let progress = OneMergeProgress::new();
        let reader = SortingLeafReader::wrap(segment, &Sort::default(), &progress).unwrap();
        assert!(reader.index_sort().is_none());
        let mut rank = reader.get_numeric_doc_values("rank").unwrap().unwrap();
        let mut values = vec![];
        while rank.next().unwrap() != NO_MORE_DOCS {
            values.push(rank.long_value().unwrap());
        }
        assert_eq!(values, vec![18, -1, 7, 12]);
    }

    #[test]
    fn test_no_live_docs() {
        let mut builder = SegmentBuilder::new("_z").with_points_per_leaf(1);
        let mut graph = OnHeapHnswGraph::new();
        for i in 0..2 {
            let doc = builder.add_document();
            builder.add_numeric(doc, "rank", 2 - i64::from(doc)).unwrap();
            builder.add_int_point(doc, "loc", &[doc]).unwrap();
            builder.add_vector(doc, "vec", vec![1.0, doc as f32]).unwrap();
            graph.add_node(0, VectorOrd(i));
        }
        graph.set_neighbors(0, VectorOrd(0), vec![VectorOrd(1)]).unwrap();
        graph.set_neighbors(0, VectorOrd(1), vec![VectorOrd(0)]).unwrap();
        graph.set_entry_node(Some(VectorOrd(0)));
        builder.set_hnsw_graph("vec", graph);
        builder.delete_document(0).unwrap();
        builder.delete_document(1).unwrap();
        let segment = Arc::new(builder.finish().unwrap());

        let progress = OneMergeProgress::new();
        let reader = SortingLeafReader::wrap(segment, &rank_sort(), &progress).unwrap();
        assert!(reader.doc_map().is_empty());
        assert_eq!(reader.max_doc(), 0);
        assert_eq!(reader.num_docs(), 0);

        let mut rank = reader.get_numeric_doc_values("rank").unwrap().unwrap();
        assert_eq!(rank.next().unwrap(), NO_MORE_DOCS);
        let mut visitor = DocumentStoredFieldVisitor::new(&[]);
        assert!(reader.document(0, &mut visitor).is_err());

        let mut visitor = RecordingVisitor::default();
        reader
            .point_values()
            .unwrap()
            .intersect("loc", &mut visitor)
            .unwrap();
        assert!(visitor.leaves.iter().all(|leaf| leaf.is_empty()));

        let vectors = reader.get_vector_values("vec").unwrap().unwrap();
        assert_eq!(vectors.size(), 0);
        let graph = reader.get_hnsw_graph("vec").unwrap().unwrap();
        assert_eq!(graph.size(), 0);
        assert_eq!(graph.num_levels(), 0);
        assert_eq!(graph.entry_node(), None);
    }

    #[derive(Default)]
    struct RandomDoc {
        number: Option<i64>,
        bytes: Option<Vec<u8>>,
        term: Option<Vec<u8>>,
        numbers: Vec<i64>,
        terms: BTreeSet<Vec<u8>>,
    }

    fn random_term<R: Rng>(rng: &mut R) -> Vec<u8> {
        let len = rng.gen_range(1, 4);
        (0..len).map(|_| rng.gen_range(b'a', b'e')).collect()
    }

    fn random_segment<R: Rng>(rng: &mut R, max_doc: usize) -> (MemorySegment, Vec<RandomDoc>) {
        let mut builder = SegmentBuilder::new("_r");
        let mut docs = Vec::with_capacity(max_doc);
        for _ in 0..max_doc {
            let doc = builder.add_document();
            let mut expected = RandomDoc::default();
            if rng.gen_bool(0.8) {
                builder.add_numeric(doc, "rank", rng.gen_range(-50, 50)).unwrap();
            }
            if rng.gen_bool(0.7) {
                let value = rng.gen_range(i64::min_value(), i64::max_value());
                builder.add_numeric(doc, "n", value).unwrap();
                expected.number = Some(value);
            }
            if rng.gen_bool(0.7) {
                let value = random_term(rng);
                builder.add_binary(doc, "b", &value).unwrap();
                expected.bytes = Some(value);
            }
            if rng.gen_bool(0.7) {
                let value = random_term(rng);
                builder.add_sorted(doc, "s", &value).unwrap();
                expected.term = Some(value);
            }
            for _ in 0..rng.gen_range(0, 4) {
                let value = rng.gen_range(-5, 5);
                builder.add_sorted_numeric(doc, "sn", value).unwrap();
                expected.numbers.push(value);
            }
            expected.numbers.sort();
            for _ in 0..rng.gen_range(0, 4) {
                expected.terms.insert(random_term(rng));
            }
            for value in &expected.terms {
                builder.add_sorted_set(doc, "ss", value).unwrap();
            }
            if rng.gen_bool(0.25) {
                builder.delete_document(doc).unwrap();
            }
            docs.push(expected);
        }
        (builder.finish().unwrap(), docs)
    }

    #[test]
    fn test_random_doc_values_follow_their_docs() {
        let mut rng = StdRng::seed_from_u64(0xd0c5);
        for _ in 0..20 {
            let max_doc = rng.gen_range(1, 120);
            let (segment, docs) = random_segment(&mut rng, max_doc);
            let progress = OneMergeProgress::new();
            let reader =
                SortingLeafReader::wrap(Arc::new(segment), &rank_sort(), &progress).unwrap();
            let doc_map = Arc::clone(reader.doc_map());
            let old = |new_doc: DocId| &docs[doc_map.new_to_old(new_doc) as usize];

            let mut numbers = vec![];
            if let Some(mut n) = reader.get_numeric_doc_values("n").unwrap() {
                while n.next().unwrap() != NO_MORE_DOCS {
                    numbers.push((n.doc_id(), n.long_value().unwrap()));
                }
            }
            let mut bytes = vec![];
            if let Some(mut b) = reader.get_binary_doc_values("b").unwrap() {
                while b.next().unwrap() != NO_MORE_DOCS {
                    bytes.push((b.doc_id(), b.binary_value().unwrap().to_vec()));
                }
            }
            let mut terms = vec![];
            if let Some(mut s) = reader.get_sorted_doc_values("s").unwrap() {
                while s.next().unwrap() != NO_MORE_DOCS {
                    let ord = s.ord_value().unwrap();
                    terms.push((s.doc_id(), s.lookup_ord(ord).unwrap().to_vec()));
                }
            }
            let mut multi_numbers = vec![];
            if let Some(mut sn) = reader.get_sorted_numeric_doc_values("sn").unwrap() {
                while sn.next().unwrap() != NO_MORE_DOCS {
                    let mut values = vec![];
                    for _ in 0..sn.doc_value_count() {
                        values.push(sn.next_value().unwrap());
                    }
                    multi_numbers.push((sn.doc_id(), values));
                }
            }
            let mut multi_terms = vec![];
            if let Some(mut ss) = reader.get_sorted_set_doc_values("ss").unwrap() {
                while ss.next().unwrap() != NO_MORE_DOCS {
                    let mut values = BTreeSet::new();
                    loop {
                        let ord = ss.next_ord().unwrap();
                        if ord == NO_MORE_ORDS {
                            break;
                        }
                        values.insert(ss.lookup_ord(ord).unwrap().to_vec());
                    }
                    multi_terms.push((ss.doc_id(), values));
                }
            }

            let live = 0..reader.max_doc();
            let expected_numbers: Vec<_> = live
                .clone()
                .filter_map(|doc| old(doc).number.map(|v| (doc, v)))
                .collect();
            let expected_bytes: Vec<_> = live
                .clone()
                .filter_map(|doc| old(doc).bytes.clone().map(|v| (doc, v)))
                .collect();
            let expected_terms: Vec<_> = live
                .clone()
                .filter_map(|doc| old(doc).term.clone().map(|v| (doc, v)))
                .collect();
            let expected_multi_numbers: Vec<_> = live
                .clone()
                .filter(|&doc| !old(doc).numbers.is_empty())
                .map(|doc| (doc, old(doc).numbers.clone()))
                .collect();
            let expected_multi_terms: Vec<_> = live
                .filter(|&doc| !old(doc).terms.is_empty())
                .map(|doc| (doc, old(doc).terms.clone()))
                .collect();
            assert_eq!(numbers, expected_numbers);
            assert_eq!(bytes, expected_bytes);
            assert_eq!(terms, expected_terms);
            assert_eq!(multi_numbers, expected_multi_numbers);
            assert_eq!(multi_terms, expected_multi_terms);
        }
    }
}
