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

use core::codec::doc_values::NO_MORE_ORDS;
use core::codec::memory::{OnHeapHnswGraph, Position, Posting};
use core::codec::points::{IntersectVisitor, Relation};
use core::codec::vectors::VectorValuesIterator;
use core::codec::Fields;
use core::doc::{DocValuesType, DocumentStoredFieldVisitor, IndexOptions};
use core::index::merge::{is_merge_aborted, MergeOutcome, OneMergeProgress};
use core::index::reader::{LeafReader, MemorySegment, SortingLeafReader};
use core::index::writer::{IndexWriterConfig, SegmentBuilder};
use core::search::{DocIterator, PostingIteratorFlags, NO_MORE_DOCS};
use core::util::DocId;

use error::ErrorKind::{CorruptIndex, IllegalState, UnsupportedOperation};
use error::Result;

use crossbeam;

use std::sync::Arc;

/// Values of one doc values field, keyed by new doc id.
enum DocValuesEntry {
    Numeric(String, Vec<(DocId, i64)>),
    Binary(String, Vec<(DocId, Vec<u8>)>),
    Sorted(String, Vec<(DocId, Vec<u8>)>),
    SortedNumeric(String, Vec<(DocId, Vec<i64>)>),
    SortedSet(String, Vec<(DocId, Vec<Vec<u8>>)>),
}

/// Writes the live documents of a segment into a new one, ordered by the
/// index sort of an `IndexWriterConfig`.
///
/// Without an index sort the merge only compacts away deleted documents.
pub struct SegmentMerger {
    config: IndexWriterConfig,
}

impl SegmentMerger {
    pub fn new(config: IndexWriterConfig) -> SegmentMerger {
        SegmentMerger { config }
    }

    pub fn config(&self) -> &IndexWriterConfig {
        &self.config
    }

    /// Merges `reader` into a new segment. Nothing of the new segment
    /// survives an abort.
    pub fn merge<R: LeafReader + ?Sized>(
        &self,
        reader: Arc<R>,
        progress: &OneMergeProgress,
    ) -> Result<MergeOutcome<MemorySegment>> {
        let name = format!("{}_merged", reader.name());
        match self.do_merge(reader, &name, progress) {
            Ok(segment) => {
                info!(
                    "merged segment '{}' with {} docs",
                    segment.name(),
                    segment.max_doc()
                );
                Ok(MergeOutcome::Completed(segment))
            }
            Err(ref e) if is_merge_aborted(e) => {
                info!("merge into '{}' aborted", name);
                Ok(MergeOutcome::Aborted)
            }
            Err(e) => Err(e),
        }
    }

    /// Finishes a freshly indexed segment, sorting it when an index sort is
    /// configured.
    pub fn flush_sorted(builder: SegmentBuilder, config: &IndexWriterConfig) -> Result<MemorySegment> {
        let name = builder.name().to_string();
        let segment = builder.finish()?;
        if config.index_sort().is_none() && !segment.has_deletions() {
            return Ok(segment);
        }
        let merger = SegmentMerger::new(config.clone());
        merger.do_merge(Arc::new(segment), &name, &OneMergeProgress::new())
    }

    fn do_merge<R: LeafReader + ?Sized>(
        &self,
        reader: Arc<R>,
        name: &str,
        progress: &OneMergeProgress,
    ) -> Result<MemorySegment> {
        self.config.validate()?;
        let sort = self.config.index_sort().cloned().unwrap_or_default();
        let sorted = SortingLeafReader::wrap(reader, &sort, progress)?;
        progress.check_aborted()?;

        let mut builder =
            SegmentBuilder::new(name).with_points_per_leaf(self.config.points_per_leaf);
        builder.set_index_sort(sorted.index_sort().cloned());
        builder.add_field_infos(sorted.field_infos())?;
        for _ in 0..sorted.max_doc() {
            builder.add_document();
        }

        merge_stored_fields(&sorted, &mut builder)?;
        progress.check_aborted()?;
        merge_postings(&sorted, &mut builder, progress)?;
        progress.check_aborted()?;
        merge_term_vectors(&sorted, &mut builder)?;
        progress.check_aborted()?;
        for entry in self.merge_doc_values(&sorted, progress)? {
            add_doc_values(&mut builder, entry)?;
        }
        progress.check_aborted()?;
        merge_points(&sorted, &mut builder, progress)?;
        progress.check_aborted()?;
        merge_vectors(&sorted, &mut builder, progress)?;
        progress.check_aborted()?;

        builder.finish()
    }

    /// Remaps every doc values field, spreading the fields over
    /// `merge_threads` scoped threads.
    fn merge_doc_values<R: LeafReader + ?Sized>(
        &self,
        sorted: &SortingLeafReader<R>,
        progress: &OneMergeProgress,
    ) -> Result<Vec<DocValuesEntry>> {
        let fields: Vec<(String, DocValuesType)> = sorted
            .field_infos()
            .iter()
            .filter(|info| !info.doc_values_type.null())
            .map(|info| (info.name.clone(), info.doc_values_type))
            .collect();
        if fields.is_empty() {
            return Ok(vec![]);
        }

        let num_threads = self.config.merge_threads.max(1).min(fields.len());
        let mut chunks: Vec<Vec<(String, DocValuesType)>> = vec![vec![]; num_threads];
        for (i, field) in fields.into_iter().enumerate() {
            chunks[i % num_threads].push(field);
        }
        debug!(
            "remapping doc values of {} fields on {} threads",
            chunks.iter().map(Vec::len).sum::<usize>(),
            num_threads
        );

        let joined = crossbeam::scope(|s| {
            let handles: Vec<_> = chunks
                .into_iter()
                .map(|chunk| s.spawn(move |_| read_doc_values(sorted, &chunk, progress)))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join())
                .collect::<Vec<_>>()
        });
        let joined = match joined {
            Ok(joined) => joined,
            Err(_) => bail!(IllegalState("doc values merge thread panicked".into())),
        };

        let mut entries = Vec::new();
        for result in joined {
            match result {
                Ok(chunk) => entries.extend(chunk?),
                Err(_) => bail!(IllegalState("doc values merge thread panicked".into())),
            }
        }
        Ok(entries)
    }
}

fn read_doc_values<R: LeafReader + ?Sized>(
    sorted: &SortingLeafReader<R>,
    fields: &[(String, DocValuesType)],
    progress: &OneMergeProgress,
) -> Result<Vec<DocValuesEntry>> {
    let mut entries = Vec::with_capacity(fields.len());
    for (field, dv_type) in fields {
        progress.check_aborted()?;
        let entry = match *dv_type {
            DocValuesType::Numeric => {
                let mut values = vec![];
                if let Some(mut dv) = sorted.get_numeric_doc_values(field)? {
                    while dv.next()? != NO_MORE_DOCS {
                        values.push((dv.doc_id(), dv.long_value()?));
                    }
                }
                DocValuesEntry::Numeric(field.clone(), values)
            }
            DocValuesType::Binary => {
                let mut values = vec![];
                if let Some(mut dv) = sorted.get_binary_doc_values(field)? {
                    while dv.next()? != NO_MORE_DOCS {
                        values.push((dv.doc_id(), dv.binary_value()?.to_vec()));
                    }
                }
                DocValuesEntry::Binary(field.clone(), values)
            }
            DocValuesType::Sorted => {
                let mut values = vec![];
                if let Some(mut dv) = sorted.get_sorted_doc_values(field)? {
                    while dv.next()? != NO_MORE_DOCS {
                        let ord = dv.ord_value()?;
                        values.push((dv.doc_id(), dv.lookup_ord(ord)?.to_vec()));
                    }
                }
                DocValuesEntry::Sorted(field.clone(), values)
            }
            DocValuesType::SortedNumeric => {
                let mut values = vec![];
                if let Some(mut dv) = sorted.get_sorted_numeric_doc_values(field)? {
                    while dv.next()? != NO_MORE_DOCS {
                        let mut doc_values = Vec::with_capacity(dv.doc_value_count());
                        for _ in 0..dv.doc_value_count() {
                            doc_values.push(dv.next_value()?);
                        }
                        values.push((dv.doc_id(), doc_values));
                    }
                }
                DocValuesEntry::SortedNumeric(field.clone(), values)
            }
            DocValuesType::SortedSet => {
                let mut values = vec![];
                if let Some(mut dv) = sorted.get_sorted_set_doc_values(field)? {
                    while dv.next()? != NO_MORE_DOCS {
                        let mut terms = Vec::with_capacity(dv.doc_value_count());
                        loop {
                            let ord = dv.next_ord()?;
                            if ord == NO_MORE_ORDS {
                                break;
                            }
                            terms.push(dv.lookup_ord(ord)?.to_vec());
                        }
                        values.push((dv.doc_id(), terms));
                    }
                }
                DocValuesEntry::SortedSet(field.clone(), values)
            }
            DocValuesType::Null => continue,
        };
        entries.push(entry);
    }
    Ok(entries)
}

fn add_doc_values(builder: &mut SegmentBuilder, entry: DocValuesEntry) -> Result<()> {
    match entry {
        DocValuesEntry::Numeric(field, values) => {
            for (doc, value) in values {
                builder.add_numeric(doc, &field, value)?;
            }
        }
        DocValuesEntry::Binary(field, values) => {
            for (doc, value) in values {
                builder.add_binary(doc, &field, &value)?;
            }
        }
        DocValuesEntry::Sorted(field, values) => {
            for (doc, value) in values {
                builder.add_sorted(doc, &field, &value)?;
            }
        }
        DocValuesEntry::SortedNumeric(field, values) => {
            for (doc, doc_values) in values {
                for value in doc_values {
                    builder.add_sorted_numeric(doc, &field, value)?;
                }
            }
        }
        DocValuesEntry::SortedSet(field, values) => {
            for (doc, terms) in values {
                for term in terms {
                    builder.add_sorted_set(doc, &field, &term)?;
                }
            }
        }
    }
    Ok(())
}

fn merge_stored_fields<R: LeafReader + ?Sized>(
    sorted: &SortingLeafReader<R>,
    builder: &mut SegmentBuilder,
) -> Result<()> {
    for doc in 0..sorted.max_doc() {
        let mut visitor = DocumentStoredFieldVisitor::new(&[]);
        sorted.document(doc, &mut visitor)?;
        for field in visitor.document().fields {
            builder.add_stored_field(doc, &field.name, field.value)?;
        }
    }
    Ok(())
}

fn merge_postings<R: LeafReader + ?Sized>(
    sorted: &SortingLeafReader<R>,
    builder: &mut SegmentBuilder,
    progress: &OneMergeProgress,
) -> Result<()> {
    let fields = sorted.fields()?;
    for field in fields.fields() {
        progress.check_aborted()?;
        visit_postings(fields.as_ref(), &field, |options, term, posting| {
            builder.add_posting(&field, options, term, posting)
        })?;
    }
    Ok(())
}

fn merge_term_vectors<R: LeafReader + ?Sized>(
    sorted: &SortingLeafReader<R>,
    builder: &mut SegmentBuilder,
) -> Result<()> {
    for doc in 0..sorted.max_doc() {
        let vectors = match sorted.term_vector(doc)? {
            Some(vectors) => vectors,
            None => continue,
        };
        for field in vectors.fields() {
            visit_postings(vectors.as_ref(), &field, |options, term, posting| {
                builder.add_term_vector(doc, &field, options, term, posting)
            })?;
        }
    }
    Ok(())
}

/// Reads back every posting of `field`, checking each postings list is
/// strictly ascending.
fn visit_postings<F>(fields: &dyn Fields, field: &str, mut consumer: F) -> Result<()>
where
    F: FnMut(IndexOptions, &[u8], Posting) -> Result<()>,
{
    let terms = match fields.terms(field)? {
        Some(terms) => terms,
        None => return Ok(()),
    };
    let has_positions = terms.has_positions()?;
    let options = if terms.has_offsets()? {
        IndexOptions::DocsAndFreqsAndPositionsAndOffsets
    } else if has_positions {
        IndexOptions::DocsAndFreqsAndPositions
    } else if terms.has_freqs()? {
        IndexOptions::DocsAndFreqs
    } else {
        IndexOptions::Docs
    };

    let mut terms_iter = terms.iterator()?;
    while let Some(term) = terms_iter.next()? {
        let mut postings = terms_iter.postings_with_flags(PostingIteratorFlags::ALL)?;
        let mut last_doc = -1;
        loop {
            let doc = postings.next()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if doc <= last_doc {
                bail!(CorruptIndex(format!(
                    "postings of term {:?} in field '{}' go from doc {} to {}",
                    term, field, last_doc, doc
                )));
            }
            last_doc = doc;
            let freq = postings.freq()?;
            let mut positions = vec![];
            if has_positions {
                for _ in 0..freq {
                    let position = postings.next_position()?;
                    positions.push(Position {
                        position,
                        start_offset: postings.start_offset()?,
                        end_offset: postings.end_offset()?,
                        payload: postings.payload()?,
                    });
                }
            }
            consumer(
                options,
                &term,
                Posting {
                    doc,
                    freq,
                    positions,
                },
            )?;
        }
    }
    Ok(())
}

/// Collects every point of a field, leaf by leaf.
#[derive(Default)]
struct PointsCollector {
    points: Vec<(DocId, Vec<u8>)>,
}

impl IntersectVisitor for PointsCollector {
    fn visit(&mut self, doc_id: DocId) -> Result<()> {
        bail!(UnsupportedOperation(
            format!("point of doc {} visited without its value", doc_id).into()
        ))
    }

    fn visit_by_packed_value(&mut self, doc_id: DocId, packed_value: &[u8]) -> Result<()> {
        self.points.push((doc_id, packed_value.to_vec()));
        Ok(())
    }

    fn compare(&self, _min_packed_value: &[u8], _max_packed_value: &[u8]) -> Relation {
        Relation::CellCrossesQuery
    }

    fn grow(&mut self, count: usize) -> Result<()> {
        self.points.reserve(count);
        Ok(())
    }
}

fn merge_points<R: LeafReader + ?Sized>(
    sorted: &SortingLeafReader<R>,
    builder: &mut SegmentBuilder,
    progress: &OneMergeProgress,
) -> Result<()> {
    let point_values = match sorted.point_values() {
        Some(point_values) => point_values,
        None => return Ok(()),
    };
    for info in sorted.field_infos().iter() {
        if info.point_dimension_count == 0 {
            continue;
        }
        progress.check_aborted()?;
        let mut collector = PointsCollector::default();
        point_values.intersect(&info.name, &mut collector)?;
        for (doc, packed_value) in collector.points {
            builder.add_point(doc, &info.name, info.point_num_bytes as usize, &packed_value)?;
        }
    }
    Ok(())
}

fn merge_vectors<R: LeafReader + ?Sized>(
    sorted: &SortingLeafReader<R>,
    builder: &mut SegmentBuilder,
    progress: &OneMergeProgress,
) -> Result<()> {
    for info in sorted.field_infos().iter() {
        if !info.has_vectors() {
            continue;
        }
        progress.check_aborted()?;
        let values = match sorted.get_vector_values(&info.name)? {
            Some(values) => values,
            None => continue,
        };
        let mut iter = VectorValuesIterator::new(values.as_ref());
        while iter.next()? != NO_MORE_DOCS {
            builder.add_vector(iter.doc_id(), &info.name, iter.vector_value()?.to_vec())?;
        }
        if let Some(graph) = sorted.get_hnsw_graph(&info.name)? {
            debug!(
                "copying graph of '{}' with {} nodes over {} vectors",
                info.name,
                graph.size(),
                values.size()
            );
            builder.set_hnsw_graph(&info.name, OnHeapHnswGraph::copy_of(graph.as_ref())?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::vectors::VectorOrd;
    use core::doc::StoredValue;
    use core::index::tests::{
        numeric_segment, posting, rank_sort, sample_segment, RecordingVisitor,
    };
    use core::search::sort_field::{Sort, SortField, SortFieldType};

    fn sorted_config() -> IndexWriterConfig {
        IndexWriterConfig::new()
            .set_index_sort(rank_sort())
            .set_merge_threads(2)
            .set_points_per_leaf(2)
    }

    fn merged(config: IndexWriterConfig, segment: MemorySegment) -> MemorySegment {
        let merger = SegmentMerger::new(config);
        match merger
            .merge(Arc::new(segment), &OneMergeProgress::new())
            .unwrap()
        {
            MergeOutcome::Completed(segment) => segment,
            MergeOutcome::Aborted => panic!("merge was not aborted"),
        }
    }

    fn stored_ids(segment: &MemorySegment) -> Vec<i32> {
        (0..segment.max_doc())
            .map(|doc| {
                let mut visitor = DocumentStoredFieldVisitor::new(&[]);
                segment.document(doc, &mut visitor).unwrap();
                match visitor.document().get_field("id").map(|f| f.value.clone()) {
                    Some(StoredValue::Int(id)) => id,
                    other => panic!("unexpected id {:?}", other),
                }
            })
            .collect()
    }

    #[test]
    fn test_merge_sorted_segment() {
        let segment = merged(sorted_config(), sample_segment());
        assert_eq!(segment.name(), "_0_merged");
        assert_eq!(segment.max_doc(), 4);
        assert!(!segment.has_deletions());
        assert_eq!(segment.index_sort(), Some(&rank_sort()));
        assert_eq!(stored_ids(&segment), vec![1, 2, 4, 0]);

        let mut rank = segment.get_numeric_doc_values("rank").unwrap().unwrap();
        let mut ranks = vec![];
        while rank.next().unwrap() != NO_MORE_DOCS {
            ranks.push(rank.long_value().unwrap());
        }
        assert_eq!(ranks, vec![-1, 7, 12, 18]);

        let mut cat = segment.get_sorted_doc_values("cat").unwrap().unwrap();
        let mut cats = vec![];
        while cat.next().unwrap() != NO_MORE_DOCS {
            let ord = cat.ord_value().unwrap();
            cats.push((cat.doc_id(), cat.lookup_ord(ord).unwrap().to_vec()));
        }
        assert_eq!(
            cats,
            vec![(0, b"a".to_vec()), (1, b"c".to_vec()), (3, b"b".to_vec())]
        );

        let mut nums = segment
            .get_sorted_numeric_doc_values("nums")
            .unwrap()
            .unwrap();
        assert_eq!(nums.next().unwrap(), 0);
        assert_eq!(nums.next_value().unwrap(), 2);
        assert_eq!(nums.next().unwrap(), 2);
        assert_eq!(nums.doc_value_count(), 3);
    }

    #[test]
    fn test_merge_keeps_postings_ascending() {
        let segment = merged(sorted_config(), sample_segment());
        let fields = segment.fields().unwrap();
        let terms = fields.terms("body").unwrap().unwrap();
        let mut iter = terms.iterator().unwrap();
        let mut docs_by_term = vec![];
        while let Some(term) = iter.next().unwrap() {
            let mut postings = iter.postings_with_flags(PostingIteratorFlags::ALL).unwrap();
            let mut docs = vec![];
            while postings.next().unwrap() != NO_MORE_DOCS {
                docs.push(postings.doc_id());
                if postings.doc_id() == 3 {
                    assert_eq!(postings.freq().unwrap(), 2);
                    assert_eq!(postings.next_position().unwrap(), 0);
                    assert_eq!(postings.start_offset().unwrap(), 0);
                    assert_eq!(postings.payload().unwrap(), b"p0".to_vec());
                }
            }
            docs_by_term.push((term, docs));
        }
        assert_eq!(
            docs_by_term,
            vec![(b"bar".to_vec(), vec![0, 2]), (b"foo".to_vec(), vec![1, 2, 3])]
        );

        assert!(segment.term_vector(3).unwrap().is_some());
        assert!(segment.term_vector(2).unwrap().is_some());
        assert!(segment.term_vector(0).unwrap().is_none());
    }

    #[test]
    fn test_merge_points_and_vectors() {
        let segment = merged(sorted_config(), sample_segment());
        let mut visitor = RecordingVisitor::default();
        segment
            .point_values()
            .unwrap()
            .intersect("loc", &mut visitor)
            .unwrap();
        let mut docs: Vec<DocId> = visitor
            .leaves
            .iter()
            .flat_map(|leaf| leaf.iter().map(|(doc, _)| *doc))
            .collect();
        docs.sort();
        assert_eq!(docs, vec![0, 1, 2, 2, 3]);

        let vectors = segment.get_vector_values("vec").unwrap().unwrap();
        assert_eq!(vectors.size(), 3);
        let docs: Vec<DocId> = (0..3)
            .map(|ord| vectors.ord_to_doc(VectorOrd(ord)).unwrap())
            .collect();
        assert_eq!(docs, vec![1, 2, 3]);
        assert_eq!(vectors.vector_value(VectorOrd(2)).unwrap(), &[0.0, 1.0]);

        let graph = segment.get_hnsw_graph("vec").unwrap().unwrap();
        assert_eq!(graph.size(), 3);
        assert_eq!(graph.entry_node(), Some(VectorOrd(1)));
    }

    #[test]
    fn test_merge_without_sort_compacts() {
        let config = IndexWriterConfig::new().set_merge_threads(1);
        let segment = merged(config, sample_segment());
        assert_eq!(segment.max_doc(), 4);
        assert_eq!(segment.index_sort(), None);
        assert_eq!(stored_ids(&segment), vec![0, 1, 2, 4]);
    }

    #[test]
    fn test_aborted_merge() {
        let progress = OneMergeProgress::new();
        progress.abort();
        let merger = SegmentMerger::new(sorted_config());
        let outcome = merger
            .merge(Arc::new(sample_segment()), &progress)
            .unwrap();
        assert!(outcome.is_aborted());
        assert!(outcome.completed().is_none());
    }

    #[test]
    fn test_merge_with_bad_sort_fails() {
        let config = IndexWriterConfig::new()
            .set_index_sort(Sort::new(vec![SortField::new(
                "title",
                SortFieldType::Long,
                false,
            )]));
        let merger = SegmentMerger::new(config);
        assert!(merger
            .merge(Arc::new(sample_segment()), &OneMergeProgress::new())
            .is_err());
    }

    #[test]
    fn test_flush_sorted() {
        let mut builder = SegmentBuilder::new("_f");
        for rank in &[3i64, 1, 2] {
            let doc = builder.add_document();
            builder.add_numeric(doc, "rank", *rank).unwrap();
            builder
                .add_stored_field(doc, "id", StoredValue::Int(doc))
                .unwrap();
        }
        let config = IndexWriterConfig::new().set_index_sort(rank_sort());
        let segment = SegmentMerger::flush_sorted(builder, &config).unwrap();
        assert_eq!(segment.name(), "_f");
        assert_eq!(stored_ids(&segment), vec![1, 2, 0]);

        let unsorted = SegmentMerger::flush_sorted(
            {
                let mut builder = SegmentBuilder::new("_u");
                builder.add_document();
                builder
            },
            &IndexWriterConfig::new(),
        )
        .unwrap();
        assert_eq!(unsorted.max_doc(), 1);
        assert_eq!(unsorted.index_sort(), None);
    }

    #[test]
    fn test_merge_numeric_with_missing_values() {
        let segment = merged(
            IndexWriterConfig::new().set_index_sort(rank_sort()),
            numeric_segment(&[Some(5), None, Some(-3), Some(9)], &[3]),
        );
        assert_eq!(segment.max_doc(), 3);
        let mut rank = segment.get_numeric_doc_values("rank").unwrap().unwrap();
        assert_eq!(rank.next().unwrap(), 0);
        assert_eq!(rank.long_value().unwrap(), -3);
        assert_eq!(rank.next().unwrap(), 1);
        assert_eq!(rank.long_value().unwrap(), 5);
        assert_eq!(rank.next().unwrap(), NO_MORE_DOCS);
    }

    #[test]
    fn test_merge_again_after_values_were_merged_away() {
        let config = IndexWriterConfig::new().set_index_sort(rank_sort());
        let once = merged(config.clone(), numeric_segment(&[Some(5), None], &[0]));
        assert_eq!(once.max_doc(), 1);
        assert!(once.field_info("rank").is_some());
        assert!(once.get_numeric_doc_values("rank").unwrap().is_none());

        let twice = merged(config, once);
        assert_eq!(twice.max_doc(), 1);
        assert_eq!(twice.name(), "_n_merged_merged");
        assert!(twice.get_numeric_doc_values("rank").unwrap().is_none());
    }

    #[test]
    fn test_merge_without_live_docs() {
        let mut builder = SegmentBuilder::new("_x");
        let mut graph = OnHeapHnswGraph::new();
        for i in 0..2 {
            let doc = builder.add_document();
            builder
                .add_stored_field(doc, "id", StoredValue::Int(doc))
                .unwrap();
            builder.add_numeric(doc, "rank", i64::from(doc)).unwrap();
            builder.add_sorted_set(doc, "tags", b"t").unwrap();
            builder.add_int_point(doc, "loc", &[doc]).unwrap();
            builder.add_vector(doc, "vec", vec![doc as f32]).unwrap();
            let foo = posting(doc, vec![Position::new(0)]);
            builder
                .add_posting("body", IndexOptions::DocsAndFreqs, b"foo", foo)
                .unwrap();
            graph.add_node(0, VectorOrd(i));
        }
        builder.set_hnsw_graph("vec", graph);
        builder.delete_document(0).unwrap();
        builder.delete_document(1).unwrap();

        let segment = merged(sorted_config(), builder.finish().unwrap());
        assert_eq!(segment.max_doc(), 0);
        assert_eq!(segment.num_docs(), 0);
        assert!(!segment.has_deletions());
        assert_eq!(segment.index_sort(), Some(&rank_sort()));
        assert!(segment.field_info("rank").is_some());
        assert!(segment.get_numeric_doc_values("rank").unwrap().is_none());
        assert!(segment
            .get_vector_values("vec")
            .unwrap()
            .map_or(true, |values| values.size() == 0));
        assert!(segment
            .get_hnsw_graph("vec")
            .unwrap()
            .map_or(true, |graph| graph.size() == 0));

        let again = merged(sorted_config(), segment);
        assert_eq!(again.max_doc(), 0);
    }
}
