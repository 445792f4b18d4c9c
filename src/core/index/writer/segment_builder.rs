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

use core::codec::field_infos::{FieldInfo, FieldInfos, FieldInfosBuilder};
use core::codec::memory::{
    BinaryColumn, DocValuesColumn, MemoryFields, MemoryPointValues, MemoryTermsData,
    MemoryVectorValues, NumericColumn, OnHeapHnswGraph, PointsField, Posting, SortedColumn,
    SortedNumericColumn, SortedSetColumn, DEFAULT_MAX_POINTS_IN_LEAF_NODE,
};
use core::codec::vectors::{HnswGraph, VectorValues};
use core::doc::{
    DocValuesType, Document, DoublePoint, FloatPoint, IndexOptions, IntPoint, LongPoint,
    StoredField, StoredValue,
};
use core::index::reader::MemorySegment;
use core::search::sort_field::Sort;
use core::util::{DocId, FixedBitSet};

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type TermsBuffer = BTreeMap<Vec<u8>, Vec<Posting>>;

/// Buffers the content of a new segment, doc by doc, and turns it into an
/// immutable `MemorySegment`.
///
/// Documents get consecutive ids from `add_document`. Per field values must
/// be added in non-decreasing doc order, which holds naturally when each
/// document is completed before the next one is started.
pub struct SegmentBuilder {
    name: String,
    max_doc: DocId,
    field_infos: FieldInfosBuilder,
    deleted: Vec<DocId>,
    stored: Vec<Document>,
    postings: BTreeMap<String, TermsBuffer>,
    term_vectors: Vec<BTreeMap<String, TermsBuffer>>,
    numeric: HashMap<String, Vec<(DocId, i64)>>,
    binary: HashMap<String, Vec<(DocId, Vec<u8>)>>,
    sorted: HashMap<String, Vec<(DocId, Vec<u8>)>>,
    sorted_numeric: HashMap<String, Vec<(DocId, Vec<i64>)>>,
    sorted_set: HashMap<String, Vec<(DocId, Vec<Vec<u8>>)>>,
    points: HashMap<String, Vec<(DocId, Vec<u8>)>>,
    vectors: HashMap<String, Vec<(DocId, Vec<f32>)>>,
    graphs: HashMap<String, OnHeapHnswGraph>,
    points_per_leaf: usize,
    index_sort: Option<Sort>,
}

impl SegmentBuilder {
    pub fn new(name: &str) -> SegmentBuilder {
        SegmentBuilder {
            name: name.to_string(),
            max_doc: 0,
            field_infos: FieldInfosBuilder::new(),
            deleted: vec![],
            stored: vec![],
            postings: BTreeMap::new(),
            term_vectors: vec![],
            numeric: HashMap::new(),
            binary: HashMap::new(),
            sorted: HashMap::new(),
            sorted_numeric: HashMap::new(),
            sorted_set: HashMap::new(),
            points: HashMap::new(),
            vectors: HashMap::new(),
            graphs: HashMap::new(),
            points_per_leaf: DEFAULT_MAX_POINTS_IN_LEAF_NODE,
            index_sort: None,
        }
    }

    pub fn with_points_per_leaf(mut self, points_per_leaf: usize) -> Self {
        self.points_per_leaf = points_per_leaf;
        self
    }

    /// Records the sort the documents of the segment follow.
    pub fn set_index_sort(&mut self, sort: Option<Sort>) {
        self.index_sort = sort;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_doc(&self) -> DocId {
        self.max_doc
    }

    /// Starts a new document and returns its id.
    pub fn add_document(&mut self) -> DocId {
        let doc = self.max_doc;
        self.max_doc += 1;
        self.stored.push(Document::default());
        self.term_vectors.push(BTreeMap::new());
        doc
    }

    /// Declares a field up front, so it survives even when no document
    /// carries it.
    pub fn add_field_info(&mut self, field_info: &FieldInfo) -> Result<()> {
        self.field_infos.add(field_info)
    }

    pub fn add_field_infos(&mut self, field_infos: &FieldInfos) -> Result<()> {
        self.field_infos.add_infos(field_infos)
    }

    fn check_doc(&self, doc: DocId) -> Result<()> {
        if doc < 0 || doc >= self.max_doc {
            bail!(IllegalArgument(format!(
                "doc {} was not added, max_doc is {}",
                doc, self.max_doc
            )));
        }
        Ok(())
    }

    fn set_doc_values_type(&mut self, doc: DocId, field: &str, dv: DocValuesType) -> Result<()> {
        self.check_doc(doc)?;
        self.field_infos.get_or_add(field).set_doc_values_type(dv)
    }

    pub fn delete_document(&mut self, doc: DocId) -> Result<()> {
        self.check_doc(doc)?;
        self.deleted.push(doc);
        Ok(())
    }

    pub fn add_stored_field(&mut self, doc: DocId, field: &str, value: StoredValue) -> Result<()> {
        self.check_doc(doc)?;
        self.field_infos.get_or_add(field);
        self.stored[doc as usize].add(StoredField::new(field, value));
        Ok(())
    }

    pub fn add_numeric(&mut self, doc: DocId, field: &str, value: i64) -> Result<()> {
        self.set_doc_values_type(doc, field, DocValuesType::Numeric)?;
        let entries = self.numeric.entry(field.to_string()).or_insert_with(Vec::new);
        push_single(entries, field, doc, value)
    }

    pub fn add_binary(&mut self, doc: DocId, field: &str, value: &[u8]) -> Result<()> {
        self.set_doc_values_type(doc, field, DocValuesType::Binary)?;
        let entries = self.binary.entry(field.to_string()).or_insert_with(Vec::new);
        push_single(entries, field, doc, value.to_vec())
    }

    pub fn add_sorted(&mut self, doc: DocId, field: &str, value: &[u8]) -> Result<()> {
        self.set_doc_values_type(doc, field, DocValuesType::Sorted)?;
        let entries = self.sorted.entry(field.to_string()).or_insert_with(Vec::new);
        push_single(entries, field, doc, value.to_vec())
    }

    pub fn add_sorted_numeric(&mut self, doc: DocId, field: &str, value: i64) -> Result<()> {
        self.set_doc_values_type(doc, field, DocValuesType::SortedNumeric)?;
        let entries = self
            .sorted_numeric
            .entry(field.to_string())
            .or_insert_with(Vec::new);
        push_multi(entries, doc, value)
    }

    pub fn add_sorted_set(&mut self, doc: DocId, field: &str, value: &[u8]) -> Result<()> {
        self.set_doc_values_type(doc, field, DocValuesType::SortedSet)?;
        let entries = self.sorted_set.entry(field.to_string()).or_insert_with(Vec::new);
        push_multi(entries, doc, value.to_vec())
    }

    /// Adds one document of the postings list of `term`.
    pub fn add_posting(
        &mut self,
        field: &str,
        index_options: IndexOptions,
        term: &[u8],
        posting: Posting,
    ) -> Result<()> {
        self.check_doc(posting.doc)?;
        let posting = self.index_field(field, index_options, posting);
        self.postings
            .entry(field.to_string())
            .or_insert_with(BTreeMap::new)
            .entry(term.to_vec())
            .or_insert_with(Vec::new)
            .push(posting);
        Ok(())
    }

    /// Adds `term` to the term vector of `field` in document `doc`.
    pub fn add_term_vector(
        &mut self,
        doc: DocId,
        field: &str,
        index_options: IndexOptions,
        term: &[u8],
        mut posting: Posting,
    ) -> Result<()> {
        self.check_doc(doc)?;
        posting.doc = 0;
        let posting = self.index_field(field, index_options, posting);
        self.field_infos.get_or_add(field).set_store_term_vector();
        let terms = self.term_vectors[doc as usize]
            .entry(field.to_string())
            .or_insert_with(BTreeMap::new);
        if terms.contains_key(term) {
            bail!(IllegalArgument(format!(
                "term vector of doc {} already has term {:?} in field '{}'",
                doc, term, field
            )));
        }
        terms.insert(term.to_vec(), vec![posting]);
        Ok(())
    }

    /// Registers the field as indexed and strips what `index_options` doesn't keep.
    fn index_field(&mut self, field: &str, index_options: IndexOptions, mut posting: Posting) -> Posting {
        let info = self.field_infos.get_or_add(field);
        info.set_index_options(index_options);
        if !index_options.has_freqs() {
            posting.freq = 1;
        }
        if !index_options.has_positions() {
            posting.positions.clear();
        }
        for position in &mut posting.positions {
            if !index_options.has_offsets() {
                position.start_offset = -1;
                position.end_offset = -1;
            }
            if !position.payload.is_empty() {
                info.set_store_payloads();
            }
        }
        posting
    }

    pub fn add_point(
        &mut self,
        doc: DocId,
        field: &str,
        bytes_per_dim: usize,
        packed_value: &[u8],
    ) -> Result<()> {
        self.check_doc(doc)?;
        if bytes_per_dim == 0 || packed_value.is_empty() || packed_value.len() % bytes_per_dim != 0
        {
            bail!(IllegalArgument(format!(
                "point of {} bytes can't be split into dimensions of {} bytes",
                packed_value.len(),
                bytes_per_dim
            )));
        }
        let num_dims = packed_value.len() / bytes_per_dim;
        self.field_infos
            .get_or_add(field)
            .set_dimensions(num_dims as u32, bytes_per_dim as u32)?;
        self.points
            .entry(field.to_string())
            .or_insert_with(Vec::new)
            .push((doc, packed_value.to_vec()));
        Ok(())
    }

    pub fn add_int_point(&mut self, doc: DocId, field: &str, point: &[i32]) -> Result<()> {
        self.add_point(doc, field, IntPoint::BYTES, &IntPoint::pack(point))
    }

    pub fn add_long_point(&mut self, doc: DocId, field: &str, point: &[i64]) -> Result<()> {
        self.add_point(doc, field, LongPoint::BYTES, &LongPoint::pack(point))
    }

    pub fn add_float_point(&mut self, doc: DocId, field: &str, point: &[f32]) -> Result<()> {
        self.add_point(doc, field, FloatPoint::BYTES, &FloatPoint::pack(point))
    }

    pub fn add_double_point(&mut self, doc: DocId, field: &str, point: &[f64]) -> Result<()> {
        self.add_point(doc, field, DoublePoint::BYTES, &DoublePoint::pack(point))
    }

    pub fn add_vector(&mut self, doc: DocId, field: &str, vector: Vec<f32>) -> Result<()> {
        self.check_doc(doc)?;
        if vector.is_empty() {
            bail!(IllegalArgument(format!("empty vector for field '{}'", field)));
        }
        self.field_infos
            .get_or_add(field)
            .set_vector_dimension(vector.len() as u32)?;
        let entries = self.vectors.entry(field.to_string()).or_insert_with(Vec::new);
        push_single(entries, field, doc, vector)
    }

    /// Sets the proximity graph over the vectors of `field`, its nodes being
    /// the ordinals of the field's vectors.
    pub fn set_hnsw_graph(&mut self, field: &str, graph: OnHeapHnswGraph) {
        self.graphs.insert(field.to_string(), graph);
    }

    pub fn finish(self) -> Result<MemorySegment> {
        let field_infos = self.field_infos.finish()?;

        let mut postings = BTreeMap::new();
        for (field, terms) in self.postings {
            postings.insert(field.clone(), Arc::new(terms_data(&field_infos, &field, terms)?));
        }

        let mut term_vectors = Vec::with_capacity(self.term_vectors.len());
        for fields in self.term_vectors {
            if fields.is_empty() {
                term_vectors.push(None);
                continue;
            }
            let mut tv = BTreeMap::new();
            for (field, terms) in fields {
                tv.insert(field.clone(), Arc::new(terms_data(&field_infos, &field, terms)?));
            }
            term_vectors.push(Some(Arc::new(MemoryFields::new(tv))));
        }

        let mut doc_values = HashMap::new();
        for (field, entries) in self.numeric {
            let column = DocValuesColumn::Numeric(Arc::new(NumericColumn::new(entries)));
            doc_values.insert(field, column);
        }
        for (field, entries) in self.binary {
            let column = DocValuesColumn::Binary(Arc::new(BinaryColumn::new(entries)));
            doc_values.insert(field, column);
        }
        for (field, entries) in self.sorted {
            let column = DocValuesColumn::Sorted(Arc::new(SortedColumn::new(entries)));
            doc_values.insert(field, column);
        }
        for (field, entries) in self.sorted_numeric {
            let column =
                DocValuesColumn::SortedNumeric(Arc::new(SortedNumericColumn::new(entries)));
            doc_values.insert(field, column);
        }
        for (field, entries) in self.sorted_set {
            let column = DocValuesColumn::SortedSet(Arc::new(SortedSetColumn::new(entries)));
            doc_values.insert(field, column);
        }

        let points = if self.points.is_empty() {
            None
        } else {
            let mut fields = HashMap::new();
            for (field, entries) in self.points {
                let (num_dims, bytes_per_dim) = match field_infos.field_info_by_name(&field) {
                    Some(info) => (
                        info.point_dimension_count as usize,
                        info.point_num_bytes as usize,
                    ),
                    None => bail!(IllegalArgument(format!("unknown point field '{}'", field))),
                };
                fields.insert(field, PointsField::new(num_dims, bytes_per_dim, entries)?);
            }
            Some(Arc::new(MemoryPointValues::new(fields, self.points_per_leaf)))
        };

        let mut vectors = HashMap::new();
        for (field, entries) in self.vectors {
            let dimension = entries.first().map_or(0, |e| e.1.len());
            vectors.insert(field, Arc::new(MemoryVectorValues::new(dimension, entries)?));
        }

        let mut graphs = HashMap::new();
        for (field, graph) in self.graphs {
            let size = vectors.get(&field).map_or(0, |v| v.size());
            check_graph(&field, &graph, size)?;
            graphs.insert(field, Arc::new(graph));
        }

        let live_docs = if self.deleted.is_empty() {
            None
        } else {
            let mut bits = FixedBitSet::new(self.max_doc as usize);
            for doc in 0..self.max_doc as usize {
                bits.set(doc);
            }
            for doc in self.deleted {
                bits.clear(doc as usize);
            }
            Some(Arc::new(bits))
        };

        debug!(
            "built segment '{}' with {} docs and {} fields",
            self.name,
            self.max_doc,
            field_infos.len()
        );
        Ok(MemorySegment {
            name: self.name,
            max_doc: self.max_doc,
            live_docs,
            field_infos,
            postings: Arc::new(MemoryFields::new(postings)),
            term_vectors,
            stored: self.stored,
            doc_values,
            points,
            vectors,
            graphs,
            index_sort: self.index_sort,
        })
    }
}

fn push_single<T>(entries: &mut Vec<(DocId, T)>, field: &str, doc: DocId, value: T) -> Result<()> {
    if let Some(&(last, _)) = entries.last() {
        if last == doc {
            bail!(IllegalArgument(format!(
                "DocValuesField \"{}\" appears more than once in this document (only one value \
                 is allowed per field)",
                field
            )));
        }
        if last > doc {
            bail!(IllegalArgument(format!(
                "docs of field \"{}\" must be added in increasing order, got {} after {}",
                field, doc, last
            )));
        }
    }
    entries.push((doc, value));
    Ok(())
}

fn push_multi<T>(entries: &mut Vec<(DocId, Vec<T>)>, doc: DocId, value: T) -> Result<()> {
    if let Some(last) = entries.last_mut() {
        if last.0 == doc {
            last.1.push(value);
            return Ok(());
        }
        if last.0 > doc {
            bail!(IllegalArgument(format!(
                "docs must be added in increasing order, got {} after {}",
                doc, last.0
            )));
        }
    }
    entries.push((doc, vec![value]));
    Ok(())
}

fn terms_data(field_infos: &FieldInfos, field: &str, terms: TermsBuffer) -> Result<MemoryTermsData> {
    let (index_options, has_payloads) = match field_infos.field_info_by_name(field) {
        Some(info) => (info.index_options, info.has_store_payloads),
        None => bail!(IllegalArgument(format!("unknown indexed field '{}'", field))),
    };
    MemoryTermsData::new(index_options, has_payloads, terms)
}

fn check_graph(field: &str, graph: &OnHeapHnswGraph, size: usize) -> Result<()> {
    if graph.size() != size {
        bail!(IllegalArgument(format!(
            "graph of field '{}' has {} nodes but the field has {} vectors",
            field,
            graph.size(),
            size
        )));
    }
    for level in 0..graph.num_levels() {
        for node in graph.nodes_on_level(level)? {
            let out_of_range = node.index() >= size
                || graph
                    .neighbors(level, node)?
                    .iter()
                    .any(|n| n.0 < 0 || n.index() >= size);
            if out_of_range {
                bail!(IllegalArgument(format!(
                    "graph of field '{}' references an ordinal beyond {} on level {}",
                    field, size, level
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::codec::memory::Position;
    use core::codec::vectors::VectorOrd;
    use core::index::reader::LeafReader;
    use core::index::tests::{posting, RecordingVisitor};

    #[test]
    fn test_single_valued_doc_values() {
        let mut builder = SegmentBuilder::new("_s");
        let doc = builder.add_document();
        builder.add_numeric(doc, "n", 1).unwrap();
        assert!(builder.add_numeric(doc, "n", 2).is_err());
        assert!(builder.add_binary(doc, "n", b"x").is_err());
        assert!(builder.add_numeric(1, "n", 2).is_err());

        let next = builder.add_document();
        builder.add_numeric(next, "n", 2).unwrap();
        assert!(builder.add_numeric(doc, "n", 3).is_err());
    }

    #[test]
    fn test_multi_valued_doc_values() {
        let mut builder = SegmentBuilder::new("_m");
        let first = builder.add_document();
        let second = builder.add_document();
        builder.add_sorted_numeric(first, "n", 3).unwrap();
        builder.add_sorted_numeric(first, "n", 1).unwrap();
        builder.add_sorted_numeric(second, "n", 2).unwrap();
        assert!(builder.add_sorted_numeric(first, "n", 4).is_err());
        builder.add_sorted_set(second, "s", b"b").unwrap();
        builder.add_sorted_set(second, "s", b"a").unwrap();

        let segment = builder.finish().unwrap();
        let mut dv = segment.get_sorted_numeric_doc_values("n").unwrap().unwrap();
        assert_eq!(dv.next().unwrap(), 0);
        assert_eq!(dv.doc_value_count(), 2);
        assert_eq!(dv.next_value().unwrap(), 1);
        let mut dv = segment.get_sorted_set_doc_values("s").unwrap().unwrap();
        assert_eq!(dv.next().unwrap(), 1);
        assert_eq!(dv.value_count(), 2);
    }

    #[test]
    fn test_deletions_and_stored_fields() {
        let mut builder = SegmentBuilder::new("_d");
        for _ in 0..3 {
            builder.add_document();
        }
        builder
            .add_stored_field(2, "id", StoredValue::Long(7))
            .unwrap();
        assert!(builder.add_stored_field(3, "id", StoredValue::Long(8)).is_err());
        builder.delete_document(0).unwrap();
        assert!(builder.delete_document(5).is_err());

        let segment = builder.finish().unwrap();
        assert_eq!(segment.max_doc(), 3);
        assert_eq!(segment.num_docs(), 2);
        let live_docs = segment.live_docs().unwrap();
        assert!(!live_docs.get(0).unwrap());
        assert!(live_docs.get(1).unwrap());
    }

    #[test]
    fn test_index_options_strip_postings() {
        let mut builder = SegmentBuilder::new("_p");
        let doc = builder.add_document();
        let p = posting(doc, vec![Position::with_offsets(4, 0, 3)]);
        builder.add_posting("f", IndexOptions::Docs, b"t", p).unwrap();
        let mut tv = Position::with_offsets(0, 0, 3);
        tv.payload = b"p".to_vec();
        let options = IndexOptions::DocsAndFreqsAndPositions;
        builder
            .add_term_vector(doc, "g", options, b"t", posting(doc, vec![tv.clone()]))
            .unwrap();
        assert!(builder
            .add_term_vector(doc, "g", options, b"t", posting(doc, vec![tv]))
            .is_err());

        let segment = builder.finish().unwrap();
        let f = segment.field_info("f").unwrap();
        assert_eq!(f.index_options, IndexOptions::Docs);
        assert!(!f.has_store_payloads);
        let g = segment.field_info("g").unwrap();
        assert!(g.has_store_term_vector);
        assert!(g.has_store_payloads);
        assert!(segment.term_vector(doc).unwrap().is_some());
    }

    #[test]
    fn test_points_and_vectors_validation() {
        let mut builder = SegmentBuilder::new("_v");
        let doc = builder.add_document();
        assert!(builder.add_point(doc, "p", 4, &[0, 0, 0]).is_err());
        builder.add_point(doc, "p", 4, &[0; 8]).unwrap();
        assert!(builder.add_point(doc, "p", 8, &[0; 8]).is_err());
        assert!(builder.add_vector(doc, "v", vec![]).is_err());
        builder.add_vector(doc, "v", vec![1.0, 2.0]).unwrap();

        let mut graph = OnHeapHnswGraph::new();
        graph.add_node(0, VectorOrd(0));
        graph.add_node(0, VectorOrd(1));
        builder.set_hnsw_graph("v", graph);
        assert!(builder.finish().is_err());
    }

    #[test]
    fn test_typed_points() {
        let mut builder = SegmentBuilder::new("_p").with_points_per_leaf(4);
        let floats = [0.5f32, -3.25, 8.0];
        for (i, &f) in floats.iter().enumerate() {
            let doc = builder.add_document();
            builder.add_float_point(doc, "f", &[f]).unwrap();
            builder.add_long_point(doc, "l", &[-(i as i64), i as i64]).unwrap();
        }
        builder.add_int_point(0, "i", &[7]).unwrap();
        builder.add_double_point(2, "d", &[-1e-3]).unwrap();
        assert!(builder.add_double_point(1, "e", &[]).is_err());
        assert!(builder.add_int_point(1, "l", &[1, 2, 3, 4]).is_err());
        let segment = builder.finish().unwrap();

        let points = segment.point_values().unwrap();
        assert_eq!(points.bytes_per_dimension("f").unwrap(), FloatPoint::BYTES);
        assert_eq!(points.num_dimensions("l").unwrap(), 2);
        assert_eq!(points.bytes_per_dimension("d").unwrap(), DoublePoint::BYTES);
        assert_eq!(points.doc_count("i").unwrap(), 1);
        assert_eq!(
            points.min_packed_value("f").unwrap(),
            FloatPoint::pack(&[-3.25])
        );
        assert_eq!(points.max_packed_value("f").unwrap(), FloatPoint::pack(&[8.0]));
        assert_eq!(
            points.min_packed_value("l").unwrap(),
            LongPoint::pack(&[-2, 0])
        );

        let mut visitor = RecordingVisitor::default();
        points.intersect("f", &mut visitor).unwrap();
        let docs: Vec<DocId> = visitor.leaves[0].iter().map(|&(doc, _)| doc).collect();
        assert_eq!(docs, vec![1, 0, 2]);
    }
}
