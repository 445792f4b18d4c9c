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
    BinaryDocValues, DocValuesEnum, NumericDocValues, SortedDocValues, SortedNumericDocValues,
    SortedSetDocValues,
};
use core::codec::field_infos::FieldInfos;
use core::codec::memory::{
    DocValuesColumn, MemoryFields, MemoryPointValues, MemoryVectorValues, OnHeapHnswGraph,
};
use core::codec::points::PointValues;
use core::codec::vectors::{HnswGraph, VectorValues};
use core::codec::Fields;
use core::doc::{DocValuesType, Document, Status, StoredFieldVisitor};
use core::index::reader::{check_doc_values_type, LeafReader};
use core::search::sort_field::Sort;
use core::util::{BitsRef, DocId, FixedBitSet};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::HashMap;
use std::sync::Arc;

/// A segment whose data is resident on the heap, as produced by a
/// `SegmentBuilder`.
pub struct MemorySegment {
    pub(crate) name: String,
    pub(crate) max_doc: DocId,
    pub(crate) live_docs: Option<Arc<FixedBitSet>>,
    pub(crate) field_infos: FieldInfos,
    pub(crate) postings: Arc<MemoryFields>,
    pub(crate) term_vectors: Vec<Option<Arc<MemoryFields>>>,
    pub(crate) stored: Vec<Document>,
    pub(crate) doc_values: HashMap<String, DocValuesColumn>,
    pub(crate) points: Option<Arc<MemoryPointValues>>,
    pub(crate) vectors: HashMap<String, Arc<MemoryVectorValues>>,
    pub(crate) graphs: HashMap<String, Arc<OnHeapHnswGraph>>,
    pub(crate) index_sort: Option<Sort>,
}

impl MemorySegment {
    fn check_doc(&self, doc_id: DocId) -> Result<usize> {
        if doc_id < 0 || doc_id >= self.max_doc {
            bail!(IllegalArgument(format!(
                "doc {} out of bounds for segment '{}' with max_doc {}",
                doc_id, self.name, self.max_doc
            )));
        }
        Ok(doc_id as usize)
    }

    fn column(&self, field: &str, expected: DocValuesType) -> Result<Option<DocValuesEnum>> {
        if !check_doc_values_type(self.field_info(field), expected)? {
            return Ok(None);
        }
        Ok(self.doc_values.get(field).map(DocValuesColumn::iterator))
    }
}

macro_rules! column_of_shape {
    ($self:ident, $field:ident, $dv_type:ident) => {
        match $self.column($field, DocValuesType::$dv_type)? {
            Some(DocValuesEnum::$dv_type(dv)) => Ok(Some(dv)),
            Some(other) => bail!(IllegalState(format!(
                "field '{}' holds {:?} doc values",
                $field,
                other.doc_values_type()
            ))),
            None => Ok(None),
        }
    };
}

impl LeafReader for MemorySegment {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_doc(&self) -> DocId {
        self.max_doc
    }

    fn num_docs(&self) -> DocId {
        match self.live_docs {
            Some(ref bits) => bits.cardinality() as DocId,
            None => self.max_doc,
        }
    }

    fn live_docs(&self) -> Option<BitsRef> {
        self.live_docs
            .as_ref()
            .map(|bits| Arc::clone(bits) as BitsRef)
    }

    fn field_infos(&self) -> &FieldInfos {
        &self.field_infos
    }

    fn fields(&self) -> Result<Box<dyn Fields>> {
        Ok(Box::new(Arc::clone(&self.postings)))
    }

    fn term_vector(&self, doc_id: DocId) -> Result<Option<Box<dyn Fields>>> {
        let doc = self.check_doc(doc_id)?;
        Ok(self.term_vectors[doc]
            .as_ref()
            .map(|tv| Box::new(Arc::clone(tv)) as Box<dyn Fields>))
    }

    fn document(&self, doc_id: DocId, visitor: &mut dyn StoredFieldVisitor) -> Result<()> {
        let doc = self.check_doc(doc_id)?;
        for field in &self.stored[doc].fields {
            let info = match self.field_infos.field_info_by_name(&field.name) {
                Some(info) => info,
                None => bail!(IllegalState(format!(
                    "stored field '{}' has no field info",
                    field.name
                ))),
            };
            match visitor.needs_field(info) {
                Status::YES => visitor.visit_value(info, &field.value),
                Status::NO => {}
                Status::STOP => break,
            }
        }
        Ok(())
    }

    fn get_numeric_doc_values(&self, field: &str) -> Result<Option<Box<dyn NumericDocValues>>> {
        column_of_shape!(self, field, Numeric)
    }

    fn get_binary_doc_values(&self, field: &str) -> Result<Option<Box<dyn BinaryDocValues>>> {
        column_of_shape!(self, field, Binary)
    }

    fn get_sorted_doc_values(&self, field: &str) -> Result<Option<Box<dyn SortedDocValues>>> {
        column_of_shape!(self, field, Sorted)
    }

    fn get_sorted_numeric_doc_values(
        &self,
        field: &str,
    ) -> Result<Option<Box<dyn SortedNumericDocValues>>> {
        column_of_shape!(self, field, SortedNumeric)
    }

    fn get_sorted_set_doc_values(
        &self,
        field: &str,
    ) -> Result<Option<Box<dyn SortedSetDocValues>>> {
        column_of_shape!(self, field, SortedSet)
    }

    fn point_values(&self) -> Option<Arc<dyn PointValues>> {
        self.points
            .as_ref()
            .map(|p| Arc::clone(p) as Arc<dyn PointValues>)
    }

    fn get_vector_values(&self, field: &str) -> Result<Option<Arc<dyn VectorValues>>> {
        Ok(self
            .vectors
            .get(field)
            .map(|v| Arc::clone(v) as Arc<dyn VectorValues>))
    }

    fn get_hnsw_graph(&self, field: &str) -> Result<Option<Arc<dyn HnswGraph>>> {
        Ok(self
            .graphs
            .get(field)
            .map(|g| Arc::clone(g) as Arc<dyn HnswGraph>))
    }

    fn index_sort(&self) -> Option<&Sort> {
        self.index_sort.as_ref()
    }
}
