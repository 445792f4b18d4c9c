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
use core::codec::field_infos::{FieldInfo, FieldInfos};
use core::codec::points::PointValues;
use core::codec::vectors::{HnswGraph, VectorValues};
use core::codec::Fields;
use core::doc::{DocValuesType, StoredFieldVisitor};
use core::search::sort_field::Sort;
use core::util::{BitsRef, DocId};

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::sync::Arc;

/// `LeafReader` providing an interface for accessing an segment index.
///
/// They support retrieval of stored fields, doc values, terms, postings,
/// points and vectors, all addressed by doc id. Doc ids are dense in
/// `[0, max_doc)`; deleted docs keep their slot until the segment is
/// merged away.
///
/// Implementations are thread safe: every accessor hands out an
/// independent cursor.
pub trait LeafReader: Send + Sync {
    fn name(&self) -> &str;

    /// Returns one greater than the largest possible document number.
    fn max_doc(&self) -> DocId;

    /// Returns the number of live documents.
    fn num_docs(&self) -> DocId;

    fn has_deletions(&self) -> bool {
        self.num_docs() < self.max_doc()
    }

    /// Returns the `Bits` representing live (not deleted) docs. A set bit
    /// indicates the doc ID has not been deleted. `None` means there are no
    /// deletions.
    fn live_docs(&self) -> Option<BitsRef>;

    fn field_infos(&self) -> &FieldInfos;

    fn field_info(&self, field: &str) -> Option<&FieldInfo> {
        self.field_infos().field_info_by_name(field)
    }

    /// Postings of all indexed fields.
    fn fields(&self) -> Result<Box<dyn Fields>>;

    /// Term vectors of one document, `None` if it stored none.
    fn term_vector(&self, doc_id: DocId) -> Result<Option<Box<dyn Fields>>>;

    /// Expert: visits the fields of a stored document, for
    /// custom processing/loading of each field.
    fn document(&self, doc_id: DocId, visitor: &mut dyn StoredFieldVisitor) -> Result<()>;

    /// Returns `NumericDocValues` for this field, or `None` if no numeric doc
    /// values were indexed for this field.
    fn get_numeric_doc_values(&self, field: &str) -> Result<Option<Box<dyn NumericDocValues>>>;

    fn get_binary_doc_values(&self, field: &str) -> Result<Option<Box<dyn BinaryDocValues>>>;

    fn get_sorted_doc_values(&self, field: &str) -> Result<Option<Box<dyn SortedDocValues>>>;

    fn get_sorted_numeric_doc_values(
        &self,
        field: &str,
    ) -> Result<Option<Box<dyn SortedNumericDocValues>>>;

    fn get_sorted_set_doc_values(&self, field: &str)
        -> Result<Option<Box<dyn SortedSetDocValues>>>;

    /// Doc values of `field` in whatever shape they were indexed.
    fn get_doc_values(&self, field: &str) -> Result<Option<DocValuesEnum>> {
        let dv_type = match self.field_info(field) {
            Some(info) => info.doc_values_type,
            None => return Ok(None),
        };
        let doc_values = match dv_type {
            DocValuesType::Null => None,
            DocValuesType::Numeric => self
                .get_numeric_doc_values(field)?
                .map(DocValuesEnum::Numeric),
            DocValuesType::Binary => self.get_binary_doc_values(field)?.map(DocValuesEnum::Binary),
            DocValuesType::Sorted => self.get_sorted_doc_values(field)?.map(DocValuesEnum::Sorted),
            DocValuesType::SortedNumeric => self
                .get_sorted_numeric_doc_values(field)?
                .map(DocValuesEnum::SortedNumeric),
            DocValuesType::SortedSet => self
                .get_sorted_set_doc_values(field)?
                .map(DocValuesEnum::SortedSet),
        };
        Ok(doc_values)
    }

    fn point_values(&self) -> Option<Arc<dyn PointValues>>;

    fn get_vector_values(&self, field: &str) -> Result<Option<Arc<dyn VectorValues>>>;

    fn get_hnsw_graph(&self, field: &str) -> Result<Option<Arc<dyn HnswGraph>>>;

    /// Returns null if this leaf is unsorted, or the `Sort` that it was sorted by
    fn index_sort(&self) -> Option<&Sort>;
}

/// Returns whether `field` carries doc values of type `expected`. A field
/// with doc values of another type is an error.
pub fn check_doc_values_type(
    field_info: Option<&FieldInfo>,
    expected: DocValuesType,
) -> Result<bool> {
    match field_info {
        None => Ok(false),
        Some(info) if info.doc_values_type == expected => Ok(true),
        Some(info) if info.doc_values_type.null() => Ok(false),
        Some(info) => bail!(IllegalArgument(format!(
            "field \"{}\" was indexed with doc values type {:?}, not {:?}",
            info.name, info.doc_values_type, expected
        ))),
    }
}
