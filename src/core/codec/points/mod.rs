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

use core::util::DocId;
use error::Result;

/// Access to indexed numeric values.
///
/// Points represent numeric values and are indexed differently than ordinary
/// text. Instead of an inverted index, points are indexed with data structures
/// such as KD-trees, whose leaves each hold a bounded run of points. Every
/// value is packed as `num_dimensions` dimensions of `bytes_per_dimension`
/// bytes, comparable as unsigned bytes.
pub trait PointValues: Send + Sync {
    /// Finds all documents and points matching the provided visitor.
    /// This method does not enforce live documents, so it's up to the caller
    /// to test whether each document is deleted, if necessary.
    ///
    /// The visitor hears `grow` once before the points of every visited leaf.
    fn intersect(&self, field_name: &str, visitor: &mut dyn IntersectVisitor) -> Result<()>;

    /// Returns minimum value for each dimension, packed, or empty if `size` is 0
    fn min_packed_value(&self, field_name: &str) -> Result<Vec<u8>>;

    /// Returns maximum value for each dimension, packed, or empty if `size` is 0
    fn max_packed_value(&self, field_name: &str) -> Result<Vec<u8>>;

    /// Returns how many dimensions were indexed
    fn num_dimensions(&self, field_name: &str) -> Result<usize>;

    /// Returns the number of bytes per dimension
    fn bytes_per_dimension(&self, field_name: &str) -> Result<usize>;

    /// Returns the total number of indexed points across all documents in this field.
    fn size(&self, field_name: &str) -> Result<i64>;

    /// Returns the total number of documents that have indexed at least one point for this
    /// field.
    fn doc_count(&self, field_name: &str) -> Result<i32>;
}

/// Used by `PointValues::intersect` to check how each recursive cell corresponds to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// Return this if the cell is fully contained by the query
    CellInsideQuery,
    /// Return this if the cell and query do not overlap
    CellOutsideQuery,
    /// Return this if the cell partially overlaps the query
    CellCrossesQuery,
}

/// We recurse the BKD tree, using a provided instance of this to guide the recursion.
pub trait IntersectVisitor {
    /// Called for all documents in a leaf cell that's fully contained by the query.  The
    /// consumer should blindly accept the docID.
    fn visit(&mut self, doc_id: DocId) -> Result<()>;

    /// Called for all documents in a leaf cell that crosses the query.  The consumer
    /// should scrutinize the packedValue to decide whether to accept it.
    fn visit_by_packed_value(&mut self, doc_id: DocId, packed_value: &[u8]) -> Result<()>;

    /// Called for non-leaf cells to test how the cell relates to the query, to
    /// determine how to further recurse down the tree.
    fn compare(&self, min_packed_value: &[u8], max_packed_value: &[u8]) -> Relation;

    /// Notifies the caller that this many documents are about to be visited
    fn grow(&mut self, _count: usize) -> Result<()> {
        Ok(())
    }
}
