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

//! Per-field vector values and their HNSW proximity graph.
//!
//! Vectors of a field are addressed by `VectorOrd`, the rank of a document
//! among the documents that carry the field. Ordinals and doc ids live in
//! different coordinate spaces and are never interchangeable.

use core::search::{DocIterator, NO_MORE_DOCS};
use core::util::DocId;
use error::Result;

use std::fmt;

/// Field-scoped ordinal of a vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VectorOrd(pub i32);

impl VectorOrd {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VectorOrd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ord#{}", self.0)
    }
}

/// Random access to the vectors of one field, ordered by ordinal. Ordinal
/// order is doc id order.
pub trait VectorValues: Send + Sync {
    /// Dimension of every vector of the field.
    fn dimension(&self) -> usize;

    /// Number of documents carrying a vector.
    fn size(&self) -> usize;

    fn vector_value(&self, ord: VectorOrd) -> Result<&[f32]>;

    fn ord_to_doc(&self, ord: VectorOrd) -> Result<DocId>;
}

/// Walks `VectorValues` in doc id order.
pub struct VectorValuesIterator<'a> {
    values: &'a dyn VectorValues,
    ord: i32,
    doc: DocId,
}

impl<'a> VectorValuesIterator<'a> {
    pub fn new(values: &'a dyn VectorValues) -> Self {
        VectorValuesIterator {
            values,
            ord: -1,
            doc: -1,
        }
    }

    /// Ordinal of the current document.
    pub fn index(&self) -> VectorOrd {
        VectorOrd(self.ord)
    }

    pub fn vector_value(&self) -> Result<&[f32]> {
        self.values.vector_value(self.index())
    }
}

impl<'a> DocIterator for VectorValuesIterator<'a> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> Result<DocId> {
        self.ord += 1;
        self.doc = if (self.ord as usize) < self.values.size() {
            self.values.ord_to_doc(VectorOrd(self.ord))?
        } else {
            NO_MORE_DOCS
        };
        Ok(self.doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.slow_advance(target)
    }

    fn cost(&self) -> usize {
        self.values.size()
    }
}

/// Hierarchical navigable small world graph over the vectors of one field.
///
/// Level 0 holds every node; each higher level holds a subset of the level
/// below. Nodes and neighbors are vector ordinals.
pub trait HnswGraph: Send + Sync {
    /// Number of nodes on level 0.
    fn size(&self) -> usize;

    fn num_levels(&self) -> usize;

    /// Node the search starts from, on the top level.
    fn entry_node(&self) -> Option<VectorOrd>;

    /// Nodes of `level`, ascending.
    fn nodes_on_level(&self, level: usize) -> Result<Vec<VectorOrd>>;

    /// Neighbors of `node` on `level`, in the graph's own order.
    fn neighbors(&self, level: usize, node: VectorOrd) -> Result<&[VectorOrd]>;
}
