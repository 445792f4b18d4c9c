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

use core::codec::memory::OnHeapHnswGraph;
use core::codec::vectors::{HnswGraph, VectorOrd, VectorValues, VectorValuesIterator};
use core::codec::DocMap;
use core::search::{DocIterator, NO_MORE_DOCS};
use core::util::DocId;

use error::ErrorKind::{CorruptIndex, IllegalArgument};
use error::Result;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Bijection between the vector ordinals of the live docs and their new
/// ordinals. New ordinals follow new doc order.
#[derive(Debug)]
pub struct OrdinalMap {
    // -1 for vectors of deleted docs
    old_to_new: Vec<i32>,
    new_to_old: Vec<VectorOrd>,
    new_docs: Vec<DocId>,
}

impl OrdinalMap {
    pub fn build(values: &dyn VectorValues, doc_map: &DocMap) -> Result<OrdinalMap> {
        let mut live = Vec::with_capacity(values.size());
        let mut iter = VectorValuesIterator::new(values);
        loop {
            let doc = iter.next()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if doc < 0 || doc >= doc_map.max_doc() {
                bail!(CorruptIndex(format!(
                    "vectors returned doc {} beyond max_doc {}",
                    doc,
                    doc_map.max_doc()
                )));
            }
            if let Some(new_doc) = doc_map.try_old_to_new(doc) {
                live.push((new_doc, iter.index()));
            }
        }
        live.sort_by_key(|e| e.0);

        let mut old_to_new = vec![-1; values.size()];
        let mut new_to_old = Vec::with_capacity(live.len());
        let mut new_docs = Vec::with_capacity(live.len());
        for (new_ord, (new_doc, old_ord)) in live.into_iter().enumerate() {
            old_to_new[old_ord.index()] = new_ord as i32;
            new_to_old.push(old_ord);
            new_docs.push(new_doc);
        }
        Ok(OrdinalMap {
            old_to_new,
            new_to_old,
            new_docs,
        })
    }

    pub fn len(&self) -> usize {
        self.new_to_old.len()
    }

    pub fn is_empty(&self) -> bool {
        self.new_to_old.is_empty()
    }

    /// New ordinal of `old`, `None` when its doc was deleted.
    pub fn old_to_new(&self, old: VectorOrd) -> Result<Option<VectorOrd>> {
        match self.old_to_new.get(old.index()) {
            Some(&new) if old.0 >= 0 => Ok(if new < 0 { None } else { Some(VectorOrd(new)) }),
            _ => bail!(CorruptIndex(format!(
                "{} beyond {} vectors",
                old,
                self.old_to_new.len()
            ))),
        }
    }

    pub fn new_to_old(&self, new: VectorOrd) -> Result<VectorOrd> {
        self.check(new).map(|i| self.new_to_old[i])
    }

    pub fn new_doc(&self, new: VectorOrd) -> Result<DocId> {
        self.check(new).map(|i| self.new_docs[i])
    }

    fn check(&self, new: VectorOrd) -> Result<usize> {
        if new.0 < 0 || new.index() >= self.len() {
            bail!(IllegalArgument(format!(
                "{} out of bounds for {} vectors",
                new,
                self.len()
            )));
        }
        Ok(new.index())
    }
}

pub struct SortingVectorValues {
    values: Arc<dyn VectorValues>,
    ords: Arc<OrdinalMap>,
}

impl SortingVectorValues {
    pub fn new(values: Arc<dyn VectorValues>, ords: Arc<OrdinalMap>) -> Self {
        SortingVectorValues { values, ords }
    }
}

impl VectorValues for SortingVectorValues {
    fn dimension(&self) -> usize {
        self.values.dimension()
    }

    fn size(&self) -> usize {
        self.ords.len()
    }

    fn vector_value(&self, ord: VectorOrd) -> Result<&[f32]> {
        self.values.vector_value(self.ords.new_to_old(ord)?)
    }

    fn ord_to_doc(&self, ord: VectorOrd) -> Result<DocId> {
        self.ords.new_doc(ord)
    }
}

/// A proximity graph whose nodes and edges are re-anchored on new vector
/// ordinals.
///
/// Nodes of deleted docs disappear together with every edge pointing at
/// them; the surviving neighbor lists keep their order. Levels left empty
/// at the top are dropped. If the entry node was deleted, the lowest node of
/// the highest remaining level takes over.
pub struct SortingHnswGraph {
    graph: OnHeapHnswGraph,
}

impl SortingHnswGraph {
    pub fn new(graph: &dyn HnswGraph, ords: &OrdinalMap) -> Result<SortingHnswGraph> {
        let mut levels = Vec::with_capacity(graph.num_levels());
        for level in 0..graph.num_levels() {
            let mut adjacency = BTreeMap::new();
            for node in graph.nodes_on_level(level)? {
                if let Some(new_node) = ords.old_to_new(node)? {
                    let mut neighbors = Vec::new();
                    for &neighbor in graph.neighbors(level, node)? {
                        if let Some(new_neighbor) = ords.old_to_new(neighbor)? {
                            neighbors.push(new_neighbor);
                        }
                    }
                    adjacency.insert(new_node, neighbors);
                }
            }
            levels.push(adjacency);
        }
        while levels.last().map_or(false, BTreeMap::is_empty) {
            levels.pop();
        }

        let entry_node = match graph.entry_node() {
            Some(node) => ords.old_to_new(node)?,
            None => None,
        };
        let entry_node =
            entry_node.or_else(|| levels.last().and_then(|l| l.keys().next().cloned()));
        Ok(SortingHnswGraph {
            graph: OnHeapHnswGraph::from_levels(levels, entry_node),
        })
    }
}

impl HnswGraph for SortingHnswGraph {
    fn size(&self) -> usize {
        self.graph.size()
    }

    fn num_levels(&self) -> usize {
        self.graph.num_levels()
    }

    fn entry_node(&self) -> Option<VectorOrd> {
        self.graph.entry_node()
    }

    fn nodes_on_level(&self, level: usize) -> Result<Vec<VectorOrd>> {
        self.graph.nodes_on_level(level)
    }

    fn neighbors(&self, level: usize, node: VectorOrd) -> Result<&[VectorOrd]> {
        self.graph.neighbors(level, node)
    }
}
