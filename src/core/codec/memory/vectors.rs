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

use core::codec::vectors::{HnswGraph, VectorOrd, VectorValues};
use core::util::DocId;

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::collections::BTreeMap;

/// Vectors of one field, ordinal `i` belonging to `docs[i]`.
#[derive(Clone, Debug, Default)]
pub struct MemoryVectorValues {
    dimension: usize,
    docs: Vec<DocId>,
    vectors: Vec<Vec<f32>>,
}

impl MemoryVectorValues {
    /// `entries` must be in ascending doc order.
    pub fn new(dimension: usize, entries: Vec<(DocId, Vec<f32>)>) -> Result<Self> {
        if let Some((doc, v)) = entries.iter().find(|(_, v)| v.len() != dimension) {
            bail!(IllegalArgument(format!(
                "vector of doc {} has dimension {}, expected {}",
                doc,
                v.len(),
                dimension
            )));
        }
        let (docs, vectors): (Vec<DocId>, Vec<Vec<f32>>) = entries.into_iter().unzip();
        if docs.windows(2).any(|w| w[0] >= w[1]) {
            bail!(IllegalArgument("vector docs must be strictly ascending".into()));
        }
        Ok(MemoryVectorValues {
            dimension,
            docs,
            vectors,
        })
    }

    fn check_ord(&self, ord: VectorOrd) -> Result<usize> {
        if ord.0 < 0 || ord.index() >= self.docs.len() {
            bail!(IllegalArgument(format!(
                "{} out of bounds for {} vectors",
                ord,
                self.docs.len()
            )));
        }
        Ok(ord.index())
    }
}

impl VectorValues for MemoryVectorValues {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn size(&self) -> usize {
        self.docs.len()
    }

    fn vector_value(&self, ord: VectorOrd) -> Result<&[f32]> {
        Ok(&self.vectors[self.check_ord(ord)?])
    }

    fn ord_to_doc(&self, ord: VectorOrd) -> Result<DocId> {
        Ok(self.docs[self.check_ord(ord)?])
    }
}

/// An `HnswGraph` held on the heap, one adjacency map per level.
#[derive(Clone, Debug, Default)]
pub struct OnHeapHnswGraph {
    levels: Vec<BTreeMap<VectorOrd, Vec<VectorOrd>>>,
    entry_node: Option<VectorOrd>,
}

impl OnHeapHnswGraph {
    pub fn new() -> Self {
        Default::default()
    }

    /// Adds `node` to `level` and every level below it. A node opening a
    /// new top level becomes the entry node.
    pub fn add_node(&mut self, level: usize, node: VectorOrd) {
        let new_top = self.levels.len() <= level;
        while self.levels.len() <= level {
            self.levels.push(BTreeMap::new());
        }
        for l in 0..=level {
            self.levels[l].entry(node).or_insert_with(Vec::new);
        }
        if new_top || self.entry_node.is_none() {
            self.entry_node = Some(node);
        }
    }

    pub fn set_neighbors(
        &mut self,
        level: usize,
        node: VectorOrd,
        neighbors: Vec<VectorOrd>,
    ) -> Result<()> {
        match self.levels.get_mut(level).and_then(|l| l.get_mut(&node)) {
            Some(slot) => {
                *slot = neighbors;
                Ok(())
            }
            None => bail!(IllegalArgument(format!(
                "{} is not on level {}",
                node, level
            ))),
        }
    }

    /// Builds a graph from its adjacency maps, level 0 first.
    pub fn from_levels(
        levels: Vec<BTreeMap<VectorOrd, Vec<VectorOrd>>>,
        entry_node: Option<VectorOrd>,
    ) -> Self {
        OnHeapHnswGraph { levels, entry_node }
    }

    pub fn set_entry_node(&mut self, node: Option<VectorOrd>) {
        self.entry_node = node;
    }

    /// Copies any graph into heap form.
    pub fn copy_of(graph: &dyn HnswGraph) -> Result<Self> {
        let mut copy = OnHeapHnswGraph::new();
        for level in 0..graph.num_levels() {
            let mut adjacency = BTreeMap::new();
            for node in graph.nodes_on_level(level)? {
                adjacency.insert(node, graph.neighbors(level, node)?.to_vec());
            }
            copy.levels.push(adjacency);
        }
        copy.entry_node = graph.entry_node();
        Ok(copy)
    }
}

impl HnswGraph for OnHeapHnswGraph {
    fn size(&self) -> usize {
        self.levels.first().map_or(0, BTreeMap::len)
    }

    fn num_levels(&self) -> usize {
        self.levels.len()
    }

    fn entry_node(&self) -> Option<VectorOrd> {
        self.entry_node
    }

    fn nodes_on_level(&self, level: usize) -> Result<Vec<VectorOrd>> {
        match self.levels.get(level) {
            Some(l) => Ok(l.keys().cloned().collect()),
            None => bail!(IllegalArgument(format!("no level {} in graph", level))),
        }
    }

    fn neighbors(&self, level: usize, node: VectorOrd) -> Result<&[VectorOrd]> {
        match self.levels.get(level).and_then(|l| l.get(&node)) {
            Some(n) => Ok(n),
            None => bail!(IllegalArgument(format!(
                "{} is not on level {}",
                node, level
            ))),
        }
    }
}
