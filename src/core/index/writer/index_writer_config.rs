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

use core::codec::memory::DEFAULT_MAX_POINTS_IN_LEAF_NODE;
use core::search::sort_field::Sort;

use error::ErrorKind::IllegalArgument;
use error::Result;

use num_cpus;
use serde_json;

/// Holds all the configuration used when flushing or merging segments.
///
/// Can be built with the setters, which return the config to allow
/// chaining, or loaded from JSON:
///
/// ```json
/// {
///     "index_sort": {"fields": [{"field": "timestamp", "field_type": "Long", "reverse": true}]},
///     "merge_threads": 4
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexWriterConfig {
    /// Order of documents in flushed and merged segments, `None` keeps
    /// insertion order.
    pub index_sort: Option<Sort>,
    /// Threads remapping doc values fields in parallel during a merge.
    pub merge_threads: usize,
    /// Points held by each leaf of a written points tree.
    pub points_per_leaf: usize,
}

impl Default for IndexWriterConfig {
    fn default() -> Self {
        IndexWriterConfig {
            index_sort: None,
            merge_threads: num_cpus::get(),
            points_per_leaf: DEFAULT_MAX_POINTS_IN_LEAF_NODE,
        }
    }
}

impl IndexWriterConfig {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: IndexWriterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.merge_threads == 0 {
            bail!(IllegalArgument("merge_threads must be at least 1".into()));
        }
        if self.points_per_leaf == 0 {
            bail!(IllegalArgument("points_per_leaf must be at least 1".into()));
        }
        Ok(())
    }

    pub fn index_sort(&self) -> Option<&Sort> {
        self.index_sort.as_ref()
    }

    pub fn set_index_sort(mut self, sort: Sort) -> Self {
        self.index_sort = Some(sort);
        self
    }

    pub fn set_merge_threads(mut self, merge_threads: usize) -> Self {
        self.merge_threads = merge_threads;
        self
    }

    pub fn set_points_per_leaf(mut self, points_per_leaf: usize) -> Self {
        self.points_per_leaf = points_per_leaf;
        self
    }
}
