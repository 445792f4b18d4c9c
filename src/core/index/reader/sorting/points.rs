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

use core::codec::points::{IntersectVisitor, PointValues, Relation};
use core::codec::DocMap;
use core::util::DocId;

use error::ErrorKind::CorruptIndex;
use error::Result;

use std::sync::Arc;

/// Point values whose visitors see new doc ids.
///
/// Points of one leaf reach the wrapped visitor sorted by new doc id. The
/// leaf boundary is the `grow` call the wrapped point values make before
/// every leaf.
#[derive(Clone)]
pub struct SortingPointValues {
    point_values: Arc<dyn PointValues>,
    doc_map: Arc<DocMap>,
}

impl SortingPointValues {
    pub fn new(point_values: Arc<dyn PointValues>, doc_map: Arc<DocMap>) -> Self {
        SortingPointValues {
            point_values,
            doc_map,
        }
    }
}

impl PointValues for SortingPointValues {
    fn intersect(&self, field_name: &str, visitor: &mut dyn IntersectVisitor) -> Result<()> {
        let mut sort_visitor = SortingIntersectVisitor {
            visitor,
            doc_map: &self.doc_map,
            leaf: Vec::new(),
        };
        self.point_values.intersect(field_name, &mut sort_visitor)?;
        sort_visitor.flush()
    }

    fn min_packed_value(&self, field_name: &str) -> Result<Vec<u8>> {
        self.point_values.min_packed_value(field_name)
    }

    fn max_packed_value(&self, field_name: &str) -> Result<Vec<u8>> {
        self.point_values.max_packed_value(field_name)
    }

    fn num_dimensions(&self, field_name: &str) -> Result<usize> {
        self.point_values.num_dimensions(field_name)
    }

    fn bytes_per_dimension(&self, field_name: &str) -> Result<usize> {
        self.point_values.bytes_per_dimension(field_name)
    }

    fn size(&self, field_name: &str) -> Result<i64> {
        self.point_values.size(field_name)
    }

    fn doc_count(&self, field_name: &str) -> Result<i32> {
        self.point_values.doc_count(field_name)
    }
}

struct SortingIntersectVisitor<'a> {
    visitor: &'a mut dyn IntersectVisitor,
    doc_map: &'a DocMap,
    // (new doc, packed value) of the current leaf
    leaf: Vec<(DocId, Option<Vec<u8>>)>,
}

impl<'a> SortingIntersectVisitor<'a> {
    fn remap(&self, doc_id: DocId) -> Result<Option<DocId>> {
        if doc_id < 0 || doc_id >= self.doc_map.max_doc() {
            bail!(CorruptIndex(format!(
                "points returned doc {} beyond max_doc {}",
                doc_id,
                self.doc_map.max_doc()
            )));
        }
        Ok(self.doc_map.try_old_to_new(doc_id))
    }

    fn flush(&mut self) -> Result<()> {
        // stable, so the points of one doc keep their value order
        self.leaf.sort_by_key(|p| p.0);
        for (doc, packed_value) in self.leaf.drain(..) {
            match packed_value {
                Some(ref value) => self.visitor.visit_by_packed_value(doc, value)?,
                None => self.visitor.visit(doc)?,
            }
        }
        Ok(())
    }
}

impl<'a> IntersectVisitor for SortingIntersectVisitor<'a> {
    fn visit(&mut self, doc_id: DocId) -> Result<()> {
        if let Some(new_doc) = self.remap(doc_id)? {
            self.leaf.push((new_doc, None));
        }
        Ok(())
    }

    fn visit_by_packed_value(&mut self, doc_id: DocId, packed_value: &[u8]) -> Result<()> {
        if let Some(new_doc) = self.remap(doc_id)? {
            self.leaf.push((new_doc, Some(packed_value.to_vec())));
        }
        Ok(())
    }

    fn compare(&self, min_packed_value: &[u8], max_packed_value: &[u8]) -> Relation {
        self.visitor.compare(min_packed_value, max_packed_value)
    }

    fn grow(&mut self, count: usize) -> Result<()> {
        self.flush()?;
        self.visitor.grow(count)
    }
}
