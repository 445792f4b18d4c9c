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
use core::util::DocId;

use error::ErrorKind::IllegalArgument;
use error::Result;

use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_MAX_POINTS_IN_LEAF_NODE: usize = 1024;

/// Points of one field, ordered by packed value then doc and cut into
/// leaves of at most `points_per_leaf` points.
#[derive(Debug)]
pub struct PointsField {
    num_dims: usize,
    bytes_per_dim: usize,
    points: Vec<(DocId, Vec<u8>)>,
    doc_count: i32,
    min_packed_value: Vec<u8>,
    max_packed_value: Vec<u8>,
}

impl PointsField {
    pub fn new(
        num_dims: usize,
        bytes_per_dim: usize,
        mut points: Vec<(DocId, Vec<u8>)>,
    ) -> Result<PointsField> {
        let packed_len = num_dims * bytes_per_dim;
        if let Some((doc, _)) = points.iter().find(|(_, v)| v.len() != packed_len) {
            bail!(IllegalArgument(format!(
                "point of doc {} is not {} bytes long",
                doc, packed_len
            )));
        }
        points.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        let doc_count = points.iter().map(|p| p.0).collect::<BTreeSet<_>>().len() as i32;
        let (min_packed_value, max_packed_value) = pack_bounds(&points, num_dims, bytes_per_dim);
        Ok(PointsField {
            num_dims,
            bytes_per_dim,
            points,
            doc_count,
            min_packed_value,
            max_packed_value,
        })
    }
}

/// Per dimension minimum and maximum of `points`, packed.
fn pack_bounds(
    points: &[(DocId, Vec<u8>)],
    num_dims: usize,
    bytes_per_dim: usize,
) -> (Vec<u8>, Vec<u8>) {
    if points.is_empty() {
        return (vec![], vec![]);
    }
    let mut min = points[0].1.clone();
    let mut max = points[0].1.clone();
    for (_, value) in &points[1..] {
        for dim in 0..num_dims {
            let range = dim * bytes_per_dim..(dim + 1) * bytes_per_dim;
            if value[range.clone()] < min[range.clone()] {
                min[range.clone()].copy_from_slice(&value[range.clone()]);
            }
            if value[range.clone()] > max[range.clone()] {
                max[range.clone()].copy_from_slice(&value[range]);
            }
        }
    }
    (min, max)
}

/// Heap resident `PointValues`, visiting leaves in value order.
#[derive(Debug)]
pub struct MemoryPointValues {
    fields: HashMap<String, PointsField>,
    points_per_leaf: usize,
}

impl MemoryPointValues {
    pub fn new(fields: HashMap<String, PointsField>, points_per_leaf: usize) -> Self {
        debug_assert!(points_per_leaf > 0);
        MemoryPointValues {
            fields,
            points_per_leaf,
        }
    }

    fn field(&self, field_name: &str) -> Result<&PointsField> {
        match self.fields.get(field_name) {
            Some(f) => Ok(f),
            None => bail!(IllegalArgument(format!(
                "field '{}' was not indexed with points",
                field_name
            ))),
        }
    }
}

impl PointValues for MemoryPointValues {
    fn intersect(&self, field_name: &str, visitor: &mut dyn IntersectVisitor) -> Result<()> {
        let field = self.field(field_name)?;
        for leaf in field.points.chunks(self.points_per_leaf) {
            let (min, max) = pack_bounds(leaf, field.num_dims, field.bytes_per_dim);
            match visitor.compare(&min, &max) {
                Relation::CellOutsideQuery => {}
                Relation::CellInsideQuery => {
                    visitor.grow(leaf.len())?;
                    for (doc, _) in leaf {
                        visitor.visit(*doc)?;
                    }
                }
                Relation::CellCrossesQuery => {
                    visitor.grow(leaf.len())?;
                    for (doc, value) in leaf {
                        visitor.visit_by_packed_value(*doc, value)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn min_packed_value(&self, field_name: &str) -> Result<Vec<u8>> {
        Ok(self.field(field_name)?.min_packed_value.clone())
    }

    fn max_packed_value(&self, field_name: &str) -> Result<Vec<u8>> {
        Ok(self.field(field_name)?.max_packed_value.clone())
    }

    fn num_dimensions(&self, field_name: &str) -> Result<usize> {
        Ok(self.field(field_name)?.num_dims)
    }

    fn bytes_per_dimension(&self, field_name: &str) -> Result<usize> {
        Ok(self.field(field_name)?.bytes_per_dim)
    }

    fn size(&self, field_name: &str) -> Result<i64> {
        Ok(self.field(field_name)?.points.len() as i64)
    }

    fn doc_count(&self, field_name: &str) -> Result<i32> {
        Ok(self.field(field_name)?.doc_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::index::tests::{int_point, RecordingVisitor};

    #[test]
    fn test_leaves_follow_value_order() {
        let points = vec![(0, int_point(5)), (1, int_point(-2)), (2, int_point(9))];
        let mut fields = HashMap::new();
        fields.insert("n".to_string(), PointsField::new(1, 4, points).unwrap());
        let values = MemoryPointValues::new(fields, 2);

        assert_eq!(values.size("n").unwrap(), 3);
        assert_eq!(values.doc_count("n").unwrap(), 3);
        assert_eq!(values.min_packed_value("n").unwrap(), int_point(-2));
        assert_eq!(values.max_packed_value("n").unwrap(), int_point(9));

        let mut visitor = RecordingVisitor::default();
        values.intersect("n", &mut visitor).unwrap();
        assert_eq!(visitor.leaves.len(), 2);
        assert_eq!(
            visitor.leaves[0],
            vec![(1, Some(int_point(-2))), (0, Some(int_point(5)))]
        );
        assert_eq!(visitor.leaves[1], vec![(2, Some(int_point(9)))]);

        assert!(values.size("missing").is_err());
    }

    #[test]
    fn test_rejects_wrong_value_width() {
        assert!(PointsField::new(2, 4, vec![(0, int_point(1))]).is_err());
    }
}
