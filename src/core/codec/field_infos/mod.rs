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

use core::doc::{DocValuesType, IndexOptions};

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::cmp::max;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Access to the Field Info file that describes document fields and whether or
/// not they are indexed. Each segment has a separate Field Info file. Objects
/// of this class are thread-safe for multiple readers, but only one thread can
/// be adding documents at a time, with no other reader or writer threads
/// accessing this object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub number: u32,
    pub doc_values_type: DocValuesType,
    pub has_store_term_vector: bool,
    pub index_options: IndexOptions,
    pub has_store_payloads: bool,
    pub point_dimension_count: u32,
    pub point_num_bytes: u32,
    pub vector_dimension: u32,
}

impl FieldInfo {
    pub fn new(name: String, number: u32) -> FieldInfo {
        FieldInfo {
            name,
            number,
            doc_values_type: DocValuesType::Null,
            has_store_term_vector: false,
            index_options: IndexOptions::Null,
            has_store_payloads: false,
            point_dimension_count: 0,
            point_num_bytes: 0,
            vector_dimension: 0,
        }
    }

    pub fn check_consistency(&self) -> Result<()> {
        if let IndexOptions::Null = self.index_options {
            if self.has_store_term_vector {
                bail!(IllegalState(format!(
                    "non-indexed field '{}' cannot store term vectors",
                    &self.name
                )));
            }
            if self.has_store_payloads {
                bail!(IllegalState(format!(
                    "non-indexed field '{}' cannot store payloads",
                    &self.name
                )));
            }
        } else if !self.index_options.has_positions() && self.has_store_payloads {
            bail!(IllegalState(format!(
                "indexed field '{}' cannot have payloads without positions",
                &self.name
            )));
        }

        if self.point_dimension_count != 0 && self.point_num_bytes == 0 {
            bail!(IllegalState(format!(
                "pointNumBytes must be > 0 when pointDimensionCount={}",
                self.point_dimension_count
            )));
        }

        if self.point_num_bytes != 0 && self.point_dimension_count == 0 {
            bail!(IllegalState(format!(
                "pointDimensionCount must be > 0 when pointNumBytes={}",
                self.point_num_bytes
            )));
        }

        Ok(())
    }

    pub fn set_doc_values_type(&mut self, dv_type: DocValuesType) -> Result<()> {
        if !self.doc_values_type.null() && !dv_type.null() && self.doc_values_type != dv_type {
            bail!(IllegalArgument(format!(
                "cannot change DocValues type from {:?} to {:?} for field \"{}\"",
                self.doc_values_type, dv_type, self.name
            )));
        }
        if !dv_type.null() {
            self.doc_values_type = dv_type;
        }
        Ok(())
    }

    pub fn set_index_options(&mut self, new_options: IndexOptions) {
        if self.index_options != new_options {
            if self.index_options == IndexOptions::Null {
                self.index_options = new_options;
            } else if new_options != IndexOptions::Null && self.index_options > new_options {
                // downgrade
                self.index_options = new_options;
            }
        }

        if !self.index_options.has_positions() {
            // cannot store payloads if we don't store positions:
            self.has_store_payloads = false;
        }
    }

    pub fn set_store_payloads(&mut self) {
        if self.index_options.has_positions() {
            self.has_store_payloads = true;
        }
    }

    pub fn set_store_term_vector(&mut self) {
        if self.index_options != IndexOptions::Null {
            self.has_store_term_vector = true;
        }
    }

    pub fn set_dimensions(&mut self, dimension_count: u32, dimension_num_bytes: u32) -> Result<()> {
        if self.point_dimension_count == 0 && dimension_count > 0 {
            self.point_dimension_count = dimension_count;
            self.point_num_bytes = dimension_num_bytes;
        } else if dimension_count != 0
            && (self.point_dimension_count != dimension_count
                || self.point_num_bytes != dimension_num_bytes)
        {
            bail!(IllegalArgument(format!(
                "cannot change field '{}' dimension count or dimension_num_bytes",
                self.name
            )));
        }
        Ok(())
    }

    pub fn set_vector_dimension(&mut self, dimension: u32) -> Result<()> {
        if self.vector_dimension == 0 {
            self.vector_dimension = dimension;
        } else if dimension != 0 && dimension != self.vector_dimension {
            bail!(IllegalArgument(format!(
                "cannot change vector dimension from {} to {} for field '{}'",
                self.vector_dimension, dimension, self.name
            )));
        }
        Ok(())
    }

    pub fn has_vectors(&self) -> bool {
        self.vector_dimension > 0
    }
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}#{}[dv={:?}, index={:?}, dims={}, vector={}]",
            self.name,
            self.number,
            self.doc_values_type,
            self.index_options,
            self.point_dimension_count,
            self.vector_dimension
        )
    }
}

/// Collection of `FieldInfo`s (accessible by number or by name).
#[derive(Clone, Debug, Default)]
pub struct FieldInfos {
    pub has_freq: bool,
    pub has_prox: bool,
    pub has_payloads: bool,
    pub has_offsets: bool,
    pub has_vectors: bool,
    pub has_doc_values: bool,
    pub has_point_values: bool,
    pub has_vector_values: bool,

    pub by_number: BTreeMap<u32, Arc<FieldInfo>>,
    pub by_name: HashMap<String, Arc<FieldInfo>>,
}

impl FieldInfos {
    pub fn new(infos: Vec<FieldInfo>) -> Result<FieldInfos> {
        let mut field_infos = FieldInfos::default();
        let mut max_number = 0;

        for info in infos {
            info.check_consistency()?;
            let info = Arc::new(info);
            let number = info.number;
            max_number = max(max_number, number);

            field_infos.has_vectors |= info.has_store_term_vector;
            field_infos.has_prox |= info.index_options.has_positions();
            field_infos.has_freq |= info.index_options.has_freqs();
            field_infos.has_offsets |= info.index_options.has_offsets();
            field_infos.has_doc_values |= !info.doc_values_type.null();
            field_infos.has_payloads |= info.has_store_payloads;
            field_infos.has_point_values |= info.point_dimension_count != 0;
            field_infos.has_vector_values |= info.has_vectors();

            if let Some(previous) = field_infos.by_number.insert(number, Arc::clone(&info)) {
                bail!(IllegalArgument(format!(
                    "duplicated field numbers: {} and {} have: {}",
                    previous.name, &info.name, number
                )));
            }

            let name = info.name.clone();
            if let Some(previous) = field_infos.by_name.insert(name.clone(), info) {
                bail!(IllegalArgument(format!(
                    "duplicated field names: {} and {} have: {}",
                    previous.number, number, &name
                )));
            }
        }
        debug!(
            "field infos built with {} fields, max number {}",
            field_infos.len(),
            max_number
        );
        Ok(field_infos)
    }

    pub fn field_info_by_name(&self, field_name: &str) -> Option<&FieldInfo> {
        self.by_name.get(field_name).map(Arc::as_ref)
    }

    /// Field infos ordered by field number.
    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.by_number.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct FieldInfosBuilder {
    pub by_name: HashMap<String, FieldInfo>,
}

impl FieldInfosBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a new field, or return existing one.
    pub fn get_or_add(&mut self, name: &str) -> &mut FieldInfo {
        let number = self.by_name.len() as u32;
        self.by_name
            .entry(name.to_string())
            .or_insert_with(|| FieldInfo::new(name.to_string(), number))
    }

    /// Merges `fi` into the field of the same name, keeping the local number.
    pub fn add(&mut self, fi: &FieldInfo) -> Result<()> {
        let info = self.get_or_add(&fi.name);
        info.set_index_options(fi.index_options);
        if fi.has_store_term_vector {
            info.set_store_term_vector();
        }
        if fi.has_store_payloads {
            info.set_store_payloads();
        }
        info.set_doc_values_type(fi.doc_values_type)?;
        info.set_dimensions(fi.point_dimension_count, fi.point_num_bytes)?;
        info.set_vector_dimension(fi.vector_dimension)?;
        Ok(())
    }

    pub fn add_infos(&mut self, other: &FieldInfos) -> Result<()> {
        for fi in other.iter() {
            self.add(fi)?;
        }
        Ok(())
    }

    pub fn finish(&self) -> Result<FieldInfos> {
        FieldInfos::new(self.by_name.values().cloned().collect())
    }
}
