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

use core::codec::field_infos::FieldInfo;
use core::doc::{Document, StoredField, StoredValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    YES,
    NO,
    STOP,
}

/// Expert: provides a low-level means of accessing the stored field
/// values in an index.
pub trait StoredFieldVisitor {
    fn binary_field(&mut self, field_info: &FieldInfo, value: Vec<u8>);
    fn string_field(&mut self, field_info: &FieldInfo, value: String);
    fn int_field(&mut self, field_info: &FieldInfo, value: i32);
    fn long_field(&mut self, field_info: &FieldInfo, value: i64);
    fn float_field(&mut self, field_info: &FieldInfo, value: f32);
    fn double_field(&mut self, field_info: &FieldInfo, value: f64);

    fn needs_field(&self, field_info: &FieldInfo) -> Status;

    fn visit_value(&mut self, field_info: &FieldInfo, value: &StoredValue) {
        match value {
            StoredValue::VString(s) => self.string_field(field_info, s.clone()),
            StoredValue::Binary(b) => self.binary_field(field_info, b.clone()),
            StoredValue::Int(v) => self.int_field(field_info, *v),
            StoredValue::Long(v) => self.long_field(field_info, *v),
            StoredValue::Float(v) => self.float_field(field_info, *v),
            StoredValue::Double(v) => self.double_field(field_info, *v),
        }
    }
}

/// A `StoredFieldVisitor` that creates a `Document` containing all stored
/// fields, or only specific requested fields provided.
pub struct DocumentStoredFieldVisitor {
    pub fields: Vec<StoredField>,
    fields_to_add: Vec<String>,
}

impl DocumentStoredFieldVisitor {
    pub fn new(fields_to_add: &[String]) -> DocumentStoredFieldVisitor {
        DocumentStoredFieldVisitor {
            fields: vec![],
            fields_to_add: fields_to_add.to_owned(),
        }
    }

    pub fn document(self) -> Document {
        Document::new(self.fields)
    }

    fn push(&mut self, field_info: &FieldInfo, value: StoredValue) {
        self.fields.push(StoredField::new(&field_info.name, value));
    }
}

impl StoredFieldVisitor for DocumentStoredFieldVisitor {
    fn binary_field(&mut self, field_info: &FieldInfo, value: Vec<u8>) {
        self.push(field_info, StoredValue::Binary(value));
    }

    fn string_field(&mut self, field_info: &FieldInfo, value: String) {
        self.push(field_info, StoredValue::VString(value));
    }

    fn int_field(&mut self, field_info: &FieldInfo, value: i32) {
        self.push(field_info, StoredValue::Int(value));
    }

    fn long_field(&mut self, field_info: &FieldInfo, value: i64) {
        self.push(field_info, StoredValue::Long(value));
    }

    fn float_field(&mut self, field_info: &FieldInfo, value: f32) {
        self.push(field_info, StoredValue::Float(value));
    }

    fn double_field(&mut self, field_info: &FieldInfo, value: f64) {
        self.push(field_info, StoredValue::Double(value));
    }

    fn needs_field(&self, field_info: &FieldInfo) -> Status {
        if self.fields_to_add.is_empty() || self.fields_to_add.contains(&field_info.name) {
            Status::YES
        } else {
            Status::NO
        }
    }
}
