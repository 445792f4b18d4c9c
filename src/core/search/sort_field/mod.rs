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

mod sort_field;

pub use self::sort_field::*;

use std::fmt;

/// Encapsulates the sort criteria of an index.
///
/// Fields are applied in order: the first field is the primary key and
/// every following field only breaks ties left by the ones before it.
/// Documents that still tie keep their original relative order.
///
/// ### Valid Types of Values
///
/// A sort field reads the doc values of its field. Numeric types
/// (`Int`, `Long`, `Float`, `Double`) read numeric or sorted numeric doc
/// values; `String` reads sorted, sorted set or binary doc values and
/// compares the raw bytes as unsigned.
///
/// Multi-valued fields pick one representative value per document with
/// the field's selector, only for comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(default)]
    fields: Vec<SortField>,
}

impl Sort {
    pub fn new(fields: Vec<SortField>) -> Sort {
        Sort { fields }
    }

    pub fn get_sort(&self) -> &[SortField] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "<doc>");
        }
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json;

    #[test]
    fn test_sort_from_json() {
        let json = r#"{
            "fields": [
                {"field": "price", "field_type": "Double", "reverse": true},
                {"field": "tags", "field_type": "String", "missing": "First", "selector": "Max"}
            ]
        }"#;
        let sort: Sort = serde_json::from_str(json).unwrap();
        let fields = sort.get_sort();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].field(), "price");
        assert!(fields[0].is_reverse());
        assert_eq!(fields[0].missing_value(), SortFieldMissingValue::Last);
        assert_eq!(fields[0].selector(), None);
        assert_eq!(fields[1].field_type(), SortFieldType::String);
        assert_eq!(fields[1].missing_value(), SortFieldMissingValue::First);
        assert_eq!(fields[1].selector(), Some(SelectorType::Max));
        assert_eq!(format!("{}", sort), "!<double: \"price\">,<string: \"tags\">");
    }
}
