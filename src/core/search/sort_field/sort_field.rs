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

use std::cmp::Ordering;
use std::fmt;

#[derive(PartialEq, Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub enum SortFieldType {
    String,
    Long,
    Int,
    Double,
    Float,
}

impl SortFieldType {
    pub fn is_numeric(self) -> bool {
        self != SortFieldType::String
    }
}

/// Picks the representative value of a multi-valued document.
#[derive(PartialEq, Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub enum SelectorType {
    Min,
    Max,
}

impl Default for SelectorType {
    fn default() -> Self {
        SelectorType::Min
    }
}

/// Where documents without a value end up, in the final order.
///
/// The position does not flip when the field is reversed.
#[derive(PartialEq, Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub enum SortFieldMissingValue {
    First,
    Last,
}

impl Default for SortFieldMissingValue {
    fn default() -> Self {
        SortFieldMissingValue::Last
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SortField {
    field: String,
    field_type: SortFieldType,
    #[serde(default)]
    reverse: bool,
    #[serde(default)]
    missing: SortFieldMissingValue,
    #[serde(default)]
    selector: Option<SelectorType>,
}

impl SortField {
    pub fn new(field: &str, field_type: SortFieldType, reverse: bool) -> SortField {
        SortField {
            field: field.to_string(),
            field_type,
            reverse,
            missing: SortFieldMissingValue::default(),
            selector: None,
        }
    }

    /// Sort field for a multi-valued field, comparing the value picked by `selector`.
    pub fn with_selector(
        field: &str,
        field_type: SortFieldType,
        reverse: bool,
        selector: SelectorType,
    ) -> SortField {
        let mut sort_field = Self::new(field, field_type, reverse);
        sort_field.selector = Some(selector);
        sort_field
    }

    pub fn set_missing_value(&mut self, missing: SortFieldMissingValue) {
        self.missing = missing;
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn field_type(&self) -> SortFieldType {
        self.field_type
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn missing_value(&self) -> SortFieldMissingValue {
        self.missing
    }

    pub fn selector(&self) -> Option<SelectorType> {
        self.selector
    }

    /// Orders two documents given whether each has a value and, when both
    /// do, how their values compare in ascending order.
    pub fn compare_values(
        &self,
        has_a: bool,
        has_b: bool,
        ascending: impl FnOnce() -> Ordering,
    ) -> Ordering {
        match (has_a, has_b) {
            (true, true) => {
                let cmp = ascending();
                if self.reverse {
                    cmp.reverse()
                } else {
                    cmp
                }
            }
            (false, false) => Ordering::Equal,
            (false, true) => match self.missing {
                SortFieldMissingValue::First => Ordering::Less,
                SortFieldMissingValue::Last => Ordering::Greater,
            },
            (true, false) => match self.missing {
                SortFieldMissingValue::First => Ordering::Greater,
                SortFieldMissingValue::Last => Ordering::Less,
            },
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.reverse {
            write!(f, "!")?;
        }
        let type_name = match self.field_type {
            SortFieldType::String => "string",
            SortFieldType::Long => "long",
            SortFieldType::Int => "int",
            SortFieldType::Double => "double",
            SortFieldType::Float => "float",
        };
        write!(f, "<{}: \"{}\">", type_name, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_is_not_flipped_by_reverse() {
        let mut field = SortField::new("f", SortFieldType::Long, true);
        assert_eq!(field.compare_values(true, false, || Ordering::Equal), Ordering::Less);
        assert_eq!(
            field.compare_values(true, true, || Ordering::Less),
            Ordering::Greater
        );

        field.set_missing_value(SortFieldMissingValue::First);
        assert_eq!(field.compare_values(false, true, || Ordering::Equal), Ordering::Less);
        assert_eq!(field.compare_values(false, false, || Ordering::Less), Ordering::Equal);
    }
}
