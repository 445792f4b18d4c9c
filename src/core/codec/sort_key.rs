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

use core::codec::doc_values::{DocValuesEnum, DocValuesIterator, NO_MORE_ORDS};
use core::codec::field_infos::FieldInfos;
use core::doc::DocValuesType;
use core::index::reader::LeafReader;
use core::search::sort_field::{SelectorType, Sort, SortField, SortFieldType};
use core::search::NO_MORE_DOCS;
use core::util::{is_live_doc, sortable_double_bits, sortable_float_bits};
use core::util::{BitsRef, DocId, FixedBitSet};

use error::ErrorKind::{CorruptIndex, IllegalState, SortFieldTypeMismatch};
use error::Result;

use std::cmp::Ordering;

/// How the key of a sort field is read from its doc values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeySource {
    Numeric,
    SortedNumeric(SelectorType),
    Sorted,
    SortedSet(SelectorType),
    Binary,
}

#[derive(Debug)]
pub enum SortKeyValues {
    /// numeric keys, and ords of sorted fields
    Long(Vec<i64>),
    Bytes(Vec<Vec<u8>>),
}

/// Keys of one sort field, indexed by old doc id. Only live docs that have
/// a value are populated.
#[derive(Debug)]
pub struct SortKeyColumn {
    sort_field: SortField,
    values: SortKeyValues,
    docs_with_value: FixedBitSet,
}

impl SortKeyColumn {
    pub fn sort_field(&self) -> &SortField {
        &self.sort_field
    }

    pub fn has_value(&self, doc: DocId) -> bool {
        self.docs_with_value.is_set(doc as usize)
    }

    pub fn values(&self) -> &SortKeyValues {
        &self.values
    }

    /// Orders two docs by this field, honoring direction and the missing value
    /// policy. Ties are `Equal`.
    pub fn compare(&self, doc1: DocId, doc2: DocId) -> Ordering {
        let (a, b) = (doc1 as usize, doc2 as usize);
        self.sort_field.compare_values(self.has_value(doc1), self.has_value(doc2), || {
            match self.values {
                SortKeyValues::Long(ref v) => v[a].cmp(&v[b]),
                SortKeyValues::Bytes(ref v) => v[a].cmp(&v[b]),
            }
        })
    }
}

/// Reads comparable keys out of the doc values named by a `Sort`.
///
/// Every sort field is checked against the segment's field infos when the
/// extractor is built, so a bad sort fails before any column is read.
pub struct SortKeyExtractor {
    fields: Vec<(SortField, KeySource)>,
}

impl SortKeyExtractor {
    pub fn new(sort: &Sort, field_infos: &FieldInfos) -> Result<SortKeyExtractor> {
        let mut fields = Vec::with_capacity(sort.get_sort().len());
        for sort_field in sort.get_sort() {
            let source = Self::key_source(sort_field, field_infos)?;
            fields.push((sort_field.clone(), source));
        }
        Ok(SortKeyExtractor { fields })
    }

    fn key_source(sort_field: &SortField, field_infos: &FieldInfos) -> Result<KeySource> {
        let name = sort_field.field();
        let dv_type = match field_infos.field_info_by_name(name) {
            Some(info) => info.doc_values_type,
            None => bail!(SortFieldTypeMismatch(
                name.to_string(),
                "field does not exist in segment".into()
            )),
        };
        let selector = sort_field.selector().unwrap_or_default();
        let source = match (sort_field.field_type(), dv_type) {
            (_, DocValuesType::Null) => bail!(SortFieldTypeMismatch(
                name.to_string(),
                "field has no doc values".into()
            )),
            (SortFieldType::String, DocValuesType::Sorted) => KeySource::Sorted,
            (SortFieldType::String, DocValuesType::SortedSet) => KeySource::SortedSet(selector),
            (SortFieldType::String, DocValuesType::Binary) => KeySource::Binary,
            (t, DocValuesType::Numeric) if t.is_numeric() => KeySource::Numeric,
            (t, DocValuesType::SortedNumeric) if t.is_numeric() => {
                KeySource::SortedNumeric(selector)
            }
            (t, dv) => bail!(SortFieldTypeMismatch(
                name.to_string(),
                format!("cannot sort {:?} doc values as {:?}", dv, t)
            )),
        };
        Ok(source)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Extracts the keys of the `index`th sort field in one forward pass
    /// over its doc values.
    pub fn extract<R: LeafReader + ?Sized>(
        &self,
        reader: &R,
        index: usize,
    ) -> Result<SortKeyColumn> {
        let (ref sort_field, source) = self.fields[index];
        let max_doc = reader.max_doc();
        let live_docs = reader.live_docs();
        let mut docs_with_value = FixedBitSet::new(max_doc as usize);
        // a declared field whose values were all merged away has no column,
        // every doc is then missing
        let doc_values = match reader.get_doc_values(sort_field.field())? {
            Some(dv) => dv,
            None => {
                let values = match source {
                    KeySource::Binary => SortKeyValues::Bytes(vec![Vec::new(); max_doc as usize]),
                    _ => SortKeyValues::Long(vec![0i64; max_doc as usize]),
                };
                return Ok(SortKeyColumn {
                    sort_field: sort_field.clone(),
                    values,
                    docs_with_value,
                });
            }
        };
        let field_type = sort_field.field_type();

        let values = match (source, doc_values) {
            (KeySource::Numeric, DocValuesEnum::Numeric(mut dv)) => {
                let mut keys = vec![0i64; max_doc as usize];
                let mut cursor = LiveCursor::new(max_doc, live_docs.as_ref());
                while let Some(doc) = cursor.next(dv.as_mut())? {
                    keys[doc as usize] = numeric_key(field_type, dv.long_value()?);
                    docs_with_value.set(doc as usize);
                }
                SortKeyValues::Long(keys)
            }
            (KeySource::SortedNumeric(selector), DocValuesEnum::SortedNumeric(mut dv)) => {
                let mut keys = vec![0i64; max_doc as usize];
                let mut cursor = LiveCursor::new(max_doc, live_docs.as_ref());
                while let Some(doc) = cursor.next(dv.as_mut())? {
                    let count = dv.doc_value_count();
                    let mut selected: Option<i64> = None;
                    for _ in 0..count {
                        let key = numeric_key(field_type, dv.next_value()?);
                        selected = Some(select(selector, selected, key));
                    }
                    match selected {
                        Some(key) => keys[doc as usize] = key,
                        None => bail!(CorruptIndex(format!(
                            "doc {} of field '{}' reports zero values",
                            doc,
                            sort_field.field()
                        ))),
                    }
                    docs_with_value.set(doc as usize);
                }
                SortKeyValues::Long(keys)
            }
            (KeySource::Sorted, DocValuesEnum::Sorted(mut dv)) => {
                let mut keys = vec![0i64; max_doc as usize];
                let mut cursor = LiveCursor::new(max_doc, live_docs.as_ref());
                while let Some(doc) = cursor.next(dv.as_mut())? {
                    keys[doc as usize] = i64::from(dv.ord_value()?);
                    docs_with_value.set(doc as usize);
                }
                SortKeyValues::Long(keys)
            }
            (KeySource::SortedSet(selector), DocValuesEnum::SortedSet(mut dv)) => {
                let mut keys = vec![0i64; max_doc as usize];
                let mut cursor = LiveCursor::new(max_doc, live_docs.as_ref());
                while let Some(doc) = cursor.next(dv.as_mut())? {
                    let mut selected: Option<i64> = None;
                    loop {
                        let ord = dv.next_ord()?;
                        if ord == NO_MORE_ORDS {
                            break;
                        }
                        selected = Some(select(selector, selected, ord));
                    }
                    match selected {
                        Some(ord) => keys[doc as usize] = ord,
                        None => bail!(CorruptIndex(format!(
                            "doc {} of field '{}' reports zero ords",
                            doc,
                            sort_field.field()
                        ))),
                    }
                    docs_with_value.set(doc as usize);
                }
                SortKeyValues::Long(keys)
            }
            (KeySource::Binary, DocValuesEnum::Binary(mut dv)) => {
                let mut keys = vec![Vec::new(); max_doc as usize];
                let mut cursor = LiveCursor::new(max_doc, live_docs.as_ref());
                while let Some(doc) = cursor.next(dv.as_mut())? {
                    keys[doc as usize] = dv.binary_value()?.to_vec();
                    docs_with_value.set(doc as usize);
                }
                SortKeyValues::Bytes(keys)
            }
            (source, dv) => bail!(IllegalState(format!(
                "sort field '{}' expects {:?} but segment returned {:?} doc values",
                sort_field.field(),
                source,
                dv.doc_values_type()
            ))),
        };

        Ok(SortKeyColumn {
            sort_field: sort_field.clone(),
            values,
            docs_with_value,
        })
    }
}

/// Maps a stored numeric doc value to a key whose `i64` order is the
/// numeric order of the field type. Floats and doubles are stored as their
/// IEEE bits.
fn numeric_key(field_type: SortFieldType, raw: i64) -> i64 {
    match field_type {
        SortFieldType::Int => i64::from(raw as i32),
        SortFieldType::Float => i64::from(sortable_float_bits(raw as i32)),
        SortFieldType::Double => sortable_double_bits(raw),
        SortFieldType::Long | SortFieldType::String => raw,
    }
}

fn select(selector: SelectorType, selected: Option<i64>, value: i64) -> i64 {
    match (selector, selected) {
        (_, None) => value,
        (SelectorType::Min, Some(v)) => v.min(value),
        (SelectorType::Max, Some(v)) => v.max(value),
    }
}

/// Walks a doc values column forward, skipping deleted docs and checking
/// that the column yields strictly ascending docs below `max_doc`.
pub struct LiveCursor<'a> {
    max_doc: DocId,
    live_docs: Option<&'a BitsRef>,
    last: DocId,
}

impl<'a> LiveCursor<'a> {
    pub fn new(max_doc: DocId, live_docs: Option<&'a BitsRef>) -> Self {
        LiveCursor {
            max_doc,
            live_docs,
            last: -1,
        }
    }

    /// Positions `iter` on its next live doc, `None` once exhausted.
    pub fn next<T: DocValuesIterator + ?Sized>(&mut self, iter: &mut T) -> Result<Option<DocId>> {
        loop {
            let doc = iter.next()?;
            if doc == NO_MORE_DOCS {
                return Ok(None);
            }
            if doc <= self.last || doc >= self.max_doc {
                bail!(CorruptIndex(format!(
                    "doc values returned doc {} after {} (max_doc={})",
                    doc, self.last, self.max_doc
                )));
            }
            self.last = doc;
            if is_live_doc(self.live_docs, doc as usize)? {
                return Ok(Some(doc));
            }
        }
    }
}
