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

use core::codec::doc_values::{
    BinaryDocValues, DocValuesEnum, DocValuesIterator, NumericDocValues, SortedDocValues,
    SortedNumericDocValues, SortedSetDocValues, NO_MORE_ORDS,
};
use core::doc::DocValuesType;
use core::search::{DocIterator, NO_MORE_DOCS};
use core::util::DocId;

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::BTreeSet;
use std::sync::Arc;

/// A column stores values for an ascending list of docs.
pub trait DocColumn: Send + Sync {
    fn docs(&self) -> &[DocId];
}

#[derive(Clone, Debug, Default)]
pub struct NumericColumn {
    pub docs: Vec<DocId>,
    pub values: Vec<i64>,
}

#[derive(Clone, Debug, Default)]
pub struct BinaryColumn {
    pub docs: Vec<DocId>,
    pub values: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct SortedColumn {
    pub docs: Vec<DocId>,
    pub ords: Vec<i32>,
    pub dict: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, Default)]
pub struct SortedNumericColumn {
    pub docs: Vec<DocId>,
    pub values: Vec<Vec<i64>>,
}

#[derive(Clone, Debug, Default)]
pub struct SortedSetColumn {
    pub docs: Vec<DocId>,
    pub ords: Vec<Vec<i64>>,
    pub dict: Vec<Vec<u8>>,
}

macro_rules! doc_column {
    ($($column:ty),*) => {
        $(
            impl DocColumn for $column {
                fn docs(&self) -> &[DocId] {
                    &self.docs
                }
            }
        )*
    };
}

doc_column!(
    NumericColumn,
    BinaryColumn,
    SortedColumn,
    SortedNumericColumn,
    SortedSetColumn
);

fn build_dict<'a>(values: impl Iterator<Item = &'a Vec<u8>>) -> Vec<Vec<u8>> {
    let unique: BTreeSet<&Vec<u8>> = values.collect();
    unique.into_iter().cloned().collect()
}

impl NumericColumn {
    pub fn new(entries: Vec<(DocId, i64)>) -> Self {
        let (docs, values) = entries.into_iter().unzip();
        NumericColumn { docs, values }
    }
}

impl BinaryColumn {
    pub fn new(entries: Vec<(DocId, Vec<u8>)>) -> Self {
        let (docs, values) = entries.into_iter().unzip();
        BinaryColumn { docs, values }
    }
}

impl SortedColumn {
    /// Builds the dictionary from the distinct values; ords follow byte order.
    pub fn new(entries: Vec<(DocId, Vec<u8>)>) -> Self {
        let dict = build_dict(entries.iter().map(|e| &e.1));
        let mut docs = Vec::with_capacity(entries.len());
        let mut ords = Vec::with_capacity(entries.len());
        for (doc, value) in entries {
            // the dictionary holds every value, the search can't miss
            let ord = dict.binary_search(&value).unwrap_or_else(|i| i);
            docs.push(doc);
            ords.push(ord as i32);
        }
        SortedColumn { docs, ords, dict }
    }
}

impl SortedNumericColumn {
    /// Values of each doc are kept ascending.
    pub fn new(entries: Vec<(DocId, Vec<i64>)>) -> Self {
        let mut docs = Vec::with_capacity(entries.len());
        let mut values = Vec::with_capacity(entries.len());
        for (doc, mut doc_values) in entries {
            doc_values.sort();
            docs.push(doc);
            values.push(doc_values);
        }
        SortedNumericColumn { docs, values }
    }
}

impl SortedSetColumn {
    /// Ords of each doc are deduplicated and ascending.
    pub fn new(entries: Vec<(DocId, Vec<Vec<u8>>)>) -> Self {
        let dict = build_dict(entries.iter().flat_map(|e| e.1.iter()));
        let mut docs = Vec::with_capacity(entries.len());
        let mut ords = Vec::with_capacity(entries.len());
        for (doc, doc_values) in entries {
            let doc_ords: BTreeSet<i64> = doc_values
                .iter()
                .map(|v| dict.binary_search(v).unwrap_or_else(|i| i) as i64)
                .collect();
            docs.push(doc);
            ords.push(doc_ords.into_iter().collect());
        }
        SortedSetColumn { docs, ords, dict }
    }
}

/// Doc values of one field held in memory.
#[derive(Clone, Debug)]
pub enum DocValuesColumn {
    Numeric(Arc<NumericColumn>),
    Binary(Arc<BinaryColumn>),
    Sorted(Arc<SortedColumn>),
    SortedNumeric(Arc<SortedNumericColumn>),
    SortedSet(Arc<SortedSetColumn>),
}

impl DocValuesColumn {
    pub fn doc_values_type(&self) -> DocValuesType {
        match self {
            DocValuesColumn::Numeric(_) => DocValuesType::Numeric,
            DocValuesColumn::Binary(_) => DocValuesType::Binary,
            DocValuesColumn::Sorted(_) => DocValuesType::Sorted,
            DocValuesColumn::SortedNumeric(_) => DocValuesType::SortedNumeric,
            DocValuesColumn::SortedSet(_) => DocValuesType::SortedSet,
        }
    }

    pub fn iterator(&self) -> DocValuesEnum {
        match self {
            DocValuesColumn::Numeric(c) => {
                DocValuesEnum::Numeric(Box::new(ColumnIterator::new(Arc::clone(c))))
            }
            DocValuesColumn::Binary(c) => {
                DocValuesEnum::Binary(Box::new(ColumnIterator::new(Arc::clone(c))))
            }
            DocValuesColumn::Sorted(c) => {
                DocValuesEnum::Sorted(Box::new(ColumnIterator::new(Arc::clone(c))))
            }
            DocValuesColumn::SortedNumeric(c) => {
                DocValuesEnum::SortedNumeric(Box::new(ColumnIterator::new(Arc::clone(c))))
            }
            DocValuesColumn::SortedSet(c) => {
                DocValuesEnum::SortedSet(Box::new(ColumnIterator::new(Arc::clone(c))))
            }
        }
    }
}

/// Forward-only cursor over a `DocColumn`.
pub struct ColumnIterator<C: DocColumn> {
    column: Arc<C>,
    // first entry whose doc is >= `doc`
    index: usize,
    doc: DocId,
    // values of the current doc already consumed
    upto: usize,
}

impl<C: DocColumn> ColumnIterator<C> {
    pub fn new(column: Arc<C>) -> Self {
        ColumnIterator {
            column,
            index: 0,
            doc: -1,
            upto: 0,
        }
    }

    fn positioned(&self) -> bool {
        let docs = self.column.docs();
        self.index < docs.len() && docs[self.index] == self.doc
    }

    fn current(&self) -> Result<usize> {
        if self.positioned() {
            Ok(self.index)
        } else {
            bail!(IllegalState(format!("doc {} has no value", self.doc)))
        }
    }

    fn seek(&mut self, target: DocId) {
        let docs = self.column.docs();
        self.index += match docs[self.index..].binary_search(&target) {
            Ok(i) | Err(i) => i,
        };
        self.upto = 0;
    }

    fn current_doc(&self) -> DocId {
        let docs = self.column.docs();
        if self.index < docs.len() {
            docs[self.index]
        } else {
            NO_MORE_DOCS
        }
    }
}

impl<C: DocColumn> DocIterator for ColumnIterator<C> {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> Result<DocId> {
        if self.positioned() {
            self.index += 1;
        }
        self.upto = 0;
        self.doc = self.current_doc();
        Ok(self.doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.seek(target);
        self.doc = self.current_doc();
        Ok(self.doc)
    }

    fn cost(&self) -> usize {
        self.column.docs().len()
    }
}

impl<C: DocColumn> DocValuesIterator for ColumnIterator<C> {
    fn advance_exact(&mut self, target: DocId) -> Result<bool> {
        self.seek(target);
        self.doc = target;
        Ok(self.positioned())
    }
}

impl NumericDocValues for ColumnIterator<NumericColumn> {
    fn long_value(&self) -> Result<i64> {
        Ok(self.column.values[self.current()?])
    }
}

impl BinaryDocValues for ColumnIterator<BinaryColumn> {
    fn binary_value(&self) -> Result<&[u8]> {
        Ok(&self.column.values[self.current()?])
    }
}

impl SortedDocValues for ColumnIterator<SortedColumn> {
    fn ord_value(&self) -> Result<i32> {
        Ok(self.column.ords[self.current()?])
    }

    fn lookup_ord(&self, ord: i32) -> Result<&[u8]> {
        match self.column.dict.get(ord as usize) {
            Some(v) if ord >= 0 => Ok(v),
            _ => bail!(IllegalArgument(format!("invalid ord {}", ord))),
        }
    }

    fn value_count(&self) -> usize {
        self.column.dict.len()
    }
}

impl SortedNumericDocValues for ColumnIterator<SortedNumericColumn> {
    fn doc_value_count(&self) -> usize {
        if self.positioned() {
            self.column.values[self.index].len()
        } else {
            0
        }
    }

    fn next_value(&mut self) -> Result<i64> {
        let index = self.current()?;
        match self.column.values[index].get(self.upto) {
            Some(v) => {
                self.upto += 1;
                Ok(*v)
            }
            None => bail!(IllegalState(format!(
                "doc {} has only {} values",
                self.doc, self.upto
            ))),
        }
    }
}

impl SortedSetDocValues for ColumnIterator<SortedSetColumn> {
    fn doc_value_count(&self) -> usize {
        if self.positioned() {
            self.column.ords[self.index].len()
        } else {
            0
        }
    }

    fn next_ord(&mut self) -> Result<i64> {
        let index = self.current()?;
        match self.column.ords[index].get(self.upto) {
            Some(ord) => {
                self.upto += 1;
                Ok(*ord)
            }
            None => Ok(NO_MORE_ORDS),
        }
    }

    fn lookup_ord(&self, ord: i64) -> Result<&[u8]> {
        match self.column.dict.get(ord as usize) {
            Some(v) if ord >= 0 => Ok(v),
            _ => bail!(IllegalArgument(format!("invalid ord {}", ord))),
        }
    }

    fn value_count(&self) -> usize {
        self.column.dict.len()
    }
}
