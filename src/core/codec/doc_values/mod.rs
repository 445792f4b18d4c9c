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

//! Iteration contracts of the five doc values shapes.
//!
//! Every column is a forward-only `DocIterator` over the docs that have a
//! value, in ascending doc order.

use core::doc::DocValuesType;
use core::search::DocIterator;
use core::util::DocId;
use error::Result;

/// Returned by `SortedSetDocValues::next_ord` once the ords of the
/// current document are exhausted.
pub const NO_MORE_ORDS: i64 = -1;

pub trait DocValuesIterator: DocIterator {
    /// Advance the iterator to exactly `target` and return whether `target`
    /// has a value. `target` must be greater than or equal to the current
    /// doc ID and must be a valid doc ID, ie. >= 0 and < `max_doc`.
    /// After this method returns, `doc_id()` returns `target`.
    fn advance_exact(&mut self, target: DocId) -> Result<bool>;
}

/// A per-document numeric value.
pub trait NumericDocValues: DocValuesIterator {
    /// Returns the numeric value for the current document ID.
    /// It is illegal to call this method after `advance_exact`
    /// returned `false`.
    fn long_value(&self) -> Result<i64>;
}

/// A per-document binary value.
pub trait BinaryDocValues: DocValuesIterator {
    fn binary_value(&self) -> Result<&[u8]>;
}

/// A per-document byte[] with presorted values. This is fully
/// random access: ords are dense and in increasing sorted order of the
/// byte values they resolve to.
pub trait SortedDocValues: DocValuesIterator {
    /// Returns the ordinal for the current docID.
    fn ord_value(&self) -> Result<i32>;

    /// Retrieves the value for the specified ordinal, independently of the
    /// current position of the iterator.
    fn lookup_ord(&self, ord: i32) -> Result<&[u8]>;

    /// Returns the number of unique values.
    fn value_count(&self) -> usize;
}

/// A list of per-document numeric values, sorted
/// according to `i64::cmp`.
pub trait SortedNumericDocValues: DocValuesIterator {
    /// Retrieves the number of values for the current document.  This must always
    /// be greater than zero.
    fn doc_value_count(&self) -> usize;

    /// Iterates to the next value in the current document. Do not call this more than
    /// `doc_value_count()` times for the document.
    fn next_value(&mut self) -> Result<i64>;
}

/// A multi-valued version of `SortedDocValues`.
pub trait SortedSetDocValues: DocValuesIterator {
    /// Number of ords of the current document.
    fn doc_value_count(&self) -> usize;

    /// Returns the next ordinal for the current document, in increasing
    /// order, or `NO_MORE_ORDS` once exhausted.
    fn next_ord(&mut self) -> Result<i64>;

    fn lookup_ord(&self, ord: i64) -> Result<&[u8]>;

    fn value_count(&self) -> usize;
}

/// Doc values of one field, whatever their shape.
pub enum DocValuesEnum {
    Numeric(Box<dyn NumericDocValues>),
    Binary(Box<dyn BinaryDocValues>),
    Sorted(Box<dyn SortedDocValues>),
    SortedNumeric(Box<dyn SortedNumericDocValues>),
    SortedSet(Box<dyn SortedSetDocValues>),
}

impl DocValuesEnum {
    pub fn doc_values_type(&self) -> DocValuesType {
        match self {
            DocValuesEnum::Numeric(_) => DocValuesType::Numeric,
            DocValuesEnum::Binary(_) => DocValuesType::Binary,
            DocValuesEnum::Sorted(_) => DocValuesType::Sorted,
            DocValuesEnum::SortedNumeric(_) => DocValuesType::SortedNumeric,
            DocValuesEnum::SortedSet(_) => DocValuesType::SortedSet,
        }
    }
}
