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

use core::search::PostingIterator;
use error::Result;

/// Access to the terms in a specific field.
pub trait Terms: Send + Sync {
    /// Returns an iterator that will step through all terms.
    fn iterator(&self) -> Result<Box<dyn TermIterator>>;

    /// Returns the number of terms for this field, or -1 if this
    /// measure isn't stored by the codec.
    fn size(&self) -> Result<i64>;

    /// Returns the sum of `TermIterator::total_term_freq` for
    /// all terms in this field, or -1 if this measure isn't
    /// stored by the codec (or if this fields omits term freq
    /// and positions).
    fn sum_total_term_freq(&self) -> Result<i64>;

    /// Returns the sum of `TermIterator::doc_freq` for
    /// all terms in this field, or -1 if this measure isn't
    /// stored by the codec.
    fn sum_doc_freq(&self) -> Result<i64>;

    /// Returns the number of documents that have at least one
    /// term for this field, or -1 if this measure isn't
    /// stored by the codec.
    fn doc_count(&self) -> Result<i32>;

    /// Returns true if documents in this field store per-document term frequency.
    fn has_freqs(&self) -> Result<bool>;

    /// Returns true if documents in this field store offsets.
    fn has_offsets(&self) -> Result<bool>;

    /// Returns true if documents in this field store positions.
    fn has_positions(&self) -> Result<bool>;

    /// Returns true if documents in this field store payloads.
    fn has_payloads(&self) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekStatus {
    /// The term was not found, and the end of iteration was hit.
    End,
    /// The precise term was found.
    Found,
    /// A different term was found after the requested term
    NotFound,
}

/// Iterator to seek or step through terms to obtain frequency information,
/// or for the current term.
///
/// Term iterators are always positioned on a term or at end; after
/// creation call `next()` first.
pub trait TermIterator: Send {
    /// Increments the iteration to the next term, returning `None` at the end.
    fn next(&mut self) -> Result<Option<Vec<u8>>>;

    /// Attempts to seek to the exact term, returning true if the term is found.
    fn seek_exact(&mut self, text: &[u8]) -> Result<bool> {
        Ok(self.seek_ceil(text)? == SeekStatus::Found)
    }

    /// Seeks to the specified term, if it exists, or to the
    /// next (ceiling) term.
    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus>;

    /// Returns current term.
    fn term(&self) -> Result<&[u8]>;

    /// Returns the number of documents containing the current
    /// term.
    fn doc_freq(&mut self) -> Result<i32>;

    /// Returns the total number of occurrences of this term
    /// across all documents, or -1 if the field omits freqs.
    fn total_term_freq(&mut self) -> Result<i64>;

    /// Get `PostingIterator` for the current term, with
    /// control over whether freqs, positions, offsets or payloads
    /// are required.
    fn postings_with_flags(&mut self, flags: u16) -> Result<Box<dyn PostingIterator>>;
}
