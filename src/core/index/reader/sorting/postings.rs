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

use core::codec::{DocMap, Fields, SeekStatus, SorterDocMap, TermIterator, Terms};
use core::search::{DocIterator, Payload, PostingIterator, PostingIteratorFlags, NO_MORE_DOCS};
use core::util::DocId;

use error::ErrorKind::CorruptIndex;
use error::Result;

use std::sync::Arc;

/// Postings of a sorting reader. Terms and their statistics are those of
/// the wrapped fields; only the postings lists are reordered.
pub struct SortingFields {
    fields: Box<dyn Fields>,
    doc_map: Arc<DocMap>,
}

impl SortingFields {
    pub fn new(fields: Box<dyn Fields>, doc_map: Arc<DocMap>) -> Self {
        SortingFields { fields, doc_map }
    }
}

impl Fields for SortingFields {
    fn fields(&self) -> Vec<String> {
        self.fields.fields()
    }

    fn terms(&self, field: &str) -> Result<Option<Box<dyn Terms>>> {
        match self.fields.terms(field)? {
            Some(terms) => Ok(Some(Box::new(SortingTerms::new(
                terms,
                Arc::clone(&self.doc_map),
            )))),
            None => Ok(None),
        }
    }

    fn size(&self) -> usize {
        self.fields.size()
    }
}

pub struct SortingTerms {
    terms: Box<dyn Terms>,
    doc_map: Arc<DocMap>,
}

impl SortingTerms {
    fn new(terms: Box<dyn Terms>, doc_map: Arc<DocMap>) -> Self {
        SortingTerms { terms, doc_map }
    }
}

impl Terms for SortingTerms {
    fn iterator(&self) -> Result<Box<dyn TermIterator>> {
        Ok(Box::new(SortingTermsIterator {
            iter: self.terms.iterator()?,
            doc_map: Arc::clone(&self.doc_map),
            has_freqs: self.terms.has_freqs()?,
            has_positions: self.terms.has_positions()?,
            has_offsets: self.terms.has_offsets()?,
        }))
    }

    fn size(&self) -> Result<i64> {
        self.terms.size()
    }

    fn sum_total_term_freq(&self) -> Result<i64> {
        self.terms.sum_total_term_freq()
    }

    fn sum_doc_freq(&self) -> Result<i64> {
        self.terms.sum_doc_freq()
    }

    fn doc_count(&self) -> Result<i32> {
        self.terms.doc_count()
    }

    fn has_freqs(&self) -> Result<bool> {
        self.terms.has_freqs()
    }

    fn has_offsets(&self) -> Result<bool> {
        self.terms.has_offsets()
    }

    fn has_positions(&self) -> Result<bool> {
        self.terms.has_positions()
    }

    fn has_payloads(&self) -> Result<bool> {
        self.terms.has_payloads()
    }
}

pub struct SortingTermsIterator {
    iter: Box<dyn TermIterator>,
    doc_map: Arc<DocMap>,
    has_freqs: bool,
    has_positions: bool,
    has_offsets: bool,
}

impl TermIterator for SortingTermsIterator {
    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        self.iter.next()
    }

    fn seek_exact(&mut self, text: &[u8]) -> Result<bool> {
        self.iter.seek_exact(text)
    }

    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus> {
        self.iter.seek_ceil(text)
    }

    fn term(&self) -> Result<&[u8]> {
        self.iter.term()
    }

    fn doc_freq(&mut self) -> Result<i32> {
        self.iter.doc_freq()
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        self.iter.total_term_freq()
    }

    fn postings_with_flags(&mut self, flags: u16) -> Result<Box<dyn PostingIterator>> {
        if self.has_positions
            && PostingIteratorFlags::feature_requested(flags, PostingIteratorFlags::POSITIONS)
        {
            let postings = self.iter.postings_with_flags(flags)?;
            // offsets are kept whenever they are indexed, requested or not
            return Ok(Box::new(SortingPostingsIterator::new(
                postings,
                &self.doc_map,
                self.has_offsets,
            )?));
        }

        let docs = self.iter.postings_with_flags(flags)?;
        let with_freqs = self.has_freqs
            && PostingIteratorFlags::feature_requested(flags, PostingIteratorFlags::FREQS);
        Ok(Box::new(SortingDocsIterator::new(
            docs,
            with_freqs,
            &self.doc_map,
        )?))
    }
}

/// Returns the new id of `doc`, `None` if it was deleted.
fn remap(doc: DocId, doc_map: &DocMap) -> Result<Option<DocId>> {
    if doc < 0 || doc >= doc_map.max_doc() {
        bail!(CorruptIndex(format!(
            "postings returned doc {} beyond max_doc {}",
            doc,
            doc_map.max_doc()
        )));
    }
    Ok(doc_map.try_old_to_new(doc))
}

struct DocAndFreq {
    doc: DocId,
    freq: i32,
}

/// Postings without positions, buffered and sorted by new doc id.
pub struct SortingDocsIterator {
    docs_and_freqs: Vec<DocAndFreq>,
    doc_it: i32,
    upto: i32,
    with_freqs: bool,
}

impl SortingDocsIterator {
    fn new(
        mut postings: Box<dyn PostingIterator>,
        with_freqs: bool,
        doc_map: &DocMap,
    ) -> Result<Self> {
        let mut docs_and_freqs = Vec::with_capacity(postings.cost().min(doc_map.len()));
        loop {
            let doc = postings.next()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if let Some(new_doc) = remap(doc, doc_map)? {
                let freq = if with_freqs { postings.freq()? } else { 1 };
                docs_and_freqs.push(DocAndFreq { doc: new_doc, freq });
            }
        }
        docs_and_freqs.sort_by(|d1, d2| d1.doc.cmp(&d2.doc));
        let upto = docs_and_freqs.len() as i32;
        Ok(SortingDocsIterator {
            docs_and_freqs,
            doc_it: -1,
            upto,
            with_freqs,
        })
    }
}

impl DocIterator for SortingDocsIterator {
    fn doc_id(&self) -> DocId {
        if self.doc_it < 0 {
            -1
        } else if self.doc_it >= self.upto {
            NO_MORE_DOCS
        } else {
            self.docs_and_freqs[self.doc_it as usize].doc
        }
    }

    fn next(&mut self) -> Result<DocId> {
        if self.doc_it < self.upto {
            self.doc_it += 1;
        }
        Ok(self.doc_id())
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.slow_advance(target)
    }

    fn cost(&self) -> usize {
        self.docs_and_freqs.len()
    }
}

impl PostingIterator for SortingDocsIterator {
    fn freq(&self) -> Result<i32> {
        Ok(if self.with_freqs && self.doc_it >= 0 && self.doc_it < self.upto {
            self.docs_and_freqs[self.doc_it as usize].freq
        } else {
            1
        })
    }

    fn next_position(&mut self) -> Result<i32> {
        Ok(-1)
    }

    fn start_offset(&self) -> Result<i32> {
        Ok(-1)
    }

    fn end_offset(&self) -> Result<i32> {
        Ok(-1)
    }

    fn payload(&self) -> Result<Payload> {
        Ok(Vec::with_capacity(0))
    }
}

struct BufferedPosition {
    position: i32,
    start_offset: i32,
    end_offset: i32,
    payload: Payload,
}

struct DocAndPositions {
    doc: DocId,
    positions: Vec<BufferedPosition>,
}

/// Postings with positions, buffered per doc and sorted by new doc id.
pub struct SortingPostingsIterator {
    docs: Vec<DocAndPositions>,
    doc_it: i32,
    upto: i32,
    pos_upto: usize,
    store_offsets: bool,
}

impl SortingPostingsIterator {
    fn new(
        mut postings: Box<dyn PostingIterator>,
        doc_map: &DocMap,
        store_offsets: bool,
    ) -> Result<Self> {
        let mut docs = Vec::with_capacity(postings.cost().min(doc_map.len()));
        loop {
            let doc = postings.next()?;
            if doc == NO_MORE_DOCS {
                break;
            }
            if let Some(new_doc) = remap(doc, doc_map)? {
                let positions = Self::read_positions(postings.as_mut(), store_offsets)?;
                docs.push(DocAndPositions {
                    doc: new_doc,
                    positions,
                });
            }
        }
        docs.sort_by(|d1, d2| d1.doc.cmp(&d2.doc));
        let upto = docs.len() as i32;
        Ok(SortingPostingsIterator {
            docs,
            doc_it: -1,
            upto,
            pos_upto: 0,
            store_offsets,
        })
    }

    fn read_positions(
        input: &mut dyn PostingIterator,
        store_offsets: bool,
    ) -> Result<Vec<BufferedPosition>> {
        let freq = input.freq()?;
        let mut positions = Vec::with_capacity(freq.max(0) as usize);
        for _ in 0..freq {
            let position = input.next_position()?;
            let (start_offset, end_offset) = if store_offsets {
                (input.start_offset()?, input.end_offset()?)
            } else {
                (-1, -1)
            };
            positions.push(BufferedPosition {
                position,
                start_offset,
                end_offset,
                payload: input.payload()?,
            });
        }
        Ok(positions)
    }

    fn current(&self) -> Option<&DocAndPositions> {
        if self.doc_it >= 0 && self.doc_it < self.upto {
            Some(&self.docs[self.doc_it as usize])
        } else {
            None
        }
    }

    /// The position last returned by `next_position`.
    fn position(&self) -> Option<&BufferedPosition> {
        match self.current() {
            Some(d) if self.pos_upto > 0 => d.positions.get(self.pos_upto - 1),
            _ => None,
        }
    }
}

impl DocIterator for SortingPostingsIterator {
    fn doc_id(&self) -> DocId {
        if self.doc_it < 0 {
            -1
        } else if self.doc_it >= self.upto {
            NO_MORE_DOCS
        } else {
            self.docs[self.doc_it as usize].doc
        }
    }

    fn next(&mut self) -> Result<DocId> {
        if self.doc_it < self.upto {
            self.doc_it += 1;
        }
        self.pos_upto = 0;
        Ok(self.doc_id())
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.slow_advance(target)
    }

    fn cost(&self) -> usize {
        self.docs.len()
    }
}

impl PostingIterator for SortingPostingsIterator {
    fn freq(&self) -> Result<i32> {
        Ok(self.current().map_or(0, |d| d.positions.len() as i32))
    }

    fn next_position(&mut self) -> Result<i32> {
        let position = match self.current() {
            Some(d) => match d.positions.get(self.pos_upto) {
                Some(p) => p.position,
                None => return Ok(-1),
            },
            None => return Ok(-1),
        };
        self.pos_upto += 1;
        Ok(position)
    }

    fn start_offset(&self) -> Result<i32> {
        Ok(match self.position() {
            Some(p) if self.store_offsets => p.start_offset,
            _ => -1,
        })
    }

    fn end_offset(&self) -> Result<i32> {
        Ok(match self.position() {
            Some(p) if self.store_offsets => p.end_offset,
            _ => -1,
        })
    }

    fn payload(&self) -> Result<Payload> {
        Ok(self.position().map_or_else(Vec::new, |p| p.payload.clone()))
    }
}
