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

use core::codec::{Fields, SeekStatus, TermIterator, Terms};
use core::doc::IndexOptions;
use core::search::{DocIterator, Payload, PostingIterator, PostingIteratorFlags, NO_MORE_DOCS};
use core::util::DocId;

use error::ErrorKind::{IllegalArgument, IllegalState};
use error::Result;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub position: i32,
    pub start_offset: i32,
    pub end_offset: i32,
    pub payload: Payload,
}

impl Position {
    pub fn new(position: i32) -> Position {
        Position {
            position,
            start_offset: -1,
            end_offset: -1,
            payload: Payload::new(),
        }
    }

    pub fn with_offsets(position: i32, start_offset: i32, end_offset: i32) -> Position {
        Position {
            position,
            start_offset,
            end_offset,
            payload: Payload::new(),
        }
    }
}

/// One document of a term's postings list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Posting {
    pub doc: DocId,
    pub freq: i32,
    pub positions: Vec<Position>,
}

/// Terms of one field, sorted by term bytes.
#[derive(Debug)]
pub struct MemoryTermsData {
    index_options: IndexOptions,
    has_payloads: bool,
    terms: Vec<(Vec<u8>, Vec<Posting>)>,
    sum_total_term_freq: i64,
    sum_doc_freq: i64,
    doc_count: i32,
}

impl MemoryTermsData {
    pub fn new(
        index_options: IndexOptions,
        has_payloads: bool,
        terms: BTreeMap<Vec<u8>, Vec<Posting>>,
    ) -> Result<MemoryTermsData> {
        let mut docs = BTreeSet::new();
        let mut sum_total_term_freq = 0i64;
        let mut sum_doc_freq = 0i64;
        let mut sorted_terms = Vec::with_capacity(terms.len());
        for (term, mut postings) in terms {
            postings.sort_by_key(|p| p.doc);
            for pair in postings.windows(2) {
                if pair[0].doc == pair[1].doc {
                    bail!(IllegalArgument(format!(
                        "doc {} appears twice in the postings of one term",
                        pair[0].doc
                    )));
                }
            }
            for p in &postings {
                if index_options.has_positions() && p.positions.len() != p.freq as usize {
                    bail!(IllegalArgument(format!(
                        "doc {} has freq {} but {} positions",
                        p.doc,
                        p.freq,
                        p.positions.len()
                    )));
                }
                docs.insert(p.doc);
                sum_total_term_freq += i64::from(p.freq);
            }
            sum_doc_freq += postings.len() as i64;
            sorted_terms.push((term, postings));
        }
        Ok(MemoryTermsData {
            index_options,
            has_payloads,
            terms: sorted_terms,
            sum_total_term_freq: if index_options.has_freqs() {
                sum_total_term_freq
            } else {
                -1
            },
            sum_doc_freq,
            doc_count: docs.len() as i32,
        })
    }
}

/// Postings of every indexed field of a segment, or the term vector of one
/// document.
#[derive(Debug, Default)]
pub struct MemoryFields {
    fields: BTreeMap<String, Arc<MemoryTermsData>>,
}

impl MemoryFields {
    pub fn new(fields: BTreeMap<String, Arc<MemoryTermsData>>) -> MemoryFields {
        MemoryFields { fields }
    }
}

impl Fields for MemoryFields {
    fn fields(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn terms(&self, field: &str) -> Result<Option<Box<dyn Terms>>> {
        Ok(self.fields.get(field).map(|data| {
            Box::new(MemoryTerms {
                data: Arc::clone(data),
            }) as Box<dyn Terms>
        }))
    }

    fn size(&self) -> usize {
        self.fields.len()
    }
}

pub struct MemoryTerms {
    data: Arc<MemoryTermsData>,
}

impl Terms for MemoryTerms {
    fn iterator(&self) -> Result<Box<dyn TermIterator>> {
        Ok(Box::new(MemoryTermIterator {
            data: Arc::clone(&self.data),
            ord: -1,
        }))
    }

    fn size(&self) -> Result<i64> {
        Ok(self.data.terms.len() as i64)
    }

    fn sum_total_term_freq(&self) -> Result<i64> {
        Ok(self.data.sum_total_term_freq)
    }

    fn sum_doc_freq(&self) -> Result<i64> {
        Ok(self.data.sum_doc_freq)
    }

    fn doc_count(&self) -> Result<i32> {
        Ok(self.data.doc_count)
    }

    fn has_freqs(&self) -> Result<bool> {
        Ok(self.data.index_options.has_freqs())
    }

    fn has_offsets(&self) -> Result<bool> {
        Ok(self.data.index_options.has_offsets())
    }

    fn has_positions(&self) -> Result<bool> {
        Ok(self.data.index_options.has_positions())
    }

    fn has_payloads(&self) -> Result<bool> {
        Ok(self.data.has_payloads)
    }
}

pub struct MemoryTermIterator {
    data: Arc<MemoryTermsData>,
    ord: i64,
}

impl MemoryTermIterator {
    fn current(&self) -> Result<&(Vec<u8>, Vec<Posting>)> {
        if self.ord >= 0 && (self.ord as usize) < self.data.terms.len() {
            Ok(&self.data.terms[self.ord as usize])
        } else {
            bail!(IllegalState("term iterator is not positioned".into()))
        }
    }
}

impl TermIterator for MemoryTermIterator {
    fn next(&mut self) -> Result<Option<Vec<u8>>> {
        let len = self.data.terms.len() as i64;
        if self.ord < len {
            self.ord += 1;
        }
        if self.ord < len {
            Ok(Some(self.data.terms[self.ord as usize].0.clone()))
        } else {
            Ok(None)
        }
    }

    fn seek_ceil(&mut self, text: &[u8]) -> Result<SeekStatus> {
        match self
            .data
            .terms
            .binary_search_by(|(term, _)| term.as_slice().cmp(text))
        {
            Ok(i) => {
                self.ord = i as i64;
                Ok(SeekStatus::Found)
            }
            Err(i) => {
                self.ord = i as i64;
                if i == self.data.terms.len() {
                    Ok(SeekStatus::End)
                } else {
                    Ok(SeekStatus::NotFound)
                }
            }
        }
    }

    fn term(&self) -> Result<&[u8]> {
        Ok(&self.current()?.0)
    }

    fn doc_freq(&mut self) -> Result<i32> {
        Ok(self.current()?.1.len() as i32)
    }

    fn total_term_freq(&mut self) -> Result<i64> {
        if !self.data.index_options.has_freqs() {
            return Ok(-1);
        }
        Ok(self.current()?.1.iter().map(|p| i64::from(p.freq)).sum())
    }

    fn postings_with_flags(&mut self, flags: u16) -> Result<Box<dyn PostingIterator>> {
        self.current()?;
        Ok(Box::new(MemoryPostingIterator::new(
            Arc::clone(&self.data),
            self.ord as usize,
            flags,
        )))
    }
}

/// Walks the postings of one term.
pub struct MemoryPostingIterator {
    data: Arc<MemoryTermsData>,
    term_ord: usize,
    index: isize,
    doc: DocId,
    // position last returned by `next_position`, -1 before the first one
    pos_upto: isize,
    needs_freqs: bool,
}

impl MemoryPostingIterator {
    fn new(data: Arc<MemoryTermsData>, term_ord: usize, flags: u16) -> Self {
        MemoryPostingIterator {
            data,
            term_ord,
            index: -1,
            doc: -1,
            pos_upto: -1,
            needs_freqs: PostingIteratorFlags::feature_requested(flags, PostingIteratorFlags::FREQS),
        }
    }

    fn postings(&self) -> &[Posting] {
        &self.data.terms[self.term_ord].1
    }

    fn posting(&self) -> Result<&Posting> {
        if self.index < 0 || self.doc == NO_MORE_DOCS {
            bail!(IllegalState("postings are not positioned".into()));
        }
        Ok(&self.postings()[self.index as usize])
    }

    fn position(&self) -> Result<Option<&Position>> {
        if self.pos_upto < 0 {
            return Ok(None);
        }
        Ok(self.posting()?.positions.get(self.pos_upto as usize))
    }
}

impl DocIterator for MemoryPostingIterator {
    fn doc_id(&self) -> DocId {
        self.doc
    }

    fn next(&mut self) -> Result<DocId> {
        if self.doc == NO_MORE_DOCS {
            return Ok(NO_MORE_DOCS);
        }
        self.index += 1;
        self.pos_upto = -1;
        self.doc = match self.postings().get(self.index as usize) {
            Some(p) => p.doc,
            None => NO_MORE_DOCS,
        };
        Ok(self.doc)
    }

    fn advance(&mut self, target: DocId) -> Result<DocId> {
        self.slow_advance(target)
    }

    fn cost(&self) -> usize {
        self.postings().len()
    }
}

impl PostingIterator for MemoryPostingIterator {
    fn freq(&self) -> Result<i32> {
        if !self.data.index_options.has_freqs() || !self.needs_freqs {
            return Ok(1);
        }
        Ok(self.posting()?.freq)
    }

    fn next_position(&mut self) -> Result<i32> {
        if !self.data.index_options.has_positions() {
            return Ok(-1);
        }
        self.pos_upto += 1;
        match self.position()? {
            Some(p) => Ok(p.position),
            None => bail!(IllegalState(format!(
                "read past the positions of doc {}",
                self.doc
            ))),
        }
    }

    fn start_offset(&self) -> Result<i32> {
        if !self.data.index_options.has_offsets() {
            return Ok(-1);
        }
        Ok(self.position()?.map_or(-1, |p| p.start_offset))
    }

    fn end_offset(&self) -> Result<i32> {
        if !self.data.index_options.has_offsets() {
            return Ok(-1);
        }
        Ok(self.position()?.map_or(-1, |p| p.end_offset))
    }

    fn payload(&self) -> Result<Payload> {
        if !self.data.has_payloads {
            return Ok(Payload::new());
        }
        Ok(self
            .position()?
            .map_or_else(Payload::new, |p| p.payload.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::search::tests::collect_docs;

    fn fields() -> MemoryFields {
        let mut terms = BTreeMap::new();
        terms.insert(
            b"fox".to_vec(),
            vec![
                Posting {
                    doc: 3,
                    freq: 1,
                    positions: vec![Position::new(4)],
                },
                Posting {
                    doc: 1,
                    freq: 2,
                    positions: vec![Position::new(0), Position::new(7)],
                },
            ],
        );
        terms.insert(
            b"dog".to_vec(),
            vec![Posting {
                doc: 2,
                freq: 1,
                positions: vec![Position::new(1)],
            }],
        );
        let data =
            MemoryTermsData::new(IndexOptions::DocsAndFreqsAndPositions, false, terms).unwrap();
        let mut fields = BTreeMap::new();
        fields.insert("body".to_string(), Arc::new(data));
        MemoryFields::new(fields)
    }

    #[test]
    fn test_terms_statistics() {
        let terms = fields().terms("body").unwrap().unwrap();
        assert_eq!(terms.size().unwrap(), 2);
        assert_eq!(terms.sum_doc_freq().unwrap(), 3);
        assert_eq!(terms.sum_total_term_freq().unwrap(), 4);
        assert_eq!(terms.doc_count().unwrap(), 3);
        assert!(terms.has_positions().unwrap());
        assert!(!terms.has_offsets().unwrap());
    }

    #[test]
    fn test_postings_are_ascending() {
        let terms = fields().terms("body").unwrap().unwrap();
        let mut iter = terms.iterator().unwrap();
        assert_eq!(iter.seek_ceil(b"e").unwrap(), SeekStatus::NotFound);
        assert_eq!(iter.term().unwrap(), b"fox");
        let mut postings = iter
            .postings_with_flags(PostingIteratorFlags::POSITIONS)
            .unwrap();
        assert_eq!(postings.next().unwrap(), 1);
        assert_eq!(postings.freq().unwrap(), 2);
        assert_eq!(postings.next_position().unwrap(), 0);
        assert_eq!(postings.next_position().unwrap(), 7);
        assert_eq!(postings.next().unwrap(), 3);
        assert_eq!(postings.next().unwrap(), NO_MORE_DOCS);

        assert_eq!(iter.seek_ceil(b"zebra").unwrap(), SeekStatus::End);
        assert!(iter.next().unwrap().is_none());

        let mut iter = terms.iterator().unwrap();
        assert_eq!(iter.next().unwrap(), Some(b"dog".to_vec()));
        let mut postings = iter.postings_with_flags(PostingIteratorFlags::NONE).unwrap();
        assert_eq!(collect_docs(postings.as_mut()).unwrap(), vec![2]);
    }
}
