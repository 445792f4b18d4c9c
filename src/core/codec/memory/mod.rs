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

//! Heap resident segment data.
//!
//! Every structure here is immutable once built and shared through `Arc`,
//! so any number of iterators can walk it concurrently.

mod doc_values;
pub use self::doc_values::*;

mod postings;
pub use self::postings::*;

mod points;
pub use self::points::*;

mod vectors;
pub use self::vectors::*;
