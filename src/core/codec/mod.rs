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

pub mod doc_values;
pub mod field_infos;
pub mod memory;
pub mod points;
pub mod vectors;

mod fields;
pub use self::fields::*;

mod terms;
pub use self::terms::*;

mod sort_key;
pub use self::sort_key::*;

mod sorter;
pub use self::sorter::*;
